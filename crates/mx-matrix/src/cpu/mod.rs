pub(crate) mod elementwise;
pub(crate) mod matmul;
pub(crate) mod reduce;

use crate::backend::MatrixBackend;
use crate::error::{MatrixError, Result};
use crate::handle::MatrixHandle;
use crate::op::{OpSet, Operation};

/// Pure-Rust reference backend.
///
/// Implements the full operation catalog with straightforward loops
/// optimized for correctness rather than peak performance. Intended as
/// the reference implementation and fallback for every other backend.
#[derive(Debug, Clone)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        CpuBackend
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes a reduction's value into the result's first element.
fn write_scalar(result: &mut MatrixHandle, value: f32) -> Result<()> {
    let out = result.data_mut()?;
    if out.is_empty() {
        return Err(MatrixError::Storage(
            "result buffer is empty".to_string(),
        ));
    }
    out[0] = value;
    Ok(())
}

/// Multiplies the non-scalar operand by the scalar one, tiling it
/// cyclically over the result. Handles both A*s and s*B orderings of
/// the degenerate multiply.
fn scale_into(scalar: f32, operand: &MatrixHandle, result: &mut MatrixHandle) -> Result<()> {
    let src = operand.data()?.to_vec();
    if src.is_empty() {
        return Err(MatrixError::Storage(
            "scale: operand buffer is empty".to_string(),
        ));
    }
    let out = result.data_mut()?;
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = scalar * src[i % src.len()];
    }
    Ok(())
}

/// Converts a scalar operand into a row/column index, rejecting
/// values the `as usize` cast would silently clamp.
fn scalar_index(op: Operation, value: f32) -> Result<usize> {
    if !value.is_finite() || value < 0.0 {
        return Err(MatrixError::Storage(format!(
            "{}: invalid index operand {}",
            op, value
        )));
    }
    Ok(value as usize)
}

fn extract_column(a: &MatrixHandle, index: usize, result: &mut MatrixHandle) -> Result<()> {
    let cols = a.column_hint();
    let rows = a.rows();
    if index >= cols.max(1) {
        return Err(MatrixError::Storage(format!(
            "get_column: index {} out of range for {} columns",
            index, cols
        )));
    }
    let src = a.data()?.to_vec();
    let out = result.data_mut()?;
    if out.len() != rows {
        return Err(MatrixError::Storage(format!(
            "get_column: result has {} elements but matrix has {} rows",
            out.len(),
            rows
        )));
    }
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = src[i * cols + index];
    }
    Ok(())
}

fn extract_row(a: &MatrixHandle, index: usize, result: &mut MatrixHandle) -> Result<()> {
    let cols = a.column_hint();
    let rows = a.rows();
    if index >= rows.max(1) {
        return Err(MatrixError::Storage(format!(
            "get_row: index {} out of range for {} rows",
            index, rows
        )));
    }
    let src = a.data()?.to_vec();
    let out = result.data_mut()?;
    if out.len() != cols {
        return Err(MatrixError::Storage(format!(
            "get_row: result has {} elements but matrix has {} columns",
            out.len(),
            cols
        )));
    }
    out.copy_from_slice(&src[index * cols..index * cols + cols]);
    Ok(())
}

fn unary_transform(op: Operation) -> Option<fn(f32) -> f32> {
    match op {
        Operation::Copy => Some(|x| x),
        Operation::Negate => Some(|x| -x),
        Operation::Exp => Some(f32::exp),
        Operation::Log => Some(f32::ln),
        Operation::Abs => Some(f32::abs),
        Operation::Floor => Some(f32::floor),
        Operation::Round => Some(f32::round),
        Operation::Ceil => Some(f32::ceil),
        _ => None,
    }
}

impl MatrixBackend for CpuBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn supported_ops(&self) -> OpSet {
        OpSet::all()
    }

    fn run_binary(
        &self,
        op: Operation,
        a: &MatrixHandle,
        b: &MatrixHandle,
        result: &mut MatrixHandle,
    ) -> Result<()> {
        match op {
            Operation::Add => elementwise::broadcast_apply(a, b, result, |x, y| x + y),
            Operation::Subtract => elementwise::broadcast_apply(a, b, result, |x, y| x - y),
            Operation::MultiplyElementwise => {
                elementwise::broadcast_apply(a, b, result, |x, y| x * y)
            }
            Operation::Multiply => {
                if a.count() == 1 {
                    scale_into(a.data()?[0], b, result)
                } else if b.count() == 1 {
                    scale_into(b.data()?[0], a, result)
                } else {
                    let m = a.rows();
                    let k = a.column_hint();
                    let n = b.column_hint();
                    let a_data = a.data()?.to_vec();
                    let b_data = b.data()?.to_vec();
                    matmul::matmul(&a_data, &b_data, m, k, n, result.data_mut()?)
                }
            }
            Operation::DotProduct => {
                let v = reduce::dot(a.data()?, b.data()?)?;
                write_scalar(result, v)
            }
            Operation::EuclideanDistance => {
                let v = reduce::euclidean_distance(a.data()?, b.data()?)?;
                write_scalar(result, v)
            }
            Operation::CosineDistance => {
                let v = reduce::cosine_distance(a.data()?, b.data()?)?;
                write_scalar(result, v)
            }
            _ => Err(MatrixError::Unsupported {
                backend: self.name().to_string(),
                op,
            }),
        }
    }

    fn run_unary(&self, op: Operation, a: &MatrixHandle, result: &mut MatrixHandle) -> Result<()> {
        if let Some(f) = unary_transform(op) {
            return elementwise::map(a, result, f);
        }
        match op {
            Operation::Normalize => {
                let norm = reduce::norm2(a.data()?);
                if norm == 0.0 {
                    elementwise::map(a, result, |x| x)
                } else {
                    elementwise::map(a, result, |x| x / norm)
                }
            }
            Operation::Norm2 => {
                let v = reduce::norm2(a.data()?);
                write_scalar(result, v)
            }
            Operation::MinIndex => {
                let i = reduce::min_index(a.data()?)?;
                write_scalar(result, i as f32)
            }
            Operation::MaxIndex => {
                let i = reduce::max_index(a.data()?)?;
                write_scalar(result, i as f32)
            }
            // without an explicit index, extraction takes the first
            Operation::GetColumn => extract_column(a, 0, result),
            Operation::GetRow => extract_row(a, 0, result),
            _ => Err(MatrixError::Unsupported {
                backend: self.name().to_string(),
                op,
            }),
        }
    }

    fn run_scalar(
        &self,
        op: Operation,
        a: &MatrixHandle,
        value: f32,
        result: &mut MatrixHandle,
    ) -> Result<()> {
        match op {
            Operation::Add => elementwise::map(a, result, |x| x + value),
            Operation::Subtract => elementwise::map(a, result, |x| x - value),
            Operation::Multiply => elementwise::map(a, result, |x| x * value),
            Operation::Copy => {
                result.data_mut()?.fill(value);
                Ok(())
            }
            Operation::GetColumn => extract_column(a, scalar_index(op, value)?, result),
            Operation::GetRow => extract_row(a, scalar_index(op, value)?, result),
            _ => Err(MatrixError::Unsupported {
                backend: self.name().to_string(),
                op,
            }),
        }
    }

    fn run_in_place(&self, op: Operation, a: &mut MatrixHandle) -> Result<()> {
        if op == Operation::Copy {
            return Ok(());
        }
        if let Some(f) = unary_transform(op) {
            for v in a.data_mut()? {
                *v = f(*v);
            }
            return Ok(());
        }
        match op {
            Operation::Normalize => {
                let norm = reduce::norm2(a.data()?);
                if norm != 0.0 {
                    for v in a.data_mut()? {
                        *v /= norm;
                    }
                }
                Ok(())
            }
            _ => Err(MatrixError::Unsupported {
                backend: self.name().to_string(),
                op,
            }),
        }
    }
}

//! `mx-parallel` - Rayon-based parallel backend for `mx-matrix`.
//!
//! Implements the same operation semantics as the reference
//! `CpuBackend`, with data-parallel kernels: row-parallel matrix
//! multiply and parallel elementwise maps. The index reductions
//! (`MinIndex`/`MaxIndex`) are left out of the capability set; their
//! first-occurrence tie-breaking is inherently sequential and the
//! reference backend handles them.

use mx_matrix::{MatrixBackend, MatrixError, MatrixHandle, OpSet, Operation, Result};
use rayon::prelude::*;

/// Data-parallel compute backend built on rayon's global thread pool.
#[derive(Debug, Clone)]
pub struct ParallelBackend;

impl ParallelBackend {
    pub fn new() -> Self {
        ParallelBackend
    }
}

impl Default for ParallelBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a result element index onto an operand's element index,
/// broadcasting operands smaller than the result: scalar, column
/// (`column_hint == 1`, one value per result row), or cyclic tiling
/// for row vectors.
fn broadcast_index(
    operand_count: usize,
    operand_hint: usize,
    result_count: usize,
    result_cols: usize,
    result_rows: usize,
    i: usize,
) -> usize {
    if operand_count == 1 {
        0
    } else if operand_count == result_count {
        i
    } else if operand_hint == 1 && operand_count == result_rows {
        i / result_cols.max(1)
    } else {
        i % operand_count.max(1)
    }
}

fn par_broadcast_apply<F>(
    a: &MatrixHandle,
    b: &MatrixHandle,
    result: &mut MatrixHandle,
    f: F,
) -> Result<()>
where
    F: Fn(f32, f32) -> f32 + Sync,
{
    let (a_count, a_hint) = a.shape();
    let (b_count, b_hint) = b.shape();
    let (r_count, r_hint) = result.shape();
    let r_rows = result.rows();
    let a_data = a.data()?.to_vec();
    let b_data = b.data()?.to_vec();
    if a_data.is_empty() || b_data.is_empty() {
        return Err(MatrixError::Storage(
            "broadcast: operand buffer is empty".to_string(),
        ));
    }
    result
        .data_mut()?
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, slot)| {
            let ia = broadcast_index(a_count, a_hint, r_count, r_hint, r_rows, i);
            let ib = broadcast_index(b_count, b_hint, r_count, r_hint, r_rows, i);
            *slot = f(a_data[ia], b_data[ib]);
        });
    Ok(())
}

fn par_map<F>(a: &MatrixHandle, result: &mut MatrixHandle, f: F) -> Result<()>
where
    F: Fn(f32) -> f32 + Sync,
{
    let src = a.data()?.to_vec();
    let out = result.data_mut()?;
    if out.len() != src.len() {
        return Err(MatrixError::Storage(format!(
            "map: result has {} elements but input has {}",
            out.len(),
            src.len()
        )));
    }
    out.par_iter_mut()
        .zip(src.par_iter())
        .for_each(|(slot, v)| *slot = f(*v));
    Ok(())
}

fn par_matmul(
    a: &[f32],
    b: &[f32],
    m: usize,
    k: usize,
    n: usize,
    out: &mut [f32],
) -> Result<()> {
    if a.len() != m * k || b.len() != k * n || out.len() != m * n {
        return Err(MatrixError::Storage(format!(
            "matmul: buffer sizes {}/{}/{} do not match {}x{} @ {}x{}",
            a.len(),
            b.len(),
            out.len(),
            m,
            k,
            k,
            n
        )));
    }
    out.par_chunks_mut(n).enumerate().for_each(|(i, out_row)| {
        let a_row = &a[i * k..i * k + k];
        for (j, slot) in out_row.iter_mut().enumerate() {
            let mut sum = 0.0f32;
            for p in 0..k {
                sum += a_row[p] * b[p * n + j];
            }
            *slot = sum;
        }
    });
    Ok(())
}

fn par_dot(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(MatrixError::Storage(format!(
            "dot: operand lengths differ ({} vs {})",
            a.len(),
            b.len()
        )));
    }
    Ok(a.par_iter().zip(b.par_iter()).map(|(x, y)| x * y).sum())
}

fn par_norm2(a: &[f32]) -> f32 {
    a.par_iter().map(|v| v * v).sum::<f32>().sqrt()
}

fn write_scalar(result: &mut MatrixHandle, value: f32) -> Result<()> {
    let out = result.data_mut()?;
    if out.is_empty() {
        return Err(MatrixError::Storage("result buffer is empty".to_string()));
    }
    out[0] = value;
    Ok(())
}

fn scale_into(scalar: f32, operand: &MatrixHandle, result: &mut MatrixHandle) -> Result<()> {
    let src = operand.data()?.to_vec();
    if src.is_empty() {
        return Err(MatrixError::Storage(
            "scale: operand buffer is empty".to_string(),
        ));
    }
    result
        .data_mut()?
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, slot)| *slot = scalar * src[i % src.len()]);
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

fn extract(a: &MatrixHandle, op: Operation, index: usize, result: &mut MatrixHandle) -> Result<()> {
    let cols = a.column_hint();
    let rows = a.rows();
    let src = a.data()?.to_vec();
    let out = result.data_mut()?;
    match op {
        Operation::GetColumn => {
            if index >= cols.max(1) || out.len() != rows {
                return Err(MatrixError::Storage(format!(
                    "get_column: index {} / result length {} invalid for {}x{}",
                    index,
                    out.len(),
                    rows,
                    cols
                )));
            }
            for (i, slot) in out.iter_mut().enumerate() {
                *slot = src[i * cols + index];
            }
        }
        Operation::GetRow => {
            if index >= rows.max(1) || out.len() != cols {
                return Err(MatrixError::Storage(format!(
                    "get_row: index {} / result length {} invalid for {}x{}",
                    index,
                    out.len(),
                    rows,
                    cols
                )));
            }
            out.copy_from_slice(&src[index * cols..index * cols + cols]);
        }
        _ => unreachable!(),
    }
    Ok(())
}

impl MatrixBackend for ParallelBackend {
    fn name(&self) -> &str {
        "parallel"
    }

    fn supported_ops(&self) -> OpSet {
        Operation::ALL
            .iter()
            .copied()
            .filter(|op| !matches!(op, Operation::MinIndex | Operation::MaxIndex))
            .collect()
    }

    fn run_binary(
        &self,
        op: Operation,
        a: &MatrixHandle,
        b: &MatrixHandle,
        result: &mut MatrixHandle,
    ) -> Result<()> {
        match op {
            Operation::Add => par_broadcast_apply(a, b, result, |x, y| x + y),
            Operation::Subtract => par_broadcast_apply(a, b, result, |x, y| x - y),
            Operation::MultiplyElementwise => par_broadcast_apply(a, b, result, |x, y| x * y),
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
                    par_matmul(&a_data, &b_data, m, k, n, result.data_mut()?)
                }
            }
            Operation::DotProduct => {
                let v = par_dot(a.data()?, b.data()?)?;
                write_scalar(result, v)
            }
            Operation::EuclideanDistance => {
                let a_data = a.data()?;
                let b_data = b.data()?;
                if a_data.len() != b_data.len() {
                    return Err(MatrixError::Storage(format!(
                        "euclidean_distance: operand lengths differ ({} vs {})",
                        a_data.len(),
                        b_data.len()
                    )));
                }
                let v = a_data
                    .par_iter()
                    .zip(b_data.par_iter())
                    .map(|(x, y)| (x - y) * (x - y))
                    .sum::<f32>()
                    .sqrt();
                write_scalar(result, v)
            }
            Operation::CosineDistance => {
                let denom = par_norm2(a.data()?) * par_norm2(b.data()?);
                let v = if denom == 0.0 {
                    0.0
                } else {
                    1.0 - par_dot(a.data()?, b.data()?)? / denom
                };
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
            return par_map(a, result, f);
        }
        match op {
            Operation::Normalize => {
                let norm = par_norm2(a.data()?);
                if norm == 0.0 {
                    par_map(a, result, |x| x)
                } else {
                    par_map(a, result, move |x| x / norm)
                }
            }
            Operation::Norm2 => {
                let v = par_norm2(a.data()?);
                write_scalar(result, v)
            }
            Operation::GetColumn => extract(a, op, 0, result),
            Operation::GetRow => extract(a, op, 0, result),
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
            Operation::Add => par_map(a, result, move |x| x + value),
            Operation::Subtract => par_map(a, result, move |x| x - value),
            Operation::Multiply => par_map(a, result, move |x| x * value),
            Operation::Copy => {
                result.data_mut()?.fill(value);
                Ok(())
            }
            Operation::GetColumn | Operation::GetRow => {
                extract(a, op, scalar_index(op, value)?, result)
            }
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
            a.data_mut()?.par_iter_mut().for_each(|v| *v = f(*v));
            return Ok(());
        }
        match op {
            Operation::Normalize => {
                let norm = par_norm2(a.data()?);
                if norm != 0.0 {
                    a.data_mut()?.par_iter_mut().for_each(|v| *v /= norm);
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use mx_matrix::{CpuBackend, Dispatcher};

    fn backends() -> (CpuBackend, ParallelBackend) {
        (CpuBackend::new(), ParallelBackend::new())
    }

    #[test]
    fn test_capability_subset() {
        let backend = ParallelBackend::new();
        assert!(backend.supports(Operation::Multiply));
        assert!(backend.supports(Operation::CosineDistance));
        assert!(!backend.supports(Operation::MinIndex));
        assert!(!backend.supports(Operation::MaxIndex));
        assert_eq!(backend.supported_ops().len(), Operation::ALL.len() - 2);
    }

    #[test]
    fn test_dispatcher_refuses_index_reductions() {
        let backend = ParallelBackend::new();
        let dispatcher = Dispatcher::new(&backend);
        let a = MatrixHandle::row_vector(vec![3.0, 1.0, 2.0]);
        let mut result = MatrixHandle::zeros(1, 1);
        let err = dispatcher
            .unary(Operation::MinIndex, &a, &mut result)
            .unwrap_err();
        assert!(matches!(err, MatrixError::Unsupported { .. }));
    }

    #[test]
    fn test_matmul_agrees_with_cpu() {
        let (cpu, par) = backends();
        let a = MatrixHandle::new((0..20).map(|v| v as f32 * 0.5).collect(), 5);
        let b = MatrixHandle::new((0..15).map(|v| v as f32 - 7.0).collect(), 3);

        let mut expected = MatrixHandle::zeros(12, 3);
        cpu.run_binary(Operation::Multiply, &a, &b, &mut expected)
            .unwrap();
        let mut got = MatrixHandle::zeros(12, 3);
        par.run_binary(Operation::Multiply, &a, &b, &mut got)
            .unwrap();

        for (e, g) in expected.data().unwrap().iter().zip(got.data().unwrap()) {
            assert_relative_eq!(*e, *g, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_broadcast_add_agrees_with_cpu() {
        let (cpu, par) = backends();
        let a = MatrixHandle::new((0..12).map(|v| v as f32).collect(), 4);
        let row = MatrixHandle::row_vector(vec![1.0, 2.0, 3.0, 4.0]);
        let col = MatrixHandle::new(vec![10.0, 20.0, 30.0], 1);
        let scalar = MatrixHandle::scalar(0.5);

        for b in [&row, &col, &scalar] {
            let mut expected = MatrixHandle::zeros(12, 4);
            cpu.run_binary(Operation::Add, &a, b, &mut expected).unwrap();
            let mut got = MatrixHandle::zeros(12, 4);
            par.run_binary(Operation::Add, &a, b, &mut got).unwrap();
            assert_eq!(expected.data().unwrap(), got.data().unwrap());
        }
    }

    #[test]
    fn test_scalar_reductions() {
        let par = ParallelBackend::new();
        let a = MatrixHandle::row_vector(vec![3.0, 4.0]);
        let b = MatrixHandle::row_vector(vec![0.0, 0.0]);
        let mut result = MatrixHandle::zeros(1, 1);

        par.run_binary(Operation::DotProduct, &a, &a, &mut result)
            .unwrap();
        assert_relative_eq!(result.data().unwrap()[0], 25.0);

        par.run_binary(Operation::EuclideanDistance, &a, &b, &mut result)
            .unwrap();
        assert_relative_eq!(result.data().unwrap()[0], 5.0);

        par.run_unary(Operation::Norm2, &a, &mut result).unwrap();
        assert_relative_eq!(result.data().unwrap()[0], 5.0);
    }

    #[test]
    fn test_unary_and_in_place() {
        let par = ParallelBackend::new();
        let a = MatrixHandle::new(vec![1.0, -4.0, 9.0, -16.0], 2);
        let mut result = MatrixHandle::zeros(4, 2);
        par.run_unary(Operation::Abs, &a, &mut result).unwrap();
        assert_eq!(result.data().unwrap(), &[1.0, 4.0, 9.0, 16.0]);

        let mut m = MatrixHandle::row_vector(vec![3.0, 4.0]);
        par.run_in_place(Operation::Normalize, &mut m).unwrap();
        assert_relative_eq!(m.data().unwrap()[0], 0.6);
        assert_relative_eq!(m.data().unwrap()[1], 0.8);
    }

    #[test]
    fn test_extraction_through_dispatcher() {
        let backend = ParallelBackend::new();
        let dispatcher = Dispatcher::new(&backend);
        let a = MatrixHandle::new((0..15).map(|v| v as f32).collect(), 3);
        let mut result = MatrixHandle::zeros(1, 1);
        mx_matrix::size_result(Operation::GetColumn, Some(&a), None, &mut result);
        result.resize_to_shape();
        dispatcher
            .scalar(Operation::GetColumn, &a, 2.0, &mut result)
            .unwrap();
        assert_eq!(result.data().unwrap(), &[2.0, 5.0, 8.0, 11.0, 14.0]);

        // negative or NaN index operands error instead of clamping to 0
        for bad in [-2.0, f32::NAN] {
            assert!(dispatcher
                .scalar(Operation::GetColumn, &a, bad, &mut result)
                .is_err());
        }
    }

    #[test]
    fn test_broadcast_refuses_empty_operand() {
        let par = ParallelBackend::new();
        let empty = MatrixHandle::zeros(0, 1);
        let b = MatrixHandle::new(vec![1.0, 2.0, 3.0], 1);
        let mut result = MatrixHandle::zeros(3, 1);
        let err = par
            .run_binary(Operation::Add, &empty, &b, &mut result)
            .unwrap_err();
        assert!(matches!(err, MatrixError::Storage(_)));
    }
}

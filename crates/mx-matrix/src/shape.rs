//! Shape inference and validation for matrix operations.
//!
//! Both functions are pure and O(1): [`size_result`] computes the shape
//! a result handle must have for a given operation and operand pair,
//! and [`validate`] checks that operand and result shapes are
//! compatible with the operation's semantics. Neither allocates,
//! blocks, or touches element data; callers may invoke them
//! concurrently on independent handle sets.

use crate::handle::MatrixHandle;
use crate::op::Operation;

/// Computes the result shape for `op` applied to `a` and `b`, writing
/// it into `result`'s shape fields.
///
/// The default is shape-preserving: `result` takes `a`'s shape (or
/// `1x1` when `a` is absent). Operations that contract, extract, or
/// broadcast override the default:
///
/// - `DotProduct` produces a scalar.
/// - `Multiply` with a non-scalar `b` composes shapes the standard
///   matrix-multiply way (rows of `a`, columns of `b`).
/// - `GetColumn` / `GetRow` produce a vector with `column_hint` equal
///   to its own length.
/// - `Add` / `MultiplyElementwise` with `b` present broadcast to the
///   elementwise maximum of the two shapes.
///
/// Sizing is advisory and never fails; callers that pre-size `result`
/// themselves rely on [`validate`] as the enforcement point. Storage
/// is untouched; call [`MatrixHandle::resize_to_shape`] afterwards to
/// bring the buffer in line.
pub fn size_result(
    op: Operation,
    a: Option<&MatrixHandle>,
    b: Option<&MatrixHandle>,
    result: &mut MatrixHandle,
) {
    let (count, column_hint) = match a {
        Some(a) => (a.count(), a.column_hint()),
        None => (1, 1),
    };
    result.set_shape(count, column_hint);

    let Some(a) = a else {
        return;
    };

    match op {
        Operation::DotProduct => {
            result.set_shape(1, 1);
        }
        Operation::Multiply => {
            if let Some(b) = b {
                if a.column_hint() != 0 && b.count() > 1 {
                    result.set_shape(b.column_hint() * a.rows(), b.column_hint());
                }
            }
        }
        Operation::GetColumn => {
            let n = a.rows();
            result.set_shape(n, n);
        }
        Operation::GetRow => {
            let n = a.column_hint();
            result.set_shape(n, n);
        }
        Operation::MultiplyElementwise | Operation::Add => {
            if let Some(b) = b {
                result.set_shape(
                    a.count().max(b.count()),
                    a.column_hint().max(b.column_hint()),
                );
            }
        }
        _ => {}
    }
}

/// Checks that the operand and result shapes are compatible with `op`.
///
/// Returns `false` when `a` or `result` is absent; every operation
/// needs at least one input and a result target. Operations with real
/// shape hazards impose explicit rules:
///
/// - `DotProduct`: equal operand lengths and a scalar result.
/// - `Multiply`: without `b`, the result must match `a` exactly (the
///   in-place/scalar case); with `b`, standard conformability, or
///   either operand being a scalar.
/// - `Add` / `MultiplyElementwise`: without `b`, exact match with `a`;
///   with `b`, any of: identical shapes, a shared column or row count,
///   a scalar operand, or a result equal to the broadcast maximum.
///
/// Every other operation validates `true`. This permissive default is
/// part of the contract: reductions like `MinIndex` or `Norm2` carry
/// no shape rule here, so callers pre-sizing their results for those
/// operations get no protection from this function.
///
/// A `false` return means "do not execute"; this function is a
/// predicate and never panics, not even on degenerate shapes with a
/// zero `column_hint`.
pub fn validate(
    op: Operation,
    a: Option<&MatrixHandle>,
    b: Option<&MatrixHandle>,
    result: Option<&MatrixHandle>,
) -> bool {
    let (Some(a), Some(result)) = (a, result) else {
        return false;
    };

    match op {
        Operation::DotProduct => match b {
            Some(b) => a.count() == b.count() && result.count() == 1,
            None => false,
        },
        Operation::Multiply => match b {
            None => a.shape() == result.shape(),
            Some(b) => {
                let conformable = a.column_hint() == b.rows()
                    && b.column_hint() == result.column_hint()
                    && a.rows() == result.rows();
                // scalar operands model A*5 regardless of conformability
                conformable || b.count() == 1 || a.count() == 1
            }
        },
        Operation::Add | Operation::MultiplyElementwise => match b {
            None => a.shape() == result.shape(),
            Some(b) => {
                let same_shape = a.count() == b.count() && a.column_hint() == b.column_hint();
                let shared_axis = a.column_hint() == b.column_hint() || a.rows() == b.rows();
                let scalar_operand = a.count() == 1 || b.count() == 1;
                let broadcast_result = a.count().max(b.count()) == result.count()
                    && a.column_hint().max(b.column_hint()) == result.column_hint();
                same_shape || shared_axis || scalar_operand || broadcast_result
            }
        },
        _ => true,
    }
}

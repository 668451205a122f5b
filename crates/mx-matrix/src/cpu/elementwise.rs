use crate::error::Result;
use crate::handle::MatrixHandle;

/// How an operand maps onto the result's element positions.
#[derive(Debug, Clone, Copy)]
enum Broadcast {
    /// Same element count as the result; index passes through.
    Exact,
    /// Single element repeated everywhere.
    Scalar,
    /// One value per result row (a proper column, `column_hint == 1`).
    PerRow { result_cols: usize },
    /// Shorter operand repeated cyclically (row-vector broadcast;
    /// a row of length c tiles a row-major matrix with c columns).
    Cyclic { len: usize },
}

impl Broadcast {
    fn select(operand: &MatrixHandle, result: &MatrixHandle) -> Broadcast {
        if operand.count() == 1 {
            Broadcast::Scalar
        } else if operand.count() == result.count() {
            Broadcast::Exact
        } else if operand.column_hint() == 1 && operand.count() == result.rows() {
            Broadcast::PerRow {
                result_cols: result.column_hint().max(1),
            }
        } else {
            Broadcast::Cyclic {
                len: operand.count().max(1),
            }
        }
    }

    fn index(self, i: usize) -> usize {
        match self {
            Broadcast::Exact => i,
            Broadcast::Scalar => 0,
            Broadcast::PerRow { result_cols } => i / result_cols,
            Broadcast::Cyclic { len } => i % len,
        }
    }
}

/// Applies `f` elementwise over `a` and `b` into `result`, broadcasting
/// either operand when its shape is smaller than the result's.
///
/// The result's shape fields decide the iteration space; callers size
/// it first (or pre-size it and validate). Supported operand layouts:
/// exact match, scalar, column (`column_hint == 1` with one value per
/// result row), and anything shorter tiled cyclically, which covers
/// the row-vector case.
pub(crate) fn broadcast_apply<F>(
    a: &MatrixHandle,
    b: &MatrixHandle,
    result: &mut MatrixHandle,
    f: F,
) -> Result<()>
where
    F: Fn(f32, f32) -> f32,
{
    let a_map = Broadcast::select(a, result);
    let b_map = Broadcast::select(b, result);
    let a_data = a.data()?.to_vec();
    let b_data = b.data()?.to_vec();
    if a_data.is_empty() || b_data.is_empty() {
        return Err(crate::error::MatrixError::Storage(
            "broadcast: operand buffer is empty".to_string(),
        ));
    }
    let out = result.data_mut()?;
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = f(a_data[a_map.index(i)], b_data[b_map.index(i)]);
    }
    Ok(())
}

/// Applies `f` to every element of `a` into `result`. Both must hold
/// the same element count.
pub(crate) fn map<F>(a: &MatrixHandle, result: &mut MatrixHandle, f: F) -> Result<()>
where
    F: Fn(f32) -> f32,
{
    let src = a.data()?.to_vec();
    let out = result.data_mut()?;
    if out.len() != src.len() {
        return Err(crate::error::MatrixError::Storage(format!(
            "map: result has {} elements but input has {}",
            out.len(),
            src.len()
        )));
    }
    for (slot, v) in out.iter_mut().zip(src) {
        *slot = f(v);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_add() {
        let a = MatrixHandle::new(vec![1.0, 2.0, 3.0, 4.0], 2);
        let b = MatrixHandle::new(vec![10.0, 20.0, 30.0, 40.0], 2);
        let mut result = MatrixHandle::zeros(4, 2);
        broadcast_apply(&a, &b, &mut result, |x, y| x + y).unwrap();
        assert_eq!(result.data().unwrap(), &[11.0, 22.0, 33.0, 44.0]);
    }

    #[test]
    fn test_scalar_broadcast() {
        let a = MatrixHandle::new(vec![1.0, 2.0, 3.0, 4.0], 2);
        let b = MatrixHandle::scalar(10.0);
        let mut result = MatrixHandle::zeros(4, 2);
        broadcast_apply(&a, &b, &mut result, |x, y| x * y).unwrap();
        assert_eq!(result.data().unwrap(), &[10.0, 20.0, 30.0, 40.0]);

        // scalar on the left as well
        let mut result = MatrixHandle::zeros(4, 2);
        broadcast_apply(&b, &a, &mut result, |x, y| x - y).unwrap();
        assert_eq!(result.data().unwrap(), &[9.0, 8.0, 7.0, 6.0]);
    }

    #[test]
    fn test_row_vector_broadcast() {
        // 2x3 matrix plus a row of length 3, tiled across both rows
        let a = MatrixHandle::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3);
        let row = MatrixHandle::row_vector(vec![10.0, 20.0, 30.0]);
        let mut result = MatrixHandle::zeros(6, 3);
        broadcast_apply(&a, &row, &mut result, |x, y| x + y).unwrap();
        assert_eq!(result.data().unwrap(), &[11.0, 22.0, 33.0, 14.0, 25.0, 36.0]);
    }

    #[test]
    fn test_column_broadcast() {
        // 2x3 matrix plus a 2x1 column, one value per row
        let a = MatrixHandle::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3);
        let col = MatrixHandle::new(vec![10.0, 20.0], 1);
        let mut result = MatrixHandle::zeros(6, 3);
        broadcast_apply(&a, &col, &mut result, |x, y| x + y).unwrap();
        assert_eq!(result.data().unwrap(), &[11.0, 12.0, 13.0, 24.0, 25.0, 26.0]);
    }

    #[test]
    fn test_empty_operand_is_an_error() {
        // an empty handle passes validation via the shared-column
        // clause; the kernel must refuse it rather than index into it
        let empty = MatrixHandle::zeros(0, 1);
        let b = MatrixHandle::new(vec![1.0, 2.0, 3.0], 1);
        let mut result = MatrixHandle::zeros(3, 1);
        assert!(broadcast_apply(&empty, &b, &mut result, |x, y| x + y).is_err());
        assert!(broadcast_apply(&b, &empty, &mut result, |x, y| x + y).is_err());
    }

    #[test]
    fn test_map() {
        let a = MatrixHandle::new(vec![1.0, -2.0, 3.0], 3);
        let mut result = MatrixHandle::zeros(3, 3);
        map(&a, &mut result, f32::abs).unwrap();
        assert_eq!(result.data().unwrap(), &[1.0, 2.0, 3.0]);
    }
}

use crate::error::Result;
use crate::storage::MatrixStorage;
use std::fmt;

/// A handle to a rectangular numeric buffer.
///
/// The shape engine treats a handle purely as a `(count, column_hint)`
/// pair: `count` is the total element count and `column_hint` the
/// declared number of columns, so `count / column_hint` is the implied
/// row count. A vector is stored with `column_hint` equal to its own
/// length, which is the convention that marks it as a vector rather
/// than a matrix; a scalar has `count == column_hint == 1`.
///
/// Handles are created and owned by the caller. Sizing writes only the
/// shape fields; [`MatrixHandle::resize_to_shape`] brings the backing
/// buffer in line afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixHandle {
    count: usize,
    column_hint: usize,
    storage: MatrixStorage,
}

impl MatrixHandle {
    /// Create a handle from f32 data and a declared column count.
    ///
    /// # Panics
    /// Panics if `column_hint` does not divide `data.len()` evenly.
    pub fn new(data: Vec<f32>, column_hint: usize) -> Self {
        assert!(
            column_hint > 0 && data.len() % column_hint == 0,
            "column hint {} does not divide element count {}",
            column_hint,
            data.len()
        );
        MatrixHandle {
            count: data.len(),
            column_hint,
            storage: MatrixStorage::from_f32_vec(data),
        }
    }

    /// Create a zero-filled handle with the given shape.
    pub fn zeros(count: usize, column_hint: usize) -> Self {
        MatrixHandle {
            count,
            column_hint,
            storage: MatrixStorage::zeros(count),
        }
    }

    /// Create a scalar handle (`count == column_hint == 1`).
    pub fn scalar(value: f32) -> Self {
        MatrixHandle {
            count: 1,
            column_hint: 1,
            storage: MatrixStorage::from_f32_vec(vec![value]),
        }
    }

    /// Create a row-vector handle (`column_hint == count`).
    pub fn row_vector(data: Vec<f32>) -> Self {
        let n = data.len();
        MatrixHandle {
            count: n,
            column_hint: n,
            storage: MatrixStorage::from_f32_vec(data),
        }
    }

    /// Create a column-vector handle, stored with the same
    /// `column_hint == count` convention as a row vector.
    pub fn column_vector(data: Vec<f32>) -> Self {
        Self::row_vector(data)
    }

    /// Total element count.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Declared column count.
    pub fn column_hint(&self) -> usize {
        self.column_hint
    }

    /// Implied row count, `count / column_hint`.
    ///
    /// Returns 0 for a degenerate handle with `column_hint == 0`, so
    /// shape arithmetic on malformed handles fails equality checks
    /// instead of dividing by zero.
    pub fn rows(&self) -> usize {
        if self.column_hint == 0 {
            0
        } else {
            self.count / self.column_hint
        }
    }

    /// The shape fields as a `(count, column_hint)` pair.
    pub fn shape(&self) -> (usize, usize) {
        (self.count, self.column_hint)
    }

    /// Overwrite the shape fields. Does not touch storage.
    pub fn set_shape(&mut self, count: usize, column_hint: usize) {
        self.count = count;
        self.column_hint = column_hint;
    }

    /// Resize the backing buffer to match `count`, zero-filling growth.
    pub fn resize_to_shape(&mut self) {
        self.storage.resize(self.count);
    }

    /// Read access to the element data.
    pub fn data(&self) -> Result<&[f32]> {
        self.storage.check_len(self.count, "matrix data")?;
        self.storage.as_f32_slice()
    }

    /// Mutable access to the element data.
    pub fn data_mut(&mut self) -> Result<&mut [f32]> {
        self.storage.check_len(self.count, "matrix data")?;
        self.storage.as_f32_slice_mut()
    }

    /// The underlying storage.
    pub fn storage(&self) -> &MatrixStorage {
        &self.storage
    }
}

impl fmt::Display for MatrixHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}x{}]", self.rows(), self.column_hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_handle() {
        let m = MatrixHandle::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3);
        assert_eq!(m.count(), 6);
        assert_eq!(m.column_hint(), 3);
        assert_eq!(m.rows(), 2);
        assert_eq!(m.data().unwrap(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    #[should_panic]
    fn test_new_rejects_uneven_hint() {
        MatrixHandle::new(vec![1.0, 2.0, 3.0], 2);
    }

    #[test]
    fn test_scalar() {
        let s = MatrixHandle::scalar(7.0);
        assert_eq!(s.shape(), (1, 1));
        assert_eq!(s.data().unwrap(), &[7.0]);
    }

    #[test]
    fn test_vector_convention() {
        let v = MatrixHandle::row_vector(vec![1.0, 2.0, 3.0]);
        assert_eq!(v.count(), 3);
        assert_eq!(v.column_hint(), 3);
        assert_eq!(v.rows(), 1);
    }

    #[test]
    fn test_set_shape_and_resize() {
        let mut m = MatrixHandle::zeros(4, 2);
        m.set_shape(6, 3);
        assert_eq!(m.shape(), (6, 3));
        // shape and buffer disagree until resized
        assert!(m.data().is_err());
        m.resize_to_shape();
        assert_eq!(m.data().unwrap().len(), 6);
    }

    #[test]
    fn test_degenerate_rows() {
        let mut m = MatrixHandle::zeros(4, 2);
        m.set_shape(4, 0);
        assert_eq!(m.rows(), 0);
    }
}

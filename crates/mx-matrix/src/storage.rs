use crate::error::{MatrixError, Result};

/// Backing storage for a matrix handle.
///
/// A single-variant enum today (host f32 buffers); additional variants
/// (device-resident buffers, other element types) slot in without
/// changing the handle API.
#[derive(Debug, Clone, PartialEq)]
pub enum MatrixStorage {
    /// 32-bit floating point host storage.
    F32(Vec<f32>),
}

impl MatrixStorage {
    /// Number of elements in this storage.
    pub fn len(&self) -> usize {
        match self {
            MatrixStorage::F32(v) => v.len(),
        }
    }

    /// Returns true if the storage contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the data as an f32 slice.
    ///
    /// # Errors
    /// Returns an error if the storage is not F32.
    pub fn as_f32_slice(&self) -> Result<&[f32]> {
        match self {
            MatrixStorage::F32(v) => Ok(v.as_slice()),
        }
    }

    /// Returns the data as a mutable f32 slice.
    ///
    /// # Errors
    /// Returns an error if the storage is not F32.
    pub fn as_f32_slice_mut(&mut self) -> Result<&mut [f32]> {
        match self {
            MatrixStorage::F32(v) => Ok(v.as_mut_slice()),
        }
    }

    /// Create zero-filled storage with `n` elements.
    pub fn zeros(n: usize) -> Self {
        MatrixStorage::F32(vec![0.0; n])
    }

    /// Create storage from an f32 vector.
    pub fn from_f32_vec(data: Vec<f32>) -> Self {
        MatrixStorage::F32(data)
    }

    /// Resize the storage to `n` elements, zero-filling any growth.
    pub fn resize(&mut self, n: usize) {
        match self {
            MatrixStorage::F32(v) => v.resize(n, 0.0),
        }
    }

    /// Verifies that the buffer holds exactly `n` elements.
    pub fn check_len(&self, n: usize, what: &str) -> Result<()> {
        if self.len() != n {
            return Err(MatrixError::Storage(format!(
                "{}: buffer has {} elements but shape declares {}",
                what,
                self.len(),
                n
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_f32_vec() {
        let s = MatrixStorage::from_f32_vec(vec![1.0, 2.0, 3.0]);
        assert_eq!(s.len(), 3);
        assert!(!s.is_empty());
        assert_eq!(s.as_f32_slice().unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_zeros_and_resize() {
        let mut s = MatrixStorage::zeros(2);
        assert_eq!(s.as_f32_slice().unwrap(), &[0.0, 0.0]);
        s.resize(4);
        assert_eq!(s.len(), 4);
        s.resize(1);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_check_len() {
        let s = MatrixStorage::zeros(3);
        assert!(s.check_len(3, "test").is_ok());
        assert!(s.check_len(4, "test").is_err());
    }

    #[test]
    fn test_mutation() {
        let mut s = MatrixStorage::from_f32_vec(vec![1.0, 2.0]);
        s.as_f32_slice_mut().unwrap()[0] = 5.0;
        assert_eq!(s.as_f32_slice().unwrap(), &[5.0, 2.0]);
    }
}

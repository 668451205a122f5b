use crate::error::{MatrixError, Result};

/// Row-major matrix multiply: `out = a @ b` with `a` of shape [m, k]
/// and `b` of shape [k, n].
pub(crate) fn matmul(
    a: &[f32],
    b: &[f32],
    m: usize,
    k: usize,
    n: usize,
    out: &mut [f32],
) -> Result<()> {
    if a.len() != m * k {
        return Err(MatrixError::Storage(format!(
            "matmul: a has {} elements but expected m*k={}",
            a.len(),
            m * k
        )));
    }
    if b.len() != k * n {
        return Err(MatrixError::Storage(format!(
            "matmul: b has {} elements but expected k*n={}",
            b.len(),
            k * n
        )));
    }
    if out.len() != m * n {
        return Err(MatrixError::Storage(format!(
            "matmul: out has {} elements but expected m*n={}",
            out.len(),
            m * n
        )));
    }

    for i in 0..m {
        for j in 0..n {
            let mut sum = 0.0f32;
            for p in 0..k {
                sum += a[i * k + p] * b[p * n + j];
            }
            out[i * n + j] = sum;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matmul_2x3_3x2() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        let mut out = [0.0; 4];
        matmul(&a, &b, 2, 3, 2, &mut out).unwrap();
        assert_eq!(out, [58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn test_matmul_identity() {
        let a = [3.0, -1.0, 0.5, 2.0];
        let eye = [1.0, 0.0, 0.0, 1.0];
        let mut out = [0.0; 4];
        matmul(&a, &eye, 2, 2, 2, &mut out).unwrap();
        assert_eq!(out, a);
    }

    #[test]
    fn test_matmul_rejects_bad_buffers() {
        let a = [1.0; 5];
        let b = [1.0; 6];
        let mut out = [0.0; 4];
        assert!(matmul(&a, &b, 2, 3, 2, &mut out).is_err());
    }
}

use crate::error::{MatrixError, Result};

/// Dot product of two equal-length slices.
pub(crate) fn dot(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(MatrixError::Storage(format!(
            "dot: operand lengths differ ({} vs {})",
            a.len(),
            b.len()
        )));
    }
    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

/// Index of the smallest element.
pub(crate) fn min_index(a: &[f32]) -> Result<usize> {
    extreme_index(a, |candidate, best| candidate < best)
}

/// Index of the largest element.
pub(crate) fn max_index(a: &[f32]) -> Result<usize> {
    extreme_index(a, |candidate, best| candidate > best)
}

fn extreme_index<F>(a: &[f32], better: F) -> Result<usize>
where
    F: Fn(f32, f32) -> bool,
{
    if a.is_empty() {
        return Err(MatrixError::Storage(
            "index reduction over an empty matrix".to_string(),
        ));
    }
    let mut best = 0;
    for (i, &v) in a.iter().enumerate().skip(1) {
        if better(v, a[best]) {
            best = i;
        }
    }
    Ok(best)
}

/// Euclidean (L2) norm.
pub(crate) fn norm2(a: &[f32]) -> f32 {
    a.iter().map(|v| v * v).sum::<f32>().sqrt()
}

/// Euclidean distance between two equal-length slices.
pub(crate) fn euclidean_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(MatrixError::Storage(format!(
            "euclidean_distance: operand lengths differ ({} vs {})",
            a.len(),
            b.len()
        )));
    }
    Ok(a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt())
}

/// Cosine distance, `1 - cos(a, b)`. Zero when either operand has a
/// zero norm.
pub(crate) fn cosine_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    let denom = norm2(a) * norm2(b);
    if denom == 0.0 {
        return Ok(0.0);
    }
    Ok(1.0 - dot(a, b)? / denom)
}

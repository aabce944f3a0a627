use crate::error::{Result, VectorStoreError};

/// Cosine similarity of two equal-length, non-zero vectors, in `[-1, 1]`.
///
/// Accumulates in `f64`, so finite inputs never overflow or underflow and the
/// score is always finite.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(VectorStoreError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    if !is_finite(a) || !is_finite(b) {
        return Err(VectorStoreError::NonFiniteVector);
    }

    let norm_a = squared_norm(a);
    let norm_b = squared_norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(VectorStoreError::ZeroVector);
    }
    let dot_product: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum();

    // Rounding can push |v|·|v| slightly past the dot product.
    Ok((dot_product / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0) as f32)
}

fn squared_norm(vector: &[f32]) -> f64 {
    vector.iter().map(|x| f64::from(*x) * f64::from(*x)).sum()
}

/// Zero in the sense [`cosine_similarity`] rejects.
pub(crate) fn is_zero(vector: &[f32]) -> bool {
    squared_norm(vector) == 0.0
}

pub(crate) fn is_finite(vector: &[f32]) -> bool {
    vector.iter().all(|x| x.is_finite())
}

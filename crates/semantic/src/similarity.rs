use serde::{Deserialize, Serialize};

const SIMD_CHUNK_SIZE: usize = 32;

/// How two embeddings are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityStrategy {
    /// Plain dot product. Only meaningful when both sides are unit vectors.
    Dot,
    /// Dot product divided by both norms.
    #[default]
    Cosine,
}

impl SimilarityStrategy {
    /// Fast path when `assume_normalized`, safe path otherwise.
    pub fn for_normalized_inputs(assume_normalized: bool) -> Self {
        if assume_normalized {
            SimilarityStrategy::Dot
        } else {
            SimilarityStrategy::Cosine
        }
    }

    #[inline]
    pub fn similarity(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            SimilarityStrategy::Dot => dot(a, b),
            SimilarityStrategy::Cosine => cosine(a, b),
        }
    }
}

/// Dot product of two vectors, clamped to `[-1, 1]`.
///
/// Returns 0 when either side is empty or the lengths differ.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (d, _, _) = accumulate(a, b);
    clamp_unit(d)
}

/// Cosine similarity with explicit norm division.
///
/// Returns 0 when either side is empty, the lengths differ, or either norm
/// is zero.
#[inline]
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (d, norm_a_sq, norm_b_sq) = accumulate(a, b);
    let denom = norm_a_sq.sqrt() * norm_b_sq.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    clamp_unit(d / denom)
}

/// Safe-path cosine similarity; alias of [`cosine`].
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    cosine(a, b)
}

/// Dot product and both squared norms in one pass, chunked so the inner
/// loop auto-vectorizes.
fn accumulate(a: &[f32], b: &[f32]) -> (f32, f32, f32) {
    let mut d = 0.0f32;
    let mut na = 0.0f32;
    let mut nb = 0.0f32;

    let mut a_chunks = a.chunks_exact(SIMD_CHUNK_SIZE);
    let mut b_chunks = b.chunks_exact(SIMD_CHUNK_SIZE);
    for (ca, cb) in (&mut a_chunks).zip(&mut b_chunks) {
        let (cd, cna, cnb) = chunk_sums(ca, cb);
        d += cd;
        na += cna;
        nb += cnb;
    }

    let (cd, cna, cnb) = chunk_sums(a_chunks.remainder(), b_chunks.remainder());
    (d + cd, na + cna, nb + cnb)
}

#[inline(always)]
fn chunk_sums(a: &[f32], b: &[f32]) -> (f32, f32, f32) {
    a.iter()
        .zip(b)
        .fold((0.0, 0.0, 0.0), |(d, na, nb), (&x, &y)| {
            (d + x * y, na + x * x, nb + y * y)
        })
}

#[inline]
fn clamp_unit(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(-1.0, 1.0)
    }
}

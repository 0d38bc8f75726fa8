/// Euclidean (L2) norm of `v`.
#[inline]
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Rescale `v` in place to unit L2 norm.
///
/// Zero (and non-finite-norm) vectors are left untouched so callers never
/// see a division by zero.
pub fn normalize(v: &mut [f32]) {
    let norm_sq: f32 = v.iter().map(|x| x * x).sum();
    if norm_sq > 0.0 && norm_sq.is_finite() {
        let inv_norm = norm_sq.sqrt().recip();
        for x in v.iter_mut() {
            *x *= inv_norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_vector_becomes_unit() {
        let mut v = vec![3.0f32, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn unit_vector_is_unchanged() {
        let mut v = vec![0.0f32, 1.0, 0.0];
        normalize(&mut v);
        assert_eq!(v, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn zero_vector_stays_zero() {
        let mut v = vec![0.0f32; 4];
        normalize(&mut v);
        assert_eq!(v, vec![0.0; 4]);
    }

    #[test]
    fn empty_slice_is_a_noop() {
        let mut v: Vec<f32> = Vec::new();
        normalize(&mut v);
        assert!(v.is_empty());
    }

    #[test]
    fn negative_values_keep_their_sign() {
        let mut v = vec![-3.0f32, -4.0];
        normalize(&mut v);
        assert!((v[0] + 0.6).abs() < 1e-6);
        assert!((v[1] + 0.8).abs() < 1e-6);
    }

    #[test]
    fn large_vector_has_unit_norm() {
        let mut v: Vec<f32> = (0..1536).map(|i| (i % 17) as f32 - 8.0).collect();
        normalize(&mut v);
        assert!((l2_norm(&v) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn idempotent() {
        let mut v = vec![1.0f32, 2.0, 3.0];
        normalize(&mut v);
        let first = v.clone();
        normalize(&mut v);
        for (a, b) in v.iter().zip(first.iter()) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
    }

    #[test]
    fn infinite_components_are_left_alone() {
        let mut v = vec![f32::INFINITY, 1.0];
        normalize(&mut v);
        assert_eq!(v[1], 1.0);
    }
}

//! Approximate comparison between fingerprints.
use crate::types::FingerprintResult;

/// Similarity between two fingerprints in `[-1.0, 1.0]`.
///
/// Fingerprints of different content types compare to exactly `0.0`:
/// cross-modal comparison is defined as "no similarity", not an error, even
/// when the numeric vectors happen to coincide. Same-type fingerprints are
/// scored with [`cosine_similarity`] over their feature vectors.
pub fn compare_fingerprints(a: &FingerprintResult, b: &FingerprintResult) -> f64 {
    if a.content_type != b.content_type {
        return 0.0;
    }
    cosine_similarity(&a.features, &b.features)
}

/// Cosine similarity over the first `min(a.len(), b.len())` components.
///
/// The longer vector's tail is ignored so that vectors produced by
/// different extractor versions stay comparable. Norms are computed over
/// the same prefix. A zero-norm prefix on either side yields `0.0`; zero
/// vectors are maximally dissimilar to everything, including themselves.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let len = a.len().min(b.len());

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for i in 0..len {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

//! Feature extraction, one submodule per modality.
//!
//! Every extractor funnels into the same normalized output shape,
//! [`ExtractedFeatures`], and validates its vector before returning: the
//! assembler never sees an empty or non-finite vector.
use crate::error::FingerprintError;
use crate::types::ContentType;

pub mod audio;
pub mod image;
pub mod text;

/// Normalized extractor output: an ordered, finite feature vector and the
/// extractor's confidence in it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFeatures {
    pub values: Vec<f64>,
    pub confidence: f64,
}

/// Reject empty and non-finite vectors.
///
/// A vector that trips this check is an extraction failure; it must never
/// flow into a fingerprint.
pub(crate) fn validate_features(
    content_type: ContentType,
    values: &[f64],
) -> Result<(), FingerprintError> {
    if values.is_empty() {
        return Err(FingerprintError::InvalidFeatureVector(format!(
            "{content_type} extractor produced an empty vector"
        )));
    }
    for (index, value) in values.iter().enumerate() {
        if !value.is_finite() {
            return Err(FingerprintError::InvalidFeatureVector(format!(
                "{content_type} extractor produced non-finite value {value} at index {index}"
            )));
        }
    }
    Ok(())
}

/// In-place L2 normalization. Zero vectors pass through unchanged.
pub(crate) fn l2_normalize_in_place(v: &mut [f32]) {
    let norm_sq: f32 = v.iter().map(|x| x * x).sum();
    if norm_sq > 0.0 {
        let inv_norm = norm_sq.sqrt().recip();
        for x in v.iter_mut() {
            *x *= inv_norm;
        }
    }
}

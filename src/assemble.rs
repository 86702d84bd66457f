//! Fingerprint assembly: feature vector + content type → immutable record.
use chrono::Utc;

use crate::error::FingerprintError;
use crate::extract::validate_features;
use crate::hash::{format_token, token_hash};
use crate::types::{ContentType, FingerprintResult};

/// Build the hash material for a feature vector: the uppercase content-type
/// prefix followed by every feature rendered with exactly six decimal
/// digits, joined with no separator.
///
/// The fixed-point formatting is load-bearing: vectors that differ only
/// beyond the sixth decimal place intentionally collapse to the same token,
/// which keeps fingerprints stable across minor float noise (model version
/// drift, platform rounding).
pub fn fingerprint_token(content_type: ContentType, features: &[f64]) -> String {
    let mut material = String::with_capacity(content_type.token_prefix().len() + features.len() * 9);
    material.push_str(content_type.token_prefix());
    for feature in features {
        material.push_str(&format!("{feature:.6}"));
    }
    format_token(content_type, token_hash(&material))
}

/// Assemble a [`FingerprintResult`] from extractor output.
///
/// Rejects empty and non-finite vectors; a bad vector is an extraction
/// failure and never becomes a result. Confidence is clamped into
/// `[0.0, 1.0]` and the timestamp is taken at call time.
pub fn assemble_fingerprint(
    content_type: ContentType,
    features: &[f64],
    confidence: f64,
) -> Result<FingerprintResult, FingerprintError> {
    validate_features(content_type, features)?;

    Ok(FingerprintResult {
        fingerprint: fingerprint_token(content_type, features),
        confidence: confidence.clamp(0.0, 1.0),
        content_type,
        features: features.to_vec(),
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_text_token() {
        assert_eq!(
            fingerprint_token(ContentType::Text, &[0.1, 0.2]),
            "TEXT_2923A306"
        );
    }

    #[test]
    fn pinned_image_token() {
        assert_eq!(
            fingerprint_token(ContentType::Image, &[0.9, 0.05, 0.03]),
            "IMAGE_3A5B3154"
        );
    }

    #[test]
    fn pinned_audio_token() {
        assert_eq!(
            fingerprint_token(ContentType::Audio, &[0.25, 1.5, 1.7]),
            "AUDIO_8BDABDB"
        );
    }

    #[test]
    fn deterministic_across_calls() {
        let a = assemble_fingerprint(ContentType::Text, &[0.1, 0.2], 0.95).unwrap();
        let b = assemble_fingerprint(ContentType::Text, &[0.1, 0.2], 0.95).unwrap();
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_eq!(a.features, b.features);
    }

    #[test]
    fn precision_beyond_six_decimals_is_ignored() {
        let base = fingerprint_token(ContentType::Text, &[0.1, 0.2]);
        let noisy = fingerprint_token(ContentType::Text, &[0.100_000_04, 0.200_000_04]);
        assert_eq!(base, noisy);
    }

    #[test]
    fn sixth_decimal_still_matters() {
        let base = fingerprint_token(ContentType::Text, &[0.1, 0.2]);
        let shifted = fingerprint_token(ContentType::Text, &[0.100_001, 0.2]);
        assert_ne!(base, shifted);
    }

    #[test]
    fn same_features_different_type_differ() {
        let text = fingerprint_token(ContentType::Text, &[0.5, 0.5]);
        let audio = fingerprint_token(ContentType::Audio, &[0.5, 0.5]);
        assert_ne!(text, audio);
    }

    #[test]
    fn order_is_significant() {
        let ab = fingerprint_token(ContentType::Image, &[0.1, 0.9]);
        let ba = fingerprint_token(ContentType::Image, &[0.9, 0.1]);
        assert_ne!(ab, ba);
    }

    #[test]
    fn empty_features_rejected() {
        let err = assemble_fingerprint(ContentType::Image, &[], 0.8).unwrap_err();
        assert!(matches!(err, FingerprintError::InvalidFeatureVector(_)));
    }

    #[test]
    fn non_finite_features_rejected() {
        let err = assemble_fingerprint(ContentType::Text, &[0.1, f64::NAN], 0.95).unwrap_err();
        assert!(matches!(err, FingerprintError::InvalidFeatureVector(_)));

        let err =
            assemble_fingerprint(ContentType::Text, &[f64::INFINITY], 0.95).unwrap_err();
        assert!(matches!(err, FingerprintError::InvalidFeatureVector(_)));
    }

    #[test]
    fn confidence_clamped_into_unit_interval() {
        let over = assemble_fingerprint(ContentType::Audio, &[0.5], 1.5).unwrap();
        assert_eq!(over.confidence, 1.0);
        let under = assemble_fingerprint(ContentType::Audio, &[0.5], -0.1).unwrap();
        assert_eq!(under.confidence, 0.0);
    }

    #[test]
    fn result_carries_inputs_through() {
        let result = assemble_fingerprint(ContentType::Audio, &[0.25, 1.5, 1.7], 0.85).unwrap();
        assert_eq!(result.content_type, ContentType::Audio);
        assert_eq!(result.features, vec![0.25, 1.5, 1.7]);
        assert_eq!(result.confidence, 0.85);
        assert_eq!(result.fingerprint, "AUDIO_8BDABDB");
    }

    #[test]
    fn negative_features_format_with_sign() {
        // "-0.500000" participates in the hash material; a sign flip must
        // change the token.
        let pos = fingerprint_token(ContentType::Text, &[0.5]);
        let neg = fingerprint_token(ContentType::Text, &[-0.5]);
        assert_ne!(pos, neg);
    }
}

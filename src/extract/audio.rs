//! Audio feature extraction.
//!
//! Deliberately model-free: a rolling content hash over the leading bytes
//! stands in for acoustic analysis. Genuine acoustic fingerprinting
//! (spectral peaks, chroma, etc.) is a future extension, not a gap in this
//! extractor. The resulting three-element vector is:
//!
//! ```text
//! [normalized_byte_hash, file_size_megabytes, modified_epoch_gigaseconds]
//! ```
use chrono::{DateTime, Utc};

use crate::config::AudioExtractorConfig;
use crate::error::FingerprintError;
use crate::extract::{validate_features, ExtractedFeatures};
use crate::types::ContentType;

const CONFIDENCE: f64 = 0.85;

/// Rolling 32-bit content hash over at most `limit` leading bytes:
/// `hash = (hash << 5) - hash + byte`, wrapping. Zero input yields `0`.
pub fn byte_hash(bytes: &[u8], limit: usize) -> i32 {
    let mut hash: i32 = 0;
    for &byte in bytes.iter().take(limit) {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(byte));
    }
    hash
}

/// Extract the audio feature vector.
///
/// The wrapped hash is reinterpreted as `u32` before normalization so the
/// first feature lands in `[0, 1]` regardless of accumulator sign. An
/// empty payload is valid and produces `[0.0, 0.0, t]`.
pub(crate) fn extract(
    bytes: &[u8],
    modified_at: DateTime<Utc>,
    cfg: &AudioExtractorConfig,
) -> Result<ExtractedFeatures, FingerprintError> {
    let hash = byte_hash(bytes, cfg.scan_limit_bytes);
    let normalized = f64::from(hash as u32) / f64::from(u32::MAX);
    let size_megabytes = bytes.len() as f64 / 1_000_000.0;
    let modified_gigaseconds = modified_at.timestamp_millis() as f64 / 1_000_000_000.0;

    let values = vec![normalized, size_megabytes, modified_gigaseconds];
    validate_features(ContentType::Audio, &values)?;

    Ok(ExtractedFeatures {
        values,
        confidence: CONFIDENCE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cfg() -> AudioExtractorConfig {
        AudioExtractorConfig::default()
    }

    fn modified() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn byte_hash_known_values() {
        assert_eq!(byte_hash(&[], 10_000), 0);
        // (0*31+1)*31+2)*31+3 = 1026
        assert_eq!(byte_hash(&[1, 2, 3], 10_000), 1026);
    }

    #[test]
    fn byte_hash_respects_scan_limit() {
        let payload = vec![7u8; 64];
        assert_eq!(byte_hash(&payload, 16), byte_hash(&payload[..16], 16));
        assert_ne!(byte_hash(&payload, 16), byte_hash(&payload, 32));
    }

    #[test]
    fn bytes_beyond_limit_do_not_change_the_hash() {
        let mut payload = vec![1u8; 10_000];
        let base = byte_hash(&payload, 10_000);
        payload.extend_from_slice(&[0xFF; 500]);
        assert_eq!(byte_hash(&payload, 10_000), base);
    }

    #[test]
    fn empty_payload_yields_zero_features() {
        let features = extract(&[], modified(), &cfg()).unwrap();
        assert_eq!(features.values.len(), 3);
        assert_eq!(features.values[0], 0.0);
        assert_eq!(features.values[1], 0.0);
        assert!(features.values[2] > 0.0);
        assert_eq!(features.confidence, 0.85);
    }

    #[test]
    fn normalized_hash_stays_in_unit_interval() {
        // Long high-byte runs drive the accumulator negative; the u32
        // reinterpretation keeps the feature non-negative.
        let payloads: [&[u8]; 3] = [&[0xFF; 4096], &[1, 2, 3], &[0x80; 33]];
        for payload in payloads {
            let features = extract(payload, modified(), &cfg()).unwrap();
            assert!((0.0..=1.0).contains(&features.values[0]), "payload {payload:?}");
        }
    }

    #[test]
    fn size_feature_is_decimal_megabytes() {
        let payload = vec![0u8; 2_500_000];
        let features = extract(&payload, modified(), &cfg()).unwrap();
        assert!((features.values[1] - 2.5).abs() < 1e-12);
    }

    #[test]
    fn modified_time_feature_is_epoch_millis_over_1e9() {
        let ts = modified();
        let features = extract(&[1], ts, &cfg()).unwrap();
        let expected = ts.timestamp_millis() as f64 / 1_000_000_000.0;
        assert_eq!(features.values[2], expected);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let payload = b"the same audio payload".to_vec();
        let a = extract(&payload, modified(), &cfg()).unwrap();
        let b = extract(&payload, modified(), &cfg()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_payloads_usually_differ() {
        let a = extract(b"first clip", modified(), &cfg()).unwrap();
        let b = extract(b"second clip", modified(), &cfg()).unwrap();
        assert_ne!(a.values[0], b.values[0]);
    }
}

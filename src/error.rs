//! Error types produced by the fingerprinting engine.
//!
//! Errors fall into three caller-visible categories:
//!
//! - **Unsupported content**: the input cannot be mapped to one of the three
//!   modalities. Fatal for that call only.
//! - **Extraction failures**: decoding errors, missing or broken model
//!   assets, inference runtime errors, and non-finite extractor output.
//!   The engine never papers over these with a placeholder fingerprint.
//! - **Payload policy**: the optional size backstop tripped before any
//!   extraction work started.
//!
//! There is no internal retry; every error is returned to the immediate
//! caller. A failed model initialization is not cached, so a later call may
//! attempt the load again.
use thiserror::Error;

/// Errors that can occur while generating or validating a fingerprint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FingerprintError {
    /// Input could not be mapped to one of `image`, `audio`, or `text`.
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// The ONNX model file is not present at the configured path.
    #[error("model file not found: {0}")]
    ModelNotFound(String),

    /// The tokenizer JSON for the text model is missing.
    #[error("tokenizer missing: {0}")]
    TokenizerMissing(String),

    /// The payload could not be decoded (corrupt image, invalid UTF-8, ...).
    #[error("content decode failure: {0}")]
    Decode(String),

    /// ONNX Runtime, tokenizer, or post-processing failure.
    #[error("inference failure: {0}")]
    Inference(String),

    /// An extractor produced an empty or non-finite feature vector. This is
    /// an internal extraction failure; it never reaches a result.
    #[error("invalid feature vector: {0}")]
    InvalidFeatureVector(String),

    /// Payload exceeds the configured size backstop.
    #[error("payload exceeds size limit: {0}")]
    PayloadTooLarge(String),
}

impl FingerprintError {
    /// True for every variant that represents a failed extraction attempt,
    /// as opposed to input that was rejected before extraction started.
    pub fn is_extraction_failure(&self) -> bool {
        !matches!(
            self,
            FingerprintError::UnsupportedContentType(_) | FingerprintError::PayloadTooLarge(_)
        )
    }
}

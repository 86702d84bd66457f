//! CCFP: Creative Content Fingerprinting
//!
//! This crate turns creative content (images, audio, text) into compact,
//! deterministic identifiers ("fingerprints") you can compare for
//! near-duplicate detection. Per item we extract a numeric feature vector,
//! hash it into a short token like `TEXT_2923A306`, and hand back an
//! immutable [`FingerprintResult`]. Any two results of the same content
//! type can later be scored with [`compare_fingerprints`].
//!
//! What this crate deliberately is *not*: an index, a dedup store, or a
//! registry of past fingerprints. It is a stateless function library plus
//! two lazily-loaded model handles; persistence and cross-item search
//! belong to whoever calls it.
//!
//! ## The three extractors
//!
//! - **Image** - an ONNX classifier's top class scores (sorted, top 10).
//! - **Audio** - a rolling byte hash plus size/mtime scalars. No model by
//!   design; real acoustic analysis is a future extension.
//! - **Text** - an ONNX embedding model, mean-pooled and L2-normalized,
//!   truncated to the leading 20 dimensions.
//!
//! The image and text models load once per [`FingerprintEngine`] (or per
//! shared [`ModelRegistry`]) on first use. Concurrent first calls perform
//! exactly one load; a failed load is not cached, so the next call
//! retries. First calls can therefore be slow; that is expected, and
//! there is no engine-imposed timeout.
//!
//! ## Quick example
//!
//! ```no_run
//! use ccfp::{compare_fingerprints, ContentPayload, EngineConfig, FingerprintEngine};
//!
//! let engine = FingerprintEngine::new(EngineConfig::default());
//!
//! let a = engine.fingerprint_text("a quick brown fox").unwrap();
//! let b = engine.fingerprint_text("a quick brown fox!").unwrap();
//! println!("{} vs {}: {:.3}", a.fingerprint, b.fingerprint, compare_fingerprints(&a, &b));
//!
//! // Or dispatch on a payload:
//! let result = engine
//!     .fingerprint(&ContentPayload::Text("hello".into()))
//!     .unwrap();
//! assert!(result.fingerprint.starts_with("TEXT_"));
//! ```
//!
//! ## Without model files
//!
//! [`EngineConfig::stub`] switches the image and text extractors to
//! deterministic pseudo-features derived from a content hash, handy in
//! tests and on machines without model assets. In the default `"onnx"`
//! mode, missing assets are a hard error; the engine never silently
//! substitutes placeholder output for a real model.
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::{info, warn, Level};

pub mod assemble;
pub mod compare;
pub mod config;
pub mod error;
pub mod extract;
pub mod hash;
pub mod registry;
pub mod types;

pub use crate::assemble::{assemble_fingerprint, fingerprint_token};
pub use crate::compare::{compare_fingerprints, cosine_similarity};
pub use crate::config::{
    AudioExtractorConfig, EngineConfig, ImageExtractorConfig, TextExtractorConfig, MODE_ONNX,
    MODE_STUB,
};
pub use crate::error::FingerprintError;
pub use crate::extract::audio::byte_hash;
pub use crate::extract::ExtractedFeatures;
pub use crate::hash::{format_token, token_hash};
pub use crate::registry::ModelRegistry;
pub use crate::types::{ContentPayload, ContentType, FingerprintResult};

/// The fingerprinting engine: configuration plus the model registry.
///
/// Cheap to construct: models load on first use, not here. Share it
/// behind an `Arc` for concurrent callers, or construct it with an
/// externally-owned [`ModelRegistry`] via [`FingerprintEngine::with_registry`]
/// when several engines should reuse the same loaded models.
pub struct FingerprintEngine {
    config: EngineConfig,
    registry: ModelRegistry,
}

impl FingerprintEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            registry: ModelRegistry::new(),
        }
    }

    /// Construct with an injected registry (e.g. one shared across engine
    /// instances with different non-model settings).
    pub fn with_registry(config: EngineConfig, registry: ModelRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Dispatch on the payload's modality.
    pub fn fingerprint(
        &self,
        payload: &ContentPayload,
    ) -> Result<FingerprintResult, FingerprintError> {
        match payload {
            ContentPayload::Image(bytes) => self.fingerprint_image(bytes),
            ContentPayload::Audio { bytes, modified_at } => {
                self.fingerprint_audio(bytes, *modified_at)
            }
            ContentPayload::Text(text) => self.fingerprint_text(text),
        }
    }

    /// Map an uploaded file to a modality and fingerprint it.
    ///
    /// The MIME/filename mapping mirrors the upload boundary: `image/*`,
    /// `audio/*`, `text/*` by prefix, with a `.txt`/`.md` filename
    /// fallback; anything else is [`FingerprintError::UnsupportedContentType`].
    /// Text payloads must be valid UTF-8.
    pub fn fingerprint_file(
        &self,
        mime: &str,
        filename: Option<&str>,
        bytes: &[u8],
        modified_at: DateTime<Utc>,
    ) -> Result<FingerprintResult, FingerprintError> {
        match ContentType::from_mime(mime, filename)? {
            ContentType::Image => self.fingerprint_image(bytes),
            ContentType::Audio => self.fingerprint_audio(bytes, modified_at),
            ContentType::Text => {
                let text = std::str::from_utf8(bytes).map_err(|e| {
                    FingerprintError::Decode(format!("text payload is not valid utf-8: {e}"))
                })?;
                self.fingerprint_text(text)
            }
        }
    }

    /// Fingerprint encoded image bytes.
    pub fn fingerprint_image(&self, bytes: &[u8]) -> Result<FingerprintResult, FingerprintError> {
        self.run(ContentType::Image, bytes.len(), || {
            extract::image::extract(bytes, &self.config.image, &self.registry)
        })
    }

    /// Fingerprint raw audio bytes. `modified_at` is the source file's
    /// modification time; it participates in the feature vector.
    pub fn fingerprint_audio(
        &self,
        bytes: &[u8],
        modified_at: DateTime<Utc>,
    ) -> Result<FingerprintResult, FingerprintError> {
        self.run(ContentType::Audio, bytes.len(), || {
            extract::audio::extract(bytes, modified_at, &self.config.audio)
        })
    }

    /// Fingerprint decoded UTF-8 text.
    pub fn fingerprint_text(&self, text: &str) -> Result<FingerprintResult, FingerprintError> {
        self.run(ContentType::Text, text.len(), || {
            extract::text::extract(text, &self.config.text, &self.registry)
        })
    }

    fn run(
        &self,
        content_type: ContentType,
        payload_len: usize,
        extract: impl FnOnce() -> Result<ExtractedFeatures, FingerprintError>,
    ) -> Result<FingerprintResult, FingerprintError> {
        let start = Instant::now();
        let span = tracing::span!(
            Level::INFO,
            "ccfp.fingerprint",
            content_type = %content_type,
            payload_len
        );
        let _guard = span.enter();

        let outcome = self
            .check_payload_size(payload_len)
            .and_then(|()| extract())
            .and_then(|features| {
                assemble_fingerprint(content_type, &features.values, features.confidence)
            });

        let elapsed_micros = start.elapsed().as_micros();
        match outcome {
            Ok(result) => {
                info!(
                    fingerprint = %result.fingerprint,
                    confidence = result.confidence,
                    feature_count = result.features.len(),
                    elapsed_micros,
                    "fingerprint_success"
                );
                Ok(result)
            }
            Err(err) => {
                warn!(error = %err, elapsed_micros, "fingerprint_failure");
                Err(err)
            }
        }
    }

    fn check_payload_size(&self, payload_len: usize) -> Result<(), FingerprintError> {
        if let Some(limit) = self.config.max_payload_bytes {
            if payload_len > limit {
                return Err(FingerprintError::PayloadTooLarge(format!(
                    "payload size {payload_len} exceeds limit of {limit}"
                )));
            }
        }
        Ok(())
    }
}

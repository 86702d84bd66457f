//! Core data model: content types, payloads, and the fingerprint record.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FingerprintError;

/// The three content modalities the engine understands.
///
/// The modality selects the feature extractor and gates similarity
/// comparisons: fingerprints of different content types always compare to
/// zero. The set is closed; anything else is rejected at the boundary with
/// [`FingerprintError::UnsupportedContentType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Image,
    Audio,
    Text,
}

impl ContentType {
    /// Lowercase tag used in serialized form and logs.
    pub fn tag(&self) -> &'static str {
        match self {
            ContentType::Image => "image",
            ContentType::Audio => "audio",
            ContentType::Text => "text",
        }
    }

    /// Uppercase prefix used in fingerprint tokens (`IMAGE_...`).
    pub fn token_prefix(&self) -> &'static str {
        match self {
            ContentType::Image => "IMAGE",
            ContentType::Audio => "AUDIO",
            ContentType::Text => "TEXT",
        }
    }

    /// Parse a bare tag (`"image"`, `"audio"`, `"text"`, case-insensitive).
    pub fn from_tag(tag: &str) -> Result<Self, FingerprintError> {
        match tag.to_ascii_lowercase().as_str() {
            "image" => Ok(ContentType::Image),
            "audio" => Ok(ContentType::Audio),
            "text" => Ok(ContentType::Text),
            other => Err(FingerprintError::UnsupportedContentType(other.to_string())),
        }
    }

    /// Map an uploaded file's MIME type (and optionally its filename) to a
    /// modality.
    ///
    /// `image/*` and `audio/*` map by MIME prefix; `text/*` maps to text, as
    /// do `.txt` and `.md` filenames when the MIME type is missing or
    /// unhelpful (browsers frequently report markdown as an empty string or
    /// `application/octet-stream`).
    pub fn from_mime(mime: &str, filename: Option<&str>) -> Result<Self, FingerprintError> {
        if mime.starts_with("image/") {
            return Ok(ContentType::Image);
        }
        if mime.starts_with("audio/") {
            return Ok(ContentType::Audio);
        }
        if mime.starts_with("text/") {
            return Ok(ContentType::Text);
        }
        if let Some(name) = filename {
            let lower = name.to_ascii_lowercase();
            if lower.ends_with(".txt") || lower.ends_with(".md") {
                return Ok(ContentType::Text);
            }
        }
        let described = match filename {
            Some(name) if mime.is_empty() => name.to_string(),
            _ => mime.to_string(),
        };
        Err(FingerprintError::UnsupportedContentType(described))
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Raw content handed to the engine's dispatching entry point.
///
/// Image and audio carry raw bytes; audio additionally carries the source's
/// last-modified timestamp, which participates in its feature vector. Text
/// is already-decoded UTF-8.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContentPayload {
    /// Encoded image bytes in any format the host decoder understands.
    Image(Vec<u8>),
    /// Raw audio bytes plus the source file's modification time.
    Audio {
        bytes: Vec<u8>,
        modified_at: DateTime<Utc>,
    },
    /// Decoded UTF-8 text.
    Text(String),
}

impl ContentPayload {
    /// Modality this payload will be routed to.
    pub fn content_type(&self) -> ContentType {
        match self {
            ContentPayload::Image(_) => ContentType::Image,
            ContentPayload::Audio { .. } => ContentType::Audio,
            ContentPayload::Text(_) => ContentType::Text,
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        match self {
            ContentPayload::Image(bytes) => bytes.len(),
            ContentPayload::Audio { bytes, .. } => bytes.len(),
            ContentPayload::Text(text) => text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An immutable fingerprint record.
///
/// Produced atomically by a successful extraction call and never mutated
/// afterwards. The `fingerprint` token is a pure function of
/// `(content_type, features)`; `timestamp` is informational only and does
/// not participate in the hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FingerprintResult {
    /// Short token of the form `{TYPE}_{hex}`, e.g. `TEXT_2923A306`.
    pub fingerprint: String,
    /// Extractor-reported certainty in `[0.0, 1.0]`. Describes the
    /// extraction quality, not the hash.
    pub confidence: f64,
    /// Modality that produced the feature vector.
    pub content_type: ContentType,
    /// Ordered feature values. Never empty, always finite; the order is
    /// significant for both hashing and comparison.
    pub features: Vec<f64>,
    /// Generation time. Informational; not hashed.
    pub timestamp: DateTime<Utc>,
}

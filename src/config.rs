//! Runtime configuration for the fingerprinting engine.
//!
//! Each modality gets its own config block. The image and text extractors
//! select an inference mode the same way the embedding stack does
//! elsewhere in this codebase:
//!
//! - `"onnx"` runs the real model from local files. Missing assets are a
//!   hard error, never a silent downgrade.
//! - `"stub"` produces deterministic pseudo-features derived from a content
//!   hash. Meant for tests and development machines without model files.
//!
//! Unknown mode strings fall through to ONNX. The audio extractor is
//! model-free by design and has no mode.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Extractor mode string for local ONNX inference.
pub const MODE_ONNX: &str = "onnx";
/// Extractor mode string for the deterministic stub.
pub const MODE_STUB: &str = "stub";

/// Top-level engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Image classification extractor settings.
    pub image: ImageExtractorConfig,
    /// Text embedding extractor settings.
    pub text: TextExtractorConfig,
    /// Audio byte-hash extractor settings.
    pub audio: AudioExtractorConfig,
    /// Optional payload size backstop, applied before extraction. Callers
    /// are expected to enforce their own limits; this is a second line of
    /// defense. `None` disables the check.
    pub max_payload_bytes: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            image: ImageExtractorConfig::default(),
            text: TextExtractorConfig::default(),
            audio: AudioExtractorConfig::default(),
            max_payload_bytes: Some(50 * 1024 * 1024),
        }
    }
}

impl EngineConfig {
    /// Configuration with both model-backed extractors in stub mode.
    /// Useful for tests and environments without model assets.
    pub fn stub() -> Self {
        Self {
            image: ImageExtractorConfig {
                mode: MODE_STUB.into(),
                ..Default::default()
            },
            text: TextExtractorConfig {
                mode: MODE_STUB.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// Settings for the image classification extractor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageExtractorConfig {
    /// `"onnx"` or `"stub"`.
    pub mode: String,
    /// Friendly model label surfaced in logs.
    pub model_name: String,
    /// Local path of the classifier ONNX file.
    pub model_path: PathBuf,
    /// Side length of the model's square input, in pixels.
    pub input_size: u32,
    /// Number of top class scores kept as the feature vector.
    pub top_k: usize,
}

impl Default for ImageExtractorConfig {
    fn default() -> Self {
        Self {
            mode: MODE_ONNX.into(),
            model_name: "mobilenetv4-conv-small".into(),
            model_path: PathBuf::from("./models/mobilenetv4-conv-small/model.onnx"),
            input_size: 224,
            top_k: 10,
        }
    }
}

/// Settings for the text embedding extractor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextExtractorConfig {
    /// `"onnx"` or `"stub"`.
    pub mode: String,
    /// Friendly model label surfaced in logs.
    pub model_name: String,
    /// Local path of the embedding ONNX file.
    pub model_path: PathBuf,
    /// Path to the matching `tokenizer.json`.
    pub tokenizer_path: PathBuf,
    /// Token budget per input; longer inputs are truncated.
    pub max_sequence_length: usize,
    /// Number of leading embedding dimensions kept as the feature vector.
    pub embedding_dims: usize,
}

impl Default for TextExtractorConfig {
    fn default() -> Self {
        Self {
            mode: MODE_ONNX.into(),
            model_name: "mxbai-embed-xsmall-v1".into(),
            model_path: PathBuf::from("./models/mxbai-embed-xsmall-v1/model.onnx"),
            tokenizer_path: PathBuf::from("./models/mxbai-embed-xsmall-v1/tokenizer.json"),
            max_sequence_length: 512,
            embedding_dims: 20,
        }
    }
}

/// Settings for the audio byte-hash extractor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioExtractorConfig {
    /// Upper bound on the number of leading bytes scanned by the content
    /// hash. Keeps fingerprinting O(1) for large files.
    pub scan_limit_bytes: usize,
}

impl Default for AudioExtractorConfig {
    fn default() -> Self {
        Self {
            scan_limit_bytes: 10_000,
        }
    }
}

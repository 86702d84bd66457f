//! Text feature extraction via an ONNX embedding model.
//!
//! Tokenize, embed, mean-pool over attention-masked tokens, L2-normalize
//! the full embedding, then keep the leading dimensions as the feature
//! vector. The truncation happens after normalization, so the kept prefix
//! is generally not unit-length itself; comparisons renormalize via
//! cosine similarity anyway.
use std::sync::Mutex;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;

use crate::config::{TextExtractorConfig, MODE_STUB};
use crate::error::FingerprintError;
use crate::extract::{l2_normalize_in_place, validate_features, ExtractedFeatures};
use crate::registry::ModelRegistry;
use crate::types::ContentType;

const CONFIDENCE: f64 = 0.95;

/// Loaded embedder handle: tokenizer plus ONNX session. The session is
/// locked per inference call; the handle itself is shared freely.
pub struct TextModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    output_name: String,
    wants_token_type_ids: bool,
}

impl TextModel {
    pub(crate) fn load(cfg: &TextExtractorConfig) -> Result<Self, FingerprintError> {
        if !cfg.model_path.exists() {
            return Err(FingerprintError::ModelNotFound(
                cfg.model_path.display().to_string(),
            ));
        }
        if !cfg.tokenizer_path.exists() {
            return Err(FingerprintError::TokenizerMissing(
                cfg.tokenizer_path.display().to_string(),
            ));
        }

        let tokenizer = Tokenizer::from_file(&cfg.tokenizer_path)
            .map_err(|e| FingerprintError::Inference(e.to_string()))?;

        let session = Session::builder()
            .map_err(|e| FingerprintError::Inference(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| FingerprintError::Inference(e.to_string()))?
            .commit_from_file(&cfg.model_path)
            .map_err(|e| FingerprintError::Inference(e.to_string()))?;

        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| FingerprintError::Inference("model declares no outputs".into()))?;
        let wants_token_type_ids = session
            .inputs
            .iter()
            .any(|input| input.name == "token_type_ids");

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            output_name,
            wants_token_type_ids,
        })
    }

    /// Embed one text: token embeddings mean-pooled over the attention
    /// mask. Returns the full (unnormalized) embedding.
    fn embed(&self, text: &str, max_sequence_length: usize) -> Result<Vec<f32>, FingerprintError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| FingerprintError::Inference(e.to_string()))?;

        let mut ids: Vec<i64> = encoding.get_ids().iter().map(|&id| i64::from(id)).collect();
        let mut mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| i64::from(m))
            .collect();
        ids.truncate(max_sequence_length);
        mask.truncate(max_sequence_length);
        if ids.is_empty() {
            return Err(FingerprintError::Inference(
                "tokenizer produced no tokens for input".into(),
            ));
        }
        let sequence_length = ids.len();

        let ids_tensor = Tensor::from_array(([1usize, sequence_length], ids))
            .map_err(|e| FingerprintError::Inference(e.to_string()))?;
        let mask_tensor = Tensor::from_array(([1usize, sequence_length], mask.clone()))
            .map_err(|e| FingerprintError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let outputs = if self.wants_token_type_ids {
            let type_tensor =
                Tensor::from_array(([1usize, sequence_length], vec![0i64; sequence_length]))
                    .map_err(|e| FingerprintError::Inference(e.to_string()))?;
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
                "token_type_ids" => type_tensor
            ])
        } else {
            session.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor
            ])
        }
        .map_err(|e| FingerprintError::Inference(e.to_string()))?;

        let output = outputs.get(&self.output_name).ok_or_else(|| {
            FingerprintError::Inference(format!("model produced no output '{}'", self.output_name))
        })?;
        let (shape, hidden_states) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| FingerprintError::Inference(e.to_string()))?;
        let hidden_size = shape
            .last()
            .map(|&dim| dim as usize)
            .ok_or_else(|| FingerprintError::Inference("embedding output is scalar".into()))?;

        mean_pool(hidden_states, &mask, hidden_size)
    }
}

/// Average token embeddings where the attention mask is set.
fn mean_pool(
    hidden_states: &[f32],
    mask: &[i64],
    hidden_size: usize,
) -> Result<Vec<f32>, FingerprintError> {
    if hidden_size == 0 || hidden_states.len() % hidden_size != 0 {
        return Err(FingerprintError::Inference(format!(
            "embedding output length {} does not divide into hidden size {hidden_size}",
            hidden_states.len()
        )));
    }

    let token_count = hidden_states.len() / hidden_size;
    let mut pooled = vec![0f32; hidden_size];
    let mut attended = 0f32;
    for token in 0..token_count {
        if mask.get(token).copied().unwrap_or(0) == 0 {
            continue;
        }
        attended += 1.0;
        let row = &hidden_states[token * hidden_size..(token + 1) * hidden_size];
        for (slot, value) in pooled.iter_mut().zip(row) {
            *slot += value;
        }
    }

    if attended == 0.0 {
        return Err(FingerprintError::Inference(
            "attention mask covers no tokens".into(),
        ));
    }
    for slot in &mut pooled {
        *slot /= attended;
    }
    Ok(pooled)
}

pub(crate) fn extract(
    text: &str,
    cfg: &TextExtractorConfig,
    registry: &ModelRegistry,
) -> Result<ExtractedFeatures, FingerprintError> {
    let features = if cfg.mode == MODE_STUB {
        stub_features(text, cfg.embedding_dims)
    } else {
        let model = registry.text(cfg)?;
        let mut embedding = model.embed(text, cfg.max_sequence_length)?;
        l2_normalize_in_place(&mut embedding);
        embedding.truncate(cfg.embedding_dims);
        ExtractedFeatures {
            values: embedding.into_iter().map(f64::from).collect(),
            confidence: CONFIDENCE,
        }
    };

    validate_features(ContentType::Text, &features.values)?;
    Ok(features)
}

/// Deterministic pseudo-embedding for stub mode: a content hash seeds a
/// sinusoid sequence, L2-normalized like the real pipeline's output.
fn stub_features(text: &str, dims: usize) -> ExtractedFeatures {
    let h = fxhash::hash64(text.as_bytes());
    let mut vector = vec![0f32; dims];
    for (idx, value) in vector.iter_mut().enumerate() {
        *value = ((h >> (idx % 32)) as f32 * 0.0001).sin();
    }
    l2_normalize_in_place(&mut vector);

    ExtractedFeatures {
        values: vector.into_iter().map(f64::from).collect(),
        confidence: CONFIDENCE,
    }
}

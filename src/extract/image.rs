//! Image feature extraction via an ONNX classification model.
//!
//! The decoded image is resized to the model's input square, normalized
//! with the ImageNet statistics, and classified. The class scores are
//! sorted descending before truncation. Some classifier exports return
//! ranked scores already, but that is not a contract we rely on; the sort
//! makes the top-k selection well-defined for any export.
use std::cmp::Ordering;
use std::sync::Mutex;

use image::imageops::FilterType;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;

use crate::config::{ImageExtractorConfig, MODE_STUB};
use crate::error::FingerprintError;
use crate::extract::{validate_features, ExtractedFeatures};
use crate::registry::ModelRegistry;
use crate::types::ContentType;

/// Confidence reported when the model yields no usable top score.
const DEFAULT_CONFIDENCE: f64 = 0.8;

const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Loaded classifier handle. The session is locked per inference call; the
/// handle itself is shared freely.
pub struct ImageModel {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl ImageModel {
    pub(crate) fn load(cfg: &ImageExtractorConfig) -> Result<Self, FingerprintError> {
        if !cfg.model_path.exists() {
            return Err(FingerprintError::ModelNotFound(
                cfg.model_path.display().to_string(),
            ));
        }

        let session = Session::builder()
            .map_err(|e| FingerprintError::Inference(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| FingerprintError::Inference(e.to_string()))?
            .commit_from_file(&cfg.model_path)
            .map_err(|e| FingerprintError::Inference(e.to_string()))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .ok_or_else(|| FingerprintError::Inference("model declares no inputs".into()))?;
        let output_name = session
            .outputs
            .first()
            .map(|output| output.name.clone())
            .ok_or_else(|| FingerprintError::Inference("model declares no outputs".into()))?;

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }

    /// Run the classifier over preprocessed CHW pixels and return softmax
    /// scores over all classes.
    fn classify(&self, pixels: Vec<f32>, input_size: u32) -> Result<Vec<f32>, FingerprintError> {
        let side = input_size as usize;
        let tensor = Tensor::from_array(([1usize, 3, side, side], pixels))
            .map_err(|e| FingerprintError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let outputs = session
            .run(ort::inputs![self.input_name.clone() => tensor])
            .map_err(|e| FingerprintError::Inference(e.to_string()))?;
        let output = outputs.get(&self.output_name).ok_or_else(|| {
            FingerprintError::Inference(format!("model produced no output '{}'", self.output_name))
        })?;
        let (_, logits) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| FingerprintError::Inference(e.to_string()))?;

        if logits.is_empty() {
            return Err(FingerprintError::Inference(
                "classifier returned an empty score tensor".into(),
            ));
        }
        Ok(softmax(logits))
    }
}

pub(crate) fn extract(
    bytes: &[u8],
    cfg: &ImageExtractorConfig,
    registry: &ModelRegistry,
) -> Result<ExtractedFeatures, FingerprintError> {
    let features = if cfg.mode == MODE_STUB {
        stub_features(bytes, cfg.top_k)
    } else {
        let model = registry.image(cfg)?;
        let pixels = preprocess(bytes, cfg.input_size)?;
        let scores = model.classify(pixels, cfg.input_size)?;

        let mut scores: Vec<f64> = scores.into_iter().map(f64::from).collect();
        scores.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
        scores.truncate(cfg.top_k);

        let confidence = scores.first().copied().unwrap_or(DEFAULT_CONFIDENCE);
        ExtractedFeatures {
            values: scores,
            confidence,
        }
    };

    validate_features(ContentType::Image, &features.values)?;
    Ok(features)
}

/// Decode, resize, and ImageNet-normalize into NCHW f32 pixels.
fn preprocess(bytes: &[u8], input_size: u32) -> Result<Vec<f32>, FingerprintError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| FingerprintError::Decode(format!("image decode failed: {e}")))?;
    let rgb = decoded
        .resize_exact(input_size, input_size, FilterType::Triangle)
        .to_rgb8();

    let side = input_size as usize;
    let plane = side * side;
    let mut chw = vec![0f32; 3 * plane];
    for (x, y, pixel) in rgb.enumerate_pixels() {
        let offset = y as usize * side + x as usize;
        for channel in 0..3 {
            chw[channel * plane + offset] =
                (f32::from(pixel[channel]) / 255.0 - IMAGENET_MEAN[channel])
                    / IMAGENET_STD[channel];
        }
    }
    Ok(chw)
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Deterministic pseudo-scores for stub mode: a content hash seeds a
/// sinusoid sequence which is then shaped to look like a softmax output
/// (descending, summing to one).
fn stub_features(bytes: &[u8], top_k: usize) -> ExtractedFeatures {
    let h = fxhash::hash64(bytes);
    let mut scores: Vec<f64> = (0..top_k)
        .map(|idx| 0.5 + 0.5 * ((h >> (idx % 32)) as f64 * 0.0001).sin())
        .collect();
    scores.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    let sum: f64 = scores.iter().sum();
    if sum > 0.0 {
        for score in &mut scores {
            *score /= sum;
        }
    }

    let confidence = scores.first().copied().unwrap_or(DEFAULT_CONFIDENCE);
    ExtractedFeatures {
        values: scores,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_cfg() -> ImageExtractorConfig {
        ImageExtractorConfig {
            mode: MODE_STUB.into(),
            ..Default::default()
        }
    }

    /// Tiny valid PNG for decode tests.
    fn png_bytes(shade: u8) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([shade, shade / 2, 255 - shade]));
        let mut bytes = Vec::new();
        img.write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageFormat::Png,
        )
        .unwrap();
        bytes
    }

    #[test]
    fn softmax_sums_to_one() {
        let scores = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = scores.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(scores[2] > scores[1] && scores[1] > scores[0]);
    }

    #[test]
    fn softmax_is_stable_for_large_logits() {
        let scores = softmax(&[1000.0, 999.0]);
        assert!(scores.iter().all(|s| s.is_finite()));
        assert!(scores[0] > scores[1]);
    }

    #[test]
    fn preprocess_rejects_garbage() {
        let err = preprocess(b"definitely not an image", 224).unwrap_err();
        assert!(matches!(err, FingerprintError::Decode(_)));
    }

    #[test]
    fn preprocess_produces_nchw_layout() {
        let pixels = preprocess(&png_bytes(128), 8).unwrap();
        assert_eq!(pixels.len(), 3 * 8 * 8);
        assert!(pixels.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn stub_scores_are_descending_and_normalized() {
        let features = stub_features(b"some image bytes", 10);
        assert_eq!(features.values.len(), 10);
        let sum: f64 = features.values.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        for pair in features.values.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
        assert_eq!(features.confidence, features.values[0]);
    }

    #[test]
    fn stub_mode_is_deterministic_per_input() {
        let registry = ModelRegistry::new();
        let a = extract(&png_bytes(10), &stub_cfg(), &registry).unwrap();
        let b = extract(&png_bytes(10), &stub_cfg(), &registry).unwrap();
        assert_eq!(a, b);

        let c = extract(&png_bytes(200), &stub_cfg(), &registry).unwrap();
        assert_ne!(a.values, c.values);
    }

    #[test]
    fn stub_mode_never_touches_the_registry() {
        let registry = ModelRegistry::new();
        extract(b"anything", &stub_cfg(), &registry).unwrap();
        assert!(!registry.image_loaded());
    }

    #[test]
    fn onnx_mode_with_missing_model_is_a_hard_error() {
        let registry = ModelRegistry::new();
        let cfg = ImageExtractorConfig {
            model_path: "./missing/classifier.onnx".into(),
            ..Default::default()
        };
        let err = extract(&png_bytes(1), &cfg, &registry).unwrap_err();
        assert!(matches!(err, FingerprintError::ModelNotFound(_)));
        assert!(!registry.image_loaded());
    }
}

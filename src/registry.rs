//! Lazily-initialized, process-shared model handles.
//!
//! The image classifier and the text embedder are expensive to load, so
//! each gets a once-only slot: the first caller pays the load cost, every
//! later caller reuses the same handle. Concurrent first calls are
//! serialized by the cell, so exactly one initialization ever succeeds. A
//! failed load leaves the slot empty: failure is never cached, and the
//! next call may retry (a transient problem such as a model file appearing
//! after deployment should not poison the whole process).
//!
//! The registry is plain owned state, not a module-level global: callers
//! decide its scope by deciding where the engine (or the registry itself)
//! lives.
use once_cell::sync::OnceCell;
use std::sync::Arc;

use crate::config::{ImageExtractorConfig, TextExtractorConfig};
use crate::error::FingerprintError;
use crate::extract::image::ImageModel;
use crate::extract::text::TextModel;

/// Holder for the two model handles. Cheap to create; loads nothing until
/// an extractor asks for a handle.
#[derive(Default)]
pub struct ModelRegistry {
    image: OnceCell<Arc<ImageModel>>,
    text: OnceCell<Arc<TextModel>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the image classifier, loading it on first use.
    pub(crate) fn image(
        &self,
        cfg: &ImageExtractorConfig,
    ) -> Result<Arc<ImageModel>, FingerprintError> {
        get_or_init_handle(&self.image, || ImageModel::load(cfg))
    }

    /// Shared handle to the text embedder, loading it on first use.
    pub(crate) fn text(
        &self,
        cfg: &TextExtractorConfig,
    ) -> Result<Arc<TextModel>, FingerprintError> {
        get_or_init_handle(&self.text, || TextModel::load(cfg))
    }

    /// Whether the image model has been loaded by some earlier call.
    pub fn image_loaded(&self) -> bool {
        self.image.get().is_some()
    }

    /// Whether the text model has been loaded by some earlier call.
    pub fn text_loaded(&self) -> bool {
        self.text.get().is_some()
    }
}

/// Initialize-once helper: concurrent callers block until the winning
/// loader finishes and then observe the same `Arc`; a loader error leaves
/// the cell empty so the next caller retries.
fn get_or_init_handle<T>(
    cell: &OnceCell<Arc<T>>,
    load: impl FnOnce() -> Result<T, FingerprintError>,
) -> Result<Arc<T>, FingerprintError> {
    cell.get_or_try_init(|| load().map(Arc::new)).cloned()
}

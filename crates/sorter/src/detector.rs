use crate::backend::InferenceBackend;
use crate::errors::InferenceError;
use crate::model::ModelSpec;
use crate::postprocess::{Detection, RawOutput, decode_best_detection};
use crate::registry::ModelRegistry;
use preprocess::{Image, NormalizedBox};
use std::sync::Arc;

/// Finds the single most prominent object in a photo.
pub trait Detector: Send + Sync {
    /// `Ok(None)` means the model ran but nothing scored above zero.
    fn detect(&self, image: &Image) -> Result<Option<Detection>, InferenceError>;
}

/// Detector backed by a model from the registry.
pub struct ModelDetector<B: InferenceBackend> {
    registry: Arc<ModelRegistry<B>>,
    spec: ModelSpec,
}

impl<B: InferenceBackend> ModelDetector<B> {
    pub fn new(registry: Arc<ModelRegistry<B>>, spec: ModelSpec) -> Self {
        Self { registry, spec }
    }

    pub fn spec(&self) -> &ModelSpec {
        &self.spec
    }
}

impl<B: InferenceBackend> Detector for ModelDetector<B> {
    fn detect(&self, image: &Image) -> Result<Option<Detection>, InferenceError> {
        let output = self.registry.infer_image(&self.spec, image)?;

        match RawOutput::rows(output)? {
            RawOutput::Rows(rows) => Ok(decode_best_detection(rows.view(), self.spec.input_size)),
            RawOutput::Scores(_) => Err(InferenceError::EmptyOutput),
        }
    }
}

/// Always reports the same region. Used when detection is disabled.
#[derive(Debug, Clone, Copy)]
pub struct FixedBoxDetector {
    region: NormalizedBox,
}

impl FixedBoxDetector {
    pub fn new(region: NormalizedBox) -> Self {
        Self { region }
    }
}

impl Detector for FixedBoxDetector {
    fn detect(&self, _image: &Image) -> Result<Option<Detection>, InferenceError> {
        Ok(Some(Detection {
            bbox: self.region,
            score: 1.0,
        }))
    }
}

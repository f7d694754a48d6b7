use crate::errors::InferenceError;
use ndarray::ArrayD;
use preprocess::Tensor;

#[cfg(feature = "ort-backend")]
pub mod ort;

/// A loaded model that maps one input tensor to one output array.
///
/// Implementations must tolerate concurrent `infer` calls through `&self`,
/// serializing internally if the underlying runtime cannot.
pub trait InferenceBackend: Send + Sync {
    /// Runtime-specific load options (execution provider, thread counts, ...).
    type Options: Clone + Default + Send + Sync;

    fn load_model(bytes: &[u8], options: &Self::Options) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Run inference on a `[1, 3, H, W]` tensor and return the first output.
    fn infer(&self, input: &Tensor) -> Result<ArrayD<f32>, InferenceError>;

    /// Position of the single input tensor the model binds against.
    fn input_index(&self) -> usize {
        0
    }
}

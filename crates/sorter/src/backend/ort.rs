use super::InferenceBackend;
use crate::errors::InferenceError;
use ndarray::ArrayD;
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};
use preprocess::Tensor;
use std::str::FromStr;
use std::sync::Mutex;

const INTRA_THREADS: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionProvider {
    #[default]
    Cpu,
    Cuda,
}

impl FromStr for ExecutionProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpu" => Ok(ExecutionProvider::Cpu),
            "cuda" | "gpu" => Ok(ExecutionProvider::Cuda),
            other => anyhow::bail!("Unknown execution provider '{}'", other),
        }
    }
}

/// ONNX Runtime session. `Session::run` needs `&mut`, so calls are serialized.
pub struct OrtBackend {
    session: Mutex<Session>,
}

impl OrtBackend {
    pub fn load_model_with_provider(
        bytes: &[u8],
        provider: ExecutionProvider,
    ) -> anyhow::Result<Self> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        #[cfg_attr(not(feature = "cuda"), allow(unused_mut))]
        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(INTRA_THREADS)?;

        match provider {
            #[cfg(feature = "cuda")]
            ExecutionProvider::Cuda => {
                tracing::info!("Initializing ONNX Runtime with CUDA execution provider");
                builder = builder.with_execution_providers([
                    ort::execution_providers::CUDAExecutionProvider::default()
                        .with_device_id(0)
                        .build()
                        .error_on_failure(),
                ])?;
            }
            #[cfg(not(feature = "cuda"))]
            ExecutionProvider::Cuda => {
                tracing::warn!("Built without the `cuda` feature, falling back to CPU");
            }
            ExecutionProvider::Cpu => {
                tracing::info!("Initializing ONNX Runtime with CPU execution provider");
            }
        }

        let session = builder.commit_from_memory(bytes)?;

        tracing::info!(model_bytes = bytes.len(), "ONNX session ready");
        Ok(Self {
            session: Mutex::new(session),
        })
    }
}

impl InferenceBackend for OrtBackend {
    type Options = ExecutionProvider;

    fn load_model(bytes: &[u8], options: &Self::Options) -> anyhow::Result<Self> {
        Self::load_model_with_provider(bytes, *options)
    }

    fn infer(&self, input: &Tensor) -> Result<ArrayD<f32>, InferenceError> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| InferenceError::runtime("session lock poisoned"))?;

        let input = TensorRef::from_array_view(input.view()).map_err(InferenceError::runtime)?;
        let outputs = session
            .run(ort::inputs![input])
            .map_err(InferenceError::runtime)?;

        if outputs.len() == 0 {
            return Err(InferenceError::EmptyOutput);
        }

        let output = outputs[0]
            .try_extract_array::<f32>()
            .map_err(InferenceError::runtime)?;

        Ok(output.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_provider_parse() {
        assert_eq!(
            "cpu".parse::<ExecutionProvider>().unwrap(),
            ExecutionProvider::Cpu
        );
        assert_eq!(
            " CUDA ".parse::<ExecutionProvider>().unwrap(),
            ExecutionProvider::Cuda
        );
        assert!("tpu".parse::<ExecutionProvider>().is_err());
    }

    #[test]
    fn test_garbage_bytes_fail_to_load() {
        let result = OrtBackend::load_model(b"definitely not onnx", &ExecutionProvider::Cpu);
        assert!(result.is_err(), "Corrupt model bytes must not load");
    }
}

use crate::model::ClassifierVariant;
use common::{env_opt, env_or};
use std::path::PathBuf;
use std::time::Duration;

pub use common::Environment;

#[cfg(feature = "ort-backend")]
use crate::backend::ort::ExecutionProvider;

#[derive(Debug, Clone)]
pub struct SorterConfig {
    pub environment: Environment,
    pub model_dir: PathBuf,
    pub classifier: ClassifierVariant,
    pub detector_enabled: bool,
    pub detection_threshold: f32,
    pub classification_threshold: f32,
    pub inference_timeout: Option<Duration>,
    #[cfg(feature = "ort-backend")]
    pub execution_provider: ExecutionProvider,
    pub otlp_endpoint: Option<String>,
    pub points_per_item: u64,
}

impl SorterConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = Environment::from_env();

        let classifier = match env_opt::<String>("CLASSIFIER_MODEL") {
            Some(name) => name.parse()?,
            None => ClassifierVariant::default(),
        };

        let detection_threshold = env_or("DETECTION_THRESHOLD", 0.35f32);
        let classification_threshold = env_or("CLASSIFICATION_THRESHOLD", 0.3f32);
        for (name, value) in [
            ("DETECTION_THRESHOLD", detection_threshold),
            ("CLASSIFICATION_THRESHOLD", classification_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                anyhow::bail!("{} must be within [0, 1], got {}", name, value);
            }
        }

        Ok(Self {
            environment,
            model_dir: env_or("MODEL_DIR", PathBuf::from("./models")),
            classifier,
            detector_enabled: env_or("DETECTOR_ENABLED", true),
            detection_threshold,
            classification_threshold,
            inference_timeout: env_opt::<u64>("INFERENCE_TIMEOUT_MS").map(Duration::from_millis),
            #[cfg(feature = "ort-backend")]
            execution_provider: match env_opt::<String>("EXECUTION_PROVIDER") {
                Some(name) => name.parse()?,
                None => ExecutionProvider::default(),
            },
            otlp_endpoint: env_opt("OTEL_EXPORTER_OTLP_ENDPOINT"),
            points_per_item: env_or("POINTS_PER_ITEM", 10),
        })
    }

    /// Create default configuration for testing
    #[cfg(test)]
    pub fn test_default() -> Self {
        Self {
            environment: Environment::Development,
            model_dir: PathBuf::from("/models"),
            classifier: ClassifierVariant::Imagenet,
            detector_enabled: true,
            detection_threshold: 0.35,
            classification_threshold: 0.3,
            inference_timeout: None,
            #[cfg(feature = "ort-backend")]
            execution_provider: ExecutionProvider::Cpu,
            otlp_endpoint: None,
            points_per_item: 10,
        }
    }
}

pub mod assets;
pub mod backend;
pub mod category;
pub mod config;
pub mod detector;
pub mod errors;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod postprocess;
pub mod registry;
pub mod scoring;

// Re-export commonly used types for convenience
pub use assets::{AssetStore, DirAssetStore, MemoryAssetStore};
pub use backend::InferenceBackend;
pub use category::{CategoryCatalog, CategoryInfo, StaticCatalog, WasteCategory};
pub use config::SorterConfig;
pub use detector::{Detector, FixedBoxDetector, ModelDetector};
pub use errors::InferenceError;
pub use model::{ClassifierVariant, ModelSpec};
pub use pipeline::{CategoryResult, ClassificationPipeline, DisplayLabel, Outcome, PipelineConfig};
pub use postprocess::{ClassificationResult, Detection};
pub use registry::{ModelHandle, ModelRegistry, ModelState};
pub use scoring::{Achievement, ScoreSink, Scoreboard, StatsSnapshot};

use crate::backend::InferenceBackend;
use crate::category::{CategoryCatalog, CategoryInfo, StaticCatalog, WasteCategory};
use crate::config::SorterConfig;
use crate::detector::Detector;
use crate::errors::InferenceError;
use crate::model::ModelSpec;
use crate::postprocess::{ClassificationResult, RawOutput, decode_classification, top_k};
use crate::registry::ModelRegistry;
use crate::scoring::ScoreSink;
use common::span;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use preprocess::{Image, NormalizedBox};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

const TOP_K_LOGGED: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Detections scoring below this are replaced by `fallback_box`.
    pub detection_threshold: f32,
    /// Classifications below this are reported as undetermined.
    pub classification_threshold: f32,
    pub fallback_box: NormalizedBox,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detection_threshold: 0.35,
            classification_threshold: 0.3,
            fallback_box: NormalizedBox::centered(0.5),
        }
    }
}

impl From<&SorterConfig> for PipelineConfig {
    fn from(config: &SorterConfig) -> Self {
        Self {
            detection_threshold: config.detection_threshold,
            classification_threshold: config.classification_threshold,
            ..Self::default()
        }
    }
}

/// What to show the user for a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "title", rename_all = "lowercase")]
pub enum DisplayLabel {
    Determined(&'static str),
    /// Confidence too low to commit; the category id is still reported.
    Undetermined,
}

/// How the classified region was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RegionSource {
    Detected { score: f32 },
    Fallback,
    FullImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Region {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub source: RegionSource,
}

impl Region {
    fn new(bbox: NormalizedBox, source: RegionSource) -> Self {
        Self {
            left: bbox.left,
            top: bbox.top,
            right: bbox.right,
            bottom: bbox.bottom,
            source,
        }
    }

    pub fn bbox(&self) -> NormalizedBox {
        NormalizedBox::new(self.left, self.top, self.right, self.bottom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Classified,
    ModelUnavailable,
    InferenceFailed,
    TimedOut,
}

impl Outcome {
    fn as_str(&self) -> &'static str {
        match self {
            Outcome::Classified => "classified",
            Outcome::ModelUnavailable => "model_unavailable",
            Outcome::InferenceFailed => "inference_failed",
            Outcome::TimedOut => "timed_out",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryResult {
    pub category: WasteCategory,
    pub info: CategoryInfo,
    /// Classifier confidence in [0, 1]; 0 on any fallback.
    pub confidence: f32,
    /// Label as emitted by the model, before mapping.
    pub raw_label: Option<String>,
    pub display: DisplayLabel,
    /// Region that was classified; `None` if classification never ran.
    pub region: Option<Region>,
    pub probabilities: Vec<(String, f32)>,
    pub outcome: Outcome,
}

impl CategoryResult {
    pub fn is_determined(&self) -> bool {
        matches!(self.display, DisplayLabel::Determined(_))
    }
}

struct PipelineMetrics {
    duration: Histogram<f64>,
    classifications: Counter<u64>,
    fallbacks: Counter<u64>,
}

impl PipelineMetrics {
    fn new() -> Self {
        let meter = global::meter("sorter");
        let latency_buckets = [
            0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 0.75, 1.0, 2.0, 5.0,
        ];
        Self {
            duration: meter
                .f64_histogram("sorter_inference_duration_seconds")
                .with_description("Time to analyze one image (detect + crop + classify)")
                .with_unit("s")
                .with_boundaries(latency_buckets.to_vec())
                .build(),
            classifications: meter
                .u64_counter("sorter_classifications_total")
                .with_description("Images classified, by category")
                .build(),
            fallbacks: meter
                .u64_counter("sorter_fallbacks_total")
                .with_description("Recovered failures, by pipeline stage")
                .build(),
        }
    }

    fn fallback(&self, stage: &'static str) {
        self.fallbacks.add(1, &[KeyValue::new("stage", stage)]);
    }
}

/// Detect → crop → classify → map, never failing outward.
///
/// Every recovered failure is logged and turned into a `Mixed` result with zero
/// confidence so callers always get something to show.
pub struct ClassificationPipeline<B: InferenceBackend> {
    registry: Arc<ModelRegistry<B>>,
    classifier: ModelSpec,
    detector: Option<Box<dyn Detector>>,
    catalog: Box<dyn CategoryCatalog>,
    score_sink: Option<Arc<dyn ScoreSink>>,
    config: PipelineConfig,
    metrics: PipelineMetrics,
}

impl<B: InferenceBackend> ClassificationPipeline<B> {
    pub fn new(
        registry: Arc<ModelRegistry<B>>,
        classifier: ModelSpec,
        config: PipelineConfig,
    ) -> Self {
        Self {
            registry,
            classifier,
            detector: None,
            catalog: Box::new(StaticCatalog),
            score_sink: None,
            config,
            metrics: PipelineMetrics::new(),
        }
    }

    pub fn with_detector(mut self, detector: impl Detector + 'static) -> Self {
        self.detector = Some(Box::new(detector));
        self
    }

    pub fn with_catalog(mut self, catalog: impl CategoryCatalog + 'static) -> Self {
        self.catalog = Box::new(catalog);
        self
    }

    pub fn with_score_sink(mut self, sink: Arc<dyn ScoreSink>) -> Self {
        self.score_sink = Some(sink);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Classify the whole image, skipping detection and cropping.
    pub fn classify(&self, image: &Image) -> CategoryResult {
        self.record_score(self.classify_unscored(image))
    }

    /// Full photo path: find the object, crop to it, classify the crop.
    pub fn analyze(&self, image: &Image) -> CategoryResult {
        self.record_score(self.analyze_unscored(image))
    }

    /// Report a delivered result to the score sink. Fallbacks are never scored.
    fn record_score(&self, result: CategoryResult) -> CategoryResult {
        if result.outcome != Outcome::Classified {
            return result;
        }
        if let Some(sink) = &self.score_sink {
            let total = sink.record(result.category);
            tracing::debug!(total, "Score recorded");
        }
        result
    }

    fn classify_unscored(&self, image: &Image) -> CategoryResult {
        let _s = span!("classify", width = image.width(), height = image.height());
        let start = Instant::now();

        if let Some(outcome) = self.classifier_unavailable() {
            return self.fallback(outcome, "classification", start);
        }

        let region = Region::new(NormalizedBox::full(), RegionSource::FullImage);
        self.classify_region(image, region, start)
    }

    fn analyze_unscored(&self, image: &Image) -> CategoryResult {
        let _s = span!("analyze", width = image.width(), height = image.height());
        let start = Instant::now();

        if let Some(outcome) = self.classifier_unavailable() {
            return self.fallback(outcome, "classification", start);
        }

        let region = self.locate(image);
        match image.crop(&region.bbox()) {
            Ok(crop) => self.classify_region(&crop, region, start),
            Err(e) => {
                tracing::warn!(error = %e, "Crop failed, classifying full image");
                self.metrics.fallback("crop");
                let full = Region::new(NormalizedBox::full(), RegionSource::FullImage);
                self.classify_region(image, full, start)
            }
        }
    }

    fn classifier_unavailable(&self) -> Option<Outcome> {
        let asset = &self.classifier.asset_name;
        if self.registry.acquire(asset).is_loaded() {
            return None;
        }
        tracing::warn!(asset = %asset, "Classifier unavailable, reporting mixed");
        Some(Outcome::ModelUnavailable)
    }

    fn locate(&self, image: &Image) -> Region {
        let fallback = Region::new(self.config.fallback_box, RegionSource::Fallback);

        let Some(detector) = &self.detector else {
            return fallback;
        };

        match detector.detect(image) {
            Ok(Some(det)) if det.score >= self.config.detection_threshold => {
                tracing::debug!(score = det.score, "Object detected");
                Region::new(det.bbox, RegionSource::Detected { score: det.score })
            }
            Ok(Some(det)) => {
                tracing::debug!(
                    score = det.score,
                    threshold = self.config.detection_threshold,
                    "Detection below threshold, using fallback box"
                );
                self.metrics.fallback("detection");
                fallback
            }
            Ok(None) => {
                tracing::debug!("No detection, using fallback box");
                self.metrics.fallback("detection");
                fallback
            }
            Err(e) => {
                tracing::warn!(error = %e, "Detector failed, using fallback box");
                self.metrics.fallback("detection");
                fallback
            }
        }
    }

    fn run_classifier(&self, image: &Image) -> Result<ClassificationResult, InferenceError> {
        let output = self.registry.infer_image(&self.classifier, image)?;

        let RawOutput::Scores(scores) = RawOutput::scores(output) else {
            return Err(InferenceError::EmptyOutput);
        };
        decode_classification(&scores, &self.classifier.labels)
            .ok_or(InferenceError::EmptyOutput)
    }

    fn classify_region(&self, image: &Image, region: Region, start: Instant) -> CategoryResult {
        let result = match self.run_classifier(image) {
            Ok(result) => result,
            Err(e @ InferenceError::ModelUnavailable { .. }) => {
                tracing::warn!(error = %e, "Classifier unavailable, reporting mixed");
                return self.fallback(Outcome::ModelUnavailable, "classification", start);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Classification failed, reporting mixed");
                return self.fallback(Outcome::InferenceFailed, "classification", start);
            }
        };

        tracing::debug!(
            top = ?top_k(&result.probabilities, TOP_K_LOGGED),
            "Class probabilities"
        );

        let category = WasteCategory::from_label(&result.label);
        let info = self.catalog.lookup(category);
        let display_label = if result.confidence < self.config.classification_threshold {
            DisplayLabel::Undetermined
        } else {
            DisplayLabel::Determined(info.title)
        };
        let determined = matches!(display_label, DisplayLabel::Determined(_));

        let elapsed = start.elapsed();
        self.metrics.duration.record(
            elapsed.as_secs_f64(),
            &[KeyValue::new("outcome", Outcome::Classified.as_str())],
        );
        self.metrics
            .classifications
            .add(1, &[KeyValue::new("category", category.as_str())]);

        tracing::info!(
            label = %result.label,
            category = %category,
            confidence = result.confidence,
            determined,
            elapsed_ms = elapsed.as_millis() as u64,
            "Image classified"
        );

        CategoryResult {
            category,
            info,
            confidence: result.confidence,
            raw_label: Some(result.label),
            display: display_label,
            region: Some(region),
            probabilities: result.probabilities,
            outcome: Outcome::Classified,
        }
    }

    fn fallback(&self, outcome: Outcome, stage: &'static str, start: Instant) -> CategoryResult {
        self.metrics.fallback(stage);
        self.metrics.duration.record(
            start.elapsed().as_secs_f64(),
            &[KeyValue::new("outcome", outcome.as_str())],
        );
        unavailable_result(self.catalog.as_ref(), outcome)
    }
}

impl<B: InferenceBackend + 'static> ClassificationPipeline<B> {
    /// Run [`ClassificationPipeline::analyze`] on a blocking worker.
    ///
    /// When `timeout` elapses first the caller gets the model-unavailable
    /// fallback; the worker keeps running but its result is dropped unscored.
    pub async fn analyze_async(
        self: Arc<Self>,
        image: Image,
        timeout: Option<Duration>,
    ) -> CategoryResult {
        let pipeline = Arc::clone(&self);
        let task = tokio::task::spawn_blocking(move || pipeline.analyze_unscored(&image));

        let joined = match timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    tracing::warn!(timeout_ms = limit.as_millis() as u64, "Analysis timed out");
                    self.metrics.fallback("timeout");
                    return unavailable_result(self.catalog.as_ref(), Outcome::TimedOut);
                }
            },
            None => task.await,
        };

        match joined {
            Ok(result) => self.record_score(result),
            Err(e) => {
                tracing::error!(error = %e, "Analysis worker failed");
                self.metrics.fallback("worker");
                unavailable_result(self.catalog.as_ref(), Outcome::InferenceFailed)
            }
        }
    }
}

fn unavailable_result(catalog: &dyn CategoryCatalog, outcome: Outcome) -> CategoryResult {
    CategoryResult {
        category: WasteCategory::Mixed,
        info: catalog.lookup(WasteCategory::Mixed),
        confidence: 0.0,
        raw_label: None,
        display: DisplayLabel::Undetermined,
        region: None,
        probabilities: Vec::new(),
        outcome,
    }
}

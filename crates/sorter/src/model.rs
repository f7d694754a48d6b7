use preprocess::Normalization;
use std::str::FromStr;
use std::sync::Arc;

/// Everything the pipeline needs to know about one bundled model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub asset_name: String,
    /// Square input side in pixels.
    pub input_size: u32,
    pub normalization: Normalization,
    /// Output index → raw label. Empty for detectors.
    pub labels: Arc<[String]>,
}

impl ModelSpec {
    pub fn new(
        asset_name: impl Into<String>,
        input_size: u32,
        normalization: Normalization,
        labels: &[&str],
    ) -> Self {
        Self {
            asset_name: asset_name.into(),
            input_size,
            normalization,
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// ONNX classifier trained on ImageNet-normalized 224px crops.
    pub fn imagenet_classifier() -> Self {
        Self::new(
            "best.onnx",
            224,
            Normalization::imagenet(),
            &["plastic", "paper", "metal", "glass"],
        )
    }

    /// ResNetV2 classifier on the six-class garbage dataset, `[-1, 1]` inputs.
    pub fn garbage_classifier() -> Self {
        Self::new(
            "waste_classifier.onnx",
            224,
            Normalization::Symmetric,
            &["cardboard", "glass", "metal", "paper", "plastic", "trash"],
        )
    }

    /// YOLOv8n detector, 640px, inputs scaled to `[0, 1]`.
    pub fn yolo_detector() -> Self {
        Self::new("yolov8n.onnx", 640, Normalization::UnitScale, &[])
    }

    pub fn input_shape(&self) -> [usize; 4] {
        let side = self.input_size as usize;
        [1, 3, side, side]
    }
}

/// Selects one of the built-in classifier descriptions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClassifierVariant {
    #[default]
    Imagenet,
    Garbage,
}

impl ClassifierVariant {
    pub fn spec(&self) -> ModelSpec {
        match self {
            ClassifierVariant::Imagenet => ModelSpec::imagenet_classifier(),
            ClassifierVariant::Garbage => ModelSpec::garbage_classifier(),
        }
    }
}

impl FromStr for ClassifierVariant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "imagenet" | "onnx" => Ok(ClassifierVariant::Imagenet),
            "garbage" | "resnet" => Ok(ClassifierVariant::Garbage),
            other => anyhow::bail!("Unknown classifier variant '{}'", other),
        }
    }
}

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Model '{asset}' unavailable: {reason}")]
    ModelUnavailable { asset: String, reason: String },

    #[error("Input shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },

    #[error("Inference runtime error: {0}")]
    Runtime(String),

    #[error("Model produced an empty output")]
    EmptyOutput,

    #[error("Preprocessing failed: {0}")]
    Preprocess(String),
}

impl InferenceError {
    pub fn runtime(err: impl std::fmt::Display) -> Self {
        InferenceError::Runtime(err.to_string())
    }

    pub fn preprocess(err: impl std::fmt::Display) -> Self {
        InferenceError::Preprocess(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_formatting() {
        let err = InferenceError::ModelUnavailable {
            asset: "best.onnx".to_string(),
            reason: "file not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Model 'best.onnx' unavailable: file not found",
            "ModelUnavailable should name the asset and reason"
        );

        let err = InferenceError::ShapeMismatch {
            expected: vec![1, 3, 224, 224],
            got: vec![1, 3, 640, 640],
        };
        assert_eq!(
            err.to_string(),
            "Input shape mismatch: expected [1, 3, 224, 224], got [1, 3, 640, 640]"
        );

        assert_eq!(
            InferenceError::runtime("session poisoned").to_string(),
            "Inference runtime error: session poisoned"
        );
        assert_eq!(
            InferenceError::EmptyOutput.to_string(),
            "Model produced an empty output"
        );
    }
}

use crate::errors::InferenceError;
use ndarray::{Array2, ArrayD, ArrayView2, Axis};
use preprocess::NormalizedBox;

/// Label reported when the winning index has no entry in the vocabulary.
pub const UNKNOWN_LABEL: &str = "other";

/// Minimum detector row: `[x, y, w, h, objectness, class_0]`.
const MIN_DETECTION_ROW: usize = 6;

/// Model output, shaped for the decoder that will read it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    /// Per-class logits, batch dimension removed.
    Scores(Vec<f32>),
    /// One candidate per row: `[x, y, w, h, objectness, class_scores...]`.
    Rows(Array2<f32>),
}

impl RawOutput {
    /// Flatten a `[1, N]` (or `[N]`) classifier output.
    pub fn scores(output: ArrayD<f32>) -> Self {
        RawOutput::Scores(output.into_iter().collect())
    }

    /// Collapse a `[1, N, F]` (or `[N, F]`) detector output into `N` rows of `F`.
    pub fn rows(output: ArrayD<f32>) -> Result<Self, InferenceError> {
        let shape = output.shape().to_vec();
        let features = match shape.last() {
            Some(&f) if shape.len() >= 2 => f,
            _ => {
                return Err(InferenceError::ShapeMismatch {
                    expected: vec![1, 0, MIN_DETECTION_ROW],
                    got: shape,
                });
            }
        };
        let rows = if features == 0 { 0 } else { output.len() / features };

        let grid = output
            .into_shape_with_order((rows, features))
            .map_err(InferenceError::runtime)?;
        Ok(RawOutput::Rows(grid))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    /// Raw model label (vocabulary entry or [`UNKNOWN_LABEL`]).
    pub label: String,
    /// Winning output index.
    pub index: usize,
    /// Softmax probability of the winner, in [0, 1].
    pub confidence: f32,
    /// Every `(label, probability)` pair in output order.
    pub probabilities: Vec<(String, f32)>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub bbox: NormalizedBox,
    /// `objectness × max(class score)`, clamped to [0, 1].
    pub score: f32,
}

/// Numerically stable softmax: shift by the max logit and accumulate in f64.
///
/// Returns an empty vector for empty input and all zeros if the input held no
/// finite maximum.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }

    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = logits.iter().map(|&l| (l as f64 - max).exp()).collect();
    let sum: f64 = exps.iter().sum();

    if !(sum.is_finite() && sum > 0.0) {
        return vec![0.0; logits.len()];
    }

    exps.iter().map(|e| (e / sum) as f32).collect()
}

/// Index of the largest value; the first one wins ties.
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut iter = values.iter().enumerate();
    let (mut best_idx, mut best) = iter.next().map(|(i, &v)| (i, v))?;
    for (i, &v) in iter {
        if v > best {
            best = v;
            best_idx = i;
        }
    }
    Some(best_idx)
}

fn label_at(labels: &[String], index: usize) -> String {
    labels
        .get(index)
        .cloned()
        .unwrap_or_else(|| format!("cls{}", index))
}

/// Softmax + argmax over classifier logits.
///
/// `None` when the model produced no scores. An index outside `labels` maps to
/// [`UNKNOWN_LABEL`].
#[tracing::instrument(level = "debug", skip_all, fields(classes = logits.len()))]
pub fn decode_classification(logits: &[f32], labels: &[String]) -> Option<ClassificationResult> {
    let probs = softmax(logits);
    let index = argmax(&probs)?;

    let label = labels
        .get(index)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
    let confidence = probs[index].clamp(0.0, 1.0);

    let probabilities = probs
        .iter()
        .enumerate()
        .map(|(i, &p)| (label_at(labels, i), p))
        .collect();

    Some(ClassificationResult {
        label,
        index,
        confidence,
        probabilities,
    })
}

/// The `k` most probable `(label, probability)` pairs, highest first.
pub fn top_k(probabilities: &[(String, f32)], k: usize) -> Vec<(String, f32)> {
    let mut sorted = probabilities.to_vec();
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1));
    sorted.truncate(k);
    sorted
}

/// Pick the single best-scoring detector row.
///
/// Coordinates larger than 1 in magnitude are taken as pixels in the model's
/// `input_size` square and divided down; the center-form box is then clamped
/// to the unit square. Returns `None` if no row scores above zero, leaving the
/// fallback geometry to the caller.
#[tracing::instrument(level = "debug", skip_all, fields(rows = rows.nrows()))]
pub fn decode_best_detection(rows: ArrayView2<f32>, input_size: u32) -> Option<Detection> {
    if rows.ncols() < MIN_DETECTION_ROW {
        return None;
    }

    let mut best: Option<(usize, f32)> = None;
    for (i, row) in rows.axis_iter(Axis(0)).enumerate() {
        let objectness = row[4];
        let class_score = row
            .iter()
            .skip(5)
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        let score = objectness * class_score;

        if score > best.map_or(0.0, |(_, s)| s) {
            best = Some((i, score));
        }
    }

    let (idx, score) = best?;
    let row = rows.row(idx);
    let (x, y, w, h) = (row[0], row[1], row[2], row[3]);

    let pixel_space = [x, y, w, h].iter().any(|v| v.abs() > 1.0);
    let scale = if pixel_space { input_size.max(1) as f32 } else { 1.0 };

    Some(Detection {
        bbox: NormalizedBox::from_center(x / scale, y / scale, w / scale, h / scale),
        score: score.clamp(0.0, 1.0),
    })
}

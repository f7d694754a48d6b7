#![allow(dead_code)]

use ndarray::{ArrayD, IxDyn};
use preprocess::Tensor;
use sorter::{AssetStore, InferenceBackend, InferenceError};
use std::io::{self, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Asset store wrapper that counts how often each asset is opened.
pub struct CountingStore<S> {
    inner: S,
    opens: AtomicUsize,
    delay: Duration,
}

impl<S: AssetStore> CountingStore<S> {
    pub fn new(inner: S) -> Self {
        Self::with_delay(inner, Duration::ZERO)
    }

    /// Sleep on every open so concurrent callers pile up on the first load.
    pub fn with_delay(inner: S, delay: Duration) -> Self {
        Self {
            inner,
            opens: AtomicUsize::new(0),
            delay,
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl<S: AssetStore> AssetStore for CountingStore<S> {
    fn open_asset(&self, name: &str) -> io::Result<Box<dyn Read + Send>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.inner.open_asset(name)
    }
}

/// Fake model whose output is described by the asset bytes, so one registry
/// can serve both a classifier and a detector.
///
/// Asset layout: first byte is the kind (`b'C'`, `b'D'`, `b'E'` for "errors on
/// run", `b'S'` for "sleeps 200ms then classifies"), the rest is a little-endian
/// `f32` payload. Classifiers emit the payload as `[1, N]` logits; detectors
/// emit it as `[1, N / 6, 6]` rows.
pub enum ScriptedBackend {
    Classifier(Vec<f32>),
    Detector(Vec<f32>),
    Failing,
    Slow(Vec<f32>),
}

impl ScriptedBackend {
    pub fn classifier_asset(logits: &[f32]) -> Vec<u8> {
        encode(b'C', logits)
    }

    pub fn detector_asset(rows: &[[f32; 6]]) -> Vec<u8> {
        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        encode(b'D', &flat)
    }

    pub fn failing_asset() -> Vec<u8> {
        vec![b'E']
    }

    pub fn slow_asset(logits: &[f32]) -> Vec<u8> {
        encode(b'S', logits)
    }
}

fn encode(kind: u8, values: &[f32]) -> Vec<u8> {
    let mut bytes = vec![kind];
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

fn decode(payload: &[u8]) -> Vec<f32> {
    payload
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

impl InferenceBackend for ScriptedBackend {
    type Options = ();

    fn load_model(bytes: &[u8], _: &()) -> anyhow::Result<Self> {
        let Some((kind, payload)) = bytes.split_first() else {
            anyhow::bail!("empty model file");
        };
        match kind {
            b'C' => Ok(ScriptedBackend::Classifier(decode(payload))),
            b'D' => Ok(ScriptedBackend::Detector(decode(payload))),
            b'E' => Ok(ScriptedBackend::Failing),
            b'S' => Ok(ScriptedBackend::Slow(decode(payload))),
            other => anyhow::bail!("unknown model kind {}", other),
        }
    }

    fn infer(&self, input: &Tensor) -> Result<ArrayD<f32>, InferenceError> {
        assert_eq!(input.ndim(), 4, "Input must be NCHW");
        let shaped = |shape: &[usize], values: &[f32]| {
            ArrayD::from_shape_vec(IxDyn(shape), values.to_vec()).map_err(InferenceError::runtime)
        };
        match self {
            ScriptedBackend::Classifier(logits) => shaped(&[1, logits.len()], logits),
            ScriptedBackend::Detector(rows) => shaped(&[1, rows.len() / 6, 6], rows),
            ScriptedBackend::Failing => Err(InferenceError::runtime("device lost")),
            ScriptedBackend::Slow(logits) => {
                std::thread::sleep(Duration::from_millis(200));
                shaped(&[1, logits.len()], logits)
            }
        }
    }
}

use crate::assets::AssetStore;
use crate::backend::InferenceBackend;
use crate::errors::InferenceError;
use crate::model::ModelSpec;
use common::span_debug;
use ndarray::ArrayD;
use preprocess::{Image, Tensor};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Instant;

/// A loaded model plus what callers need to bind its input.
pub struct ModelHandle<B> {
    asset_name: String,
    input_index: usize,
    backend: B,
}

impl<B: InferenceBackend> ModelHandle<B> {
    pub fn new(asset_name: impl Into<String>, backend: B) -> Self {
        Self {
            asset_name: asset_name.into(),
            input_index: backend.input_index(),
            backend,
        }
    }

    pub fn asset_name(&self) -> &str {
        &self.asset_name
    }

    pub fn input_index(&self) -> usize {
        self.input_index
    }

    /// Run one inference. Never retries; the caller owns any fallback.
    pub fn run(&self, input: &Tensor) -> Result<ArrayD<f32>, InferenceError> {
        let _s = span_debug!("model_run", asset = %self.asset_name);
        self.backend.infer(input)
    }
}

/// Cached outcome of a load attempt.
pub enum ModelState<B> {
    Loaded(Arc<ModelHandle<B>>),
    Unavailable(String),
}

impl<B> Clone for ModelState<B> {
    fn clone(&self) -> Self {
        match self {
            ModelState::Loaded(handle) => ModelState::Loaded(Arc::clone(handle)),
            ModelState::Unavailable(reason) => ModelState::Unavailable(reason.clone()),
        }
    }
}

impl<B> std::fmt::Debug for ModelState<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelState::Loaded(handle) => {
                f.debug_tuple("Loaded").field(&handle.asset_name).finish()
            }
            ModelState::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

impl<B> ModelState<B> {
    pub fn is_loaded(&self) -> bool {
        matches!(self, ModelState::Loaded(_))
    }

    pub fn handle(&self) -> Option<&Arc<ModelHandle<B>>> {
        match self {
            ModelState::Loaded(handle) => Some(handle),
            ModelState::Unavailable(_) => None,
        }
    }

    pub fn into_result(self, asset: &str) -> Result<Arc<ModelHandle<B>>, InferenceError> {
        match self {
            ModelState::Loaded(handle) => Ok(handle),
            ModelState::Unavailable(reason) => Err(InferenceError::ModelUnavailable {
                asset: asset.to_string(),
                reason,
            }),
        }
    }
}

type Slot<B> = Arc<OnceLock<ModelState<B>>>;

/// Named model handles, each loaded at most once.
///
/// Concurrent first callers for the same asset block on a single load; the
/// result (success or failure) is cached until [`ModelRegistry::release`].
pub struct ModelRegistry<B: InferenceBackend> {
    store: Arc<dyn AssetStore>,
    options: B::Options,
    slots: Mutex<HashMap<String, Slot<B>>>,
}

impl<B: InferenceBackend> ModelRegistry<B> {
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self::with_options(store, B::Options::default())
    }

    pub fn with_options(store: Arc<dyn AssetStore>, options: B::Options) -> Self {
        Self {
            store,
            options,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn acquire(&self, asset_name: &str) -> ModelState<B> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(asset_name.to_string()).or_default())
        };

        slot.get_or_init(|| self.load(asset_name)).clone()
    }

    /// Preprocess `image` the way `spec` expects and run it through that model.
    pub fn infer_image(
        &self,
        spec: &ModelSpec,
        image: &Image,
    ) -> Result<ArrayD<f32>, InferenceError> {
        let handle = self
            .acquire(&spec.asset_name)
            .into_result(&spec.asset_name)?;

        let tensor = {
            let _s = span_debug!(
                "prepare_input",
                asset = %spec.asset_name,
                size = spec.input_size
            );
            preprocess::to_tensor(image, spec.input_size, &spec.normalization)
                .map_err(InferenceError::preprocess)?
        };

        handle.run(&tensor)
    }

    /// Whether `asset_name` has been loaded successfully.
    pub fn is_loaded(&self, asset_name: &str) -> bool {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .get(asset_name)
            .and_then(|slot| slot.get())
            .is_some_and(ModelState::is_loaded)
    }

    /// Drop every cached handle and failure. Safe to call repeatedly or before
    /// anything was loaded; handles already given out stay usable.
    pub fn release(&self) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if !slots.is_empty() {
            tracing::info!(models = slots.len(), "Releasing model handles");
        }
        slots.clear();
    }

    fn load(&self, asset_name: &str) -> ModelState<B> {
        let _s = span_debug!("model_load", asset = asset_name);
        let start = Instant::now();

        let bytes = match self.store.read_asset(asset_name) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(asset = asset_name, error = %e, "Model asset unreadable");
                return ModelState::Unavailable(e.to_string());
            }
        };

        match B::load_model(&bytes, &self.options) {
            Ok(backend) => {
                tracing::info!(
                    asset = asset_name,
                    model_bytes = bytes.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Model loaded"
                );
                ModelState::Loaded(Arc::new(ModelHandle::new(asset_name, backend)))
            }
            Err(e) => {
                tracing::warn!(asset = asset_name, error = %e, "Model failed to load");
                ModelState::Unavailable(e.to_string())
            }
        }
    }
}

//! Public prediction API.
//!
//! Composes registry lookup, the engine adapter and buffer decoding. Engine
//! calls run on Tokio's blocking pool so a slow inference never stalls the
//! runtime; with a configured deadline, the caller stops waiting when it
//! passes. The engine cannot be interrupted, so a timed-out call keeps
//! running detached and its buffer is released when it finishes.

use std::path::Path;
use std::sync::Arc;

use fastclass_core::{
    ClassifyError, ConfigError, IntentionResult, PredictionResult, Query, Result, ServiceConfig,
};
use futures::future::join_all;
use tracing::warn;

use crate::adapter::EngineAdapter;
use crate::engine::InferenceEngine;
use crate::registry::ModelRegistry;

/// Flat and hierarchical prediction against named models.
pub struct PredictionService<E: InferenceEngine> {
    registry: Arc<ModelRegistry<E>>,
    adapter: EngineAdapter<E>,
    config: ServiceConfig,
}

impl<E: InferenceEngine> Clone for PredictionService<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            adapter: self.adapter.clone(),
            config: self.config.clone(),
        }
    }
}

impl<E: InferenceEngine> PredictionService<E> {
    /// A service with an empty registry over `engine`.
    pub fn new(engine: E, config: ServiceConfig) -> std::result::Result<Self, ConfigError> {
        Self::with_registry(Arc::new(ModelRegistry::new(Arc::new(engine))), config)
    }

    /// A service sharing an existing registry.
    pub fn with_registry(
        registry: Arc<ModelRegistry<E>>,
        config: ServiceConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let adapter = EngineAdapter::new(Arc::clone(registry.engine()));
        Ok(Self {
            registry,
            adapter,
            config,
        })
    }

    pub fn registry(&self) -> &Arc<ModelRegistry<E>> {
        &self.registry
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Load a model on the blocking pool. See [`ModelRegistry::load`].
    pub async fn load(&self, name: &str, path: impl AsRef<Path>) -> Result<()> {
        let registry = Arc::clone(&self.registry);
        let owned_name = name.to_string();
        let path = path.as_ref().to_path_buf();
        let failed_path = path.clone();

        tokio::task::spawn_blocking(move || registry.load(&owned_name, &path))
            .await
            .unwrap_or_else(|e| {
                warn!(model = name, error = %e, "model loader panicked");
                Err(ClassifyError::ModelLoadFailed {
                    name: name.to_string(),
                    path: failed_path,
                    reason: "loader panicked".to_string(),
                })
            })
    }

    /// Top-`k` labels for `query` with their probabilities.
    ///
    /// Fails with [`ClassifyError::ModelNotFound`] for an unloaded name, even
    /// when `k == 0`. Otherwise `k == 0` returns an empty result without
    /// calling the engine.
    pub async fn predict(&self, name: &str, query: &str, k: usize) -> Result<PredictionResult> {
        let model = self.registry.resolve(name)?;
        if k == 0 {
            return Ok(PredictionResult::new());
        }
        let adapter = self.adapter.clone();
        let query = Query::new(query);
        let width = self.config.flat_slot_width;
        self.run_blocking(name, move || adapter.predict(&model, &query, k, width))
            .await
    }

    /// One label per taxonomy level for `query`, coarsest first.
    ///
    /// Returns fewer than `levels` entries when the taxonomy is shallower.
    pub async fn predict_max_intention(
        &self,
        name: &str,
        query: &str,
        levels: usize,
    ) -> Result<IntentionResult> {
        let model = self.registry.resolve(name)?;
        if levels == 0 {
            return Ok(IntentionResult::new());
        }
        let adapter = self.adapter.clone();
        let query = Query::new(query);
        let width = self.config.hierarchical_slot_width;
        self.run_blocking(name, move || {
            adapter.predict_max_intention(&model, &query, levels, width)
        })
        .await
    }

    /// Predict several queries concurrently against one model.
    ///
    /// The model is resolved once, so every query runs against the same
    /// handle even if the name is reloaded meanwhile. Results keep input
    /// order; each query succeeds or fails on its own.
    pub async fn predict_batch(
        &self,
        name: &str,
        queries: &[&str],
        k: usize,
    ) -> Result<Vec<Result<PredictionResult>>> {
        let model = self.registry.resolve(name)?;
        if k == 0 {
            return Ok(queries.iter().map(|_| Ok(PredictionResult::new())).collect());
        }
        let width = self.config.flat_slot_width;
        let calls = queries.iter().map(move |&text| {
            let adapter = self.adapter.clone();
            let model = Arc::clone(&model);
            let query = Query::new(text);
            self.run_blocking(name, move || adapter.predict(&model, &query, k, width))
        });
        Ok(join_all(calls).await)
    }

    /// [`Self::predict`] on the calling thread, without a deadline.
    pub fn predict_blocking(&self, name: &str, query: &str, k: usize) -> Result<PredictionResult> {
        let model = self.registry.resolve(name)?;
        self.adapter
            .predict(&model, &Query::new(query), k, self.config.flat_slot_width)
    }

    /// [`Self::predict_max_intention`] on the calling thread, without a deadline.
    pub fn predict_max_intention_blocking(
        &self,
        name: &str,
        query: &str,
        levels: usize,
    ) -> Result<IntentionResult> {
        let model = self.registry.resolve(name)?;
        self.adapter.predict_max_intention(
            &model,
            &Query::new(query),
            levels,
            self.config.hierarchical_slot_width,
        )
    }

    async fn run_blocking<T, F>(&self, name: &str, call: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let task = tokio::task::spawn_blocking(call);
        let joined = match self.config.predict_timeout() {
            Some(timeout) => match tokio::time::timeout(timeout, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!(model = name, ?timeout, "prediction timed out");
                    return Err(ClassifyError::PredictionTimeout {
                        name: name.to_string(),
                        timeout,
                    });
                }
            },
            None => task.await,
        };
        joined.unwrap_or_else(|e| {
            warn!(model = name, error = %e, "engine call panicked");
            Err(ClassifyError::PredictionFailed {
                name: name.to_string(),
            })
        })
    }
}

//! One scoped engine call: allocate, invoke, check, decode, release.

use std::sync::Arc;

use fastclass_core::{
    ClassifyError, IntentionResult, PredictionResult, Query, RawResultBuffer, Result,
};
use tracing::{debug, warn};

use crate::engine::{EngineStatus, InferenceEngine};
use crate::registry::LoadedModel;

/// Invokes an [`InferenceEngine`] against a loaded model.
///
/// Each call owns a fresh [`RawResultBuffer`] sized to the request; it is
/// dropped before the call returns, on the error path too. Raw engine
/// statuses never escape: non-zero becomes [`ClassifyError::PredictionFailed`].
pub struct EngineAdapter<E> {
    engine: Arc<E>,
}

impl<E> Clone for EngineAdapter<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<E: InferenceEngine> EngineAdapter<E> {
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }

    /// Top-`k` prediction. `k == 0` returns an empty result without calling the engine.
    pub fn predict(
        &self,
        model: &LoadedModel<E::Model>,
        query: &Query,
        k: usize,
        slot_width: usize,
    ) -> Result<PredictionResult> {
        if k == 0 {
            return Ok(PredictionResult::new());
        }
        let mut buf = RawResultBuffer::new(k, slot_width);
        let status = self.engine.predict(model.model(), query, &mut buf);
        check_status(model.name(), status)?;

        let result = buf.decode_flat();
        debug!(model = model.name(), k, count = result.len(), "predicted");
        Ok(result)
    }

    /// Hierarchical prediction over up to `levels` taxonomy levels.
    pub fn predict_max_intention(
        &self,
        model: &LoadedModel<E::Model>,
        query: &Query,
        levels: usize,
        slot_width: usize,
    ) -> Result<IntentionResult> {
        if levels == 0 {
            return Ok(IntentionResult::new());
        }
        let mut buf = RawResultBuffer::new(levels, slot_width);
        let status = self.engine.predict_hierarchical(model.model(), query, &mut buf);
        check_status(model.name(), status)?;

        let result = buf.decode_ordered();
        debug!(
            model = model.name(),
            levels,
            count = result.len(),
            "predicted max intention"
        );
        Ok(result)
    }
}

fn check_status(name: &str, status: EngineStatus) -> Result<()> {
    if status.is_ok() {
        return Ok(());
    }
    warn!(model = name, status = status.0, "engine returned non-zero status");
    Err(ClassifyError::PredictionFailed {
        name: name.to_string(),
    })
}

//! Scripted in-process engine for tests.
//!
//! A model file is a plain list of labels, one per line. Scores are derived
//! from a hash of `(query, label)`, so the same query always yields the same
//! result. Query text triggers failure modes:
//!
//! - contains `fail`: non-zero status
//! - contains `slow`: sleeps before answering
//! - contains `panic`: panics mid-call
//!
//! A model file whose first line is `#panic` panics during load.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use fastclass_core::{Query, RawResultBuffer};
use tempfile::NamedTempFile;

use crate::engine::scoring::{fill, softmax, top_k, walk_taxonomy};
use crate::engine::{EngineStatus, InferenceEngine};

pub(crate) const SLOW_CALL: Duration = Duration::from_millis(300);

pub(crate) struct ScriptedModel {
    pub(crate) labels: Vec<String>,
}

#[derive(Default)]
pub(crate) struct ScriptedEngine {
    load_delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// Number of predict calls that reached the engine.
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn probabilities(model: &ScriptedModel, query: &Query) -> Vec<f32> {
        let logits: Vec<f32> = model
            .labels
            .iter()
            .map(|label| {
                let mut h = DefaultHasher::new();
                query.as_str().hash(&mut h);
                label.hash(&mut h);
                (h.finish() % 1_000_000) as f32 / 100_000.0
            })
            .collect();
        softmax(&logits)
    }

    /// Returns a status when the query scripts a failure.
    fn script(&self, query: &Query) -> Option<EngineStatus> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let text = query.text();
        if text.contains("panic") {
            panic!("scripted engine panic");
        }
        if text.contains("slow") {
            thread::sleep(SLOW_CALL);
        }
        text.contains("fail").then_some(EngineStatus(3))
    }
}

impl InferenceEngine for ScriptedEngine {
    type Model = ScriptedModel;

    fn load_model(&self, _name: &str, path: &Path) -> anyhow::Result<ScriptedModel> {
        thread::sleep(self.load_delay);
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read model file {}", path.display()))?;
        let labels: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect();
        if labels.first().is_some_and(|l| l == "#panic") {
            panic!("scripted load panic");
        }
        anyhow::ensure!(!labels.is_empty(), "model file has no labels");
        Ok(ScriptedModel { labels })
    }

    fn predict(
        &self,
        model: &ScriptedModel,
        query: &Query,
        out: &mut RawResultBuffer,
    ) -> EngineStatus {
        if let Some(status) = self.script(query) {
            return status;
        }
        let probs = Self::probabilities(model, query);
        let best = top_k(&probs, out.capacity());
        fill(out, best.iter().map(|&i| (model.labels[i].as_str(), probs[i])));
        EngineStatus::OK
    }

    fn predict_hierarchical(
        &self,
        model: &ScriptedModel,
        query: &Query,
        out: &mut RawResultBuffer,
    ) -> EngineStatus {
        if let Some(status) = self.script(query) {
            return status;
        }
        let probs = Self::probabilities(model, query);
        let path = walk_taxonomy(&model.labels, &probs, out.capacity());
        fill(out, path.iter().map(|(l, p)| (l.as_str(), *p)));
        EngineStatus::OK
    }
}

/// Write a temporary model file listing `labels`.
pub(crate) fn model_file(labels: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for label in labels {
        writeln!(file, "{label}").unwrap();
    }
    file.flush().unwrap();
    file
}

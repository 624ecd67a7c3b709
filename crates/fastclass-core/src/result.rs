//! Typed prediction results decoded from engine output.

use std::collections::HashMap;
use std::collections::hash_map;

/// Top-N prediction: label → probability.
///
/// Unordered; use [`PredictionResult::ranked`] for a deterministic order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionResult {
    scores: HashMap<String, f32>,
}

impl PredictionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            scores: HashMap::with_capacity(capacity),
        }
    }

    /// Insert a label, overwriting any previous score for it.
    pub(crate) fn insert(&mut self, label: String, score: f32) {
        self.scores.insert(label, score);
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<f32> {
        self.scores.get(label).copied()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, f32> {
        self.scores.iter()
    }

    /// Labels sorted by descending probability, ties broken by label.
    pub fn ranked(&self) -> Vec<(&str, f32)> {
        let mut ranked: Vec<(&str, f32)> =
            self.scores.iter().map(|(l, &s)| (l.as_str(), s)).collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        ranked
    }

    pub fn into_inner(self) -> HashMap<String, f32> {
        self.scores
    }
}

impl<'a> IntoIterator for &'a PredictionResult {
    type Item = (&'a String, &'a f32);
    type IntoIter = hash_map::Iter<'a, String, f32>;

    fn into_iter(self) -> Self::IntoIter {
        self.scores.iter()
    }
}

impl FromIterator<(String, f32)> for PredictionResult {
    fn from_iter<I: IntoIterator<Item = (String, f32)>>(iter: I) -> Self {
        Self {
            scores: iter.into_iter().collect(),
        }
    }
}

/// Hierarchical "max intention" prediction.
///
/// One `(label, probability)` pair per taxonomy level, coarsest first.
/// Position is the level, so order is preserved exactly as the engine
/// wrote it. Fewer entries than requested means the taxonomy ran out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntentionResult {
    levels: Vec<(String, f32)>,
}

impl IntentionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            levels: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, label: String, score: f32) {
        self.levels.push((label, score));
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// `(label, probability)` pairs from coarsest to finest.
    pub fn levels(&self) -> impl Iterator<Item = (&str, f32)> {
        self.levels.iter().map(|(l, s)| (l.as_str(), *s))
    }

    pub fn level(&self, depth: usize) -> Option<(&str, f32)> {
        self.levels.get(depth).map(|(l, s)| (l.as_str(), *s))
    }

    pub fn labels(&self) -> Vec<&str> {
        self.levels.iter().map(|(l, _)| l.as_str()).collect()
    }

    pub fn scores(&self) -> Vec<f32> {
        self.levels.iter().map(|(_, s)| *s).collect()
    }

    /// The finest level reached.
    pub fn deepest(&self) -> Option<(&str, f32)> {
        self.levels.last().map(|(l, s)| (l.as_str(), *s))
    }

    /// Split into parallel label and score vectors.
    pub fn into_parts(self) -> (Vec<String>, Vec<f32>) {
        self.levels.into_iter().unzip()
    }
}

impl From<Vec<(String, f32)>> for IntentionResult {
    fn from(levels: Vec<(String, f32)>) -> Self {
        Self { levels }
    }
}

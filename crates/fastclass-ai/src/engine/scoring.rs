//! Scoring helpers for in-process engines.
//!
//! Turns raw per-label logits into the shapes the engine boundary expects:
//! top-k probabilities for flat prediction, and a coarse-to-fine walk over
//! dot-separated label paths for hierarchical prediction.

use std::collections::BTreeMap;

use fastclass_core::RawResultBuffer;

/// Separator between taxonomy levels in a label path, e.g. `travel.cancel`.
pub const LEVEL_SEPARATOR: &str = ".";

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 && sum.is_finite() {
        exps.into_iter().map(|e| e / sum).collect()
    } else {
        vec![0.0; logits.len()]
    }
}

/// Indices of the `k` highest scores, highest first. Ties keep index order.
pub fn top_k(scores: &[f32], k: usize) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..scores.len()).collect();
    idx.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    idx.truncate(k);
    idx
}

/// Walk the label taxonomy from the root, one level at a time.
///
/// At each depth, probability mass is summed per prefix among the labels
/// under the prefix chosen at the previous depth, and the heaviest prefix
/// wins (ties go to the lexicographically smaller prefix). Stops early once
/// no label reaches the next depth.
pub fn walk_taxonomy(labels: &[String], probs: &[f32], levels: usize) -> Vec<(String, f32)> {
    let mut path: Vec<(String, f32)> = Vec::with_capacity(levels);

    for depth in 0..levels {
        let parent = path.last().map(|(p, _)| p.as_str());
        let mut mass: BTreeMap<String, f32> = BTreeMap::new();

        for (label, &p) in labels.iter().zip(probs) {
            let segments: Vec<&str> = label.split(LEVEL_SEPARATOR).collect();
            if segments.len() <= depth {
                continue;
            }
            if let Some(parent) = parent
                && segments[..depth].join(LEVEL_SEPARATOR) != parent
            {
                continue;
            }
            *mass.entry(segments[..=depth].join(LEVEL_SEPARATOR)).or_default() += p;
        }

        let mut best: Option<(String, f32)> = None;
        for (prefix, m) in mass {
            if best.as_ref().is_none_or(|(_, b)| m > *b) {
                best = Some((prefix, m));
            }
        }
        match best {
            Some(level) => path.push(level),
            None => break,
        }
    }

    path
}

/// Write `(label, score)` pairs into `out` in order and set the count.
///
/// Pairs beyond the buffer's capacity are dropped.
pub fn fill<'a>(out: &mut RawResultBuffer, pairs: impl IntoIterator<Item = (&'a str, f32)>) {
    let mut count = 0;
    for (i, (label, score)) in pairs.into_iter().take(out.capacity()).enumerate() {
        out.write_slot(i, label, score);
        count += 1;
    }
    out.set_count(count);
}

//! Raw result buffers exchanged with the inference engine.
//!
//! The engine writes its output into caller-owned, fixed-capacity storage:
//! a score array, an array of fixed-width NUL-terminated label slots, and a
//! count of filled slots. [`RawResultBuffer`] owns that storage for exactly
//! one call and decodes it into [`PredictionResult`] or [`IntentionResult`].
//!
//! # Decoding rules
//!
//! - The engine count is clamped to `[0, capacity]`; slots past it are never read.
//! - A label ends at its first NUL byte or at the slot width, whichever comes
//!   first. Nothing past a slot's width is ever read.
//! - Non-UTF-8 label bytes are decoded lossily.
//!
//! # Bounds
//!
//! Capacity is capped at [`MAX_CAPACITY`] slots and slot width at
//! [`MAX_SLOT_WIDTH`] bytes, so a request can never ask for more than 256 MiB
//! of label storage. A larger request is served as if it asked for the cap.

use std::slice::ChunksExactMut;

use tracing::{debug, warn};

use crate::result::{IntentionResult, PredictionResult};

/// Label slot width for top-N prediction.
pub const FLAT_SLOT_WIDTH: usize = 64;

/// Label slot width for hierarchical prediction.
pub const HIERARCHICAL_SLOT_WIDTH: usize = 128;

/// Narrowest slot that can hold a label byte and its terminator.
const MIN_SLOT_WIDTH: usize = 2;

/// Most slots a single buffer holds.
pub const MAX_CAPACITY: usize = 1 << 16;

/// Widest label slot, in bytes.
pub const MAX_SLOT_WIDTH: usize = 4096;

/// Fixed-capacity engine output: parallel score and label-slot arrays plus a count.
#[derive(Debug)]
pub struct RawResultBuffer {
    scores: Vec<f32>,
    labels: Vec<u8>,
    slot_width: usize,
    count: i32,
}

/// Disjoint mutable views handed to an engine for one call.
pub struct RawParts<'a> {
    /// One score per slot.
    pub scores: &'a mut [f32],
    /// Label slots, each exactly `slot_width` bytes.
    pub labels: ChunksExactMut<'a, u8>,
    /// Number of slots the engine filled.
    pub count: &'a mut i32,
}

impl RawResultBuffer {
    /// Allocate a zeroed buffer of `capacity` slots.
    ///
    /// `capacity` is capped at [`MAX_CAPACITY`]; `slot_width` is clamped to
    /// `[2, MAX_SLOT_WIDTH]`.
    pub fn new(capacity: usize, slot_width: usize) -> Self {
        let requested = capacity;
        let capacity = capacity.min(MAX_CAPACITY);
        if capacity < requested {
            debug!(requested, capacity, "result buffer capacity capped");
        }
        let slot_width = slot_width.clamp(MIN_SLOT_WIDTH, MAX_SLOT_WIDTH);
        Self {
            scores: vec![0.0; capacity],
            labels: vec![0; capacity * slot_width],
            slot_width,
            count: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.scores.len()
    }

    pub fn slot_width(&self) -> usize {
        self.slot_width
    }

    /// Count as reported by the engine, unvalidated.
    pub fn count(&self) -> i32 {
        self.count
    }

    pub fn set_count(&mut self, count: i32) {
        self.count = count;
    }

    pub fn raw_parts_mut(&mut self) -> RawParts<'_> {
        RawParts {
            scores: &mut self.scores,
            labels: self.labels.chunks_exact_mut(self.slot_width),
            count: &mut self.count,
        }
    }

    /// Write one label/score pair, truncating the label to `slot_width - 1`
    /// bytes on a char boundary so the slot stays terminated.
    ///
    /// Returns `false` if `index` is outside the buffer.
    pub fn write_slot(&mut self, index: usize, label: &str, score: f32) -> bool {
        if index >= self.capacity() {
            return false;
        }
        let mut end = label.len().min(self.slot_width - 1);
        while !label.is_char_boundary(end) {
            end -= 1;
        }
        let start = index * self.slot_width;
        let slot = &mut self.labels[start..start + self.slot_width];
        slot[..end].copy_from_slice(&label.as_bytes()[..end]);
        slot[end..].fill(0);
        self.scores[index] = score;
        true
    }

    /// Number of slots that hold valid results.
    pub fn filled(&self) -> usize {
        let capacity = self.capacity();
        match usize::try_from(self.count) {
            Ok(n) if n <= capacity => n,
            Ok(n) => {
                warn!(count = n, capacity, "engine reported more results than capacity");
                capacity
            }
            Err(_) => {
                warn!(count = self.count, "engine reported a negative result count");
                0
            }
        }
    }

    /// Decode into a label → probability mapping. Later duplicates win.
    pub fn decode_flat(&self) -> PredictionResult {
        let filled = self.filled();
        let mut result = PredictionResult::with_capacity(filled);
        for i in 0..filled {
            result.insert(self.label_at(i), self.scores[i]);
        }
        result
    }

    /// Decode into an ordered level sequence, slot order preserved.
    pub fn decode_ordered(&self) -> IntentionResult {
        let filled = self.filled();
        let mut result = IntentionResult::with_capacity(filled);
        for i in 0..filled {
            result.push(self.label_at(i), self.scores[i]);
        }
        result
    }

    fn label_at(&self, index: usize) -> String {
        let start = index * self.slot_width;
        let slot = &self.labels[start..start + self.slot_width];
        let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
        String::from_utf8_lossy(&slot[..end]).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_buffer_is_zeroed() {
        let buf = RawResultBuffer::new(3, FLAT_SLOT_WIDTH);
        assert_eq!(buf.capacity(), 3);
        assert_eq!(buf.slot_width(), 64);
        assert_eq!(buf.count(), 0);
        assert!(buf.labels.iter().all(|&b| b == 0));
    }

    #[test]
    fn zero_count_decodes_empty() {
        let mut buf = RawResultBuffer::new(3, FLAT_SLOT_WIDTH);
        buf.write_slot(0, "book_flight", 0.82);
        buf.set_count(0);
        assert!(buf.decode_flat().is_empty());
        assert!(buf.decode_ordered().is_empty());
    }

    #[test]
    fn reproduces_what_the_engine_wrote() {
        let mut buf = RawResultBuffer::new(3, FLAT_SLOT_WIDTH);
        buf.write_slot(0, "book_flight", 0.82);
        buf.write_slot(1, "cancel_flight", 0.10);
        buf.set_count(2);

        let flat = buf.decode_flat();
        assert_eq!(flat.len(), 2);
        assert_eq!(flat.get("book_flight"), Some(0.82));
        assert_eq!(flat.get("cancel_flight"), Some(0.10));
    }

    #[test]
    fn slots_past_count_are_ignored() {
        let mut buf = RawResultBuffer::new(3, FLAT_SLOT_WIDTH);
        buf.write_slot(0, "a", 0.5);
        buf.write_slot(1, "b", 0.3);
        buf.write_slot(2, "stale", 0.2);
        buf.set_count(2);

        let flat = buf.decode_flat();
        assert_eq!(flat.len(), 2);
        assert_eq!(flat.get("stale"), None);
    }

    #[test]
    fn count_is_clamped_to_capacity() {
        let mut buf = RawResultBuffer::new(2, FLAT_SLOT_WIDTH);
        buf.write_slot(0, "a", 0.5);
        buf.write_slot(1, "b", 0.3);
        buf.set_count(7);
        assert_eq!(buf.filled(), 2);
        assert_eq!(buf.decode_ordered().len(), 2);
    }

    #[test]
    fn negative_count_decodes_empty() {
        let mut buf = RawResultBuffer::new(2, FLAT_SLOT_WIDTH);
        buf.write_slot(0, "a", 0.5);
        buf.set_count(-1);
        assert_eq!(buf.filled(), 0);
        assert!(buf.decode_flat().is_empty());
    }

    #[test]
    fn unterminated_slot_is_read_to_its_width_only() {
        let mut buf = RawResultBuffer::new(2, 4);
        {
            let parts = buf.raw_parts_mut();
            let mut slots = parts.labels;
            slots.next().unwrap().copy_from_slice(b"abcd");
            slots.next().unwrap().copy_from_slice(b"wxyz");
            parts.scores[0] = 0.6;
            parts.scores[1] = 0.4;
            *parts.count = 2;
        }
        let ordered = buf.decode_ordered();
        assert_eq!(ordered.labels(), vec!["abcd", "wxyz"]);
    }

    #[test]
    fn write_slot_truncates_on_char_boundary() {
        let mut buf = RawResultBuffer::new(1, 5);
        assert!(buf.write_slot(0, "nénè", 1.0));
        buf.set_count(1);
        assert_eq!(buf.decode_ordered().labels(), vec!["nén"]);

        // Two usable bytes would split the 'é'.
        let mut buf = RawResultBuffer::new(1, 3);
        buf.write_slot(0, "néé", 1.0);
        buf.set_count(1);
        assert_eq!(buf.decode_ordered().labels(), vec!["n"]);
    }

    #[test]
    fn rewriting_a_slot_clears_the_old_tail() {
        let mut buf = RawResultBuffer::new(1, FLAT_SLOT_WIDTH);
        buf.write_slot(0, "cancel_flight", 0.1);
        buf.write_slot(0, "book", 0.9);
        buf.set_count(1);
        assert_eq!(buf.decode_flat().get("book"), Some(0.9));
    }

    #[test]
    fn write_slot_out_of_range_is_rejected() {
        let mut buf = RawResultBuffer::new(1, FLAT_SLOT_WIDTH);
        assert!(!buf.write_slot(1, "x", 0.1));
    }

    #[test]
    fn ordered_decode_keeps_slot_order() {
        let mut buf = RawResultBuffer::new(2, HIERARCHICAL_SLOT_WIDTH);
        buf.write_slot(0, "travel", 0.9);
        buf.write_slot(1, "travel.cancel", 0.75);
        buf.set_count(2);
        let levels: Vec<_> = buf.decode_ordered().levels().map(|(l, _)| l.to_string()).collect();
        assert_eq!(levels, vec!["travel", "travel.cancel"]);
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let mut buf = RawResultBuffer::new(1, 8);
        {
            let parts = buf.raw_parts_mut();
            let mut slots = parts.labels;
            slots.next().unwrap()[..3].copy_from_slice(&[b'a', 0xFF, b'b']);
            *parts.count = 1;
        }
        assert_eq!(buf.decode_ordered().labels(), vec!["a\u{FFFD}b"]);
    }

    #[test]
    fn tiny_slot_width_is_raised() {
        let buf = RawResultBuffer::new(1, 0);
        assert_eq!(buf.slot_width(), 2);
    }

    #[test]
    fn huge_requests_are_capped() {
        let buf = RawResultBuffer::new(usize::MAX, FLAT_SLOT_WIDTH);
        assert_eq!(buf.capacity(), MAX_CAPACITY);
        assert_eq!(buf.labels.len(), MAX_CAPACITY * FLAT_SLOT_WIDTH);

        let buf = RawResultBuffer::new(1 << 36, FLAT_SLOT_WIDTH);
        assert_eq!(buf.capacity(), MAX_CAPACITY);

        let buf = RawResultBuffer::new(1, usize::MAX);
        assert_eq!(buf.slot_width(), MAX_SLOT_WIDTH);
        assert_eq!(buf.labels.len(), MAX_SLOT_WIDTH);
    }
}

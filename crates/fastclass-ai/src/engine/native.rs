//! Marshaling for C classification entry points.
//!
//! Native engines share one calling convention for both prediction modes:
//! model name, query, a score array, an array of label-slot pointers, a count
//! out-parameter, the requested result count and the slot width. [`invoke`]
//! builds those arguments over a [`RawResultBuffer`] so the native side writes
//! only into Rust-owned storage of the advertised size.

use std::ffi::{CStr, CString, c_char, c_float, c_int};

use fastclass_core::{Query, RawResultBuffer};
use tracing::warn;

use super::EngineStatus;

/// Signature of a native `predict`/`predictMaxIntention` entry point.
pub type PredictFn = unsafe extern "C" fn(
    name: *mut c_char,
    query: *mut c_char,
    prob: *mut c_float,
    buf: *mut *mut c_char,
    count: *mut c_int,
    k: c_int,
    buf_sz: c_int,
) -> c_int;

/// Call `entry` with `out` as the result buffer.
///
/// The requested count is `out.capacity()` and the slot width is
/// `out.slot_width()`. A query with an interior NUL cannot cross the
/// boundary and yields [`EngineStatus::INVALID_INPUT`] without calling
/// `entry`.
///
/// # Safety
///
/// `entry` must write at most `k` scores, at most `k` label slots of at most
/// `buf_sz` bytes each, and the count, through the pointers it is given, and
/// must not keep any of them after returning.
pub unsafe fn invoke(
    entry: PredictFn,
    model: &CStr,
    query: &Query,
    out: &mut RawResultBuffer,
) -> EngineStatus {
    let Ok(c_query) = CString::new(query.as_str()) else {
        warn!("query contains an interior NUL byte");
        return EngineStatus::INVALID_INPUT;
    };
    let (Ok(capacity), Ok(width)) = (
        c_int::try_from(out.capacity()),
        c_int::try_from(out.slot_width()),
    ) else {
        warn!(
            capacity = out.capacity(),
            width = out.slot_width(),
            "buffer too large for the native interface"
        );
        return EngineStatus::INVALID_INPUT;
    };

    let parts = out.raw_parts_mut();
    let mut slots: Vec<*mut c_char> = parts
        .labels
        .map(|slot| slot.as_mut_ptr().cast::<c_char>())
        .collect();

    // SAFETY: every pointer refers to live, exclusively borrowed storage:
    // `capacity` scores, `capacity` slots of `width` bytes each, and the
    // count. The name and query are NUL-terminated and outlive the call.
    let status = unsafe {
        entry(
            model.as_ptr().cast_mut(),
            c_query.as_ptr().cast_mut(),
            parts.scores.as_mut_ptr(),
            slots.as_mut_ptr(),
            parts.count,
            capacity,
            width,
        )
    };
    EngineStatus(status)
}

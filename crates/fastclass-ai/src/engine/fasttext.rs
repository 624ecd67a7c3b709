//! Binding to the native fastText classification library.
//!
//! The library keeps loaded models in a process-wide table keyed by name and
//! exposes three C entry points. Prediction calls are marshalled by
//! [`native::invoke`] over the caller's [`RawResultBuffer`].
//!
//! The native loader aborts the process on a bad path, so paths are checked
//! here first. Its model table is not synchronised: loads take an exclusive
//! lock against in-flight predictions.

use std::ffi::CString;
use std::path::Path;

use anyhow::Context;
use fastclass_core::{Query, RawResultBuffer};
use parking_lot::RwLock;
use tracing::debug;

use super::native::{self, PredictFn};
use super::{EngineStatus, InferenceEngine};

mod sys {
    use std::ffi::{c_char, c_float, c_int};

    #[link(name = "fasttext")]
    unsafe extern "C" {
        pub fn load_model(name: *mut c_char, path: *mut c_char);

        pub fn predict(
            name: *mut c_char,
            query: *mut c_char,
            prob: *mut c_float,
            buf: *mut *mut c_char,
            count: *mut c_int,
            k: c_int,
            buf_sz: c_int,
        ) -> c_int;

        #[link_name = "predictMaxIntention"]
        pub fn predict_max_intention(
            name: *mut c_char,
            query: *mut c_char,
            prob: *mut c_float,
            buf: *mut *mut c_char,
            count: *mut c_int,
            level: c_int,
            buf_sz: c_int,
        ) -> c_int;
    }
}

/// A model registered in the native table.
pub struct FastTextModel {
    name: CString,
}

/// [`InferenceEngine`] backed by the native fastText library.
#[derive(Default)]
pub struct FastTextEngine {
    table: RwLock<()>,
}

impl FastTextEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn call(
        &self,
        entry: PredictFn,
        model: &FastTextModel,
        query: &Query,
        out: &mut RawResultBuffer,
    ) -> EngineStatus {
        let _table = self.table.read();
        // SAFETY: both native entry points follow the `invoke` contract: they
        // write at most `k` results of at most `buf_sz` bytes and keep nothing.
        unsafe { native::invoke(entry, &model.name, query, out) }
    }
}

impl InferenceEngine for FastTextEngine {
    type Model = FastTextModel;

    fn load_model(&self, name: &str, path: &Path) -> anyhow::Result<FastTextModel> {
        anyhow::ensure!(path.is_file(), "model file not found: {}", path.display());
        let c_name = CString::new(name).context("model name contains a NUL byte")?;
        let path_str = path
            .to_str()
            .ok_or_else(|| anyhow::anyhow!("non-UTF8 model path: {path:?}"))?;
        let c_path = CString::new(path_str).context("model path contains a NUL byte")?;

        let _table = self.table.write();
        // SAFETY: both strings are NUL-terminated and outlive the call; the
        // path was checked above so the loader does not abort.
        unsafe { sys::load_model(c_name.as_ptr().cast_mut(), c_path.as_ptr().cast_mut()) };

        debug!(model = name, path = path_str, "native model loaded");
        Ok(FastTextModel { name: c_name })
    }

    fn predict(
        &self,
        model: &FastTextModel,
        query: &Query,
        out: &mut RawResultBuffer,
    ) -> EngineStatus {
        self.call(sys::predict, model, query, out)
    }

    fn predict_hierarchical(
        &self,
        model: &FastTextModel,
        query: &Query,
        out: &mut RawResultBuffer,
    ) -> EngineStatus {
        self.call(sys::predict_max_intention, model, query, out)
    }
}

//! The inference engine boundary.
//!
//! An engine loads model files and fills caller-owned [`RawResultBuffer`]s.
//! It reports success with an integer status, mirroring a C entry point;
//! [`crate::EngineAdapter`] converts that status into [`crate::ClassifyError`]
//! before anything leaves the call.

use std::path::Path;

use fastclass_core::{Query, RawResultBuffer};

pub mod native;
pub mod scoring;

#[cfg(feature = "fasttext-ffi")]
pub mod fasttext;
#[cfg(feature = "onnx")]
pub mod onnx;

/// Integer status returned by an engine call. Zero is success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStatus(pub i32);

impl EngineStatus {
    pub const OK: Self = Self(0);
    /// Generic failure for in-process engines.
    pub const FAILED: Self = Self(1);
    /// The request could not be marshalled across the boundary.
    pub const INVALID_INPUT: Self = Self(-1);

    pub fn is_ok(self) -> bool {
        self == Self::OK
    }
}

/// An external text-classification engine.
///
/// Implementations must tolerate concurrent `predict*` calls against the same
/// model: a loaded model is read-only while predicting.
pub trait InferenceEngine: Send + Sync + 'static {
    /// Engine-side state for one loaded model.
    type Model: Send + Sync + 'static;

    /// Read and parse the model at `path`. May block for file I/O.
    fn load_model(&self, name: &str, path: &Path) -> anyhow::Result<Self::Model>;

    /// Write the top `out.capacity()` labels for `query` into `out`.
    fn predict(
        &self,
        model: &Self::Model,
        query: &Query,
        out: &mut RawResultBuffer,
    ) -> EngineStatus;

    /// Write one label per taxonomy level, coarsest first, up to
    /// `out.capacity()` levels.
    fn predict_hierarchical(
        &self,
        model: &Self::Model,
        query: &Query,
        out: &mut RawResultBuffer,
    ) -> EngineStatus;
}

//! Model registry and prediction service for embedding-based text classifiers.
//!
//! The classification engine itself is external; this crate owns the boundary
//! around it: which models are resident, how a query crosses into the engine,
//! and how the engine's raw output comes back as typed results.

mod adapter;
pub mod engine;
mod registry;
mod service;

#[cfg(test)]
mod testing;

pub use adapter::EngineAdapter;
pub use engine::{EngineStatus, InferenceEngine};
pub use registry::{LoadedModel, ModelRegistry};
pub use service::PredictionService;

#[cfg(feature = "fasttext-ffi")]
pub use engine::fasttext::FastTextEngine;
#[cfg(feature = "onnx")]
pub use engine::onnx::OnnxEngine;

pub use fastclass_core::{
    ClassifyError, IntentionResult, PredictionResult, Query, RawResultBuffer, Result,
    ServiceConfig,
};

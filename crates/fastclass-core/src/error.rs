use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures surfaced by the model registry and prediction service.
///
/// A failed call never carries partial results: the `Err` side of
/// [`Result`] replaces the prediction entirely.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("model not found: {name}")]
    ModelNotFound { name: String },

    #[error("failed to load model {name} from {path}: {reason}")]
    ModelLoadFailed {
        name: String,
        path: PathBuf,
        reason: String,
    },

    #[error("model {name} is already being loaded")]
    ModelBusy { name: String },

    #[error("prediction against model {name} failed")]
    PredictionFailed { name: String },

    #[error("prediction against model {name} exceeded {timeout:?}")]
    PredictionTimeout { name: String, timeout: Duration },
}

impl ClassifyError {
    /// Name of the model the failed call was addressed to.
    pub fn model_name(&self) -> &str {
        match self {
            Self::ModelNotFound { name }
            | Self::ModelLoadFailed { name, .. }
            | Self::ModelBusy { name }
            | Self::PredictionFailed { name }
            | Self::PredictionTimeout { name, .. } => name,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClassifyError>;

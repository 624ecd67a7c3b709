pub mod buffer;
pub mod config;
pub mod error;
pub mod query;
pub mod result;

pub use buffer::{
    FLAT_SLOT_WIDTH, HIERARCHICAL_SLOT_WIDTH, MAX_CAPACITY, MAX_SLOT_WIDTH, RawResultBuffer,
};
pub use config::{ConfigError, ServiceConfig};
pub use error::{ClassifyError, Result};
pub use query::Query;
pub use result::{IntentionResult, PredictionResult};

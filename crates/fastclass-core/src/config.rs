//! Service configuration.
//!
//! Plain serde-deserializable settings; where they are sourced from (file,
//! environment, hard-coded) is up to the embedding application.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::buffer::{FLAT_SLOT_WIDTH, HIERARCHICAL_SLOT_WIDTH, MAX_SLOT_WIDTH};

/// Smallest usable slot: one label byte plus the terminator.
const MIN_SLOT_WIDTH: usize = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be at least {} bytes, got {value}", MIN_SLOT_WIDTH)]
    SlotTooNarrow { field: &'static str, value: usize },

    #[error("{field} must be at most {} bytes, got {value}", MAX_SLOT_WIDTH)]
    SlotTooWide { field: &'static str, value: usize },

    #[error("predict_timeout_ms must be non-zero")]
    ZeroTimeout,
}

/// Settings for the prediction service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Deadline for a single engine call. `None` waits indefinitely.
    pub predict_timeout_ms: Option<u64>,
    /// Label slot width for top-N prediction.
    pub flat_slot_width: usize,
    /// Label slot width for hierarchical prediction. Taxonomy paths are
    /// longer than flat labels, hence the wider default.
    pub hierarchical_slot_width: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            predict_timeout_ms: None,
            flat_slot_width: FLAT_SLOT_WIDTH,
            hierarchical_slot_width: HIERARCHICAL_SLOT_WIDTH,
        }
    }
}

impl ServiceConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.predict_timeout_ms = Some(millis.max(1));
        self
    }

    pub fn predict_timeout(&self) -> Option<Duration> {
        self.predict_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_slot_width("flat_slot_width", self.flat_slot_width)?;
        check_slot_width("hierarchical_slot_width", self.hierarchical_slot_width)?;
        if self.predict_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

fn check_slot_width(field: &'static str, value: usize) -> Result<(), ConfigError> {
    if value < MIN_SLOT_WIDTH {
        return Err(ConfigError::SlotTooNarrow { field, value });
    }
    if value > MAX_SLOT_WIDTH {
        return Err(ConfigError::SlotTooWide { field, value });
    }
    Ok(())
}

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Options used when constructing an [`Engine`](crate::Engine). Immutable for the engine's lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Minimum right-to-left ratio for categories that are not always checked
    pub rtl_threshold: f32,
    /// Quiet period after the last mutation batch before reprocessing starts
    #[serde(rename = "debounceMs", with = "millis")]
    pub debounce: Duration,
    /// Upper bound on the time spent processing nodes before yielding to the host
    #[serde(rename = "sliceBudgetMs", with = "millis")]
    pub slice_budget: Duration,
    /// Attach a transition hint to styled elements
    pub visual_feedback: bool,
    /// Run child engines inside same-origin embedded frames
    pub delegate_frames: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rtl_threshold: 0.3,
            debounce: Duration::from_millis(150),
            slice_budget: Duration::from_millis(8),
            visual_feedback: true,
            delegate_frames: true,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("RTL threshold must be within 0..=1, got {0}")]
    ThresholdOutOfRange(f32),

    #[error("Slice budget must be non-zero")]
    ZeroSliceBudget,

    #[error("Invalid configuration: {0}")]
    Parse(String),
}

impl EngineConfig {
    /// Parse a configuration from JSON. Missing fields take their default value.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.rtl_threshold) {
            return Err(ConfigError::ThresholdOutOfRange(self.rtl_threshold));
        }
        if self.slice_budget.is_zero() {
            return Err(ConfigError::ZeroSliceBudget);
        }
        Ok(())
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.rtl_threshold = threshold;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_slice_budget(mut self, budget: Duration) -> Self {
        self.slice_budget = budget;
        self
    }

    pub fn with_visual_feedback(mut self, enabled: bool) -> Self {
        self.visual_feedback = enabled;
        self
    }

    pub fn with_frame_delegation(mut self, enabled: bool) -> Self {
        self.delegate_frames = enabled;
        self
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

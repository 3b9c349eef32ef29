use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// Harness-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HarnessConfig {
    /// Max microtasks (including async resumes) a single task may run.
    pub max_microtasks_per_task: usize,
    /// Record scheduler and simulator activity in the trace log.
    pub trace: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            max_microtasks_per_task: 100_000,
            trace: true,
        }
    }
}

impl HarnessConfig {
    pub fn from_json(json: &str) -> Result<Self, HarnessError> {
        serde_json::from_str(json).map_err(|e| HarnessError::Config(format!("invalid harness config: {e}")))
    }
}

/// Settings for one root surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RootConfig {
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub point_scale_factor: f64,
}

impl Default for RootConfig {
    fn default() -> Self {
        RootConfig {
            viewport_width: 390.0,
            viewport_height: 844.0,
            point_scale_factor: 3.0,
        }
    }
}

impl RootConfig {
    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, HarnessError> {
        let config: RootConfig = serde_json::from_str(json)
            .map_err(|e| HarnessError::Config(format!("invalid root config: {e}")))?;
        if !(config.viewport_width >= 0.0 && config.viewport_height >= 0.0) {
            return Err(HarnessError::Config(format!(
                "viewport must be non-negative, got {}x{}",
                config.viewport_width, config.viewport_height
            )));
        }
        Ok(config)
    }
}

//! Pipeline configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Tunables for one analytics job.
///
/// Missing fields fall back to their defaults when deserialized, so an
/// orchestrator only needs to supply the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Radius in floorplan pixels of the disc painted per detection.
    pub disc_radius: u32,
    /// Zones per side of the analysis grid.
    pub zone_grid: u32,
    /// Number of ranked zones reported.
    pub top_zones: usize,
    /// Frames between detection-stage progress reports.
    pub frame_report_interval: u64,
    /// Deposits between heatmap-stage progress reports.
    pub detection_report_interval: usize,
    /// Deposits between preview renders; `None` disables previews.
    pub preview_interval: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            disc_radius: 20,
            zone_grid: 5,
            top_zones: 5,
            frame_report_interval: 10,
            detection_report_interval: 20,
            preview_interval: Some(20),
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(Error::InvalidConfig {
                reason: reason.to_string(),
            })
        };
        if self.disc_radius == 0 {
            return invalid("disc_radius must be positive");
        }
        if self.zone_grid == 0 {
            return invalid("zone_grid must be positive");
        }
        if self.frame_report_interval == 0 || self.detection_report_interval == 0 {
            return invalid("report intervals must be positive");
        }
        if self.preview_interval == Some(0) {
            return invalid("preview_interval must be positive when set");
        }
        Ok(())
    }
}

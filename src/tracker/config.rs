//! Tracker configuration and construction-time validation.

use std::path::Path;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

/// Configuration for the [`ObjectTracker`](crate::ObjectTracker).
///
/// Defaults are tuned for a 1920x1080 camera feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Centroid distance gate for frame-to-frame matching, in pixels.
    pub max_tracking_distance: f32,
    /// Centroid distance gate for recovering an entity from memory, in pixels.
    /// Must be at least `max_tracking_distance`.
    pub recovery_distance: f32,
    /// Unmatched frames tolerated before an entity moves to memory.
    pub missing_tolerance: u32,
    /// Width of the frame border band where unmatched entities are deleted.
    pub border_margin: i32,
    /// How long a memory entity stays recoverable, in seconds.
    pub memory_retention_seconds: f64,
    /// Minimum time between two status exports, in seconds.
    pub export_interval_seconds: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_tracking_distance: 400.0,
            recovery_distance: 500.0,
            missing_tolerance: 10,
            border_margin: 10,
            memory_retention_seconds: 5.0,
            export_interval_seconds: 2.0,
        }
    }
}

impl TrackerConfig {
    /// Check every field, returning the first violation.
    pub fn validate(&self) -> Result<()> {
        if !self.max_tracking_distance.is_finite() || self.max_tracking_distance <= 0.0 {
            return Err(TrackerError::invalid_config(format!(
                "max_tracking_distance must be positive and finite, got {}",
                self.max_tracking_distance
            )));
        }
        if !self.recovery_distance.is_finite() {
            return Err(TrackerError::invalid_config(format!(
                "recovery_distance must be finite, got {}",
                self.recovery_distance
            )));
        }
        if self.recovery_distance < self.max_tracking_distance {
            return Err(TrackerError::invalid_config(format!(
                "recovery_distance ({}) must be >= max_tracking_distance ({})",
                self.recovery_distance, self.max_tracking_distance
            )));
        }
        if self.border_margin < 0 {
            return Err(TrackerError::invalid_config(format!(
                "border_margin must be non-negative, got {}",
                self.border_margin
            )));
        }
        if !self.memory_retention_seconds.is_finite() || self.memory_retention_seconds < 0.0 {
            return Err(TrackerError::invalid_config(format!(
                "memory_retention_seconds must be non-negative and finite, got {}",
                self.memory_retention_seconds
            )));
        }
        if !self.export_interval_seconds.is_finite() || self.export_interval_seconds < 0.0 {
            return Err(TrackerError::invalid_config(format!(
                "export_interval_seconds must be non-negative and finite, got {}",
                self.export_interval_seconds
            )));
        }
        Ok(())
    }

    /// Load a configuration from a JSON file and validate it.
    ///
    /// Missing fields take their default values.
    pub fn from_json(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| TrackerError::ConfigRead {
                path: path.to_path_buf(),
                source,
            })?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn memory_retention(&self) -> TimeDelta {
        secs_to_delta(self.memory_retention_seconds)
    }

    pub(crate) fn export_interval(&self) -> TimeDelta {
        secs_to_delta(self.export_interval_seconds)
    }
}

fn secs_to_delta(secs: f64) -> TimeDelta {
    TimeDelta::microseconds((secs * 1e6) as i64)
}

//! Target selection and steering control.
//!
//! The robot drives toward the largest visible entity, taking box area as a
//! proxy for proximity. Steering is a proportional controller on the
//! horizontal offset of the target's centroid; throttle is a simple
//! approach-or-stop rule on the target's apparent width.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tracker::{EntityId, TrackedEntity};

/// Pick the largest entity matched this frame. Ties keep the lowest id.
///
/// Boxes without a positive area are never targets.
pub fn select_target(entities: &BTreeMap<EntityId, TrackedEntity>) -> Option<&TrackedEntity> {
    entities
        .values()
        .filter(|e| e.active() && e.area() > 0)
        .fold(None, |best: Option<&TrackedEntity>, e| match best {
            Some(b) if b.area() >= e.area() => Some(b),
            _ => Some(e),
        })
}

/// Controller gains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SteeringConfig {
    /// Steering output per unit of normalized horizontal error.
    pub steering_gain: f32,
    /// Stop once the target's width reaches this fraction of the frame width.
    pub target_width_ratio: f32,
    /// Throttle while approaching.
    pub approach_speed: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            steering_gain: 0.6,
            target_width_ratio: 0.4,
            approach_speed: 0.65,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteeringStatus {
    /// Following a target.
    Tracking,
    /// No target, motors stopped.
    Stopped,
}

impl fmt::Display for SteeringStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SteeringStatus::Tracking => write!(f, "TRACKING"),
            SteeringStatus::Stopped => write!(f, "NO TARGET - STOPPED"),
        }
    }
}

/// Throttle/steering pair for the drive actuator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringCommand {
    /// 0.0 (stop) to 1.0
    pub throttle: f32,
    /// Negative steers left, positive right.
    pub steering: f32,
    pub status: SteeringStatus,
    /// Id of the entity being followed.
    pub target: Option<EntityId>,
}

impl SteeringCommand {
    pub fn stop() -> Self {
        Self {
            throttle: 0.0,
            steering: 0.0,
            status: SteeringStatus::Stopped,
            target: None,
        }
    }

    /// Actuator line format: `<throttle,steering>` with two decimals.
    pub fn to_wire(&self) -> String {
        format!("<{:.2},{:.2}>\n", self.throttle, self.steering)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SteeringController {
    config: SteeringConfig,
}

impl SteeringController {
    pub fn new(config: SteeringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SteeringConfig {
        &self.config
    }

    pub fn calculate(&self, target: Option<&TrackedEntity>, frame_width: u32) -> SteeringCommand {
        let Some(target) = target else {
            return SteeringCommand::stop();
        };
        if frame_width == 0 {
            return SteeringCommand::stop();
        }

        let half = frame_width as f32 / 2.0;
        let error_x = (target.bbox().center().x - half) / half;
        let steering = error_x * self.config.steering_gain;

        let width_ratio = target.bbox().width as f32 / frame_width as f32;
        let throttle = if width_ratio < self.config.target_width_ratio {
            self.config.approach_speed
        } else {
            0.0
        };

        SteeringCommand {
            throttle,
            steering,
            status: SteeringStatus::Tracking,
            target: Some(target.id()),
        }
    }
}

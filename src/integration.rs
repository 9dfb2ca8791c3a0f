//! Integration module connecting detectors, the tracker and the drive controller.
//!
//! Inference and actuator transport live outside this crate; this module only
//! defines the contracts for them and the glue in between.

mod builder;
mod detector;
mod pipeline;
mod steering;

pub use builder::DetectionBuilder;
pub use detector::{DetectionSource, IntoDetections};
pub use pipeline::TrackerPipeline;
pub use steering::{
    SteeringCommand, SteeringConfig, SteeringController, SteeringStatus, select_target,
};

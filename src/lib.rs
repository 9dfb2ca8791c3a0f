//! # centroid-tracker
//!
//! Temporal object tracker for a camera-equipped mobile robot.
//!
//! Per-frame `(label, box)` detections are resolved into persistent entities
//! with stable ids. Entities that go unseen are kept for a few frames, then
//! parked in a short-term memory from which they can be resurrected with
//! their original id and creation time. Entities lost at the frame border are
//! dropped immediately.
//!
//! ## Example
//!
//! ```rust
//! use centroid_tracker::{Detection, ObjectTracker, Rect, TrackerConfig};
//!
//! let mut tracker = ObjectTracker::new(TrackerConfig::default()).unwrap();
//! let frame = vec![Detection::new("cup", Rect::new(100, 100, 50, 50))];
//! let active = tracker.process(frame, 1920, 1080);
//! assert_eq!(active.len(), 1);
//! ```

pub mod error;
pub mod integration;
pub mod tracker;

pub use error::{ExportError, Result, TrackerError};
pub use integration::{
    DetectionBuilder, DetectionSource, IntoDetections, SteeringCommand, SteeringConfig,
    SteeringController, SteeringStatus, TrackerPipeline, select_target,
};
pub use tracker::{
    Clock, Detection, EntityId, EntityState, ManualClock, ObjectTracker, Rect, SystemClock,
    TrackedEntity, TrackerConfig,
};

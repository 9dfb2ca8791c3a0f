mod clock;
mod config;
mod detection;
mod entity;
mod entity_state;
pub mod export;
pub mod matching;
mod object_tracker;
mod rect;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::TrackerConfig;
pub use detection::Detection;
pub use entity::{EntityId, TIMESTAMP_FORMAT, TrackedEntity};
pub use entity_state::EntityState;
pub use export::{BackgroundSink, JsonFileSink, StatusRecord, StatusSink};
pub use object_tracker::ObjectTracker;
pub use rect::Rect;

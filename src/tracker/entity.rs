//! Single tracked entity with a stable identity.

use chrono::{DateTime, Local, TimeDelta};

use crate::tracker::entity_state::EntityState;
use crate::tracker::rect::Rect;

/// Identifier of a tracked entity. Allocated from 1 upward and never reused.
pub type EntityId = u64;

/// Format of the first-seen timestamp in the status export.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A tracked object instance.
///
/// Owned by [`ObjectTracker`](crate::ObjectTracker); callers only ever see
/// borrowed views, so the label and creation time cannot be changed from
/// outside the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedEntity {
    id: EntityId,
    label: String,
    bbox: Rect,
    created_at: DateTime<Local>,
    last_seen_at: DateTime<Local>,
    missing_count: u32,
    state: EntityState,
}

impl TrackedEntity {
    pub(crate) fn new(id: EntityId, label: String, bbox: Rect, now: DateTime<Local>) -> Self {
        Self {
            id,
            label,
            bbox,
            created_at: now,
            last_seen_at: now,
            missing_count: 0,
            state: EntityState::Live,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Latest known position.
    pub fn bbox(&self) -> Rect {
        self.bbox
    }

    /// Time of the first detection. Survives memory and resurrection.
    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn last_seen_at(&self) -> DateTime<Local> {
        self.last_seen_at
    }

    /// Consecutive frames without a confirmed match.
    pub fn missing_count(&self) -> u32 {
        self.missing_count
    }

    pub fn state(&self) -> EntityState {
        self.state
    }

    /// True iff the entity was matched in the current frame.
    pub fn active(&self) -> bool {
        self.state == EntityState::Live
    }

    pub fn area(&self) -> i64 {
        self.bbox.area()
    }

    /// Time since creation.
    pub fn elapsed(&self, now: DateTime<Local>) -> TimeDelta {
        now - self.created_at
    }

    /// Elapsed time as `MM:SS`. Minutes are not capped at 59.
    pub fn duration_label(&self, now: DateTime<Local>) -> String {
        let secs = self.elapsed(now).num_seconds().max(0);
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }

    /// Creation time as `YYYY-MM-DD HH:MM:SS` in local time.
    pub fn first_seen_label(&self) -> String {
        self.created_at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Confirmed match in the current frame.
    pub(crate) fn update(&mut self, bbox: Rect, now: DateTime<Local>) {
        self.bbox = bbox;
        self.last_seen_at = now;
        self.missing_count = 0;
        self.state = EntityState::Live;
    }

    /// No match in the current frame.
    pub(crate) fn mark_missing(&mut self) {
        self.missing_count += 1;
        self.state = EntityState::Missing;
    }

    pub(crate) fn mark_memory(&mut self) {
        self.state = EntityState::Memory;
    }

    /// Re-enter the active set from memory with a new box.
    ///
    /// Only position and last-seen time change; id, label and creation time
    /// are kept.
    pub(crate) fn resurrect(&mut self, bbox: Rect, now: DateTime<Local>) {
        self.update(bbox, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_missing_then_update_resets_count() {
        let mut e = TrackedEntity::new(1, "cup".into(), Rect::new(0, 0, 10, 10), t0());
        e.mark_missing();
        e.mark_missing();
        assert_eq!(e.missing_count(), 2);
        assert!(!e.active());

        e.update(Rect::new(5, 5, 10, 10), t0() + TimeDelta::seconds(1));
        assert_eq!(e.missing_count(), 0);
        assert!(e.active());
        assert_eq!(e.created_at(), t0());
    }

    #[test]
    fn test_duration_label() {
        let e = TrackedEntity::new(1, "cup".into(), Rect::default(), t0());
        assert_eq!(e.duration_label(t0()), "00:00");
        assert_eq!(e.duration_label(t0() + TimeDelta::seconds(75)), "01:15");
        assert_eq!(e.duration_label(t0() + TimeDelta::seconds(6000)), "100:00");
    }

    #[test]
    fn test_first_seen_label() {
        let e = TrackedEntity::new(1, "cup".into(), Rect::default(), t0());
        assert_eq!(e.first_seen_label(), "2024-05-01 12:00:00");
    }
}

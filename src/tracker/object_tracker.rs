//! Main centroid tracker implementation.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::tracker::clock::{Clock, SystemClock};
use crate::tracker::config::TrackerConfig;
use crate::tracker::entity::{EntityId, TrackedEntity};
use crate::tracker::export::{StatusRecord, StatusSink};
use crate::tracker::matching::{self, AssignmentResult};
use crate::tracker::rect::Rect;
use crate::tracker::Detection;

/// Resolves per-frame detections into identity-stable entities.
///
/// Keeps two stores: the active set (matched recently, returned to the caller
/// every frame) and the memory set (lost for longer than
/// `missing_tolerance` frames, still recoverable for
/// `memory_retention_seconds`). An id lives in at most one of them.
///
/// Not thread-safe by itself; call [`process`](Self::process) once per frame
/// from a single control loop. The returned map borrows the tracker, so
/// entity references cannot outlive the next call.
pub struct ObjectTracker {
    active: BTreeMap<EntityId, TrackedEntity>,
    memory: BTreeMap<EntityId, TrackedEntity>,
    next_id: EntityId,
    config: TrackerConfig,
    clock: Box<dyn Clock>,
    sink: Option<Box<dyn StatusSink>>,
    last_export: Option<DateTime<Local>>,
}

impl ObjectTracker {
    /// Create a tracker using the system clock and no status export.
    pub fn new(config: TrackerConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }

    /// Create a tracker reading time from `clock`.
    pub fn with_clock(config: TrackerConfig, clock: impl Clock + 'static) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            active: BTreeMap::new(),
            memory: BTreeMap::new(),
            next_id: 1,
            config,
            clock: Box::new(clock),
            sink: None,
            last_export: None,
        })
    }

    /// Attach a status sink; snapshots are exported at most once per
    /// `export_interval_seconds`.
    pub fn with_sink(mut self, sink: impl StatusSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn set_sink(&mut self, sink: Option<Box<dyn StatusSink>>) {
        self.sink = sink;
        self.last_export = None;
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Current time of the tracker's clock.
    pub fn now(&self) -> DateTime<Local> {
        self.clock.now()
    }

    /// Active set: entities matched this frame plus those still inside their
    /// missing grace window.
    pub fn active(&self) -> &BTreeMap<EntityId, TrackedEntity> {
        &self.active
    }

    /// Recently lost entities eligible for recovery.
    pub fn memory(&self) -> &BTreeMap<EntityId, TrackedEntity> {
        &self.memory
    }

    /// Look an entity up in either store.
    pub fn get(&self, id: EntityId) -> Option<&TrackedEntity> {
        self.active.get(&id).or_else(|| self.memory.get(&id))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.active.contains_key(&id) || self.memory.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn memory_len(&self) -> usize {
        self.memory.len()
    }

    /// Id the next newly created entity will receive.
    pub fn next_id(&self) -> EntityId {
        self.next_id
    }

    /// Forget every entity. Ids are not reused afterwards.
    pub fn reset(&mut self) {
        self.active.clear();
        self.memory.clear();
    }

    /// Advance the tracker by one frame.
    ///
    /// `detections` must be in the coordinate space of a
    /// `frame_width` x `frame_height` frame. An empty list is a normal frame
    /// in which every active entity goes unmatched.
    pub fn process(
        &mut self,
        detections: Vec<Detection>,
        frame_width: u32,
        frame_height: u32,
    ) -> &BTreeMap<EntityId, TrackedEntity> {
        let now = self.clock.now();

        // Step 1+2: gate same-label pairs by centroid distance, match greedily
        let active_ids: Vec<EntityId> = self.active.keys().copied().collect();
        let AssignmentResult {
            matches,
            unmatched_rows: unmatched_entities,
            unmatched_cols: unmatched_detections,
        } = {
            let tracks: Vec<(&str, Rect)> = self
                .active
                .values()
                .map(|e| (e.label(), e.bbox()))
                .collect();
            let dets: Vec<(&str, Rect)> = detections
                .iter()
                .map(|d| (d.label.as_str(), d.bbox))
                .collect();
            let dists = matching::distance_matrix(&tracks, &dets);
            matching::greedy_assignment(&dists, self.config.max_tracking_distance)
        };

        for &(row, col) in &matches {
            if let Some(entity) = self.active.get_mut(&active_ids[row]) {
                entity.update(detections[col].bbox, now);
            }
        }

        // Step 3: recover from memory or create
        self.recover_or_create(&detections, &unmatched_detections, now);

        // Step 4: dispose of entities that were active before this frame and went unmatched
        for row in unmatched_entities {
            self.dispose_unmatched(active_ids[row], frame_width, frame_height);
        }

        // Step 5: expire memory
        self.collect_garbage(now);

        // Step 6: throttled export
        self.maybe_export(now);

        &self.active
    }

    fn recover_or_create(
        &mut self,
        detections: &[Detection],
        unmatched: &[usize],
        now: DateTime<Local>,
    ) {
        if unmatched.is_empty() {
            return;
        }

        // Same greedy sort-and-claim as the active pass, so two detections
        // never race for one memory entity.
        let memory_ids: Vec<EntityId> = self.memory.keys().copied().collect();
        let recovered = {
            let remembered: Vec<(&str, Rect)> = self
                .memory
                .values()
                .map(|e| (e.label(), e.bbox()))
                .collect();
            let dets: Vec<(&str, Rect)> = unmatched
                .iter()
                .map(|&i| (detections[i].label.as_str(), detections[i].bbox))
                .collect();
            let dists = matching::distance_matrix(&remembered, &dets);
            matching::greedy_assignment(&dists, self.config.recovery_distance)
        };

        let mut resurrected_by_det: BTreeMap<usize, EntityId> = BTreeMap::new();
        for (row, col) in recovered.matches {
            resurrected_by_det.insert(col, memory_ids[row]);
        }

        for (k, &det_idx) in unmatched.iter().enumerate() {
            let det = &detections[det_idx];
            match resurrected_by_det
                .get(&k)
                .and_then(|id| self.memory.remove(id))
            {
                Some(mut entity) => {
                    entity.resurrect(det.bbox, now);
                    info!(id = entity.id(), label = %det.label, "entity resurrected from memory");
                    self.active.insert(entity.id(), entity);
                }
                None => {
                    let id = self.next_id;
                    self.next_id += 1;
                    info!(id, label = %det.label, "new entity");
                    self.active
                        .insert(id, TrackedEntity::new(id, det.label.clone(), det.bbox, now));
                }
            }
        }
    }

    fn dispose_unmatched(&mut self, id: EntityId, frame_width: u32, frame_height: u32) {
        let Some(entity) = self.active.get_mut(&id) else {
            return;
        };
        entity.mark_missing();

        if entity
            .bbox()
            .in_kill_zone(self.config.border_margin, frame_width, frame_height)
        {
            info!(id, "entity lost at frame border, deleted");
            self.active.remove(&id);
        } else if entity.missing_count() > self.config.missing_tolerance {
            info!(id, missing = entity.missing_count(), "entity moved to memory");
            if let Some(mut entity) = self.active.remove(&id) {
                entity.mark_memory();
                self.memory.insert(id, entity);
            }
        }
    }

    fn collect_garbage(&mut self, now: DateTime<Local>) {
        let retention = self.config.memory_retention();
        self.memory.retain(|&id, entity| {
            let keep = now - entity.last_seen_at() <= retention;
            if !keep {
                debug!(id, "memory entity expired");
            }
            keep
        });
    }

    /// Snapshot of the active set as it would be exported now.
    pub fn status_records(&self) -> Vec<StatusRecord> {
        self.records_at(self.clock.now())
    }

    fn records_at(&self, now: DateTime<Local>) -> Vec<StatusRecord> {
        self.active
            .values()
            .map(|e| StatusRecord {
                internal_id: e.id(),
                class: e.label().to_owned(),
                duration: e.duration_label(now),
                timestamp: e.first_seen_label(),
                status: e.state().status_label().to_owned(),
            })
            .collect()
    }

    fn maybe_export(&mut self, now: DateTime<Local>) {
        if self.sink.is_none() {
            return;
        }
        if let Some(last) = self.last_export {
            if now - last < self.config.export_interval() {
                return;
            }
        }

        let records = self.records_at(now);
        // A failed attempt still consumes the tick; the next interval retries.
        self.last_export = Some(now);
        if let Some(sink) = self.sink.as_mut() {
            match sink.write(&records) {
                Ok(()) => debug!(count = records.len(), "status exported"),
                Err(e) => warn!("status export failed: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use crate::tracker::clock::ManualClock;
    use std::sync::{Arc, Mutex};

    fn det(label: &str, x: i32, y: i32) -> Detection {
        Detection::new(label, Rect::new(x, y, 50, 50))
    }

    fn tracker(config: TrackerConfig) -> (ObjectTracker, ManualClock) {
        let clock = ManualClock::default();
        (
            ObjectTracker::with_clock(config, clock.clone()).unwrap(),
            clock,
        )
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let config = TrackerConfig {
            recovery_distance: 1.0,
            ..Default::default()
        };
        assert!(ObjectTracker::new(config).is_err());
    }

    #[test]
    fn test_new_ids_follow_detection_order() {
        let (mut t, _) = tracker(TrackerConfig::default());
        let out = t.process(vec![det("cup", 100, 100), det("cup", 800, 100)], 1920, 1080);
        let ids: Vec<_> = out.values().map(|e| (e.id(), e.bbox().x)).collect();
        assert_eq!(ids, vec![(1, 100), (2, 800)]);
        assert_eq!(t.next_id(), 3);
    }

    #[test]
    fn test_label_gate() {
        let (mut t, _) = tracker(TrackerConfig::default());
        t.process(vec![det("cup", 100, 100)], 1920, 1080);
        let out = t.process(vec![det("bottle", 100, 100)], 1920, 1080);

        let cup = &out[&1];
        assert_eq!(cup.label(), "cup");
        assert!(!cup.active());
        assert_eq!(out[&2].label(), "bottle");
    }

    #[test]
    fn test_crossing_objects_keep_closest_assignment() {
        let (mut t, _) = tracker(TrackerConfig::default());
        t.process(vec![det("cup", 100, 100), det("cup", 300, 100)], 1920, 1080);
        // Both move right by 40 px; greedy picks the shortest pairs.
        let out = t.process(vec![det("cup", 340, 100), det("cup", 140, 100)], 1920, 1080);
        assert_eq!(out[&1].bbox().x, 140);
        assert_eq!(out[&2].bbox().x, 340);
    }

    #[test]
    fn test_recovery_is_greedy_across_detections() {
        let config = TrackerConfig {
            missing_tolerance: 0,
            ..Default::default()
        };
        let (mut t, _) = tracker(config);
        t.process(vec![det("cup", 500, 500)], 1920, 1080);
        t.process(vec![], 1920, 1080);
        assert_eq!(t.memory_len(), 1);

        // The second detection is closer; it must win even though it comes later.
        let out = t.process(vec![det("cup", 700, 500), det("cup", 510, 500)], 1920, 1080);
        assert_eq!(out[&1].bbox().x, 510);
        assert_eq!(out[&2].bbox().x, 700);
        assert_eq!(t.memory_len(), 0);
    }

    #[test]
    fn test_recovered_entity_not_disposed_same_frame() {
        let config = TrackerConfig {
            missing_tolerance: 0,
            ..Default::default()
        };
        let (mut t, _) = tracker(config);
        t.process(vec![det("cup", 500, 500)], 1920, 1080);
        t.process(vec![], 1920, 1080);
        let out = t.process(vec![det("cup", 520, 500)], 1920, 1080);
        assert!(out[&1].active());
        assert_eq!(out[&1].missing_count(), 0);
    }

    #[test]
    fn test_reset_keeps_id_sequence() {
        let (mut t, _) = tracker(TrackerConfig::default());
        t.process(vec![det("cup", 100, 100)], 1920, 1080);
        t.reset();
        assert!(t.is_empty());
        let out = t.process(vec![det("cup", 100, 100)], 1920, 1080);
        assert!(out.contains_key(&2));
    }

    struct Recorder(Arc<Mutex<Vec<Vec<StatusRecord>>>>);

    impl StatusSink for Recorder {
        fn write(&mut self, records: &[StatusRecord]) -> std::result::Result<(), ExportError> {
            self.0.lock().unwrap().push(records.to_vec());
            Ok(())
        }
    }

    #[test]
    fn test_export_is_throttled() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (t, clock) = tracker(TrackerConfig::default());
        let mut t = t.with_sink(Recorder(seen.clone()));

        t.process(vec![det("cup", 100, 100)], 1920, 1080);
        for _ in 0..10 {
            clock.advance_secs(0.1);
            t.process(vec![det("cup", 100, 100)], 1920, 1080);
        }
        assert_eq!(seen.lock().unwrap().len(), 1);

        clock.advance_secs(1.0);
        t.process(vec![det("cup", 100, 100)], 1920, 1080);
        let exports = seen.lock().unwrap();
        assert_eq!(exports.len(), 2);
        assert_eq!(exports[1][0].duration, "00:02");
        assert_eq!(exports[1][0].status, "LIVE");
    }

    #[test]
    fn test_missing_entity_exported_as_memory() {
        let (mut t, _) = tracker(TrackerConfig::default());
        t.process(vec![det("cup", 100, 100)], 1920, 1080);
        t.process(vec![], 1920, 1080);
        let records = t.status_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, "MEMORY");
        assert_eq!(records[0].class, "cup");
    }
}

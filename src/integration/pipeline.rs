//! TrackerPipeline for combining detection with tracking and steering.

use std::collections::BTreeMap;

use crate::tracker::{EntityId, ObjectTracker, TrackedEntity};

use super::{DetectionSource, IntoDetections};
use super::steering::{SteeringCommand, SteeringController, select_target};

/// A combined tracker that bundles detection inference with the centroid tracker.
///
/// The detector may run on a downscaled copy of the frame; its boxes are
/// mapped back to full-frame coordinates before tracking.
pub struct TrackerPipeline<D: DetectionSource> {
    detector: D,
    tracker: ObjectTracker,
    steering: SteeringController,
    inference_scale: f32,
}

impl<D: DetectionSource> TrackerPipeline<D> {
    /// Create a new tracking pipeline with the given detector and tracker.
    pub fn new(detector: D, tracker: ObjectTracker) -> Self {
        Self {
            detector,
            tracker,
            steering: SteeringController::default(),
            inference_scale: 1.0,
        }
    }

    /// The detector sees frames scaled by `scale` (e.g. 0.8); detections are
    /// divided by it before tracking.
    pub fn with_inference_scale(mut self, scale: f32) -> Self {
        self.inference_scale = scale;
        self
    }

    pub fn with_steering(mut self, steering: SteeringController) -> Self {
        self.steering = steering;
        self
    }

    /// Process a single frame and return the active entities.
    ///
    /// # Arguments
    /// * `input` - Raw image bytes for the detector
    /// * `width` - Full frame width in pixels
    /// * `height` - Full frame height in pixels
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
    ) -> Result<&BTreeMap<EntityId, TrackedEntity>, D::Error> {
        let det_w = (width as f32 * self.inference_scale) as u32;
        let det_h = (height as f32 * self.inference_scale) as u32;
        let mut detections = self.detector.detect(input, det_w, det_h)?.into_detections();

        if self.inference_scale > 0.0 && self.inference_scale != 1.0 {
            let inv = 1.0 / self.inference_scale;
            detections = detections.iter().map(|d| d.scaled(inv)).collect();
        }
        Ok(self.tracker.process(detections, width, height))
    }

    /// Steering command toward the current target.
    pub fn steer(&self, frame_width: u32) -> SteeringCommand {
        self.steering
            .calculate(select_target(self.tracker.active()), frame_width)
    }

    /// Get a reference to the underlying detector.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// Get a mutable reference to the underlying detector.
    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    /// Get a reference to the underlying tracker.
    pub fn tracker(&self) -> &ObjectTracker {
        &self.tracker
    }

    /// Get a mutable reference to the underlying tracker.
    pub fn tracker_mut(&mut self) -> &mut ObjectTracker {
        &mut self.tracker
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{Detection, ManualClock, Rect, TrackerConfig};

    struct MockDetector {
        detections: Vec<Detection>,
        seen_size: Option<(u32, u32)>,
    }

    impl DetectionSource for MockDetector {
        type Output = Vec<Detection>;
        type Error = std::convert::Infallible;

        fn detect(
            &mut self,
            _input: &[u8],
            width: u32,
            height: u32,
        ) -> Result<Vec<Detection>, Self::Error> {
            self.seen_size = Some((width, height));
            Ok(self.detections.clone())
        }
    }

    fn pipeline(detections: Vec<Detection>) -> TrackerPipeline<MockDetector> {
        let tracker =
            ObjectTracker::with_clock(TrackerConfig::default(), ManualClock::default()).unwrap();
        TrackerPipeline::new(
            MockDetector {
                detections,
                seen_size: None,
            },
            tracker,
        )
    }

    #[test]
    fn test_tracker_pipeline() {
        let mut pipeline = pipeline(vec![Detection::new("cup", Rect::new(100, 100, 50, 50))]);

        let id = *pipeline.process_frame(&[], 640, 480).unwrap().keys().next().unwrap();
        let entities = pipeline.process_frame(&[], 640, 480).unwrap();
        assert_eq!(entities.len(), 1);
        assert!(entities[&id].active());
    }

    #[test]
    fn test_detections_rescaled_to_frame() {
        let mut pipeline = pipeline(vec![Detection::new("cup", Rect::new(400, 200, 80, 40))])
            .with_inference_scale(0.5);

        let entities = pipeline.process_frame(&[], 1920, 1080).unwrap();
        assert_eq!(entities[&1].bbox(), Rect::new(800, 400, 160, 80));
        assert_eq!(pipeline.detector().seen_size, Some((960, 540)));
    }

    /// Emits `(label, [x, y, w, h])` tuples, one box per frame moving right.
    struct TupleDetector {
        x: i32,
    }

    impl DetectionSource for TupleDetector {
        type Output = Vec<(&'static str, [i32; 4])>;
        type Error = std::convert::Infallible;

        fn detect(&mut self, _input: &[u8], _w: u32, _h: u32) -> Result<Self::Output, Self::Error> {
            self.x += 10;
            Ok(vec![("ball", [self.x, 200, 40, 40])])
        }
    }

    #[test]
    fn test_model_output_is_converted() {
        let tracker =
            ObjectTracker::with_clock(TrackerConfig::default(), ManualClock::default()).unwrap();
        let mut pipeline = TrackerPipeline::new(TupleDetector { x: 100 }, tracker);

        pipeline.process_frame(&[], 640, 480).unwrap();
        let entities = pipeline.process_frame(&[], 640, 480).unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[&1].label(), "ball");
        assert_eq!(entities[&1].bbox(), Rect::new(120, 200, 40, 40));
    }

    #[test]
    fn test_steer_follows_target() {
        let mut pipeline = pipeline(vec![Detection::new("cup", Rect::new(100, 100, 50, 50))]);
        pipeline.process_frame(&[], 640, 480).unwrap();
        let cmd = pipeline.steer(640);
        assert_eq!(cmd.target, Some(1));
        assert!(cmd.steering < 0.0);
    }
}

//! Contract between an inference backend and the tracker.

use crate::tracker::{Detection, Rect};

/// A detector that turns one camera frame into labelled boxes.
///
/// `Output` is whatever the model naturally produces, as long as it can be
/// converted with [`IntoDetections`]; the pipeline performs that conversion.
///
/// # Example
///
/// ```
/// use centroid_tracker::DetectionSource;
///
/// struct FixedDetector;
///
/// impl DetectionSource for FixedDetector {
///     type Output = Vec<(&'static str, [i32; 4])>;
///     type Error = std::convert::Infallible;
///
///     fn detect(&mut self, _input: &[u8], _w: u32, _h: u32) -> Result<Self::Output, Self::Error> {
///         Ok(vec![("cup", [100, 100, 50, 50])])
///     }
/// }
/// ```
pub trait DetectionSource {
    /// Raw model output for one frame.
    type Output: IntoDetections;

    /// Error type for detection failures.
    type Error;

    /// Run inference on raw image data.
    ///
    /// `width` and `height` are the size of the image the detector sees, which
    /// may be a downscaled copy of the camera frame. Boxes are expected in that
    /// image's coordinates.
    fn detect(&mut self, input: &[u8], width: u32, height: u32)
    -> Result<Self::Output, Self::Error>;
}

/// Conversion from a model-specific output into tracker detections.
pub trait IntoDetections {
    fn into_detections(self) -> Vec<Detection>;
}

impl IntoDetections for Vec<Detection> {
    fn into_detections(self) -> Vec<Detection> {
        self
    }
}

/// `(label, [x, y, w, h])` pairs.
impl<S: Into<String>> IntoDetections for Vec<(S, [i32; 4])> {
    fn into_detections(self) -> Vec<Detection> {
        self.into_iter()
            .map(|(label, tlwh)| Detection::new(label, tlwh.into()))
            .collect()
    }
}

impl<S: Into<String>> IntoDetections for Vec<(S, Rect)> {
    fn into_detections(self) -> Vec<Detection> {
        self.into_iter()
            .map(|(label, bbox)| Detection::new(label, bbox))
            .collect()
    }
}

impl<T: IntoDetections> IntoDetections for Option<T> {
    fn into_detections(self) -> Vec<Detection> {
        self.map(IntoDetections::into_detections).unwrap_or_default()
    }
}

//! Per-frame detection input.

use serde::{Deserialize, Serialize};

use crate::tracker::rect::Rect;

/// One detected object in the current frame.
///
/// Produced by an external detector; boxes are in the coordinate space of the
/// frame passed to [`ObjectTracker::process`](crate::ObjectTracker::process).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    /// Category name, e.g. `"cup"`.
    pub label: String,
    /// Bounding box in TLWH pixels
    #[serde(rename = "box")]
    pub bbox: Rect,
}

impl Detection {
    pub fn new(label: impl Into<String>, bbox: Rect) -> Self {
        Self {
            label: label.into(),
            bbox,
        }
    }

    /// Rescale the box by `factor`, keeping the label.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            label: self.label.clone(),
            bbox: self.bbox.scaled(factor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_json_shape() {
        let det: Detection =
            serde_json::from_str(r#"{"label": "cup", "box": [100, 100, 50, 50]}"#).unwrap();
        assert_eq!(det, Detection::new("cup", Rect::new(100, 100, 50, 50)));
    }
}

//! Builder for creating Detection objects from various box formats.

use crate::tracker::{Detection, Rect};

/// Builder for creating `Detection` objects from various input formats.
#[derive(Debug, Clone)]
pub struct DetectionBuilder {
    label: String,
    bbox: Rect,
    scale: f32,
}

impl Default for DetectionBuilder {
    fn default() -> Self {
        Self {
            label: String::new(),
            bbox: Rect::default(),
            scale: 1.0,
        }
    }
}

impl DetectionBuilder {
    /// Create a new detection builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the category label.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        self.bbox = Rect::from_tlbr(x1, y1, x2, y2);
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: i32, cy: i32, w: i32, h: i32) -> Self {
        self.bbox = Rect::from_xywh(cx, cy, w, h);
        self
    }

    /// Set bounding box in TLWH format (left, top, width, height).
    pub fn tlwh(mut self, x: i32, y: i32, w: i32, h: i32) -> Self {
        self.bbox = Rect::new(x, y, w, h);
        self
    }

    /// Multiply the box by `factor` on build, e.g. `1.0 / 0.8` for a
    /// detector that ran on a frame downscaled to 80%.
    pub fn scale(mut self, factor: f32) -> Self {
        self.scale = factor;
        self
    }

    /// Build the final `Detection`.
    pub fn build(self) -> Detection {
        let bbox = if self.scale == 1.0 {
            self.bbox
        } else {
            self.bbox.scaled(self.scale)
        };
        Detection::new(self.label, bbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_builder() {
        let det = DetectionBuilder::new()
            .label("cup")
            .tlbr(10, 20, 50, 80)
            .build();

        assert_eq!(det.label, "cup");
        assert_eq!(det.bbox, Rect::new(10, 20, 40, 60));
    }

    #[test]
    fn test_builder_scale() {
        let det = DetectionBuilder::new()
            .label("cup")
            .tlwh(80, 80, 40, 40)
            .scale(1.25)
            .build();
        assert_eq!(det.bbox, Rect::new(100, 100, 50, 50));
    }
}

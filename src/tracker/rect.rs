use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in integer pixel coordinates.
///
/// Supports three common bounding box formats:
/// - TLWH: Top-Left X, Top-Left Y, Width, Height
/// - TLBR: Top-Left X, Top-Left Y, Bottom-Right X, Bottom-Right Y
/// - XYWH: Center X, Center Y, Width, Height
///
/// Serialized as a `[x, y, w, h]` array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct Rect {
    /// Top-left x coordinate
    pub x: i32,
    /// Top-left y coordinate
    pub y: i32,
    /// Width of the bounding box
    pub width: i32,
    /// Height of the bounding box
    pub height: i32,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from TLBR format (top-left x, top-left y, bottom-right x, bottom-right y).
    #[inline]
    pub fn from_tlbr(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Create a Rect from XYWH format (center x, center y, width, height).
    #[inline]
    pub fn from_xywh(cx: i32, cy: i32, width: i32, height: i32) -> Self {
        Self {
            x: cx - width / 2,
            y: cy - height / 2,
            width,
            height,
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2). Corners past `i32::MAX` saturate.
    #[inline]
    pub fn to_tlbr(&self) -> [i32; 4] {
        [
            self.x,
            self.y,
            self.x.saturating_add(self.width),
            self.y.saturating_add(self.height),
        ]
    }

    /// Convert to TLWH format: (x, y, width, height).
    #[inline]
    pub fn to_tlwh(&self) -> [i32; 4] {
        [self.x, self.y, self.width, self.height]
    }

    /// Get the center point of the bounding box.
    #[inline]
    pub fn center(&self) -> Point2<f32> {
        Point2::new(
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }

    /// Get the area of the bounding box.
    #[inline]
    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    /// Multiply every coordinate by `factor`, truncating toward zero.
    ///
    /// Used to map boxes from a downscaled inference frame back to the full frame.
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            x: (self.x as f32 * factor) as i32,
            y: (self.y as f32 * factor) as i32,
            width: (self.width as f32 * factor) as i32,
            height: (self.height as f32 * factor) as i32,
        }
    }

    /// Whether the box touches or crosses the border band of width `margin`
    /// around a `frame_width` x `frame_height` frame.
    pub fn in_kill_zone(&self, margin: i32, frame_width: u32, frame_height: u32) -> bool {
        // i64 holds any i32 sum, so extreme boxes cannot overflow
        let (x1, y1) = (self.x as i64, self.y as i64);
        let x2 = x1 + self.width as i64;
        let y2 = y1 + self.height as i64;
        let margin = margin as i64;
        x1 < margin
            || y1 < margin
            || x2 > frame_width as i64 - margin
            || y2 > frame_height as i64 - margin
    }
}

impl From<[i32; 4]> for Rect {
    fn from(tlwh: [i32; 4]) -> Self {
        Self::new(tlwh[0], tlwh[1], tlwh[2], tlwh[3])
    }
}

impl From<Rect> for [i32; 4] {
    fn from(rect: Rect) -> Self {
        rect.to_tlwh()
    }
}

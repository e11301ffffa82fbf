use chrono::{DateTime, Utc};
use opencv::core::Mat;
use serde::Serialize;

/// Minimum contour area (in pixels) for a region to count as a detection.
/// Fixed policy constant to suppress pixel noise; comparison is strict `>`.
pub const MIN_DETECTION_AREA: f64 = 500.0;

/// A single BGR frame captured from the source.
///
/// Immutable once handed off; annotation works on a deep copy of `mat`.
pub struct Frame {
    pub id: u64,
    pub stamp: DateTime<Utc>,
    pub mat: Mat,
}

impl Frame {
    pub fn new(id: u64, mat: Mat) -> Self {
        Self {
            id,
            stamp: Utc::now(),
            mat,
        }
    }
}

/// Axis-aligned bounding rectangle of a detected region, in pixel coords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl From<opencv::core::Rect> for BoundingBox {
    fn from(r: opencv::core::Rect) -> Self {
        Self {
            x: r.x,
            y: r.y,
            width: r.width,
            height: r.height,
        }
    }
}

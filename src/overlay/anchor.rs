//! Coordinate types for annotation anchors.
//!
//! A [`LogicalPoint`] lives in chart data space (time x price) and is the only
//! durable representation of an anchor position. A [`PixelPoint`] is derived
//! from it for the current viewport and is invalidated by every pan, zoom, or
//! resize. [`Anchor`] pairs the two: the logical point is the source of truth,
//! the pixel point is a read-through cache.

use serde::{Deserialize, Serialize};

/// A point in chart data space, independent of the current viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicalPoint {
    /// Unix timestamp (seconds).
    pub time: i64,
    pub price: f64,
}

impl LogicalPoint {
    pub fn new(time: i64, price: f64) -> Self {
        Self { time, price }
    }
}

/// A screen-space location on the drawing surface, valid only for the
/// viewport state it was computed under.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Scale into device-pixel (bitmap) space.
    pub fn scaled(self, ratio: f64) -> Self {
        Self {
            x: self.x * ratio,
            y: self.y * ratio,
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// OHLC field an anchor price is pinned to when snapping was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapField {
    Open,
    High,
    Low,
    Close,
}

/// One endpoint of an annotation.
#[derive(Debug, Clone, Copy)]
pub struct Anchor {
    /// Source of truth. Never discarded while the annotation exists.
    pub logical: LogicalPoint,
    /// Cached pixel position, re-derived from `logical` on reconciliation.
    pub pixel: PixelPoint,
    /// Set when the price was snapped to a specific OHLC field.
    pub snap: Option<SnapField>,
}

impl Anchor {
    pub fn new(logical: LogicalPoint, pixel: PixelPoint, snap: Option<SnapField>) -> Self {
        Self {
            logical,
            pixel,
            snap,
        }
    }
}

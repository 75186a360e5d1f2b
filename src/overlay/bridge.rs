//! Viewport bridge: the narrow capability the overlay core needs from the
//! host chart surface.
//!
//! The bridge maps logical (time, price) coordinates to surface pixels and
//! back. No transform is ever cached here: pan and zoom can happen between
//! any two calls, so every call must re-read current viewport state. A
//! conversion returns `None` whenever the value falls outside what the
//! viewport can currently resolve.
//!
//! Viewport change notifications are delivered as Bevy messages written by
//! the host surface; the message types live here so the core does not
//! depend on the concrete chart implementation.

use bevy::prelude::Message;

use super::anchor::{LogicalPoint, PixelPoint};

/// Read-only coordinate transforms supplied by the host chart surface.
pub trait ViewportBridge {
    fn time_to_x(&self, time: i64) -> Option<f64>;
    fn x_to_time(&self, x: f64) -> Option<i64>;
    fn price_to_y(&self, price: f64) -> Option<f64>;
    fn y_to_price(&self, y: f64) -> Option<f64>;

    /// Drawing surface size in logical (CSS) pixels.
    fn surface_size(&self) -> (f64, f64);

    /// Ratio of device pixels to logical pixels.
    fn device_pixel_ratio(&self) -> f64;

    /// Convert a logical point to surface pixels, `None` if either axis is
    /// outside the renderable viewport.
    fn to_pixel(&self, point: LogicalPoint) -> Option<PixelPoint> {
        let x = self.time_to_x(point.time)?;
        let y = self.price_to_y(point.price)?;
        Some(PixelPoint::new(x, y))
    }

    /// Convert a surface pixel back to a logical point, `None` if the pixel
    /// is outside the plotted range on either axis.
    fn to_logical(&self, point: PixelPoint) -> Option<LogicalPoint> {
        let time = self.x_to_time(point.x)?;
        let price = self.y_to_price(point.y)?;
        Some(LogicalPoint::new(time, price))
    }
}

/// Visible time range changed (direct result of a pan/zoom gesture).
#[derive(Message)]
pub struct VisibleRangeChanged;

/// Visible logical (bar-index) range changed.
#[derive(Message)]
pub struct VisibleLogicalRangeChanged;

/// The crosshair (pointer) moved over the surface. Ambient trigger.
#[derive(Message)]
pub struct CrosshairMoved {
    /// Pointer position in CSS pixels, `None` when the pointer left the
    /// surface.
    pub position: Option<PixelPoint>,
}

/// The underlying series data changed (e.g. a live tick). Ambient trigger.
#[derive(Message)]
pub struct SeriesDataChanged;

/// The drawing surface was resized.
#[derive(Message)]
pub struct SurfaceResized {
    pub width: f64,
    pub height: f64,
}

/// Fired whenever the set of finished annotations changes.
#[derive(Message)]
pub struct AnnotationsChanged {
    pub revision: u64,
}

//! The concrete chart viewport: visible ranges plus the linear time/price
//! to pixel mappings. Implements the overlay's [`ViewportBridge`]
//! capability.
//!
//! Nothing here caches a transform — conversions read the current ranges on
//! every call.

use bevy::prelude::*;

use crate::constants::{DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};
use crate::overlay::{PixelPoint, ViewportBridge};

use super::data::ChartData;

#[derive(Resource)]
pub struct ChartViewport {
    /// Visible time range in seconds; fractional bounds keep panning smooth.
    pub time_range: (f64, f64),
    /// Visible price range, min to max.
    pub price_range: (f64, f64),
    /// Surface size in logical (CSS) pixels.
    pub surface: (f64, f64),
    /// Device pixel ratio reported by the window.
    pub scale_factor: f64,
    /// Candle interval, for the logical (bar-index) range.
    pub interval: i64,
    /// Time of the first bar, origin of the logical index axis.
    pub epoch: i64,
    /// Last pointer position over the surface, CSS pixels.
    pub crosshair: Option<PixelPoint>,
}

impl ChartViewport {
    /// Fit the whole series with a small price margin.
    pub fn fit(data: &ChartData) -> Self {
        let (t0, t1) = data.time_bounds().unwrap_or((0, 1));
        let (p0, p1) = data.price_bounds().unwrap_or((0.0, 1.0));
        let margin = (p1 - p0) * 0.08;
        Self {
            time_range: (t0 as f64, (t1 + data.interval) as f64),
            price_range: (p0 - margin, p1 + margin),
            surface: (DEFAULT_WINDOW_WIDTH as f64, DEFAULT_WINDOW_HEIGHT as f64),
            scale_factor: 1.0,
            interval: data.interval,
            epoch: t0,
            crosshair: None,
        }
    }

    /// Visible range expressed in bar indices.
    pub fn logical_range(&self) -> (f64, f64) {
        let interval = self.interval as f64;
        (
            (self.time_range.0 - self.epoch as f64) / interval,
            (self.time_range.1 - self.epoch as f64) / interval,
        )
    }

    /// Shift the visible ranges by a pixel delta (drag gesture).
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let (t0, t1) = self.time_range;
        let time_per_px = (t1 - t0) / self.surface.0;
        self.time_range = (t0 - dx * time_per_px, t1 - dx * time_per_px);

        let (p0, p1) = self.price_range;
        let price_per_px = (p1 - p0) / self.surface.1;
        // Dragging down moves the window up the price axis.
        self.price_range = (p0 + dy * price_per_px, p1 + dy * price_per_px);
    }

    /// Scale the time span by `factor`, keeping the time under `anchor_x`
    /// fixed on screen.
    pub fn zoom_at(&mut self, anchor_x: f64, factor: f64) {
        let (t0, t1) = self.time_range;
        let span = t1 - t0;
        let pivot = t0 + anchor_x / self.surface.0 * span;
        let new_span = (span * factor).max(self.interval as f64 * 2.0);
        let ratio = anchor_x / self.surface.0;
        self.time_range = (pivot - new_span * ratio, pivot + new_span * (1.0 - ratio));
    }
}

impl ViewportBridge for ChartViewport {
    fn time_to_x(&self, time: i64) -> Option<f64> {
        let (t0, t1) = self.time_range;
        let t = time as f64;
        if t < t0 || t > t1 {
            return None;
        }
        Some((t - t0) / (t1 - t0) * self.surface.0)
    }

    fn x_to_time(&self, x: f64) -> Option<i64> {
        if x < 0.0 || x > self.surface.0 {
            return None;
        }
        let (t0, t1) = self.time_range;
        Some((t0 + x / self.surface.0 * (t1 - t0)).round() as i64)
    }

    fn price_to_y(&self, price: f64) -> Option<f64> {
        let (p0, p1) = self.price_range;
        if price < p0 || price > p1 {
            return None;
        }
        Some((p1 - price) / (p1 - p0) * self.surface.1)
    }

    fn y_to_price(&self, y: f64) -> Option<f64> {
        if y < 0.0 || y > self.surface.1 {
            return None;
        }
        let (p0, p1) = self.price_range;
        Some(p1 - y / self.surface.1 * (p1 - p0))
    }

    fn surface_size(&self) -> (f64, f64) {
        self.surface
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.scale_factor
    }
}

#[cfg(test)]
mod tests {
    use crate::overlay::LogicalPoint;

    use super::*;

    fn viewport() -> ChartViewport {
        let data = ChartData::generate(100, 60, 7);
        let mut vp = ChartViewport::fit(&data);
        vp.surface = (800.0, 600.0);
        vp
    }

    #[test]
    fn test_round_trip_through_real_viewport() {
        let vp = viewport();
        let (t0, t1) = vp.time_range;
        let mid_time = ((t0 + t1) / 2.0) as i64;
        let mid_price = (vp.price_range.0 + vp.price_range.1) / 2.0;

        let pixel = vp.to_pixel(LogicalPoint::new(mid_time, mid_price)).unwrap();
        let back = vp.to_logical(pixel).unwrap();
        assert_eq!(back.time, mid_time);
        assert!((back.price - mid_price).abs() < 1e-9);
    }

    #[test]
    fn test_offscreen_time_unresolvable() {
        let vp = viewport();
        assert!(vp.time_to_x(vp.time_range.1 as i64 + 10_000).is_none());
        assert!(vp.time_to_x(vp.time_range.0 as i64 - 10_000).is_none());
    }

    #[test]
    fn test_pan_keeps_span() {
        let mut vp = viewport();
        let span = vp.time_range.1 - vp.time_range.0;
        vp.pan_by(120.0, -40.0);
        assert!(((vp.time_range.1 - vp.time_range.0) - span).abs() < 1e-6);
        // Dragging content right shows earlier times.
        assert!(vp.time_range.0 < span + vp.epoch as f64);
    }

    #[test]
    fn test_zoom_keeps_anchor_fixed() {
        let mut vp = viewport();
        let anchor_x = 200.0;
        let before = vp.x_to_time(anchor_x).unwrap();
        vp.zoom_at(anchor_x, 0.5);
        let after = vp.x_to_time(anchor_x).unwrap();
        // Within a second of rounding error.
        assert!((before - after).abs() <= 1);
    }

    #[test]
    fn test_logical_range_matches_bars() {
        let vp = viewport();
        let (l0, l1) = vp.logical_range();
        assert!((l0 - 0.0).abs() < 1e-9);
        // 100 bars plus the trailing interval added by fit().
        assert!((l1 - 101.0).abs() < 1e-6);
    }
}

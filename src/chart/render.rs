//! Candle and crosshair rendering for the chart surface (default gizmos,
//! under the annotation overlay).

use bevy::prelude::*;

use crate::overlay::fill::surface_to_world;
use crate::overlay::render::dash_segments;
use crate::overlay::{PixelPoint, ViewportBridge};

use super::data::ChartData;
use super::viewport::ChartViewport;

const BULL: Color = Color::srgb(0.30, 0.69, 0.31);
const BEAR: Color = Color::srgb(0.94, 0.33, 0.31);
const CROSSHAIR: Color = Color::srgba(0.6, 0.6, 0.6, 0.6);

pub fn draw_candles(mut gizmos: Gizmos, data: Res<ChartData>, viewport: Res<ChartViewport>) {
    let surface = viewport.surface;
    let span = viewport.time_range.1 - viewport.time_range.0;
    let bar_width = (surface.0 / (span / viewport.interval as f64)).max(1.0) * 0.35;

    for candle in data.candles() {
        let Some(x) = viewport.time_to_x(candle.time) else {
            continue;
        };
        let color = if candle.is_bullish() { BULL } else { BEAR };

        // Clamp wick/body prices into the visible range so a candle only
        // partially in view still draws.
        let (p0, p1) = viewport.price_range;
        let y = |price: f64| -> Option<f64> { viewport.price_to_y(price.clamp(p0, p1)) };

        if let (Some(top), Some(bottom)) = (y(candle.high), y(candle.low)) {
            gizmos.line_2d(
                surface_to_world(x, top, surface),
                surface_to_world(x, bottom, surface),
                color,
            );
        }
        if let (Some(open_y), Some(close_y)) = (y(candle.open), y(candle.close)) {
            let (top, bottom) = (open_y.min(close_y), open_y.max(close_y));
            let corners = [
                (x - bar_width, top),
                (x + bar_width, top),
                (x + bar_width, bottom),
                (x - bar_width, bottom),
            ];
            for i in 0..4 {
                let (ax, ay) = corners[i];
                let (bx, by) = corners[(i + 1) % 4];
                gizmos.line_2d(
                    surface_to_world(ax, ay, surface),
                    surface_to_world(bx, by, surface),
                    color,
                );
            }
        }
    }
}

pub fn draw_crosshair(mut gizmos: Gizmos, viewport: Res<ChartViewport>) {
    let Some(position) = viewport.crosshair else {
        return;
    };
    let (width, height) = viewport.surface;

    let horizontal = dash_segments(
        PixelPoint::new(0.0, position.y),
        PixelPoint::new(width, position.y),
        4.0,
        4.0,
    );
    let vertical = dash_segments(
        PixelPoint::new(position.x, 0.0),
        PixelPoint::new(position.x, height),
        4.0,
        4.0,
    );
    for (a, b) in horizontal.into_iter().chain(vertical) {
        gizmos.line_2d(
            surface_to_world(a.x, a.y, (width, height)),
            surface_to_world(b.x, b.y, (width, height)),
            CROSSHAIR,
        );
    }
}

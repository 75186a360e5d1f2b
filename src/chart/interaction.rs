//! Pan, zoom, crosshair, and resize handling for the chart surface.
//!
//! Every gesture mutates the viewport ranges and emits the matching
//! overlay notification so annotation reconciliation can track it.

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::window::{CursorMoved, PrimaryWindow, WindowResized};
use bevy_egui::EguiContexts;

use crate::overlay::{
    CrosshairMoved, PixelPoint, SurfaceResized, VisibleLogicalRangeChanged, VisibleRangeChanged,
};
use crate::ui::is_cursor_over_ui;

use super::viewport::ChartViewport;

/// Middle-button drag pans both axes.
pub fn pan(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut viewport: ResMut<ChartViewport>,
    mut range: MessageWriter<VisibleRangeChanged>,
    mut logical: MessageWriter<VisibleLogicalRangeChanged>,
) {
    if !mouse_button.pressed(MouseButton::Middle) {
        mouse_motion.clear();
        return;
    }

    let mut delta = Vec2::ZERO;
    for event in mouse_motion.read() {
        delta += event.delta;
    }
    if delta == Vec2::ZERO {
        return;
    }

    viewport.pan_by(delta.x as f64, delta.y as f64);
    range.write(VisibleRangeChanged);
    logical.write(VisibleLogicalRangeChanged);
}

/// Wheel zoom on the time axis, anchored at the cursor.
pub fn zoom(
    mut scroll_events: MessageReader<MouseWheel>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    mut viewport: ResMut<ChartViewport>,
    mut contexts: EguiContexts,
    mut range: MessageWriter<VisibleRangeChanged>,
    mut logical: MessageWriter<VisibleLogicalRangeChanged>,
) {
    let mut scroll = 0.0;
    for event in scroll_events.read() {
        scroll += match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y * 0.01,
        };
    }
    if scroll == 0.0 || is_cursor_over_ui(&mut contexts) {
        return;
    }

    let Ok(window) = window_query.single() else {
        return;
    };
    let anchor_x = window
        .cursor_position()
        .map(|p| p.x as f64)
        .unwrap_or(viewport.surface.0 / 2.0);

    let factor = (1.0 - scroll as f64 * 0.1).clamp(0.5, 2.0);
    viewport.zoom_at(anchor_x, factor);
    range.write(VisibleRangeChanged);
    logical.write(VisibleLogicalRangeChanged);
}

/// Track the pointer as the crosshair and notify the overlay (ambient
/// trigger).
pub fn crosshair(
    mut cursor_events: MessageReader<CursorMoved>,
    mut viewport: ResMut<ChartViewport>,
    mut moved: MessageWriter<CrosshairMoved>,
) {
    for event in cursor_events.read() {
        let position = PixelPoint::new(event.position.x as f64, event.position.y as f64);
        viewport.crosshair = Some(position);
        moved.write(CrosshairMoved {
            position: Some(position),
        });
    }
}

/// Keep surface size and device pixel ratio in sync with the window.
pub fn sync_surface(
    mut resize_events: MessageReader<WindowResized>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    mut viewport: ResMut<ChartViewport>,
    mut resized: MessageWriter<SurfaceResized>,
) {
    let Ok(window) = window_query.single() else {
        return;
    };
    viewport.scale_factor = window.scale_factor() as f64;

    let mut changed = false;
    for event in resize_events.read() {
        viewport.surface = (event.width as f64, event.height as f64);
        changed = true;
    }
    if changed {
        resized.write(SurfaceResized {
            width: viewport.surface.0,
            height: viewport.surface.1,
        });
    }
}

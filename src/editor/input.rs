//! Pointer input routed into the annotation registry: drawing, selecting,
//! and erasing, depending on the current tool.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;

use crate::chart::{ChartData, ChartViewport};
use crate::constants::{HIT_TOLERANCE_CSS_PX, SNAP_THRESHOLD_PX};
use crate::overlay::{
    AnnotationRegistry, PixelPoint, SelectedAnnotation, SnapField, SnapTarget, StyleProvider,
    ViewportBridge,
};
use crate::ui::is_cursor_over_ui;

use super::tools::{CurrentTool, EditorTool};

/// Pointer position in surface (CSS) pixels, if over the window.
fn cursor_pixel(window: &Window) -> Option<PixelPoint> {
    window
        .cursor_position()
        .map(|p| PixelPoint::new(p.x as f64, p.y as f64))
}

/// Find the OHLC value of the nearest candle whose screen position is
/// within the snap threshold of the pointer.
pub fn resolve_snap(
    viewport: &ChartViewport,
    data: &ChartData,
    pixel: PixelPoint,
) -> Option<SnapTarget> {
    let time = viewport.x_to_time(pixel.x)?;
    let candle = data.nearest_candle(time)?;

    let mut best: Option<(SnapTarget, f64)> = None;
    for field in [
        SnapField::Open,
        SnapField::High,
        SnapField::Low,
        SnapField::Close,
    ] {
        let price = candle.field(field);
        let Some(y) = viewport.price_to_y(price) else {
            continue;
        };
        let distance = (y - pixel.y).abs();
        if distance <= SNAP_THRESHOLD_PX && best.is_none_or(|(_, d)| distance < d) {
            best = Some((SnapTarget { price, field }, distance));
        }
    }
    best.map(|(target, _)| target)
}

pub fn handle_draw(
    mouse_button: Res<ButtonInput<MouseButton>>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    current_tool: Res<CurrentTool>,
    styles: Res<StyleProvider>,
    viewport: Res<ChartViewport>,
    data: Res<ChartData>,
    mut registry: ResMut<AnnotationRegistry>,
    mut contexts: EguiContexts,
) {
    let Some(kind) = current_tool.tool.draw_kind() else {
        return;
    };
    let Ok(window) = window_query.single() else {
        return;
    };

    if mouse_button.just_pressed(MouseButton::Right) {
        registry.cancel();
        return;
    }

    let Some(pixel) = cursor_pixel(window) else {
        return;
    };

    if mouse_button.just_pressed(MouseButton::Left) {
        if is_cursor_over_ui(&mut contexts) {
            return;
        }
        let style = styles.default_for(kind);
        let snap = style
            .snap
            .then(|| resolve_snap(&viewport, &data, pixel))
            .flatten();
        if registry.begin(kind, style) {
            registry.set_start(&*viewport, pixel, snap);
        }
        return;
    }

    let Some(snap_enabled) = registry.draft().map(|draft| draft.style().snap) else {
        return;
    };
    let snap = snap_enabled
        .then(|| resolve_snap(&viewport, &data, pixel))
        .flatten();

    if mouse_button.just_released(MouseButton::Left) {
        registry.finish(&*viewport, pixel, snap);
    } else if mouse_button.pressed(MouseButton::Left) {
        registry.move_preview(&*viewport, pixel, snap);
    }
}

pub fn handle_select(
    mouse_button: Res<ButtonInput<MouseButton>>,
    keyboard: Res<ButtonInput<KeyCode>>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    current_tool: Res<CurrentTool>,
    viewport: Res<ChartViewport>,
    mut registry: ResMut<AnnotationRegistry>,
    mut selection: ResMut<SelectedAnnotation>,
    mut contexts: EguiContexts,
) {
    if current_tool.tool != EditorTool::Select {
        return;
    }

    if let Some(index) = selection.0
        && (keyboard.just_pressed(KeyCode::Delete) || keyboard.just_pressed(KeyCode::Backspace))
        && let Ok(ctx) = contexts.ctx_mut()
        && !ctx.wants_keyboard_input()
    {
        registry.remove_at(index);
        selection.0 = None;
        return;
    }

    if !mouse_button.just_pressed(MouseButton::Left) || is_cursor_over_ui(&mut contexts) {
        return;
    }
    let Some(pixel) = window_query.single().ok().and_then(cursor_pixel) else {
        return;
    };

    selection.0 = registry.hit_test(&*viewport, pixel.x, pixel.y, HIT_TOLERANCE_CSS_PX);
}

pub fn handle_erase(
    mouse_button: Res<ButtonInput<MouseButton>>,
    window_query: Query<&Window, With<PrimaryWindow>>,
    current_tool: Res<CurrentTool>,
    viewport: Res<ChartViewport>,
    mut registry: ResMut<AnnotationRegistry>,
    mut selection: ResMut<SelectedAnnotation>,
    mut contexts: EguiContexts,
) {
    if current_tool.tool != EditorTool::Eraser
        || !mouse_button.just_pressed(MouseButton::Left)
        || is_cursor_over_ui(&mut contexts)
    {
        return;
    }
    let Some(pixel) = window_query.single().ok().and_then(cursor_pixel) else {
        return;
    };

    if let Some(index) = registry.hit_test(&*viewport, pixel.x, pixel.y, HIT_TOLERANCE_CSS_PX) {
        registry.remove_at(index);
        selection.0 = None;
    }
}

//! Bevy systems wiring the overlay core into the frame loop.
//!
//! Generic over the concrete viewport resource `B` so the overlay depends
//! only on the [`ViewportBridge`] capability, not on the host chart's types.

use bevy::prelude::*;

use super::bridge::{
    AnnotationsChanged, CrosshairMoved, SeriesDataChanged, SurfaceResized, ViewportBridge,
    VisibleLogicalRangeChanged, VisibleRangeChanged,
};
use super::fill::RectFillIndex;
use super::gizmo::AnnotationGizmoGroup;
use super::reconcile::{ReconcileMode, Reconciler};
use super::registry::{AnnotationRegistry, SelectedAnnotation};
use super::render::{produce_draw_commands, DrawCommand, SurfaceInfo};
use super::style::Rgba;

/// Map viewport notifications onto reconciliation modes: pan/zoom and
/// resize track rigidly, ambient triggers ease.
pub fn collect_viewport_events(
    mut reconciler: ResMut<Reconciler>,
    mut range: MessageReader<VisibleRangeChanged>,
    mut logical_range: MessageReader<VisibleLogicalRangeChanged>,
    mut resized: MessageReader<SurfaceResized>,
    mut crosshair: MessageReader<CrosshairMoved>,
    mut data: MessageReader<SeriesDataChanged>,
) {
    if range.read().next().is_some()
        || logical_range.read().next().is_some()
        || resized.read().next().is_some()
    {
        reconciler.request(ReconcileMode::Immediate);
    }
    if crosshair.read().next().is_some() || data.read().next().is_some() {
        reconciler.request(ReconcileMode::Eased);
    }
}

/// One reconciliation frame.
pub fn run_reconciler<B: ViewportBridge + Resource>(
    mut reconciler: ResMut<Reconciler>,
    mut registry: ResMut<AnnotationRegistry>,
    bridge: Res<B>,
) {
    reconciler.tick(&mut registry, &*bridge);
}

/// Detach engine and rendering state for annotations removed this frame.
/// Runs in the same frame as the removal.
pub fn sync_removed(
    mut commands: Commands,
    mut registry: ResMut<AnnotationRegistry>,
    mut reconciler: ResMut<Reconciler>,
    mut fills: ResMut<RectFillIndex>,
) {
    for id in registry.take_removed() {
        reconciler.detach(id);
        fills.detach(&mut commands, id);
    }
}

/// Turn registry revision bumps into change messages for external listeners.
pub fn emit_changes(
    registry: Res<AnnotationRegistry>,
    mut last_seen: Local<u64>,
    mut writer: MessageWriter<AnnotationsChanged>,
) {
    let revision = registry.revision();
    if revision != *last_seen {
        *last_seen = revision;
        writer.write(AnnotationsChanged { revision });
    }
}

/// Drop a selection that no longer addresses an annotation.
pub fn clamp_selection(
    registry: Res<AnnotationRegistry>,
    mut selected: ResMut<SelectedAnnotation>,
) {
    if let Some(index) = selected.0
        && index >= registry.annotations().len()
    {
        selected.0 = None;
    }
}

fn bitmap_to_vec2(point: super::anchor::PixelPoint, surface: &SurfaceInfo) -> Vec2 {
    let ratio = surface.device_pixel_ratio;
    super::fill::surface_to_world(point.x / ratio, point.y / ratio, (surface.width, surface.height))
}

fn to_color(color: Rgba) -> Color {
    Color::srgba(color.r, color.g, color.b, color.a)
}

fn execute_strokes(
    gizmos: &mut Gizmos<AnnotationGizmoGroup>,
    commands: &[DrawCommand],
    surface: &SurfaceInfo,
) {
    for command in commands {
        match command {
            DrawCommand::Stroke {
                segments, color, ..
            } => {
                for (a, b) in segments {
                    gizmos.line_2d(
                        bitmap_to_vec2(*a, surface),
                        bitmap_to_vec2(*b, surface),
                        to_color(*color),
                    );
                }
            }
            DrawCommand::Marker {
                center,
                radius,
                color,
            } => {
                gizmos.circle_2d(
                    bitmap_to_vec2(*center, surface),
                    (*radius / surface.device_pixel_ratio) as f32,
                    to_color(*color),
                );
            }
            // Fills are sprite entities, not gizmos.
            DrawCommand::FillRect { .. } => {}
        }
    }
}

/// Draw every finished annotation, the live draft preview, and the
/// selection highlight.
pub fn draw_overlay<B: ViewportBridge + Resource>(
    mut gizmos: Gizmos<AnnotationGizmoGroup>,
    registry: Res<AnnotationRegistry>,
    selected: Res<SelectedAnnotation>,
    bridge: Res<B>,
) {
    let (width, height) = bridge.surface_size();
    let surface = SurfaceInfo {
        width,
        height,
        device_pixel_ratio: bridge.device_pixel_ratio(),
    };

    for annotation in registry.annotations() {
        let commands = produce_draw_commands(
            annotation.kind,
            annotation.start.pixel,
            annotation.end.pixel,
            &annotation.style,
            surface,
        );
        execute_strokes(&mut gizmos, &commands, &surface);
    }

    if let Some(draft) = registry.draft() {
        // Preview with halved opacity, like the final shape but visibly
        // not committed yet.
        let mut style = *draft.style();
        style.color = style.color.with_alpha(style.color.a * 0.5);
        // The preview fill is a sprite owned by the fill sync, not a gizmo.
        style.fill = None;
        let commands = produce_draw_commands(
            draft.kind(),
            draft.start_anchor().pixel,
            draft.end_anchor().pixel,
            &style,
            surface,
        );
        execute_strokes(&mut gizmos, &commands, &surface);
    }

    if let Some(annotation) = selected.0.and_then(|i| registry.annotations().get(i)) {
        let ratio = surface.device_pixel_ratio;
        for anchor in [&annotation.start, &annotation.end] {
            gizmos.circle_2d(
                bitmap_to_vec2(anchor.pixel.scaled(ratio), &surface),
                6.0,
                Color::WHITE,
            );
        }
    }
}

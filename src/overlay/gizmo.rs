//! Custom gizmo group for the annotation overlay.

use bevy::gizmos::config::{GizmoConfigGroup, GizmoConfigStore};
use bevy::prelude::*;

/// Gizmo group for annotation strokes and markers, configured separately
/// from any default gizmos the host may draw.
#[derive(Default, Reflect, GizmoConfigGroup)]
pub struct AnnotationGizmoGroup;

pub fn configure_annotation_gizmos(mut config_store: ResMut<GizmoConfigStore>) {
    let (config, _) = config_store.config_mut::<AnnotationGizmoGroup>();
    // Gizmo line width is per-group, not per-line: every stroke renders at
    // this width regardless of its style's stroke_width.
    config.line.width = 2.0;
}

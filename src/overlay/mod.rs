//! Annotation overlay engine for a time-series chart.
//!
//! Annotations (line segments, rectangles) are anchored in logical chart
//! space (time x price) and stay pinned to their anchors while the chart is
//! panned, zoomed, and resized. The engine is split into plain-Rust core
//! modules and a thin Bevy glue layer, and reaches the host chart only
//! through the [`ViewportBridge`] capability.
//!
//! ## Module Structure
//!
//! - [`anchor`] - Logical/pixel coordinate types and [`Anchor`]
//! - [`bridge`] - The viewport capability trait and notification messages
//! - [`geometry`] - Pure distance primitives for hit testing
//! - [`style`] - Style records, patches, presets, [`StyleProvider`]
//! - [`annotation`] - The persisted annotation entity
//! - [`draft`] - Draw-tool state machine for the in-progress annotation
//! - [`reconcile`] - Immediate/eased pixel-cache reconciliation
//! - [`registry`] - Collection owner, hit-test dispatch, change revisions
//! - [`render`] - Pure draw-command production
//! - [`gizmo`], [`fill`], [`systems`] - Bevy glue (gizmo strokes, sprite
//!   fills, frame wiring)

pub mod anchor;
pub mod annotation;
pub mod bridge;
pub mod draft;
pub mod fill;
pub mod geometry;
pub mod gizmo;
pub mod reconcile;
pub mod registry;
pub mod render;
pub mod style;
pub mod systems;

pub use anchor::{Anchor, LogicalPoint, PixelPoint, SnapField};
pub use annotation::{Annotation, AnnotationId, AnnotationKind};
pub use bridge::{
    AnnotationsChanged, CrosshairMoved, SeriesDataChanged, SurfaceResized, ViewportBridge,
    VisibleLogicalRangeChanged, VisibleRangeChanged,
};
pub use draft::{Draft, DraftPhase, SnapTarget};
pub use gizmo::AnnotationGizmoGroup;
pub use registry::{AnnotationRegistry, SelectedAnnotation};
pub use style::{Rgba, StrokePattern, StylePatch, StyleProvider, ToolStyle};

use std::marker::PhantomData;

use bevy::prelude::*;

use reconcile::Reconciler;

/// Overlay engine plugin, parameterized by the host viewport resource.
pub struct OverlayPlugin<B> {
    _bridge: PhantomData<fn() -> B>,
}

impl<B> Default for OverlayPlugin<B> {
    fn default() -> Self {
        Self {
            _bridge: PhantomData,
        }
    }
}

impl<B: ViewportBridge + Resource> Plugin for OverlayPlugin<B> {
    fn build(&self, app: &mut App) {
        app.init_resource::<AnnotationRegistry>()
            .init_resource::<Reconciler>()
            .init_resource::<SelectedAnnotation>()
            .init_resource::<fill::RectFillIndex>()
            .add_message::<VisibleRangeChanged>()
            .add_message::<VisibleLogicalRangeChanged>()
            .add_message::<CrosshairMoved>()
            .add_message::<SeriesDataChanged>()
            .add_message::<SurfaceResized>()
            .add_message::<AnnotationsChanged>()
            .init_gizmo_group::<AnnotationGizmoGroup>()
            .add_systems(Startup, gizmo::configure_annotation_gizmos)
            .add_systems(
                Update,
                (
                    systems::collect_viewport_events,
                    systems::run_reconciler::<B>,
                    systems::sync_removed,
                    systems::emit_changes,
                    systems::clamp_selection,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (systems::draw_overlay::<B>, fill::sync_rect_fills::<B>)
                    .after(systems::run_reconciler::<B>),
            );
    }
}

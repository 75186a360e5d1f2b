//! Draw-tool state machine for the single in-progress annotation.
//!
//! The life of a draft is `Idle -> Started -> Dragging -> Finished`, with
//! cancellation reachable from `Started` and `Dragging`. `Idle` is the
//! absence of a [`Draft`]; finishing consumes the draft and either yields an
//! [`Annotation`] or rejects a degenerate one. Each transition is a method
//! with explicit preconditions instead of ad hoc boolean flags.

use bevy::log::debug;

use super::anchor::{Anchor, LogicalPoint, PixelPoint, SnapField};
use super::annotation::{Annotation, AnnotationId, AnnotationKind};
use super::bridge::ViewportBridge;
use super::style::ToolStyle;

/// A snapped price resolved by the caller (nearest OHLC field of the candle
/// under the pointer). Snapping is a host-side concern; the draft only
/// records the outcome.
#[derive(Debug, Clone, Copy)]
pub struct SnapTarget {
    pub price: f64,
    pub field: SnapField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftPhase {
    /// First anchor placed, pointer not yet moved.
    Started,
    /// End anchor tracking the pointer.
    Dragging,
}

/// An annotation being actively drawn. At most one exists at a time,
/// enforced by the registry's draft slot.
#[derive(Debug, Clone)]
pub struct Draft {
    kind: AnnotationKind,
    style: ToolStyle,
    start: Anchor,
    end: Anchor,
    phase: DraftPhase,
}

/// Resolve a pointer position to an anchor: pixel -> logical via the bridge,
/// snap override on the price axis, then pixel re-derived from the stored
/// logical value so the cache is exact.
fn resolve_anchor(
    bridge: &impl ViewportBridge,
    pixel: PixelPoint,
    snap: Option<SnapTarget>,
) -> Option<Anchor> {
    let mut logical = bridge.to_logical(pixel)?;
    let mut field = None;
    if let Some(target) = snap {
        logical.price = target.price;
        field = Some(target.field);
    }
    let cached = bridge.to_pixel(logical)?;
    Some(Anchor::new(logical, cached, field))
}

impl Draft {
    /// `Idle -> Started`. Returns `None` when the pixel is unaddressable
    /// (outside the plotted range) — no tool is created in that case.
    pub fn start(
        bridge: &impl ViewportBridge,
        kind: AnnotationKind,
        style: ToolStyle,
        pixel: PixelPoint,
        snap: Option<SnapTarget>,
    ) -> Option<Self> {
        let anchor = resolve_anchor(bridge, pixel, snap)?;
        Some(Self {
            kind,
            style,
            start: anchor,
            end: anchor,
            phase: DraftPhase::Started,
        })
    }

    /// `Started/Dragging -> Dragging`. Recomputes the end anchor only; an
    /// unresolvable pointer position keeps the previous end anchor.
    pub fn drag(&mut self, bridge: &impl ViewportBridge, pixel: PixelPoint, snap: Option<SnapTarget>) {
        if let Some(anchor) = resolve_anchor(bridge, pixel, snap) {
            self.end = anchor;
        }
        self.phase = DraftPhase::Dragging;
    }

    /// `Started/Dragging -> Finished | Cancelled`. Consumes the draft.
    /// A degenerate shape (start and end logical points coincide) is the
    /// sole automatic rejection: the draft is discarded and `None` returned.
    pub fn finish(
        mut self,
        bridge: &impl ViewportBridge,
        pixel: PixelPoint,
        snap: Option<SnapTarget>,
        id: AnnotationId,
    ) -> Option<Annotation> {
        if let Some(anchor) = resolve_anchor(bridge, pixel, snap) {
            self.end = anchor;
        }

        if self.start.logical == self.end.logical {
            debug!("discarding degenerate {:?} draft at {:?}", self.kind, self.start.logical);
            return None;
        }

        Some(Annotation {
            id,
            kind: self.kind,
            start: self.start,
            end: self.end,
            style: self.style,
            finished: true,
        })
    }

    /// Re-derive both pixel caches from the stored logical points so the
    /// drawn-so-far shape stays pinned while the chart moves mid-draw.
    /// Unresolvable anchors keep their last-known-good cache.
    pub fn repin(&mut self, bridge: &impl ViewportBridge) {
        if let Some(pixel) = bridge.to_pixel(self.start.logical) {
            self.start.pixel = pixel;
        }
        if let Some(pixel) = bridge.to_pixel(self.end.logical) {
            self.end.pixel = pixel;
        }
    }

    pub fn kind(&self) -> AnnotationKind {
        self.kind
    }

    pub fn style(&self) -> &ToolStyle {
        &self.style
    }

    pub fn phase(&self) -> DraftPhase {
        self.phase
    }

    pub fn start_anchor(&self) -> &Anchor {
        &self.start
    }

    pub fn end_anchor(&self) -> &Anchor {
        &self.end
    }

    pub fn start_logical(&self) -> LogicalPoint {
        self.start.logical
    }
}

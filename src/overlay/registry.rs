//! The annotation registry: owner of every finished annotation and of the
//! single active draft slot.
//!
//! Insertion order is z-order and index addressing. Change notification is
//! backed by a revision counter; the Bevy glue turns revision bumps into
//! [`AnnotationsChanged`](super::bridge::AnnotationsChanged) messages.
//! Every failure mode here recovers locally (no-op + log) — a drawing
//! overlay must never take down the chart that hosts it.

use bevy::log::{debug, warn};
use bevy::prelude::Resource;

use super::anchor::PixelPoint;
use super::annotation::{Annotation, AnnotationId, AnnotationKind};
use super::bridge::ViewportBridge;
use super::draft::{Draft, SnapTarget};
use super::geometry::{distance_point_to_rect, distance_point_to_segment, point_near_rect};
use super::style::{StylePatch, ToolStyle};

/// Index of the annotation currently selected by the pointer, if any.
#[derive(Resource, Default)]
pub struct SelectedAnnotation(pub Option<usize>);

#[derive(Resource, Default)]
pub struct AnnotationRegistry {
    annotations: Vec<Annotation>,
    /// Tool armed by `begin`, waiting for its first pointer-down.
    armed: Option<(AnnotationKind, ToolStyle)>,
    draft: Option<Draft>,
    next_id: AnnotationId,
    revision: u64,
    /// Ids whose rendering resources must be detached, drained by the glue.
    removed: Vec<AnnotationId>,
}

impl AnnotationRegistry {
    /// Arm a new draw tool. Rejected only while a draft is active: the
    /// caller is expected to enforce a single active tool, so a conflict
    /// here is a caller error and leaves the existing draft untouched. An
    /// already-armed tool (e.g. after a failed `set_start`) is simply
    /// replaced — no draft exists yet, so there is nothing to conflict with.
    pub fn begin(&mut self, kind: AnnotationKind, style: ToolStyle) -> bool {
        if self.draft.is_some() {
            warn!("begin({kind:?}) ignored: a draft is already active");
            return false;
        }
        if self.armed.is_some() {
            debug!("begin({kind:?}) replaces a pending armed tool");
        }
        self.armed = Some((kind, style));
        true
    }

    /// Place the first anchor of the armed tool. Stays idle (and keeps the
    /// tool armed) when the pixel is unaddressable.
    pub fn set_start(
        &mut self,
        bridge: &impl ViewportBridge,
        pixel: PixelPoint,
        snap: Option<SnapTarget>,
    ) -> bool {
        let Some((kind, style)) = self.armed else {
            debug!("set_start with no armed tool");
            return false;
        };
        match Draft::start(bridge, kind, style, pixel, snap) {
            Some(draft) => {
                self.armed = None;
                self.draft = Some(draft);
                true
            }
            None => {
                debug!("set_start on unaddressable pixel ({}, {})", pixel.x, pixel.y);
                false
            }
        }
    }

    /// Track the pointer with the draft's end anchor. Renders as a live
    /// preview; nothing is persisted.
    pub fn move_preview(
        &mut self,
        bridge: &impl ViewportBridge,
        pixel: PixelPoint,
        snap: Option<SnapTarget>,
    ) {
        if let Some(draft) = self.draft.as_mut() {
            draft.drag(bridge, pixel, snap);
        }
    }

    /// Finish the active draft. On success the annotation is appended (its
    /// index is returned) and the change revision bumps. A degenerate draft
    /// is discarded without notification — the collection did not change.
    pub fn finish(
        &mut self,
        bridge: &impl ViewportBridge,
        pixel: PixelPoint,
        snap: Option<SnapTarget>,
    ) -> Option<usize> {
        let draft = self.draft.take()?;
        let id = self.next_id;
        let annotation = draft.finish(bridge, pixel, snap, id)?;
        self.next_id += 1;
        self.annotations.push(annotation);
        self.revision += 1;
        Some(self.annotations.len() - 1)
    }

    /// Explicitly abort the active draft, if any.
    pub fn cancel(&mut self) {
        self.armed = None;
        self.draft = None;
    }

    /// Remove one annotation by index. Out of range is a no-op, not an
    /// error.
    pub fn remove_at(&mut self, index: usize) {
        if index >= self.annotations.len() {
            debug!("remove_at({index}) out of range, ignoring");
            return;
        }
        let annotation = self.annotations.remove(index);
        self.removed.push(annotation.id);
        self.revision += 1;
    }

    /// Drop every annotation and any active draft. Notifies once.
    pub fn clear_all(&mut self) {
        for annotation in self.annotations.drain(..) {
            self.removed.push(annotation.id);
        }
        self.armed = None;
        self.draft = None;
        self.revision += 1;
    }

    /// Merge a style patch into one annotation. The shape re-renders at its
    /// current pixel position; no reconciliation is triggered.
    pub fn update_style(&mut self, index: usize, patch: &StylePatch) {
        let Some(annotation) = self.annotations.get_mut(index) else {
            debug!("update_style({index}) out of range, ignoring");
            return;
        };
        annotation.style.apply(patch);
    }

    /// Finished annotations in z-order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub(crate) fn annotations_mut(&mut self) -> &mut [Annotation] {
        &mut self.annotations
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub(crate) fn draft_mut(&mut self) -> Option<&mut Draft> {
        self.draft.as_mut()
    }

    pub fn index_of(&self, id: AnnotationId) -> Option<usize> {
        self.annotations.iter().position(|a| a.id == id)
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Drain the ids whose rendering resources must be detached.
    pub fn take_removed(&mut self) -> Vec<AnnotationId> {
        std::mem::take(&mut self.removed)
    }

    /// Synchronously set every pixel cache (finished annotations and the
    /// draft) to its current target. Anchors the bridge cannot resolve keep
    /// their last-known-good cache.
    pub fn reconcile_now(&mut self, bridge: &impl ViewportBridge) {
        for annotation in &mut self.annotations {
            if let (Some(start), Some(end)) = (
                bridge.to_pixel(annotation.start.logical),
                bridge.to_pixel(annotation.end.logical),
            ) {
                annotation.start.pixel = start;
                annotation.end.pixel = end;
            }
        }
        if let Some(draft) = self.draft.as_mut() {
            draft.repin(bridge);
        }
    }

    /// Find the annotation nearest to `(x, y)` (CSS pixels) within
    /// `tolerance_css` CSS pixels, measured in device pixels. Forces a
    /// synchronous reconciliation pass first — selection never sees stale
    /// caches. Exact distance ties resolve to the most recently drawn
    /// shape.
    pub fn hit_test(
        &mut self,
        bridge: &impl ViewportBridge,
        x: f64,
        y: f64,
        tolerance_css: f64,
    ) -> Option<usize> {
        self.reconcile_now(bridge);

        let ratio = bridge.device_pixel_ratio();
        let cursor = PixelPoint::new(x, y).scaled(ratio);
        let tolerance = tolerance_css * ratio;

        let mut best: Option<(usize, f64)> = None;
        for (index, annotation) in self.annotations.iter().enumerate() {
            let a = annotation.start.pixel.scaled(ratio);
            let b = annotation.end.pixel.scaled(ratio);

            let (distance, within) = match annotation.kind {
                AnnotationKind::Line => {
                    let d = distance_point_to_segment(cursor, a, b);
                    (d, d <= tolerance)
                }
                AnnotationKind::Rect => (
                    distance_point_to_rect(cursor, a, b),
                    point_near_rect(cursor, a, b, tolerance),
                ),
            };

            // `<=` so that an exact tie prefers the higher index.
            if within && best.is_none_or(|(_, d)| distance <= d) {
                best = Some((index, distance));
            }
        }
        best.map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::super::bridge::testing::FakeBridge;
    use super::*;

    fn px(x: f64, y: f64) -> PixelPoint {
        PixelPoint::new(x, y)
    }

    /// Draw one finished line from (x0, y0) to (x1, y1) in surface pixels.
    fn draw_line(
        registry: &mut AnnotationRegistry,
        bridge: &FakeBridge,
        from: (f64, f64),
        to: (f64, f64),
    ) -> Option<usize> {
        assert!(registry.begin(AnnotationKind::Line, ToolStyle::line_default()));
        assert!(registry.set_start(bridge, px(from.0, from.1), None));
        registry.finish(bridge, px(to.0, to.1), None)
    }

    fn draw_rect(
        registry: &mut AnnotationRegistry,
        bridge: &FakeBridge,
        from: (f64, f64),
        to: (f64, f64),
    ) -> Option<usize> {
        assert!(registry.begin(AnnotationKind::Rect, ToolStyle::rect_default()));
        assert!(registry.set_start(bridge, px(from.0, from.1), None));
        registry.finish(bridge, px(to.0, to.1), None)
    }

    #[test]
    fn test_draw_scenario_stores_one_finished_annotation() {
        let bridge = FakeBridge::default();
        let mut registry = AnnotationRegistry::default();

        let start = px(100.0, 100.0);
        let end = px(400.0, 300.0);
        let expected_start = bridge.to_logical(start).unwrap();
        let expected_end = bridge.to_logical(end).unwrap();

        assert!(registry.begin(AnnotationKind::Line, ToolStyle::line_default()));
        assert!(registry.set_start(&bridge, start, None));
        assert_eq!(registry.finish(&bridge, end, None), Some(0));

        let all = registry.annotations();
        assert_eq!(all.len(), 1);
        assert!(all[0].finished);
        assert_eq!(all[0].start.logical, expected_start);
        assert_eq!(all[0].end.logical, expected_end);
    }

    #[test]
    fn test_degenerate_draw_leaves_registry_empty() {
        let bridge = FakeBridge::default();
        let mut registry = AnnotationRegistry::default();
        let revision = registry.revision();

        assert!(registry.begin(AnnotationKind::Line, ToolStyle::line_default()));
        assert!(registry.set_start(&bridge, px(100.0, 100.0), None));
        assert_eq!(registry.finish(&bridge, px(100.0, 100.0), None), None);

        assert!(registry.annotations().is_empty());
        assert!(registry.draft().is_none());
        // Collection did not change: no notification.
        assert_eq!(registry.revision(), revision);
    }

    #[test]
    fn test_concurrent_begin_is_rejected() {
        let bridge = FakeBridge::default();
        let mut registry = AnnotationRegistry::default();

        assert!(registry.begin(AnnotationKind::Line, ToolStyle::line_default()));
        assert!(registry.set_start(&bridge, px(100.0, 100.0), None));
        // Existing draft untouched by a second begin.
        assert!(!registry.begin(AnnotationKind::Rect, ToolStyle::rect_default()));
        assert!(registry.draft().is_some());
        assert_eq!(registry.draft().unwrap().kind(), AnnotationKind::Line);
    }

    #[test]
    fn test_set_start_on_unaddressable_pixel_keeps_tool_armed() {
        let bridge = FakeBridge::default();
        let mut registry = AnnotationRegistry::default();

        assert!(registry.begin(AnnotationKind::Line, ToolStyle::line_default()));
        assert!(!registry.set_start(&bridge, px(-10.0, 100.0), None));
        assert!(registry.draft().is_none());
        // A later pointer-down on a valid pixel still starts the draft.
        assert!(registry.set_start(&bridge, px(100.0, 100.0), None));
        assert!(registry.draft().is_some());
    }

    #[test]
    fn test_begin_after_failed_set_start_rearms() {
        let bridge = FakeBridge::default();
        let mut registry = AnnotationRegistry::default();

        assert!(registry.begin(AnnotationKind::Line, ToolStyle::line_default()));
        assert!(!registry.set_start(&bridge, px(-10.0, 100.0), None));

        // No draft exists, so the next pointer-down's begin must succeed —
        // the failed start never wedges the draw flow.
        assert!(registry.begin(AnnotationKind::Rect, ToolStyle::rect_default()));
        assert!(registry.set_start(&bridge, px(100.0, 100.0), None));
        assert_eq!(registry.draft().unwrap().kind(), AnnotationKind::Rect);
    }

    #[test]
    fn test_remove_at_fires_changed_exactly_once() {
        let bridge = FakeBridge::default();
        let mut registry = AnnotationRegistry::default();
        draw_line(&mut registry, &bridge, (100.0, 100.0), (400.0, 300.0)).unwrap();

        let revision = registry.revision();
        registry.remove_at(0);
        assert!(registry.annotations().is_empty());
        assert_eq!(registry.revision(), revision + 1);
        assert_eq!(registry.take_removed().len(), 1);
    }

    #[test]
    fn test_remove_at_out_of_range_is_noop() {
        let bridge = FakeBridge::default();
        let mut registry = AnnotationRegistry::default();
        draw_line(&mut registry, &bridge, (100.0, 100.0), (400.0, 300.0)).unwrap();

        let revision = registry.revision();
        registry.remove_at(5);
        assert_eq!(registry.annotations().len(), 1);
        assert_eq!(registry.revision(), revision);
    }

    #[test]
    fn test_remove_reindexes_remainder() {
        let bridge = FakeBridge::default();
        let mut registry = AnnotationRegistry::default();
        draw_line(&mut registry, &bridge, (100.0, 100.0), (200.0, 100.0)).unwrap();
        draw_line(&mut registry, &bridge, (100.0, 200.0), (200.0, 200.0)).unwrap();
        let second_id = registry.annotations()[1].id;

        registry.remove_at(0);
        assert_eq!(registry.annotations()[0].id, second_id);
        assert_eq!(registry.index_of(second_id), Some(0));
    }

    #[test]
    fn test_clear_all_fires_changed_once() {
        let bridge = FakeBridge::default();
        let mut registry = AnnotationRegistry::default();
        draw_line(&mut registry, &bridge, (100.0, 100.0), (200.0, 100.0)).unwrap();
        draw_rect(&mut registry, &bridge, (100.0, 200.0), (200.0, 300.0)).unwrap();

        let revision = registry.revision();
        registry.clear_all();
        assert!(registry.annotations().is_empty());
        assert_eq!(registry.revision(), revision + 1);
        assert_eq!(registry.take_removed().len(), 2);
    }

    #[test]
    fn test_update_style_merges_in_place() {
        let bridge = FakeBridge::default();
        let mut registry = AnnotationRegistry::default();
        draw_line(&mut registry, &bridge, (100.0, 100.0), (400.0, 300.0)).unwrap();

        registry.update_style(
            0,
            &StylePatch {
                stroke_width: Some(3.0),
                ..Default::default()
            },
        );
        assert_eq!(registry.annotations()[0].style.stroke_width, 3.0);

        // Out of range: no-op.
        registry.update_style(9, &StylePatch::default());
    }

    #[test]
    fn test_hit_test_rect_interior_and_miss() {
        // FakeBridge with a 1:1-ish mapping: draw the rect by pixel corners.
        let bridge = FakeBridge::default();
        let mut registry = AnnotationRegistry::default();
        let index = draw_rect(&mut registry, &bridge, (10.0, 10.0), (50.0, 50.0)).unwrap();

        assert_eq!(registry.hit_test(&bridge, 30.0, 30.0, 5.0), Some(index));
        assert_eq!(registry.hit_test(&bridge, 200.0, 200.0, 5.0), None);
    }

    #[test]
    fn test_hit_test_line_within_tolerance() {
        let bridge = FakeBridge::default();
        let mut registry = AnnotationRegistry::default();
        let index = draw_line(&mut registry, &bridge, (100.0, 100.0), (300.0, 100.0)).unwrap();

        assert_eq!(registry.hit_test(&bridge, 200.0, 103.0, 5.0), Some(index));
        assert_eq!(registry.hit_test(&bridge, 200.0, 110.0, 5.0), None);
    }

    #[test]
    fn test_hit_test_is_idempotent() {
        let bridge = FakeBridge::default();
        let mut registry = AnnotationRegistry::default();
        draw_line(&mut registry, &bridge, (100.0, 100.0), (300.0, 100.0)).unwrap();

        let first = registry.hit_test(&bridge, 200.0, 102.0, 5.0);
        let second = registry.hit_test(&bridge, 200.0, 102.0, 5.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_hit_test_exact_tie_prefers_most_recent() {
        let bridge = FakeBridge::default();
        let mut registry = AnnotationRegistry::default();
        // Two coincident lines: identical distance to any cursor.
        draw_line(&mut registry, &bridge, (100.0, 100.0), (300.0, 100.0)).unwrap();
        draw_line(&mut registry, &bridge, (100.0, 100.0), (300.0, 100.0)).unwrap();

        assert_eq!(registry.hit_test(&bridge, 200.0, 101.0, 5.0), Some(1));
    }

    #[test]
    fn test_hit_test_nearest_wins() {
        let bridge = FakeBridge::default();
        let mut registry = AnnotationRegistry::default();
        draw_line(&mut registry, &bridge, (100.0, 100.0), (300.0, 100.0)).unwrap();
        draw_line(&mut registry, &bridge, (100.0, 108.0), (300.0, 108.0)).unwrap();

        // Cursor at y=102: first line is 2px away, second 6px.
        assert_eq!(registry.hit_test(&bridge, 200.0, 102.0, 10.0), Some(0));
    }

    #[test]
    fn test_hit_test_scales_tolerance_by_device_pixel_ratio() {
        let bridge = FakeBridge {
            dpr: 2.0,
            ..Default::default()
        };
        let mut registry = AnnotationRegistry::default();
        draw_line(&mut registry, &bridge, (100.0, 100.0), (300.0, 100.0)).unwrap();

        // 4 CSS px off a line with 5 CSS px tolerance: a hit regardless of
        // the device scale.
        assert_eq!(registry.hit_test(&bridge, 200.0, 104.0, 5.0), Some(0));
        assert_eq!(registry.hit_test(&bridge, 200.0, 106.0, 5.0), None);
    }

    #[test]
    fn test_hit_test_never_uses_stale_caches() {
        let mut bridge = FakeBridge::default();
        let mut registry = AnnotationRegistry::default();
        draw_line(&mut registry, &bridge, (100.0, 100.0), (300.0, 100.0)).unwrap();

        // Pan: the same logical line now sits 80px to the left.
        bridge.time_range = (100, 1_100);
        let moved = bridge
            .to_pixel(registry.annotations()[0].start.logical)
            .unwrap();

        assert_eq!(registry.hit_test(&bridge, moved.x + 100.0, 100.0, 5.0), Some(0));
        assert_eq!(registry.annotations()[0].start.pixel, moved);
    }

    #[test]
    fn test_cancel_discards_draft() {
        let bridge = FakeBridge::default();
        let mut registry = AnnotationRegistry::default();
        assert!(registry.begin(AnnotationKind::Line, ToolStyle::line_default()));
        assert!(registry.set_start(&bridge, px(100.0, 100.0), None));

        registry.cancel();
        assert!(registry.draft().is_none());
        assert!(registry.annotations().is_empty());
        // Slot is free again.
        assert!(registry.begin(AnnotationKind::Rect, ToolStyle::rect_default()));
    }
}

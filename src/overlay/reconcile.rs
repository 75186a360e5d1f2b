//! Reconciliation/animation engine: keeps every finished annotation's pixel
//! cache consistent with its logical anchors after viewport changes.
//!
//! Two modes. Immediate (pan/zoom gestures, resize) sets caches to target on
//! the next frame with no interpolation — panning must feel rigid. Eased
//! (ambient triggers: crosshair movement, live data updates) interpolates
//! the cache toward the target frame by frame and snaps once both endpoints
//! settle, smoothing out jitter from noisy high-frequency events.
//!
//! Scheduling contract: installing a motion for an annotation replaces any
//! in-flight motion for it — latest target wins, no queueing, and no two
//! interpolations ever chase the same anchor. Within one tick all targets
//! are computed before any cache is touched, so annotations never observe a
//! mixed old/new viewport state. Pixel caches are always re-derived from
//! the stored logical values, never accumulated from pixel deltas, so
//! repeated pan/zoom cannot drift.

use std::collections::HashMap;

use bevy::prelude::Resource;

use super::anchor::PixelPoint;
use super::annotation::AnnotationId;
use super::bridge::ViewportBridge;
use super::registry::AnnotationRegistry;

/// Per-frame interpolation factor for eased motions.
pub const EASE_ALPHA: f64 = 0.28;

/// Distance at which an eased motion snaps to its exact target.
pub const SETTLE_EPSILON: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    Eased,
    Immediate,
}

/// An in-flight eased interpolation toward a fixed pixel target.
#[derive(Debug, Clone, Copy)]
pub struct Motion {
    pub start_target: PixelPoint,
    pub end_target: PixelPoint,
}

impl Motion {
    /// Advance both caches one frame toward the targets. Returns true once
    /// both endpoints are within [`SETTLE_EPSILON`]; the caches then hold
    /// the exact targets.
    pub fn step(&self, start: &mut PixelPoint, end: &mut PixelPoint) -> bool {
        start.x += (self.start_target.x - start.x) * EASE_ALPHA;
        start.y += (self.start_target.y - start.y) * EASE_ALPHA;
        end.x += (self.end_target.x - end.x) * EASE_ALPHA;
        end.y += (self.end_target.y - end.y) * EASE_ALPHA;

        if start.distance(self.start_target) <= SETTLE_EPSILON
            && end.distance(self.end_target) <= SETTLE_EPSILON
        {
            *start = self.start_target;
            *end = self.end_target;
            return true;
        }
        false
    }
}

#[derive(Resource, Default)]
pub struct Reconciler {
    /// Strongest mode requested since the last tick.
    pending: Option<ReconcileMode>,
    motions: HashMap<AnnotationId, Motion>,
}

impl Reconciler {
    /// Record a viewport event. Immediate dominates eased when both arrive
    /// in the same frame.
    pub fn request(&mut self, mode: ReconcileMode) {
        self.pending = Some(match (self.pending, mode) {
            (Some(ReconcileMode::Immediate), _) | (_, ReconcileMode::Immediate) => {
                ReconcileMode::Immediate
            }
            _ => ReconcileMode::Eased,
        });
    }

    /// One animation frame: apply any pending viewport change, then advance
    /// in-flight motions.
    pub fn tick(&mut self, registry: &mut AnnotationRegistry, bridge: &impl ViewportBridge) {
        if let Some(mode) = self.pending.take() {
            self.apply(mode, registry, bridge);
            // The draft tracks the viewport rigidly regardless of mode.
            if let Some(draft) = registry.draft_mut() {
                draft.repin(bridge);
            }
        }
        self.advance(registry);
    }

    /// Phase 1: compute every target. Phase 2: apply per mode. Annotations
    /// with an unresolvable anchor are skipped for this pass and keep their
    /// last-known-good cache (and lose any in-flight motion, which would
    /// otherwise chase a stale target).
    fn apply(
        &mut self,
        mode: ReconcileMode,
        registry: &mut AnnotationRegistry,
        bridge: &impl ViewportBridge,
    ) {
        let targets: Vec<(AnnotationId, Option<Motion>)> = registry
            .annotations()
            .iter()
            .map(|annotation| {
                let start = bridge.to_pixel(annotation.start.logical);
                let end = bridge.to_pixel(annotation.end.logical);
                let motion = match (start, end) {
                    (Some(start_target), Some(end_target)) => Some(Motion {
                        start_target,
                        end_target,
                    }),
                    _ => None,
                };
                (annotation.id, motion)
            })
            .collect();

        for (id, target) in targets {
            let Some(motion) = target else {
                self.motions.remove(&id);
                continue;
            };
            match mode {
                ReconcileMode::Immediate => {
                    self.motions.remove(&id);
                    if let Some(index) = registry.index_of(id) {
                        let annotation = &mut registry.annotations_mut()[index];
                        annotation.start.pixel = motion.start_target;
                        annotation.end.pixel = motion.end_target;
                    }
                }
                ReconcileMode::Eased => {
                    // Replaces (cancels) any in-flight motion: latest target
                    // wins.
                    self.motions.insert(id, motion);
                }
            }
        }
    }

    /// Step every active motion; settled or orphaned motions are dropped.
    fn advance(&mut self, registry: &mut AnnotationRegistry) {
        if self.motions.is_empty() {
            return;
        }
        let mut settled = Vec::new();
        for (&id, motion) in &self.motions {
            let Some(index) = registry.index_of(id) else {
                settled.push(id);
                continue;
            };
            let annotation = &mut registry.annotations_mut()[index];
            let done = motion.step(&mut annotation.start.pixel, &mut annotation.end.pixel);
            if done {
                settled.push(id);
            }
        }
        for id in settled {
            self.motions.remove(&id);
        }
    }

    /// Detach engine state for a removed annotation.
    pub fn detach(&mut self, id: AnnotationId) {
        self.motions.remove(&id);
    }

    pub fn clear(&mut self) {
        self.pending = None;
        self.motions.clear();
    }

    pub fn has_active_motions(&self) -> bool {
        !self.motions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::super::anchor::PixelPoint;
    use super::super::annotation::AnnotationKind;
    use super::super::bridge::testing::FakeBridge;
    use super::super::style::ToolStyle;
    use super::*;

    fn registry_with_line(bridge: &FakeBridge) -> AnnotationRegistry {
        let mut registry = AnnotationRegistry::default();
        assert!(registry.begin(AnnotationKind::Line, ToolStyle::line_default()));
        assert!(registry.set_start(bridge, PixelPoint::new(100.0, 100.0), None));
        registry.finish(bridge, PixelPoint::new(400.0, 300.0), None).unwrap();
        registry
    }

    #[test]
    fn test_immediate_reaches_target_in_one_tick() {
        let mut bridge = FakeBridge::default();
        let mut registry = registry_with_line(&bridge);
        let mut reconciler = Reconciler::default();

        bridge.time_range = (200, 1_200);
        reconciler.request(ReconcileMode::Immediate);
        reconciler.tick(&mut registry, &bridge);

        let annotation = &registry.annotations()[0];
        assert_eq!(
            annotation.start.pixel,
            bridge.to_pixel(annotation.start.logical).unwrap()
        );
        assert_eq!(
            annotation.end.pixel,
            bridge.to_pixel(annotation.end.logical).unwrap()
        );
        assert!(!reconciler.has_active_motions());
    }

    #[test]
    fn test_eased_distance_is_monotone_and_converges() {
        let mut bridge = FakeBridge::default();
        let mut registry = registry_with_line(&bridge);
        let mut reconciler = Reconciler::default();

        bridge.price_range = (100.0, 1_100.0);
        reconciler.request(ReconcileMode::Eased);
        reconciler.tick(&mut registry, &bridge);

        let target = bridge
            .to_pixel(registry.annotations()[0].start.logical)
            .unwrap();

        let mut last = registry.annotations()[0].start.pixel.distance(target);
        let mut frames = 0;
        while reconciler.has_active_motions() {
            reconciler.tick(&mut registry, &bridge);
            let now = registry.annotations()[0].start.pixel.distance(target);
            assert!(now <= last, "distance increased: {now} > {last}");
            last = now;
            frames += 1;
            assert!(frames < 200, "eased motion failed to settle");
        }

        // Settled exactly on target, no residual interpolation lag.
        assert_eq!(registry.annotations()[0].start.pixel, target);
    }

    #[test]
    fn test_new_target_cancels_in_flight_motion() {
        let mut bridge = FakeBridge::default();
        let mut registry = registry_with_line(&bridge);
        let mut reconciler = Reconciler::default();

        bridge.price_range = (100.0, 1_100.0);
        reconciler.request(ReconcileMode::Eased);
        reconciler.tick(&mut registry, &bridge);
        assert!(reconciler.has_active_motions());

        // A second viewport change before convergence: latest target wins.
        bridge.price_range = (300.0, 1_300.0);
        reconciler.request(ReconcileMode::Eased);
        for _ in 0..300 {
            reconciler.tick(&mut registry, &bridge);
            if !reconciler.has_active_motions() {
                break;
            }
        }

        let target = bridge
            .to_pixel(registry.annotations()[0].start.logical)
            .unwrap();
        assert_eq!(registry.annotations()[0].start.pixel, target);
    }

    #[test]
    fn test_immediate_dominates_eased_within_one_frame() {
        let mut bridge = FakeBridge::default();
        let mut registry = registry_with_line(&bridge);
        let mut reconciler = Reconciler::default();

        bridge.time_range = (200, 1_200);
        reconciler.request(ReconcileMode::Eased);
        reconciler.request(ReconcileMode::Immediate);
        reconciler.tick(&mut registry, &bridge);

        let annotation = &registry.annotations()[0];
        assert_eq!(
            annotation.start.pixel,
            bridge.to_pixel(annotation.start.logical).unwrap()
        );
        assert!(!reconciler.has_active_motions());
    }

    #[test]
    fn test_unresolvable_anchor_retains_last_known_good_cache() {
        let mut bridge = FakeBridge::default();
        let mut registry = registry_with_line(&bridge);
        let mut reconciler = Reconciler::default();
        let cached = registry.annotations()[0].start.pixel;

        // Pan far enough that the annotation's times leave the viewport.
        bridge.time_range = (500_000, 600_000);
        reconciler.request(ReconcileMode::Immediate);
        reconciler.tick(&mut registry, &bridge);

        assert_eq!(registry.annotations()[0].start.pixel, cached);
        assert!(!reconciler.has_active_motions());
    }

    #[test]
    fn test_no_pending_event_means_no_cache_movement() {
        let bridge = FakeBridge::default();
        let mut registry = registry_with_line(&bridge);
        let mut reconciler = Reconciler::default();
        let cached = registry.annotations()[0].start.pixel;

        reconciler.tick(&mut registry, &bridge);
        assert_eq!(registry.annotations()[0].start.pixel, cached);
    }

    #[test]
    fn test_detach_drops_motion() {
        let mut bridge = FakeBridge::default();
        let mut registry = registry_with_line(&bridge);
        let mut reconciler = Reconciler::default();
        let id = registry.annotations()[0].id;

        bridge.price_range = (100.0, 1_100.0);
        reconciler.request(ReconcileMode::Eased);
        reconciler.tick(&mut registry, &bridge);
        assert!(reconciler.has_active_motions());

        reconciler.detach(id);
        assert!(!reconciler.has_active_motions());
    }
}

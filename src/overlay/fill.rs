//! Sprite-backed rectangle fills.
//!
//! Gizmos only stroke, so each finished rectangle with a fill owns one
//! sprite entity, kept in sync with the registry every frame and despawned
//! synchronously when its annotation is removed.

use std::collections::HashMap;

use bevy::prelude::*;

use super::annotation::{AnnotationId, AnnotationKind};
use super::bridge::ViewportBridge;
use super::registry::AnnotationRegistry;
use super::style::Rgba;

/// Fill entity for one rectangle annotation.
#[derive(Component)]
pub struct RectFill(pub AnnotationId);

/// Fill entity for the in-progress rectangle draft.
#[derive(Component)]
pub struct DraftFill;

/// Annotation id -> fill entity, plus the draft preview entity.
#[derive(Resource, Default)]
pub struct RectFillIndex {
    entities: HashMap<AnnotationId, Entity>,
    draft_entity: Option<Entity>,
}

impl RectFillIndex {
    pub fn detach(&mut self, commands: &mut Commands, id: AnnotationId) {
        if let Some(entity) = self.entities.remove(&id) {
            commands.entity(entity).despawn();
        }
    }

    pub fn draft_entity(&self) -> Option<Entity> {
        self.draft_entity
    }
}

fn to_color(color: Rgba) -> Color {
    Color::srgba(color.r, color.g, color.b, color.a)
}

/// Surface pixel coordinates (y down, origin top-left) to world coordinates
/// of a centered 2D camera (y up, origin center).
pub fn surface_to_world(x: f64, y: f64, surface: (f64, f64)) -> Vec2 {
    Vec2::new(
        (x - surface.0 / 2.0) as f32,
        (surface.1 / 2.0 - y) as f32,
    )
}

/// Keep fill sprites matching the registry: spawn for new filled rects,
/// reposition from the current pixel caches, despawn when the fill was
/// cleared by a style update.
pub fn sync_rect_fills<B: ViewportBridge + Resource>(
    mut commands: Commands,
    registry: Res<AnnotationRegistry>,
    bridge: Res<B>,
    mut index: ResMut<RectFillIndex>,
    mut fills: Query<(&mut Sprite, &mut Transform), (With<RectFill>, Without<DraftFill>)>,
    mut draft_fills: Query<(&mut Sprite, &mut Transform), With<DraftFill>>,
) {
    let surface = bridge.surface_size();
    let mut live: HashMap<AnnotationId, usize> = HashMap::new();

    for (position, annotation) in registry.annotations().iter().enumerate() {
        if annotation.kind != AnnotationKind::Rect {
            continue;
        }
        let Some(fill) = annotation.style.fill else {
            continue;
        };
        live.insert(annotation.id, position);

        let a = annotation.start.pixel;
        let b = annotation.end.pixel;
        let center = surface_to_world((a.x + b.x) / 2.0, (a.y + b.y) / 2.0, surface);
        let size = Vec2::new((a.x - b.x).abs() as f32, (a.y - b.y).abs() as f32);
        // Fills sit above the chart but below gizmo strokes; z spreads by
        // insertion order so overlaps resolve like the stroke z-order.
        let translation = center.extend(10.0 + position as f32 * 0.01);

        match index.entities.get(&annotation.id) {
            Some(&entity) => {
                if let Ok((mut sprite, mut transform)) = fills.get_mut(entity) {
                    sprite.custom_size = Some(size);
                    sprite.color = to_color(fill);
                    transform.translation = translation;
                }
            }
            None => {
                let entity = commands
                    .spawn((
                        Sprite::from_color(to_color(fill), size),
                        Transform::from_translation(translation),
                        RectFill(annotation.id),
                    ))
                    .id();
                index.entities.insert(annotation.id, entity);
            }
        }
    }

    // Fill cleared by a style update (removal itself is handled when the
    // registry's removed ids are drained).
    let stale: Vec<AnnotationId> = index
        .entities
        .keys()
        .filter(|id| !live.contains_key(id) && registry.index_of(**id).is_some())
        .copied()
        .collect();
    for id in stale {
        index.detach(&mut commands, id);
    }

    // Live preview: a rect draft's fill renders at half opacity, like the
    // final shape but visibly not committed yet.
    let preview = registry.draft().and_then(|draft| {
        if draft.kind() != AnnotationKind::Rect {
            return None;
        }
        let fill = draft.style().fill?;
        Some((
            draft.start_anchor().pixel,
            draft.end_anchor().pixel,
            fill.with_alpha(fill.a * 0.5),
        ))
    });
    match preview {
        Some((a, b, fill)) => {
            let center = surface_to_world((a.x + b.x) / 2.0, (a.y + b.y) / 2.0, surface);
            let size = Vec2::new((a.x - b.x).abs() as f32, (a.y - b.y).abs() as f32);
            // Above every finished fill, still below gizmo strokes.
            let translation = center.extend(15.0);
            match index.draft_entity {
                Some(entity) => {
                    if let Ok((mut sprite, mut transform)) = draft_fills.get_mut(entity) {
                        sprite.custom_size = Some(size);
                        sprite.color = to_color(fill);
                        transform.translation = translation;
                    }
                }
                None => {
                    let entity = commands
                        .spawn((
                            Sprite::from_color(to_color(fill), size),
                            Transform::from_translation(translation),
                            DraftFill,
                        ))
                        .id();
                    index.draft_entity = Some(entity);
                }
            }
        }
        None => {
            if let Some(entity) = index.draft_entity.take() {
                commands.entity(entity).despawn();
            }
        }
    }
}

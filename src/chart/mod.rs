//! The host chart surface: candle series, viewport, interaction, and base
//! rendering. Supplies the overlay with its [`ViewportBridge`]
//! implementation and all viewport-change notifications.
//!
//! [`ViewportBridge`]: crate::overlay::ViewportBridge

pub mod data;
mod interaction;
mod render;
pub mod viewport;

pub use data::{Candle, ChartData};
pub use viewport::ChartViewport;

use bevy::prelude::*;

fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

pub struct ChartPlugin;

impl Plugin for ChartPlugin {
    fn build(&self, app: &mut App) {
        let data = ChartData::default();
        let viewport = ChartViewport::fit(&data);
        app.insert_resource(data)
            .insert_resource(viewport)
            .init_resource::<data::LiveFeed>()
            .add_systems(Startup, spawn_camera)
            .add_systems(
                Update,
                (
                    interaction::sync_surface,
                    interaction::pan,
                    interaction::zoom,
                    interaction::crosshair,
                    data::live_feed,
                    render::draw_candles,
                    render::draw_crosshair,
                ),
            );
    }
}

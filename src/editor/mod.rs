mod input;
pub mod tools;

pub use tools::{CurrentTool, EditorTool};

use bevy::prelude::*;

pub struct EditorPlugin;

impl Plugin for EditorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<tools::CurrentTool>().add_systems(
            Update,
            (
                tools::handle_tool_shortcuts,
                tools::cancel_draft_on_tool_change,
                tools::update_cursor_icon,
                input::handle_draw,
                input::handle_select,
                input::handle_erase,
            ),
        );
    }
}

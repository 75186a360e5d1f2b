use bevy::prelude::*;
use bevy::window::{CursorIcon, PrimaryWindow, SystemCursorIcon};
use bevy_egui::EguiContexts;

use crate::overlay::{AnnotationKind, AnnotationRegistry, SelectedAnnotation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorTool {
    #[default]
    Select,
    Line,
    Rect,
    Eraser,
}

impl EditorTool {
    pub fn display_name(&self) -> &'static str {
        match self {
            EditorTool::Select => "Select (V)",
            EditorTool::Line => "Line (L)",
            EditorTool::Rect => "Rect (R)",
            EditorTool::Eraser => "Eraser (E)",
        }
    }

    pub fn cursor_icon(&self) -> CursorIcon {
        match self {
            EditorTool::Select => CursorIcon::System(SystemCursorIcon::Default),
            EditorTool::Line => CursorIcon::System(SystemCursorIcon::Crosshair),
            EditorTool::Rect => CursorIcon::System(SystemCursorIcon::Crosshair),
            EditorTool::Eraser => CursorIcon::System(SystemCursorIcon::NotAllowed),
        }
    }

    pub fn all() -> &'static [EditorTool] {
        &[
            EditorTool::Select,
            EditorTool::Line,
            EditorTool::Rect,
            EditorTool::Eraser,
        ]
    }

    /// The annotation kind this tool draws, if it is a drawing tool.
    pub fn draw_kind(&self) -> Option<AnnotationKind> {
        match self {
            EditorTool::Line => Some(AnnotationKind::Line),
            EditorTool::Rect => Some(AnnotationKind::Rect),
            EditorTool::Select | EditorTool::Eraser => None,
        }
    }
}

#[derive(Resource, Default)]
pub struct CurrentTool {
    pub tool: EditorTool,
}

pub fn handle_tool_shortcuts(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut current_tool: ResMut<CurrentTool>,
    mut selection: ResMut<SelectedAnnotation>,
    mut contexts: EguiContexts,
) {
    // Don't change tools if typing in a text field
    if let Ok(ctx) = contexts.ctx_mut()
        && ctx.wants_keyboard_input()
    {
        return;
    }

    let new_tool = if keyboard.just_pressed(KeyCode::KeyV) || keyboard.just_pressed(KeyCode::KeyS) {
        Some(EditorTool::Select)
    } else if keyboard.just_pressed(KeyCode::KeyL) {
        Some(EditorTool::Line)
    } else if keyboard.just_pressed(KeyCode::KeyR) {
        Some(EditorTool::Rect)
    } else if keyboard.just_pressed(KeyCode::KeyE) {
        Some(EditorTool::Eraser)
    } else {
        None
    };

    if let Some(tool) = new_tool {
        // Clear selection when switching tools
        if tool != current_tool.tool {
            selection.0 = None;
        }
        current_tool.tool = tool;
    }
}

/// Leaving a drawing tool abandons any half-drawn shape.
pub fn cancel_draft_on_tool_change(
    current_tool: Res<CurrentTool>,
    mut registry: ResMut<AnnotationRegistry>,
) {
    if current_tool.is_changed()
        && current_tool.tool.draw_kind().is_none()
        && registry.draft().is_some()
    {
        registry.cancel();
    }
}

pub fn update_cursor_icon(
    current_tool: Res<CurrentTool>,
    mut window_query: Query<Entity, With<PrimaryWindow>>,
    mut commands: Commands,
    mut contexts: EguiContexts,
) {
    let Ok(entity) = window_query.single_mut() else {
        return;
    };

    // Use default cursor over UI, tool cursor over the chart
    if let Ok(ctx) = contexts.ctx_mut()
        && ctx.is_pointer_over_area()
    {
        commands
            .entity(entity)
            .insert(CursorIcon::System(SystemCursorIcon::Default));
        return;
    }

    commands.entity(entity).insert(current_tool.tool.cursor_icon());
}

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};

use crate::config::{ConfigResetNotification, SaveConfigRequest};
use crate::editor::{CurrentTool, EditorTool};
use crate::overlay::{
    AnnotationKind, AnnotationRegistry, Rgba, SelectedAnnotation, StrokePattern, StylePatch,
    StyleProvider,
};

/// Check if the cursor is over egui UI
pub fn is_cursor_over_ui(contexts: &mut EguiContexts) -> bool {
    contexts
        .ctx_mut()
        .map(|ctx| ctx.is_pointer_over_area())
        .unwrap_or(false)
}

/// Main toolbar showing tools and annotation actions
pub fn toolbar_ui(
    mut contexts: EguiContexts,
    mut current_tool: ResMut<CurrentTool>,
    mut registry: ResMut<AnnotationRegistry>,
    mut selection: ResMut<SelectedAnnotation>,
) -> Result {
    egui::TopBottomPanel::top("main_toolbar")
        .frame(
            egui::Frame::side_top_panel(&contexts.ctx_mut()?.style())
                .inner_margin(egui::Margin::symmetric(12, 8)),
        )
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 4.0;

                // Tool buttons with keyboard shortcuts
                for tool in EditorTool::all() {
                    let selected = current_tool.tool == *tool;
                    let button_text = tool_button_label(tool);

                    let button = egui::Button::new(
                        egui::RichText::new(button_text).size(14.0).strong(),
                    )
                    .min_size(egui::vec2(0.0, 28.0))
                    .selected(selected);

                    let response = ui.add(button);
                    if response.clicked() {
                        current_tool.tool = *tool;
                        selection.0 = None;
                    }
                    response.on_hover_text(tool.display_name());
                }

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                let count = registry.annotations().len();
                ui.label(format!(
                    "{count} annotation{}",
                    if count == 1 { "" } else { "s" }
                ));

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .add_enabled(
                            count > 0,
                            egui::Button::new("Clear All").min_size(egui::vec2(0.0, 24.0)),
                        )
                        .clicked()
                    {
                        registry.clear_all();
                        selection.0 = None;
                    }
                    if let Some(index) = selection.0
                        && ui
                            .add(egui::Button::new("Delete Selected").min_size(egui::vec2(0.0, 24.0)))
                            .clicked()
                    {
                        registry.remove_at(index);
                        selection.0 = None;
                    }
                });
            });
        });
    Ok(())
}

/// Secondary toolbar showing style settings for the active tool
pub fn tool_settings_ui(
    mut contexts: EguiContexts,
    current_tool: Res<CurrentTool>,
    mut styles: ResMut<StyleProvider>,
    mut registry: ResMut<AnnotationRegistry>,
    selection: Res<SelectedAnnotation>,
    mut save_events: MessageWriter<SaveConfigRequest>,
) -> Result {
    // Select edits the selected annotation's style; drawing tools edit the
    // tool default.
    let kind = match current_tool.tool.draw_kind() {
        Some(kind) => kind,
        None => {
            let Some(index) = selection.0 else {
                return Ok(());
            };
            match registry.annotations().get(index) {
                Some(annotation) => annotation.kind,
                None => return Ok(()),
            }
        }
    };
    let editing_selection = current_tool.tool.draw_kind().is_none();

    let mut style = if editing_selection {
        match selection.0.and_then(|i| registry.annotations().get(i)) {
            Some(annotation) => annotation.style,
            None => return Ok(()),
        }
    } else {
        styles.default_for(kind)
    };
    let before = style;

    egui::TopBottomPanel::top("tool_settings")
        .frame(
            egui::Frame::side_top_panel(&contexts.ctx_mut()?.style())
                .inner_margin(egui::Margin::symmetric(12, 6))
                .fill(egui::Color32::from_rgb(45, 45, 48)),
        )
        .show(contexts.ctx_mut()?, |ui| {
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 6.0;

                let label = if editing_selection {
                    "Selection:"
                } else {
                    match kind {
                        AnnotationKind::Line => "Line Settings:",
                        AnnotationKind::Rect => "Rect Settings:",
                    }
                };
                ui.label(egui::RichText::new(label).color(egui::Color32::LIGHT_GRAY));

                ui.add_space(8.0);

                // Preset selector
                ui.label("Preset:");
                egui::ComboBox::from_id_salt("style_preset")
                    .selected_text("Presets")
                    .width(110.0)
                    .show_ui(ui, |ui| {
                        for name in StyleProvider::preset_names(kind) {
                            if ui.selectable_label(false, *name).clicked()
                                && let Some(preset) = StyleProvider::preset(kind, name)
                            {
                                style = preset;
                            }
                        }
                    });

                ui.add_space(8.0);

                ui.label("Color:");
                color_button(ui, &mut style.color);

                ui.label("Width:");
                // Gizmo strokes draw at the group's fixed line width; this
                // value feeds dash metrics and the persisted style.
                ui.add(
                    egui::DragValue::new(&mut style.stroke_width)
                        .range(1.0..=20.0)
                        .speed(0.5)
                        .suffix(" px"),
                );

                ui.label("Pattern:");
                egui::ComboBox::from_id_salt("stroke_pattern")
                    .selected_text(pattern_label(style.pattern))
                    .width(80.0)
                    .show_ui(ui, |ui| {
                        for pattern in [
                            StrokePattern::Solid,
                            StrokePattern::Dashed,
                            StrokePattern::Dotted,
                        ] {
                            if ui
                                .selectable_label(style.pattern == pattern, pattern_label(pattern))
                                .clicked()
                            {
                                style.pattern = pattern;
                            }
                        }
                    });

                ui.add_space(8.0);
                ui.separator();
                ui.add_space(8.0);

                match kind {
                    AnnotationKind::Line => {
                        ui.checkbox(&mut style.extend_left, "Extend left");
                        ui.checkbox(&mut style.extend_right, "Extend right");
                    }
                    AnnotationKind::Rect => {
                        let mut filled = style.fill.is_some();
                        if ui.checkbox(&mut filled, "Fill").changed() {
                            style.fill = filled.then(|| style.color.with_alpha(0.2));
                        }
                        if let Some(fill) = style.fill.as_mut() {
                            color_button(ui, fill);
                        }
                    }
                }

                ui.checkbox(&mut style.snap, "Snap to OHLC");
            });
        });

    if style != before {
        if editing_selection {
            if let Some(index) = selection.0 {
                registry.update_style(index, &StylePatch::from(style));
            }
        } else {
            styles.set_default(kind, style);
            save_events.write(SaveConfigRequest);
        }
    }
    Ok(())
}

/// Notification dialog shown when the config file could not be loaded
pub fn config_reset_notification_ui(
    mut contexts: EguiContexts,
    mut notification: ResMut<ConfigResetNotification>,
) -> Result {
    if !notification.show {
        return Ok(());
    }

    egui::Window::new("Settings Reset")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(contexts.ctx_mut()?, |ui| {
            ui.label("Your settings were reset to defaults.");
            if let Some(reason) = &notification.reason {
                ui.label(egui::RichText::new(reason).color(egui::Color32::GRAY).size(11.0));
            }
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                notification.show = false;
                notification.reason = None;
            }
        });
    Ok(())
}

fn color_button(ui: &mut egui::Ui, color: &mut Rgba) {
    let mut rgba = egui::Rgba::from_rgba_unmultiplied(color.r, color.g, color.b, color.a);
    if egui::color_picker::color_edit_button_rgba(
        ui,
        &mut rgba,
        egui::color_picker::Alpha::OnlyBlend,
    )
    .changed()
    {
        let [r, g, b, a] = rgba.to_rgba_unmultiplied();
        *color = Rgba::new(r, g, b, a);
    }
}

fn pattern_label(pattern: StrokePattern) -> &'static str {
    match pattern {
        StrokePattern::Solid => "Solid",
        StrokePattern::Dashed => "Dashed",
        StrokePattern::Dotted => "Dotted",
    }
}

/// Get the button label for a tool (with keyboard shortcut)
fn tool_button_label(tool: &EditorTool) -> &'static str {
    match tool {
        EditorTool::Select => "Select [V]",
        EditorTool::Line => "Line [L]",
        EditorTool::Rect => "Rect [R]",
        EditorTool::Eraser => "Eraser [E]",
    }
}

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            EguiPrimaryContextPass,
            (toolbar_ui, tool_settings_ui, config_reset_notification_ui).chain(),
        );
    }
}

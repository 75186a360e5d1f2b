//! Tool styles and the style provider.
//!
//! Styles are plain data and carry no behavior. The [`StyleProvider`] is an
//! explicitly constructed resource owned by the composition root; defaults
//! per tool kind are its state, not process-wide globals.

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use super::annotation::AnnotationKind;

/// Straight-alpha color, serde-friendly and independent of the render
/// backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from 8-bit channels.
    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StrokePattern {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl StrokePattern {
    /// On/off dash lengths in CSS pixels, `None` for solid strokes.
    pub fn dash_lengths(self) -> Option<(f64, f64)> {
        match self {
            StrokePattern::Solid => None,
            StrokePattern::Dashed => Some((5.0, 5.0)),
            StrokePattern::Dotted => Some((2.0, 2.0)),
        }
    }
}

/// Immutable-per-draw style record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolStyle {
    pub color: Rgba,
    pub stroke_width: f64,
    pub pattern: StrokePattern,
    /// Fill color for area shapes; alpha carries the fill opacity.
    #[serde(default)]
    pub fill: Option<Rgba>,
    /// Extend the line to the left canvas boundary (line tool only).
    #[serde(default)]
    pub extend_left: bool,
    /// Extend the line to the right canvas boundary (line tool only).
    #[serde(default)]
    pub extend_right: bool,
    /// Snap anchor prices to the nearest OHLC field while drawing.
    #[serde(default)]
    pub snap: bool,
}

const BLUE: Rgba = Rgba::rgb8(0x21, 0x96, 0xf3);

impl ToolStyle {
    pub fn line_default() -> Self {
        Self {
            color: BLUE,
            stroke_width: 1.0,
            pattern: StrokePattern::Solid,
            fill: None,
            extend_left: false,
            extend_right: false,
            snap: true,
        }
    }

    pub fn rect_default() -> Self {
        Self {
            color: BLUE,
            stroke_width: 1.0,
            pattern: StrokePattern::Solid,
            fill: Some(BLUE.with_alpha(0.2)),
            extend_left: false,
            extend_right: false,
            snap: true,
        }
    }

    pub fn default_for(kind: AnnotationKind) -> Self {
        match kind {
            AnnotationKind::Line => Self::line_default(),
            AnnotationKind::Rect => Self::rect_default(),
        }
    }

    /// Merge a partial update into this style.
    pub fn apply(&mut self, patch: &StylePatch) {
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(width) = patch.stroke_width {
            self.stroke_width = width;
        }
        if let Some(pattern) = patch.pattern {
            self.pattern = pattern;
        }
        if let Some(fill) = patch.fill {
            self.fill = fill;
        }
        if let Some(extend_left) = patch.extend_left {
            self.extend_left = extend_left;
        }
        if let Some(extend_right) = patch.extend_right {
            self.extend_right = extend_right;
        }
        if let Some(snap) = patch.snap {
            self.snap = snap;
        }
    }
}

/// Partial style for merge updates; `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct StylePatch {
    pub color: Option<Rgba>,
    pub stroke_width: Option<f64>,
    pub pattern: Option<StrokePattern>,
    /// `Some(None)` clears the fill.
    pub fill: Option<Option<Rgba>>,
    pub extend_left: Option<bool>,
    pub extend_right: Option<bool>,
    pub snap: Option<bool>,
}

impl From<ToolStyle> for StylePatch {
    fn from(style: ToolStyle) -> Self {
        Self {
            color: Some(style.color),
            stroke_width: Some(style.stroke_width),
            pattern: Some(style.pattern),
            fill: Some(style.fill),
            extend_left: Some(style.extend_left),
            extend_right: Some(style.extend_right),
            snap: Some(style.snap),
        }
    }
}

/// Default style per tool kind plus named presets.
#[derive(Resource)]
pub struct StyleProvider {
    line_default: ToolStyle,
    rect_default: ToolStyle,
}

impl Default for StyleProvider {
    fn default() -> Self {
        Self {
            line_default: ToolStyle::line_default(),
            rect_default: ToolStyle::rect_default(),
        }
    }
}

impl StyleProvider {
    pub fn default_for(&self, kind: AnnotationKind) -> ToolStyle {
        match kind {
            AnnotationKind::Line => self.line_default,
            AnnotationKind::Rect => self.rect_default,
        }
    }

    pub fn set_default(&mut self, kind: AnnotationKind, style: ToolStyle) {
        match kind {
            AnnotationKind::Line => self.line_default = style,
            AnnotationKind::Rect => self.rect_default = style,
        }
    }

    pub fn preset_names(kind: AnnotationKind) -> &'static [&'static str] {
        match kind {
            AnnotationKind::Line => &["trend", "support"],
            AnnotationKind::Rect => &["highlight", "zone"],
        }
    }

    pub fn preset(kind: AnnotationKind, name: &str) -> Option<ToolStyle> {
        let style = match (kind, name) {
            (AnnotationKind::Line, "trend") => ToolStyle {
                color: Rgba::rgb8(0xff, 0x44, 0x44),
                stroke_width: 2.0,
                extend_left: true,
                extend_right: true,
                ..ToolStyle::line_default()
            },
            (AnnotationKind::Line, "support") => ToolStyle {
                color: Rgba::rgb8(0x4c, 0xaf, 0x50),
                pattern: StrokePattern::Dashed,
                ..ToolStyle::line_default()
            },
            (AnnotationKind::Rect, "highlight") => {
                let amber = Rgba::rgb8(0xff, 0xc1, 0x07);
                ToolStyle {
                    color: amber,
                    fill: Some(amber.with_alpha(0.3)),
                    pattern: StrokePattern::Dashed,
                    stroke_width: 2.0,
                    ..ToolStyle::rect_default()
                }
            }
            (AnnotationKind::Rect, "zone") => {
                let purple = Rgba::rgb8(0x9c, 0x27, 0xb0);
                ToolStyle {
                    color: purple,
                    fill: Some(purple.with_alpha(0.1)),
                    pattern: StrokePattern::Dotted,
                    ..ToolStyle::rect_default()
                }
            }
            _ => return None,
        };
        Some(style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_merges_only_set_fields() {
        let mut style = ToolStyle::line_default();
        let original_color = style.color;

        style.apply(&StylePatch {
            stroke_width: Some(3.0),
            ..Default::default()
        });

        assert_eq!(style.stroke_width, 3.0);
        assert_eq!(style.color, original_color);
    }

    #[test]
    fn test_patch_can_clear_fill() {
        let mut style = ToolStyle::rect_default();
        assert!(style.fill.is_some());

        style.apply(&StylePatch {
            fill: Some(None),
            ..Default::default()
        });
        assert!(style.fill.is_none());
    }

    #[test]
    fn test_every_preset_name_resolves() {
        for kind in [AnnotationKind::Line, AnnotationKind::Rect] {
            for name in StyleProvider::preset_names(kind) {
                assert!(
                    StyleProvider::preset(kind, name).is_some(),
                    "missing preset {name}"
                );
            }
        }
    }

    #[test]
    fn test_unknown_preset_is_none() {
        assert!(StyleProvider::preset(AnnotationKind::Line, "nope").is_none());
    }

    #[test]
    fn test_provider_defaults_are_per_kind() {
        let mut provider = StyleProvider::default();
        assert!(provider.default_for(AnnotationKind::Rect).fill.is_some());
        assert!(provider.default_for(AnnotationKind::Line).fill.is_none());

        let mut custom = ToolStyle::line_default();
        custom.stroke_width = 4.0;
        provider.set_default(AnnotationKind::Line, custom);
        assert_eq!(provider.default_for(AnnotationKind::Line).stroke_width, 4.0);
        // Rect default untouched.
        assert_eq!(provider.default_for(AnnotationKind::Rect).stroke_width, 1.0);
    }

    #[test]
    fn test_dash_lengths() {
        assert!(StrokePattern::Solid.dash_lengths().is_none());
        assert_eq!(StrokePattern::Dashed.dash_lengths(), Some((5.0, 5.0)));
        assert_eq!(StrokePattern::Dotted.dash_lengths(), Some((2.0, 2.0)));
    }
}

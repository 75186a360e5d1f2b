//! Draw-command production: the stateless renderer.
//!
//! [`produce_draw_commands`] is a pure function from (kind, pixel anchors,
//! style, surface) to commands in device-pixel (bitmap) coordinates. The
//! Bevy glue executes the commands; nothing here touches the screen.

use super::anchor::PixelPoint;
use super::annotation::AnnotationKind;
use super::style::{Rgba, ToolStyle};

/// Endpoint marker radius in CSS pixels.
const MARKER_RADIUS: f64 = 4.0;

/// Drawing surface description, in CSS pixels plus the device pixel ratio.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceInfo {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
}

/// One primitive to paint, in bitmap coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Stroked polyline pieces (dash segmentation already applied).
    Stroke {
        segments: Vec<(PixelPoint, PixelPoint)>,
        color: Rgba,
        width: f64,
    },
    /// Filled axis-aligned rectangle.
    FillRect {
        min: PixelPoint,
        max: PixelPoint,
        color: Rgba,
    },
    /// Filled endpoint dot.
    Marker {
        center: PixelPoint,
        radius: f64,
        color: Rgba,
    },
}

/// Split a segment into on/off dash pieces. `on`/`off` are bitmap lengths.
pub fn dash_segments(
    a: PixelPoint,
    b: PixelPoint,
    on: f64,
    off: f64,
) -> Vec<(PixelPoint, PixelPoint)> {
    let length = a.distance(b);
    if length < 1e-9 || on <= 0.0 {
        return vec![(a, b)];
    }

    let dx = (b.x - a.x) / length;
    let dy = (b.y - a.y) / length;
    let mut pieces = Vec::new();
    let mut cursor = 0.0;
    while cursor < length {
        let end = (cursor + on).min(length);
        pieces.push((
            PixelPoint::new(a.x + dx * cursor, a.y + dy * cursor),
            PixelPoint::new(a.x + dx * end, a.y + dy * end),
        ));
        cursor = end + off;
    }
    pieces
}

/// Extend a segment to the left/right canvas boundaries along its own line.
/// A vertical segment extends to the top/bottom instead.
pub fn extend_to_bounds(
    a: PixelPoint,
    b: PixelPoint,
    width: f64,
    height: f64,
    left: bool,
    right: bool,
) -> (PixelPoint, PixelPoint) {
    let (mut lo, mut hi) = if a.x <= b.x { (a, b) } else { (b, a) };

    if (hi.x - lo.x).abs() < 1e-9 {
        // Vertical: extension flags reach for the vertical bounds.
        let (mut top, mut bottom) = if a.y <= b.y { (a, b) } else { (b, a) };
        if left {
            top = PixelPoint::new(top.x, 0.0);
        }
        if right {
            bottom = PixelPoint::new(bottom.x, height);
        }
        return (top, bottom);
    }

    let slope = (hi.y - lo.y) / (hi.x - lo.x);
    if left {
        lo = PixelPoint::new(0.0, lo.y - slope * lo.x);
    }
    if right {
        hi = PixelPoint::new(width, hi.y + slope * (width - hi.x));
    }
    (lo, hi)
}

fn stroke(a: PixelPoint, b: PixelPoint, style: &ToolStyle, ratio: f64) -> DrawCommand {
    let segments = match style.pattern.dash_lengths() {
        Some((on, off)) => dash_segments(a, b, on * ratio, off * ratio),
        None => vec![(a, b)],
    };
    DrawCommand::Stroke {
        segments,
        color: style.color,
        width: style.stroke_width * ratio,
    }
}

/// Produce the commands for one annotation at its current pixel anchors.
/// Returns nothing when a cache holds non-finite values — a shape is never
/// painted from garbage coordinates.
pub fn produce_draw_commands(
    kind: AnnotationKind,
    start: PixelPoint,
    end: PixelPoint,
    style: &ToolStyle,
    surface: SurfaceInfo,
) -> Vec<DrawCommand> {
    if !start.is_finite() || !end.is_finite() {
        return Vec::new();
    }

    let ratio = surface.device_pixel_ratio;
    let a = start.scaled(ratio);
    let b = end.scaled(ratio);
    let mut commands = Vec::new();

    match kind {
        AnnotationKind::Line => {
            let (a, b) = if style.extend_left || style.extend_right {
                extend_to_bounds(
                    a,
                    b,
                    surface.width * ratio,
                    surface.height * ratio,
                    style.extend_left,
                    style.extend_right,
                )
            } else {
                (a, b)
            };
            commands.push(stroke(a, b, style, ratio));
            // Endpoint dots mark the true anchors even when extended.
            for center in [start.scaled(ratio), end.scaled(ratio)] {
                commands.push(DrawCommand::Marker {
                    center,
                    radius: MARKER_RADIUS * ratio,
                    color: style.color,
                });
            }
        }
        AnnotationKind::Rect => {
            let min = PixelPoint::new(a.x.min(b.x), a.y.min(b.y));
            let max = PixelPoint::new(a.x.max(b.x), a.y.max(b.y));
            if let Some(fill) = style.fill {
                commands.push(DrawCommand::FillRect {
                    min,
                    max,
                    color: fill,
                });
            }
            let corners = [
                PixelPoint::new(min.x, min.y),
                PixelPoint::new(max.x, min.y),
                PixelPoint::new(max.x, max.y),
                PixelPoint::new(min.x, max.y),
            ];
            for i in 0..4 {
                commands.push(stroke(corners[i], corners[(i + 1) % 4], style, ratio));
            }
        }
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::super::style::StrokePattern;
    use super::*;

    const SURFACE: SurfaceInfo = SurfaceInfo {
        width: 800.0,
        height: 600.0,
        device_pixel_ratio: 1.0,
    };

    fn p(x: f64, y: f64) -> PixelPoint {
        PixelPoint::new(x, y)
    }

    #[test]
    fn test_dash_segments_cover_on_lengths() {
        let pieces = dash_segments(p(0.0, 0.0), p(100.0, 0.0), 5.0, 5.0);
        assert_eq!(pieces.len(), 10);
        for (a, b) in &pieces {
            assert!((a.distance(*b) - 5.0).abs() < 1e-9);
        }
        // Pieces alternate with gaps: piece starts are 10 apart.
        assert!((pieces[1].0.x - pieces[0].0.x - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_dash_segments_solid_fallback() {
        let pieces = dash_segments(p(0.0, 0.0), p(100.0, 0.0), 0.0, 5.0);
        assert_eq!(pieces, vec![(p(0.0, 0.0), p(100.0, 0.0))]);
    }

    #[test]
    fn test_extend_right_reaches_boundary() {
        let (a, b) = extend_to_bounds(p(100.0, 100.0), p(300.0, 200.0), 800.0, 600.0, false, true);
        assert_eq!(a, p(100.0, 100.0));
        assert_eq!(b.x, 800.0);
        // Same slope carried through.
        assert!((b.y - 450.0).abs() < 1e-9);
    }

    #[test]
    fn test_extend_left_reaches_boundary() {
        let (a, b) = extend_to_bounds(p(100.0, 100.0), p(300.0, 200.0), 800.0, 600.0, true, false);
        assert_eq!(a.x, 0.0);
        assert!((a.y - 50.0).abs() < 1e-9);
        assert_eq!(b, p(300.0, 200.0));
    }

    #[test]
    fn test_extend_handles_reversed_point_order() {
        let (a, b) = extend_to_bounds(p(300.0, 200.0), p(100.0, 100.0), 800.0, 600.0, true, true);
        assert_eq!(a.x, 0.0);
        assert_eq!(b.x, 800.0);
    }

    #[test]
    fn test_line_commands_include_endpoint_markers() {
        let commands = produce_draw_commands(
            AnnotationKind::Line,
            p(10.0, 10.0),
            p(50.0, 50.0),
            &ToolStyle::line_default(),
            SURFACE,
        );
        let markers = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Marker { .. }))
            .count();
        assert_eq!(markers, 2);
    }

    #[test]
    fn test_rect_commands_fill_then_border() {
        let commands = produce_draw_commands(
            AnnotationKind::Rect,
            p(50.0, 50.0),
            p(10.0, 10.0),
            &ToolStyle::rect_default(),
            SURFACE,
        );
        // Fill first (under the border), then four edges.
        let DrawCommand::FillRect { min, max, .. } = &commands[0] else {
            panic!("expected fill first");
        };
        assert_eq!(*min, p(10.0, 10.0));
        assert_eq!(*max, p(50.0, 50.0));
        let strokes = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Stroke { .. }))
            .count();
        assert_eq!(strokes, 4);
    }

    #[test]
    fn test_device_pixel_ratio_scales_everything() {
        let surface = SurfaceInfo {
            device_pixel_ratio: 2.0,
            ..SURFACE
        };
        let commands = produce_draw_commands(
            AnnotationKind::Line,
            p(10.0, 10.0),
            p(50.0, 10.0),
            &ToolStyle::line_default(),
            surface,
        );
        let DrawCommand::Stroke { segments, width, .. } = &commands[0] else {
            panic!("expected stroke");
        };
        assert_eq!(segments[0].0, p(20.0, 20.0));
        assert_eq!(*width, 2.0);
    }

    #[test]
    fn test_dotted_style_splits_stroke() {
        let mut style = ToolStyle::line_default();
        style.pattern = StrokePattern::Dotted;
        let commands = produce_draw_commands(
            AnnotationKind::Line,
            p(0.0, 0.0),
            p(100.0, 0.0),
            &style,
            SURFACE,
        );
        let DrawCommand::Stroke { segments, .. } = &commands[0] else {
            panic!("expected stroke");
        };
        assert!(segments.len() > 1);
    }

    #[test]
    fn test_non_finite_anchor_produces_nothing() {
        let commands = produce_draw_commands(
            AnnotationKind::Line,
            p(f64::NAN, 10.0),
            p(50.0, 50.0),
            &ToolStyle::line_default(),
            SURFACE,
        );
        assert!(commands.is_empty());
    }
}

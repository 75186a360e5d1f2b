//! Pure geometry primitives used by hit testing.
//!
//! All functions are deterministic given identical floating-point inputs and
//! have no side effects.

use super::anchor::PixelPoint;

/// Distance from a point to a line segment, via projection onto the segment
/// clamped to its endpoints. A degenerate segment (`a == b`) reduces to
/// plain point distance.
pub fn distance_point_to_segment(p: PixelPoint, a: PixelPoint, b: PixelPoint) -> f64 {
    let seg_x = b.x - a.x;
    let seg_y = b.y - a.y;
    let len_sq = seg_x * seg_x + seg_y * seg_y;

    if len_sq < 1e-12 {
        return p.distance(a);
    }

    let t = (((p.x - a.x) * seg_x + (p.y - a.y) * seg_y) / len_sq).clamp(0.0, 1.0);
    let projection = PixelPoint::new(a.x + t * seg_x, a.y + t * seg_y);
    p.distance(projection)
}

/// Distance from a point to the axis-aligned box spanned by `a` and `b`.
/// Zero for points inside the box, otherwise the distance to the nearest
/// border point.
pub fn distance_point_to_rect(p: PixelPoint, a: PixelPoint, b: PixelPoint) -> f64 {
    let left = a.x.min(b.x);
    let right = a.x.max(b.x);
    let top = a.y.min(b.y);
    let bottom = a.y.max(b.y);

    let clamped = PixelPoint::new(p.x.clamp(left, right), p.y.clamp(top, bottom));
    p.distance(clamped)
}

/// Inside-or-near-border test for the axis-aligned box spanned by `a` and
/// `b`: true inside the box, or within `tolerance` of an edge while
/// laterally within the perpendicular span of that edge.
pub fn point_near_rect(p: PixelPoint, a: PixelPoint, b: PixelPoint, tolerance: f64) -> bool {
    let left = a.x.min(b.x);
    let right = a.x.max(b.x);
    let top = a.y.min(b.y);
    let bottom = a.y.max(b.y);

    if p.x >= left && p.x <= right && p.y >= top && p.y <= bottom {
        return true;
    }

    let near_horizontal = (p.y >= top - tolerance && p.y <= top + tolerance)
        || (p.y >= bottom - tolerance && p.y <= bottom + tolerance);
    let near_vertical = (p.x >= left - tolerance && p.x <= left + tolerance)
        || (p.x >= right - tolerance && p.x <= right + tolerance);

    (p.x >= left && p.x <= right && near_horizontal)
        || (p.y >= top && p.y <= bottom && near_vertical)
}

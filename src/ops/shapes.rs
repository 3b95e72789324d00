use crate::canvas::{Color, PixelBuffer, PixelRect};

/// End-cap (and join) style of a stroked segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CapStyle {
    /// Half-disc past each endpoint; consecutive segments join round.
    #[default]
    Round,
    /// Half-square past each endpoint.
    Square,
    /// Stops exactly at the endpoints.
    Flat,
}

impl CapStyle {
    pub fn label(&self) -> &'static str {
        match self {
            CapStyle::Round => "Round",
            CapStyle::Square => "Square",
            CapStyle::Flat => "Flat",
        }
    }

    pub fn from_name(name: &str) -> Option<CapStyle> {
        match name.to_ascii_lowercase().as_str() {
            "round" => Some(CapStyle::Round),
            "square" => Some(CapStyle::Square),
            "flat" | "butt" => Some(CapStyle::Flat),
            _ => None,
        }
    }
}

/// Live-previewed shape primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Line,
    Rectangle,
    Circle,
}

// ============================================================================
// SDF functions - return signed distance (negative = inside)
// ============================================================================

/// SDF for a box centred at origin with half-extents (hx, hy).
#[inline]
fn sdf_box(px: f32, py: f32, hx: f32, hy: f32) -> f32 {
    let dx = px.abs() - hx;
    let dy = py.abs() - hy;
    let outside = (dx.max(0.0) * dx.max(0.0) + dy.max(0.0) * dy.max(0.0)).sqrt();
    let inside = dx.max(dy).min(0.0);
    outside + inside
}

/// Distance to the segment a→b (degenerates to point distance when a == b).
#[inline]
fn sdf_line_segment(px: f32, py: f32, ax: f32, ay: f32, bx: f32, by: f32) -> f32 {
    let dx = bx - ax;
    let dy = by - ay;
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let cx = ax + t * dx;
    let cy = ay + t * dy;
    ((px - cx) * (px - cx) + (py - cy) * (py - cy)).sqrt()
}

/// Segment coverage with square or flat caps: project onto the segment
/// axis and compare both the along-axis and perpendicular offsets.
#[inline]
fn inside_boxed_segment(px: f32, py: f32, a: (f32, f32), b: (f32, f32), half: f32, extend: f32) -> bool {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let len = (dx * dx + dy * dy).sqrt();
    if len < 1e-6 {
        // Zero-length: a square dot for square caps, nothing for flat ones.
        return extend > 0.0 && (px - a.0).abs() <= half && (py - a.1).abs() <= half;
    }
    let ux = dx / len;
    let uy = dy / len;
    let rx = px - a.0;
    let ry = py - a.1;
    let along = rx * ux + ry * uy;
    let perp = (rx * -uy + ry * ux).abs();
    along >= -extend && along <= len + extend && perp <= half
}

/// Bounding rect of a segment padded by the stroke half-width.
fn segment_bounds(a: (i32, i32), b: (i32, i32), half: f32) -> PixelRect {
    // Square caps reach half·√2 past a diagonal endpoint.
    let pad = ((half * std::f32::consts::SQRT_2).ceil() as i32).saturating_add(1);
    PixelRect::new(
        a.0.min(b.0).saturating_sub(pad),
        a.1.min(b.1).saturating_sub(pad),
        a.0.max(b.0).saturating_add(pad).saturating_add(1),
        a.1.max(b.1).saturating_add(pad).saturating_add(1),
    )
}

/// Visit every in-surface pixel of `rect`, writing `color` where `inside`
/// holds.  Returns the rect of pixels actually written (empty if none).
fn paint_where<F>(buffer: &mut PixelBuffer, rect: PixelRect, color: Color, inside: F) -> PixelRect
where
    F: Fn(f32, f32) -> bool,
{
    let r = rect.clamp_to(buffer.width(), buffer.height());
    let mut touched = PixelRect::new(0, 0, 0, 0);
    for y in r.min_y..r.max_y {
        for x in r.min_x..r.max_x {
            if inside(x as f32, y as f32) && buffer.put_clipped(x, y, color) {
                touched = touched.union(&PixelRect::new(x, y, x + 1, y + 1));
            }
        }
    }
    touched
}

// ============================================================================
// Public rasterizers
// ============================================================================

/// Stroke the segment a→b with `width` pixels and the given cap style.
/// Integer points address pixel centres; hard edges, no anti-aliasing.
pub fn stroke_segment(
    buffer: &mut PixelBuffer,
    a: (i32, i32),
    b: (i32, i32),
    width: u32,
    cap: CapStyle,
    color: Color,
) -> PixelRect {
    let half = width.max(1) as f32 * 0.5;
    let bounds = segment_bounds(a, b, half);
    let af = (a.0 as f32, a.1 as f32);
    let bf = (b.0 as f32, b.1 as f32);
    match cap {
        CapStyle::Round => paint_where(buffer, bounds, color, |x, y| {
            sdf_line_segment(x, y, af.0, af.1, bf.0, bf.1) <= half
        }),
        CapStyle::Square => paint_where(buffer, bounds, color, |x, y| {
            inside_boxed_segment(x, y, af, bf, half, half)
        }),
        CapStyle::Flat => paint_where(buffer, bounds, color, |x, y| {
            inside_boxed_segment(x, y, af, bf, half, 0.0)
        }),
    }
}

/// Outline of the axis-aligned rectangle spanning corners `a` and `b`.
pub fn rectangle_outline(
    buffer: &mut PixelBuffer,
    a: (i32, i32),
    b: (i32, i32),
    width: u32,
    color: Color,
) -> PixelRect {
    let half = width.max(1) as f32 * 0.5;
    let (ax, ay) = (a.0 as f32, a.1 as f32);
    let (bx, by) = (b.0 as f32, b.1 as f32);
    let cx = (ax + bx) * 0.5;
    let cy = (ay + by) * 0.5;
    let hx = (ax - bx).abs() * 0.5;
    let hy = (ay - by).abs() * 0.5;
    let bounds = segment_bounds(a, b, half);
    paint_where(buffer, bounds, color, |x, y| {
        sdf_box(x - cx, y - cy, hx, hy).abs() <= half
    })
}

/// Circle centred on `center` passing through `edge`.
pub fn circle_outline(
    buffer: &mut PixelBuffer,
    center: (i32, i32),
    edge: (i32, i32),
    width: u32,
    color: Color,
) -> PixelRect {
    let half = width.max(1) as f32 * 0.5;
    let cx = center.0 as f32;
    let cy = center.1 as f32;
    let dx = edge.0 as f32 - cx;
    let dy = edge.1 as f32 - cy;
    let radius = (dx * dx + dy * dy).sqrt();
    let reach = (radius + half).ceil() as i32 + 1;
    let bounds = PixelRect::around(center.0, center.1, reach);
    paint_where(buffer, bounds, color, |x, y| {
        let d = ((x - cx) * (x - cx) + (y - cy) * (y - cy)).sqrt();
        (d - radius).abs() <= half
    })
}

/// Rasterize a whole shape from its fixed start point to `end`.
pub fn rasterize_shape(
    buffer: &mut PixelBuffer,
    kind: ShapeKind,
    start: (i32, i32),
    end: (i32, i32),
    width: u32,
    cap: CapStyle,
    color: Color,
) -> PixelRect {
    match kind {
        ShapeKind::Line => stroke_segment(buffer, start, end, width, cap, color),
        ShapeKind::Rectangle => rectangle_outline(buffer, start, end, width, color),
        ShapeKind::Circle => circle_outline(buffer, start, end, width, color),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BLACK, TRANSPARENT};

    fn blank(w: u32, h: u32) -> PixelBuffer {
        PixelBuffer::new(w, h).unwrap()
    }

    #[test]
    fn one_pixel_square_cap_vertical_line() {
        let mut buf = blank(100, 100);
        let rect = stroke_segment(&mut buf, (10, 10), (10, 50), 1, CapStyle::Square, BLACK);
        assert_eq!(rect, PixelRect::new(10, 10, 11, 51));
        for y in 10..=50 {
            assert_eq!(buf.get(10, y).unwrap(), BLACK);
        }
        assert_eq!(buf.count_color(BLACK), 41);
    }

    #[test]
    fn flat_cap_stops_at_endpoints_and_square_cap_extends() {
        let mut flat = blank(40, 20);
        stroke_segment(&mut flat, (10, 10), (20, 10), 5, CapStyle::Flat, BLACK);
        assert_eq!(flat.get(9, 10).unwrap(), TRANSPARENT);
        assert_eq!(flat.get(10, 10).unwrap(), BLACK);

        let mut square = blank(40, 20);
        stroke_segment(&mut square, (10, 10), (20, 10), 5, CapStyle::Square, BLACK);
        assert_eq!(square.get(8, 10).unwrap(), BLACK);
        assert_eq!(square.get(8, 12).unwrap(), BLACK);
        assert_eq!(square.get(7, 10).unwrap(), TRANSPARENT);
    }

    #[test]
    fn round_dot_is_a_disc() {
        let mut buf = blank(20, 20);
        stroke_segment(&mut buf, (10, 10), (10, 10), 6, CapStyle::Round, BLACK);
        assert_eq!(buf.get(13, 10).unwrap(), BLACK);
        assert_eq!(buf.get(10, 7).unwrap(), BLACK);
        // Corner of the bounding square is outside the disc.
        assert_eq!(buf.get(13, 13).unwrap(), TRANSPARENT);
    }

    #[test]
    fn strokes_are_clipped_to_the_surface() {
        let mut buf = blank(10, 10);
        let rect = stroke_segment(&mut buf, (-20, 5), (30, 5), 3, CapStyle::Round, BLACK);
        assert_eq!(rect, PixelRect::new(0, 4, 10, 7));
        assert_eq!(buf.count_color(BLACK), 30);
    }

    #[test]
    fn rectangle_outline_leaves_interior_empty() {
        let mut buf = blank(30, 30);
        rectangle_outline(&mut buf, (20, 20), (5, 5), 1, BLACK);
        assert_eq!(buf.get(5, 12).unwrap(), BLACK);
        assert_eq!(buf.get(20, 5).unwrap(), BLACK);
        assert_eq!(buf.get(12, 20).unwrap(), BLACK);
        assert_eq!(buf.get(12, 12).unwrap(), TRANSPARENT);
        assert_eq!(buf.get(4, 12).unwrap(), TRANSPARENT);
    }

    #[test]
    fn circle_outline_passes_through_edge_point() {
        let mut buf = blank(50, 50);
        circle_outline(&mut buf, (25, 25), (35, 25), 1, BLACK);
        assert_eq!(buf.get(35, 25).unwrap(), BLACK);
        assert_eq!(buf.get(15, 25).unwrap(), BLACK);
        assert_eq!(buf.get(25, 15).unwrap(), BLACK);
        assert_eq!(buf.get(25, 25).unwrap(), TRANSPARENT);
    }

    #[test]
    fn extreme_endpoints_are_clipped_without_overflow() {
        let mut buf = blank(20, 10);
        let rect = stroke_segment(&mut buf, (5, 5), (i32::MAX, 5), 1, CapStyle::Round, BLACK);
        assert_eq!(rect, PixelRect::new(5, 5, 20, 6));
        assert_eq!(buf.get(19, 5).unwrap(), BLACK);
        assert_eq!(buf.get(10, 6).unwrap(), TRANSPARENT);

        let mut buf = blank(20, 10);
        let far = (i32::MAX, i32::MAX);
        assert!(rasterize_shape(&mut buf, ShapeKind::Circle, (5, 5), far, 3, CapStyle::Round, BLACK).is_empty());
        let rect = rasterize_shape(&mut buf, ShapeKind::Rectangle, (i32::MIN, i32::MIN), far, 3, CapStyle::Round, BLACK);
        assert!(rect.is_empty());
        let rect = rasterize_shape(&mut buf, ShapeKind::Line, (i32::MIN, 2), (i32::MAX, 2), 1, CapStyle::Flat, BLACK);
        assert_eq!(rect, PixelRect::new(0, 2, 20, 3));
        assert_eq!(buf.count_color(BLACK), 20);
    }

    #[test]
    fn cap_names_parse() {
        assert_eq!(CapStyle::from_name("SQUARE"), Some(CapStyle::Square));
        assert_eq!(CapStyle::from_name("butt"), Some(CapStyle::Flat));
        assert_eq!(CapStyle::from_name("mitre"), None);
    }
}

use image::Rgba;

use crate::canvas::{BLACK, Color, PixelBuffer, PixelRect, WHITE};
use crate::error::PaintResult;
use crate::ops::shapes::{self, CapStyle, ShapeKind};
use crate::ops::text::TextStyle;

/// Stamp glyph used until the user picks another.
pub const DEFAULT_STAMP_GLYPH: char = '🐱';

/// Largest brush size accepted from the UI, settings or scripts.
pub const MAX_BRUSH_SIZE: u32 = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tool {
    Pencil,
    #[default]
    Brush,
    Eraser,
    Line,
    Rectangle,
    Circle,
    Fill,
    Stamp,
    Text,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Pencil => "Pencil",
            Tool::Brush => "Brush",
            Tool::Eraser => "Eraser",
            Tool::Line => "Line",
            Tool::Rectangle => "Rectangle",
            Tool::Circle => "Circle",
            Tool::Fill => "Fill",
            Tool::Stamp => "Stamp",
            Tool::Text => "Text",
        }
    }

    pub fn all() -> &'static [Tool] {
        &[
            Tool::Pencil,
            Tool::Brush,
            Tool::Eraser,
            Tool::Line,
            Tool::Rectangle,
            Tool::Circle,
            Tool::Fill,
            Tool::Stamp,
            Tool::Text,
        ]
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        let name = name.to_ascii_lowercase();
        match name.as_str() {
            "emoji" | "emoji-stamp" | "emoji_stamp" => Some(Tool::Stamp),
            "ellipse" => Some(Tool::Circle),
            "rect" => Some(Tool::Rectangle),
            "bucket" => Some(Tool::Fill),
            _ => Tool::all()
                .iter()
                .copied()
                .find(|t| t.label().eq_ignore_ascii_case(&name)),
        }
    }

    /// Shape primitive for shape tools.
    pub fn shape(&self) -> Option<ShapeKind> {
        match self {
            Tool::Line => Some(ShapeKind::Line),
            Tool::Rectangle => Some(ShapeKind::Rectangle),
            Tool::Circle => Some(ShapeKind::Circle),
            _ => None,
        }
    }

    /// Freehand tools accumulate a point list.
    pub fn is_freehand(&self) -> bool {
        matches!(self, Tool::Pencil | Tool::Brush | Tool::Eraser)
    }

    /// Tools that run a drag gesture through the [`StrokeRenderer`].
    pub fn uses_renderer(&self) -> bool {
        self.is_freehand() || self.shape().is_some()
    }

    /// Stroke width for a brush size.  The pencil is deliberately thinner.
    pub fn stroke_width(&self, size: u32) -> u32 {
        match self {
            Tool::Pencil => (size / 5).max(1),
            _ => size.max(1),
        }
    }

    /// Cap style for this tool; only the line tool honours the user's choice.
    pub fn cap_style(&self, requested: CapStyle) -> CapStyle {
        match self {
            Tool::Pencil => CapStyle::Square,
            Tool::Brush | Tool::Eraser => CapStyle::Round,
            _ => requested,
        }
    }
}

/// Which pointer button started a gesture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
}

/// Current tool selection and style, polled by the engine at gesture start
/// and at every preview update.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolState {
    pub tool: Tool,
    /// Brush size in pixels, within `1..=MAX_BRUSH_SIZE`.
    pub size: u32,
    /// Gesture opacity in [0, 1], applied when compositing.
    pub opacity: f32,
    pub foreground: Color,
    pub background: Color,
    pub font_family: String,
    pub bold: bool,
    pub italic: bool,
    pub line_cap: CapStyle,
    pub stamp_glyph: char,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            tool: Tool::Brush,
            size: 2,
            opacity: 1.0,
            foreground: BLACK,
            background: WHITE,
            font_family: "DejaVu Sans".to_string(),
            bold: false,
            italic: false,
            line_cap: CapStyle::Round,
            stamp_glyph: DEFAULT_STAMP_GLYPH,
        }
    }
}

impl ToolState {
    pub fn set_size(&mut self, size: u32) {
        self.size = size.clamp(1, MAX_BRUSH_SIZE);
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            1.0
        };
    }

    /// Paint colour for a gesture: primary → foreground, secondary →
    /// background.  The eraser always paints with the background colour.
    pub fn color_for(&self, button: PointerButton) -> Color {
        if self.tool == Tool::Eraser {
            return self.background;
        }
        match button {
            PointerButton::Primary => self.foreground,
            PointerButton::Secondary => self.background,
        }
    }

    /// Text style at the current brush size.
    pub fn text_style(&self, color: Color) -> TextStyle {
        TextStyle {
            font_size: self.size as f32,
            color,
            bold: self.bold,
            italic: self.italic,
        }
    }

    /// Stamp glyphs scale with the brush size.
    pub fn stamp_style(&self, color: Color) -> TextStyle {
        TextStyle {
            font_size: self.size.saturating_mul(4) as f32,
            ..self.text_style(color)
        }
    }
}

// ============================================================================
// STROKE + GESTURE
// ============================================================================

/// Freehand stroke: lives for one pointer-down → pointer-up gesture.
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    pub tool: Tool,
    pub points: Vec<(i32, i32)>,
    pub color: Color,
    pub width: u32,
    pub cap: CapStyle,
}

/// Per-gesture parameters, one variant per rendering strategy.
#[derive(Clone, Debug, PartialEq)]
pub enum GestureKind {
    /// Pencil / brush / eraser: drawn incrementally segment by segment.
    Freehand(Stroke),
    /// Line / rectangle / circle: redrawn whole from `start` on every move.
    /// Nothing is drawn while the pointer sits on `start`.
    Shape {
        kind: ShapeKind,
        start: (i32, i32),
        end: Option<(i32, i32)>,
        color: Color,
        width: u32,
        cap: CapStyle,
    },
}

/// What a finished gesture left on the scratch layer.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterDelta {
    pub tool: Tool,
    /// Pixels painted on the scratch layer (empty if nothing was drawn).
    pub bounds: PixelRect,
    pub stroke: Option<Stroke>,
}

/// Renders pointer gestures onto a transparent scratch layer the size of
/// the canvas.  Never touches the canonical surface.
pub struct StrokeRenderer {
    scratch: PixelBuffer,
    gesture: Option<(Tool, GestureKind)>,
    dirty: PixelRect,
}

impl StrokeRenderer {
    pub fn new(width: u32, height: u32) -> PaintResult<Self> {
        Ok(Self {
            scratch: PixelBuffer::new(width, height)?,
            gesture: None,
            dirty: PixelRect::new(0, 0, 0, 0),
        })
    }

    pub fn is_active(&self) -> bool {
        self.gesture.is_some()
    }

    /// Start a gesture.  Returns `false` (and does nothing) for tools that
    /// do not draw through the scratch layer.
    pub fn begin(
        &mut self,
        tool: Tool,
        point: (i32, i32),
        color: Color,
        size: u32,
        cap: CapStyle,
    ) -> bool {
        if !tool.uses_renderer() {
            return false;
        }
        self.cancel();
        let width = tool.stroke_width(size);
        let cap = tool.cap_style(cap);

        let kind = match tool.shape() {
            Some(kind) => GestureKind::Shape {
                kind,
                start: point,
                end: None,
                color,
                width,
                cap,
            },
            None => {
                self.dirty = shapes::stroke_segment(&mut self.scratch, point, point, width, cap, color);
                GestureKind::Freehand(Stroke {
                    tool,
                    points: vec![point],
                    color,
                    width,
                    cap,
                })
            }
        };
        self.gesture = Some((tool, kind));
        true
    }

    /// Feed the next pointer position.  Returns the region repainted.
    pub fn extend(&mut self, point: (i32, i32)) -> PixelRect {
        let Some((_, kind)) = self.gesture.as_mut() else {
            return PixelRect::new(0, 0, 0, 0);
        };
        match kind {
            GestureKind::Freehand(stroke) => {
                let last = stroke.points.last().copied().unwrap_or(point);
                if last == point {
                    return PixelRect::new(0, 0, 0, 0);
                }
                stroke.points.push(point);
                let rect = shapes::stroke_segment(
                    &mut self.scratch,
                    last,
                    point,
                    stroke.width,
                    stroke.cap,
                    stroke.color,
                );
                self.dirty = self.dirty.union(&rect);
                rect
            }
            GestureKind::Shape {
                kind,
                start,
                end,
                color,
                width,
                cap,
            } => {
                // Shapes are never committed incrementally: wipe the last
                // preview and redraw the whole shape.
                let previous = self.dirty;
                self.scratch.clear_rect(previous);
                *end = Some(point);
                if point == *start {
                    self.dirty = PixelRect::new(0, 0, 0, 0);
                    return previous;
                }
                let rect = shapes::rasterize_shape(&mut self.scratch, *kind, *start, point, *width, *cap, *color);
                self.dirty = rect;
                previous.union(&rect)
            }
        }
    }

    /// Scratch layer for compositing.
    pub fn preview_frame(&self) -> &PixelBuffer {
        &self.scratch
    }

    pub fn scratch_mut(&mut self) -> &mut PixelBuffer {
        &mut self.scratch
    }

    /// Finish the gesture.  The scratch layer keeps its pixels until the
    /// caller bakes (and thereby clears) it.
    pub fn end(&mut self) -> Option<RasterDelta> {
        let (tool, kind) = self.gesture.take()?;
        let bounds = std::mem::replace(&mut self.dirty, PixelRect::new(0, 0, 0, 0));
        let stroke = match kind {
            GestureKind::Freehand(stroke) => Some(stroke),
            GestureKind::Shape { .. } => None,
        };
        Some(RasterDelta { tool, bounds, stroke })
    }

    /// Abandon the gesture and wipe the scratch layer.
    pub fn cancel(&mut self) {
        self.gesture = None;
        self.dirty = PixelRect::new(0, 0, 0, 0);
        self.scratch.clear();
    }
}

/// Parse `r,g,b` or `r,g,b,a` (alpha defaults to opaque).
pub fn parse_color(s: &str) -> Option<Color> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let r = parts[0].parse::<u8>().ok()?;
    let g = parts[1].parse::<u8>().ok()?;
    let b = parts[2].parse::<u8>().ok()?;
    let a = match parts.get(3) {
        Some(a) => a.parse::<u8>().ok()?,
        None => 255,
    };
    Some(Rgba([r, g, b, a]))
}

/// Inverse of [`parse_color`].
pub fn color_to_str(c: Color) -> String {
    format!("{},{},{},{}", c[0], c[1], c[2], c[3])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::TRANSPARENT;

    #[test]
    fn pencil_is_thin_and_square() {
        assert_eq!(Tool::Pencil.stroke_width(4), 1);
        assert_eq!(Tool::Pencil.stroke_width(25), 5);
        assert_eq!(Tool::Brush.stroke_width(4), 4);
        assert_eq!(Tool::Pencil.cap_style(CapStyle::Round), CapStyle::Square);
        assert_eq!(Tool::Eraser.cap_style(CapStyle::Flat), CapStyle::Round);
        assert_eq!(Tool::Line.cap_style(CapStyle::Flat), CapStyle::Flat);
    }

    #[test]
    fn eraser_paints_with_background() {
        let mut state = ToolState {
            tool: Tool::Eraser,
            background: Rgba([10, 20, 30, 255]),
            ..ToolState::default()
        };
        assert_eq!(state.color_for(PointerButton::Primary), Rgba([10, 20, 30, 255]));
        state.tool = Tool::Brush;
        assert_eq!(state.color_for(PointerButton::Primary), BLACK);
        assert_eq!(state.color_for(PointerButton::Secondary), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn size_and_opacity_are_clamped() {
        let mut state = ToolState::default();
        state.set_size(0);
        assert_eq!(state.size, 1);
        state.set_size(2_000_000_000);
        assert_eq!(state.size, MAX_BRUSH_SIZE);
        assert_eq!(state.stamp_style(BLACK).font_size, (MAX_BRUSH_SIZE * 4) as f32);
        state.set_opacity(1.7);
        assert_eq!(state.opacity, 1.0);
        state.set_opacity(-0.2);
        assert_eq!(state.opacity, 0.0);
        state.set_opacity(f32::NAN);
        assert_eq!(state.opacity, 1.0);
    }

    #[test]
    fn tool_names_round_trip_through_labels() {
        for tool in Tool::all() {
            assert_eq!(Tool::from_name(tool.label()), Some(*tool));
        }
        assert_eq!(Tool::from_name("emoji-stamp"), Some(Tool::Stamp));
        assert_eq!(Tool::from_name("lasso"), None);
    }

    #[test]
    fn renderer_rejects_direct_tools() {
        let mut r = StrokeRenderer::new(10, 10).unwrap();
        assert!(!r.begin(Tool::Fill, (1, 1), BLACK, 3, CapStyle::Round));
        assert!(!r.begin(Tool::Text, (1, 1), BLACK, 3, CapStyle::Round));
        assert!(!r.is_active());
    }

    #[test]
    fn freehand_draws_incrementally() {
        let mut r = StrokeRenderer::new(100, 100).unwrap();
        assert!(r.begin(Tool::Pencil, (10, 10), BLACK, 4, CapStyle::Round));
        r.extend((10, 30));
        r.extend((10, 50));
        let delta = r.end().unwrap();
        let stroke = delta.stroke.unwrap();
        assert_eq!(stroke.points, vec![(10, 10), (10, 30), (10, 50)]);
        assert_eq!(stroke.width, 1);
        assert_eq!(delta.bounds, PixelRect::new(10, 10, 11, 51));
        assert_eq!(r.preview_frame().count_color(BLACK), 41);
        assert!(!r.is_active());
    }

    #[test]
    fn shapes_are_redrawn_from_the_start_point() {
        let mut r = StrokeRenderer::new(60, 60).unwrap();
        assert!(r.begin(Tool::Line, (5, 5), BLACK, 1, CapStyle::Round));
        // Nothing drawn until the pointer moves.
        assert!(r.preview_frame().is_uniform(TRANSPARENT));

        r.extend((50, 5));
        assert_eq!(r.preview_frame().get(40, 5).unwrap(), BLACK);

        r.extend((5, 50));
        // The earlier horizontal preview is gone; only the final line remains.
        assert_eq!(r.preview_frame().get(40, 5).unwrap(), TRANSPARENT);
        assert_eq!(r.preview_frame().get(5, 40).unwrap(), BLACK);
        assert_eq!(r.preview_frame().count_color(BLACK), 46);

        let delta = r.end().unwrap();
        assert!(delta.stroke.is_none());
        assert_eq!(delta.tool, Tool::Line);
    }

    #[test]
    fn cancel_wipes_the_scratch_layer() {
        let mut r = StrokeRenderer::new(20, 20).unwrap();
        r.begin(Tool::Brush, (5, 5), BLACK, 5, CapStyle::Round);
        r.extend((15, 15));
        r.cancel();
        assert!(r.preview_frame().is_uniform(TRANSPARENT));
        assert!(r.end().is_none());
    }

    #[test]
    fn colors_parse_with_optional_alpha() {
        assert_eq!(parse_color("255, 0, 0"), Some(Rgba([255, 0, 0, 255])));
        assert_eq!(parse_color("1,2,3,4"), Some(Rgba([1, 2, 3, 4])));
        assert_eq!(parse_color("1,2"), None);
        assert_eq!(parse_color("300,0,0"), None);
        assert_eq!(color_to_str(Rgba([1, 2, 3, 4])), "1,2,3,4");
    }
}

// ============================================================================
// TEXT TOOL - editable overlay baked on commit
// ============================================================================

use crate::canvas::{PixelBuffer, PixelRect};
use crate::components::tools::PointerButton;
use crate::ops::text::{GlyphSource, TextAnchor, TextStyle, draw_text_line};

/// Gap between the overlay anchor and the first glyph row / column.
pub const TEXT_PADDING: i32 = 2;
/// Line advance as a multiple of the font size.
pub const LINE_SPACING: f32 = 1.2;

/// Text being edited before it is baked into the canvas.
#[derive(Clone, Debug, PartialEq)]
pub struct TextOverlay {
    /// Top-left of the overlay box (the click point).
    pub anchor: (i32, i32),
    pub content: String,
    /// Button that opened the overlay; picks foreground or background.
    pub button: PointerButton,
    /// Offset from the anchor to the pointer while the box is being moved.
    drag_offset: Option<(i32, i32)>,
}

impl TextOverlay {
    pub fn new(anchor: (i32, i32), button: PointerButton) -> Self {
        Self {
            anchor,
            content: String::new(),
            button,
            drag_offset: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\r' {
            return;
        }
        self.content.push(ch);
    }

    pub fn newline(&mut self) {
        self.content.push('\n');
    }

    pub fn backspace(&mut self) {
        self.content.pop();
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.split('\n')
    }

    /// Top-left origin of line `index` at `font_size`.
    pub fn line_origin(&self, index: usize, font_size: f32) -> (f32, f32) {
        (
            self.anchor.0 as f32 + TEXT_PADDING as f32,
            self.anchor.1 as f32 + TEXT_PADDING as f32 + index as f32 * font_size * LINE_SPACING,
        )
    }

    /// Approximate box the overlay occupies, used for hit testing.  An empty
    /// overlay still has a clickable area one character wide.
    pub fn hit_box(&self, font_size: f32) -> PixelRect {
        let longest = self.lines().map(|l| l.chars().count()).max().unwrap_or(0).max(1);
        let line_count = self.lines().count().max(1);
        let w = (longest as f32 * font_size * 0.6).ceil() as i32 + TEXT_PADDING * 2;
        let h = (line_count as f32 * font_size * LINE_SPACING).ceil() as i32 + TEXT_PADDING * 2;
        PixelRect::new(
            self.anchor.0,
            self.anchor.1,
            self.anchor.0.saturating_add(w),
            self.anchor.1.saturating_add(h),
        )
    }

    pub fn contains(&self, x: i32, y: i32, font_size: f32) -> bool {
        self.hit_box(font_size).contains(x, y)
    }

    pub fn begin_drag(&mut self, x: i32, y: i32) {
        self.drag_offset = Some((x.saturating_sub(self.anchor.0), y.saturating_sub(self.anchor.1)));
    }

    /// Move the overlay so the grabbed point follows the pointer.
    pub fn drag_to(&mut self, x: i32, y: i32) -> bool {
        let Some((ox, oy)) = self.drag_offset else {
            return false;
        };
        self.anchor = (x.saturating_sub(ox), y.saturating_sub(oy));
        true
    }

    pub fn end_drag(&mut self) {
        self.drag_offset = None;
    }

    /// Rasterize every line onto `target` (normally the cleared scratch
    /// layer).  Returns the painted rect.
    pub fn render(&self, target: &mut PixelBuffer, source: &GlyphSource, style: &TextStyle) -> PixelRect {
        self.lines()
            .enumerate()
            .fold(PixelRect::new(0, 0, 0, 0), |acc, (i, line)| {
                let (x, y) = self.line_origin(i, style.font_size);
                acc.union(&draw_text_line(target, source, line, x, y, TextAnchor::Top, style))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BLACK, TRANSPARENT};

    fn style() -> TextStyle {
        TextStyle {
            font_size: 20.0,
            color: BLACK,
            bold: false,
            italic: false,
        }
    }

    fn overlay_with(text: &str) -> TextOverlay {
        let mut o = TextOverlay::new((5, 5), PointerButton::Primary);
        for ch in text.chars() {
            if ch == '\n' {
                o.newline();
            } else {
                o.insert_char(ch);
            }
        }
        o
    }

    #[test]
    fn lines_start_below_the_padded_anchor() {
        let o = overlay_with("hi\nbye");
        assert_eq!(o.line_origin(0, 20.0), (7.0, 7.0));
        assert_eq!(o.line_origin(1, 20.0), (7.0, 31.0));
    }

    #[test]
    fn render_places_each_line() {
        let o = overlay_with("hi\nbye");
        let mut scratch = PixelBuffer::new(120, 80).unwrap();
        let rect = o.render(&mut scratch, &GlyphSource::Blocks, &style());
        assert_eq!(rect.min_y, 7);
        assert_eq!(rect.max_y, 31 + 16);
        // Gap between the two lines stays empty.
        for x in 0..120 {
            assert_eq!(scratch.get(x, 27).unwrap(), TRANSPARENT);
        }
        assert_ne!(scratch.get(10, 31).unwrap(), TRANSPARENT);
    }

    #[test]
    fn editing_keys() {
        let mut o = overlay_with("ab");
        o.backspace();
        o.newline();
        o.insert_char('c');
        assert_eq!(o.content, "a\nc");
        o.backspace();
        o.backspace();
        o.backspace();
        assert!(o.is_empty());
        o.backspace();
        assert!(o.is_empty());
    }

    #[test]
    fn drag_moves_anchor_by_pointer_delta() {
        let mut o = overlay_with("hello");
        assert!(o.contains(8, 8, 20.0));
        assert!(!o.contains(200, 8, 20.0));
        o.begin_drag(8, 8);
        assert!(o.drag_to(18, 28));
        assert_eq!(o.anchor, (15, 25));
        o.end_drag();
        assert!(!o.drag_to(0, 0));
        assert_eq!(o.anchor, (15, 25));
    }

    #[test]
    fn extreme_anchor_and_drag_saturate() {
        let mut o = TextOverlay::new((i32::MAX, i32::MIN), PointerButton::Primary);
        o.insert_char('x');
        assert!(!o.contains(0, 0, 20.0));
        o.begin_drag(i32::MIN, i32::MAX);
        assert!(o.drag_to(i32::MAX, i32::MIN));
        assert_eq!(o.anchor, (i32::MAX, i32::MIN));
        let mut scratch = PixelBuffer::new(10, 10).unwrap();
        assert!(o.render(&mut scratch, &GlyphSource::Blocks, &style()).is_empty());
    }
}

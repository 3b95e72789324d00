use ab_glyph::{Font, FontArc, ScaleFont, point};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::canvas::{Color, PixelBuffer, PixelRect};
use crate::error::{PaintError, PaintResult};
use crate::{log_info, log_warn};

/// Horizontal shear applied to italic glyphs (x shift per pixel above baseline).
const ITALIC_SHEAR: f32 = 0.2;

/// Where a line of text is vertically anchored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAnchor {
    /// `y` is the top of the line box.
    Top,
    /// `y` is the alphabetic baseline.
    Baseline,
}

/// Style applied when rasterizing a run of text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub font_size: f32,
    pub color: Color,
    pub bold: bool,
    pub italic: bool,
}

/// Glyph provider.  `Blocks` needs no font data and is always available;
/// every non-whitespace character becomes a filled cell.
#[derive(Clone)]
pub enum GlyphSource {
    Font(FontArc),
    Blocks,
}

impl std::fmt::Debug for GlyphSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GlyphSource::Font(_) => f.write_str("GlyphSource::Font"),
            GlyphSource::Blocks => f.write_str("GlyphSource::Blocks"),
        }
    }
}

impl GlyphSource {
    /// Ascent above the baseline at `font_size`.
    pub fn ascent(&self, font_size: f32) -> f32 {
        match self {
            GlyphSource::Font(font) => font.as_scaled(font_size).ascent(),
            GlyphSource::Blocks => font_size * 0.8,
        }
    }
}

/// Write `color` with coverage `cov` into the scratch layer, keeping the
/// strongest coverage seen at each pixel.
#[inline]
fn put_coverage(buffer: &mut PixelBuffer, x: i32, y: i32, color: Color, cov: f32) -> bool {
    if cov <= 0.001 {
        return false;
    }
    let Ok(existing) = buffer.get(x, y) else {
        return false;
    };
    let a = (color[3] as f32 * cov.min(1.0)).round() as u8;
    if a <= existing[3] && existing[3] > 0 {
        return false;
    }
    buffer.put_clipped(x, y, image::Rgba([color[0], color[1], color[2], a]))
}

/// Rasterize one line of text at (`x`, `y`) onto `buffer`.
/// Returns the rect of pixels written.
pub fn draw_text_line(
    buffer: &mut PixelBuffer,
    source: &GlyphSource,
    text: &str,
    x: f32,
    y: f32,
    anchor: TextAnchor,
    style: &TextStyle,
) -> PixelRect {
    let baseline = match anchor {
        TextAnchor::Top => y + source.ascent(style.font_size),
        TextAnchor::Baseline => y,
    };
    match source {
        GlyphSource::Font(font) => draw_font_line(buffer, font, text, x, baseline, style),
        GlyphSource::Blocks => draw_block_line(buffer, text, x, baseline, style),
    }
}

fn draw_font_line(
    buffer: &mut PixelBuffer,
    font: &FontArc,
    text: &str,
    origin_x: f32,
    baseline: f32,
    style: &TextStyle,
) -> PixelRect {
    let scaled = font.as_scaled(style.font_size);
    let mut touched = PixelRect::new(0, 0, 0, 0);
    let mut cursor_x = origin_x;
    let mut last = None;

    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = last {
            cursor_x += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(style.font_size, point(cursor_x.round(), baseline.round()));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let b = outlined.px_bounds();
            outlined.draw(|px, py, cov| {
                let cy = b.min.y + py as f32;
                let mut cx = b.min.x + px as f32;
                if style.italic {
                    cx += (baseline - cy) * ITALIC_SHEAR;
                }
                let ix = cx.round() as i32;
                let iy = cy.round() as i32;
                if put_coverage(buffer, ix, iy, style.color, cov) {
                    touched = touched.union(&PixelRect::new(ix, iy, ix + 1, iy + 1));
                }
                if style.bold && put_coverage(buffer, ix.saturating_add(1), iy, style.color, cov) {
                    touched = touched.union(&PixelRect::new(ix + 1, iy, ix + 2, iy + 1));
                }
            });
        }
        cursor_x += scaled.h_advance(id);
        last = Some(id);
    }
    touched
}

fn draw_block_line(
    buffer: &mut PixelBuffer,
    text: &str,
    origin_x: f32,
    baseline: f32,
    style: &TextStyle,
) -> PixelRect {
    let size = style.font_size.max(1.0);
    let advance = size * 0.6;
    let inset = (size * 0.05).max(1.0);
    let (w, h) = (buffer.width() as i32, buffer.height() as i32);
    let top = ((baseline - size * 0.8).round() as i32).clamp(0, h);
    let bottom = (baseline.round() as i32).clamp(0, h);
    let mut touched = PixelRect::new(0, 0, 0, 0);

    for (i, ch) in text.chars().enumerate() {
        if ch.is_whitespace() {
            continue;
        }
        let left = origin_x + i as f32 * advance + inset;
        let mut right = origin_x + (i + 1) as f32 * advance - inset;
        if style.bold {
            right += inset;
        }
        for py in top..bottom {
            let shear = if style.italic {
                (baseline - py as f32) * ITALIC_SHEAR
            } else {
                0.0
            };
            let x0 = (left + shear).round() as i32;
            let x1 = ((right + shear).round() as i32).max(x0.saturating_add(1));
            for px in x0.clamp(0, w)..x1.clamp(0, w) {
                if buffer.put_clipped(px, py, style.color) {
                    touched = touched.union(&PixelRect::new(px, py, px + 1, py + 1));
                }
            }
        }
    }
    touched
}

// ============================================================================
// FONT DISCOVERY
// ============================================================================

/// Load a `.ttf` / `.otf` file.
pub fn load_font_file(path: &Path) -> PaintResult<FontArc> {
    let bytes = std::fs::read(path)?;
    FontArc::try_from_vec(bytes)
        .map_err(|e| PaintError::font(format!("{}: {}", path.display(), e)))
}

/// Lowercase alphanumerics only, so "DejaVu Sans" matches "DejaVuSans-Bold".
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Resolves font family names to files in a set of directories and caches
/// the loaded faces.
pub struct FontLibrary {
    dirs: Vec<PathBuf>,
    cache: HashMap<(String, bool, bool), Option<FontArc>>,
}

impl FontLibrary {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            cache: HashMap::new(),
        }
    }

    /// Usual system font locations for the current platform.
    pub fn default_dirs() -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        #[cfg(target_os = "linux")]
        {
            dirs.push(PathBuf::from("/usr/share/fonts"));
            dirs.push(PathBuf::from("/usr/local/share/fonts"));
            if let Ok(home) = std::env::var("HOME") {
                dirs.push(PathBuf::from(&home).join(".local/share/fonts"));
                dirs.push(PathBuf::from(home).join(".fonts"));
            }
        }
        #[cfg(target_os = "macos")]
        {
            dirs.push(PathBuf::from("/System/Library/Fonts"));
            dirs.push(PathBuf::from("/Library/Fonts"));
        }
        #[cfg(target_os = "windows")]
        {
            let windir = std::env::var("WINDIR").unwrap_or_else(|_| "C:\\Windows".to_string());
            dirs.push(PathBuf::from(windir).join("Fonts"));
        }
        dirs
    }

    /// Best file for `family` with the requested style, by file stem.
    pub fn find_font_file(&self, family: &str, bold: bool, italic: bool) -> Option<PathBuf> {
        let key = normalize(family);
        if key.is_empty() {
            return None;
        }

        let mut best: Option<(i32, PathBuf)> = None;
        for dir in &self.dirs {
            for ext in ["ttf", "otf", "TTF", "OTF"] {
                let pattern = format!("{}/**/*.{}", dir.display(), ext);
                let Ok(entries) = glob::glob(&pattern) else {
                    continue;
                };
                for path in entries.flatten() {
                    let Some(stem) = path.file_stem().map(|s| normalize(&s.to_string_lossy())) else {
                        continue;
                    };
                    let Some(rest) = stem.strip_prefix(&key) else {
                        continue;
                    };
                    let has_bold = rest.contains("bold");
                    let has_italic = rest.contains("italic") || rest.contains("oblique");
                    let mut score = 0;
                    score += if has_bold == bold { 4 } else { -4 };
                    score += if has_italic == italic { 4 } else { -4 };
                    // Prefer plain faces over condensed / light / mono cousins.
                    let leftover = rest
                        .replace("bold", "")
                        .replace("italic", "")
                        .replace("oblique", "")
                        .replace("regular", "");
                    score -= leftover.len() as i32;
                    if best.as_ref().is_none_or(|(s, _)| score > *s) {
                        best = Some((score, path));
                    }
                }
            }
        }
        best.map(|(_, p)| p)
    }

    /// Load (and cache) the face for `family`.
    pub fn load(&mut self, family: &str, bold: bool, italic: bool) -> PaintResult<FontArc> {
        let key = (normalize(family), bold, italic);
        if let Some(cached) = self.cache.get(&key) {
            return cached
                .clone()
                .ok_or_else(|| PaintError::font(format!("no usable font for '{}'", family)));
        }
        let loaded = match self.find_font_file(family, bold, italic) {
            Some(path) => load_font_file(&path).inspect(|_| {
                log_info!("Loaded font '{}' from {}", family, path.display());
            }),
            None => Err(PaintError::font(format!("font family '{}' not found", family))),
        };
        self.cache.insert(key, loaded.as_ref().ok().cloned());
        loaded
    }

    /// Font glyphs when available, block glyphs otherwise.
    pub fn resolve(&mut self, family: &str, bold: bool, italic: bool) -> GlyphSource {
        match self.load(family, bold, italic) {
            Ok(font) => GlyphSource::Font(font),
            Err(e) => {
                log_warn!("{}; using block glyphs", e);
                GlyphSource::Blocks
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BLACK, TRANSPARENT};

    fn style(size: f32) -> TextStyle {
        TextStyle {
            font_size: size,
            color: BLACK,
            bold: false,
            italic: false,
        }
    }

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rasterpad-fonts-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn block_line_top_anchor_starts_at_y() {
        let mut buf = PixelBuffer::new(100, 60).unwrap();
        let rect = draw_text_line(&mut buf, &GlyphSource::Blocks, "hi", 7.0, 7.0, TextAnchor::Top, &style(20.0));
        assert_eq!(rect.min_y, 7);
        assert_eq!(rect.max_y, 23);
        assert_eq!(buf.get(9, 6).unwrap(), TRANSPARENT);
        assert_eq!(buf.get(9, 7).unwrap(), BLACK);
    }

    #[test]
    fn block_line_skips_whitespace() {
        let mut buf = PixelBuffer::new(100, 40).unwrap();
        draw_text_line(&mut buf, &GlyphSource::Blocks, "a b", 0.0, 0.0, TextAnchor::Top, &style(10.0));
        // Cell 1 (x 6..12) is the space.
        assert_eq!(buf.get(8, 4).unwrap(), TRANSPARENT);
        assert_eq!(buf.get(2, 4).unwrap(), BLACK);
        assert_eq!(buf.get(14, 4).unwrap(), BLACK);
    }

    #[test]
    fn baseline_anchor_places_block_above_baseline() {
        let mut buf = PixelBuffer::new(60, 60).unwrap();
        let rect = draw_text_line(&mut buf, &GlyphSource::Blocks, "x", 10.0, 40.0, TextAnchor::Baseline, &style(20.0));
        assert_eq!(rect.max_y, 40);
        assert_eq!(rect.min_y, 24);
    }

    #[test]
    fn block_line_far_off_canvas_paints_nothing() {
        let mut buf = PixelBuffer::new(20, 20).unwrap();
        let far = i32::MAX as f32;
        let rect = draw_text_line(&mut buf, &GlyphSource::Blocks, "ab", far, far, TextAnchor::Top, &style(4000.0));
        assert!(rect.is_empty());
        let rect = draw_text_line(&mut buf, &GlyphSource::Blocks, "ab", -far, 5.0, TextAnchor::Top, &style(8.0));
        assert!(rect.is_empty());
        assert!(buf.is_uniform(TRANSPARENT));
    }

    #[test]
    fn find_font_file_prefers_matching_style() {
        let dir = temp_dir();
        for name in ["DejaVuSans.ttf", "DejaVuSans-Bold.ttf", "DejaVuSans-Oblique.ttf", "DejaVuSansMono.ttf"] {
            std::fs::write(dir.join(name), b"not a font").unwrap();
        }
        let lib = FontLibrary::new(vec![dir.clone()]);
        let regular = lib.find_font_file("DejaVu Sans", false, false).unwrap();
        assert_eq!(regular.file_name().unwrap(), "DejaVuSans.ttf");
        let bold = lib.find_font_file("dejavu sans", true, false).unwrap();
        assert_eq!(bold.file_name().unwrap(), "DejaVuSans-Bold.ttf");
        let italic = lib.find_font_file("DejaVu Sans", false, true).unwrap();
        assert_eq!(italic.file_name().unwrap(), "DejaVuSans-Oblique.ttf");
        assert!(lib.find_font_file("Comic Neue", false, false).is_none());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn unreadable_font_falls_back_to_blocks() {
        let dir = temp_dir();
        std::fs::write(dir.join("Broken.ttf"), b"garbage").unwrap();
        let mut lib = FontLibrary::new(vec![dir.clone()]);
        assert!(matches!(lib.load("Broken", false, false), Err(PaintError::Font(_))));
        assert!(matches!(lib.resolve("Broken", false, false), GlyphSource::Blocks));
        assert!(matches!(lib.resolve("Missing", true, true), GlyphSource::Blocks));
        let _ = std::fs::remove_dir_all(dir);
    }
}

// ============================================================================
// COMPOSITOR - scratch layer over canonical surface at gesture opacity
// ============================================================================

use rayon::prelude::*;

use crate::canvas::{Color, PixelBuffer};

/// Source-over a single pixel: `dst = src·α + dst·(1−α)` per channel, with
/// `α = opacity · src_alpha`.
#[inline]
pub fn blend_over(base: Color, top: Color, opacity: f32) -> Color {
    // Nothing painted here, or painted at zero strength.
    if top[3] == 0 || opacity <= 0.0 {
        return base;
    }
    if opacity >= 1.0 && top[3] == 255 {
        return top;
    }

    let a = (top[3] as f32 / 255.0) * opacity.clamp(0.0, 1.0);
    let inv = 1.0 - a;
    let mix = |s: u8, d: u8| (s as f32 * a + d as f32 * inv).round().clamp(0.0, 255.0) as u8;
    image::Rgba([
        mix(top[0], base[0]),
        mix(top[1], base[1]),
        mix(top[2], base[2]),
        (255.0 * a + base[3] as f32 * inv).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Blend every painted scratch pixel onto `dest`, row-parallel.
/// Mismatched dimensions are ignored.
pub fn composite_into(dest: &mut PixelBuffer, scratch: &PixelBuffer, opacity: f32) {
    if dest.dimensions() != scratch.dimensions() || opacity <= 0.0 {
        return;
    }
    let row_bytes = dest.width() as usize * 4;
    dest.raw_mut()
        .par_chunks_mut(row_bytes)
        .zip(scratch.as_raw().par_chunks(row_bytes))
        .for_each(|(dst_row, src_row)| {
            for (d, s) in dst_row.chunks_exact_mut(4).zip(src_row.chunks_exact(4)) {
                if s[3] == 0 {
                    continue;
                }
                let out = blend_over(
                    image::Rgba([d[0], d[1], d[2], d[3]]),
                    image::Rgba([s[0], s[1], s[2], s[3]]),
                    opacity,
                );
                d.copy_from_slice(&out.0);
            }
        });
}

/// Preview compositor.  Owns the displayed frame so each pointer-move reuses
/// the same allocation; the canonical surface is only read.
#[derive(Default)]
pub struct Compositor {
    frame: Option<PixelBuffer>,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the displayed frame: canonical surface with the scratch layer
    /// on top at `opacity`.
    pub fn compose_frame(
        &mut self,
        canonical: &PixelBuffer,
        scratch: &PixelBuffer,
        opacity: f32,
    ) -> &PixelBuffer {
        let frame = match self.frame.take() {
            Some(mut f) if f.dimensions() == canonical.dimensions() => {
                f.copy_from(canonical);
                f
            }
            _ => canonical.clone(),
        };
        let frame = self.frame.insert(frame);
        composite_into(frame, scratch, opacity);
        frame
    }

    /// Last composed frame, if a preview is live.
    pub fn frame(&self) -> Option<&PixelBuffer> {
        self.frame.as_ref()
    }

    /// Drop the preview so the display falls back to the canonical surface.
    pub fn invalidate(&mut self) {
        self.frame = None;
    }

    /// Commit: draw the scratch layer onto the canonical surface once at
    /// `opacity`, then clear the scratch layer.
    pub fn bake(&mut self, canonical: &mut PixelBuffer, scratch: &mut PixelBuffer, opacity: f32) {
        composite_into(canonical, scratch, opacity);
        scratch.clear();
        self.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BLACK, TRANSPARENT, WHITE};
    use crate::ops::shapes::{CapStyle, stroke_segment};
    use image::Rgba;

    #[test]
    fn blend_over_half_opacity() {
        let out = blend_over(WHITE, BLACK, 0.5);
        assert_eq!(out, Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn transparent_scratch_pixels_leave_base() {
        assert_eq!(blend_over(WHITE, TRANSPARENT, 1.0), WHITE);
        assert_eq!(blend_over(WHITE, BLACK, 0.0), WHITE);
    }

    #[test]
    fn full_opacity_matches_direct_drawing() {
        let mut direct = PixelBuffer::new_filled(40, 40, WHITE).unwrap();
        stroke_segment(&mut direct, (5, 5), (30, 20), 4, CapStyle::Round, BLACK);

        let mut canonical = PixelBuffer::new_filled(40, 40, WHITE).unwrap();
        let mut scratch = PixelBuffer::new(40, 40).unwrap();
        stroke_segment(&mut scratch, (5, 5), (30, 20), 4, CapStyle::Round, BLACK);

        let mut comp = Compositor::new();
        assert_eq!(comp.compose_frame(&canonical, &scratch, 1.0), &direct);
        comp.bake(&mut canonical, &mut scratch, 1.0);
        assert_eq!(canonical, direct);
        assert!(scratch.is_uniform(TRANSPARENT));
        assert!(comp.frame().is_none());
    }

    #[test]
    fn zero_opacity_bake_changes_nothing() {
        let mut canonical = PixelBuffer::new_filled(16, 16, WHITE).unwrap();
        let mut scratch = PixelBuffer::new(16, 16).unwrap();
        stroke_segment(&mut scratch, (0, 0), (15, 15), 3, CapStyle::Square, BLACK);
        Compositor::new().bake(&mut canonical, &mut scratch, 0.0);
        assert!(canonical.is_uniform(WHITE));
    }

    #[test]
    fn preview_does_not_touch_canonical() {
        let canonical = PixelBuffer::new_filled(8, 8, WHITE).unwrap();
        let mut scratch = PixelBuffer::new(8, 8).unwrap();
        scratch.set(2, 2, BLACK).unwrap();
        let mut comp = Compositor::new();
        let frame = comp.compose_frame(&canonical, &scratch, 0.5);
        assert_eq!(frame.get(2, 2).unwrap(), Rgba([128, 128, 128, 255]));
        assert!(canonical.is_uniform(WHITE));
    }
}

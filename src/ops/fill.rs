// ============================================================================
// FLOOD FILL - hard-edged, 4-connected, explicit stack
// ============================================================================

use crate::canvas::{Color, PixelBuffer, PixelRect};

/// Outcome of a fill request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillOutcome {
    /// Pixels were recoloured; `bounds` covers every changed pixel.
    Filled { pixels: usize, bounds: PixelRect },
    /// Seed already had the fill colour.
    AlreadyFilled,
    /// Seed outside the surface.
    OutsideCanvas,
}

impl FillOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, FillOutcome::Filled { .. })
    }
}

/// Recolour the 4-connected region of exactly `target`-coloured pixels that
/// contains the seed.  Mutates `buffer` in place; callers capture history
/// before calling.
///
/// Uses a DFS `Vec` stack of packed flat indices so a fully contiguous
/// canvas never grows the call stack.
pub fn flood_fill(buffer: &mut PixelBuffer, seed_x: i32, seed_y: i32, fill: Color) -> FillOutcome {
    if !buffer.in_bounds(seed_x, seed_y) {
        return FillOutcome::OutsideCanvas;
    }

    let (w, h) = buffer.dimensions();
    let wu = w as usize;
    let target = buffer.pixel(seed_x as u32, seed_y as u32);

    // Filling a region with its own colour would never terminate the
    // "still equals target" check below.
    if target == fill {
        return FillOutcome::AlreadyFilled;
    }

    let tc = target.0;
    let fc = fill.0;
    let raw = buffer.raw_mut();

    #[inline(always)]
    fn matches(raw: &[u8], idx: usize, tc: [u8; 4]) -> bool {
        let o = idx * 4;
        raw[o] == tc[0] && raw[o + 1] == tc[1] && raw[o + 2] == tc[2] && raw[o + 3] == tc[3]
    }

    #[inline(always)]
    fn paint(raw: &mut [u8], idx: usize, fc: [u8; 4]) {
        let o = idx * 4;
        raw[o..o + 4].copy_from_slice(&fc);
    }

    let mut min_x = seed_x as u32;
    let mut min_y = seed_y as u32;
    let mut max_x = min_x;
    let mut max_y = min_y;
    let mut count = 0usize;

    let mut stack: Vec<u32> = Vec::with_capacity(4096);
    stack.push((seed_y as u32) * w + seed_x as u32);

    while let Some(idx) = stack.pop() {
        let i = idx as usize;
        // A pixel can be pushed more than once before it is painted; the
        // re-check keeps the second visit a no-op.
        if !matches(raw, i, tc) {
            continue;
        }
        paint(raw, i, fc);
        count += 1;

        let x = (i % wu) as u32;
        let y = (i / wu) as u32;
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);

        if x > 0 && matches(raw, i - 1, tc) {
            stack.push(idx - 1);
        }
        if x + 1 < w && matches(raw, i + 1, tc) {
            stack.push(idx + 1);
        }
        if y > 0 && matches(raw, i - wu, tc) {
            stack.push(idx - w);
        }
        if y + 1 < h && matches(raw, i + wu, tc) {
            stack.push(idx + w);
        }
    }

    FillOutcome::Filled {
        pixels: count,
        bounds: PixelRect::new(
            min_x as i32,
            min_y as i32,
            max_x as i32 + 1,
            max_y as i32 + 1,
        ),
    }
}

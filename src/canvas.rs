use image::{Rgba, RgbaImage};

use crate::error::{PaintError, PaintResult};

/// One RGBA pixel, 8 bits per channel.
pub type Color = Rgba<u8>;

pub const TRANSPARENT: Color = Rgba([0, 0, 0, 0]);
pub const WHITE: Color = Rgba([255, 255, 255, 255]);
pub const BLACK: Color = Rgba([0, 0, 0, 255]);

/// Largest surface we accept.
const MAX_PIXELS: u64 = 256_000_000;

// ============================================================================
// PIXEL RECT – half-open dirty region in pixel space
// ============================================================================

/// Axis-aligned pixel region, `min` inclusive and `max` exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl PixelRect {
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Square region of half-extent `radius` around a point.
    pub fn around(x: i32, y: i32, radius: i32) -> Self {
        let r = radius.max(0);
        Self::new(
            x.saturating_sub(r),
            y.saturating_sub(r),
            x.saturating_add(r).saturating_add(1),
            y.saturating_add(r).saturating_add(1),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.max_x <= self.min_x || self.max_y <= self.min_y
    }

    pub fn width(&self) -> u32 {
        (self.max_x as i64 - self.min_x as i64).clamp(0, u32::MAX as i64) as u32
    }

    pub fn height(&self) -> u32 {
        (self.max_y as i64 - self.min_y as i64).clamp(0, u32::MAX as i64) as u32
    }

    pub fn union(&self, other: &PixelRect) -> PixelRect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        PixelRect::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    /// Intersect with a `width x height` surface.
    pub fn clamp_to(&self, width: u32, height: u32) -> PixelRect {
        PixelRect::new(
            self.min_x.clamp(0, width as i32),
            self.min_y.clamp(0, height as i32),
            self.max_x.clamp(0, width as i32),
            self.max_y.clamp(0, height as i32),
        )
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y
    }
}

// ============================================================================
// PIXEL BUFFER – canonical raster surface
// ============================================================================

/// Flat `width x height` RGBA surface.  The backing store is always exactly
/// `width * height * 4` bytes; every coordinate-taking accessor is
/// bounds-checked.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    image: RgbaImage,
}

impl PixelBuffer {
    // ---- construction -------------------------------------------------------

    /// Fully transparent surface.
    pub fn new(width: u32, height: u32) -> PaintResult<Self> {
        Self::new_filled(width, height, TRANSPARENT)
    }

    pub fn new_filled(width: u32, height: u32, color: Color) -> PaintResult<Self> {
        if width == 0 || height == 0 || (width as u64) * (height as u64) > MAX_PIXELS {
            return Err(PaintError::InvalidDimensions { width, height });
        }
        Ok(Self {
            image: RgbaImage::from_pixel(width, height, color),
        })
    }

    // ---- dimensions ---------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn bounds(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width() as i32, self.height() as i32)
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.width() && (y as u32) < self.height()
    }

    // ---- pixel access -------------------------------------------------------

    /// Read a pixel, failing with `OutOfBounds` outside the surface.
    pub fn get(&self, x: i32, y: i32) -> PaintResult<Color> {
        if !self.in_bounds(x, y) {
            return Err(self.out_of_bounds(x, y));
        }
        Ok(*self.image.get_pixel(x as u32, y as u32))
    }

    /// Write a pixel, failing with `OutOfBounds` outside the surface.
    pub fn set(&mut self, x: i32, y: i32, color: Color) -> PaintResult<()> {
        if !self.in_bounds(x, y) {
            return Err(self.out_of_bounds(x, y));
        }
        self.image.put_pixel(x as u32, y as u32, color);
        Ok(())
    }

    /// Pre-clipped write used by rasterizers: pixels outside the surface are
    /// dropped.  Returns whether the pixel landed.
    #[inline]
    pub fn put_clipped(&mut self, x: i32, y: i32, color: Color) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        self.image.put_pixel(x as u32, y as u32, color);
        true
    }

    /// Unchecked-by-contract read for callers iterating known-valid coordinates.
    #[inline]
    pub(crate) fn pixel(&self, x: u32, y: u32) -> Color {
        *self.image.get_pixel(x, y)
    }

    // ---- bulk operations ----------------------------------------------------

    /// Fill every pixel with `color`.
    pub fn fill(&mut self, color: Color) {
        for px in self.image.pixels_mut() {
            *px = color;
        }
    }

    /// Reset to fully transparent.
    pub fn clear(&mut self) {
        self.image.fill(0);
    }

    /// Reset only `rect` (clamped) to transparent.
    pub fn clear_rect(&mut self, rect: PixelRect) {
        let r = rect.clamp_to(self.width(), self.height());
        for y in r.min_y..r.max_y {
            for x in r.min_x..r.max_x {
                self.image.put_pixel(x as u32, y as u32, TRANSPARENT);
            }
        }
    }

    /// True when every pixel equals `color`.
    pub fn is_uniform(&self, color: Color) -> bool {
        self.image.pixels().all(|p| *p == color)
    }

    /// Number of pixels exactly equal to `color`.
    pub fn count_color(&self, color: Color) -> usize {
        self.image.pixels().filter(|p| **p == color).count()
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub(crate) fn raw_mut(&mut self) -> &mut [u8] {
        &mut self.image
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    /// Copy the whole of `other` into this buffer.  Dimensions must match;
    /// mismatched sources are ignored.
    pub fn copy_from(&mut self, other: &PixelBuffer) {
        if self.dimensions() == other.dimensions() {
            self.image.copy_from_slice(other.as_raw());
        }
    }

    // ---- history ------------------------------------------------------------

    /// Deep copy of the current pixels.
    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            image: self.image.clone(),
        }
    }

    /// Replace the surface with a previously captured snapshot.
    pub fn restore(&mut self, snapshot: &HistorySnapshot) {
        if self.dimensions() == snapshot.image.dimensions() {
            self.image.copy_from_slice(snapshot.image.as_raw());
        } else {
            self.image = snapshot.image.clone();
        }
    }

    /// Approximate memory usage in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.image.as_raw().len()
    }

    fn out_of_bounds(&self, x: i32, y: i32) -> PaintError {
        PaintError::OutOfBounds {
            x: x as i64,
            y: y as i64,
            width: self.width(),
            height: self.height(),
        }
    }
}

// ============================================================================
// HISTORY SNAPSHOT
// ============================================================================

/// Immutable full copy of a [`PixelBuffer`].  Never shares storage with the
/// live surface.
#[derive(Clone, Debug)]
pub struct HistorySnapshot {
    image: RgbaImage,
}

impl HistorySnapshot {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn memory_bytes(&self) -> usize {
        self.image.as_raw().len()
    }

    /// Pixel read for inspection (tests, diagnostics).
    pub fn get(&self, x: u32, y: u32) -> Option<Color> {
        self.image.get_pixel_checked(x, y).copied()
    }
}

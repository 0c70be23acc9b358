use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

/// Alpha value at or above which a rasterized pixel counts as selected.
pub const SELECTED_ALPHA: u8 = 128;

/// Bits per packed mask word.
const WORD_BITS: usize = 32;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MaskError {
    #[error("mask dimensions differ: {left_width}x{left_height} vs {right_width}x{right_height}")]
    DimensionMismatch {
        left_width: u32,
        left_height: u32,
        right_width: u32,
        right_height: u32,
    },
    #[error("pixel ({x}, {y}) is outside the {width}x{height} mask")]
    OutOfBounds { x: u32, y: u32, width: u32, height: u32 },
    #[error("mask has no selected pixels")]
    EmptySelection,
    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

// ============================================================================
// SELECTION MODE
// ============================================================================

/// How a new selection shape interacts with the existing mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SelectionMode {
    /// Discard the existing selection, keep only the new shape.
    #[default]
    Replace,
    /// Union – add to the existing mask.
    Add,
    /// Difference – subtract from the existing mask.
    Subtract,
    /// Keep only pixels present in both the existing mask AND the new shape.
    Intersect,
}

impl SelectionMode {
    pub fn label(&self) -> &'static str {
        match self {
            SelectionMode::Replace => "Replace",
            SelectionMode::Add => "Add",
            SelectionMode::Subtract => "Subtract",
            SelectionMode::Intersect => "Intersect",
        }
    }

    /// Lower-case key used in config files and on the command line.
    pub fn key(&self) -> &'static str {
        match self {
            SelectionMode::Replace => "replace",
            SelectionMode::Add => "add",
            SelectionMode::Subtract => "subtract",
            SelectionMode::Intersect => "intersect",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|m| m.key() == key)
    }

    pub fn all() -> &'static [SelectionMode] {
        &[
            SelectionMode::Replace,
            SelectionMode::Add,
            SelectionMode::Subtract,
            SelectionMode::Intersect,
        ]
    }

    /// Word-level merge of the running mask `a` with the incoming mask `b`.
    #[inline]
    pub fn merge_word(self, a: u32, b: u32) -> u32 {
        match self {
            SelectionMode::Replace => b,
            SelectionMode::Add => a | b,
            SelectionMode::Subtract => a & !b,
            SelectionMode::Intersect => a & b,
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// OVERLAY COLOURS
// ============================================================================

/// Colours used when a mask is expanded to RGBA for display.
pub struct SelectionColor;

impl SelectionColor {
    /// Pending tool preview.
    pub const SELECTED: Rgba<u8> = Rgba([160, 160, 239, 255]);
    /// Overlay of a layer that is not being edited.
    pub const INACTIVE: Rgba<u8> = Rgba([160, 239, 160, 90]);
    /// Overlay of the active layer.
    pub const MASK: Rgba<u8> = Rgba([160, 160, 239, 90]);
}

/// Format a colour as `#rrggbbaa`.
pub fn color_to_hex(c: Rgba<u8>) -> String {
    format!("#{:02x}{:02x}{:02x}{:02x}", c[0], c[1], c[2], c[3])
}

/// Parse `#rrggbbaa` (or `#rrggbb`, alpha 255).
pub fn hex_to_color(s: &str) -> Option<Rgba<u8>> {
    let hex = s.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, 255])),
        8 => Some(Rgba([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
        _ => None,
    }
}

// ============================================================================
// SELECTION SHAPE – geometry rasterized by the selection tools
// ============================================================================

/// Shape drawn by a selection tool. Coverage is sampled at pixel centres.
#[derive(Clone, Debug, PartialEq)]
pub enum SelectionShape {
    /// Axis-aligned box, `min` inclusive, `max` exclusive.
    Rectangle { min_x: i32, min_y: i32, max_x: i32, max_y: i32 },
    Ellipse { cx: f32, cy: f32, rx: f32, ry: f32 },
    Disc { cx: f32, cy: f32, r: f32 },
    /// Stroke segment of half-width `r` with round ends.
    Segment { x0: f32, y0: f32, x1: f32, y1: f32, r: f32 },
}

impl SelectionShape {
    /// Build a rectangle from two arbitrary corners.
    pub fn rectangle(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        SelectionShape::Rectangle {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    /// Returns 255 if the pixel (x, y) is inside the shape, 0 otherwise.
    pub fn contains(&self, x: u32, y: u32) -> u8 {
        let px = x as f32 + 0.5;
        let py = y as f32 + 0.5;
        let inside = match *self {
            SelectionShape::Rectangle { min_x, min_y, max_x, max_y } => {
                let (x, y) = (x as i64, y as i64);
                x >= min_x as i64 && x < max_x as i64 && y >= min_y as i64 && y < max_y as i64
            }
            SelectionShape::Ellipse { cx, cy, rx, ry } => {
                if rx <= 0.0 || ry <= 0.0 {
                    return 0;
                }
                let dx = (px - cx) / rx;
                let dy = (py - cy) / ry;
                dx * dx + dy * dy <= 1.0
            }
            SelectionShape::Disc { cx, cy, r } => {
                let dx = px - cx;
                let dy = py - cy;
                dx * dx + dy * dy <= r * r
            }
            SelectionShape::Segment { x0, y0, x1, y1, r } => {
                let (vx, vy) = (x1 - x0, y1 - y0);
                let len_sq = vx * vx + vy * vy;
                let t = if len_sq > 0.0 {
                    (((px - x0) * vx + (py - y0) * vy) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let dx = px - (x0 + t * vx);
                let dy = py - (y0 + t * vy);
                dx * dx + dy * dy <= r * r
            }
        };
        if inside { 255 } else { 0 }
    }

    /// Inclusive pixel bounding box clamped to the canvas, `None` if the
    /// shape misses the canvas entirely.
    pub fn bounds(&self, canvas_w: u32, canvas_h: u32) -> Option<(u32, u32, u32, u32)> {
        if canvas_w == 0 || canvas_h == 0 {
            return None;
        }
        let (x0, y0, x1, y1) = match *self {
            SelectionShape::Rectangle { min_x, min_y, max_x, max_y } => {
                (min_x as f32, min_y as f32, max_x as f32 - 1.0, max_y as f32 - 1.0)
            }
            SelectionShape::Ellipse { cx, cy, rx, ry } => (cx - rx, cy - ry, cx + rx, cy + ry),
            SelectionShape::Disc { cx, cy, r } => (cx - r, cy - r, cx + r, cy + r),
            SelectionShape::Segment { x0, y0, x1, y1, r } => {
                (x0.min(x1) - r, y0.min(y1) - r, x0.max(x1) + r, y0.max(y1) + r)
            }
        };
        if x1 < 0.0 || y1 < 0.0 || x0 > (canvas_w - 1) as f32 || y0 > (canvas_h - 1) as f32 || x1 < x0 || y1 < y0 {
            return None;
        }
        let min_x = x0.max(0.0).floor() as u32;
        let min_y = y0.max(0.0).floor() as u32;
        let max_x = (x1.ceil().max(0.0) as u32).min(canvas_w - 1);
        let max_y = (y1.ceil().max(0.0) as u32).min(canvas_h - 1);
        Some((min_x, min_y, max_x, max_y))
    }

    /// Paint the shape into `target` with `color`.
    pub fn fill(&self, target: &mut RgbaImage, color: Rgba<u8>) {
        let Some((bx0, by0, bx1, by1)) = self.bounds(target.width(), target.height()) else {
            return;
        };
        for y in by0..=by1 {
            for x in bx0..=bx1 {
                if self.contains(x, y) > 0 {
                    target.put_pixel(x, y, color);
                }
            }
        }
    }
}

// ============================================================================
// PIXEL MASK – bit-packed selection, MSB-first within 32-bit words
// ============================================================================

/// Tight bounding box of the selected pixels (`min` inclusive, `max` exclusive).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaskBounds {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

impl MaskBounds {
    pub fn width(&self) -> u32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> u32 {
        self.y_max - self.y_min
    }
}

/// Boolean selection over a `width`×`height` raster.
///
/// Pixel `(x, y)` lives at logical index `i = y * width + x`, stored in word
/// `i / 32` at bit `31 - i % 32`. Unused trailing bits of the last word are
/// always zero, so word-wise equality is pixel-wise equality.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PixelMask {
    bits: Vec<u32>,
    width: u32,
    height: u32,
}

impl fmt::Debug for PixelMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelMask")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("selected", &self.count_selected())
            .finish()
    }
}

#[inline]
fn bit_of(index: usize) -> u32 {
    1 << (WORD_BITS - 1 - index % WORD_BITS)
}

impl PixelMask {
    /// All-zero mask.
    pub fn empty(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            bits: vec![0; len.div_ceil(WORD_BITS)],
            width,
            height,
        }
    }

    /// Build a mask from a row-major RGBA buffer: pixel `i` is selected when
    /// `test(alpha_i)` holds.
    pub fn from_alpha_test(
        pixels: &[u8],
        width: u32,
        height: u32,
        test: impl Fn(u8) -> bool,
    ) -> Result<Self, MaskError> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(MaskError::BufferSize { expected, actual: pixels.len() });
        }
        let mut mask = Self::empty(width, height);
        for (i, px) in pixels.chunks_exact(4).enumerate() {
            if test(px[3]) {
                mask.bits[i / WORD_BITS] |= bit_of(i);
            }
        }
        Ok(mask)
    }

    /// Convert a rasterized tool layer: alpha ≥ 128 means selected.
    pub fn from_image(image: &RgbaImage) -> Self {
        let mut mask = Self::empty(image.width(), image.height());
        for (i, px) in image.pixels().enumerate() {
            if px[3] >= SELECTED_ALPHA {
                mask.bits[i / WORD_BITS] |= bit_of(i);
            }
        }
        mask
    }

    /// Expand to RGBA: selected pixels get `color`, the rest transparent black.
    pub fn to_color_buffer(&self, color: Rgba<u8>) -> Vec<u8> {
        let mut buf = vec![0u8; self.len() * 4];
        buf.par_chunks_exact_mut(4).enumerate().for_each(|(i, px)| {
            if self.bits[i / WORD_BITS] & bit_of(i) != 0 {
                px.copy_from_slice(&color.0);
            }
        });
        buf
    }

    /// Same as [`to_color_buffer`](Self::to_color_buffer), wrapped as an image.
    pub fn to_image(&self, color: Rgba<u8>) -> RgbaImage {
        // Buffer length always matches the dimensions.
        RgbaImage::from_raw(self.width, self.height, self.to_color_buffer(color))
            .unwrap_or_else(|| RgbaImage::new(self.width, self.height))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Logical pixel count (`width * height`).
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    /// Packed words, MSB-first.
    pub fn words(&self) -> &[u32] {
        &self.bits
    }

    pub fn count_selected(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn memory_size(&self) -> usize {
        self.bits.len() * std::mem::size_of::<u32>()
    }

    pub fn same_size(&self, other: &PixelMask) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Merge `other` into `self` word by word according to `mode`.
    pub fn combine(&self, other: &PixelMask, mode: SelectionMode) -> Result<PixelMask, MaskError> {
        if !self.same_size(other) {
            return Err(MaskError::DimensionMismatch {
                left_width: self.width,
                left_height: self.height,
                right_width: other.width,
                right_height: other.height,
            });
        }
        let bits = self
            .bits
            .iter()
            .zip(&other.bits)
            .map(|(&a, &b)| mode.merge_word(a, b))
            .collect();
        Ok(PixelMask { bits, width: self.width, height: self.height })
    }

    pub fn pixel_at(&self, x: u32, y: u32) -> Result<bool, MaskError> {
        if x >= self.width || y >= self.height {
            return Err(MaskError::OutOfBounds { x, y, width: self.width, height: self.height });
        }
        Ok(self.get(x, y))
    }

    /// Unchecked point query; caller guarantees `x < width && y < height`.
    #[inline]
    pub(crate) fn get(&self, x: u32, y: u32) -> bool {
        self.get_index(y as usize * self.width as usize + x as usize)
    }

    #[inline]
    fn get_index(&self, index: usize) -> bool {
        self.bits[index / WORD_BITS] & bit_of(index) != 0
    }

    /// Point query that treats anything outside the raster as unselected.
    pub fn is_selected(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64 && self.get(x as u32, y as u32)
    }

    /// Keep only the selected pixels whose 4-connected distance to the nearest
    /// unselected pixel is at least `margin`.
    pub fn margin_erode(&self, margin: u32) -> PixelMask {
        if margin == 0 {
            return self.clone();
        }
        let w = self.width as usize;
        let h = self.height as usize;
        let mut dist = vec![margin; self.len()];
        let mut queue: VecDeque<(usize, u32)> = VecDeque::new();

        // Seed from every selected neighbour of an unselected pixel.
        for y in 0..h {
            for x in 0..w {
                let idx = y * w + x;
                if self.get_index(idx) {
                    continue;
                }
                dist[idx] = 0;
                if y > 0 && self.get_index(idx - w) {
                    queue.push_back((idx - w, 1));
                }
                if x > 0 && self.get_index(idx - 1) {
                    queue.push_back((idx - 1, 1));
                }
                if y + 1 < h && self.get_index(idx + w) {
                    queue.push_back((idx + w, 1));
                }
                if x + 1 < w && self.get_index(idx + 1) {
                    queue.push_back((idx + 1, 1));
                }
            }
        }

        while let Some((idx, d)) = queue.pop_front() {
            if dist[idx] <= d {
                continue;
            }
            dist[idx] = d;
            let (x, y) = (idx % w, idx / w);
            if x > 0 {
                queue.push_back((idx - 1, d + 1));
            }
            if y > 0 {
                queue.push_back((idx - w, d + 1));
            }
            if x + 1 < w {
                queue.push_back((idx + 1, d + 1));
            }
            if y + 1 < h {
                queue.push_back((idx + w, d + 1));
            }
        }

        let mut out = PixelMask::empty(self.width, self.height);
        for (i, &d) in dist.iter().enumerate() {
            if d == margin {
                out.bits[i / WORD_BITS] |= bit_of(i);
            }
        }
        out
    }

    /// Mean selected coordinate, floored.
    pub fn centroid(&self) -> Result<(u32, u32), MaskError> {
        let (mut sx, mut sy, mut count) = (0u64, 0u64, 0u64);
        for y in 0..self.height {
            for x in 0..self.width {
                if self.get(x, y) {
                    sx += x as u64;
                    sy += y as u64;
                    count += 1;
                }
            }
        }
        if count == 0 {
            return Err(MaskError::EmptySelection);
        }
        Ok(((sx / count) as u32, (sy / count) as u32))
    }

    /// Tight bounds of the selection, `None` when nothing is selected.
    pub fn bounding_box(&self) -> Option<MaskBounds> {
        let mut bounds: Option<MaskBounds> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.get(x, y) {
                    continue;
                }
                let b = bounds.get_or_insert(MaskBounds { x_min: x, y_min: y, x_max: x + 1, y_max: y + 1 });
                b.x_min = b.x_min.min(x);
                b.x_max = b.x_max.max(x + 1);
                b.y_max = b.y_max.max(y + 1);
            }
        }
        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mask_from_fn(w: u32, h: u32, f: impl Fn(u32, u32) -> bool) -> PixelMask {
        let mut img = RgbaImage::new(w, h);
        for y in 0..h {
            for x in 0..w {
                if f(x, y) {
                    img.put_pixel(x, y, SelectionColor::SELECTED);
                }
            }
        }
        PixelMask::from_image(&img)
    }

    #[test]
    fn packing_is_msb_first() {
        let mut buf = vec![0u8; 40 * 4];
        buf[3] = 255; // pixel 0
        buf[33 * 4 + 3] = 200; // pixel 33
        let mask = PixelMask::from_alpha_test(&buf, 40, 1, |a| a >= SELECTED_ALPHA).unwrap();
        assert_eq!(mask.words(), &[0x8000_0000, 0x4000_0000]);
    }

    #[test]
    fn trailing_bits_stay_zero() {
        let buf = vec![255u8; 5 * 7 * 4];
        let mask = PixelMask::from_alpha_test(&buf, 5, 7, |a| a >= SELECTED_ALPHA).unwrap();
        assert_eq!(mask.words().len(), 2);
        assert_eq!(mask.words()[1], 0xFFFF_FFFF << 29);
        let sub = mask.combine(&PixelMask::empty(5, 7), SelectionMode::Subtract).unwrap();
        assert_eq!(sub.words()[1] & !(0xFFFF_FFFF << 29), 0);
        assert_eq!(mask.count_selected(), 35);
    }

    #[test]
    fn wrong_buffer_size_is_rejected() {
        let err = PixelMask::from_alpha_test(&[0u8; 12], 2, 2, |a| a > 0).unwrap_err();
        assert_eq!(err, MaskError::BufferSize { expected: 16, actual: 12 });
    }

    #[test]
    fn color_buffer_round_trip() {
        let alpha: Vec<u8> = (0..17 * 9).flat_map(|i| [1, 2, 3, (i * 37 % 256) as u8]).collect();
        let mask = PixelMask::from_alpha_test(&alpha, 17, 9, |a| a >= SELECTED_ALPHA).unwrap();
        let buf = mask.to_color_buffer(SelectionColor::MASK);
        assert_eq!(buf.len(), 17 * 9 * 4);
        let again = PixelMask::from_alpha_test(&buf, 17, 9, |a| a > 0).unwrap();
        assert_eq!(again, mask);
        assert!(buf.chunks_exact(4).all(|px| px == [0, 0, 0, 0] || px == SelectionColor::MASK.0));

        let img = mask.to_image(SelectionColor::SELECTED);
        assert_eq!((img.width(), img.height()), (17, 9));
        assert_eq!(PixelMask::from_image(&img), mask);
    }

    #[test]
    fn combine_algebra() {
        let a = mask_from_fn(13, 11, |x, y| (x * 3 + y) % 4 == 0);
        let b = mask_from_fn(13, 11, |x, y| x > 5 && y < 7);
        let empty = PixelMask::empty(13, 11);
        assert_eq!(a.combine(&b, SelectionMode::Add).unwrap(), b.combine(&a, SelectionMode::Add).unwrap());
        assert_eq!(a.combine(&a, SelectionMode::Intersect).unwrap(), a);
        assert_eq!(a.combine(&empty, SelectionMode::Subtract).unwrap(), a);
        assert_eq!(a.combine(&b, SelectionMode::Replace).unwrap(), b);
        assert!(a.combine(&a, SelectionMode::Subtract).unwrap().is_empty());
    }

    #[test]
    fn combine_rejects_mismatched_sizes() {
        let err = PixelMask::empty(4, 4).combine(&PixelMask::empty(4, 5), SelectionMode::Add).unwrap_err();
        assert!(matches!(err, MaskError::DimensionMismatch { right_height: 5, .. }));
    }

    #[test]
    fn pixel_at_bounds() {
        let mask = mask_from_fn(3, 2, |x, y| x == 2 && y == 1);
        assert!(mask.pixel_at(2, 1).unwrap());
        assert!(!mask.pixel_at(0, 0).unwrap());
        assert_eq!(
            mask.pixel_at(3, 0).unwrap_err(),
            MaskError::OutOfBounds { x: 3, y: 0, width: 3, height: 2 }
        );
        assert!(mask.pixel_at(0, 2).is_err());
    }

    #[test]
    fn margin_erode_shrinks_square() {
        // 20x20 canvas, selected square [2, 18)
        let mask = mask_from_fn(20, 20, |x, y| (2..18).contains(&x) && (2..18).contains(&y));
        assert_eq!(mask.margin_erode(0), mask);
        assert_eq!(mask.margin_erode(1), mask);
        let eroded = mask.margin_erode(3);
        let expected = mask_from_fn(20, 20, |x, y| (4..16).contains(&x) && (4..16).contains(&y));
        assert_eq!(eroded, expected);
    }

    #[test]
    fn margin_erode_is_monotonic() {
        let mask = mask_from_fn(40, 30, |x, y| {
            let dx = x as f32 - 20.0;
            let dy = y as f32 - 15.0;
            dx * dx / 300.0 + dy * dy / 150.0 <= 1.0 || (x > 30 && y > 20)
        });
        let mut prev = mask.margin_erode(0);
        for m in 1..12 {
            let cur = mask.margin_erode(m);
            assert_eq!(cur.combine(&prev, SelectionMode::Subtract).unwrap().count_selected(), 0, "m = {m}");
            prev = cur;
        }
    }

    #[test]
    fn centroid_floors_mean() {
        let mask = mask_from_fn(10, 10, |x, y| (x == 1 || x == 4) && y == 3);
        assert_eq!(mask.centroid().unwrap(), (2, 3));
        assert_eq!(PixelMask::empty(10, 10).centroid().unwrap_err(), MaskError::EmptySelection);
    }

    #[test]
    fn bounding_box_is_tight() {
        let mask = mask_from_fn(10, 8, |x, y| (3..6).contains(&x) && (2..7).contains(&y));
        assert_eq!(mask.bounding_box(), Some(MaskBounds { x_min: 3, y_min: 2, x_max: 6, y_max: 7 }));
        assert_eq!(PixelMask::empty(4, 4).bounding_box(), None);
    }

    #[test]
    fn shapes_sample_pixel_centres() {
        let rect = SelectionShape::rectangle(5, 4, 2, 1);
        assert_eq!(rect.contains(2, 1), 255);
        assert_eq!(rect.contains(4, 3), 255);
        assert_eq!(rect.contains(5, 3), 0);
        assert_eq!(SelectionShape::rectangle(3, 3, 3, 9).bounds(10, 10), None);

        let seg = SelectionShape::Segment { x0: 0.0, y0: 5.0, x1: 10.0, y1: 5.0, r: 1.0 };
        assert_eq!(seg.contains(5, 4), 255);
        assert_eq!(seg.contains(5, 7), 0);
    }

    #[test]
    fn hex_colors() {
        assert_eq!(color_to_hex(SelectionColor::INACTIVE), "#a0efa05a");
        assert_eq!(hex_to_color("#a0a0ef5a"), Some(SelectionColor::MASK));
        assert_eq!(hex_to_color("#a0a0ef"), Some(SelectionColor::SELECTED));
        assert_eq!(hex_to_color("a0a0ef"), None);
        assert_eq!(hex_to_color("#zz0000"), None);
    }
}

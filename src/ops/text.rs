use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use log::{debug, info};
use thiserror::Error;

use crate::canvas::{MaskBounds, MaskError, PixelMask};
use crate::components::layers::blend_over;
use crate::ops::combinations::Combinations;

/// Pixels kept clear between the text block and the blob edge.
pub const DEFAULT_MARGIN: u32 = 10;
pub const DEFAULT_FONT_SIZE: f32 = 12.0;
pub const DEFAULT_LINE_GAP: f32 = 5.0;

// ============================================================================
// FONT SERVICE
// ============================================================================

/// Ink bounding box of a rendered string, relative to its origin on the baseline.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct TextBounds {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl TextBounds {
    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }
}

/// Metrics the layout search needs from a font.
pub trait FontMetrics {
    /// Ascender in font units.
    fn ascender(&self) -> f32;
    /// Descender in font units (negative below the baseline).
    fn descender(&self) -> f32;
    fn units_per_em(&self) -> f32;
    /// Bounding box of `text` set at `font_size` (em size in pixels).
    fn measure(&self, text: &str, font_size: f32) -> TextBounds;
}

/// Pixel scale for an em size of `font_size` pixels.
fn em_scale(font: &FontArc, font_size: f32) -> PxScale {
    let upem = Font::units_per_em(font).unwrap_or(1000.0);
    PxScale::from(font_size * font.height_unscaled() / upem)
}

/// Lay out a single line at the origin, returning `(glyph, x)` pairs.
fn layout_line(font: &FontArc, text: &str, scale: PxScale) -> Vec<(GlyphId, f32)> {
    let scaled = font.as_scaled(scale);
    let mut glyphs = Vec::with_capacity(text.len());
    let mut cursor_x = 0.0f32;
    let mut last_glyph: Option<GlyphId> = None;
    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = last_glyph {
            cursor_x += scaled.kern(prev, glyph_id);
        }
        glyphs.push((glyph_id, cursor_x));
        cursor_x += scaled.h_advance(glyph_id);
        last_glyph = Some(glyph_id);
    }
    glyphs
}

impl FontMetrics for FontArc {
    fn ascender(&self) -> f32 {
        self.ascent_unscaled()
    }

    fn descender(&self) -> f32 {
        self.descent_unscaled()
    }

    fn units_per_em(&self) -> f32 {
        Font::units_per_em(self).unwrap_or(1000.0)
    }

    fn measure(&self, text: &str, font_size: f32) -> TextBounds {
        let scale = em_scale(self, font_size);
        let mut bounds: Option<TextBounds> = None;
        for (glyph_id, gx) in layout_line(self, text, scale) {
            let glyph = glyph_id.with_scale_and_position(scale, point(gx, 0.0));
            let Some(outlined) = self.outline_glyph(glyph) else { continue };
            let r = outlined.px_bounds();
            let b = bounds.get_or_insert(TextBounds { x1: r.min.x, y1: r.min.y, x2: r.max.x, y2: r.max.y });
            b.x1 = b.x1.min(r.min.x);
            b.y1 = b.y1.min(r.min.y);
            b.x2 = b.x2.max(r.max.x);
            b.y2 = b.y2.max(r.max.y);
        }
        bounds.unwrap_or_default()
    }
}

/// Rounded line pitch: `line_gap + font_size * (ascender - descender) / units_per_em`.
pub fn line_height<F: FontMetrics + ?Sized>(font: &F, font_size: f32, line_gap: f32) -> i32 {
    let font_height_em = (font.ascender() - font.descender()) / font.units_per_em();
    round_half_up((line_gap + font_size * font_height_em) as f64) as i32
}

#[inline]
fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

// ============================================================================
// LAYOUT RESULT
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TypesetError {
    #[error("selection centroid ({x}, {y}) lies outside the blob interior")]
    ConcaveShape { x: u32, y: u32 },
    #[error("text does not fit inside the selection")]
    NoFeasibleSplit,
    #[error(transparent)]
    Mask(#[from] MaskError),
}

impl TypesetError {
    /// `true` for the expected "could not place text" outcomes.
    pub fn is_abort(&self) -> bool {
        matches!(self, TypesetError::ConcaveShape { .. } | TypesetError::NoFeasibleSplit)
    }
}

/// Geometry of one candidate text row.
#[derive(Clone, Debug, PartialEq)]
pub struct LineInfo {
    pub baseline_y: f64,
    pub left_bound: i32,
    pub right_bound: i32,
    pub center_justified_width_limit: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub baseline_y: f64,
    /// Pen origin that centres the line's ink box on the blob centroid.
    pub origin_x: f64,
    pub width: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub lines: Vec<PlacedLine>,
    pub center: (u32, u32),
    pub line_height: i32,
    pub score: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypesetOptions {
    pub font_size: f32,
    pub line_gap: f32,
    pub margin: u32,
}

impl Default for TypesetOptions {
    fn default() -> Self {
        Self { font_size: DEFAULT_FONT_SIZE, line_gap: DEFAULT_LINE_GAP, margin: DEFAULT_MARGIN }
    }
}

// ============================================================================
// LAYOUT SEARCH
// ============================================================================

/// Fit `text` into the blob of `mask` with the default margin.
pub fn typeset<F: FontMetrics + ?Sized>(
    mask: &PixelMask,
    text: &str,
    font: &F,
    font_size: f32,
    line_gap: f32,
) -> Result<Placement, TypesetError> {
    typeset_with(mask, text, font, &TypesetOptions { font_size, line_gap, margin: DEFAULT_MARGIN })
}

/// Find the fewest lines that fit, then the split with the most even slack.
pub fn typeset_with<F: FontMetrics + ?Sized>(
    mask: &PixelMask,
    text: &str,
    font: &F,
    opts: &TypesetOptions,
) -> Result<Placement, TypesetError> {
    debug!("typeset {:?} into {} selected px", text, mask.count_selected());
    let reduced = mask.margin_erode(opts.margin);
    let center = mask.centroid()?;
    if !reduced.pixel_at(center.0, center.1)? {
        info!("typeset aborted: centroid {:?} is not inside the blob", center);
        return Err(TypesetError::ConcaveShape { x: center.0, y: center.1 });
    }

    let line_height = line_height(font, opts.font_size, opts.line_gap);
    let bounds = mask.bounding_box().ok_or(MaskError::EmptySelection)?;
    if line_height <= 0 {
        return Err(TypesetError::NoFeasibleSplit);
    }
    let breaks = split_positions(text);
    let line_limit = bounds.height() as usize / line_height as usize;

    for n_lines in 1..=line_limit {
        if n_lines - 1 > breaks.len() {
            break;
        }
        let Some(lines) = line_infos(mask, &bounds, n_lines, line_height, center) else {
            debug!("{n_lines} lines: no room in band");
            continue;
        };

        let mut best: Option<(f64, Vec<&str>, Vec<TextBounds>)> = None;
        for combo in Combinations::new(breaks.len(), n_lines - 1) {
            let pieces = split_text(text, &breaks, &combo);
            let Some((score, measured)) = score_split(font, opts.font_size, &lines, &pieces) else {
                continue;
            };
            if best.as_ref().is_none_or(|(s, _, _)| score < *s) {
                best = Some((score, pieces, measured));
            }
        }

        if let Some((score, pieces, measured)) = best {
            info!("typeset placed {n_lines} line(s), score {score:.2}");
            let placed = pieces
                .iter()
                .zip(&lines)
                .zip(&measured)
                .map(|((piece, line), b)| PlacedLine {
                    text: piece.to_string(),
                    baseline_y: line.baseline_y,
                    origin_x: round_half_up(center.0 as f64 - (b.x1 + b.x2) as f64 / 2.0),
                    width: b.width() as f64,
                })
                .collect();
            return Ok(Placement { lines: placed, center, line_height, score });
        }
    }

    info!("typeset gave up: no split fits");
    Err(TypesetError::NoFeasibleSplit)
}

/// Byte offsets of every space in `text`.
pub fn split_positions(text: &str) -> Vec<usize> {
    text.char_indices().filter(|&(_, c)| c == ' ').map(|(i, _)| i).collect()
}

/// Cut `text` at the breaks selected by `combo`, dropping the break spaces.
pub fn split_text<'a>(text: &'a str, breaks: &[usize], combo: &[usize]) -> Vec<&'a str> {
    let mut pieces = Vec::with_capacity(combo.len() + 1);
    let mut start = 0;
    for &idx in combo {
        let pos = breaks[idx];
        pieces.push(&text[start..pos]);
        start = pos + 1;
    }
    pieces.push(&text[start..]);
    pieces
}

/// Evenly spaced rows around the centroid; `None` if any row has no room.
pub fn line_infos(
    mask: &PixelMask,
    bounds: &MaskBounds,
    n_lines: usize,
    line_height: i32,
    center: (u32, u32),
) -> Option<Vec<LineInfo>> {
    let (cx, cy) = (center.0 as i64, center.1 as i64);
    let lh = line_height as f64;
    (0..n_lines)
        .map(|i| {
            let baseline = round_half_up(cy as f64 - lh * n_lines as f64 / 2.0 + (i + 1) as f64 * lh);
            let y_max = baseline as i64;
            let (left, right) = line_x_bounds(mask, bounds, y_max - line_height as i64, y_max)?;
            let limit = 2 * (cx - left).min(right - cx);
            if limit < 0 {
                return None;
            }
            Some(LineInfo {
                baseline_y: baseline,
                left_bound: left as i32,
                right_bound: right as i32,
                center_justified_width_limit: limit as f64,
            })
        })
        .collect()
}

/// First and last columns whose every row in `[y_min, y_max)` is selected.
fn line_x_bounds(mask: &PixelMask, bounds: &MaskBounds, y_min: i64, y_max: i64) -> Option<(i64, i64)> {
    let full_column = |x: i64| (y_min..y_max).all(|y| mask.is_selected(x, y));
    let columns = bounds.x_min as i64..bounds.x_max as i64;
    let left = columns.clone().find(|&x| full_column(x))?;
    let right = columns.rev().find(|&x| full_column(x))?;
    Some((left, right))
}

/// Sum of absolute deviations of per-line slack from its mean, `None` if any
/// line overflows its limit.
fn score_split<F: FontMetrics + ?Sized>(
    font: &F,
    font_size: f32,
    lines: &[LineInfo],
    pieces: &[&str],
) -> Option<(f64, Vec<TextBounds>)> {
    let mut margins = Vec::with_capacity(pieces.len());
    let mut measured = Vec::with_capacity(pieces.len());
    for (piece, line) in pieces.iter().zip(lines) {
        let b = font.measure(piece, font_size);
        let width = b.width() as f64;
        if width > line.center_justified_width_limit {
            return None;
        }
        margins.push(line.center_justified_width_limit - width);
        measured.push(b);
    }
    let mean = margins.iter().sum::<f64>() / margins.len() as f64;
    let score = margins.iter().map(|m| (m - mean).abs()).sum();
    Some((score, measured))
}

// ============================================================================
// RENDERING
// ============================================================================

/// Draw every placed line onto `target` with `font`.
pub fn rasterize_placement(font: &FontArc, placement: &Placement, font_size: f32, color: Rgba<u8>, target: &mut RgbaImage) {
    let scale = em_scale(font, font_size);
    let (w, h) = (target.width() as i32, target.height() as i32);
    for line in &placement.lines {
        for (glyph_id, gx) in layout_line(font, &line.text, scale) {
            let glyph =
                glyph_id.with_scale_and_position(scale, point(line.origin_x as f32 + gx, line.baseline_y as f32));
            let Some(outlined) = font.outline_glyph(glyph) else { continue };
            let b = outlined.px_bounds();
            outlined.draw(|px, py, cov| {
                let x = b.min.x as i32 + px as i32;
                let y = b.min.y as i32 + py as i32;
                if x < 0 || y < 0 || x >= w || y >= h || cov <= 0.001 {
                    return;
                }
                let a = (color[3] as f32 * cov.min(1.0)).round() as u8;
                let dst = target.get_pixel_mut(x as u32, y as u32);
                *dst = blend_over(*dst, Rgba([color[0], color[1], color[2], a]));
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{SelectionColor, SelectionShape};
    use pretty_assertions::assert_eq;

    /// Every character is `advance` pixels wide regardless of size.
    struct FixedFont {
        advance: f32,
    }

    impl FontMetrics for FixedFont {
        fn ascender(&self) -> f32 {
            800.0
        }
        fn descender(&self) -> f32 {
            -200.0
        }
        fn units_per_em(&self) -> f32 {
            1000.0
        }
        fn measure(&self, text: &str, _font_size: f32) -> TextBounds {
            TextBounds { x1: 0.0, y1: -8.0, x2: text.chars().count() as f32 * self.advance, y2: 2.0 }
        }
    }

    fn rect_mask(w: u32, h: u32, x1: i32, y1: i32, x2: i32, y2: i32) -> PixelMask {
        let mut img = RgbaImage::new(w, h);
        SelectionShape::rectangle(x1, y1, x2, y2).fill(&mut img, SelectionColor::SELECTED);
        PixelMask::from_image(&img)
    }

    #[test]
    fn line_height_rounds_half_up() {
        let font = FixedFont { advance: 1.0 };
        assert_eq!(line_height(&font, 12.0, 5.0), 17);
        assert_eq!(line_height(&font, 12.5, 0.0), 13);
    }

    #[test]
    fn splitting_drops_break_spaces() {
        let text = "one two three";
        let breaks = split_positions(text);
        assert_eq!(breaks, vec![3, 7]);
        assert_eq!(split_text(text, &breaks, &[]), vec!["one two three"]);
        assert_eq!(split_text(text, &breaks, &[1]), vec!["one two", "three"]);
        assert_eq!(split_text(text, &breaks, &[0, 1]), vec!["one", "two", "three"]);
    }

    #[test]
    fn line_bounds_follow_rectangle() {
        let mask = rect_mask(100, 60, 20, 10, 80, 50);
        let bounds = mask.bounding_box().unwrap();
        let lines = line_infos(&mask, &bounds, 1, 10, (50, 30)).unwrap();
        assert_eq!(
            lines,
            vec![LineInfo { baseline_y: 35.0, left_bound: 20, right_bound: 79, center_justified_width_limit: 58.0 }]
        );
        // Band pushed past the top edge of the blob.
        assert_eq!(line_infos(&mask, &bounds, 5, 10, (50, 12)), None);
    }

    #[test]
    fn short_text_fits_on_one_line() {
        let mask = rect_mask(200, 100, 0, 0, 200, 100);
        let font = FixedFont { advance: 10.0 };
        let placement = typeset(&mask, "hi there", &font, 12.0, 5.0).unwrap();
        assert_eq!(placement.lines.len(), 1);
        assert_eq!(placement.center, (99, 49));
        assert_eq!(placement.lines[0].text, "hi there");
        assert_eq!(placement.lines[0].origin_x, 59.0);
        assert_eq!(placement.score, 0.0);
    }

    #[test]
    fn unbreakable_text_that_is_too_wide_fails() {
        let mask = rect_mask(200, 100, 0, 0, 200, 100);
        let font = FixedFont { advance: 30.0 };
        let err = typeset(&mask, "Supercalifragilistic", &font, 12.0, 5.0).unwrap_err();
        assert_eq!(err, TypesetError::NoFeasibleSplit);
        assert!(err.is_abort());
    }

    #[test]
    fn empty_selection_is_an_error_not_an_abort() {
        let font = FixedFont { advance: 10.0 };
        let err = typeset(&PixelMask::empty(50, 50), "x", &font, 12.0, 5.0).unwrap_err();
        assert_eq!(err, TypesetError::Mask(MaskError::EmptySelection));
        assert!(!err.is_abort());
    }

    // DejaVu Sans Mono: 2048 units per em, hhea 1901 / -483, every advance 1233.
    fn mono() -> FontArc {
        FontArc::try_from_slice(include_bytes!("../../tests/fonts/DejaVuSansMono.ttf")).unwrap()
    }

    #[test]
    fn real_font_metrics() {
        let font = mono();
        assert_eq!(FontMetrics::ascender(&font), 1901.0);
        assert_eq!(FontMetrics::descender(&font), -483.0);
        assert_eq!(FontMetrics::units_per_em(&font), 2048.0);
        // 5 + 20 * 2384 / 2048 = 28.28
        assert_eq!(line_height(&font, 20.0, 5.0), 28);
    }

    #[test]
    fn em_scale_sets_advance_per_em() {
        let font = mono();
        let scaled = font.as_scaled(em_scale(&font, 20.48));
        assert!((scaled.h_advance(font.glyph_id('H')) - 12.33).abs() < 1e-3);
    }

    #[test]
    fn measure_tracks_glyph_advances() {
        let font = mono();
        assert_eq!(font.measure("", 20.48), TextBounds::default());
        let two = font.measure("HH", 20.48);
        let four = font.measure("HHHH", 20.48);
        assert!(((four.width() - two.width()) - 2.0 * 12.33).abs() <= 1.0);
        assert!(two.y1 < 0.0 && two.y2 <= 1.0);
        let doubled = font.measure("HH", 40.96);
        assert!((doubled.width() - 2.0 * two.width()).abs() <= 4.0);
    }

    #[test]
    fn real_font_lines_are_centred_on_the_centroid() {
        let font = mono();
        let mask = rect_mask(300, 120, 0, 0, 300, 120);
        let placement = typeset(&mask, "Hi there", &font, 16.0, 4.0).unwrap();
        let line = &placement.lines[0];
        let b = font.measure(&line.text, 16.0);
        let ink_centre = line.origin_x + (b.x1 + b.x2) as f64 / 2.0;
        assert!((ink_centre - placement.center.0 as f64).abs() <= 0.5);
    }

    #[test]
    fn rasterize_placement_inks_only_near_the_line() {
        let font = mono();
        let white = Rgba([255, 255, 255, 255]);
        let mut img = RgbaImage::from_pixel(60, 40, white);
        let placement = Placement {
            lines: vec![PlacedLine { text: "H".to_string(), baseline_y: 30.0, origin_x: 10.0, width: 12.0 }],
            center: (16, 24),
            line_height: 24,
            score: 0.0,
        };
        rasterize_placement(&font, &placement, 20.0, Rgba([0, 0, 0, 255]), &mut img);
        let inked: Vec<(u32, u32)> =
            img.enumerate_pixels().filter(|(_, _, p)| **p != white).map(|(x, y, _)| (x, y)).collect();
        assert!(!inked.is_empty());
        assert!(inked.iter().all(|&(x, y)| (10..=23).contains(&x) && (10..=30).contains(&y)));
    }
}

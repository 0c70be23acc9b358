use crate::canvas::{PixelMask, SelectionColor, SelectionShape};
use image::{Rgba, RgbaImage};
use log::{debug, warn};
use std::fmt;
use thiserror::Error;

use crate::canvas::MaskError;

pub const DEFAULT_BRUSH_RADIUS: u32 = 5;
pub const MIN_BRUSH_RADIUS: u32 = 1;
pub const MAX_BRUSH_RADIUS: u32 = 100;
pub const DEFAULT_FLOOD_THRESHOLD: f32 = 0.08;

// ============================================================================
// TOOL KINDS + SHARED SETTINGS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum SelectionTool {
    #[default]
    Rectangle,
    Ellipse,
    FloodFill,
    Brush,
}

impl SelectionTool {
    pub fn label(&self) -> &'static str {
        match self {
            SelectionTool::Rectangle => "Rectangle",
            SelectionTool::Ellipse => "Ellipse",
            SelectionTool::FloodFill => "Flood Fill",
            SelectionTool::Brush => "Brush",
        }
    }

    /// Short key used in config files and CLI selection steps.
    pub fn key(&self) -> &'static str {
        match self {
            SelectionTool::Rectangle => "rect",
            SelectionTool::Ellipse => "ellipse",
            SelectionTool::FloodFill => "flood",
            SelectionTool::Brush => "brush",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::all().iter().copied().find(|t| t.key() == key)
    }

    pub fn all() -> &'static [SelectionTool] {
        &[
            SelectionTool::Rectangle,
            SelectionTool::Ellipse,
            SelectionTool::FloodFill,
            SelectionTool::Brush,
        ]
    }
}

impl fmt::Display for SelectionTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tool options shared by every selection layer of a document.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionSettings {
    pub active_tool: SelectionTool,
    pub active_mode: crate::canvas::SelectionMode,
    /// Brush radius in pixels, 1–100.
    pub brush_radius: u32,
    /// Flood-fill colour tolerance as a fraction of the RGB cube diagonal, 0–1.
    pub flood_threshold: f32,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            active_tool: SelectionTool::Rectangle,
            active_mode: crate::canvas::SelectionMode::Replace,
            brush_radius: DEFAULT_BRUSH_RADIUS,
            flood_threshold: DEFAULT_FLOOD_THRESHOLD,
        }
    }
}

impl SelectionSettings {
    pub fn set_brush_radius(&mut self, radius: u32) {
        self.brush_radius = radius.clamp(MIN_BRUSH_RADIUS, MAX_BRUSH_RADIUS);
    }

    /// Clamp to [0, 1] and snap to the 0.01 slider step.
    pub fn set_flood_threshold(&mut self, threshold: f32) {
        let t = if threshold.is_finite() { threshold.clamp(0.0, 1.0) } else { DEFAULT_FLOOD_THRESHOLD };
        self.flood_threshold = (t * 100.0).round() / 100.0;
    }

    /// Integer RGB distance below which a pixel joins the fill.
    pub fn flood_distance_threshold(&self) -> u32 {
        flood_distance_threshold(self.flood_threshold)
    }
}

pub fn flood_distance_threshold(fraction: f32) -> u32 {
    1 + (fraction as f64 * 255.0 * 3f64.sqrt()).floor() as u32
}

// ============================================================================
// ERRORS
// ============================================================================

/// Lifecycle of a selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectorPhase {
    Idle,
    Pending,
    Finalized,
    Cancelled,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SelectionError {
    #[error("cannot start a {requested} selection while a {pending} selection is pending")]
    ConcurrentSelection { pending: SelectionTool, requested: SelectionTool },
    #[error("cannot {operation} a selector in the {phase:?} state")]
    State { operation: &'static str, phase: SelectorPhase },
    #[error("no selection layer with id {0}")]
    UnknownLayer(u32),
    #[error(transparent)]
    Mask(#[from] MaskError),
}

// ============================================================================
// ACTIVE SELECTOR – one in-progress drawing
// ============================================================================

#[derive(Clone, Debug)]
enum SelectorGeometry {
    Rectangle { anchor: (i32, i32), current: (i32, i32) },
    Ellipse { anchor: (i32, i32), current: (i32, i32) },
    /// Filled at start, `None` until then.
    FloodFill { threshold: u32, filled: Option<RgbaImage> },
    /// Stroke polyline; `last` is the previous update point.
    Brush { radius: u32, shapes: Vec<SelectionShape>, last: (i32, i32) },
}

/// A selection tool between mouse-down and mouse-up.
#[derive(Clone, Debug)]
pub struct ActiveSelector {
    tool: SelectionTool,
    phase: SelectorPhase,
    width: u32,
    height: u32,
    geometry: SelectorGeometry,
}

impl ActiveSelector {
    pub fn new(tool: SelectionTool, settings: &SelectionSettings) -> Self {
        let geometry = match tool {
            SelectionTool::Rectangle => SelectorGeometry::Rectangle { anchor: (0, 0), current: (0, 0) },
            SelectionTool::Ellipse => SelectorGeometry::Ellipse { anchor: (0, 0), current: (0, 0) },
            SelectionTool::FloodFill => SelectorGeometry::FloodFill {
                threshold: settings.flood_distance_threshold(),
                filled: None,
            },
            SelectionTool::Brush => SelectorGeometry::Brush {
                radius: settings.brush_radius.clamp(MIN_BRUSH_RADIUS, MAX_BRUSH_RADIUS),
                shapes: Vec::new(),
                last: (0, 0),
            },
        };
        Self { tool, phase: SelectorPhase::Idle, width: 0, height: 0, geometry }
    }

    pub fn tool(&self) -> SelectionTool {
        self.tool
    }

    pub fn phase(&self) -> SelectorPhase {
        self.phase
    }

    fn require(&self, operation: &'static str, phase: SelectorPhase) -> Result<(), SelectionError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(SelectionError::State { operation, phase: self.phase })
        }
    }

    /// Idle → Pending. `surface` is the working image: its size fixes the
    /// mask dimensions and the flood fill samples its colours.
    pub fn start_pending(&mut self, x: i32, y: i32, surface: &RgbaImage) -> Result<(), SelectionError> {
        self.require("start", SelectorPhase::Idle)?;
        self.width = surface.width();
        self.height = surface.height();

        match &mut self.geometry {
            SelectorGeometry::Rectangle { anchor, current } | SelectorGeometry::Ellipse { anchor, current } => {
                *anchor = (x, y);
                *current = (x, y);
            }
            SelectorGeometry::FloodFill { threshold, filled } => {
                *filled = Some(flood_fill(surface, x, y, *threshold));
            }
            SelectorGeometry::Brush { radius, shapes, last } => {
                // Cover the initial click even if the pointer never moves.
                shapes.push(SelectionShape::Disc { cx: x as f32, cy: y as f32, r: *radius as f32 });
                *last = (x, y);
            }
        }
        self.phase = SelectorPhase::Pending;
        Ok(())
    }

    /// Track the pointer while Pending. No-op for flood fill.
    pub fn update_pending(&mut self, x: i32, y: i32) -> Result<(), SelectionError> {
        self.require("update", SelectorPhase::Pending)?;
        match &mut self.geometry {
            SelectorGeometry::Rectangle { current, .. } | SelectorGeometry::Ellipse { current, .. } => {
                *current = (x, y);
            }
            SelectorGeometry::FloodFill { .. } => {}
            SelectorGeometry::Brush { radius, shapes, last } => {
                let r = *radius as f32;
                shapes.push(SelectionShape::Segment {
                    x0: last.0 as f32,
                    y0: last.1 as f32,
                    x1: x as f32,
                    y1: y as f32,
                    r,
                });
                shapes.push(SelectionShape::Disc { cx: x as f32, cy: y as f32, r });
                *last = (x, y);
            }
        }
        Ok(())
    }

    /// Shapes making up the current preview.
    pub fn shapes(&self) -> Vec<SelectionShape> {
        match &self.geometry {
            SelectorGeometry::Rectangle { anchor, current } => {
                vec![SelectionShape::rectangle(anchor.0, anchor.1, current.0, current.1)]
            }
            SelectorGeometry::Ellipse { anchor, current } => {
                // i64 so drags across the whole i32 range cannot overflow.
                let (ax, ay) = (anchor.0 as i64, anchor.1 as i64);
                let (px, py) = (current.0 as i64, current.1 as i64);
                let cx = (ax + px) / 2;
                let cy = (ay + py) / 2;
                vec![SelectionShape::Ellipse {
                    cx: cx as f32,
                    cy: cy as f32,
                    rx: (px - cx).abs() as f32,
                    ry: (py - cy).abs() as f32,
                }]
            }
            SelectorGeometry::FloodFill { .. } => Vec::new(),
            SelectorGeometry::Brush { shapes, .. } => shapes.clone(),
        }
    }

    /// Render the in-progress selection in the tool preview colour.
    pub fn rasterize(&self) -> RgbaImage {
        if let SelectorGeometry::FloodFill { filled: Some(img), .. } = &self.geometry {
            return img.clone();
        }
        let mut layer = RgbaImage::new(self.width, self.height);
        for shape in self.shapes() {
            shape.fill(&mut layer, SelectionColor::SELECTED);
        }
        layer
    }

    /// Pending → Finalized, producing the selection mask.
    pub fn finalize(&mut self) -> Result<PixelMask, SelectionError> {
        self.require("finalize", SelectorPhase::Pending)?;
        let layer = self.rasterize();
        let mask = PixelMask::from_alpha_test(layer.as_raw(), self.width, self.height, |a| {
            a >= crate::canvas::SELECTED_ALPHA
        })?;
        self.phase = SelectorPhase::Finalized;
        debug!("{} selection finalized, {} px", self.tool, mask.count_selected());
        Ok(mask)
    }

    /// Pending → Cancelled. The selector is discarded by its owner.
    pub fn cancel(&mut self) -> Result<(), SelectionError> {
        self.require("cancel", SelectorPhase::Pending)?;
        self.phase = SelectorPhase::Cancelled;
        Ok(())
    }
}

// ============================================================================
// FLOOD FILL
// ============================================================================

#[inline]
fn rgb_distance(a: &Rgba<u8>, b: &Rgba<u8>) -> f64 {
    let dr = a[0] as f64 - b[0] as f64;
    let dg = a[1] as f64 - b[1] as f64;
    let db = a[2] as f64 - b[2] as f64;
    (dr * dr + dg * dg + db * db).sqrt()
}

/// Grow a region from `(x, y)` over 4-connected pixels whose RGB distance to
/// the seed colour is below `threshold`. Accepted pixels get alpha 255.
pub fn flood_fill(source: &RgbaImage, x: i32, y: i32, threshold: u32) -> RgbaImage {
    let width = source.width();
    let height = source.height();
    let mut dest = RgbaImage::new(width, height);
    if x < 0 || y < 0 || x as u32 >= width || y as u32 >= height {
        warn!("flood fill seed ({x}, {y}) outside {width}x{height} image");
        return dest;
    }

    let w = width as usize;
    let seed = *source.get_pixel(x as u32, y as u32);
    let threshold = threshold as f64;
    let mut seen = vec![false; w * height as usize];
    let mut stack = vec![(x as u32, y as u32)];
    seen[y as usize * w + x as usize] = true;

    while let Some((px, py)) = stack.pop() {
        if rgb_distance(&seed, source.get_pixel(px, py)) >= threshold {
            continue;
        }
        dest.put_pixel(px, py, SelectionColor::SELECTED);

        let mut visit = |nx: u32, ny: u32| {
            let vi = ny as usize * w + nx as usize;
            if !seen[vi] {
                seen[vi] = true;
                stack.push((nx, ny));
            }
        };
        if px > 0 {
            visit(px - 1, py);
        }
        if py > 0 {
            visit(px, py - 1);
        }
        if px + 1 < width {
            visit(px + 1, py);
        }
        if py + 1 < height {
            visit(px, py + 1);
        }
    }
    dest
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn surface(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]))
    }

    fn finish(tool: SelectionTool, points: &[(i32, i32)], img: &RgbaImage) -> PixelMask {
        let mut sel = ActiveSelector::new(tool, &SelectionSettings::default());
        sel.start_pending(points[0].0, points[0].1, img).unwrap();
        for &(x, y) in &points[1..] {
            sel.update_pending(x, y).unwrap();
        }
        sel.finalize().unwrap()
    }

    #[test]
    fn threshold_formula() {
        assert_eq!(flood_distance_threshold(0.0), 1);
        assert_eq!(flood_distance_threshold(0.08), 36);
        assert_eq!(flood_distance_threshold(1.0), 442);
    }

    #[test]
    fn rectangle_normalizes_corners() {
        let img = surface(20, 20);
        let mask = finish(SelectionTool::Rectangle, &[(12, 9), (4, 3)], &img);
        assert_eq!(mask.count_selected(), 8 * 6);
        assert!(mask.pixel_at(4, 3).unwrap());
        assert!(mask.pixel_at(11, 8).unwrap());
        assert!(!mask.pixel_at(12, 8).unwrap());
    }

    #[test]
    fn rectangle_without_update_is_empty() {
        let img = surface(10, 10);
        assert!(finish(SelectionTool::Rectangle, &[(5, 5)], &img).is_empty());
    }

    #[test]
    fn ellipse_is_centred_between_points() {
        let img = surface(40, 40);
        let mask = finish(SelectionTool::Ellipse, &[(10, 10), (30, 20)], &img);
        assert!(mask.pixel_at(20, 15).unwrap());
        assert!(mask.pixel_at(11, 15).unwrap());
        assert!(!mask.pixel_at(10, 10).unwrap());
        assert!(!mask.pixel_at(31, 15).unwrap());
    }

    #[test]
    fn brush_stroke_has_no_gaps() {
        let img = surface(100, 30);
        let mask = finish(SelectionTool::Brush, &[(10, 15), (90, 15)], &img);
        for x in 10..90 {
            assert!(mask.pixel_at(x, 15).unwrap(), "gap at x = {x}");
        }
        assert!(mask.pixel_at(50, 19).unwrap());
        assert!(!mask.pixel_at(50, 22).unwrap());
    }

    #[test]
    fn flood_fill_stops_at_colour_edge() {
        let mut img = surface(10, 10);
        for y in 0..10 {
            for x in 5..10 {
                img.put_pixel(x, y, Rgba([0, 0, 0, 255]));
            }
        }
        // Slightly off-white, still within the default tolerance.
        img.put_pixel(2, 2, Rgba([240, 240, 240, 255]));
        let mask = finish(SelectionTool::FloodFill, &[(1, 1), (8, 8)], &img);
        assert_eq!(mask.count_selected(), 50);
        assert!(mask.pixel_at(2, 2).unwrap());
        assert!(!mask.pixel_at(5, 0).unwrap());
    }

    #[test]
    fn ellipse_with_extreme_coordinates() {
        let img = surface(8, 8);
        let far_off = finish(SelectionTool::Ellipse, &[(2_000_000_000, 0), (2_000_000_000, 5)], &img);
        assert!(far_off.is_empty());
        let huge = finish(SelectionTool::Ellipse, &[(i32::MIN, i32::MIN), (i32::MAX, i32::MAX)], &img);
        assert_eq!(huge.count_selected(), 64);
    }

    #[test]
    fn flood_fill_threshold_is_strict() {
        let mut img = surface(3, 1);
        // exactly 36 away from white along the red axis
        img.put_pixel(1, 0, Rgba([255 - 36, 255, 255, 255]));
        img.put_pixel(2, 0, Rgba([255 - 35, 255, 255, 255]));
        let fill = flood_fill(&img, 0, 0, 36);
        assert_eq!(fill.get_pixel(1, 0)[3], 0);
        assert_eq!(fill.get_pixel(2, 0)[3], 0);
        let fill = flood_fill(&img, 2, 0, 36);
        assert_eq!(fill.get_pixel(2, 0)[3], 255);
    }

    #[test]
    fn flood_fill_outside_image_selects_nothing() {
        let img = surface(4, 4);
        let fill = flood_fill(&img, -1, 2, 36);
        assert!(fill.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn lifecycle_is_enforced() {
        let img = surface(4, 4);
        let mut sel = ActiveSelector::new(SelectionTool::Rectangle, &SelectionSettings::default());
        assert_eq!(
            sel.update_pending(1, 1).unwrap_err(),
            SelectionError::State { operation: "update", phase: SelectorPhase::Idle }
        );
        assert!(sel.finalize().is_err());
        sel.start_pending(0, 0, &img).unwrap();
        assert!(sel.start_pending(0, 0, &img).is_err());
        sel.finalize().unwrap();
        assert_eq!(sel.phase(), SelectorPhase::Finalized);
        assert!(sel.finalize().is_err());
        assert!(sel.cancel().is_err());
    }

    #[test]
    fn settings_are_clamped() {
        let mut s = SelectionSettings::default();
        s.set_brush_radius(0);
        assert_eq!(s.brush_radius, 1);
        s.set_brush_radius(250);
        assert_eq!(s.brush_radius, 100);
        s.set_flood_threshold(1.7);
        assert_eq!(s.flood_threshold, 1.0);
        s.set_flood_threshold(0.123);
        assert_eq!(s.flood_threshold, 0.12);
    }
}

use ab_glyph::FontArc;
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::canvas::MaskError;
use crate::components::layers::{blend_over, SelectionSet};
use crate::components::tools::{ActiveSelector, SelectionError};
use crate::io::{load_image, IoError};
use crate::ops::text::{rasterize_placement, typeset_with, FontMetrics, Placement, TypesetError, TypesetOptions};
use crate::settings::AppSettings;

/// Single open document: a photo and the selection layers drawn over it.
///
/// Tool settings live on `selections`; [`Project::settings`] reassembles the
/// full [`AppSettings`] when they need saving.
pub struct Project {
    pub id: Uuid,
    pub image: RgbaImage,
    pub selections: SelectionSet,
    pub typeset: TypesetOptions,
    pub active_color: Rgba<u8>,
    pub inactive_color: Rgba<u8>,
    pub text_color: Rgba<u8>,
    /// `None` for untitled documents.
    pub path: Option<PathBuf>,
    /// Display name (derived from path or "Untitled-X")
    pub name: String,
    /// Placed text per selection layer id.
    placements: Vec<(u32, Placement)>,
}

impl Project {
    pub fn new_untitled(untitled_counter: usize, width: u32, height: u32, settings: AppSettings) -> Self {
        Self::with_image(
            format!("Untitled-{}", untitled_counter),
            None,
            RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])),
            settings,
        )
    }

    pub fn from_file(path: &Path, settings: AppSettings) -> Result<Self, IoError> {
        let image = load_image(path)?;
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "Unknown".to_string());
        Ok(Self::with_image(name, Some(path.to_path_buf()), image, settings))
    }

    pub fn with_image(name: String, path: Option<PathBuf>, image: RgbaImage, settings: AppSettings) -> Self {
        let AppSettings { selection, typeset, active_color, inactive_color, text_color } = settings;
        Self {
            id: Uuid::new_v4(),
            selections: SelectionSet::new(image.width(), image.height(), selection),
            image,
            typeset,
            active_color,
            inactive_color,
            text_color,
            path,
            name,
            placements: Vec::new(),
        }
    }

    /// Current settings, including any tool changes made through `selections`.
    pub fn settings(&self) -> AppSettings {
        AppSettings {
            selection: self.selections.settings.clone(),
            typeset: self.typeset.clone(),
            active_color: self.active_color,
            inactive_color: self.inactive_color,
            text_color: self.text_color,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    // -- selection routing ---------------------------------------------------

    pub fn begin_selection(&mut self, x: i32, y: i32) -> Result<&ActiveSelector, SelectionError> {
        self.selections.begin_selection(&self.image, x, y)
    }

    pub fn update_selection(&mut self, x: i32, y: i32) -> Result<(), SelectionError> {
        self.selections.active_layer_mut().update_selection(x, y)
    }

    pub fn finish_selection(&mut self) -> Result<usize, SelectionError> {
        let composite = self.selections.active_layer_mut().finish_selection()?;
        Ok(composite.count_selected())
    }

    pub fn cancel_selection(&mut self) -> Result<(), SelectionError> {
        self.selections.active_layer_mut().cancel_selection()
    }

    pub fn undo(&mut self) -> Result<Option<String>, SelectionError> {
        self.selections.active_layer_mut().undo()
    }

    pub fn redo(&mut self) -> Result<Option<String>, SelectionError> {
        self.selections.active_layer_mut().redo()
    }

    // -- text ----------------------------------------------------------------

    /// Lay out `text` inside the active layer's composite and remember the result.
    pub fn typeset_active<F: FontMetrics + ?Sized>(&mut self, text: &str, font: &F) -> Result<&Placement, TypesetError> {
        let Some(layer) = self.selections.active_layer() else {
            return Err(MaskError::EmptySelection.into());
        };
        let id = layer.id();
        let placement = typeset_with(layer.composite(), text, font, &self.typeset)?;
        self.placements.retain(|(layer_id, _)| *layer_id != id);
        self.placements.push((id, placement));
        Ok(&self.placements[self.placements.len() - 1].1)
    }

    pub fn placement(&self, layer_id: u32) -> Option<&Placement> {
        self.placements.iter().find(|(id, _)| *id == layer_id).map(|(_, p)| p)
    }

    // -- output --------------------------------------------------------------

    /// Photo with every selection overlay blended on top.
    pub fn compose_overlay(&self) -> RgbaImage {
        let overlay = self.selections.overlay_image_with(self.active_color, self.inactive_color);
        let mut out = self.image.clone();
        for (dst, src) in out.pixels_mut().zip(overlay.pixels()) {
            if src[3] > 0 {
                *dst = blend_over(*dst, *src);
            }
        }
        out
    }

    /// Photo with all placed text drawn in, optionally over the selection overlay.
    pub fn render(&self, font: &FontArc, with_overlay: bool) -> RgbaImage {
        let mut out = if with_overlay { self.compose_overlay() } else { self.image.clone() };
        for (_, placement) in &self.placements {
            rasterize_placement(font, placement, self.typeset.font_size, self.text_color, &mut out);
        }
        out
    }

    /// Get the display title
    pub fn display_title(&self) -> String {
        format!("{} ({} layer(s))", self.name, self.selections.layers().len())
    }
}

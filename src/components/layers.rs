use image::{Rgba, RgbaImage};
use log::debug;

use crate::canvas::{MaskError, PixelMask, SelectionColor, SelectionMode};
use crate::components::history::{SelectionHistory, SelectionRecord};
use crate::components::tools::{ActiveSelector, SelectionError, SelectionSettings, SelectionTool, SelectorPhase};

/// A selector in flight together with the mode it will merge with.
#[derive(Clone, Debug)]
struct PendingSelection {
    selector: ActiveSelector,
    mode: SelectionMode,
}

// ============================================================================
// SELECTION LAYER – one text box worth of selection
// ============================================================================

/// Selection history plus the cached composite mask it produces.
///
/// At most one selector may be pending; `composite` always equals
/// `history.replay()`.
#[derive(Clone, Debug)]
pub struct SelectionLayer {
    id: u32,
    width: u32,
    height: u32,
    history: SelectionHistory,
    composite: PixelMask,
    pending: Option<PendingSelection>,
    active: bool,
}

impl SelectionLayer {
    pub fn new(id: u32, width: u32, height: u32) -> Self {
        Self {
            id,
            width,
            height,
            history: SelectionHistory::new(),
            composite: PixelMask::empty(width, height),
            pending: None,
            active: false,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn composite(&self) -> &PixelMask {
        &self.composite
    }

    pub fn history(&self) -> &SelectionHistory {
        &self.history
    }

    pub fn pending(&self) -> Option<&ActiveSelector> {
        self.pending.as_ref().map(|p| &p.selector)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Overlay colour: MASK while active, INACTIVE otherwise.
    pub fn draw_color(&self) -> Rgba<u8> {
        if self.active { SelectionColor::MASK } else { SelectionColor::INACTIVE }
    }

    /// Mouse-down: start a new selector on `surface`.
    pub fn begin_selection(
        &mut self,
        surface: &RgbaImage,
        tool: SelectionTool,
        mode: SelectionMode,
        settings: &SelectionSettings,
        x: i32,
        y: i32,
    ) -> Result<&ActiveSelector, SelectionError> {
        if let Some(pending) = &self.pending {
            return Err(SelectionError::ConcurrentSelection {
                pending: pending.selector.tool(),
                requested: tool,
            });
        }
        if surface.width() != self.width || surface.height() != self.height {
            return Err(MaskError::DimensionMismatch {
                left_width: self.width,
                left_height: self.height,
                right_width: surface.width(),
                right_height: surface.height(),
            }
            .into());
        }

        let mut selector = ActiveSelector::new(tool, settings);
        selector.start_pending(x, y, surface)?;
        debug!("layer {}: begin {} selection ({}) at ({x}, {y})", self.id, tool, mode);
        let pending = self.pending.insert(PendingSelection { selector, mode });
        Ok(&pending.selector)
    }

    /// Mouse-move: forward to the pending selector.
    pub fn update_selection(&mut self, x: i32, y: i32) -> Result<(), SelectionError> {
        match self.pending.as_mut() {
            Some(pending) => pending.selector.update_pending(x, y),
            None => Err(SelectionError::State { operation: "update", phase: SelectorPhase::Idle }),
        }
    }

    /// Mouse-up: finalize the pending selector and merge it into the composite.
    pub fn finish_selection(&mut self) -> Result<&PixelMask, SelectionError> {
        let Some(mut pending) = self.pending.take() else {
            return Err(SelectionError::State { operation: "finalize", phase: SelectorPhase::Idle });
        };
        let mask = pending.selector.finalize()?;
        let record = SelectionRecord::new(mask, pending.mode, pending.selector.tool());
        self.composite = record.merge_into(&self.composite)?;
        debug!("layer {}: {} -> {} px selected", self.id, record.description(), self.composite.count_selected());
        self.history.push(record);
        Ok(&self.composite)
    }

    /// Drop the pending selector without touching history.
    pub fn cancel_selection(&mut self) -> Result<(), SelectionError> {
        let Some(mut pending) = self.pending.take() else {
            return Err(SelectionError::State { operation: "cancel", phase: SelectorPhase::Idle });
        };
        pending.selector.cancel()
    }

    /// Returns the description of the undone selection, `None` if history is empty.
    pub fn undo(&mut self) -> Result<Option<String>, SelectionError> {
        let Some(description) = self.history.undo().map(|r| r.description()) else {
            return Ok(None);
        };
        self.composite = self.history.replay(self.width, self.height)?;
        Ok(Some(description))
    }

    /// Returns the description of the redone selection, `None` if nothing to redo.
    pub fn redo(&mut self) -> Result<Option<String>, SelectionError> {
        let Some(record) = self.history.redo() else {
            return Ok(None);
        };
        let description = record.description();
        self.composite = record.merge_into(&self.composite)?;
        Ok(Some(description))
    }

    /// Composite overlay as RGBA bytes in this layer's draw colour.
    pub fn overlay(&self) -> Vec<u8> {
        self.composite.to_color_buffer(self.draw_color())
    }
}

// ============================================================================
// SELECTION SET – all selection layers of one image
// ============================================================================

/// Selection layers of a document; exactly one is active once any exist.
#[derive(Clone, Debug)]
pub struct SelectionSet {
    width: u32,
    height: u32,
    layers: Vec<SelectionLayer>,
    next_id: u32,
    active_layer: Option<u32>,
    pub settings: SelectionSettings,
}

impl SelectionSet {
    pub fn new(width: u32, height: u32, settings: SelectionSettings) -> Self {
        Self { width, height, layers: Vec::new(), next_id: 1, active_layer: None, settings }
    }

    /// Create a layer and make it the active one.
    pub fn add_layer(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        for layer in &mut self.layers {
            layer.deactivate();
        }
        let mut layer = SelectionLayer::new(id, self.width, self.height);
        layer.activate();
        self.layers.push(layer);
        self.active_layer = Some(id);
        id
    }

    pub fn change_active_layer(&mut self, id: u32) -> Result<(), SelectionError> {
        if !self.layers.iter().any(|l| l.id == id) {
            return Err(SelectionError::UnknownLayer(id));
        }
        for layer in &mut self.layers {
            if layer.id == id {
                layer.activate();
            } else {
                layer.deactivate();
            }
        }
        self.active_layer = Some(id);
        Ok(())
    }

    pub fn layers(&self) -> &[SelectionLayer] {
        &self.layers
    }

    pub fn layer(&self, id: u32) -> Option<&SelectionLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn active_layer_id(&self) -> Option<u32> {
        self.active_layer
    }

    pub fn active_layer(&self) -> Option<&SelectionLayer> {
        self.active_layer.and_then(|id| self.layer(id))
    }

    /// Active layer, created on demand.
    pub fn active_layer_mut(&mut self) -> &mut SelectionLayer {
        let id = match self.active_layer {
            Some(id) => id,
            None => self.add_layer(),
        };
        let idx = self.layers.iter().position(|l| l.id == id).unwrap_or(0);
        &mut self.layers[idx]
    }

    /// Start a selection on the active layer with the current tool settings.
    pub fn begin_selection(&mut self, surface: &RgbaImage, x: i32, y: i32) -> Result<&ActiveSelector, SelectionError> {
        let settings = self.settings.clone();
        self.active_layer_mut()
            .begin_selection(surface, settings.active_tool, settings.active_mode, &settings, x, y)
    }

    /// Alpha-composite every layer overlay, active layer last.
    pub fn overlay_image(&self) -> RgbaImage {
        self.overlay_image_with(SelectionColor::MASK, SelectionColor::INACTIVE)
    }

    /// Same as [`overlay_image`](Self::overlay_image) with custom layer colours.
    pub fn overlay_image_with(&self, active_color: Rgba<u8>, inactive_color: Rgba<u8>) -> RgbaImage {
        let mut out = RgbaImage::new(self.width, self.height);
        let ordered = self
            .layers
            .iter()
            .filter(|l| !l.active)
            .chain(self.layers.iter().filter(|l| l.active));
        for layer in ordered {
            let color = if layer.active { active_color } else { inactive_color };
            for (x, y, px) in out.enumerate_pixels_mut() {
                if layer.composite.get(x, y) {
                    *px = blend_over(*px, color);
                }
            }
        }
        out
    }
}

/// Source-over blend of straight-alpha `src` onto `dst`.
pub fn blend_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let ch = |i: usize| {
        let v = (src[i] as f32 * sa + dst[i] as f32 * da * (1.0 - sa)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgba([ch(0), ch(1), ch(2), (out_a * 255.0).round() as u8])
}

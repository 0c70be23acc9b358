use crate::canvas::{MaskError, PixelMask, SelectionMode};
use crate::components::tools::SelectionTool;

// ============================================================================
// SELECTION RECORD
// ============================================================================

/// One finalized selection and how it merges into the composite.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionRecord {
    mask: PixelMask,
    mode: SelectionMode,
    tool: SelectionTool,
}

impl SelectionRecord {
    pub fn new(mask: PixelMask, mode: SelectionMode, tool: SelectionTool) -> Self {
        Self { mask, mode, tool }
    }

    pub fn mask(&self) -> &PixelMask {
        &self.mask
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn tool(&self) -> SelectionTool {
        self.tool
    }

    pub fn description(&self) -> String {
        format!("{} ({})", self.tool, self.mode)
    }

    /// Fold this record into the running composite.
    pub fn merge_into(&self, composite: &PixelMask) -> Result<PixelMask, MaskError> {
        composite.combine(&self.mask, self.mode)
    }

    pub fn memory_size(&self) -> usize {
        self.mask.memory_size()
    }
}

// ============================================================================
// SELECTION HISTORY – selector stack + redo buffer
// ============================================================================

/// Undo/redo stacks of finalized selections.
#[derive(Clone, Debug, Default)]
pub struct SelectionHistory {
    undo_stack: Vec<SelectionRecord>,
    redo_stack: Vec<SelectionRecord>,
    /// Running memory total across both stacks.
    total_memory: usize,
}

impl SelectionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new selection. Clears the redo stack.
    pub fn push(&mut self, record: SelectionRecord) {
        for rec in self.redo_stack.drain(..) {
            self.total_memory = self.total_memory.saturating_sub(rec.memory_size());
        }
        self.total_memory += record.memory_size();
        self.undo_stack.push(record);
    }

    /// Move the newest record to the redo stack and return it.
    pub fn undo(&mut self) -> Option<&SelectionRecord> {
        let record = self.undo_stack.pop()?;
        self.redo_stack.push(record);
        self.redo_stack.last()
    }

    /// Move the newest undone record back and return it.
    pub fn redo(&mut self) -> Option<&SelectionRecord> {
        let record = self.redo_stack.pop()?;
        self.undo_stack.push(record);
        self.undo_stack.last()
    }

    pub fn records(&self) -> &[SelectionRecord] {
        &self.undo_stack
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.last().map(|r| r.description())
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(|r| r.description())
    }

    /// Get all undo descriptions (most recent first)
    pub fn undo_history(&self) -> Vec<String> {
        self.undo_stack.iter().rev().map(|r| r.description()).collect()
    }

    /// Mask bytes held by both stacks.
    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.total_memory = 0;
    }

    /// Rebuild the composite from scratch.
    pub fn replay(&self, width: u32, height: u32) -> Result<PixelMask, MaskError> {
        replay(&self.undo_stack, width, height)
    }
}

/// Composite of `records` on an empty `width`×`height` mask.
///
/// Starts at the newest `Replace` record: it overwrites everything merged
/// before it, so older records are skipped.
pub fn replay(records: &[SelectionRecord], width: u32, height: u32) -> Result<PixelMask, MaskError> {
    let start = records
        .iter()
        .rposition(|r| r.mode == SelectionMode::Replace)
        .unwrap_or(0);
    records[start..]
        .iter()
        .try_fold(PixelMask::empty(width, height), |acc, record| record.merge_into(&acc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::SelectionShape;
    use image::RgbaImage;
    use pretty_assertions::assert_eq;

    fn rect(x1: i32, y1: i32, x2: i32, y2: i32, mode: SelectionMode) -> SelectionRecord {
        let mut img = RgbaImage::new(16, 16);
        SelectionShape::rectangle(x1, y1, x2, y2).fill(&mut img, crate::canvas::SelectionColor::SELECTED);
        SelectionRecord::new(PixelMask::from_image(&img), mode, SelectionTool::Rectangle)
    }

    #[test]
    fn replay_of_nothing_is_empty() {
        assert_eq!(replay(&[], 16, 16).unwrap(), PixelMask::empty(16, 16));
    }

    #[test]
    fn replay_skips_records_before_last_replace() {
        let records = vec![
            rect(0, 0, 16, 16, SelectionMode::Add),
            rect(0, 0, 4, 4, SelectionMode::Subtract),
            rect(2, 2, 6, 6, SelectionMode::Replace),
            rect(4, 4, 8, 8, SelectionMode::Add),
        ];
        let composite = replay(&records, 16, 16).unwrap();
        let expected = records[2].mask().combine(records[3].mask(), SelectionMode::Add).unwrap();
        assert_eq!(composite, expected);
        assert_eq!(composite.count_selected(), 16 + 16 - 4);
    }

    #[test]
    fn push_clears_redo_and_tracks_memory() {
        let mut history = SelectionHistory::new();
        history.push(rect(0, 0, 4, 4, SelectionMode::Replace));
        history.push(rect(0, 0, 2, 2, SelectionMode::Subtract));
        assert_eq!(history.memory_usage(), 2 * 8 * 4);
        assert_eq!(history.undo().map(|r| r.mode()), Some(SelectionMode::Subtract));
        assert!(history.can_redo());
        history.push(rect(1, 1, 3, 3, SelectionMode::Intersect));
        assert!(!history.can_redo());
        assert_eq!(history.memory_usage(), 2 * 8 * 4);
        assert_eq!(
            history.undo_history(),
            vec!["Rectangle (Intersect)".to_string(), "Rectangle (Replace)".to_string()]
        );
    }

    #[test]
    fn undo_redo_on_empty_stacks() {
        let mut history = SelectionHistory::new();
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert_eq!(history.undo_description(), None);
        assert_eq!(history.redo_description(), None);
    }

    #[test]
    fn descriptions_and_clear() {
        let mut history = SelectionHistory::new();
        history.push(rect(0, 0, 4, 4, SelectionMode::Replace));
        history.push(rect(0, 0, 2, 2, SelectionMode::Add));
        history.undo();
        assert_eq!(history.undo_description(), Some("Rectangle (Replace)".to_string()));
        assert_eq!(history.redo_description(), Some("Rectangle (Add)".to_string()));

        history.clear();
        assert!(!history.can_undo() && !history.can_redo());
        assert_eq!(history.memory_usage(), 0);
        assert_eq!(history.replay(16, 16).unwrap(), PixelMask::empty(16, 16));
    }
}

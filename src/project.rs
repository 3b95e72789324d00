use std::path::PathBuf;
use uuid::Uuid;

use crate::canvas::{Color, PixelBuffer};
use crate::components::history::HistoryManager;
use crate::error::PaintResult;

/// Single open document: the canonical surface plus its undo history.
pub struct Project {
    pub id: Uuid,
    pub canvas: PixelBuffer,
    pub history: HistoryManager,
    /// Last export target; `None` until the canvas has been written out.
    pub path: Option<PathBuf>,
    pub is_dirty: bool,

    /// Display name (derived from path or "Untitled-X")
    pub name: String,
}

impl Project {
    pub fn new_untitled(untitled_counter: usize, width: u32, height: u32, background: Color) -> PaintResult<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            canvas: PixelBuffer::new_filled(width, height, background)?,
            history: HistoryManager::default(),
            path: None,
            is_dirty: false,
            name: format!("Untitled-{}", untitled_counter),
        })
    }

    /// Snapshot the canvas ahead of a mutation and flag the document as
    /// modified.
    pub fn begin_edit(&mut self, description: &str) {
        self.history.capture(&self.canvas, description);
        self.is_dirty = true;
    }

    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
    }

    /// Record a successful export.
    pub fn mark_saved(&mut self, path: PathBuf) {
        self.name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.name.clone());
        self.path = Some(path);
        self.is_dirty = false;
    }

    pub fn display_title(&self) -> String {
        if self.is_dirty {
            format!("{}*", self.name)
        } else {
            self.name.clone()
        }
    }
}

use std::collections::VecDeque;

use crate::canvas::{HistorySnapshot, PixelBuffer};
use crate::log_info;

/// Number of undo steps kept; the oldest snapshot is evicted past this.
pub const HISTORY_CAPACITY: usize = 20;

/// One undo step: the whole surface as it was before an action.
struct HistoryEntry {
    description: String,
    snapshot: HistorySnapshot,
}

// ============================================================================
// HISTORY MANAGER - bounded ring of full-surface snapshots
// ============================================================================

/// Undo history.  Every mutating action captures the surface first; undo
/// restores the most recent capture.
pub struct HistoryManager {
    undo_stack: VecDeque<HistoryEntry>,
    max_history_size: usize,
    /// Running memory total across all snapshots.
    total_memory: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(HISTORY_CAPACITY)
    }
}

impl HistoryManager {
    pub fn new(max_history_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(max_history_size.max(1)),
            max_history_size: max_history_size.max(1),
            total_memory: 0,
        }
    }

    /// Snapshot `canvas` before a mutation.  Evicts the oldest entry first
    /// when the ring is full.
    pub fn capture(&mut self, canvas: &PixelBuffer, description: &str) {
        self.prune(self.max_history_size - 1);
        let snapshot = canvas.snapshot();
        self.total_memory += snapshot.memory_bytes();
        self.undo_stack.push_back(HistoryEntry {
            description: description.to_string(),
            snapshot,
        });
        log_info!("History: captured before '{}' ({} step(s))", description, self.undo_stack.len());
    }

    /// Restore the most recent snapshot.  Returns its description, or
    /// `None` when there is nothing to undo (the canvas is left untouched).
    pub fn undo(&mut self, canvas: &mut PixelBuffer) -> Option<String> {
        let entry = self.undo_stack.pop_back()?;
        self.total_memory = self.total_memory.saturating_sub(entry.snapshot.memory_bytes());
        canvas.restore(&entry.snapshot);
        Some(entry.description)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.description.as_str())
    }

    /// All undo descriptions (most recent first)
    pub fn undo_history(&self) -> Vec<String> {
        self.undo_stack.iter().rev().map(|e| e.description.clone()).collect()
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn memory_usage(&self) -> usize {
        self.total_memory
    }

    fn prune(&mut self, keep: usize) {
        while self.undo_stack.len() > keep {
            if let Some(removed) = self.undo_stack.pop_front() {
                self.total_memory = self.total_memory.saturating_sub(removed.snapshot.memory_bytes());
                log_info!("History full; dropped oldest step '{}'", removed.description);
            }
        }
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.total_memory = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::WHITE;
    use image::Rgba;

    fn shade(i: u8) -> crate::canvas::Color {
        Rgba([i, i, i, 255])
    }

    #[test]
    fn undo_restores_pre_action_state() {
        let mut canvas = PixelBuffer::new_filled(4, 4, WHITE).unwrap();
        let mut history = HistoryManager::default();
        let before = canvas.clone();

        history.capture(&canvas, "Brush");
        canvas.set(1, 1, shade(0)).unwrap();

        assert_eq!(history.undo(&mut canvas).as_deref(), Some("Brush"));
        assert_eq!(canvas, before);
        assert!(!history.can_undo());
    }

    #[test]
    fn empty_history_undo_is_a_no_op() {
        let mut canvas = PixelBuffer::new_filled(2, 2, WHITE).unwrap();
        let mut history = HistoryManager::default();
        assert_eq!(history.undo(&mut canvas), None);
        assert!(canvas.is_uniform(WHITE));
    }

    #[test]
    fn ring_keeps_only_the_last_twenty() {
        let mut canvas = PixelBuffer::new_filled(3, 3, shade(0)).unwrap();
        let mut history = HistoryManager::default();

        // Action i turns the canvas shade(i + 1); its snapshot holds shade(i).
        for i in 0..25u8 {
            history.capture(&canvas, &format!("step {i}"));
            canvas.fill(shade(i + 1));
        }
        assert_eq!(history.undo_count(), HISTORY_CAPACITY);

        for i in (5..25u8).rev() {
            assert_eq!(history.undo(&mut canvas), Some(format!("step {i}")));
            assert!(canvas.is_uniform(shade(i)));
        }
        // States before step 5 were evicted.
        assert_eq!(history.undo(&mut canvas), None);
        assert!(canvas.is_uniform(shade(5)));
    }

    #[test]
    fn single_slot_ring_replaces_its_entry() {
        let mut canvas = PixelBuffer::new_filled(2, 2, shade(1)).unwrap();
        let mut history = HistoryManager::new(1);
        history.capture(&canvas, "first");
        canvas.fill(shade(2));
        history.capture(&canvas, "second");
        assert_eq!(history.undo_count(), 1);
        assert_eq!(history.memory_usage(), 16);
        canvas.fill(shade(3));
        assert_eq!(history.undo(&mut canvas).as_deref(), Some("second"));
        assert!(canvas.is_uniform(shade(2)));
    }

    #[test]
    fn memory_tracks_snapshots() {
        let canvas = PixelBuffer::new(10, 10).unwrap();
        let mut history = HistoryManager::new(2);
        history.capture(&canvas, "a");
        history.capture(&canvas, "b");
        history.capture(&canvas, "c");
        assert_eq!(history.memory_usage(), 2 * 400);
        assert_eq!(history.undo_history(), vec!["c".to_string(), "b".to_string()]);
        let mut target = canvas.clone();
        history.undo(&mut target);
        assert_eq!(history.memory_usage(), 400);
        history.clear();
        assert_eq!(history.memory_usage(), 0);
        assert_eq!(history.undo_description(), None);
    }
}

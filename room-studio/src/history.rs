use egui::{ComboBox, Key};
use egui_inpaint::SourceImage;

use crate::storage::RenderId;

/// Where an entry's pixels live: still on disk from an earlier session, or
/// decoded in memory because it was generated just now.
pub enum EntrySource {
    Disk(RenderId),
    Memory(SourceImage),
}

pub struct HistoryEntry {
    pub name: String,
    pub source: EntrySource,
}

/// Ordered list of this session's results. Append-only; selecting an entry
/// re-displays it without forking the history.
#[derive(Default)]
pub struct RenderHistory {
    entries: Vec<HistoryEntry>,
    idx: usize,
    pending_idx: Option<usize>,
}

const ICON_PREV: &str = "\u{23F4}";
const ICON_NEXT: &str = "\u{23F5}";

impl RenderHistory {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, idx: usize) -> Option<&HistoryEntry> {
        self.entries.get(idx)
    }

    /// Appends and selects the new entry. Returns its index.
    pub fn push(&mut self, entry: HistoryEntry) -> usize {
        self.entries.push(entry);
        self.idx = self.entries.len() - 1;
        self.idx
    }

    /// Appends without changing the selection; used when restoring a
    /// session from disk.
    pub fn push_unselected(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    /// Selector row. Returns the index to display when the selection
    /// changed this frame.
    pub fn ui(&mut self, ui: &mut egui::Ui) -> Option<usize> {
        let mut selected = self.pending_idx.take();
        if self.entries.is_empty() {
            ui.label("No renders yet");
            return None;
        }

        // Arrow keys are left alone while a text field owns the keyboard.
        let keys_free = !ui.ctx().wants_keyboard_input();
        if ui.button(ICON_PREV).on_hover_text("Previous (ArrowLeft)").clicked()
            || ui.input(|i| i.key_pressed(Key::ArrowLeft)) && keys_free && ui.is_enabled()
        {
            self.idx = self.idx.checked_sub(1).unwrap_or(self.entries.len() - 1);
            selected = Some(self.idx);
        }

        if ComboBox::from_id_salt("render_selector")
            .show_index(ui, &mut self.idx, self.entries.len(), |i| {
                self.entries.get(i).map(|e| e.name.as_str()).unwrap_or("")
            })
            .changed()
        {
            selected = Some(self.idx);
        }

        if ui.button(ICON_NEXT).on_hover_text("Next (ArrowRight)").clicked()
            || ui.input(|i| i.key_pressed(Key::ArrowRight)) && keys_free && ui.is_enabled()
        {
            self.idx = (self.idx + 1) % self.entries.len();
            selected = Some(self.idx);
        }

        selected
    }

    /// Makes `idx` the displayed selection on the next [`Self::ui`] pass.
    pub fn select(&mut self, idx: usize) {
        if idx < self.entries.len() {
            self.idx = idx;
            self.pending_idx = Some(idx);
        }
    }
}

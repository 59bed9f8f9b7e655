use std::ops::Range;

use crate::model::{HistoryItem, ItemId};
use crate::shortcuts::KeyShortcut;

/// A loaded record plus the transient presentation state shown next to it.
#[derive(Debug, Clone)]
pub struct ItemDecorator {
    pub id: ItemId,
    pub item: HistoryItem,
    pub selected: bool,
    pub visible: bool,
    pub highlights: Vec<Range<usize>>,
    pub shortcuts: Vec<KeyShortcut>,
}

impl ItemDecorator {
    pub fn new(item: HistoryItem) -> Self {
        Self {
            id: item.id.unwrap_or_default(),
            item,
            selected: false,
            visible: true,
            highlights: Vec::new(),
            shortcuts: Vec::new(),
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.item.pin.is_some()
    }

    pub fn title(&self) -> &str {
        &self.item.title
    }

    pub fn shortcut_keys(&self) -> Vec<char> {
        self.shortcuts.iter().map(|shortcut| shortcut.key).collect()
    }

    pub fn highlight(&mut self, ranges: Vec<Range<usize>>) {
        self.visible = true;
        self.highlights = ranges;
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.highlights.clear();
    }

    pub fn reset_filter(&mut self) {
        self.visible = true;
        self.highlights.clear();
    }
}

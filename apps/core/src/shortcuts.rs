use crate::decorator::ItemDecorator;

pub const MAX_UNPINNED_SHORTCUTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryItemAction {
    /// Whatever the configuration makes the bare key do.
    Default,
    Copy,
    Paste,
    PasteWithoutFormatting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyShortcut {
    pub key: char,
    pub action: HistoryItemAction,
}

impl KeyShortcut {
    pub fn create(key: char, paste_by_default: bool) -> Vec<KeyShortcut> {
        let primary = if paste_by_default {
            HistoryItemAction::Paste
        } else {
            HistoryItemAction::Copy
        };
        vec![KeyShortcut {
            key,
            action: primary,
        }]
    }

    /// Ordinals 1..=9 map to their digit, the tenth to `0`.
    pub fn ordinal_key(ordinal: usize) -> Option<char> {
        match ordinal {
            1..=9 => char::from_digit(ordinal as u32, 10),
            10 => Some('0'),
            _ => None,
        }
    }
}

pub fn update_shortcuts(items: &mut [ItemDecorator], paste_by_default: bool) {
    for item in items.iter_mut() {
        if let Some(pin) = item.item.pin {
            item.shortcuts = KeyShortcut::create(pin, paste_by_default);
        }
    }
    update_unpinned_shortcuts(items, paste_by_default);
}

/// Clears every unpinned shortcut, then numbers the first ten visible
/// unpinned rows in display order.
pub fn update_unpinned_shortcuts(items: &mut [ItemDecorator], paste_by_default: bool) {
    let mut ordinal = 0;
    for item in items.iter_mut().filter(|item| !item.is_pinned()) {
        item.shortcuts.clear();
        if !item.visible || ordinal >= MAX_UNPINNED_SHORTCUTS {
            continue;
        }
        ordinal += 1;
        if let Some(key) = KeyShortcut::ordinal_key(ordinal) {
            item.shortcuts = KeyShortcut::create(key, paste_by_default);
        }
    }
}

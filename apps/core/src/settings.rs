use crate::search::SearchMode;
use crate::sorter::PinPosition;

/// Characters a record can be pinned to. Letters bound to panel commands
/// (`a`, `q`, `v`, `w`) are left out.
pub const SUPPORTED_PINS: [char; 22] = [
    'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'r', 's', 't',
    'u', 'x', 'y', 'z',
];

/// A setting changed by the user while the history is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsChange {
    PinPosition(PinPosition),
    PageSize(usize),
    MaxSize(usize),
    PasteByDefault(bool),
    RemoveFormattingByDefault(bool),
    SearchMode(SearchMode),
}

impl SettingsChange {
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            Self::PageSize(value) => validate_page_size(value),
            Self::MaxSize(value) => validate_max_size(value),
            _ => Ok(()),
        }
    }
}

pub fn validate_page_size(value: usize) -> Result<(), String> {
    if (1..=1_000).contains(&value) {
        Ok(())
    } else {
        Err("Page size must be between 1 and 1000.".to_string())
    }
}

pub fn validate_max_size(value: usize) -> Result<(), String> {
    if (1..=10_000).contains(&value) {
        Ok(())
    } else {
        Err("History size must be between 1 and 10000.".to_string())
    }
}

pub fn validate_pin(input: char) -> Result<char, String> {
    let lowered = input.to_ascii_lowercase();
    if SUPPORTED_PINS.contains(&lowered) {
        Ok(lowered)
    } else {
        Err(format!("'{input}' cannot be used as a pin key."))
    }
}

/// First supported pin not already taken.
pub fn next_available_pin(used: &[char]) -> Option<char> {
    SUPPORTED_PINS.iter().copied().find(|pin| !used.contains(pin))
}

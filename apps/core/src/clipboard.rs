use std::sync::Mutex;

use crate::model::{HistoryItem, ItemId};

/// The system clipboard as seen by the history.
pub trait Clipboard: Send + Sync {
    fn copy(&self, item: &HistoryItem, remove_formatting: bool) -> Result<(), String>;
    fn paste(&self) -> Result<(), String>;
    fn clear(&self);
}

/// Clipboard that does nothing, for headless use.
#[derive(Debug, Default)]
pub struct NoopClipboard;

impl Clipboard for NoopClipboard {
    fn copy(&self, _item: &HistoryItem, _remove_formatting: bool) -> Result<(), String> {
        Ok(())
    }

    fn paste(&self) -> Result<(), String> {
        Ok(())
    }

    fn clear(&self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardCall {
    Copy {
        id: Option<ItemId>,
        remove_formatting: bool,
    },
    Paste,
    Clear,
}

/// Keeps every call so callers can check what reached the clipboard.
#[derive(Debug, Default)]
pub struct RecordingClipboard {
    calls: Mutex<Vec<ClipboardCall>>,
}

impl RecordingClipboard {
    pub fn calls(&self) -> Vec<ClipboardCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn push(&self, call: ClipboardCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl Clipboard for RecordingClipboard {
    fn copy(&self, item: &HistoryItem, remove_formatting: bool) -> Result<(), String> {
        self.push(ClipboardCall::Copy {
            id: item.id,
            remove_formatting,
        });
        Ok(())
    }

    fn paste(&self) -> Result<(), String> {
        self.push(ClipboardCall::Paste);
        Ok(())
    }

    fn clear(&self) {
        self.push(ClipboardCall::Clear);
    }
}

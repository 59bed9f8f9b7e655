use std::collections::HashMap;

use crate::model::{ChangeToken, HistoryItem, ItemId};

/// Records resolved during this process, keyed by the clipboard change
/// token that produced them. Never persisted.
#[derive(Debug, Default)]
pub struct SessionLog {
    entries: HashMap<ChangeToken, HistoryItem>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs `item` under `token`. Entries that pointed at `replaced` now point
    /// at `item`, so older tokens keep resolving after a merge.
    pub fn record(&mut self, token: ChangeToken, item: &HistoryItem, replaced: Option<ItemId>) {
        if let Some(replaced) = replaced {
            for entry in self.entries.values_mut() {
                if entry.id == Some(replaced) {
                    *entry = item.clone();
                }
            }
        }
        self.entries.insert(token, item.clone());
    }

    pub fn get(&self, token: ChangeToken) -> Option<&HistoryItem> {
        self.entries.get(&token)
    }

    /// The logged record `item` was modified from, if any.
    pub fn modification_source(&self, item: &HistoryItem) -> Option<&HistoryItem> {
        item.modified.and_then(|token| self.get(token))
    }

    pub fn forget(&mut self, id: ItemId) {
        self.entries.retain(|_, entry| entry.id != Some(id));
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&HistoryItem) -> bool,
    {
        self.entries.retain(|_, entry| keep(entry));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::SessionLog;
    use crate::model::HistoryItem;

    #[test]
    fn resolves_modification_by_token() {
        let mut log = SessionLog::new();
        let mut original = HistoryItem::text("draft");
        original.id = Some(7);
        log.record(41, &original, None);

        let edited = HistoryItem::text("draft v2").with_modified(41);
        assert_eq!(log.modification_source(&edited).and_then(|i| i.id), Some(7));
        assert!(log
            .modification_source(&HistoryItem::text("x").with_modified(99))
            .is_none());
    }

    #[test]
    fn merges_repoint_older_tokens() {
        let mut log = SessionLog::new();
        let mut first = HistoryItem::text("a");
        first.id = Some(1);
        log.record(1, &first, None);

        let mut merged = HistoryItem::text("a");
        merged.id = Some(2);
        log.record(2, &merged, Some(1));

        assert_eq!(log.get(1).and_then(|i| i.id), Some(2));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn forget_drops_deleted_records() {
        let mut log = SessionLog::new();
        let mut item = HistoryItem::text("gone");
        item.id = Some(3);
        log.record(5, &item, None);
        log.forget(3);
        assert!(log.is_empty());
    }
}

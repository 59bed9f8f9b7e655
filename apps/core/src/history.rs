use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::clipboard::Clipboard;
use crate::config::Config;
use crate::decorator::ItemDecorator;
use crate::history_store::{HistoryStore, ItemFilter, RecencyKey, SortOrder, StoreError};
use crate::merger::{self, Decision};
use crate::model::{ChangeToken, HistoryItem, ItemId};
use crate::search;
use crate::session_log::SessionLog;
use crate::settings::{self, SettingsChange};
use crate::shortcuts::{update_shortcuts, update_unpinned_shortcuts, HistoryItemAction};
use crate::sorter;

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
    #[error("clipboard error: {0}")]
    Clipboard(String),
    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEvent {
    Loaded { loaded: usize, total: usize },
    ItemsChanged,
    /// A record that did not merge into an existing one was stored.
    ItemInserted { id: ItemId, title: String },
    Filtered { query: String, visible: usize },
    NeedsResize,
    CloseRequested,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadMoreOutcome {
    /// A filter is active or nothing was loaded yet.
    Skipped,
    /// Another load-more is still running; retry later.
    InFlight,
    Exhausted,
    Appended(Vec<ItemId>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Uninitialized,
    Loaded,
    LoadingMore,
    Exhausted,
}

#[derive(Debug, Clone, Default)]
struct Cursor {
    total_count: usize,
    pinned_count: usize,
    offset: usize,
    oldest_loaded: Option<RecencyKey>,
    newest_loaded: Option<RecencyKey>,
    /// Unpinned ids handed out since the last full load, pruned ones included.
    delivered: HashSet<ItemId>,
}

impl Cursor {
    fn unpinned_total(&self) -> usize {
        self.total_count.saturating_sub(self.pinned_count)
    }

    fn note_removed(&mut self, id: ItemId, pinned: bool) {
        self.total_count = self.total_count.saturating_sub(1);
        if pinned {
            self.pinned_count = self.pinned_count.saturating_sub(1);
        }
        if self.delivered.remove(&id) {
            self.offset = self.offset.saturating_sub(1);
        }
    }

    fn covers(&self, key: Option<RecencyKey>) -> bool {
        match (self.oldest_loaded, key) {
            (Some(frontier), Some(key)) => key > frontier,
            _ => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistorySnapshot {
    pub items: Vec<ItemDecorator>,
    pub loaded_count: usize,
    pub total_count: usize,
    pub pinned_count: usize,
    pub query: String,
    pub state: LoadState,
}

impl HistorySnapshot {
    pub fn has_more(&self) -> bool {
        matches!(self.state, LoadState::Loaded | LoadState::LoadingMore)
    }
}

/// Everything a [`History`] needs from the outside, built once at startup.
pub struct HistoryContext {
    pub store: Box<dyn HistoryStore>,
    pub config: Config,
    pub clipboard: Arc<dyn Clipboard>,
}

pub struct History {
    store: Box<dyn HistoryStore>,
    config: Config,
    clipboard: Arc<dyn Clipboard>,
    session_log: SessionLog,
    all: Vec<ItemDecorator>,
    cursor: Cursor,
    state: LoadState,
    query: String,
    events: broadcast::Sender<HistoryEvent>,
}

impl History {
    pub fn new(ctx: HistoryContext) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store: ctx.store,
            config: ctx.config,
            clipboard: ctx.clipboard,
            session_log: SessionLog::new(),
            all: Vec::new(),
            cursor: Cursor::default(),
            state: LoadState::Uninitialized,
            query: String::new(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HistoryEvent> {
        self.events.subscribe()
    }

    pub fn event_sender(&self) -> broadcast::Sender<HistoryEvent> {
        self.events.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn has_more(&self) -> bool {
        matches!(self.state, LoadState::Loaded | LoadState::LoadingMore)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn session_log(&self) -> &SessionLog {
        &self.session_log
    }

    /// Every loaded record, visible or not, in display order.
    pub fn all(&self) -> &[ItemDecorator] {
        &self.all
    }

    /// The displayed set.
    pub fn items(&self) -> impl Iterator<Item = &ItemDecorator> {
        self.all.iter().filter(|item| item.visible)
    }

    pub fn pinned_items(&self) -> impl Iterator<Item = &ItemDecorator> {
        self.all.iter().filter(|item| item.is_pinned())
    }

    pub fn unpinned_items(&self) -> impl Iterator<Item = &ItemDecorator> {
        self.all.iter().filter(|item| !item.is_pinned())
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            items: self.items().cloned().collect(),
            loaded_count: self.all.len(),
            total_count: self.cursor.total_count,
            pinned_count: self.cursor.pinned_count,
            query: self.query.clone(),
            state: self.state,
        }
    }

    /// Full reload: every pinned record plus the newest page of unpinned ones.
    /// Nothing changes if the store fails.
    pub fn load(&mut self) -> Result<(), HistoryError> {
        let total_count = self.store.count(&ItemFilter::All)?;
        let pinned_count = self.store.count(&ItemFilter::Pinned)?;
        let pinned = self
            .store
            .fetch(&ItemFilter::Pinned, SortOrder::NewestFirst, None, None)?;
        let unpinned = self.store.fetch(
            &ItemFilter::Unpinned,
            SortOrder::NewestFirst,
            Some(self.config.page_size),
            None,
        )?;

        let cursor = Cursor {
            total_count,
            pinned_count,
            offset: unpinned.len(),
            newest_loaded: unpinned.first().and_then(RecencyKey::of),
            oldest_loaded: unpinned.last().and_then(RecencyKey::of),
            delivered: unpinned.iter().filter_map(|item| item.id).collect(),
        };

        let mut combined = pinned;
        combined.extend(unpinned);
        self.all = sorter::sort(combined, self.config.pin_to)
            .into_iter()
            .map(ItemDecorator::new)
            .collect();
        self.state = if cursor.offset < cursor.unpinned_total() {
            LoadState::Loaded
        } else {
            LoadState::Exhausted
        };
        self.cursor = cursor;

        if !self.query.is_empty() {
            self.filter_loaded();
        }
        update_shortcuts(&mut self.all, self.config.paste_by_default);

        info!(
            loaded = self.all.len(),
            total = total_count,
            pinned = pinned_count,
            "history loaded"
        );
        self.emit(HistoryEvent::Loaded {
            loaded: self.all.len(),
            total: total_count,
        });
        self.emit(HistoryEvent::NeedsResize);
        Ok(())
    }

    pub fn load_more(&mut self) -> Result<LoadMoreOutcome, HistoryError> {
        if !self.query.is_empty() {
            return Ok(LoadMoreOutcome::Skipped);
        }
        match self.state {
            LoadState::Uninitialized => return Ok(LoadMoreOutcome::Skipped),
            LoadState::LoadingMore => return Ok(LoadMoreOutcome::InFlight),
            LoadState::Exhausted => return Ok(LoadMoreOutcome::Exhausted),
            LoadState::Loaded => {}
        }

        self.state = LoadState::LoadingMore;
        let outcome = self.fetch_next_page();
        if outcome.is_err() {
            self.state = LoadState::Loaded;
        }
        outcome
    }

    fn fetch_next_page(&mut self) -> Result<LoadMoreOutcome, HistoryError> {
        self.prune_loaded_if_needed();

        let page_size = self.config.page_size;
        let date_filter = match self.cursor.oldest_loaded {
            Some(key) => ItemFilter::UnpinnedBefore(key),
            None => ItemFilter::Unpinned,
        };
        let mut page = self
            .store
            .fetch(&date_filter, SortOrder::NewestFirst, Some(page_size), None)?;

        if page.is_empty() && self.cursor.offset < self.cursor.unpinned_total() {
            debug!(
                offset = self.cursor.offset,
                unpinned_total = self.cursor.unpinned_total(),
                "date-bound page empty, falling back to offset"
            );
            page = self.store.fetch(
                &ItemFilter::Unpinned,
                SortOrder::NewestFirst,
                Some(page_size),
                Some(self.cursor.offset),
            )?;
        }

        if page.is_empty() {
            debug!("no more history items");
            self.state = LoadState::Exhausted;
            return Ok(LoadMoreOutcome::Exhausted);
        }

        let fetched = page.len();
        if let Some(oldest) = page.iter().filter_map(RecencyKey::of).min() {
            if self.cursor.oldest_loaded.map_or(true, |current| oldest < current) {
                self.cursor.oldest_loaded = Some(oldest);
            }
        }
        if self.cursor.newest_loaded.is_none() {
            self.cursor.newest_loaded = page.iter().filter_map(RecencyKey::of).max();
        }

        let mut appended = Vec::with_capacity(page.len());
        for item in page {
            let Some(id) = item.id else {
                continue;
            };
            if !self.cursor.delivered.insert(id) {
                continue;
            }
            appended.push(id);
            self.all.push(ItemDecorator::new(item));
        }
        // Already-delivered rows were counted when first handed out. A page of
        // nothing but those still moves past itself so the next call progresses.
        self.cursor.offset += if appended.is_empty() { fetched } else { appended.len() };

        self.state = if self.cursor.offset >= self.cursor.unpinned_total() {
            LoadState::Exhausted
        } else {
            LoadState::Loaded
        };

        self.all = sorter::sort(std::mem::take(&mut self.all), self.config.pin_to);
        update_unpinned_shortcuts(&mut self.all, self.config.paste_by_default);

        debug!(
            appended = appended.len(),
            offset = self.cursor.offset,
            exhausted = self.state == LoadState::Exhausted,
            "loaded more history items"
        );
        self.emit(HistoryEvent::ItemsChanged);
        self.emit(HistoryEvent::NeedsResize);
        Ok(LoadMoreOutcome::Appended(appended))
    }

    /// Drops the oldest loaded unpinned rows from memory once more than two
    /// pages are held. The store is untouched.
    fn prune_loaded_if_needed(&mut self) {
        let cap = self.config.page_size.saturating_mul(2);
        let mut unpinned: Vec<(i64, ItemId)> = self
            .all
            .iter()
            .filter(|item| !item.is_pinned())
            .map(|item| (item.item.last_copied_epoch_ms, item.id))
            .collect();
        if unpinned.len() <= cap {
            return;
        }

        let excess = unpinned.len() - cap;
        unpinned.sort();
        let evicted: HashSet<ItemId> = unpinned.into_iter().take(excess).map(|(_, id)| id).collect();
        self.all
            .retain(|item| item.is_pinned() || !evicted.contains(&item.id));
        debug!(evicted = excess, "pruned loaded history items");
    }

    /// Reloads unless a filter is active. Returns whether it reloaded.
    pub fn reset_view(&mut self) -> Result<bool, HistoryError> {
        if !self.query.is_empty() {
            return Ok(false);
        }
        self.load()?;
        Ok(true)
    }

    /// Stores a captured record, folding it into a known one when it is a
    /// duplicate or a tracked modification.
    pub fn add(&mut self, incoming: HistoryItem, token: ChangeToken) -> Result<ItemId, HistoryError> {
        let decision = merger::resolve(self.store.as_ref(), &self.session_log, &incoming)?;

        let (mut item, replaced) = match decision {
            Decision::MergeWith(existing) => {
                let is_modification = self.session_log.modification_source(&incoming).is_some();
                debug!(existing_id = ?existing.id, is_modification, "merging history item");
                (merger::merge(&existing, incoming), existing.id)
            }
            Decision::New => (incoming, None),
        };

        item.id = None;
        let (id, evicted) = match replaced {
            Some(existing) => (self.store.replace(existing, &item)?, Vec::new()),
            None if item.is_pinned() => (self.store.insert(&item)?, Vec::new()),
            None => {
                let keep = self.config.max_size.saturating_sub(1);
                self.store.insert_evicting(&item, keep)?
            }
        };
        item.id = Some(id);
        for evicted_id in evicted {
            info!(id = evicted_id, "evicted oldest history item");
            self.forget_evicted(evicted_id);
        }

        let mut removed_index = None;
        match replaced {
            Some(existing) => {
                removed_index = self.position(existing);
                if let Some(index) = removed_index {
                    self.all.remove(index);
                }
                let was_delivered = self.cursor.delivered.remove(&existing);
                if !item.is_pinned() && !was_delivered {
                    self.cursor.offset += 1;
                }
            }
            None => {
                self.cursor.total_count += 1;
                if item.is_pinned() {
                    self.cursor.pinned_count += 1;
                } else {
                    self.cursor.offset += 1;
                }
            }
        }
        if !item.is_pinned() {
            self.cursor.delivered.insert(id);
        }

        self.session_log.record(token, &item, replaced);

        let mut decorator = ItemDecorator::new(item);
        if !self.query.is_empty() {
            let matches = search::search(
                std::slice::from_ref(&decorator),
                &self.query,
                self.config.search_mode,
            );
            match matches.into_iter().next() {
                Some(found) => decorator.highlight(found.ranges),
                None => decorator.hide(),
            }
        }
        let title = decorator.title().to_string();
        match removed_index {
            Some(index) if decorator.is_pinned() => {
                let index = index.min(self.all.len());
                self.all.insert(index, decorator);
            }
            _ => {
                let index = sorter::insertion_index(&self.all, &decorator, self.config.pin_to);
                self.all.insert(index, decorator);
            }
        }
        update_shortcuts(&mut self.all, self.config.paste_by_default);

        if replaced.is_none() {
            self.emit(HistoryEvent::ItemInserted { id, title });
        }
        self.emit(HistoryEvent::ItemsChanged);
        self.emit(HistoryEvent::NeedsResize);
        Ok(id)
    }

    /// Evicts oldest unpinned records from the store until at most `limit`
    /// remain. Pinned records are never touched.
    fn evict_until(&mut self, limit: usize) -> Result<usize, HistoryError> {
        let mut evicted = 0;
        while self.store.count(&ItemFilter::Unpinned)? > limit {
            let oldest = self
                .store
                .fetch(&ItemFilter::Unpinned, SortOrder::OldestFirst, Some(1), None)?;
            let Some(id) = oldest.first().and_then(|item| item.id) else {
                break;
            };
            info!(id, "evicting oldest history item");
            self.store.delete(id)?;
            self.forget_evicted(id);
            evicted += 1;
        }
        Ok(evicted)
    }

    fn forget_evicted(&mut self, id: ItemId) {
        if let Some(index) = self.position(id) {
            self.all.remove(index);
        }
        self.cursor.note_removed(id, false);
        self.session_log.forget(id);
    }

    /// Deletes one record. Unknown ids are ignored.
    pub fn delete(&mut self, id: ItemId) -> Result<(), HistoryError> {
        self.store.delete(id)?;
        self.session_log.forget(id);

        let Some(index) = self.position(id) else {
            if self.cursor.delivered.contains(&id) {
                self.cursor.note_removed(id, false);
            }
            return Ok(());
        };
        let removed = self.all.remove(index);
        self.cursor.note_removed(id, removed.is_pinned());

        update_unpinned_shortcuts(&mut self.all, self.config.paste_by_default);
        self.emit(HistoryEvent::ItemsChanged);
        self.emit(HistoryEvent::NeedsResize);
        Ok(())
    }

    /// Removes every unpinned record. Store failures are logged, not returned.
    pub fn clear(&mut self) {
        self.all.retain(|item| item.is_pinned());
        if let Err(error) = self.store.delete_where(&ItemFilter::Unpinned) {
            warn!(%error, "failed to clear unpinned history from store");
        }
        self.session_log.retain(|item| item.is_pinned());

        self.cursor = Cursor {
            total_count: self.cursor.pinned_count,
            pinned_count: self.cursor.pinned_count,
            ..Cursor::default()
        };
        self.finish_clear();
    }

    pub fn clear_all(&mut self) {
        self.all.clear();
        if let Err(error) = self.store.delete_where(&ItemFilter::All) {
            warn!(%error, "failed to clear history from store");
        }
        self.session_log.clear();
        self.cursor = Cursor::default();
        self.finish_clear();
    }

    fn finish_clear(&mut self) {
        if self.state != LoadState::Uninitialized {
            self.state = LoadState::Exhausted;
        }
        self.clipboard.clear();
        update_shortcuts(&mut self.all, self.config.paste_by_default);
        info!(remaining = self.all.len(), "history cleared");
        self.emit(HistoryEvent::CloseRequested);
        self.emit(HistoryEvent::ItemsChanged);
        self.emit(HistoryEvent::NeedsResize);
    }

    /// Pins a loaded record to the first free key, or unpins it. Returns the
    /// new pin.
    pub fn toggle_pin(&mut self, id: ItemId) -> Result<Option<char>, HistoryError> {
        let Some(index) = self.position(id) else {
            return Ok(None);
        };

        let new_pin = if self.all[index].is_pinned() {
            None
        } else {
            let used: Vec<char> = self.all.iter().filter_map(|item| item.item.pin).collect();
            match settings::next_available_pin(&used) {
                Some(pin) => Some(pin),
                None => {
                    warn!(id, "no free pin key left");
                    return Ok(None);
                }
            }
        };
        self.store.update_pin(id, new_pin)?;

        let mut decorator = self.all.remove(index);
        decorator.item.pin = new_pin;
        if new_pin.is_some() {
            self.cursor.pinned_count += 1;
            if self.cursor.delivered.remove(&id) {
                self.cursor.offset = self.cursor.offset.saturating_sub(1);
            }
        } else {
            self.cursor.pinned_count = self.cursor.pinned_count.saturating_sub(1);
            decorator.shortcuts.clear();
            if self.cursor.covers(RecencyKey::of(&decorator.item)) {
                self.cursor.offset += 1;
            }
            self.cursor.delivered.insert(id);
        }

        let index = sorter::insertion_index(&self.all, &decorator, self.config.pin_to);
        self.all.insert(index, decorator);

        self.clear_query();
        update_shortcuts(&mut self.all, self.config.paste_by_default);
        self.emit(HistoryEvent::ItemsChanged);
        Ok(new_pin)
    }

    /// Puts a record on the clipboard, pasting it when the action asks for it.
    pub fn select(&mut self, id: ItemId, action: HistoryItemAction) -> Result<(), HistoryError> {
        let Some(item) = self
            .all
            .iter()
            .find(|decorator| decorator.id == id)
            .map(|decorator| decorator.item.clone())
        else {
            return Ok(());
        };

        let (remove_formatting, paste) = match action {
            HistoryItemAction::Default => (
                self.config.remove_formatting_by_default,
                self.config.paste_by_default,
            ),
            HistoryItemAction::Copy => (false, false),
            HistoryItemAction::Paste => (false, true),
            HistoryItemAction::PasteWithoutFormatting => (true, true),
        };

        self.emit(HistoryEvent::CloseRequested);
        self.clipboard
            .copy(&item, remove_formatting)
            .map_err(HistoryError::Clipboard)?;
        if paste {
            self.clipboard.paste().map_err(HistoryError::Clipboard)?;
        }
        self.clear_query();
        Ok(())
    }

    pub fn set_selected(&mut self, id: Option<ItemId>) {
        for item in &mut self.all {
            item.selected = Some(item.id) == id;
        }
    }

    pub fn selected(&self) -> Option<&ItemDecorator> {
        self.all.iter().find(|item| item.selected)
    }

    /// The displayed record bound to `key` and what pressing it does.
    pub fn pressed_shortcut(&self, key: char) -> Option<(ItemId, HistoryItemAction)> {
        self.items().find_map(|item| {
            item.shortcuts
                .iter()
                .find(|shortcut| shortcut.key == key)
                .map(|shortcut| (item.id, shortcut.action))
        })
    }

    /// One filter pass over the loaded set. An empty query restores it.
    pub fn apply_query(&mut self, query: &str) {
        self.query = query.to_string();
        if self.query.is_empty() {
            for item in &mut self.all {
                item.reset_filter();
            }
        } else {
            self.filter_loaded();
        }
        update_unpinned_shortcuts(&mut self.all, self.config.paste_by_default);

        let first = if self.query.is_empty() {
            self.items().find(|item| !item.is_pinned()).map(|item| item.id)
        } else {
            self.items().next().map(|item| item.id)
        };
        self.set_selected(first);

        let visible = self.items().count();
        debug!(query = %self.query, visible, "filter applied");
        self.emit(HistoryEvent::Filtered {
            query: self.query.clone(),
            visible,
        });
        self.emit(HistoryEvent::NeedsResize);
    }

    fn clear_query(&mut self) {
        if !self.query.is_empty() {
            self.apply_query("");
        }
    }

    fn filter_loaded(&mut self) {
        let mut matches: HashMap<ItemId, _> =
            search::search(&self.all, &self.query, self.config.search_mode)
                .into_iter()
                .map(|found| (found.id, found.ranges))
                .collect();
        for item in &mut self.all {
            match matches.remove(&item.id) {
                Some(ranges) => item.highlight(ranges),
                None => item.hide(),
            }
        }
    }

    pub fn apply_settings(&mut self, change: SettingsChange) -> Result<(), HistoryError> {
        change.validate().map_err(HistoryError::InvalidSetting)?;
        info!(?change, "applying settings change");

        match change {
            SettingsChange::PinPosition(pin_to) => {
                self.config.pin_to = pin_to;
                self.load()?;
            }
            SettingsChange::PageSize(page_size) => {
                self.config.page_size = page_size;
                self.load()?;
            }
            SettingsChange::MaxSize(max_size) => {
                self.config.max_size = max_size;
                if self.evict_until(max_size)? > 0 {
                    update_unpinned_shortcuts(&mut self.all, self.config.paste_by_default);
                    self.emit(HistoryEvent::ItemsChanged);
                    self.emit(HistoryEvent::NeedsResize);
                }
            }
            SettingsChange::PasteByDefault(enabled) => {
                self.config.paste_by_default = enabled;
                update_shortcuts(&mut self.all, enabled);
                self.emit(HistoryEvent::ItemsChanged);
            }
            SettingsChange::RemoveFormattingByDefault(enabled) => {
                self.config.remove_formatting_by_default = enabled;
            }
            SettingsChange::SearchMode(mode) => {
                self.config.search_mode = mode;
                if !self.query.is_empty() {
                    let query = self.query.clone();
                    self.apply_query(&query);
                }
            }
        }
        Ok(())
    }

    fn position(&self, id: ItemId) -> Option<usize> {
        self.all.iter().position(|item| item.id == id)
    }

    fn emit(&self, event: HistoryEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::{History, HistoryContext, LoadMoreOutcome, LoadState};
    use crate::clipboard::NoopClipboard;
    use crate::config::Config;
    use crate::history_store::open_memory;
    use crate::model::HistoryItem;
    use std::sync::Arc;

    fn history(page_size: usize) -> History {
        let config = Config {
            page_size,
            ..Config::default()
        };
        History::new(HistoryContext {
            store: Box::new(open_memory().unwrap()),
            config,
            clipboard: Arc::new(NoopClipboard),
        })
    }

    #[test]
    fn load_more_before_load_is_skipped() {
        let mut history = history(5);
        assert_eq!(history.load_more().unwrap(), LoadMoreOutcome::Skipped);
        assert_eq!(history.state(), LoadState::Uninitialized);
    }

    #[test]
    fn soft_cap_prunes_oldest_loaded_rows() {
        let mut history = history(2);
        for i in 0..8 {
            history
                .add(HistoryItem::text(&format!("clip {i}")).with_copied_at(100 + i), i)
                .unwrap();
        }
        history.load().unwrap();
        history.load_more().unwrap();
        history.load_more().unwrap();
        assert_eq!(history.unpinned_items().count(), 6);

        history.load_more().unwrap();
        assert_eq!(history.unpinned_items().count(), 6);
        let newest = history.unpinned_items().next().unwrap();
        assert_eq!(newest.title(), "clip 7");
    }

    #[test]
    fn query_hides_rows_without_dropping_them() {
        let mut history = history(10);
        history.add(HistoryItem::text("alpha").with_copied_at(1), 1).unwrap();
        history.add(HistoryItem::text("beta").with_copied_at(2), 2).unwrap();
        history.load().unwrap();

        history.apply_query("alp");
        assert_eq!(history.items().count(), 1);
        assert_eq!(history.all().len(), 2);
        assert_eq!(history.load_more().unwrap(), LoadMoreOutcome::Skipped);

        history.apply_query("");
        assert_eq!(history.items().count(), 2);
        assert!(history.all().iter().all(|item| item.highlights.is_empty()));
    }
}

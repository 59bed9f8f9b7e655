use std::path::Path;

use rusqlite::{params, params_from_iter, Connection, Row};

use crate::config::Config;
use crate::model::{HistoryItem, ItemContent, ItemId};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("content encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("failed to prepare store directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Position in the unpinned recency order: `(last_copied, id)` descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RecencyKey {
    pub last_copied_epoch_ms: i64,
    pub id: ItemId,
}

impl RecencyKey {
    pub fn of(item: &HistoryItem) -> Option<Self> {
        item.id.map(|id| Self {
            last_copied_epoch_ms: item.last_copied_epoch_ms,
            id,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ItemFilter<'a> {
    All,
    Pinned,
    Unpinned,
    /// Unpinned rows strictly older than the key; rows sharing its timestamp
    /// are ordered by id.
    UnpinnedBefore(RecencyKey),
    /// Rows equal to, or superseding, the given item.
    SimilarTo(&'a HistoryItem),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    NewestFirst,
    OldestFirst,
}

pub trait HistoryStore: Send {
    fn count(&self, filter: &ItemFilter<'_>) -> Result<usize, StoreError>;

    fn fetch(
        &self,
        filter: &ItemFilter<'_>,
        sort: SortOrder,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<HistoryItem>, StoreError>;

    fn insert(&mut self, item: &HistoryItem) -> Result<ItemId, StoreError>;

    fn update_pin(&mut self, id: ItemId, pin: Option<char>) -> Result<(), StoreError>;

    /// Deleting an id that does not exist is not an error.
    fn delete(&mut self, id: ItemId) -> Result<(), StoreError>;

    fn delete_where(&mut self, filter: &ItemFilter<'_>) -> Result<usize, StoreError>;

    /// Swap `existing` for `item` as one mutation.
    fn replace(&mut self, existing: ItemId, item: &HistoryItem) -> Result<ItemId, StoreError> {
        self.delete(existing)?;
        self.insert(item)
    }

    /// Deletes the oldest unpinned rows until at most `keep_unpinned` remain,
    /// then inserts `item`, as one mutation. Returns the new id and the
    /// evicted ids.
    fn insert_evicting(
        &mut self,
        item: &HistoryItem,
        keep_unpinned: usize,
    ) -> Result<(ItemId, Vec<ItemId>), StoreError> {
        let excess = self
            .count(&ItemFilter::Unpinned)?
            .saturating_sub(keep_unpinned);
        let mut evicted = Vec::new();
        if excess > 0 {
            evicted = self
                .fetch(&ItemFilter::Unpinned, SortOrder::OldestFirst, Some(excess), None)?
                .into_iter()
                .filter_map(|candidate| candidate.id)
                .collect();
        }
        for id in &evicted {
            self.delete(*id)?;
        }
        let id = self.insert(item)?;
        Ok((id, evicted))
    }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS history_item (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    contents TEXT NOT NULL,
    title TEXT NOT NULL,
    application TEXT,
    first_copied_at INTEGER NOT NULL,
    last_copied_at INTEGER NOT NULL,
    number_of_copies INTEGER NOT NULL,
    pin TEXT,
    modified INTEGER,
    from_self INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS history_item_recency ON history_item (pin, last_copied_at, id);
";

const COLUMNS: &str = "id, contents, title, application, first_copied_at, last_copied_at, \
                       number_of_copies, pin, modified, from_self";

pub struct SqliteHistoryStore {
    conn: Connection,
}

pub fn open_memory() -> Result<SqliteHistoryStore, StoreError> {
    SqliteHistoryStore::with_connection(Connection::open_in_memory()?)
}

pub fn open_file(path: &Path) -> Result<SqliteHistoryStore, StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    SqliteHistoryStore::with_connection(Connection::open(path)?)
}

pub fn open_from_config(cfg: &Config) -> Result<SqliteHistoryStore, StoreError> {
    open_file(&cfg.db_path)
}

impl SqliteHistoryStore {
    pub fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn get_item(&self, id: ItemId) -> Result<Option<HistoryItem>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {COLUMNS} FROM history_item WHERE id = ?1"))?;
        let mut rows = stmt.query(params![id])?;
        match rows.next()? {
            Some(row) => Ok(Some(item_from_row(row)?)),
            None => Ok(None),
        }
    }

    fn fetch_sql(
        &self,
        filter: &ItemFilter<'_>,
        sort: SortOrder,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<HistoryItem>, StoreError> {
        let (clause, args) = where_clause(filter);
        let order = match sort {
            SortOrder::NewestFirst => "last_copied_at DESC, id DESC",
            SortOrder::OldestFirst => "last_copied_at ASC, id ASC",
        };
        let limit = limit.map(|n| n as i64).unwrap_or(-1);
        let offset = offset.unwrap_or(0) as i64;
        let sql = format!(
            "SELECT {COLUMNS} FROM history_item {clause} ORDER BY {order} LIMIT {limit} OFFSET {offset}"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(args.iter()))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(item_from_row(row)?);
        }
        Ok(items)
    }

    fn fetch_similar(
        &self,
        item: &HistoryItem,
        sort: SortOrder,
    ) -> Result<Vec<HistoryItem>, StoreError> {
        let all = self.fetch_sql(&ItemFilter::All, sort, None, None)?;
        Ok(all
            .into_iter()
            .filter(|candidate| candidate.same_contents(item) || candidate.supersedes(item))
            .collect())
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn count(&self, filter: &ItemFilter<'_>) -> Result<usize, StoreError> {
        if let ItemFilter::SimilarTo(item) = filter {
            return Ok(self.fetch_similar(item, SortOrder::NewestFirst)?.len());
        }
        let (clause, args) = where_clause(filter);
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM history_item {clause}"),
            params_from_iter(args.iter()),
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }

    fn fetch(
        &self,
        filter: &ItemFilter<'_>,
        sort: SortOrder,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<HistoryItem>, StoreError> {
        match filter {
            ItemFilter::SimilarTo(item) => Ok(self
                .fetch_similar(item, sort)?
                .into_iter()
                .skip(offset.unwrap_or(0))
                .take(limit.unwrap_or(usize::MAX))
                .collect()),
            _ => self.fetch_sql(filter, sort, limit, offset),
        }
    }

    fn insert(&mut self, item: &HistoryItem) -> Result<ItemId, StoreError> {
        insert_row(&self.conn, item)
    }

    fn update_pin(&mut self, id: ItemId, pin: Option<char>) -> Result<(), StoreError> {
        self.conn.execute(
            "UPDATE history_item SET pin = ?1 WHERE id = ?2",
            params![pin.map(String::from), id],
        )?;
        Ok(())
    }

    fn delete(&mut self, id: ItemId) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM history_item WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn delete_where(&mut self, filter: &ItemFilter<'_>) -> Result<usize, StoreError> {
        if let ItemFilter::SimilarTo(item) = filter {
            let ids: Vec<ItemId> = self
                .fetch_similar(item, SortOrder::NewestFirst)?
                .into_iter()
                .filter_map(|candidate| candidate.id)
                .collect();
            for id in &ids {
                self.delete(*id)?;
            }
            return Ok(ids.len());
        }
        let (clause, args) = where_clause(filter);
        let removed = self.conn.execute(
            &format!("DELETE FROM history_item {clause}"),
            params_from_iter(args.iter()),
        )?;
        Ok(removed)
    }

    fn replace(&mut self, existing: ItemId, item: &HistoryItem) -> Result<ItemId, StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM history_item WHERE id = ?1", params![existing])?;
        let id = insert_row(&tx, item)?;
        tx.commit()?;
        Ok(id)
    }

    fn insert_evicting(
        &mut self,
        item: &HistoryItem,
        keep_unpinned: usize,
    ) -> Result<(ItemId, Vec<ItemId>), StoreError> {
        let tx = self.conn.transaction()?;
        let unpinned: i64 = tx.query_row(
            "SELECT COUNT(*) FROM history_item WHERE pin IS NULL",
            [],
            |row| row.get(0),
        )?;
        let excess = (unpinned as usize).saturating_sub(keep_unpinned);
        let evicted = {
            let mut stmt = tx.prepare(
                "SELECT id FROM history_item WHERE pin IS NULL
                 ORDER BY last_copied_at ASC, id ASC LIMIT ?1",
            )?;
            let ids = stmt
                .query_map(params![excess as i64], |row| row.get::<_, ItemId>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            ids
        };
        for id in &evicted {
            tx.execute("DELETE FROM history_item WHERE id = ?1", params![id])?;
        }
        let id = insert_row(&tx, item)?;
        tx.commit()?;
        Ok((id, evicted))
    }
}

fn where_clause(filter: &ItemFilter<'_>) -> (&'static str, Vec<i64>) {
    match filter {
        ItemFilter::All | ItemFilter::SimilarTo(_) => ("", Vec::new()),
        ItemFilter::Pinned => ("WHERE pin IS NOT NULL", Vec::new()),
        ItemFilter::Unpinned => ("WHERE pin IS NULL", Vec::new()),
        ItemFilter::UnpinnedBefore(key) => (
            "WHERE pin IS NULL AND (last_copied_at < ?1 OR (last_copied_at = ?1 AND id < ?2))",
            vec![key.last_copied_epoch_ms, key.id],
        ),
    }
}

fn insert_row(conn: &Connection, item: &HistoryItem) -> Result<ItemId, StoreError> {
    let contents = serde_json::to_string(&item.contents)?;
    conn.execute(
        "INSERT INTO history_item (contents, title, application, first_copied_at, last_copied_at,
                                   number_of_copies, pin, modified, from_self)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            contents,
            item.title,
            item.application,
            item.first_copied_epoch_ms,
            item.last_copied_epoch_ms,
            item.number_of_copies,
            item.pin.map(String::from),
            item.modified,
            item.from_self,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn item_from_row(row: &Row<'_>) -> Result<HistoryItem, StoreError> {
    let contents: String = row.get(1)?;
    let contents: Vec<ItemContent> = serde_json::from_str(&contents)?;
    let pin: Option<String> = row.get(7)?;
    Ok(HistoryItem {
        id: Some(row.get(0)?),
        contents,
        title: row.get(2)?,
        application: row.get(3)?,
        first_copied_epoch_ms: row.get(4)?,
        last_copied_epoch_ms: row.get(5)?,
        number_of_copies: row.get(6)?,
        pin: pin.and_then(|value| value.chars().next()),
        modified: row.get(8)?,
        from_self: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::{open_memory, HistoryStore, ItemFilter, RecencyKey, SortOrder};
    use crate::model::HistoryItem;

    #[test]
    fn keyset_filter_orders_ties_by_id() {
        let mut store = open_memory().unwrap();
        let a = store.insert(&HistoryItem::text("a").with_copied_at(10)).unwrap();
        let b = store.insert(&HistoryItem::text("b").with_copied_at(10)).unwrap();
        store.insert(&HistoryItem::text("c").with_copied_at(5)).unwrap();

        let key = RecencyKey {
            last_copied_epoch_ms: 10,
            id: b,
        };
        let older = store
            .fetch(&ItemFilter::UnpinnedBefore(key), SortOrder::NewestFirst, None, None)
            .unwrap();

        assert_eq!(older.len(), 2);
        assert_eq!(older[0].id, Some(a));
        assert_eq!(older[1].title, "c");
    }

    #[test]
    fn similar_filter_matches_superseding_rows() {
        let mut store = open_memory().unwrap();
        store.insert(&HistoryItem::text("same")).unwrap();
        store.insert(&HistoryItem::text("other")).unwrap();

        let variant = HistoryItem::text("same \n");
        assert_eq!(store.count(&ItemFilter::SimilarTo(&variant)).unwrap(), 1);
    }

    #[test]
    fn replace_swaps_rows_atomically() {
        let mut store = open_memory().unwrap();
        let old = store.insert(&HistoryItem::text("x")).unwrap();
        let new = store.replace(old, &HistoryItem::text("y")).unwrap();

        assert!(store.get_item(old).unwrap().is_none());
        assert_eq!(store.get_item(new).unwrap().unwrap().title, "y");
        assert_eq!(store.count(&ItemFilter::All).unwrap(), 1);
    }

    #[test]
    fn insert_evicting_drops_oldest_unpinned_rows() {
        let mut store = open_memory().unwrap();
        let pinned = store
            .insert(&HistoryItem::text("pinned").with_copied_at(1).with_pin('b'))
            .unwrap();
        let oldest = store.insert(&HistoryItem::text("a").with_copied_at(10)).unwrap();
        let middle = store.insert(&HistoryItem::text("b").with_copied_at(20)).unwrap();
        store.insert(&HistoryItem::text("c").with_copied_at(30)).unwrap();

        let (id, evicted) = store
            .insert_evicting(&HistoryItem::text("d").with_copied_at(40), 1)
            .unwrap();

        assert_eq!(evicted, vec![oldest, middle]);
        assert!(store.get_item(pinned).unwrap().is_some());
        assert_eq!(store.get_item(id).unwrap().unwrap().title, "d");
        assert_eq!(store.count(&ItemFilter::Unpinned).unwrap(), 2);
    }
}

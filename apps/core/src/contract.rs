use serde::{Deserialize, Serialize};

use crate::decorator::ItemDecorator;
use crate::history::{HistorySnapshot, LoadMoreOutcome};
use crate::model::ItemId;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryItemDto {
    pub id: ItemId,
    pub title: String,
    pub application: Option<String>,
    pub pin: Option<char>,
    pub shortcuts: Vec<char>,
    pub number_of_copies: u32,
    pub first_copied_epoch_ms: i64,
    pub last_copied_epoch_ms: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlights: Vec<(usize, usize)>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListResponse {
    pub items: Vec<HistoryItemDto>,
    pub total: usize,
    pub pinned: usize,
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", content = "ids", rename_all = "snake_case")]
pub enum LoadMoreResponse {
    Skipped,
    InFlight,
    Exhausted,
    Appended(Vec<ItemId>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddResponse {
    pub id: ItemId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PinResponse {
    pub id: ItemId,
    pub pin: Option<char>,
}

impl From<&ItemDecorator> for HistoryItemDto {
    fn from(value: &ItemDecorator) -> Self {
        Self {
            id: value.id,
            title: value.item.title.clone(),
            application: value.item.application.clone(),
            pin: value.item.pin,
            shortcuts: value.shortcut_keys(),
            number_of_copies: value.item.number_of_copies,
            first_copied_epoch_ms: value.item.first_copied_epoch_ms,
            last_copied_epoch_ms: value.item.last_copied_epoch_ms,
            highlights: value
                .highlights
                .iter()
                .map(|range| (range.start, range.end))
                .collect(),
        }
    }
}

impl From<&HistorySnapshot> for ListResponse {
    fn from(value: &HistorySnapshot) -> Self {
        Self {
            items: value.items.iter().map(HistoryItemDto::from).collect(),
            total: value.total_count,
            pinned: value.pinned_count,
            has_more: value.has_more(),
            query: value.query.clone(),
        }
    }
}

impl From<LoadMoreOutcome> for LoadMoreResponse {
    fn from(value: LoadMoreOutcome) -> Self {
        match value {
            LoadMoreOutcome::Skipped => Self::Skipped,
            LoadMoreOutcome::InFlight => Self::InFlight,
            LoadMoreOutcome::Exhausted => Self::Exhausted,
            LoadMoreOutcome::Appended(ids) => Self::Appended(ids),
        }
    }
}

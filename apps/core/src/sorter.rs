use serde::{Deserialize, Serialize};

use crate::decorator::ItemDecorator;
use crate::model::HistoryItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinPosition {
    #[default]
    Top,
    Bottom,
}

pub trait Recency {
    fn is_pinned(&self) -> bool;
    fn recency(&self) -> (i64, i64);
}

impl Recency for HistoryItem {
    fn is_pinned(&self) -> bool {
        self.pin.is_some()
    }

    fn recency(&self) -> (i64, i64) {
        (self.last_copied_epoch_ms, self.id.unwrap_or(i64::MAX))
    }
}

impl Recency for ItemDecorator {
    fn is_pinned(&self) -> bool {
        self.item.pin.is_some()
    }

    fn recency(&self) -> (i64, i64) {
        (self.item.last_copied_epoch_ms, self.id)
    }
}

/// Pinned and unpinned blocks, each newest first, concatenated per `pin_to`.
pub fn sort<T: Recency>(items: Vec<T>, pin_to: PinPosition) -> Vec<T> {
    let (mut pinned, mut unpinned): (Vec<T>, Vec<T>) =
        items.into_iter().partition(|item| item.is_pinned());
    pinned.sort_by(|a, b| b.recency().cmp(&a.recency()));
    unpinned.sort_by(|a, b| b.recency().cmp(&a.recency()));

    match pin_to {
        PinPosition::Top => {
            pinned.extend(unpinned);
            pinned
        }
        PinPosition::Bottom => {
            unpinned.extend(pinned);
            unpinned
        }
    }
}

/// Index at which `item` lands when inserted into an already sorted list.
pub fn insertion_index<T: Recency, U: Recency>(sorted: &[T], item: &U, pin_to: PinPosition) -> usize {
    let pinned = item.is_pinned();
    let key = item.recency();

    let block_start = match (pin_to, pinned) {
        (PinPosition::Top, true) | (PinPosition::Bottom, false) => 0,
        (PinPosition::Top, false) | (PinPosition::Bottom, true) => sorted
            .iter()
            .position(|other| other.is_pinned() == pinned)
            .unwrap_or(sorted.len()),
    };

    sorted[block_start..]
        .iter()
        .position(|other| other.is_pinned() != pinned || other.recency() < key)
        .map(|offset| block_start + offset)
        .unwrap_or(sorted.len())
}

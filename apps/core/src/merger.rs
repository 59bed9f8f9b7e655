use tracing::debug;

use crate::history_store::{HistoryStore, ItemFilter, SortOrder, StoreError};
use crate::model::HistoryItem;
use crate::session_log::SessionLog;

#[derive(Debug, Clone)]
pub enum Decision {
    New,
    MergeWith(HistoryItem),
}

/// Finds the stored record `incoming` should fold into.
///
/// Stored duplicates win over the session log; among several duplicates the
/// newest one that is not `incoming` itself is picked.
pub fn resolve(
    store: &dyn HistoryStore,
    log: &SessionLog,
    incoming: &HistoryItem,
) -> Result<Decision, StoreError> {
    let candidates = store.fetch(
        &ItemFilter::SimilarTo(incoming),
        SortOrder::NewestFirst,
        None,
        None,
    )?;
    if let Some(existing) = candidates
        .into_iter()
        .find(|candidate| incoming.id.is_none() || candidate.id != incoming.id)
    {
        debug!(existing_id = ?existing.id, "incoming item duplicates stored item");
        return Ok(Decision::MergeWith(existing));
    }

    if let Some(source) = log.modification_source(incoming) {
        debug!(source_id = ?source.id, "incoming item modifies a session item");
        return Ok(Decision::MergeWith(source.clone()));
    }

    Ok(Decision::New)
}

/// Folds `existing` into `incoming`. The payload is the incoming one;
/// creation time, pin and title come from `existing`, copies are summed.
pub fn merge(existing: &HistoryItem, mut incoming: HistoryItem) -> HistoryItem {
    incoming.id = None;
    incoming.first_copied_epoch_ms = existing
        .first_copied_epoch_ms
        .min(incoming.first_copied_epoch_ms);
    incoming.number_of_copies = incoming
        .number_of_copies
        .saturating_add(existing.number_of_copies);
    incoming.pin = existing.pin;
    incoming.title = existing.title.clone();
    if incoming.from_self {
        incoming.application = existing.application.clone();
    } else if incoming.application.is_none() {
        incoming.application = existing.application.clone();
    }
    incoming
}

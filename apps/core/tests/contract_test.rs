use clipstack_core::contract::{HistoryItemDto, ListResponse, LoadMoreResponse};
use clipstack_core::decorator::ItemDecorator;
use clipstack_core::history::{HistorySnapshot, LoadMoreOutcome, LoadState};
use clipstack_core::model::HistoryItem;
use clipstack_core::shortcuts::update_shortcuts;

#[test]
fn list_response_carries_shortcuts_and_highlights() {
    let mut item = HistoryItem::text("hello world")
        .with_copied_at(42)
        .with_application("Terminal");
    item.id = Some(7);
    let mut decorated = vec![ItemDecorator::new(item)];
    decorated[0].highlight(vec![0..5]);
    update_shortcuts(&mut decorated, false);

    let snapshot = HistorySnapshot {
        items: decorated,
        loaded_count: 1,
        total_count: 3,
        pinned_count: 0,
        query: "hello".into(),
        state: LoadState::Loaded,
    };

    let response = ListResponse::from(&snapshot);
    assert!(response.has_more);
    assert_eq!(
        response.items,
        vec![HistoryItemDto {
            id: 7,
            title: "hello world".into(),
            application: Some("Terminal".into()),
            pin: None,
            shortcuts: vec!['1'],
            number_of_copies: 1,
            first_copied_epoch_ms: 42,
            last_copied_epoch_ms: 42,
            highlights: vec![(0, 5)],
        }]
    );
}

#[test]
fn load_more_outcome_serializes_with_tag() {
    let appended = LoadMoreResponse::from(LoadMoreOutcome::Appended(vec![3, 2]));
    let json = serde_json::to_value(&appended).unwrap();
    assert_eq!(json, serde_json::json!({ "outcome": "appended", "ids": [3, 2] }));

    let exhausted = serde_json::to_value(LoadMoreResponse::from(LoadMoreOutcome::Exhausted)).unwrap();
    assert_eq!(exhausted, serde_json::json!({ "outcome": "exhausted" }));
}

use std::sync::Arc;
use std::time::Duration;

use clipstack_core::clipboard::NoopClipboard;
use clipstack_core::config::Config;
use clipstack_core::core_service::{CoreService, ServiceError};
use clipstack_core::history::{History, HistoryContext, HistoryEvent, LoadMoreOutcome};
use clipstack_core::history_store::open_memory;
use clipstack_core::model::HistoryItem;
use clipstack_core::settings::SettingsChange;
use tokio::sync::broadcast;

fn test_config() -> Config {
    Config {
        page_size: 2,
        search_debounce_ms: 200,
        refresh_interval_secs: 30,
        ..Config::default()
    }
}

fn spawn_service(config: Config) -> CoreService {
    CoreService::spawn(History::new(HistoryContext {
        store: Box::new(open_memory().unwrap()),
        config,
        clipboard: Arc::new(NoopClipboard),
    }))
}

async fn seeded_service() -> CoreService {
    let service = spawn_service(test_config());
    for (i, text) in ["apple", "banana", "cherry", "apricot"].iter().enumerate() {
        service
            .add(HistoryItem::text(text).with_copied_at(100 + i as i64), i as i64)
            .await
            .unwrap();
    }
    service.load().await.unwrap();
    service
}

fn drain(events: &mut broadcast::Receiver<HistoryEvent>) -> Vec<HistoryEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

fn filtered_queries(events: &[HistoryEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            HistoryEvent::Filtered { query, .. } => Some(query.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn rapid_queries_collapse_into_one_filter_pass() {
    let service = seeded_service().await;
    let mut events = service.subscribe();

    for query in ["a", "ap", "apr"] {
        service.set_query(query).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    tokio::time::sleep(Duration::from_millis(500)).await;

    let snapshot = service.snapshot().await.unwrap();
    assert_eq!(filtered_queries(&drain(&mut events)), vec!["apr"]);
    assert_eq!(snapshot.query, "apr");
    let titles: Vec<&str> = snapshot.items.iter().map(|item| item.title()).collect();
    assert_eq!(titles, vec!["apricot"]);
}

#[tokio::test(start_paused = true)]
async fn empty_query_clears_without_waiting() {
    let service = seeded_service().await;
    service.set_query("cher").await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(service.snapshot().await.unwrap().items.len(), 1);

    let mut events = service.subscribe();
    service.set_query("zzz").await.unwrap();
    service.set_query("").await.unwrap();

    let snapshot = service.snapshot().await.unwrap();
    assert_eq!(snapshot.query, "");
    assert_eq!(snapshot.items.len(), 2);

    tokio::time::sleep(Duration::from_millis(500)).await;
    service.snapshot().await.unwrap();
    assert_eq!(filtered_queries(&drain(&mut events)), vec![""]);
}

#[tokio::test(start_paused = true)]
async fn second_load_more_reports_in_flight() {
    let service = seeded_service().await;

    let (first, second) = tokio::join!(service.load_more(), service.load_more());

    assert!(matches!(first.unwrap(), LoadMoreOutcome::Appended(ids) if ids.len() == 2));
    assert_eq!(second.unwrap(), LoadMoreOutcome::InFlight);
    assert_eq!(service.load_more().await.unwrap(), LoadMoreOutcome::Exhausted);
}

#[tokio::test(start_paused = true)]
async fn abandoned_load_more_does_not_block_the_next_one() {
    let service = spawn_service(test_config());
    for i in 0..6i64 {
        service
            .add(HistoryItem::text(&format!("clip {i}")).with_copied_at(100 + i), i)
            .await
            .unwrap();
    }
    service.load().await.unwrap();

    tokio::select! {
        biased;
        _ = service.load_more() => panic!("load_more finished before the owner ran"),
        _ = async {} => {}
    }

    let outcome = service.load_more().await.unwrap();
    assert!(matches!(outcome, LoadMoreOutcome::Appended(ids) if ids.len() == 2));
    assert_eq!(service.snapshot().await.unwrap().loaded_count, 6);
    assert_eq!(service.load_more().await.unwrap(), LoadMoreOutcome::Exhausted);
}

#[tokio::test(start_paused = true)]
async fn load_more_is_skipped_while_filtered() {
    let service = seeded_service().await;
    let snapshot = service.search_now("cherry").await.unwrap();
    assert_eq!(snapshot.items.len(), 1);

    assert_eq!(service.load_more().await.unwrap(), LoadMoreOutcome::Skipped);
}

#[tokio::test(start_paused = true)]
async fn visible_panel_refreshes_until_hidden() {
    let service = seeded_service().await;
    service.load_more().await.unwrap();
    assert_eq!(service.snapshot().await.unwrap().loaded_count, 4);

    service.set_visible(true).await.unwrap();
    let mut events = service.subscribe();
    tokio::time::sleep(Duration::from_secs(31)).await;
    service.snapshot().await.unwrap();

    let refreshed = drain(&mut events)
        .into_iter()
        .filter(|event| matches!(event, HistoryEvent::Loaded { .. }))
        .count();
    assert_eq!(refreshed, 1);
    assert_eq!(service.snapshot().await.unwrap().loaded_count, 2);

    service.set_visible(false).await.unwrap();
    drain(&mut events);
    tokio::time::sleep(Duration::from_secs(120)).await;
    service.snapshot().await.unwrap();
    assert!(drain(&mut events)
        .iter()
        .all(|event| !matches!(event, HistoryEvent::Loaded { .. })));
}

#[tokio::test(start_paused = true)]
async fn hiding_drops_pending_query() {
    let service = seeded_service().await;
    service.set_visible(true).await.unwrap();
    service.set_query("banana").await.unwrap();
    service.set_visible(false).await.unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(service.snapshot().await.unwrap().query, "");
}

#[tokio::test]
async fn invalid_settings_are_rejected() {
    let service = seeded_service().await;
    let result = service.apply_settings(SettingsChange::PageSize(0)).await;
    assert!(matches!(result, Err(ServiceError::History(_))));

    service
        .apply_settings(SettingsChange::PageSize(10))
        .await
        .unwrap();
    assert_eq!(service.snapshot().await.unwrap().loaded_count, 4);
}

#[tokio::test]
async fn open_rejects_invalid_config() {
    let config = Config {
        page_size: 0,
        ..Config::default()
    };
    let result = CoreService::open(config, Arc::new(NoopClipboard));
    assert!(matches!(result, Err(ServiceError::Config(_))));
}

use std::time::Instant;

use crate::decorator::ItemDecorator;
use crate::model::HistoryItem;
use crate::search::{search, SearchMode};

fn p95_ms(samples: &mut [f64]) -> f64 {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let last = samples.len().saturating_sub(1);
    let idx = ((last as f64) * 0.95).round() as usize;
    samples[idx.min(last)]
}

fn loaded_items() -> Vec<ItemDecorator> {
    let mut items: Vec<ItemDecorator> = (0..10_000)
        .map(|i| {
            let mut item = HistoryItem::text(&format!("clipboard entry {i:05} from the build log"));
            item.id = Some(i);
            ItemDecorator::new(item)
        })
        .collect();

    let mut report = HistoryItem::text("Q4 revenue report draft");
    report.id = Some(10_000);
    items.push(ItemDecorator::new(report));
    items
}

fn median_batch_p95(items: &[ItemDecorator], query: &str, mode: SearchMode) -> (f64, Vec<f64>) {
    for _ in 0..10 {
        let _ = search(items, query, mode);
    }

    let mut batch_p95 = Vec::with_capacity(5);
    for _ in 0..5 {
        let mut samples = Vec::with_capacity(20);
        for _ in 0..20 {
            let start = Instant::now();
            let _ = search(items, query, mode);
            samples.push(start.elapsed().as_secs_f64() * 1000.0);
        }
        batch_p95.push(p95_ms(&mut samples));
    }

    batch_p95.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    (batch_p95[batch_p95.len() / 2], batch_p95)
}

#[test]
fn exact_filter_p95_under_50ms() {
    let items = loaded_items();
    let matches = search(&items, "q4 revenue", SearchMode::Exact);
    assert_eq!(matches.len(), 1);

    let (median_p95, batches) = median_batch_p95(&items, "q4 revenue", SearchMode::Exact);
    assert!(
        median_p95 <= 50.0,
        "median batch p95 too high: {median_p95:.3}ms (budget 50.0ms); batches={batches:?}",
    );
}

#[test]
fn fuzzy_filter_p95_under_250ms() {
    let items = loaded_items();
    let (median_p95, batches) = median_batch_p95(&items, "q4 reort", SearchMode::Fuzzy);
    assert!(
        median_p95 <= 250.0,
        "median batch p95 too high: {median_p95:.3}ms (budget 250.0ms); batches={batches:?}",
    );
}

use std::ops::Range;

use regex::RegexBuilder;
use serde::{Deserialize, Serialize};

use crate::decorator::ItemDecorator;
use crate::model::{normalize_for_search, ItemId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Exact,
    Fuzzy,
    Regexp,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub id: ItemId,
    pub score: i64,
    pub ranges: Vec<Range<usize>>,
}

/// Matches `query` against the titles of `items`, keeping their order.
pub fn search(items: &[ItemDecorator], query: &str, mode: SearchMode) -> Vec<SearchMatch> {
    if query.is_empty() || items.is_empty() {
        return Vec::new();
    }

    match mode {
        SearchMode::Exact => collect(items, |title| exact_match(title, query)),
        SearchMode::Fuzzy => fuzzy(items, query),
        SearchMode::Regexp => regexp(items, query),
        SearchMode::Mixed => {
            let exact = collect(items, |title| exact_match(title, query));
            if !exact.is_empty() {
                return exact;
            }
            let regexp = regexp(items, query);
            if !regexp.is_empty() {
                return regexp;
            }
            fuzzy(items, query)
        }
    }
}

fn collect<F>(items: &[ItemDecorator], matcher: F) -> Vec<SearchMatch>
where
    F: Fn(&str) -> Option<(i64, Vec<Range<usize>>)>,
{
    items
        .iter()
        .filter_map(|item| {
            matcher(item.title()).map(|(score, ranges)| SearchMatch {
                id: item.id,
                score,
                ranges,
            })
        })
        .collect()
}

fn fuzzy(items: &[ItemDecorator], query: &str) -> Vec<SearchMatch> {
    let normalized_query = normalize_for_search(query);
    if normalized_query.is_empty() {
        return Vec::new();
    }
    collect(items, |title| fuzzy_match(title, &normalized_query))
}

fn regexp(items: &[ItemDecorator], query: &str) -> Vec<SearchMatch> {
    let Ok(pattern) = RegexBuilder::new(query).case_insensitive(true).build() else {
        return Vec::new();
    };
    collect(items, |title| {
        pattern
            .find(title)
            .filter(|found| !found.range().is_empty())
            .map(|found| (10_000 - found.start() as i64, vec![found.range()]))
    })
}

fn exact_match(title: &str, query: &str) -> Option<(i64, Vec<Range<usize>>)> {
    let range = find_case_insensitive(title, query)?;
    let prefix_bonus = if range.start == 0 { 400 } else { 0 };
    let position_penalty = range.start as i64;
    Some((10_000 + prefix_bonus - position_penalty, vec![range]))
}

fn fuzzy_match(title: &str, normalized_query: &str) -> Option<(i64, Vec<Range<usize>>)> {
    let normalized_title = normalize_for_search(title);
    let score = score_normalized_title(&normalized_title, normalized_query)?;
    let positions = title_positions(title, normalized_query)?;
    Some((score, merge_positions(title, &positions)))
}

fn find_case_insensitive(haystack: &str, needle: &str) -> Option<Range<usize>> {
    let needle: Vec<char> = needle.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return None;
    }

    for (start, _) in haystack.char_indices() {
        let mut rest = haystack[start..].char_indices().flat_map(|(offset, c)| {
            c.to_lowercase()
                .map(move |lower| (offset + c.len_utf8(), lower))
        });
        let mut end = start;
        let mut matched = true;
        for wanted in &needle {
            match rest.next() {
                Some((next_end, lower)) if lower == *wanted => end = start + next_end,
                _ => {
                    matched = false;
                    break;
                }
            }
        }
        if matched {
            return Some(start..end);
        }
    }
    None
}

fn score_normalized_title(normalized_title: &str, query: &str) -> Option<i64> {
    if normalized_title.is_empty() || query.is_empty() {
        return None;
    }

    if let Some(position) = normalized_title.find(query) {
        let prefix_bonus = if position == 0 { 400 } else { 0 };
        let compact_bonus = (query.len() as i64) * 40;
        let position_penalty = position as i64;
        let length_penalty = (normalized_title.len() as i64 - query.len() as i64).abs();
        return Some(10_000 + prefix_bonus + compact_bonus - position_penalty - length_penalty);
    }

    let positions = subsequence_positions(normalized_title, query)?;
    let start_penalty = positions[0] as i64;
    let gap_penalty: i64 = positions
        .windows(2)
        .map(|pair| pair[1].saturating_sub(pair[0] + 1) as i64)
        .sum();
    let length_penalty = (normalized_title.len() as i64 - query.len() as i64).max(0);

    Some(5_000 + (query.len() as i64) * 30 - gap_penalty * 6 - start_penalty - length_penalty)
}

fn subsequence_positions(haystack: &str, needle: &str) -> Option<Vec<usize>> {
    let mut positions = Vec::with_capacity(needle.len());
    let mut next_start = 0;

    for needle_char in needle.chars() {
        let mut found = None;
        for (offset, hay_char) in haystack[next_start..].char_indices() {
            if hay_char == needle_char {
                let absolute = next_start + offset;
                found = Some(absolute);
                next_start = absolute + hay_char.len_utf8();
                break;
            }
        }

        let position = found?;
        positions.push(position);
    }

    Some(positions)
}

/// Byte offsets in `title` of the characters a normalized
/// subsequence match consumed.
fn title_positions(title: &str, normalized_query: &str) -> Option<Vec<usize>> {
    let mut wanted = normalized_query.chars().peekable();
    let mut positions = Vec::new();
    for (offset, c) in title.char_indices() {
        if !c.is_alphanumeric() {
            continue;
        }
        for lower in c.to_lowercase() {
            if wanted.peek() == Some(&lower) {
                wanted.next();
                if positions.last() != Some(&offset) {
                    positions.push(offset);
                }
            }
        }
        if wanted.peek().is_none() {
            return Some(positions);
        }
    }
    None
}

fn merge_positions(title: &str, positions: &[usize]) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = Vec::new();
    for &start in positions {
        let width = title[start..].chars().next().map(char::len_utf8).unwrap_or(1);
        match ranges.last_mut() {
            Some(last) if last.end == start => last.end = start + width,
            _ => ranges.push(start..start + width),
        }
    }
    ranges
}

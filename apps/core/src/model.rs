use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

pub type ItemId = i64;

/// Monotonic token handed out by the clipboard every time its contents change.
pub type ChangeToken = i64;

pub const TEXT_CONTENT: &str = "text/plain";
pub const HTML_CONTENT: &str = "text/html";
pub const RTF_CONTENT: &str = "text/rtf";
pub const FILE_URL_CONTENT: &str = "text/uri-list";
pub const PNG_CONTENT: &str = "image/png";

const MAX_TITLE_CHARS: usize = 1_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemContent {
    pub kind: String,
    pub value: Vec<u8>,
}

impl ItemContent {
    pub fn new(kind: &str, value: impl Into<Vec<u8>>) -> Self {
        Self {
            kind: kind.to_string(),
            value: value.into(),
        }
    }

    pub fn text(value: &str) -> Self {
        Self::new(TEXT_CONTENT, value.as_bytes())
    }

    fn is_text(&self) -> bool {
        self.kind == TEXT_CONTENT
    }

    fn matches(&self, other: &ItemContent) -> bool {
        if self.kind != other.kind {
            return false;
        }
        if self.is_text() {
            return trim_trailing_whitespace(&self.value) == trim_trailing_whitespace(&other.value);
        }
        self.value == other.value
    }
}

/// A logical history entry. Equality of entries is content based, see
/// [`HistoryItem::same_contents`]; `id` is only the store row.
#[derive(Debug, Clone)]
pub struct HistoryItem {
    pub id: Option<ItemId>,
    pub contents: Vec<ItemContent>,
    pub title: String,
    pub application: Option<String>,
    pub first_copied_epoch_ms: i64,
    pub last_copied_epoch_ms: i64,
    pub number_of_copies: u32,
    pub pin: Option<char>,
    pub modified: Option<ChangeToken>,
    pub from_self: bool,
}

impl HistoryItem {
    pub fn new(contents: Vec<ItemContent>) -> Self {
        let now = now_epoch_ms();
        let mut item = Self {
            id: None,
            contents,
            title: String::new(),
            application: None,
            first_copied_epoch_ms: now,
            last_copied_epoch_ms: now,
            number_of_copies: 1,
            pin: None,
            modified: None,
            from_self: false,
        };
        item.title = item.generate_title();
        item
    }

    pub fn text(value: &str) -> Self {
        Self::new(vec![ItemContent::text(value)])
    }

    pub fn with_copied_at(mut self, epoch_ms: i64) -> Self {
        self.first_copied_epoch_ms = epoch_ms;
        self.last_copied_epoch_ms = epoch_ms;
        self
    }

    pub fn with_application(mut self, application: &str) -> Self {
        self.application = Some(application.to_string());
        self
    }

    pub fn with_pin(mut self, pin: char) -> Self {
        self.pin = Some(pin);
        self
    }

    pub fn with_modified(mut self, token: ChangeToken) -> Self {
        self.modified = Some(token);
        self
    }

    pub fn from_self(mut self) -> Self {
        self.from_self = true;
        self
    }

    pub fn is_pinned(&self) -> bool {
        self.pin.is_some()
    }

    pub fn text_value(&self) -> Option<String> {
        self.contents
            .iter()
            .find(|content| content.is_text())
            .map(|content| String::from_utf8_lossy(&content.value).into_owned())
    }

    /// Same payload and types, regardless of order or timestamps.
    pub fn same_contents(&self, other: &HistoryItem) -> bool {
        self.contents.len() == other.contents.len()
            && self
                .contents
                .iter()
                .all(|content| other.contents.contains(content))
    }

    /// True when every content of `other` is present here. Text compares
    /// without trailing whitespace.
    pub fn supersedes(&self, other: &HistoryItem) -> bool {
        if other.contents.is_empty() {
            return false;
        }
        other.contents.iter().all(|theirs| {
            self.contents
                .iter()
                .any(|ours| ours.matches(theirs))
        })
    }

    pub fn generate_title(&self) -> String {
        if let Some(text) = self.text_value() {
            return preview_text(&text, MAX_TITLE_CHARS);
        }
        if let Some(url) = self
            .contents
            .iter()
            .find(|content| content.kind == FILE_URL_CONTENT)
        {
            return preview_text(&String::from_utf8_lossy(&url.value), MAX_TITLE_CHARS);
        }
        if self.contents.iter().any(|content| content.kind == PNG_CONTENT) {
            return "Image".to_string();
        }
        String::new()
    }
}

pub fn normalize_for_search(input: &str) -> String {
    input
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

pub fn preview_text(value: &str, max_chars: usize) -> String {
    let single_line = value.replace(['\r', '\n'], " ").trim().to_string();
    single_line.chars().take(max_chars).collect()
}

pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn trim_trailing_whitespace(value: &[u8]) -> &[u8] {
    let end = value
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map(|index| index + 1)
        .unwrap_or(0);
    &value[..end]
}

#[cfg(test)]
mod tests {
    use super::{HistoryItem, ItemContent, HTML_CONTENT};

    #[test]
    fn identity_ignores_timestamps() {
        let a = HistoryItem::text("hello").with_copied_at(1);
        let b = HistoryItem::text("hello").with_copied_at(2);
        assert!(a.same_contents(&b));
        assert!(!a.same_contents(&HistoryItem::text("hello!")));
    }

    #[test]
    fn richer_item_supersedes_plain_text() {
        let rich = HistoryItem::new(vec![
            ItemContent::text("hello"),
            ItemContent::new(HTML_CONTENT, "<b>hello</b>"),
        ]);
        let plain = HistoryItem::text("hello  \n");
        assert!(rich.supersedes(&plain));
        assert!(!plain.supersedes(&rich));
    }

    #[test]
    fn empty_item_is_never_superseded() {
        let empty = HistoryItem::new(Vec::new());
        assert!(!HistoryItem::text("x").supersedes(&empty));
    }

    #[test]
    fn title_is_single_line() {
        assert_eq!(HistoryItem::text(" a\nb\r\nc ").title, "a b  c");
    }
}

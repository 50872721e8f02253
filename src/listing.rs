//! Popup-style listing of a page's markers, newest first.

use std::fmt;

use chrono::{Local, TimeZone};

use crate::store::types::{MarkerKind, PageRecord};

/// Characters of snippet shown per entry before the ellipsis.
pub const PREVIEW_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq)]
pub struct ListingEntry {
    pub kind: MarkerKind,
    pub title: String,
    pub created: String,
    pub preview: String,
}

/// Entries for every marker in `record`, most recent first.
pub fn entries(record: &PageRecord) -> Vec<ListingEntry> {
    record
        .markers
        .iter()
        .rev()
        .map(|m| ListingEntry {
            kind: m.kind,
            title: m.page_title.clone(),
            created: format_time(m.created_at),
            preview: preview(&m.snippet),
        })
        .collect()
}

pub fn preview(snippet: &str) -> String {
    if snippet.chars().count() <= PREVIEW_CHARS {
        return snippet.to_string();
    }
    let mut cut: String = snippet.chars().take(PREVIEW_CHARS).collect();
    cut.push('…');
    cut
}

/// Local wall-clock time for an epoch-millisecond timestamp.
pub fn format_time(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => millis.to_string(),
    }
}

impl fmt::Display for ListingEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} · {} · {}", self.kind.label(), self.title, self.created)?;
        if !self.preview.is_empty() {
            write!(f, "\n    {}", self.preview)?;
        }
        Ok(())
    }
}

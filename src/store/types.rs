use serde::{Deserialize, Serialize};

/// Normalized page identity, `lrf:<origin><path>`.
pub type PageKey = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    /// Captured passively on scroll. At most one per page.
    Auto,
    /// Dropped explicitly by the reader.
    Manual,
}

impl MarkerKind {
    pub fn label(self) -> &'static str {
        match self {
            MarkerKind::Auto => "Auto",
            MarkerKind::Manual => "Manual",
        }
    }
}

/// A persisted reading position. Field names match the extension's stored JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MarkerKind,
    /// Ancestor chain encoded as a CSS selector.
    #[serde(rename = "selector", default)]
    pub structural_path: String,
    /// Up to 160 characters of collapsed visible text.
    #[serde(default)]
    pub snippet: String,
    /// djb2 hash of `snippet`, base 36.
    #[serde(rename = "hash", default)]
    pub fingerprint: String,
    #[serde(rename = "scrollY", default)]
    pub scroll_offset: f64,
    /// Epoch milliseconds.
    #[serde(default)]
    pub created_at: i64,
    #[serde(rename = "title", default)]
    pub page_title: String,
}

/// Everything stored for one page key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageRecord {
    /// Oldest first.
    pub markers: Vec<Marker>,
    pub last_updated: i64,
}

impl PageRecord {
    pub fn count(&self, kind: MarkerKind) -> usize {
        self.markers.iter().filter(|m| m.kind == kind).count()
    }
}

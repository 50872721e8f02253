//! Maps a stored [`Marker`] back onto the current document.

use tracing::debug;

use crate::dom::{collapse_whitespace, Document, BLOCK_TAGS};
use crate::store::types::{Marker, MarkerKind};

use super::builder::snippet_of;
use super::identity::content_fingerprint;

/// Leading snippet characters searched for during the text fallback.
pub const SNIPPET_PROBE_CHARS: usize = 40;

/// Outcome of resolving a marker. A miss is an expected result: the caller
/// falls back to the stored scroll offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<N> {
    /// The structural path still selects an element.
    Structural(N),
    /// The path failed but the snippet was found in a block.
    Snippet(N),
    Miss,
}

impl<N: Copy> Resolution<N> {
    pub fn node(&self) -> Option<N> {
        match self {
            Resolution::Structural(node) | Resolution::Snippet(node) => Some(*node),
            Resolution::Miss => None,
        }
    }
}

/// Structural lookup, then snippet search, then miss.
pub fn resolve<D: Document>(marker: &Marker, doc: &D) -> Resolution<D::Node> {
    if !marker.structural_path.is_empty() {
        if let Some(node) = doc.find_by_selector(&marker.structural_path) {
            debug!(marker_id = %marker.id, "resolved by structural path");
            return Resolution::Structural(node);
        }
    }

    if !marker.snippet.is_empty() {
        let probe: String = marker.snippet.chars().take(SNIPPET_PROBE_CHARS).collect();
        let candidates = doc.find_all_by_text(BLOCK_TAGS, &|text| {
            collapse_whitespace(text).contains(probe.as_str())
        });
        if let Some(node) = pick_candidate(doc, &candidates, &marker.fingerprint) {
            debug!(
                marker_id = %marker.id,
                candidates = candidates.len(),
                "resolved by snippet"
            );
            return Resolution::Snippet(node);
        }
    }

    debug!(marker_id = %marker.id, "marker did not resolve");
    Resolution::Miss
}

/// First candidate in document order, unless several matched and one of
/// them carries exactly the fingerprinted snippet.
fn pick_candidate<D: Document>(
    doc: &D,
    candidates: &[D::Node],
    fingerprint: &str,
) -> Option<D::Node> {
    if candidates.len() > 1 && !fingerprint.is_empty() {
        let exact = candidates.iter().copied().find(|&node| {
            content_fingerprint(&snippet_of(&doc.visible_text(node))) == fingerprint
        });
        if exact.is_some() {
            return exact;
        }
    }
    candidates.first().copied()
}

/// The marker to restore: the latest manual marker, else the latest auto one.
pub fn select_best(markers: &[Marker]) -> Option<&Marker> {
    let latest = |kind: MarkerKind| markers.iter().rev().find(|m| m.kind == kind);
    latest(MarkerKind::Manual).or_else(|| latest(MarkerKind::Auto))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::builder::build_marker_at;
    use crate::dom::HtmlPage;

    fn marker(kind: MarkerKind, created_at: i64) -> Marker {
        Marker {
            id: format!("{:?}@{}", kind, created_at),
            kind,
            structural_path: String::new(),
            snippet: String::new(),
            fingerprint: String::new(),
            scroll_offset: 0.0,
            created_at,
            page_title: String::new(),
        }
    }

    fn snippet_marker(path: &str, snippet: &str) -> Marker {
        Marker {
            structural_path: path.to_string(),
            snippet: snippet.to_string(),
            fingerprint: content_fingerprint(snippet),
            ..marker(MarkerKind::Auto, 0)
        }
    }

    #[test]
    fn test_select_best_prefers_latest_manual() {
        let markers = vec![
            marker(MarkerKind::Auto, 1),
            marker(MarkerKind::Manual, 2),
            marker(MarkerKind::Manual, 3),
        ];
        assert_eq!(select_best(&markers).unwrap().id, "Manual@3");
    }

    #[test]
    fn test_select_best_manual_beats_newer_auto() {
        let markers = vec![marker(MarkerKind::Manual, 1), marker(MarkerKind::Auto, 9)];
        assert_eq!(select_best(&markers).unwrap().id, "Manual@1");
    }

    #[test]
    fn test_select_best_falls_back_to_auto() {
        let markers = vec![marker(MarkerKind::Auto, 4)];
        assert_eq!(select_best(&markers).unwrap().id, "Auto@4");
        assert!(select_best(&[]).is_none());
    }

    #[test]
    fn test_snippet_stage_when_path_is_stale() {
        let page = HtmlPage::parse("<body><p>intro</p><p>say hello world today</p></body>");
        let m = snippet_marker("html>body>article>p:nth-of-type(7)", "hello world");

        let resolution = resolve(&m, &page);
        let Resolution::Snippet(node) = resolution else {
            panic!("expected snippet match, got {:?}", resolution);
        };
        assert_eq!(page.visible_text(node), "say hello world today");
    }

    #[test]
    fn test_malformed_path_falls_through_to_snippet() {
        let page = HtmlPage::parse("<body><p>say hello world today</p></body>");
        let m = snippet_marker("p:nth-of-type(", "hello world");
        assert!(matches!(resolve(&m, &page), Resolution::Snippet(_)));
    }

    #[test]
    fn test_snippet_match_ignores_whitespace_layout() {
        let page = HtmlPage::parse("<body><p>say   hello\n   world today</p></body>");
        let m = snippet_marker("", "hello world");
        assert!(matches!(resolve(&m, &page), Resolution::Snippet(_)));
    }

    #[test]
    fn test_miss_when_nothing_matches() {
        let page = HtmlPage::parse("<body><p>something else</p></body>");
        let m = snippet_marker("html>body>section", "hello world");
        assert_eq!(resolve(&m, &page), Resolution::Miss);
        assert_eq!(resolve(&m, &page).node(), None);
    }

    #[test]
    fn test_snippet_probe_uses_first_40_chars() {
        let page = HtmlPage::parse(
            "<body><p>0123456789012345678901234567890123456789 and a new ending</p></body>",
        );
        let m = snippet_marker(
            "",
            "0123456789012345678901234567890123456789 with the old ending",
        );
        assert!(matches!(resolve(&m, &page), Resolution::Snippet(_)));
    }

    #[test]
    fn test_fingerprint_prefers_exact_block_over_container() {
        let page = HtmlPage::parse(
            "<body><div id=\"wrap\"><p>first</p><p>the exact paragraph</p></div></body>",
        );
        let m = snippet_marker("html>body>div>p:nth-of-type(9)", "the exact paragraph");

        let node = resolve(&m, &page).node().unwrap();
        assert_eq!(page.tag_name(node), "p");
        assert_eq!(page.visible_text(node), "the exact paragraph");
    }

    #[test]
    fn test_without_fingerprint_first_in_document_order_wins() {
        let page = HtmlPage::parse(
            "<body><div><p>first</p><p>the exact paragraph</p></div></body>",
        );
        let m = Marker {
            fingerprint: String::new(),
            ..snippet_marker("", "the exact paragraph")
        };
        let node = resolve(&m, &page).node().unwrap();
        assert_eq!(page.tag_name(node), "div");
    }

    #[test]
    fn test_round_trip_on_unchanged_document() {
        let source = r##"
            <html><body>
              <main>
                <h2>Chapter</h2>
                <p>One</p>
                <p>Two <a href="#">link</a></p>
                <ul><li>a</li><li>b</li><li>c</li></ul>
              </main>
            </body></html>
        "##;
        let page = HtmlPage::parse(source);
        let targets = [
            page.find_by_selector("main > p:nth-of-type(2)").unwrap(),
            page.find_by_selector("li:nth-of-type(3)").unwrap(),
            page.find_by_selector("h2").unwrap(),
        ];

        for target in targets {
            let built = build_marker_at(&page, Some(target), MarkerKind::Manual, 5).unwrap();
            let stored: Marker =
                serde_json::from_str(&serde_json::to_string(&built).unwrap()).unwrap();
            let reloaded = HtmlPage::parse(source);
            assert_eq!(
                resolve(&stored, &reloaded),
                Resolution::Structural(target)
            );
        }
    }
}

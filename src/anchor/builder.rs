//! Turns a live element into a persistable [`Marker`].

use crate::dom::{collapse_whitespace, Document, BLOCK_TAGS};
use crate::store::types::{Marker, MarkerKind};

use super::identity::{content_fingerprint, marker_id};

pub const SNIPPET_MAX_CHARS: usize = 160;

/// Upper bound on structural path segments.
pub const MAX_PATH_DEPTH: usize = 20;

/// Nearest block-level ancestor of `node` (inclusive), or `node` itself when
/// no ancestor is a block. Without a node, the document body.
pub fn closest_block<D: Document>(doc: &D, node: Option<D::Node>) -> Option<D::Node> {
    match node {
        Some(node) => Some(doc.closest(node, BLOCK_TAGS).unwrap_or(node)),
        None => doc.body(),
    }
}

/// Encodes the ancestor chain of `node` as a CSS selector.
///
/// An element with an id ends the walk. Other elements get `:nth-of-type`
/// only when a same-tag sibling exists. Deep trees yield a suffix-only path.
pub fn structural_path<D: Document>(doc: &D, node: D::Node) -> String {
    let mut segments = Vec::new();
    let mut current = Some(node);

    while let Some(element) = current {
        if segments.len() >= MAX_PATH_DEPTH {
            break;
        }
        let tag = doc.tag_name(element);
        if let Some(id) = doc.element_id(element) {
            segments.push(format!("{}#{}", tag, escape_css_ident(&id)));
            break;
        }
        let Some((index, count)) = doc.sibling_position(element) else {
            break;
        };
        if count > 1 {
            segments.push(format!("{}:nth-of-type({})", tag, index));
        } else {
            segments.push(tag);
        }
        current = doc.parent_element(element);
    }

    segments.reverse();
    segments.join(">")
}

/// Collapsed, trimmed text cut to [`SNIPPET_MAX_CHARS`].
pub fn snippet_of(text: &str) -> String {
    collapse_whitespace(text)
        .trim()
        .chars()
        .take(SNIPPET_MAX_CHARS)
        .collect()
}

/// Builds a marker for `node` stamped with the current time.
pub fn build_marker<D: Document>(
    doc: &D,
    node: Option<D::Node>,
    kind: MarkerKind,
) -> Option<Marker> {
    build_marker_at(doc, node, kind, chrono::Utc::now().timestamp_millis())
}

/// Builds a marker anchored on the block containing `node`.
///
/// Returns `None` only when there is neither a node nor a body to fall back on.
pub fn build_marker_at<D: Document>(
    doc: &D,
    node: Option<D::Node>,
    kind: MarkerKind,
    created_at: i64,
) -> Option<Marker> {
    let block = closest_block(doc, node)?;
    let snippet = snippet_of(&doc.visible_text(block));

    Some(Marker {
        id: marker_id(created_at),
        kind,
        structural_path: structural_path(doc, block),
        fingerprint: content_fingerprint(&snippet),
        snippet,
        scroll_offset: doc.scroll_y(),
        created_at,
        page_title: doc.title(),
    })
}

/// Serializes `ident` so it parses back as the same CSS identifier.
fn escape_css_ident(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len());

    for (i, &ch) in chars.iter().enumerate() {
        let code = ch as u32;
        if ch == '\0' {
            out.push('\u{FFFD}');
        } else if (0x1..=0x1f).contains(&code)
            || code == 0x7f
            || (i == 0 && ch.is_ascii_digit())
            || (i == 1 && ch.is_ascii_digit() && chars[0] == '-')
        {
            out.push_str(&format!("\\{:x} ", code));
        } else if i == 0 && ch == '-' && chars.len() == 1 {
            out.push_str("\\-");
        } else if code >= 0x80 || ch == '-' || ch == '_' || ch.is_ascii_alphanumeric() {
            out.push(ch);
        } else {
            out.push('\\');
            out.push(ch);
        }
    }

    out
}

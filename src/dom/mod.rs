//! Page model the anchoring engine runs against.
//!
//! The resolver and builder only ever talk to a [`Document`]; rendering and
//! scrolling go through [`PageView`]. [`HtmlPage`] implements both over a
//! parsed HTML tree so the whole engine runs without a browser.

pub mod html;

pub use html::HtmlPage;

/// Block-level tags a marker may anchor to.
pub const BLOCK_TAGS: &[&str] = &[
    "p",
    "article",
    "section",
    "li",
    "h1",
    "h2",
    "h3",
    "h4",
    "pre",
    "code",
    "blockquote",
    "main",
    "div",
];

/// Collapses every whitespace run into a single space. Does not trim.
pub fn collapse_whitespace(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }
    out
}

/// How a scroll request should be animated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Instant,
    Smooth,
}

/// Floating control injected into the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Affordance {
    pub id: String,
    pub class: String,
    pub label: String,
}

/// Read access to a live page: structure, text and viewport.
pub trait Document {
    /// Handle to an element. Only valid for the document that produced it.
    type Node: Copy + Eq + std::fmt::Debug;

    /// Lowercase tag name.
    fn tag_name(&self, node: Self::Node) -> String;

    /// Non-empty `id` attribute.
    fn element_id(&self, node: Self::Node) -> Option<String>;

    /// Parent, when it is an element (the document node is not).
    fn parent_element(&self, node: Self::Node) -> Option<Self::Node>;

    /// 1-based position among same-tag siblings and the number of such
    /// siblings. `None` for a node with no parent at all.
    fn sibling_position(&self, node: Self::Node) -> Option<(usize, usize)>;

    /// First element matching a CSS selector. A selector that fails to parse
    /// matches nothing.
    fn find_by_selector(&self, selector: &str) -> Option<Self::Node>;

    /// Elements whose tag is in `tags`, in document order, for which
    /// `predicate` holds on their visible text.
    fn find_all_by_text(
        &self,
        tags: &[&str],
        predicate: &dyn Fn(&str) -> bool,
    ) -> Vec<Self::Node>;

    /// Raw text content, excluding script-like subtrees.
    fn visible_text(&self, node: Self::Node) -> String;

    fn body(&self) -> Option<Self::Node>;

    /// Element under the middle of the viewport.
    fn element_at_viewport_center(&self) -> Option<Self::Node>;

    /// Element holding the anchor of the current text selection.
    fn selection_anchor(&self) -> Option<Self::Node>;

    fn scroll_y(&self) -> f64;

    fn title(&self) -> String;

    /// Nearest inclusive ancestor whose tag is in `tags`.
    fn closest(&self, node: Self::Node, tags: &[&str]) -> Option<Self::Node> {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if tags.contains(&self.tag_name(candidate).as_str()) {
                return Some(candidate);
            }
            current = self.parent_element(candidate);
        }
        None
    }
}

/// Mutations the render controller and orchestrator apply to a page.
pub trait PageView: Document {
    fn has_class(&self, node: Self::Node, class: &str) -> bool;

    fn add_class(&mut self, node: Self::Node, class: &str);

    fn remove_class(&mut self, node: Self::Node, class: &str);

    /// Every element currently carrying `class`, in document order.
    fn nodes_with_class(&self, class: &str) -> Vec<Self::Node>;

    fn attribute(&self, node: Self::Node, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: Self::Node, name: &str, value: &str);

    fn has_affordance(&self, id: &str) -> bool;

    /// Appends an affordance to the document root.
    fn insert_affordance(&mut self, affordance: Affordance);

    /// Returns whether an affordance was removed.
    fn remove_affordance(&mut self, id: &str) -> bool;

    /// Records a scroll performed by the reader, as opposed to one requested
    /// through [`PageView::scroll_to`].
    fn user_scrolled(&mut self, y: f64, center: Option<Self::Node>);

    /// Places the selection anchor inside `node`, or clears the selection.
    fn set_selection(&mut self, node: Option<Self::Node>);

    fn scroll_into_view(&mut self, node: Self::Node, behavior: ScrollBehavior);

    fn scroll_to(&mut self, y: f64, behavior: ScrollBehavior);
}

//! [`Document`] backed by a `scraper` tree plus an in-memory viewport.
//!
//! There is no layout engine, so the host tells the page which element sits
//! at the viewport center and where the selection is. Visual state applied by
//! the render controller lives in overlays keyed by node id; the parsed tree
//! itself is never mutated.

use std::collections::{BTreeMap, HashMap};

use ego_tree::{NodeId, NodeRef};
use scraper::{node::Node, ElementRef, Html, Selector};
use tracing::debug;

use super::{collapse_whitespace, Affordance, Document, PageView, ScrollBehavior};

const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Last scroll the page was asked to perform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollRequest {
    Element {
        node: NodeId,
        behavior: ScrollBehavior,
    },
    Offset {
        y: f64,
        behavior: ScrollBehavior,
    },
}

#[derive(Debug, Default)]
struct Viewport {
    scroll_y: f64,
    center: Option<NodeId>,
    selection: Option<NodeId>,
    last_scroll: Option<ScrollRequest>,
}

pub struct HtmlPage {
    html: Html,
    viewport: Viewport,
    /// `true` = class added, `false` = class removed.
    class_overrides: HashMap<NodeId, BTreeMap<String, bool>>,
    attribute_overrides: HashMap<NodeId, BTreeMap<String, String>>,
    affordances: Vec<Affordance>,
}

impl HtmlPage {
    pub fn parse(source: &str) -> Self {
        Self {
            html: Html::parse_document(source),
            viewport: Viewport::default(),
            class_overrides: HashMap::new(),
            attribute_overrides: HashMap::new(),
            affordances: Vec::new(),
        }
    }

    pub fn set_scroll_y(&mut self, y: f64) {
        self.viewport.scroll_y = y;
    }

    /// Pins the element reported at the viewport center.
    pub fn set_viewport_center(&mut self, node: Option<NodeId>) {
        self.viewport.center = node;
    }

    pub fn last_scroll(&self) -> Option<ScrollRequest> {
        self.viewport.last_scroll
    }

    pub fn affordances(&self) -> &[Affordance] {
        &self.affordances
    }

    fn element(&self, node: NodeId) -> Option<ElementRef<'_>> {
        self.html.tree.get(node).and_then(ElementRef::wrap)
    }

    fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.html.tree.root().descendants().filter_map(ElementRef::wrap)
    }
}

fn collect_visible(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(text),
        Node::Element(element) if HIDDEN_TAGS.contains(&element.name()) => {}
        _ => {
            for child in node.children() {
                collect_visible(child, out);
            }
        }
    }
}

impl Document for HtmlPage {
    type Node = NodeId;

    fn tag_name(&self, node: NodeId) -> String {
        self.element(node)
            .map(|el| el.value().name().to_ascii_lowercase())
            .unwrap_or_default()
    }

    fn element_id(&self, node: NodeId) -> Option<String> {
        self.attribute(node, "id").filter(|id| !id.is_empty())
    }

    fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.element(node)?
            .parent()
            .and_then(ElementRef::wrap)
            .map(|parent| parent.id())
    }

    fn sibling_position(&self, node: NodeId) -> Option<(usize, usize)> {
        let element = self.element(node)?;
        let parent = element.parent()?;
        let name = element.value().name();

        let mut index = 0;
        let mut count = 0;
        for sibling in parent.children().filter_map(ElementRef::wrap) {
            if sibling.value().name() == name {
                count += 1;
                if sibling.id() == node {
                    index = count;
                }
            }
        }
        Some((index, count))
    }

    fn find_by_selector(&self, selector: &str) -> Option<NodeId> {
        let parsed = match Selector::parse(selector) {
            Ok(parsed) => parsed,
            Err(err) => {
                debug!(selector, error = ?err, "selector did not parse");
                return None;
            }
        };
        self.html.select(&parsed).next().map(|el| el.id())
    }

    fn find_all_by_text(&self, tags: &[&str], predicate: &dyn Fn(&str) -> bool) -> Vec<NodeId> {
        self.elements()
            .filter(|el| tags.contains(&el.value().name()))
            .map(|el| el.id())
            .filter(|&node| predicate(&self.visible_text(node)))
            .collect()
    }

    fn visible_text(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let Some(root) = self.html.tree.get(node) {
            collect_visible(root, &mut out);
        }
        out
    }

    fn body(&self) -> Option<NodeId> {
        self.elements()
            .find(|el| el.value().name() == "body")
            .map(|el| el.id())
    }

    fn element_at_viewport_center(&self) -> Option<NodeId> {
        self.viewport.center.or_else(|| self.body())
    }

    fn selection_anchor(&self) -> Option<NodeId> {
        self.viewport.selection
    }

    fn scroll_y(&self) -> f64 {
        self.viewport.scroll_y
    }

    fn title(&self) -> String {
        self.elements()
            .find(|el| el.value().name() == "title")
            .map(|el| collapse_whitespace(&el.text().collect::<String>()).trim().to_string())
            .unwrap_or_default()
    }
}

impl PageView for HtmlPage {
    fn has_class(&self, node: NodeId, class: &str) -> bool {
        if let Some(state) = self
            .class_overrides
            .get(&node)
            .and_then(|overrides| overrides.get(class))
        {
            return *state;
        }
        self.element(node)
            .is_some_and(|el| el.value().classes().any(|c| c == class))
    }

    fn add_class(&mut self, node: NodeId, class: &str) {
        self.class_overrides
            .entry(node)
            .or_default()
            .insert(class.to_string(), true);
    }

    fn remove_class(&mut self, node: NodeId, class: &str) {
        self.class_overrides
            .entry(node)
            .or_default()
            .insert(class.to_string(), false);
    }

    fn nodes_with_class(&self, class: &str) -> Vec<NodeId> {
        self.elements()
            .map(|el| el.id())
            .filter(|&node| self.has_class(node, class))
            .collect()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        if let Some(value) = self
            .attribute_overrides
            .get(&node)
            .and_then(|attrs| attrs.get(name))
        {
            return Some(value.clone());
        }
        self.element(node)
            .and_then(|el| el.value().attr(name))
            .map(str::to_string)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.attribute_overrides
            .entry(node)
            .or_default()
            .insert(name.to_string(), value.to_string());
    }

    fn has_affordance(&self, id: &str) -> bool {
        self.affordances.iter().any(|a| a.id == id)
    }

    fn insert_affordance(&mut self, affordance: Affordance) {
        self.affordances.push(affordance);
    }

    fn remove_affordance(&mut self, id: &str) -> bool {
        let before = self.affordances.len();
        self.affordances.retain(|a| a.id != id);
        self.affordances.len() != before
    }

    fn user_scrolled(&mut self, y: f64, center: Option<NodeId>) {
        self.viewport.scroll_y = y;
        if center.is_some() {
            self.viewport.center = center;
        }
    }

    fn set_selection(&mut self, node: Option<NodeId>) {
        self.viewport.selection = node;
    }

    fn scroll_into_view(&mut self, node: NodeId, behavior: ScrollBehavior) {
        self.viewport.center = Some(node);
        self.viewport.last_scroll = Some(ScrollRequest::Element { node, behavior });
    }

    fn scroll_to(&mut self, y: f64, behavior: ScrollBehavior) {
        self.viewport.scroll_y = y;
        self.viewport.last_scroll = Some(ScrollRequest::Offset { y, behavior });
    }
}

//! Highlight state for the resolved marker and the floating jump control.

use crate::dom::{Affordance, PageView};
use crate::store::types::Marker;

pub const TARGET_CLASS: &str = "lrf-target";
pub const MARKER_ID_ATTR: &str = "data-lrf-id";
pub const JUMP_AFFORDANCE_ID: &str = "lrf-jump";
const JUMP_AFFORDANCE_CLASS: &str = "lrf-floating-btn";
const JUMP_AFFORDANCE_LABEL: &str = "Jump to marker";

/// Keeps at most one element highlighted per page.
#[derive(Debug, Default)]
pub struct Renderer {
    last_rendered: Option<String>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the marker currently shown, if any.
    pub fn last_rendered(&self) -> Option<&str> {
        self.last_rendered.as_deref()
    }

    /// Moves the highlight to `node` and makes sure the jump control exists.
    pub fn render<V: PageView>(&mut self, page: &mut V, node: V::Node, marker: &Marker) {
        self.clear(page);
        page.add_class(node, TARGET_CLASS);
        page.set_attribute(node, MARKER_ID_ATTR, &marker.id);
        self.last_rendered = Some(marker.id.clone());
        ensure_jump_affordance(page);
    }

    /// Removes the highlight from every element carrying it.
    pub fn clear<V: PageView>(&mut self, page: &mut V) {
        for node in page.nodes_with_class(TARGET_CLASS) {
            page.remove_class(node, TARGET_CLASS);
        }
        self.last_rendered = None;
    }

    pub fn remove_jump_affordance<V: PageView>(&self, page: &mut V) -> bool {
        page.remove_affordance(JUMP_AFFORDANCE_ID)
    }
}

fn ensure_jump_affordance<V: PageView>(page: &mut V) {
    if page.has_affordance(JUMP_AFFORDANCE_ID) {
        return;
    }
    page.insert_affordance(Affordance {
        id: JUMP_AFFORDANCE_ID.to_string(),
        class: JUMP_AFFORDANCE_CLASS.to_string(),
        label: JUMP_AFFORDANCE_LABEL.to_string(),
    });
}

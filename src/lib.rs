//! Remembers where a reader stopped on a page and finds that spot again
//! after reloads, layout changes and in-page navigation.

pub mod anchor;
pub mod dom;
pub mod listing;
pub mod render;
pub mod session;
pub mod source;
pub mod state;
pub mod store;

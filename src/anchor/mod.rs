//! Marker anchoring: page identity, building markers from elements and
//! resolving them again later.

pub mod builder;
pub mod identity;
pub mod resolve;

pub use builder::{build_marker, closest_block, structural_path};
pub use identity::{content_fingerprint, page_key};
pub use resolve::{resolve, select_best, Resolution};

//! # SVG Document Model
//!
//! Everything needed to find and mutate placeholder nodes in an SVG template.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`ident`] | `_xHHHH_` escaped identifier decoding |
//! | [`tree`] | Owned, mutable XML tree with parse/serialize |
//! | [`index`] | Decoded id → element lookup, built in one walk |
//! | [`size`] | Intrinsic document size in points |

pub mod ident;
pub mod index;
pub mod size;
pub mod tree;

pub use ident::decode_id;
pub use index::{DuplicatePolicy, PlaceholderIndex, PlaceholderPolicy, extract_placeholders};
pub use size::{Size, intrinsic_size};
pub use tree::{Document, Element, Node, NodePath};

/// SVG namespace URI.
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// XLink namespace URI, used by the legacy `xlink:href` image reference.
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

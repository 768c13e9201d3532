//! Minimal DOM and position abstraction
//!
//! The narrow collaborator surface the selection model and text finder
//! consume: an arena document, two tree views (DOM and flat), ordered
//! positions, and a rendered-text index with synthetic geometry.

mod position;
mod strategy;
mod text;
mod tree;

pub use position::{is_text_position, Affinity, EphemeralRange, Position};
pub use strategy::{
    next_in_traversal, prev_in_traversal, DomTreeStrategy, FlatTreeStrategy, TreeStrategy,
};
pub use text::{Bias, BreakKind, Segment, TextIndex, CHAR_WIDTH, LINE_HEIGHT};
pub use tree::{Document, ElementData, NodeId, NodeKind};

pub(crate) use tree::is_block_tag;


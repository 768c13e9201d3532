//! # Textscope - Selection and Find-in-Page Engine
//!
//! The editing-selection and in-page text-search core of a browser
//! rendering engine: a canonical, always-valid visible selection over a
//! live document, and an incremental, time-sliced text finder with
//! cross-frame match aggregation.
//!
//! ## Architecture
//!
//! The engine is organized into the following core modules:
//!
//! - **dom**: Minimal arena document, the two tree views (DOM and flat),
//!   ordered positions, and the rendered-text index
//! - **editing**: Selection validation, granularity expansion, tree-view
//!   adjustment, and per-frame selection ownership
//! - **finder**: Plain-text search, the per-frame scoping state machine,
//!   match caching, and cross-frame count aggregation
//! - **frame**: Frame tree and the find-in-page controller
//! - **scheduler**: Cooperative task queue carrying scoping continuations
//! - **geometry**: Points and rectangles in page coordinates
//! - **utils**: Shared utilities and error types

pub mod dom;
pub mod editing;
pub mod finder;
pub mod frame;
pub mod geometry;
pub mod scheduler;
pub mod utils;

// Re-export main types for convenience
pub use editing::{FrameSelection, SelectionAdjuster, TextGranularity, VisibleSelection};
pub use finder::{FindClient, FindOptions, TextFinder};
pub use frame::{FindController, Frame, FrameId, FrameTree};
pub use utils::error::{Result, TextscopeError};

/// Engine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "Textscope";

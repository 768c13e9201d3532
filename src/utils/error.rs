//! Error types for the textscope engine
//!
//! Internal selection/search algorithms return sentinel values (`None`,
//! `-1` ordinals) rather than errors; this enum covers host-facing misuse
//! of the API surface.

use crate::dom::NodeId;
use crate::frame::FrameId;

/// Main error type for textscope operations
#[derive(Debug, thiserror::Error)]
pub enum TextscopeError {
    /// A position referenced a node outside the target document
    #[error("position node {0:?} does not belong to the target document")]
    ForeignPosition(NodeId),
    /// A position referenced a node removed from its document
    #[error("position node {0:?} is orphaned")]
    OrphanedPosition(NodeId),
    /// An operation named a frame that is not part of the frame tree
    #[error("unknown frame {0:?}")]
    UnknownFrame(FrameId),
    /// An operation named a frame that has been detached
    #[error("frame {0:?} is detached")]
    DetachedFrame(FrameId),
}

/// Convenience Result type for textscope operations
pub type Result<T> = std::result::Result<T, TextscopeError>;

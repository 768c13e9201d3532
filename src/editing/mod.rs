//! Selection model
//!
//! Validation of user-intent endpoints into a canonical selection, text
//! granularity expansion, conversion between tree views, and per-frame
//! selection ownership.

mod adjuster;
mod frame_selection;
mod granularity;
mod selection;

pub use adjuster::SelectionAdjuster;
pub use frame_selection::FrameSelection;
pub use granularity::TextGranularity;
pub use selection::{SelectionType, VisibleSelection};

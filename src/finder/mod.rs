//! Incremental find-in-page engine
//!
//! A stateless text-search primitive, a per-frame scoping state machine
//! with a wall-clock budget, the cached match entries it produces, and the
//! cross-frame aggregation counters reported to the host.

mod aggregator;
mod matches;
mod search;
mod text_finder;

pub use aggregator::{FindClient, FindMatchCounters};
pub use matches::FindMatch;
pub use search::{find_plain_text, SearchOptions};
pub use text_finder::{FindOptions, ScopingState, TextFinder, SCOPING_BUDGET};

#[cfg(test)]
pub use aggregator::MockFindClient;

pub(crate) use text_finder::ScopePass;

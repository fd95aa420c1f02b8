//! Custom ordering of navigation tree siblings.
//!
//! The user keeps a priority list in settings, one `name:rank` per line:
//!
//! ```text
//! Inbox:1
//! Projects:2
//! Archive:9999
//! ```
//!
//! Lower ranks sort first; names that are not listed share
//! [`DEFAULT_RANK`]. The list is parsed again on every sort pass, so there
//! is no cache to invalidate when the user edits it.

mod comparator;
mod ranking;

pub use comparator::{
    CustomOrder, NamedEntry, SiblingEntry, compare, custom_order_applies, sort_children,
    sort_entries,
};
pub use ranking::{DEFAULT_RANK, Ranking, build_ranking};

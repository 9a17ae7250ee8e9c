//! Tag-based views over a collection of scene items.
//!
//! A [`views::View`] is a boolean tag query plus explicit members (items
//! carrying the view's reserved membership tag). Views resolve to item sets
//! that the [`toggle`] engine reads and writes as one unit.

pub mod cli;
pub mod config;
pub mod eid;
pub mod errors;
pub mod items;
pub mod lock;
pub mod logging;
pub mod query;
pub mod resolve;
pub mod storage;
pub mod tags;
pub mod toggle;
pub mod views;

#[cfg(test)]
mod tests;

pub use errors::{ItemError, QueryError, TagError, ViewError};
pub use items::{Flag, Item, ItemId, ItemStore, Scene};
pub use query::{evaluate_query, validate_query};
pub use resolve::{resolve_view, resolve_views, ResolvedSet};
pub use tags::{is_valid_tag_name, TagSet};
pub use toggle::{
    aggregate_state, apply_exclusive, apply_hide, apply_show, apply_toggle, ExclusiveChange,
    FlagChange, TriState,
};
pub use views::{View, ViewStore};

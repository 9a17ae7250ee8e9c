//! Membership resolution: `resolved = query matches ∪ explicit members`.
//!
//! There is no per-item exclusion. Removing explicit membership from an item
//! the query still matches leaves it resolved.

use std::collections::BTreeSet;

use crate::{
    errors::{QueryError, ViewError},
    items::{ItemId, ItemStore},
    query::Query,
    views::{self, View},
};

/// Transient result of one resolution; ordered by id for stable output.
pub type ResolvedSet = BTreeSet<ItemId>;

/// Resolves one view against every item in the store.
///
/// A blank query contributes no matches, so a membership-only view resolves
/// to its explicit members. Stored views always carry validated queries; an
/// unvalidated query supplied by a caller can fail here.
pub fn resolve_view<S: ItemStore + ?Sized>(
    view: &View,
    items: &S,
) -> Result<ResolvedSet, QueryError> {
    let mut resolved = explicit_members(&view.membership_tag(), items);

    let query = Query::compile(&view.query)?;
    if !query.is_unconstrained() {
        resolved.extend(query_matches(&query, items));
    }

    log::debug!("view '{}' resolved to {} item(s)", view.name, resolved.len());
    Ok(resolved)
}

/// Resolves several views, refusing to proceed if any two share a
/// membership tag.
pub fn resolve_views<S: ItemStore + ?Sized>(
    views: &[&View],
    items: &S,
) -> Result<Vec<ResolvedSet>, ViewError> {
    views::check_unique_membership(views.iter().copied())?;
    views
        .iter()
        .map(|view| resolve_view(view, items).map_err(ViewError::from))
        .collect()
}

/// Items whose tags satisfy `query`. The empty query matches every item.
pub fn query_matches<S: ItemStore + ?Sized>(query: &Query, items: &S) -> ResolvedSet {
    items
        .item_ids()
        .into_iter()
        .filter(|id| items.get_tags(id).is_some_and(|tags| query.matches(&tags)))
        .collect()
}

/// Items carrying `membership_tag`.
pub fn explicit_members<S: ItemStore + ?Sized>(membership_tag: &str, items: &S) -> ResolvedSet {
    items
        .item_ids()
        .into_iter()
        .filter(|id| items.get_tags(id).is_some_and(|tags| tags.contains(membership_tag)))
        .collect()
}

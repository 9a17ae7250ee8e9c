use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    eid::Eid,
    errors::{ItemError, ViewError},
    items::{ItemId, ItemStore},
    query,
    storage::{self, StorageManager},
    tags::{self, MEMBERSHIP_TAG_PREFIX},
};

const VIEWS_FILE: &str = "views.yaml";
const DEFAULT_MAX_NAME_LEN: usize = 100;

/// A named virtual collection: items matching `query`, plus items carrying
/// the view's membership tag.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct View {
    pub id: Eid,
    pub name: String,
    /// Empty means membership only.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub query: String,
}

impl View {
    /// Reserved `view-{id}` tag marking explicit members. Never shown to
    /// users.
    pub fn membership_tag(&self) -> String {
        format!("{MEMBERSHIP_TAG_PREFIX}{}", self.id)
    }
}

pub struct ViewStore {
    views: Vec<View>,
    base_path: Option<String>,
    max_name_len: usize,
}

impl ViewStore {
    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self {
            views: vec![],
            base_path: None,
            max_name_len: DEFAULT_MAX_NAME_LEN,
        }
    }

    pub fn load(base_path: &str) -> Result<Self, ViewError> {
        let store = storage::BackendLocal::new(base_path).map_err(storage_err)?;

        if !store.exists(VIEWS_FILE) {
            let empty: Vec<View> = vec![];
            let yaml = serde_yml::to_string(&empty).map_err(storage_err)?;
            store.write(VIEWS_FILE, yaml.as_bytes()).map_err(storage_err)?;
        }

        let data = store.read(VIEWS_FILE).map_err(storage_err)?;
        let yaml_str = String::from_utf8(data).map_err(storage_err)?;
        let views: Vec<View> = serde_yml::from_str(&yaml_str).map_err(storage_err)?;

        for view in &views {
            if !tags::is_membership_tag(&view.membership_tag()) {
                return Err(ViewError::Storage(format!(
                    "view '{}' has id '{}' which cannot form a membership tag",
                    view.name, view.id
                )));
            }
            if let Err(e) = query::validate_query(&view.query) {
                return Err(ViewError::Storage(format!(
                    "view '{}' has an invalid stored query '{}': {e}",
                    view.name, view.query
                )));
            }
        }
        check_unique_membership(&views)?;

        Ok(Self {
            views,
            base_path: Some(base_path.to_string()),
            max_name_len: DEFAULT_MAX_NAME_LEN,
        })
    }

    pub fn with_max_name_len(mut self, max_name_len: usize) -> Self {
        self.max_name_len = max_name_len;
        self
    }

    fn save(&self) -> Result<(), ViewError> {
        let Some(base_path) = &self.base_path else {
            return Ok(());
        };
        let store = storage::BackendLocal::new(base_path).map_err(storage_err)?;
        let yaml = serde_yml::to_string(&self.views).map_err(storage_err)?;
        store.write(VIEWS_FILE, yaml.as_bytes()).map_err(storage_err)
    }

    pub fn list(&self) -> &[View] {
        &self.views
    }

    pub fn get(&self, id: &str) -> Option<&View> {
        self.views.iter().find(|v| v.id.as_str() == id)
    }

    /// Looks a view up by id, then by case-insensitive name.
    pub fn find(&self, key: &str) -> Result<&View, ViewError> {
        if let Some(view) = self.get(key) {
            return Ok(view);
        }
        let lower = key.to_lowercase();
        self.views
            .iter()
            .find(|v| v.name.to_lowercase() == lower)
            .ok_or_else(|| ViewError::NotFound(key.to_string()))
    }

    /// Creates a view. A non-empty query must validate.
    ///
    /// `items` is scanned so a fresh membership tag never adopts items that
    /// already carry it.
    pub fn create<S: ItemStore + ?Sized>(
        &mut self,
        name: &str,
        query: Option<&str>,
        items: &S,
    ) -> Result<View, ViewError> {
        let name = self.validate_name(name)?;
        self.check_duplicate_name(&name, None)?;
        let query = normalize_query(query.unwrap_or_default())?;

        let view = View {
            id: Eid::new(),
            name,
            query,
        };
        self.insert(view, items)
    }

    fn insert<S: ItemStore + ?Sized>(&mut self, view: View, items: &S) -> Result<View, ViewError> {
        let tag = view.membership_tag();
        let taken = self.views.iter().any(|v| v.membership_tag() == tag)
            || items
                .item_ids()
                .iter()
                .any(|id| items.get_tags(id).is_some_and(|t| t.contains(&tag)));
        if taken {
            log::error!("generated membership tag {tag} is already in use");
            return Err(ViewError::MembershipTagCollision {
                tag,
                view: view.name,
            });
        }

        self.views.push(view.clone());
        self.save()?;
        log::info!("created view '{}' ({})", view.name, view.id);
        Ok(view)
    }

    pub fn rename(&mut self, id: &str, name: &str) -> Result<View, ViewError> {
        let idx = self.position(id)?;
        let name = self.validate_name(name)?;
        self.check_duplicate_name(&name, Some(id))?;

        self.views[idx].name = name;
        self.save()?;
        Ok(self.views[idx].clone())
    }

    /// Replaces the query. Only queries that validate are stored; an empty
    /// one turns the view into a membership-only view.
    pub fn set_query(&mut self, id: &str, query: &str) -> Result<View, ViewError> {
        let idx = self.position(id)?;
        let query = normalize_query(query)?;

        self.views[idx].query = query;
        self.save()?;
        Ok(self.views[idx].clone())
    }

    /// Deletes a view and strips its membership tag from every item.
    /// Returns the removed view and the number of items cleaned.
    ///
    /// Items are cleaned first; if that fails the view is kept so the delete
    /// can be retried.
    pub fn delete<S: ItemStore + ?Sized>(
        &mut self,
        id: &str,
        items: &mut S,
    ) -> Result<(View, usize), ViewError> {
        let idx = self.position(id)?;
        let cleaned = clear_membership(&self.views[idx], items)?;

        let view = self.views.remove(idx);
        self.save()?;
        log::info!(
            "deleted view '{}' ({}), cleaned {cleaned} item(s)",
            view.name,
            view.id
        );
        Ok((view, cleaned))
    }

    fn position(&self, id: &str) -> Result<usize, ViewError> {
        self.views
            .iter()
            .position(|v| v.id.as_str() == id)
            .ok_or_else(|| ViewError::NotFound(id.to_string()))
    }

    fn validate_name(&self, name: &str) -> Result<String, ViewError> {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.chars().count() > self.max_name_len {
            return Err(ViewError::InvalidName(self.max_name_len));
        }
        Ok(trimmed.to_string())
    }

    fn check_duplicate_name(&self, name: &str, exclude_id: Option<&str>) -> Result<(), ViewError> {
        let lower = name.to_lowercase();
        let dup = self.views.iter().any(|v| {
            v.name.to_lowercase() == lower && exclude_id.map_or(true, |eid| v.id.as_str() != eid)
        });
        if dup {
            return Err(ViewError::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}

fn normalize_query(query: &str) -> Result<String, ViewError> {
    let trimmed = query.trim();
    query::validate_query(trimmed)?;
    Ok(trimmed.to_string())
}

/// Fails if two views would share a membership tag. Merging them silently
/// would corrupt both.
pub fn check_unique_membership<'a, I>(views: I) -> Result<(), ViewError>
where
    I: IntoIterator<Item = &'a View>,
{
    let mut seen = HashSet::new();
    for view in views {
        let tag = view.membership_tag();
        if !seen.insert(tag.clone()) {
            log::error!("membership tag {tag} shared by more than one view");
            return Err(ViewError::MembershipTagCollision {
                tag,
                view: view.name.clone(),
            });
        }
    }
    Ok(())
}

/// Makes the given items explicit members. Returns how many were added.
pub fn add_members<S: ItemStore + ?Sized>(
    view: &View,
    ids: &[ItemId],
    items: &mut S,
) -> Result<usize, ItemError> {
    let tag = view.membership_tag();
    let mut added = 0;
    for id in ids {
        if tags::insert_tag(items, id, &tag)? {
            added += 1;
        }
    }
    log::debug!("added {added} item(s) to view '{}'", view.name);
    Ok(added)
}

/// Drops explicit membership for the given items. Items matched by the
/// view's query stay in the resolved set.
pub fn remove_members<S: ItemStore + ?Sized>(
    view: &View,
    ids: &[ItemId],
    items: &mut S,
) -> Result<usize, ItemError> {
    let tag = view.membership_tag();
    let mut removed = 0;
    for id in ids {
        if tags::strip_tag(items, id, &tag)? {
            removed += 1;
        }
    }
    log::debug!("removed {removed} item(s) from view '{}'", view.name);
    Ok(removed)
}

/// Strips the membership tag from every item in the store.
pub fn clear_membership<S: ItemStore + ?Sized>(
    view: &View,
    items: &mut S,
) -> Result<usize, ItemError> {
    let tag = view.membership_tag();
    let mut cleared = 0;
    for id in items.item_ids() {
        if tags::strip_tag(items, &id, &tag)? {
            cleared += 1;
        }
    }
    log::debug!("cleared {cleared} membership tag(s) of view '{}'", view.name);
    Ok(cleared)
}

fn storage_err(e: impl std::fmt::Display) -> ViewError {
    ViewError::Storage(e.to_string())
}

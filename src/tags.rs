use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    errors::{ItemError, TagError},
    items::{ItemId, ItemStore},
    resolve::ResolvedSet,
};

/// Prefix of the reserved tags that mark explicit view membership.
pub const MEMBERSHIP_TAG_PREFIX: &str = "view-";

static TAG_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").expect("static tag name pattern compiles")
});

/// `view-` plus an uppercase Crockford ULID, the shape of generated view ids.
static MEMBERSHIP_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^view-[0-7][0-9A-HJKMNP-TV-Z]{25}$")
        .expect("static membership pattern compiles")
});

/// True for non-empty names made only of ASCII letters, digits, `_` and `-`.
pub fn is_valid_tag_name(name: &str) -> bool {
    TAG_NAME.is_match(name)
}

/// Only the exact `view-{ulid}` shape is reserved; `view-angle` is an
/// ordinary tag.
pub fn is_membership_tag(name: &str) -> bool {
    MEMBERSHIP_TAG.is_match(name)
}

/// Checks a tag typed by a user. Membership tags are managed through views
/// only.
pub fn validate_user_tag(name: &str) -> Result<(), TagError> {
    if !is_valid_tag_name(name) {
        return Err(TagError::Invalid(name.to_string()));
    }
    if is_membership_tag(name) {
        return Err(TagError::Reserved(name.to_string()));
    }
    Ok(())
}

/// Tags of one item: no duplicates, insertion order kept for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    /// Returns false if the tag was already present.
    pub fn insert(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.contains(&tag) {
            return false;
        }
        self.0.push(tag);
        true
    }

    /// Returns false if the tag was absent.
    pub fn remove(&mut self, tag: &str) -> bool {
        match self.0.iter().position(|t| t == tag) {
            Some(idx) => {
                self.0.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Tags safe to show to end users (membership tags hidden).
    pub fn visible(&self) -> impl Iterator<Item = &str> {
        self.iter().filter(|t| !is_membership_tag(t))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for TagSet {
    fn from(tags: Vec<String>) -> Self {
        tags.into_iter().collect()
    }
}

impl From<TagSet> for Vec<String> {
    fn from(tags: TagSet) -> Self {
        tags.0
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TagSet::new();
        for tag in iter {
            set.insert(tag);
        }
        set
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TagSort {
    #[default]
    Alpha,
    Usage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum TagMatch {
    /// Item carries at least one of the tags
    #[default]
    Any,
    /// Item carries every tag
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagUsage {
    pub name: String,
    pub count: usize,
}

/// Every user-visible tag carried by at least one item. Derived by scanning
/// the items each time; there is no registry to go stale.
pub fn scene_tags<S: ItemStore + ?Sized>(items: &S, sort: TagSort) -> Vec<TagUsage> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for id in items.item_ids() {
        if let Some(tags) = items.get_tags(&id) {
            for tag in tags.visible() {
                *counts.entry(tag.to_string()).or_default() += 1;
            }
        }
    }

    let mut usage: Vec<TagUsage> = counts
        .into_iter()
        .map(|(name, count)| TagUsage { name, count })
        .collect();

    if sort == TagSort::Usage {
        // stable sort keeps the alphabetical order among equal counts
        usage.sort_by(|a, b| b.count.cmp(&a.count));
    }
    usage
}

/// Items carrying any (or all) of `tags`. An empty tag list selects nothing.
pub fn items_with_tags<S: ItemStore + ?Sized>(
    items: &S,
    tags: &[String],
    mode: TagMatch,
) -> ResolvedSet {
    if tags.is_empty() {
        return ResolvedSet::new();
    }

    items
        .item_ids()
        .into_iter()
        .filter(|id| {
            let Some(item_tags) = items.get_tags(id) else {
                return false;
            };
            match mode {
                TagMatch::Any => tags.iter().any(|t| item_tags.contains(t)),
                TagMatch::All => tags.iter().all(|t| item_tags.contains(t)),
            }
        })
        .collect()
}

/// Adds a user tag to the given items. Returns how many items changed.
pub fn add_tag<S: ItemStore + ?Sized>(
    items: &mut S,
    ids: &[ItemId],
    tag: &str,
) -> Result<usize, TagError> {
    validate_user_tag(tag)?;
    let mut changed = 0;
    for id in ids {
        if insert_tag(items, id, tag)? {
            changed += 1;
        }
    }
    log::debug!("tag {tag} added to {changed} item(s)");
    Ok(changed)
}

/// Removes a user tag from the given items. Returns how many items changed.
pub fn remove_tag<S: ItemStore + ?Sized>(
    items: &mut S,
    ids: &[ItemId],
    tag: &str,
) -> Result<usize, TagError> {
    if is_membership_tag(tag) {
        return Err(TagError::Reserved(tag.to_string()));
    }
    let mut changed = 0;
    for id in ids {
        if strip_tag(items, id, tag)? {
            changed += 1;
        }
    }
    log::debug!("tag {tag} removed from {changed} item(s)");
    Ok(changed)
}

/// Read-modify-write of the full tag set; the store only sees atomic
/// replacements.
pub(crate) fn insert_tag<S: ItemStore + ?Sized>(
    items: &mut S,
    id: &ItemId,
    tag: &str,
) -> Result<bool, ItemError> {
    let mut tags = items
        .get_tags(id)
        .ok_or_else(|| ItemError::NotFound(id.clone()))?;
    if !tags.insert(tag) {
        return Ok(false);
    }
    items.set_tags(id, tags)?;
    Ok(true)
}

pub(crate) fn strip_tag<S: ItemStore + ?Sized>(
    items: &mut S,
    id: &ItemId,
    tag: &str,
) -> Result<bool, ItemError> {
    let mut tags = items
        .get_tags(id)
        .ok_or_else(|| ItemError::NotFound(id.clone()))?;
    if !tags.remove(tag) {
        return Ok(false);
    }
    items.set_tags(id, tags)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{Item, Scene};

    fn scene() -> Scene {
        Scene::from_items(vec![
            Item::new("Chair_01", &["furniture", "wood"]),
            Item::new("Desk_A", &["furniture", "desk", "view-01ARZ3NDEKTSV4RRFFQ69G5FAV"]),
            Item::new("Lamp", &["light"]),
        ])
        .unwrap()
    }

    #[test]
    fn tag_name_rule() {
        assert!(is_valid_tag_name("candle"));
        assert!(is_valid_tag_name("Hero_2-b"));
        assert!(!is_valid_tag_name(""));
        assert!(!is_valid_tag_name("has space"));
        assert!(!is_valid_tag_name("tag:x"));
        assert!(!is_valid_tag_name("ümlaut"));
    }

    #[test]
    fn tag_set_dedups_and_keeps_order() {
        let set: TagSet = vec!["b".to_string(), "a".to_string(), "b".to_string()].into();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn tag_set_deserialize_dedups() {
        let set: TagSet = serde_json::from_str(r#"["x","y","x"]"#).unwrap();
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["x","y"]"#);
    }

    #[test]
    fn scene_tags_hides_membership_tags() {
        let names: Vec<_> = scene_tags(&scene(), TagSort::Alpha)
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["desk", "furniture", "light", "wood"]);
    }

    #[test]
    fn scene_tags_by_usage() {
        let tags = scene_tags(&scene(), TagSort::Usage);
        assert_eq!(tags[0], TagUsage { name: "furniture".into(), count: 2 });
        assert_eq!(tags[1].name, "desk");
    }

    #[test]
    fn items_with_any_and_all() {
        let scene = scene();
        let any = items_with_tags(&scene, &["wood".into(), "light".into()], TagMatch::Any);
        assert_eq!(any.len(), 2);
        let all = items_with_tags(&scene, &["furniture".into(), "desk".into()], TagMatch::All);
        assert_eq!(all.into_iter().collect::<Vec<_>>(), vec![ItemId::from("Desk_A")]);
        assert!(items_with_tags(&scene, &[], TagMatch::Any).is_empty());
    }

    #[test]
    fn add_and_remove_tag() {
        let mut scene = scene();
        let ids = vec![ItemId::from("Chair_01"), ItemId::from("Lamp")];
        assert_eq!(add_tag(&mut scene, &ids, "wood").unwrap(), 1);
        assert_eq!(remove_tag(&mut scene, &ids, "wood").unwrap(), 2);
        assert!(!scene.get_tags(&"Lamp".into()).unwrap().contains("wood"));
    }

    #[test]
    fn add_tag_rejects_bad_and_reserved_names() {
        let mut scene = scene();
        let ids = vec![ItemId::from("Lamp")];
        assert_eq!(
            add_tag(&mut scene, &ids, "bad name"),
            Err(TagError::Invalid("bad name".into()))
        );
        assert!(matches!(
            add_tag(&mut scene, &ids, "view-01ARZ3NDEKTSV4RRFFQ69G5FAV"),
            Err(TagError::Reserved(_))
        ));
    }

    #[test]
    fn view_prefixed_user_tags_are_ordinary() {
        assert!(is_membership_tag("view-01ARZ3NDEKTSV4RRFFQ69G5FAV"));
        assert!(!is_membership_tag("view-angle"));
        assert!(!is_membership_tag("view-01arz3ndektsv4rrffq69g5fav"));
        assert!(!is_membership_tag("view-01ARZ3NDEKTSV4RRFFQ69G5FA"));

        let mut scene = scene();
        let ids = vec![ItemId::from("Lamp")];
        assert_eq!(add_tag(&mut scene, &ids, "view-angle").unwrap(), 1);
        let names: Vec<_> = scene_tags(&scene, TagSort::Alpha)
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["desk", "furniture", "light", "view-angle", "wood"]);
    }

    #[test]
    fn add_tag_to_missing_item() {
        let mut scene = scene();
        let err = add_tag(&mut scene, &[ItemId::from("Ghost")], "x").unwrap_err();
        assert!(matches!(err, TagError::Items(ItemError::NotFound(_))));
    }
}

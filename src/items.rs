//! The host item collaborator.
//!
//! The engine never owns items. It reads and writes their tag sets and three
//! boolean flags through [`ItemStore`]; tag sets are always replaced whole.
//! [`Scene`] is the in-memory implementation used by the CLI host and tests,
//! persisted as `scene.yaml`.

use std::{collections::HashMap, fmt::Display};

use serde::{Deserialize, Serialize};

use crate::{
    errors::ItemError,
    storage::{self, StorageManager},
    tags::TagSet,
};

const SCENE_FILE: &str = "scene.yaml";

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(fr: &str) -> Self {
        ItemId(fr.to_string())
    }
}

impl From<String> for ItemId {
    fn from(fr: String) -> Self {
        ItemId(fr)
    }
}

/// Which boolean flag of an item an operation reads or writes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Flag {
    #[default]
    Visible,
    Selected,
    Renderable,
}

impl Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Flag::Visible => "visible",
            Flag::Selected => "selected",
            Flag::Renderable => "renderable",
        };
        write!(f, "{name}")
    }
}

/// Read/write contract the engine needs from the host.
///
/// Getters return `None` for ids the store does not know. Enumeration order
/// must be stable between calls.
pub trait ItemStore {
    fn item_ids(&self) -> Vec<ItemId>;
    fn get_tags(&self, id: &ItemId) -> Option<TagSet>;
    fn set_tags(&mut self, id: &ItemId, tags: TagSet) -> Result<(), ItemError>;
    fn get_flag(&self, id: &ItemId, flag: Flag) -> Option<bool>;
    fn set_flag(&mut self, id: &ItemId, flag: Flag, value: bool) -> Result<(), ItemError>;
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    #[serde(default)]
    pub tags: TagSet,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub selected: bool,
    #[serde(default = "default_true")]
    pub renderable: bool,
}

fn default_true() -> bool {
    true
}

impl Item {
    /// A visible, renderable, unselected item.
    pub fn new(id: &str, tags: &[&str]) -> Self {
        Self {
            id: ItemId::from(id),
            tags: tags.iter().copied().collect(),
            visible: true,
            selected: false,
            renderable: true,
        }
    }

    pub fn flag(&self, flag: Flag) -> bool {
        match flag {
            Flag::Visible => self.visible,
            Flag::Selected => self.selected,
            Flag::Renderable => self.renderable,
        }
    }

    fn flag_mut(&mut self, flag: Flag) -> &mut bool {
        match flag {
            Flag::Visible => &mut self.visible,
            Flag::Selected => &mut self.selected,
            Flag::Renderable => &mut self.renderable,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SceneFile {
    #[serde(default)]
    items: Vec<Item>,
}

/// Ordered item collection with an id index.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    items: Vec<Item>,
    index: HashMap<ItemId, usize>,
}

impl Scene {
    pub fn from_items(items: Vec<Item>) -> Result<Self, ItemError> {
        let mut scene = Scene::default();
        for item in items {
            scene.add_item(item)?;
        }
        Ok(scene)
    }

    /// Loads `scene.yaml` from `base_path`, creating an empty one if absent.
    pub fn load(base_path: &str) -> Result<Self, ItemError> {
        let store = storage::BackendLocal::new(base_path).map_err(storage_err)?;

        if !store.exists(SCENE_FILE) {
            let yaml = serde_yml::to_string(&SceneFile::default()).map_err(storage_err)?;
            store.write(SCENE_FILE, yaml.as_bytes()).map_err(storage_err)?;
        }

        let data = store.read(SCENE_FILE).map_err(storage_err)?;
        let yaml_str = String::from_utf8(data).map_err(storage_err)?;
        let file: SceneFile = serde_yml::from_str(&yaml_str).map_err(storage_err)?;

        log::debug!("loaded {} item(s) from {base_path}/{SCENE_FILE}", file.items.len());
        Self::from_items(file.items)
    }

    pub fn save(&self, base_path: &str) -> Result<(), ItemError> {
        let store = storage::BackendLocal::new(base_path).map_err(storage_err)?;
        let file = SceneFile {
            items: self.items.clone(),
        };
        let yaml = serde_yml::to_string(&file).map_err(storage_err)?;
        store.write(SCENE_FILE, yaml.as_bytes()).map_err(storage_err)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.index.get(id).map(|&idx| &self.items[idx])
    }

    fn get_mut(&mut self, id: &ItemId) -> Result<&mut Item, ItemError> {
        match self.index.get(id) {
            Some(&idx) => Ok(&mut self.items[idx]),
            None => Err(ItemError::NotFound(id.clone())),
        }
    }

    pub fn add_item(&mut self, item: Item) -> Result<(), ItemError> {
        if self.index.contains_key(&item.id) {
            return Err(ItemError::Duplicate(item.id));
        }
        self.index.insert(item.id.clone(), self.items.len());
        self.items.push(item);
        Ok(())
    }

    pub fn remove_item(&mut self, id: &ItemId) -> Result<Item, ItemError> {
        let idx = self
            .index
            .remove(id)
            .ok_or_else(|| ItemError::NotFound(id.clone()))?;
        let item = self.items.remove(idx);
        for slot in self.index.values_mut() {
            if *slot > idx {
                *slot -= 1;
            }
        }
        Ok(item)
    }
}

impl ItemStore for Scene {
    fn item_ids(&self) -> Vec<ItemId> {
        self.items.iter().map(|i| i.id.clone()).collect()
    }

    fn get_tags(&self, id: &ItemId) -> Option<TagSet> {
        self.get(id).map(|i| i.tags.clone())
    }

    fn set_tags(&mut self, id: &ItemId, tags: TagSet) -> Result<(), ItemError> {
        self.get_mut(id)?.tags = tags;
        Ok(())
    }

    fn get_flag(&self, id: &ItemId, flag: Flag) -> Option<bool> {
        self.get(id).map(|i| i.flag(flag))
    }

    fn set_flag(&mut self, id: &ItemId, flag: Flag, value: bool) -> Result<(), ItemError> {
        *self.get_mut(id)?.flag_mut(flag) = value;
        Ok(())
    }
}

fn storage_err(e: impl Display) -> ItemError {
    ItemError::Storage(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_ids_rejected() {
        let err = Scene::from_items(vec![Item::new("a", &[]), Item::new("a", &[])]).unwrap_err();
        assert_eq!(err, ItemError::Duplicate("a".into()));
    }

    #[test]
    fn remove_item_keeps_index_consistent() {
        let mut scene = Scene::from_items(vec![
            Item::new("a", &[]),
            Item::new("b", &["x"]),
            Item::new("c", &[]),
        ])
        .unwrap();
        scene.remove_item(&"a".into()).unwrap();
        assert_eq!(scene.item_ids(), vec![ItemId::from("b"), ItemId::from("c")]);
        assert!(scene.get_tags(&"b".into()).unwrap().contains("x"));
        scene.set_flag(&"c".into(), Flag::Selected, true).unwrap();
        assert_eq!(scene.get_flag(&"c".into(), Flag::Selected), Some(true));
    }

    #[test]
    fn unknown_item_writes_fail() {
        let mut scene = Scene::default();
        let err = scene.set_flag(&"nope".into(), Flag::Visible, false).unwrap_err();
        assert_eq!(err, ItemError::NotFound("nope".into()));
        assert_eq!(scene.get_flag(&"nope".into(), Flag::Visible), None);
    }

    #[test]
    fn load_creates_file_and_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().to_str().unwrap();

        let mut scene = Scene::load(base).unwrap();
        assert!(scene.items().is_empty());
        assert!(dir.path().join(SCENE_FILE).exists());

        scene.add_item(Item::new("Win_A", &["window", "glass"])).unwrap();
        scene.set_flag(&"Win_A".into(), Flag::Renderable, false).unwrap();
        scene.save(base).unwrap();

        let reloaded = Scene::load(base).unwrap();
        let item = reloaded.get(&"Win_A".into()).unwrap();
        assert_eq!(item.tags.iter().collect::<Vec<_>>(), vec!["window", "glass"]);
        assert!(!item.renderable);
        assert!(item.visible);
    }

    #[test]
    fn missing_flags_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = "items:\n  - id: Chair_01\n    tags: [wood]\n";
        std::fs::write(dir.path().join(SCENE_FILE), yaml).unwrap();
        let scene = Scene::load(dir.path().to_str().unwrap()).unwrap();
        let chair = scene.get(&"Chair_01".into()).unwrap();
        assert!(chair.visible && chair.renderable && !chair.selected);
    }
}

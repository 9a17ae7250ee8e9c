use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    config::Config,
    errors::ItemError,
    items::{Flag, Item, ItemId, ItemStore, Scene},
    query::{self, Query},
    resolve::{self, ResolvedSet},
    tags::{self, TagSet},
    toggle::{self, FlagChange},
    views::{self, View, ViewStore},
};

use super::{
    errors::{CliError, CliResult},
    Command,
    types::{FlagArgs, ItemArgs, PaletteArgs, QueryArgs, TagArgs, ViewArgs, ViewsFlagArgs},
    validation::{parse_ids, parse_list, parse_tags, validate_item_id, validate_view_keys},
};

/// Everything one invocation works on. Views persist themselves on every
/// change; the scene is saved by the handlers that modify it.
pub struct Session {
    base_path: String,
    config: Config,
    scene: Scene,
    views: ViewStore,
    assume_yes: bool,
}

/// Item as printed: membership tags stay hidden.
#[derive(Serialize)]
struct ItemOutput<'a> {
    id: &'a ItemId,
    tags: Vec<&'a str>,
    visible: bool,
    selected: bool,
    renderable: bool,
}

impl<'a> From<&'a Item> for ItemOutput<'a> {
    fn from(item: &'a Item) -> Self {
        Self {
            id: &item.id,
            tags: item.tags.visible().collect(),
            visible: item.visible,
            selected: item.selected,
            renderable: item.renderable,
        }
    }
}

#[derive(Serialize)]
struct ResolvedOutput<'a> {
    id: &'a str,
    name: &'a str,
    count: usize,
    items: &'a ResolvedSet,
}

impl Session {
    pub fn open(config: Config, base_path: &str, assume_yes: bool) -> CliResult<Self> {
        let scene = Scene::load(base_path)?;
        let views = ViewStore::load(base_path)?.with_max_name_len(config.max_view_name_len);
        Ok(Self {
            base_path: base_path.to_string(),
            config,
            scene,
            views,
            assume_yes,
        })
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn views(&self) -> &ViewStore {
        &self.views
    }

    fn save_scene(&self) -> CliResult<()> {
        self.scene.save(&self.base_path)?;
        Ok(())
    }

    fn confirm(&self, message: String) -> CliResult<()> {
        if self.assume_yes || !self.config.confirm_destructive {
            return Ok(());
        }
        if inquire::prompt_confirmation(message)? {
            Ok(())
        } else {
            Err(CliError::UserCancelled)
        }
    }

    fn flag(&self, args: &FlagArgs) -> Flag {
        args.flag.unwrap_or(self.config.default_flag)
    }

    fn find_view(&self, key: &str) -> CliResult<View> {
        Ok(self.views.find(key)?.clone())
    }

    /// Looks up each key once. The same view named twice is used once;
    /// distinct views are kept even if they collide, so resolution can
    /// report it.
    fn find_views(&self, keys: &[String]) -> CliResult<Vec<&View>> {
        validate_view_keys(keys)?;
        let mut found: Vec<&View> = vec![];
        for key in keys {
            let view = self.views.find(key)?;
            if !found.iter().any(|v| std::ptr::eq(*v, view)) {
                found.push(view);
            }
        }
        Ok(found)
    }

    fn resolve(&self, keys: &[String]) -> CliResult<Vec<ResolvedSet>> {
        let views = self.find_views(keys)?;
        Ok(resolve::resolve_views(&views, &self.scene)?)
    }
}

/// Runs one subcommand and returns what to print. A string is printed as
/// is; anything else as JSON.
pub fn dispatch(command: Command, session: &mut Session) -> CliResult<Value> {
    match command {
        #[cfg(feature = "markdown-docs")]
        Command::MarkdownDocs {} => {
            Ok(Value::String(clap_markdown::help_markdown::<super::Args>()))
        }
        Command::Query { action } => handle_query(action, session),
        Command::Item { action } => handle_item(action, session),
        Command::Tag { action } => handle_tag(action, session),
        Command::View { action } => handle_view(action, session),
    }
}

pub fn handle_query(action: QueryArgs, session: &Session) -> CliResult<Value> {
    match action {
        QueryArgs::Validate { query } => match query::validate_query(&query) {
            Ok(()) => Ok(json!({ "valid": true })),
            Err(err) => Ok(json!({
                "valid": false,
                "error": err.to_string(),
                "position": err.position(),
            })),
        },
        QueryArgs::Eval { query, tags, item } => {
            let tag_set: TagSet = match (tags, item) {
                (Some(list), _) => parse_list(&list).into_iter().collect(),
                (None, Some(id)) => {
                    let id = ItemId::from(id);
                    session
                        .scene
                        .get_tags(&id)
                        .ok_or(ItemError::NotFound(id))?
                }
                (None, None) => TagSet::new(),
            };
            let matches = query::evaluate_query(&query, &tag_set)?;
            Ok(json!({ "matches": matches }))
        }
    }
}

pub fn handle_item(action: ItemArgs, session: &mut Session) -> CliResult<Value> {
    match action {
        ItemArgs::Add { id, tags } => {
            validate_item_id(&id)?;
            let tag_list = match tags {
                Some(list) => parse_tags(&[list])?,
                None => vec![],
            };
            for tag in &tag_list {
                tags::validate_user_tag(tag)?;
            }
            let mut item = Item::new(&id, &[]);
            item.tags = tag_list.into_iter().collect();

            let output = serde_json::to_value(ItemOutput::from(&item))?;
            session.scene.add_item(item)?;
            session.save_scene()?;
            Ok(output)
        }
        ItemArgs::List { query } => {
            let filter = query.as_deref().map(Query::compile).transpose()?;
            let items: Vec<ItemOutput> = session
                .scene
                .items()
                .iter()
                .filter(|item| filter.as_ref().map_or(true, |q| q.matches(&item.tags)))
                .map(ItemOutput::from)
                .collect();
            Ok(serde_json::to_value(items)?)
        }
        ItemArgs::Remove { ids } => {
            let ids = parse_ids(&ids)?;
            for id in &ids {
                if session.scene.get(id).is_none() {
                    return Err(ItemError::NotFound(id.clone()).into());
                }
            }
            session.confirm(format!("Are you sure you want to remove {} item(s)?", ids.len()))?;

            for id in &ids {
                session.scene.remove_item(id)?;
            }
            session.save_scene()?;
            Ok(json!({ "removed": ids.len() }))
        }
    }
}

pub fn handle_tag(action: TagArgs, session: &mut Session) -> CliResult<Value> {
    match action {
        TagArgs::Add { tag, ids } => {
            let ids = parse_ids(&ids)?;
            let changed = tags::add_tag(&mut session.scene, &ids, &tag)?;
            session.save_scene()?;
            Ok(json!({ "tag": tag, "changed": changed }))
        }
        TagArgs::Remove { tag, ids } => {
            let ids = parse_ids(&ids)?;
            let changed = tags::remove_tag(&mut session.scene, &ids, &tag)?;
            session.save_scene()?;
            Ok(json!({ "tag": tag, "changed": changed }))
        }
        TagArgs::List { sort } => {
            let sort = sort.unwrap_or(session.config.tag_sort);
            Ok(serde_json::to_value(tags::scene_tags(&session.scene, sort))?)
        }
        TagArgs::Show(args) => palette(args, session, toggle::apply_show),
        TagArgs::Hide(args) => palette(args, session, toggle::apply_hide),
        TagArgs::Toggle(args) => palette(args, session, toggle::apply_toggle),
        TagArgs::Select(args) => {
            let wanted = parse_tags(&args.tags)?;
            let matching = tags::items_with_tags(&session.scene, &wanted, args.mode);
            let change = toggle::apply_exclusive(&[matching], Flag::Selected, &mut session.scene)?;
            session.save_scene()?;
            Ok(serde_json::to_value(change)?)
        }
    }
}

type Apply = fn(&[ResolvedSet], Flag, &mut Scene) -> Result<FlagChange, ItemError>;

fn palette(args: PaletteArgs, session: &mut Session, apply: Apply) -> CliResult<Value> {
    let wanted = parse_tags(&args.tags)?;
    let flag = session.flag(&args.flag);
    let selected = tags::items_with_tags(&session.scene, &wanted, args.mode);

    let change = apply(&[selected], flag, &mut session.scene)?;
    session.save_scene()?;
    Ok(serde_json::to_value(change)?)
}

pub fn handle_view(action: ViewArgs, session: &mut Session) -> CliResult<Value> {
    match action {
        ViewArgs::Create { name, query } => {
            let view = session.views.create(&name, query.as_deref(), &session.scene)?;
            Ok(serde_json::to_value(view)?)
        }
        ViewArgs::List {} => {
            let mut out = vec![];
            for view in session.views.list() {
                let count = resolve::resolve_view(view, &session.scene)?.len();
                out.push(json!({
                    "id": view.id.as_str(),
                    "name": view.name,
                    "query": view.query,
                    "count": count,
                }));
            }
            Ok(Value::Array(out))
        }
        ViewArgs::Rename { view, name } => {
            let id = session.find_view(&view)?.id;
            let renamed = session.views.rename(&id, &name)?;
            Ok(serde_json::to_value(renamed)?)
        }
        ViewArgs::Query { view, query } => {
            let id = session.find_view(&view)?.id;
            let updated = session.views.set_query(&id, &query)?;
            Ok(serde_json::to_value(updated)?)
        }
        ViewArgs::Delete { views: keys } => {
            let targets: Vec<View> = session.find_views(&keys)?.into_iter().cloned().collect();
            let names: Vec<&str> = targets.iter().map(|v| v.name.as_str()).collect();
            session.confirm(format!(
                "Are you sure you want to delete {} view(s): {}?",
                targets.len(),
                names.join(", ")
            ))?;

            let mut out = vec![];
            for view in targets {
                // persist the stripped tags before the view record goes away
                let cleaned = views::clear_membership(&view, &mut session.scene)?;
                session.save_scene()?;
                session.views.delete(&view.id, &mut session.scene)?;
                out.push(json!({ "id": view.id.as_str(), "name": view.name, "cleaned": cleaned }));
            }
            Ok(Value::Array(out))
        }
        ViewArgs::Add { view, ids } => {
            let view = session.find_view(&view)?;
            let ids = parse_ids(&ids)?;
            let changed = views::add_members(&view, &ids, &mut session.scene)?;
            session.save_scene()?;
            Ok(json!({ "view": view.name, "changed": changed }))
        }
        ViewArgs::Remove { view, ids } => {
            let view = session.find_view(&view)?;
            let ids = parse_ids(&ids)?;
            let changed = views::remove_members(&view, &ids, &mut session.scene)?;
            session.save_scene()?;
            Ok(json!({ "view": view.name, "changed": changed }))
        }
        ViewArgs::Clear { view } => {
            let view = session.find_view(&view)?;
            session.confirm(format!(
                "Are you sure you want to clear every member of '{}'?",
                view.name
            ))?;
            let cleared = views::clear_membership(&view, &mut session.scene)?;
            session.save_scene()?;
            Ok(json!({ "view": view.name, "cleared": cleared }))
        }
        ViewArgs::Resolve { views: keys } => {
            let found = session.find_views(&keys)?;
            let sets = resolve::resolve_views(&found, &session.scene)?;
            let out: Vec<ResolvedOutput> = found
                .iter()
                .zip(sets.iter())
                .map(|(view, set)| ResolvedOutput {
                    id: view.id.as_str(),
                    name: &view.name,
                    count: set.len(),
                    items: set,
                })
                .collect();
            Ok(serde_json::to_value(out)?)
        }
        ViewArgs::State(args) => {
            let flag = session.flag(&args.flag);
            let sets = session.resolve(&args.views)?;
            let state = toggle::aggregate_state(&sets, flag, &session.scene);
            Ok(json!({ "flag": flag, "state": state }))
        }
        ViewArgs::Toggle(args) => apply_to_views(args, session, toggle::apply_toggle),
        ViewArgs::Show(args) => apply_to_views(args, session, toggle::apply_show),
        ViewArgs::Hide(args) => apply_to_views(args, session, toggle::apply_hide),
    }
}

fn apply_to_views(args: ViewsFlagArgs, session: &mut Session, apply: Apply) -> CliResult<Value> {
    let flag = session.flag(&args.flag);
    let sets = session.resolve(&args.views)?;

    let change = apply(&sets, flag, &mut session.scene)?;
    session.save_scene()?;
    Ok(serde_json::to_value(change)?)
}

use clap::Parser;
use serde_json::{json, Value};

use crate::{
    cli::{self, Args, CliError, Session},
    config::Config,
    items::{Flag, ItemStore},
    views::ViewStore,
};

fn base_dir() -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_str().unwrap().to_string();
    (dir, path)
}

fn open(path: &str) -> Session {
    Session::open(Config::default(), path, true).unwrap()
}

fn run(session: &mut Session, argv: &[&str]) -> Result<Value, CliError> {
    let args = Args::try_parse_from(std::iter::once("vg").chain(argv.iter().copied())).unwrap();
    cli::dispatch(args.command, session)
}

fn seed(session: &mut Session) {
    run(session, &["item", "add", "Chair_01", "--tags", "furniture,wood"]).unwrap();
    run(session, &["item", "add", "Win_A", "--tags", "window"]).unwrap();
    run(session, &["item", "add", "Win_B", "--tags", "window,glass"]).unwrap();
    run(session, &["item", "add", "Desk_A", "--tags", "furniture,desk"]).unwrap();
}

#[test]
pub fn test_query_validate_reports_position() {
    let (_dir, path) = base_dir();
    let mut session = open(&path);

    let ok = run(&mut session, &["query", "validate", "tag:a AND NOT tag:b"]).unwrap();
    assert_eq!(ok, json!({ "valid": true }));

    let bad = run(&mut session, &["query", "validate", "tag:a AND"]).unwrap();
    assert_eq!(bad["valid"], json!(false));
    assert_eq!(bad["position"], json!(1));
}

#[test]
pub fn test_query_eval_against_tags_and_items() {
    let (_dir, path) = base_dir();
    let mut session = open(&path);
    seed(&mut session);

    let out = run(&mut session, &["query", "eval", "tag:a OR tag:b", "--tags", "b"]).unwrap();
    assert_eq!(out, json!({ "matches": true }));

    let query = "tag:furniture AND NOT tag:desk";
    let out = run(&mut session, &["query", "eval", query, "--item", "Desk_A"]).unwrap();
    assert_eq!(out, json!({ "matches": false }));

    let err = run(&mut session, &["query", "eval", "tag:", "--tags", "a"]).unwrap_err();
    assert!(matches!(err, CliError::Query(_)));
}

#[test]
pub fn test_item_list_filters_by_query() {
    let (_dir, path) = base_dir();
    let mut session = open(&path);
    seed(&mut session);

    let out = run(&mut session, &["item", "list", "--query", "tag:furniture"]).unwrap();
    let ids: Vec<&str> = out
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["Chair_01", "Desk_A"]);

    let dup = run(&mut session, &["item", "add", "Win_A"]).unwrap_err();
    assert!(matches!(dup, CliError::Item(_)));
}

#[test]
pub fn test_reserved_tags_rejected() {
    let (_dir, path) = base_dir();
    let mut session = open(&path);
    seed(&mut session);

    let reserved = "view-01ARZ3NDEKTSV4RRFFQ69G5FAV";
    let err = run(&mut session, &["tag", "add", reserved, "Win_A"]).unwrap_err();
    assert!(matches!(err, CliError::Tag(_)));
    let err = run(&mut session, &["item", "add", "Lamp", "--tags", reserved]).unwrap_err();
    assert!(matches!(err, CliError::Tag(_)));

    // same prefix, not a view id
    let out = run(&mut session, &["tag", "add", "view-angle", "Win_A"]).unwrap();
    assert_eq!(out["changed"], json!(1));
}

#[test]
pub fn test_compositional_toggle_persists() {
    let (_dir, path) = base_dir();
    {
        let mut session = open(&path);
        seed(&mut session);
        run(&mut session, &["view", "create", "Window"]).unwrap();
        run(&mut session, &["view", "create", "Desk"]).unwrap();
        run(&mut session, &["view", "add", "Window", "Win_A,Win_B"]).unwrap();
        run(&mut session, &["view", "add", "desk", "Desk_A"]).unwrap();
        run(&mut session, &["tag", "show", "wood", "--flag", "selected"]).unwrap();
    }

    let mut session = open(&path);
    let state = run(&mut session, &["view", "state", "Window", "-f", "selected"]).unwrap();
    assert_eq!(state, json!({ "flag": "selected", "state": "ALL_OFF" }));

    run(&mut session, &["view", "toggle", "Window", "-f", "selected"]).unwrap();
    run(&mut session, &["view", "toggle", "Desk", "-f", "selected"]).unwrap();
    let change = run(&mut session, &["view", "toggle", "Window", "-f", "selected"]).unwrap();
    assert_eq!(change["previous"], json!("ALL_ON"));
    assert_eq!(change["affected"], json!(2));

    let reopened = open(&path);
    let selected: Vec<&str> = reopened
        .scene()
        .items()
        .iter()
        .filter(|i| i.selected)
        .map(|i| i.id.as_str())
        .collect();
    assert_eq!(selected, vec!["Chair_01", "Desk_A"]);
}

#[test]
pub fn test_view_list_counts_and_resolve() {
    let (_dir, path) = base_dir();
    let mut session = open(&path);
    seed(&mut session);

    run(&mut session, &["view", "create", "Hybrid", "--query", "tag:window"]).unwrap();
    run(&mut session, &["view", "add", "Hybrid", "Chair_01"]).unwrap();

    let list = run(&mut session, &["view", "list"]).unwrap();
    assert_eq!(list[0]["name"], json!("Hybrid"));
    assert_eq!(list[0]["count"], json!(3));

    // removing a query match does not drop it from the resolved set
    run(&mut session, &["view", "remove", "Hybrid", "Win_A"]).unwrap();
    let resolved = run(&mut session, &["view", "resolve", "Hybrid"]).unwrap();
    assert_eq!(resolved[0]["items"], json!(["Chair_01", "Win_A", "Win_B"]));

    run(&mut session, &["view", "query", "Hybrid", ""]).unwrap();
    let resolved = run(&mut session, &["view", "resolve", "Hybrid", "hybrid"]).unwrap();
    assert_eq!(resolved.as_array().unwrap().len(), 1);
    assert_eq!(resolved[0]["items"], json!(["Chair_01"]));
}

#[test]
pub fn test_view_delete_cleans_persisted_items() {
    let (_dir, path) = base_dir();
    let tag;
    {
        let mut session = open(&path);
        seed(&mut session);
        let view = run(&mut session, &["view", "create", "Window"]).unwrap();
        tag = format!("view-{}", view["id"].as_str().unwrap());
        run(&mut session, &["view", "add", "Window", "Win_A", "Win_B"]).unwrap();

        let out = run(&mut session, &["--yes", "view", "delete", "Window"]).unwrap();
        assert_eq!(out[0]["cleaned"], json!(2));
    }

    let session = open(&path);
    assert!(session.views().list().is_empty());
    for id in session.scene().item_ids() {
        assert!(!session.scene().get_tags(&id).unwrap().contains(&tag));
    }
    assert!(ViewStore::load(&path).unwrap().list().is_empty());
}

#[test]
pub fn test_view_names_validated() {
    let (_dir, path) = base_dir();
    let mut session = open(&path);

    run(&mut session, &["view", "create", "Lights"]).unwrap();
    let dup = run(&mut session, &["view", "create", "  lights "]).unwrap_err();
    assert!(matches!(dup, CliError::View(_)));
    let bad = run(&mut session, &["view", "create", "Broken", "--query", "tag:a OR"]).unwrap_err();
    assert!(matches!(bad, CliError::View(_)));
    let missing = run(&mut session, &["view", "clear", "Nope"]).unwrap_err();
    assert!(matches!(missing, CliError::View(_)));
}

#[test]
pub fn test_tag_palette_and_listing() {
    let (_dir, path) = base_dir();
    let mut session = open(&path);
    seed(&mut session);

    let argv = ["tag", "hide", "furniture", "window", "--match", "all"];
    let change = run(&mut session, &argv).unwrap();
    assert_eq!(change["affected"], json!(0));

    let change = run(&mut session, &["tag", "toggle", "window,desk"]).unwrap();
    assert_eq!(change["affected"], json!(3));
    assert_eq!(session.scene().get_flag(&"Win_B".into(), Flag::Visible), Some(false));
    assert_eq!(session.scene().get_flag(&"Chair_01".into(), Flag::Visible), Some(true));

    let tags = run(&mut session, &["tag", "list", "--sort", "usage"]).unwrap();
    assert_eq!(tags[0], json!({ "name": "furniture", "count": 2 }));
    assert_eq!(tags[1], json!({ "name": "window", "count": 2 }));

    let removed = run(&mut session, &["tag", "remove", "window", "Win_A,Win_B"]).unwrap();
    assert_eq!(removed["changed"], json!(2));
}

#[test]
pub fn test_item_ids_with_separators_rejected() {
    let (_dir, path) = base_dir();
    let mut session = open(&path);
    seed(&mut session);

    let err = run(&mut session, &["item", "add", "Chair 02"]).unwrap_err();
    assert!(matches!(err, CliError::Validation { ref field, .. } if field == "id"));
    let err = run(&mut session, &["item", "add", "Lamp,Shade"]).unwrap_err();
    assert!(matches!(err, CliError::Validation { ref field, .. } if field == "id"));

    let out = run(&mut session, &["item", "remove", "Win_A,Win_A", "Win_A"]).unwrap();
    assert_eq!(out["removed"], json!(1));
    assert!(session.scene().get_tags(&"Win_A".into()).is_none());
}

#[test]
pub fn test_tag_select_replaces_selection() {
    let (_dir, path) = base_dir();
    {
        let mut session = open(&path);
        seed(&mut session);
        run(&mut session, &["tag", "show", "wood", "--flag", "selected"]).unwrap();

        let out = run(&mut session, &["tag", "select", "window"]).unwrap();
        assert_eq!(out, json!({ "flag": "selected", "set": 2, "cleared": 1 }));
    }

    let session = open(&path);
    let selected: Vec<&str> = session
        .scene()
        .items()
        .iter()
        .filter(|i| i.selected)
        .map(|i| i.id.as_str())
        .collect();
    assert_eq!(selected, vec!["Win_A", "Win_B"]);
}

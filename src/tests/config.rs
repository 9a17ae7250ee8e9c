use crate::{config::Config, items::Flag, tags::TagSort};

fn base_dir() -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_str().unwrap().to_string();
    (dir, path)
}

#[test]
pub fn test_defaults_written_on_first_load() {
    let (_dir, path) = base_dir();

    let config = Config::load_with(&path).unwrap();
    assert_eq!(config.log_level, "warn");
    assert_eq!(config.default_flag, Flag::Visible);
    assert_eq!(config.tag_sort, TagSort::Alpha);
    assert!(config.confirm_destructive);
    assert_eq!(config.max_view_name_len, 100);

    let written = std::fs::read_to_string(format!("{path}/config.yaml")).unwrap();
    assert!(written.contains("max_view_name_len: 100"));
}

#[test]
pub fn test_partial_config_is_completed_and_resaved() {
    let (_dir, path) = base_dir();
    let yaml = "tag_sort: usage\ndefault_flag: selected\n";
    std::fs::write(format!("{path}/config.yaml"), yaml).unwrap();

    let config = Config::load_with(&path).unwrap();
    assert_eq!(config.tag_sort, TagSort::Usage);
    assert_eq!(config.default_flag, Flag::Selected);

    let written = std::fs::read_to_string(format!("{path}/config.yaml")).unwrap();
    assert!(written.contains("confirm_destructive: true"));
    assert!(written.contains("tag_sort: usage"));
}

#[test]
pub fn test_zero_view_name_len_rejected() {
    let (_dir, path) = base_dir();
    std::fs::write(format!("{path}/config.yaml"), "max_view_name_len: 0\n").unwrap();

    let err = Config::load_with(&path).unwrap_err();
    assert!(err.to_string().contains("max_view_name_len"));
}

#[test]
pub fn test_bad_log_level_rejected() {
    let (_dir, path) = base_dir();
    std::fs::write(format!("{path}/config.yaml"), "log_level: \"vg=loud\"\n").unwrap();

    let err = Config::load_with(&path).unwrap_err();
    assert!(err.to_string().contains("log_level"));
}

#[test]
pub fn test_malformed_config_rejected() {
    let (_dir, path) = base_dir();
    std::fs::write(format!("{path}/config.yaml"), "default_flag: [1, 2\n").unwrap();

    assert!(Config::load_with(&path).is_err());
}

#[test]
pub fn test_save_round_trips_changes() {
    let (_dir, path) = base_dir();

    let mut config = Config::load_with(&path).unwrap();
    config.confirm_destructive = false;
    config.save().unwrap();

    let reloaded = Config::load_with(&path).unwrap();
    assert!(!reloaded.confirm_destructive);
}

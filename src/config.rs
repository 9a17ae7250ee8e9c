use anyhow::{bail, Context};
use homedir::my_home;
use serde::{Deserialize, Serialize};

use crate::{
    items::Flag,
    storage::{self, StorageManager},
    tags::TagSort,
};

const CONFIG_FILE: &str = "config.yaml";

const DEFAULT_LOG_LEVEL: &str = "warn";
const DEFAULT_MAX_VIEW_NAME_LEN: usize = 100;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Flag used by state/toggle/show/hide when none is given
    #[serde(default)]
    pub default_flag: Flag,

    #[serde(default)]
    pub tag_sort: TagSort,

    /// Ask before deleting views or clearing membership
    #[serde(default = "default_confirm_destructive")]
    pub confirm_destructive: bool,

    #[serde(default = "default_max_view_name_len")]
    pub max_view_name_len: usize,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            default_flag: Flag::default(),
            tag_sort: TagSort::default(),
            confirm_destructive: default_confirm_destructive(),
            max_view_name_len: default_max_view_name_len(),
            base_path: String::new(),
        }
    }
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_confirm_destructive() -> bool {
    true
}

fn default_max_view_name_len() -> usize {
    DEFAULT_MAX_VIEW_NAME_LEN
}

/// `$VG_BASE_PATH`, else `~/.local/share/vg`.
pub fn base_path() -> anyhow::Result<String> {
    if let Ok(path) = std::env::var("VG_BASE_PATH") {
        return Ok(path);
    }
    let home = my_home()
        .map_err(|e| anyhow::anyhow!("could not determine home directory: {e:?}"))?
        .context("home directory path is empty")?;
    Ok(format!("{}/.local/share/vg", home.to_string_lossy()))
}

impl Config {
    fn validate(&self) -> anyhow::Result<()> {
        if self.max_view_name_len == 0 {
            bail!("max_view_name_len must be greater than 0");
        }

        if let Err(e) = tracing_subscriber::EnvFilter::try_new(&self.log_level) {
            bail!("log_level '{}' is not a valid filter: {e}", self.log_level);
        }

        Ok(())
    }

    pub fn load_with(base_path: &str) -> anyhow::Result<Self> {
        let store = storage::BackendLocal::new(base_path)?;

        // create new if does not exist
        if !store.exists(CONFIG_FILE) {
            store.write(CONFIG_FILE, serde_yml::to_string(&Self::default())?.as_bytes())?;
        }

        let config_str =
            String::from_utf8(store.read(CONFIG_FILE)?).context("config file is not valid utf8")?;
        let mut config: Self = serde_yml::from_str(&config_str).context("config is malformed")?;

        config.base_path = base_path.to_string();

        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let store = storage::BackendLocal::new(&self.base_path)?;

        let config_str = serde_yml::to_string(&self)?;
        store.write(CONFIG_FILE, config_str.as_bytes())?;
        Ok(())
    }
}

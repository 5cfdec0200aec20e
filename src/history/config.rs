use std::path::{Path, PathBuf};

/// Entries kept when no capacity is configured.
pub const DEFAULT_CAPACITY: u32 = 10;

/// Capacity and on/off switch for the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    pub capacity: u32,
    pub enabled: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            enabled: true,
        }
    }
}

/// Private: parsed representation of a swatchlog config file.
#[derive(serde::Deserialize, Default)]
struct SwatchlogConfigFile {
    history: Option<HistorySection>,
}

#[derive(serde::Deserialize, Default)]
struct HistorySection {
    capacity: Option<u32>,
    enabled: Option<bool>,
}

/// Read the `[history]` table from a TOML config file. Returns `None` on any error.
fn read_history_section(path: &Path) -> Option<HistorySection> {
    let content = std::fs::read_to_string(path).ok()?;
    let cfg: SwatchlogConfigFile = match toml::from_str(&content) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config");
            return None;
        }
    };
    cfg.history
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

impl HistoryConfig {
    /// Load config using auto-detected paths, then apply environment overrides.
    ///
    /// Priority, per field:
    /// 1. `SWATCHLOG_HISTORY_CAPACITY` / `SWATCHLOG_HISTORY_ENABLED`
    /// 2. `{project_root}/.swatchlog/config.toml` `[history]`
    /// 3. `{config_dir}/swatchlog/config.toml` `[history]` (e.g. `~/.config/swatchlog/config.toml`)
    /// 4. Defaults: capacity 10, enabled
    pub fn load(project_root: Option<&Path>) -> Self {
        let global = dirs::config_dir().map(|d| d.join("swatchlog").join("config.toml"));
        Self::load_from(project_root, global.as_deref())
            .with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Load config from explicit paths, without looking at the environment.
    /// Priority: project config → global config → defaults.
    pub fn load_from(project_root: Option<&Path>, global_config: Option<&Path>) -> Self {
        let project = project_root
            .and_then(|root| read_history_section(&root.join(".swatchlog").join("config.toml")))
            .unwrap_or_default();
        let global = global_config
            .and_then(read_history_section)
            .unwrap_or_default();
        let defaults = Self::default();
        Self {
            capacity: project
                .capacity
                .or(global.capacity)
                .unwrap_or(defaults.capacity),
            enabled: project
                .enabled
                .or(global.enabled)
                .unwrap_or(defaults.enabled),
        }
    }

    /// Apply `SWATCHLOG_HISTORY_*` overrides read through `lookup`.
    /// Unparsable values are ignored.
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(capacity) = lookup("SWATCHLOG_HISTORY_CAPACITY").and_then(|v| v.trim().parse().ok())
        {
            self.capacity = capacity;
        }
        if let Some(enabled) = lookup("SWATCHLOG_HISTORY_ENABLED").and_then(|v| parse_bool(&v)) {
            self.enabled = enabled;
        }
        self
    }
}

/// Returns the DB path: `SWATCHLOG_DB_PATH` env var overrides; else
/// `dirs::data_local_dir()/swatchlog/history.db`.
pub fn db_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("SWATCHLOG_DB_PATH") {
        return Some(PathBuf::from(p));
    }
    dirs::data_local_dir().map(|d| d.join("swatchlog").join("history.db"))
}

/// Walk up from `dir` to find the nearest ancestor containing `.git` or `.swatchlog/`.
/// Falls back to `dir` itself if neither is found.
pub fn project_root_for(dir: &Path) -> PathBuf {
    let mut current = dir.to_path_buf();
    loop {
        if current.join(".git").exists() || current.join(".swatchlog").is_dir() {
            return current;
        }
        if !current.pop() {
            break;
        }
    }
    dir.to_path_buf()
}

use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{IoOp, KanbanError, Result};
use crate::ops::BoardRules;

/// Directory holding project state, relative to the project root.
pub const KANBAN_DIR: &str = ".kanban";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default = "default_roster")]
    pub roster: Vec<String>,
    #[serde(default = "default_sprint")]
    pub default_sprint: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            roster: default_roster(),
            default_sprint: default_sprint(),
        }
    }
}

impl BoardConfig {
    #[must_use]
    pub fn rules(&self) -> BoardRules {
        BoardRules {
            roster: self.roster.clone(),
            default_sprint: self.default_sprint.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Tickets file, relative to the project root unless absolute.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl StoreConfig {
    #[must_use]
    pub fn resolve(&self, project_root: &Path) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            project_root.join(&self.path)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            page_limit: default_page_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Pause between the per-record calls of a bulk intent.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Page size used when fetching the whole collection.
    #[serde(default = "default_fetch_page_size")]
    pub page_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            throttle_ms: default_throttle_ms(),
            timeout_ms: default_timeout_ms(),
            page_size: default_fetch_page_size(),
        }
    }
}

impl SyncConfig {
    #[must_use]
    pub const fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
    /// Service URL used when `--server` is given without a value.
    #[serde(default)]
    pub server: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

fn read_toml<T: serde::de::DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path).map_err(|source| KanbanError::Io {
        op: IoOp::Read,
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str::<T>(&content)
        .map_err(|e| KanbanError::Config(format!("failed to parse {}: {e}", path.display())))
}

/// Load `.kanban/config.toml` under `project_root`; defaults when absent.
///
/// # Errors
///
/// Returns [`KanbanError::Config`] when the file is not valid TOML for
/// [`ProjectConfig`].
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    read_toml(&project_root.join(KANBAN_DIR).join("config.toml"))
}

/// Load the per-user config from the platform config directory.
///
/// # Errors
///
/// Returns [`KanbanError::Config`] when the file exists but does not parse.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };
    read_toml(&config_dir.join("kanban").join("config.toml"))
}

/// Merge project config, user config and the environment.
///
/// # Errors
///
/// Propagates config load failures.
pub fn resolve_config(
    project_root: &Path,
    cli_format: Option<&str>,
    cli_json: bool,
) -> Result<EffectiveConfig> {
    let project = load_project_config(project_root)?;
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_format, cli_json, user.output.clone(), env_format);

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

fn normalize_output_mode(raw: &str) -> Option<&'static str> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pretty" | "human" => Some("pretty"),
        "text" | "table" => Some("text"),
        "json" => Some("json"),
        _ => None,
    }
}

/// `--format` > `--json` > `FORMAT` env > user config > TTY detection.
fn resolve_output(
    cli_format: Option<&str>,
    cli_json: bool,
    user_output: Option<String>,
    env_format: Option<String>,
) -> String {
    if let Some(mode) = cli_format.and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

fn default_roster() -> Vec<String> {
    BoardRules::default().roster
}

fn default_sprint() -> String {
    BoardRules::default().default_sprint
}

fn default_store_path() -> PathBuf {
    PathBuf::from(KANBAN_DIR).join("tickets.tsv")
}

fn default_listen() -> String {
    "127.0.0.1:5000".to_string()
}

const fn default_page_limit() -> usize {
    10
}

const fn default_throttle_ms() -> u64 {
    100
}

const fn default_timeout_ms() -> u64 {
    10_000
}

const fn default_fetch_page_size() -> usize {
    100
}

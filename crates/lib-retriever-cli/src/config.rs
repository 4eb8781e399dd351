use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lib_retriever::{CredentialScope, RetrieverConfig};
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Base workspace the per-library scratch directories hang off.
    pub workspace: Option<PathBuf>,
    #[serde(default = "default_suffix")]
    pub workspace_suffix: String,
    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    #[serde(default)]
    pub credentials: Vec<CredentialEntry>,
}

/// A configured library and how to retrieve it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryEntry {
    pub name: String,
    pub default_version: Option<String>,
    pub retriever: RetrieverConfig,
}

/// A username/password credential available to retrievers.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CredentialEntry {
    pub id: String,
    pub username: String,
    pub password: Option<String>,
    /// Environment variable holding the password.
    pub password_env: Option<String>,
    #[serde(default)]
    pub scope: CredentialScope,
}

fn default_suffix() -> String {
    lib_retriever::lease::DEFAULT_WORKSPACE_SUFFIX.to_owned()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: None,
            workspace_suffix: default_suffix(),
            connect_timeout_secs: None,
            timeout_secs: None,
            libraries: Vec::new(),
            credentials: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn library(&self, name: &str) -> Option<&LibraryEntry> {
        self.libraries.iter().find(|l| l.name == name)
    }
}

/// Config file path: `~/.config/lib-retriever/libraries.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lib-retriever").join("libraries.toml"))
}

/// Default base workspace: `<cache>/lib-retriever/workspace`
pub fn default_workspace() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("lib-retriever").join("workspace"))
}

/// Parse configuration text, as YAML when `path` says so and TOML otherwise.
pub fn parse_config(path: &Path, contents: &str) -> Result<AppConfig> {
    let is_yaml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    if is_yaml {
        serde_yaml_ng::from_str(contents)
            .with_context(|| format!("failed to parse YAML config at {}", path.display()))
    } else {
        toml::from_str(contents)
            .with_context(|| format!("failed to parse TOML config at {}", path.display()))
    }
}

/// Load the config at `explicit`, or the default location.
///
/// A missing default file yields an empty configuration; a missing explicit
/// file is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(AppConfig::default()),
        },
    };

    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    parse_config(&path, &contents)
}

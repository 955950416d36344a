//! Configuration management for the stem CLI
//!
//! The user configuration lives in a TOML file (`~/.config/stem/stem.toml` by
//! default, overridable with `STEM_CONFIG`). Every value is optional; the
//! accessors fall back to the built-in defaults.

pub mod project_paths;

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use which::which;

/// Local-name prefix that marks a dependency as a stem package.
pub const DEFAULT_RESERVED_PREFIX: &str = "stem-";

/// Directory (relative to the consumer root) that project-relative import paths
/// are resolved against.
pub const DEFAULT_SOURCE_ROOT: &str = "src";

/// Extensions of files whose import statements may be rewritten.
pub const DEFAULT_SCRIPT_EXTENSIONS: &[&str] = &[
    "js", "cjs", "mjs", "ts", "cts", "mts", "jsx", "cjsx", "mjsx", "tsx", "ctsx", "mtsx", "vue",
    "svelte", "marko", "md", "mdx",
];

/// Keys accepted by `stem config get/set`
pub const CONFIG_KEYS: &[&str] = &[
    "reserved-prefix",
    "source-root",
    "script-extensions",
    "git-path",
    "node-path",
];

#[derive(Error, Debug)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Could not determine home directory")]
    NoHomeDir,

    #[error("Unknown config key: {0}. Supported keys: {keys}", keys = CONFIG_KEYS.join(", "))]
    UnknownKey(String),

    #[error("Could not find `{0}` on PATH")]
    ExecutableNotFound(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_extensions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_path: Option<String>,
}

impl Config {
    pub fn path() -> Result<PathBuf, ConfigFileError> {
        // Explicit override for tests and isolated runs
        if let Ok(env_path) = std::env::var("STEM_CONFIG") {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        #[cfg(not(target_os = "windows"))]
        let default = dirs::home_dir()
            .ok_or(ConfigFileError::NoHomeDir)?
            .join(".config")
            .join("stem")
            .join("stem.toml");

        #[cfg(target_os = "windows")]
        let default = dirs::config_dir()
            .ok_or(ConfigFileError::NoHomeDir)?
            .join("stem")
            .join("stem.toml");

        Ok(default)
    }

    pub fn load() -> Result<Self, ConfigFileError> {
        let path = Self::path()?;
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &std::path::Path) -> Result<Self, ConfigFileError> {
        if path.exists() {
            let content = fs::read_to_string(path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<(), ConfigFileError> {
        let path = Self::path()?;
        self.save_to_path(&path)
    }

    pub fn save_to_path(&self, path: &std::path::Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "reserved-prefix" => self.reserved_prefix.clone(),
            "source-root" => self.source_root.clone(),
            "script-extensions" => self.script_extensions.as_ref().map(|exts| exts.join(",")),
            "git-path" => self.git_path.clone(),
            "node-path" => self.node_path.clone(),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: String) -> Result<(), ConfigFileError> {
        match key {
            "reserved-prefix" => self.reserved_prefix = Some(value),
            "source-root" => self.source_root = Some(value),
            "script-extensions" => {
                let exts = value
                    .split(',')
                    .map(|ext| ext.trim().trim_start_matches('.').to_string())
                    .filter(|ext| !ext.is_empty())
                    .collect();
                self.script_extensions = Some(exts);
            }
            "git-path" => self.git_path = Some(value),
            "node-path" => self.node_path = Some(value),
            _ => return Err(ConfigFileError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.reserved_prefix.is_none()
            && self.source_root.is_none()
            && self.script_extensions.is_none()
            && self.git_path.is_none()
            && self.node_path.is_none()
    }

    pub fn values_iter(&self) -> Vec<(&str, String)> {
        CONFIG_KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }

    pub fn get_reserved_prefix(&self) -> String {
        self.reserved_prefix
            .clone()
            .unwrap_or_else(|| DEFAULT_RESERVED_PREFIX.to_string())
    }

    pub fn get_source_root(&self) -> String {
        self.source_root
            .clone()
            .unwrap_or_else(|| DEFAULT_SOURCE_ROOT.to_string())
    }

    pub fn get_script_extensions(&self) -> Vec<String> {
        match &self.script_extensions {
            Some(exts) if !exts.is_empty() => exts.clone(),
            _ => DEFAULT_SCRIPT_EXTENSIONS
                .iter()
                .map(|ext| (*ext).to_string())
                .collect(),
        }
    }

    /// Ensure `git_path` points at a git executable, locating it on PATH if unset
    pub fn ensure_git_path(&mut self) -> Result<String, ConfigFileError> {
        ensure_executable(&mut self.git_path, "git")
    }

    /// Ensure `node_path` points at a node executable, locating it on PATH if unset
    pub fn ensure_node_path(&mut self) -> Result<String, ConfigFileError> {
        ensure_executable(&mut self.node_path, "node")
    }
}

fn ensure_executable(slot: &mut Option<String>, name: &str) -> Result<String, ConfigFileError> {
    if let Some(path) = slot.as_ref() {
        return Ok(path.clone());
    }
    let found = which(name).map_err(|_| ConfigFileError::ExecutableNotFound(name.to_string()))?;
    let found = found.to_string_lossy().to_string();
    *slot = Some(found.clone());
    Ok(found)
}

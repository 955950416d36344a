//! Runtime settings assembled once per invocation
//!
//! Everything the engine needs is resolved here from the user config and the
//! global flags, then passed down explicitly.

use crate::config_manager::Config;
use crate::logger;
use crate::GlobalOpts;
use std::path::PathBuf;
use stem_eject::{Discovery, EjectSettings};

#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    /// Directory the manifest search starts from
    pub start_dir: PathBuf,
    pub reserved_prefix: String,
    pub source_root: String,
    pub script_extensions: Vec<String>,
    pub git_path: Option<String>,
    pub node_path: Option<String>,
}

impl RuntimeSettings {
    /// Build settings from `config`; `cwd` is only used when `--root` is absent
    pub fn from_config(config: &Config, opts: &GlobalOpts, cwd: PathBuf) -> Self {
        let start_dir = match &opts.root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => cwd.join(root),
            None => cwd,
        };

        RuntimeSettings {
            start_dir,
            reserved_prefix: config.get_reserved_prefix(),
            source_root: config.get_source_root(),
            script_extensions: config.get_script_extensions(),
            git_path: config.git_path.clone(),
            node_path: config.node_path.clone(),
        }
    }

    /// Load the user config and build settings from it
    pub fn load(opts: &GlobalOpts, cwd: PathBuf) -> Result<Self, String> {
        let mut config = Config::load().map_err(|e| format!("Failed to load config: {}", e))?;

        // node is only needed for JavaScript eject configs
        if let Err(e) = config.ensure_node_path() {
            logger::debug(&format!("{}; JavaScript eject configs cannot be loaded", e));
        }

        Ok(Self::from_config(&config, opts, cwd))
    }

    pub fn git_path(&self) -> Result<String, String> {
        let mut config = Config {
            git_path: self.git_path.clone(),
            ..Config::default()
        };
        config.ensure_git_path().map_err(|e| e.to_string())
    }

    pub fn eject_settings(&self, discovery: &Discovery) -> EjectSettings {
        EjectSettings {
            consumer_root: discovery.consumer_root.clone(),
            manifest_path: discovery.manifest_path.clone(),
            source_root: self.source_root.clone(),
            script_extensions: self.script_extensions.clone(),
        }
    }
}

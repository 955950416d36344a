use crate::config_manager::{Config, CONFIG_KEYS};
use crate::logger;
use crate::GlobalOpts;
use clap::Subcommand;
use colored::Colorize;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show every configured value
    Show,
    /// Print one value (or its default when unset)
    Get { key: String },
    /// Set a value; `script-extensions` takes a comma-separated list
    Set { key: String, value: String },
    /// Print the path of the configuration file
    Path,
}

pub fn handle_config(action: ConfigAction, opts: &GlobalOpts) -> Result<(), String> {
    match action {
        ConfigAction::Show => {
            let config = Config::load().map_err(|e| format!("Failed to load config: {}", e))?;
            println!("{}", "Configuration:".bold().green());
            if config.is_empty() {
                if opts.verbosity_level() > 0 {
                    println!("  {}", "(empty)".yellow());
                }
            } else {
                for (key, value) in config.values_iter() {
                    println!("  {}: {}", key.cyan(), value);
                }
            }
            Ok(())
        }
        ConfigAction::Get { key } => {
            let config = Config::load().map_err(|e| format!("Failed to load config: {}", e))?;
            println!("{}", effective_value(&config, &key)?);
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let mut config =
                Config::load().map_err(|e| format!("Failed to load config: {}", e))?;
            config.set(&key, value.clone()).map_err(|e| e.to_string())?;
            config
                .save()
                .map_err(|e| format!("Failed to save config: {}", e))?;
            logger::success(&format!("Set {} = {}", key, value));
            Ok(())
        }
        ConfigAction::Path => {
            let path = Config::path().map_err(|e| e.to_string())?;
            logger::debug(&format!("Reading config from: {}", path.display()));
            println!("{}", path.display());
            Ok(())
        }
    }
}

/// Configured value of `key`, falling back to the built-in default
fn effective_value(config: &Config, key: &str) -> Result<String, String> {
    if !CONFIG_KEYS.contains(&key) {
        return Err(format!(
            "Unknown config key: {}. Supported keys: {}",
            key,
            CONFIG_KEYS.join(", ")
        ));
    }
    let value = config.get(key).unwrap_or_else(|| match key {
        "reserved-prefix" => config.get_reserved_prefix(),
        "source-root" => config.get_source_root(),
        "script-extensions" => config.get_script_extensions().join(","),
        _ => String::new(),
    });
    Ok(value)
}

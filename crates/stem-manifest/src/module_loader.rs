//! Loading modules from inside an installed package
//!
//! Module identifiers are resolved the way the consumer's own module system
//! would see them (including the package's `exports` map), then loaded by
//! extension: JSON and TOML are parsed as data, JavaScript is evaluated by
//! `node` and its default export is returned as JSON.

use crate::errors::ModuleError;
use crate::package_discovery::resolve_package_subpath;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Capability to load a module by its package-relative identifier
pub trait ModuleLoader {
    /// Absolute path the identifier resolves to
    fn resolve_module_path(&self, module_id: &str) -> Result<PathBuf, ModuleError>;

    /// Load the module and return its exported value
    fn load_module(&self, module_id: &str) -> Result<Value, ModuleError>;
}

const NODE_LOADER_SCRIPT: &str = "import { pathToFileURL } from 'node:url';\n\
const mod = await import(pathToFileURL(process.argv[1]).href);\n\
process.stdout.write(JSON.stringify(mod.default ?? mod));\n";

/// Loads modules from a package installed on disk
#[derive(Debug, Clone)]
pub struct NodeModuleLoader {
    package_name: String,
    package_dir: PathBuf,
    exports: Option<Value>,
    node_path: Option<String>,
}

impl NodeModuleLoader {
    pub fn new(
        package_name: impl Into<String>,
        package_dir: PathBuf,
        exports: Option<Value>,
        node_path: Option<String>,
    ) -> Self {
        NodeModuleLoader {
            package_name: package_name.into(),
            package_dir,
            exports,
            node_path,
        }
    }

    fn run_node(&self, path: &Path) -> Result<Value, ModuleError> {
        let node = match &self.node_path {
            Some(node) => PathBuf::from(node),
            None => which::which("node").map_err(|e| ModuleError::Runtime {
                path: path.to_path_buf(),
                message: format!("node is required to load JavaScript modules: {}", e),
            })?,
        };

        debug!("Evaluating {:?} with {:?}", path, node);
        let output = Command::new(&node)
            .args(["--input-type=module", "-e", NODE_LOADER_SCRIPT])
            .arg(path)
            .output()
            .map_err(|e| ModuleError::Runtime {
                path: path.to_path_buf(),
                message: format!("failed to run {}: {}", node.display(), e),
            })?;

        stem_logger::capture_output(&format!("node {}", path.display()), &output);

        if !output.status.success() {
            return Err(ModuleError::Runtime {
                path: path.to_path_buf(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| ModuleError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl ModuleLoader for NodeModuleLoader {
    fn resolve_module_path(&self, module_id: &str) -> Result<PathBuf, ModuleError> {
        resolve_package_subpath(&self.package_dir, self.exports.as_ref(), module_id).ok_or_else(
            || ModuleError::NotFound {
                package: self.package_name.clone(),
                module_id: module_id.to_string(),
            },
        )
    }

    fn load_module(&self, module_id: &str) -> Result<Value, ModuleError> {
        let path = self.resolve_module_path(module_id)?;
        load_module_file(&path, |p| self.run_node(p))
    }
}

/// Load a resolved module file, delegating script evaluation to `evaluate`
pub fn load_module_file<F>(path: &Path, evaluate: F) -> Result<Value, ModuleError>
where
    F: FnOnce(&Path) -> Result<Value, ModuleError>,
{
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();

    match extension {
        "json" => {
            let content = read(path)?;
            serde_json::from_str(&content).map_err(|e| ModuleError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
        "toml" => {
            let content = read(path)?;
            let value: toml::Table = toml::from_str(&content).map_err(|e| ModuleError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
            serde_json::to_value(value).map_err(|e| ModuleError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
        "js" | "mjs" | "cjs" => evaluate(path),
        _ => Err(ModuleError::UnsupportedExtension(path.to_path_buf())),
    }
}

fn read(path: &Path) -> Result<String, ModuleError> {
    fs::read_to_string(path).map_err(|source| ModuleError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn no_node(path: &Path) -> Result<Value, ModuleError> {
        Err(ModuleError::Runtime {
            path: path.to_path_buf(),
            message: "node disabled in tests".to_string(),
        })
    }

    #[test]
    fn loads_json_and_toml_as_data() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let json_path = temp_dir.path().join("eject.config.json");
        let toml_path = temp_dir.path().join("eject.config.toml");
        assert!(fs::write(&json_path, r#"{"ejectables": []}"#).is_ok());
        assert!(fs::write(&toml_path, "ejectables = []\n").is_ok());

        let json_value = load_module_file(&json_path, no_node);
        assert!(json_value.is_ok_and(|v| v == json!({"ejectables": []})));
        let toml_value = load_module_file(&toml_path, no_node);
        assert!(toml_value.is_ok_and(|v| v == json!({"ejectables": []})));
    }

    #[test]
    fn scripts_go_through_evaluator() {
        let path = Path::new("/pkg/eject.config.mjs");
        let value = load_module_file(path, |_| Ok(json!([1, 2])));
        assert!(value.is_ok_and(|v| v == json!([1, 2])));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let result = load_module_file(Path::new("/pkg/eject.config.yaml"), no_node);
        assert!(matches!(result, Err(ModuleError::UnsupportedExtension(_))));
    }

    #[test]
    fn resolves_through_package_dir() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let pkg_dir = temp_dir.path().to_path_buf();
        assert!(fs::write(pkg_dir.join("package.json"), "{}").is_ok());

        let loader = NodeModuleLoader::new("@org/stem-widgets", pkg_dir.clone(), None, None);
        assert!(loader
            .resolve_module_path("package.json")
            .is_ok_and(|p| p == pkg_dir.join("package.json")));
        assert!(matches!(
            loader.load_module("eject.config.json"),
            Err(ModuleError::NotFound { .. })
        ));
    }

    #[test]
    fn node_evaluates_esm_and_commonjs_configs() {
        let Ok(node) = which::which("node") else {
            return;
        };
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let pkg_dir = temp_dir.path().to_path_buf();
        assert!(fs::write(
            pkg_dir.join("package.json"),
            r#"{ "name": "@org/stem-x", "type": "module" }"#
        )
        .is_ok());
        assert!(fs::write(
            pkg_dir.join("eject.config.js"),
            "const path = 'src/x';\nexport default [{ name: 'esm', actions: [{ action: 'moveSourceCode', relativePath: path }] }];\n",
        )
        .is_ok());
        assert!(fs::write(
            pkg_dir.join("eject.config.cjs"),
            "module.exports = { ejectables: [{ actions: [] }] };\n",
        )
        .is_ok());

        let node_path = node.to_str().map(str::to_string);
        let loader = NodeModuleLoader::new("@org/stem-x", pkg_dir, None, node_path);

        let esm = loader.load_module("eject.config.js");
        assert!(esm.is_ok_and(|v| v
            == json!([{
                "name": "esm",
                "actions": [{ "action": "moveSourceCode", "relativePath": "src/x" }]
            }])));
        let cjs = loader.load_module("eject.config.cjs");
        assert!(cjs.is_ok_and(|v| v == json!({ "ejectables": [{ "actions": [] }] })));
    }

    #[test]
    fn node_failure_surfaces_stderr() {
        let Ok(node) = which::which("node") else {
            return;
        };
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let path = temp_dir.path().join("eject.config.mjs");
        assert!(fs::write(&path, "throw new Error('broken config');\n").is_ok());

        let loader = NodeModuleLoader::new(
            "@org/stem-x",
            temp_dir.path().to_path_buf(),
            None,
            node.to_str().map(str::to_string),
        );
        assert!(matches!(
            loader.load_module("eject.config.mjs"),
            Err(ModuleError::Runtime { ref message, .. }) if message.contains("broken config")
        ));
    }
}

//! Stem package discovery
//!
//! A dependency is a stem package when its local name (after the optional
//! `@org/` scope) starts with the reserved prefix. Packages are located the way
//! the consumer's module resolution would find them: `node_modules/<name>` in
//! the consumer root or any ancestor, followed through symlinks to the real
//! installed directory.

use crate::errors::{ManifestError, ModuleError};
use crate::manifest::PackageJson;
use crate::module_loader::{ModuleLoader, NodeModuleLoader};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stem_config::project_paths::{find_manifest_upward, normalize};
use tracing::{debug, info};

/// Conditions tried, in declaration order, when an `exports` target is a
/// conditions object
const EXPORT_CONDITIONS: &[&str] = &["node", "require", "import", "default"];

/// Extensions tried when a subpath without `exports` does not name a file
const FALLBACK_EXTENSIONS: &[&str] = &["js", "json"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StemName {
    /// `@org/<prefix>...`
    Scoped,
    /// `<prefix>...` without an organization scope (deprecated)
    Unscoped,
    NotStem,
}

/// Classify a dependency name against the reserved prefix
pub fn classify_package_name(name: &str, prefix: &str) -> StemName {
    if let Some(scoped) = name.strip_prefix('@') {
        return match scoped.split_once('/') {
            Some((_, local)) if local.starts_with(prefix) => StemName::Scoped,
            _ => StemName::NotStem,
        };
    }
    if name.starts_with(prefix) {
        StemName::Unscoped
    } else {
        StemName::NotStem
    }
}

/// Names of the stem packages declared in `manifest`, in declaration order
pub fn stem_dependency_names(manifest: &PackageJson, prefix: &str) -> Vec<String> {
    manifest
        .dependencies()
        .into_iter()
        .filter_map(|(name, _)| match classify_package_name(name, prefix) {
            StemName::Scoped => Some(name.to_string()),
            StemName::Unscoped => {
                stem_logger::warn_once(
                    "unscoped-stem-package",
                    &format!(
                        "{} should be renamed to @someNpmOrg/{} (to follow the convention that all Stem packages belong to an npm organization)",
                        name, name
                    ),
                );
                Some(name.to_string())
            }
            StemName::NotStem => None,
        })
        .collect()
}

/// Locates installed packages from the consumer root upward
#[derive(Debug, Clone)]
pub struct PackageLocator {
    consumer_root: PathBuf,
}

impl PackageLocator {
    pub fn new(consumer_root: PathBuf) -> Self {
        PackageLocator { consumer_root }
    }

    pub fn consumer_root(&self) -> &Path {
        &self.consumer_root
    }

    /// Real installed directory of `package_name`, if any
    pub fn find_package_dir(&self, package_name: &str) -> Option<PathBuf> {
        let mut dir = Some(self.consumer_root.as_path());
        while let Some(current) = dir {
            let candidate = current.join("node_modules").join(package_name);
            if candidate.is_dir() {
                debug!("Found '{}' at {:?}", package_name, candidate);
                return Some(candidate.canonicalize().unwrap_or(candidate));
            }
            dir = current.parent();
        }
        None
    }
}

/// Resolve `module_id` inside a package directory, honouring `exports`
pub fn resolve_package_subpath(
    package_dir: &Path,
    exports: Option<&Value>,
    module_id: &str,
) -> Option<PathBuf> {
    let module_id = module_id.trim_start_matches("./");

    let Some(exports) = exports else {
        let direct = package_dir.join(module_id);
        if direct.is_file() {
            return Some(direct);
        }
        return FALLBACK_EXTENSIONS
            .iter()
            .map(|ext| package_dir.join(format!("{}.{}", module_id, ext)))
            .find(|candidate| candidate.is_file());
    };

    let target = resolve_export(exports, &format!("./{}", module_id))?;
    let relative = target.strip_prefix("./")?;
    let resolved = normalize(&package_dir.join(relative));
    // Export targets may not escape the package
    if !resolved.starts_with(package_dir) || !resolved.is_file() {
        return None;
    }
    Some(resolved)
}

/// Resolve a subpath (`./x`) against an `exports` field to its target string
pub fn resolve_export(exports: &Value, subpath: &str) -> Option<String> {
    let is_subpath_map = exports
        .as_object()
        .is_some_and(|map| map.keys().any(|key| key.starts_with('.')));

    if !is_subpath_map {
        // Sugar: `"exports": "./index.js"` or a bare conditions object
        return if subpath == "." {
            resolve_target(exports, None)
        } else {
            None
        };
    }

    let map = exports.as_object()?;
    if let Some(target) = map.get(subpath) {
        return resolve_target(target, None);
    }

    // Longest matching pattern or folder mapping wins
    let mut best: Option<(&str, &Value, String)> = None;
    for (key, target) in map {
        let capture = if let Some((prefix, suffix)) = key.split_once('*') {
            subpath
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(suffix))
                .map(str::to_string)
        } else if key.ends_with('/') {
            subpath.strip_prefix(key.as_str()).map(str::to_string)
        } else {
            None
        };
        let Some(capture) = capture else {
            continue;
        };
        if best.as_ref().map_or(true, |(k, _, _)| key.len() > k.len()) {
            best = Some((key.as_str(), target, capture));
        }
    }

    let (key, target, capture) = best?;
    if key.contains('*') {
        resolve_target(target, Some(&capture))
    } else {
        resolve_target(target, None).map(|t| format!("{}{}", t, capture))
    }
}

fn resolve_target(target: &Value, capture: Option<&str>) -> Option<String> {
    match target {
        Value::String(s) => {
            if !s.starts_with("./") {
                return None;
            }
            Some(match capture {
                Some(capture) => s.replace('*', capture),
                None => s.clone(),
            })
        }
        Value::Array(items) => items.iter().find_map(|item| resolve_target(item, capture)),
        Value::Object(conditions) => conditions
            .iter()
            .filter(|(condition, _)| EXPORT_CONDITIONS.contains(&condition.as_str()))
            .find_map(|(_, nested)| resolve_target(nested, capture)),
        _ => None,
    }
}

/// A dependency eligible for eject, with the capability to load its modules
#[derive(Clone)]
pub struct StemPackage {
    pub name: String,
    pub root_dir: PathBuf,
    loader: Arc<dyn ModuleLoader>,
}

impl StemPackage {
    pub fn new(name: impl Into<String>, root_dir: PathBuf, loader: Arc<dyn ModuleLoader>) -> Self {
        StemPackage {
            name: name.into(),
            root_dir,
            loader,
        }
    }

    pub fn load_module(&self, module_id: &str) -> Result<Value, ModuleError> {
        self.loader.load_module(module_id)
    }

    pub fn resolve_module_path(&self, module_id: &str) -> Result<PathBuf, ModuleError> {
        self.loader.resolve_module_path(module_id)
    }
}

impl fmt::Debug for StemPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StemPackage")
            .field("name", &self.name)
            .field("root_dir", &self.root_dir)
            .finish_non_exhaustive()
    }
}

/// A stem dependency that could not be resolved
#[derive(Debug)]
pub struct PackageFailure {
    pub name: String,
    pub error: ModuleError,
}

/// Outcome of one discovery pass
#[derive(Debug, Default)]
pub struct ResolvedPackages {
    pub consumer_root: PathBuf,
    pub manifest_path: PathBuf,
    pub packages: Vec<StemPackage>,
    pub failures: Vec<PackageFailure>,
}

/// Discover the stem packages of the project containing `start_dir`
pub fn resolve_stem_packages(
    start_dir: &Path,
    prefix: &str,
    node_path: Option<String>,
) -> Result<ResolvedPackages, ManifestError> {
    let manifest_path =
        find_manifest_upward(start_dir).ok_or_else(|| ManifestError::NotFound(start_dir.to_path_buf()))?;
    let consumer_root = manifest_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| start_dir.to_path_buf());

    let manifest = PackageJson::load(&manifest_path)?;
    let locator = PackageLocator::new(consumer_root.clone());

    let mut resolved = ResolvedPackages {
        consumer_root,
        manifest_path,
        ..Default::default()
    };

    for name in stem_dependency_names(&manifest, prefix) {
        match resolve_one(&locator, &name, node_path.clone()) {
            Ok(package) => {
                debug!("Resolved stem package '{}' at {:?}", name, package.root_dir);
                resolved.packages.push(package);
            }
            Err(error) => resolved.failures.push(PackageFailure { name, error }),
        }
    }

    info!(
        "Found {} stem packages ({} unresolved)",
        resolved.packages.len(),
        resolved.failures.len()
    );
    Ok(resolved)
}

fn resolve_one(
    locator: &PackageLocator,
    name: &str,
    node_path: Option<String>,
) -> Result<StemPackage, ModuleError> {
    let package_dir = locator
        .find_package_dir(name)
        .ok_or_else(|| ModuleError::PackageNotInstalled(name.to_string()))?;

    // package.json is read directly to learn `exports`; whether it is
    // itself exported is checked through the loader below
    let package_json_path = package_dir.join("package.json");
    let package_json = PackageJson::load(&package_json_path).map_err(|e| ModuleError::Parse {
        path: package_json_path.clone(),
        message: e.to_string(),
    })?;

    let loader = NodeModuleLoader::new(name, package_dir, package_json.exports, node_path);
    let resolved_manifest = loader.resolve_module_path("package.json")?;
    let root_dir = resolved_manifest
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| ModuleError::NotFound {
            package: name.to_string(),
            module_id: "package.json".to_string(),
        })?;

    Ok(StemPackage::new(name, root_dir, Arc::new(loader)))
}

//! Loading the ejectables a stem package declares
//!
//! Each stem package exposes an `eject.config.*` module. Its declared entries
//! become [`Ejectable`]s that carry the owning package's name and root
//! directory, so later stages never resolve the package again.

use crate::errors::EjectError;
use crate::matcher::{EjectableIndex, Selection};
use std::path::{Path, PathBuf};
use stem_manifest::{
    resolve_stem_packages, ActionList, EjectConfig, ManifestError, ModuleError, StemPackage,
};
use tracing::{debug, info};

/// Module identifiers tried, in order, for a package's eject config
pub const EJECT_CONFIG_MODULES: &[&str] = &[
    "eject.config.json",
    "eject.config.js",
    "eject.config.mjs",
    "eject.config.cjs",
];

/// One unit of eject behavior, tied to the package that declared it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ejectable {
    pub package_name: String,
    pub package_root_dir: PathBuf,
    pub variant_name: Option<String>,
    pub actions: ActionList,
}

impl Ejectable {
    pub fn selection(&self) -> Selection {
        Selection::new(&self.package_name, self.variant_name.as_deref())
    }
}

/// Load the ejectables declared by `package`
pub fn load_ejectables(package: &StemPackage) -> Result<Vec<Ejectable>, EjectError> {
    for module_id in EJECT_CONFIG_MODULES {
        let value = match package.load_module(module_id) {
            Ok(value) => value,
            Err(ModuleError::NotFound { .. }) => continue,
            Err(err) => {
                return Err(EjectError::Usage {
                    package: package.name.clone(),
                    message: format!("Failed to load {}/{}: {}", package.name, module_id, err),
                })
            }
        };

        debug!("Loaded {}/{}", package.name, module_id);
        let config = EjectConfig::from_value(value)
            .map_err(|e| EjectError::Config(format!("{}/{}: {}", package.name, module_id, e)))?;

        return Ok(config
            .entries
            .into_iter()
            .map(|entry| Ejectable {
                package_name: package.name.clone(),
                package_root_dir: package.root_dir.clone(),
                variant_name: entry.variant_name,
                actions: entry.actions,
            })
            .collect());
    }

    Err(EjectError::Usage {
        package: package.name.clone(),
        message: format!(
            "Couldn't find {name}/eject.config.js. Make sure to (properly) set `{name}#exports['./eject.config.js']` (or ship an eject.config.json)",
            name = package.name
        ),
    })
}

/// Ejectables and per-package problems found in one discovery pass
#[derive(Debug)]
pub struct Discovery {
    pub consumer_root: PathBuf,
    pub manifest_path: PathBuf,
    pub package_names: Vec<String>,
    pub index: EjectableIndex,
    /// Usage errors of individual packages; the other packages are still usable
    pub failures: Vec<EjectError>,
}

/// Collect ejectables from already resolved packages.
///
/// Usage errors are collected per package; configuration errors abort.
pub fn collect_ejectables(
    packages: &[StemPackage],
) -> Result<(EjectableIndex, Vec<EjectError>), EjectError> {
    let mut ejectables = Vec::new();
    let mut failures = Vec::new();

    for package in packages {
        match load_ejectables(package) {
            Ok(found) => ejectables.extend(found),
            Err(err @ EjectError::Usage { .. }) => failures.push(err),
            Err(err) => return Err(err),
        }
    }

    Ok((EjectableIndex::build(ejectables)?, failures))
}

/// Run a full discovery pass for the project containing `start_dir`
pub fn discover(
    start_dir: &Path,
    reserved_prefix: &str,
    node_path: Option<String>,
) -> Result<Discovery, EjectError> {
    let resolved =
        resolve_stem_packages(start_dir, reserved_prefix, node_path).map_err(|e| match e {
            err @ ManifestError::NotFound(_) => EjectError::Config(err.to_string()),
            other => EjectError::Manifest(other),
        })?;

    let mut failures: Vec<EjectError> = resolved
        .failures
        .into_iter()
        .map(|failure| EjectError::Usage {
            message: usage_message(&failure.name, &failure.error),
            package: failure.name,
        })
        .collect();

    let (index, load_failures) = collect_ejectables(&resolved.packages)?;
    failures.extend(load_failures);

    info!(
        "Discovered {} ejectables from {} stem packages",
        index.len(),
        resolved.packages.len()
    );

    Ok(Discovery {
        consumer_root: resolved.consumer_root,
        manifest_path: resolved.manifest_path,
        package_names: resolved.packages.iter().map(|p| p.name.clone()).collect(),
        index,
        failures,
    })
}

fn usage_message(package: &str, error: &ModuleError) -> String {
    match error {
        ModuleError::NotFound { module_id, .. } => format!(
            "Couldn't find {package}/{module_id}. Make sure to (properly) set `{package}#exports['./{module_id}']`"
        ),
        ModuleError::PackageNotInstalled(_) => format!(
            "{package} is declared in package.json but is not installed. Install your dependencies and retry"
        ),
        other => other.to_string(),
    }
}

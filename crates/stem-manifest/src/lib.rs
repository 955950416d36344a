//! Stem manifest management
//!
//! Reading the consumer's `package.json`, removing an ejected dependency from
//! it without reformatting, the eject configuration types, and discovery of
//! the stem packages a project depends on.

pub mod errors;
pub mod manifest;
pub mod module_loader;
pub mod package_discovery;
pub mod types;

pub use errors::{ManifestError, ModuleError};
pub use manifest::{remove_dependency, remove_dependency_lines, PackageJson};
pub use module_loader::{ModuleLoader, NodeModuleLoader};
pub use package_discovery::{
    resolve_stem_packages, PackageFailure, PackageLocator, ResolvedPackages, StemPackage,
};
pub use types::{ActionList, EjectAction, EjectConfig, EjectConfigEntry};

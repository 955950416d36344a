use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or editing the project manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Couldn't find package.json in any parent directory starting from {}", .0.display())]
    NotFound(PathBuf),

    #[error("Dependency '{name}' is not declared in {}", .path.display())]
    DependencyNotDeclared { name: String, path: PathBuf },

    #[error("Dependency '{name}' shares a line with other manifest content in {}; put it on its own line and re-run", .path.display())]
    InlineDependency { name: String, path: PathBuf },

    #[error("Invalid eject config: {0}")]
    InvalidEjectConfig(String),
}

/// Errors raised while resolving or loading a module from inside a package
#[derive(Error, Debug)]
pub enum ModuleError {
    #[error("Couldn't find {package}/{module_id}")]
    NotFound { package: String, module_id: String },

    #[error("Package '{0}' is not installed (no node_modules entry found)")]
    PackageNotInstalled(String),

    #[error("Don't know how to load {}", .0.display())]
    UnsupportedExtension(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Failed to execute {}: {message}", .path.display())]
    Runtime { path: PathBuf, message: String },
}

use crate::matcher::Selection;
use stem_manifest::ManifestError;
use thiserror::Error;

/// Errors raised by the eject engine
#[derive(Error, Debug)]
pub enum EjectError {
    /// Missing project manifest or a structurally invalid eject config
    #[error("Configuration error: {0}")]
    Config(String),

    /// A dependency does not expose what it must; the dependency author has to fix it
    #[error("{package}: {message}")]
    Usage { package: String, message: String },

    #[error("No ejectable found for {selection}")]
    Selection {
        selection: Selection,
        available: Vec<Selection>,
    },

    #[error("Eject of {ejectable} stopped at action #{index} ({action}): {message}")]
    Action {
        ejectable: String,
        index: usize,
        action: String,
        message: String,
    },

    #[error("Command failed: {command} (exit {status:?}): {stderr}")]
    CommandFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),
}

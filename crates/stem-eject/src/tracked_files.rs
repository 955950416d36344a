//! Files that belong to the user's project
//!
//! Only files tracked by version control are ever rewritten; untracked files
//! (build output, vendored copies, scratch files) are left alone.

use crate::errors::EjectError;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Source of the project's tracked files
pub trait TrackedFiles {
    /// Tracked files under `root`, relative to `root`
    fn tracked_files(&self, root: &Path) -> Result<Vec<PathBuf>, EjectError>;
}

/// Lists tracked files with `git ls-files`
#[derive(Debug, Clone)]
pub struct GitTrackedFiles {
    git_path: String,
}

impl GitTrackedFiles {
    pub fn new(git_path: impl Into<String>) -> Self {
        GitTrackedFiles {
            git_path: git_path.into(),
        }
    }
}

impl TrackedFiles for GitTrackedFiles {
    fn tracked_files(&self, root: &Path) -> Result<Vec<PathBuf>, EjectError> {
        let command = format!("{} ls-files -z", self.git_path);
        debug!("Running: {} (in {:?})", command, root);

        let output = Command::new(&self.git_path)
            .args(["ls-files", "-z"])
            .current_dir(root)
            .output()
            .map_err(|e| EjectError::CommandFailed {
                command: command.clone(),
                status: None,
                stderr: e.to_string(),
            })?;

        stem_logger::capture_output(&command, &output);

        if !output.status.success() {
            return Err(EjectError::CommandFailed {
                command,
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_ls_files(&output.stdout))
    }
}

/// Split NUL-separated `git ls-files -z` output
pub fn parse_ls_files(stdout: &[u8]) -> Vec<PathBuf> {
    stdout
        .split(|byte| *byte == 0)
        .filter(|entry| !entry.is_empty())
        .map(|entry| PathBuf::from(String::from_utf8_lossy(entry).as_ref()))
        .collect()
}

/// A fixed file list, for callers that already know the candidate set
#[derive(Debug, Clone, Default)]
pub struct StaticTrackedFiles {
    files: Vec<PathBuf>,
}

impl StaticTrackedFiles {
    pub fn new(files: Vec<PathBuf>) -> Self {
        StaticTrackedFiles { files }
    }
}

impl TrackedFiles for StaticTrackedFiles {
    fn tracked_files(&self, _root: &Path) -> Result<Vec<PathBuf>, EjectError> {
        Ok(self.files.clone())
    }
}

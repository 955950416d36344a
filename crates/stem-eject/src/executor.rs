//! Ordered application of an ejectable's actions
//!
//! Actions run strictly in declaration order and the first failure stops the
//! sequence. Nothing is rolled back: every action is additive and safe to run
//! again, and the manifest edit, the only step that is hard to redo by hand,
//! runs last.

use crate::ejectable::Ejectable;
use crate::errors::EjectError;
use crate::import_rewriter::{ImportRewriter, NewSpecifier, RewriteReport};
use crate::matcher::Selection;
use crate::tracked_files::TrackedFiles;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use stem_manifest::{remove_dependency, EjectAction, ManifestError};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Consumer-side context every action runs against
#[derive(Debug, Clone)]
pub struct EjectSettings {
    pub consumer_root: PathBuf,
    pub manifest_path: PathBuf,
    /// Directory (relative to the consumer root) project-relative import paths live under
    pub source_root: String,
    pub script_extensions: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub copied: usize,
    pub skipped: usize,
}

/// Copy the file or tree at `src` to `dst`, never overwriting existing files
pub fn copy_source_tree(src: &Path, dst: &Path) -> io::Result<CopyStats> {
    let mut stats = CopyStats::default();
    let metadata = fs::metadata(src).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("source path {} is not readable: {}", src.display(), e),
        )
    })?;

    if metadata.is_file() {
        copy_file_if_absent(src, dst, &mut stats)?;
        return Ok(stats);
    }

    for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            copy_file_if_absent(entry.path(), &target, &mut stats)?;
        }
    }
    Ok(stats)
}

fn copy_file_if_absent(src: &Path, dst: &Path, stats: &mut CopyStats) -> io::Result<()> {
    if dst.exists() {
        debug!("Keeping existing file {:?}", dst);
        stats.skipped += 1;
        return Ok(());
    }
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dst)?;
    stats.copied += 1;
    Ok(())
}

/// Result of one applied action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Moved {
        relative_path: String,
        stats: CopyStats,
    },
    Rewrote {
        import_path_old: String,
        import_path_new: String,
        report: RewriteReport,
    },
}

/// Everything one eject did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EjectReport {
    pub selection: Selection,
    pub outcomes: Vec<ActionOutcome>,
    /// False when the dependency was already gone from the manifest
    pub manifest_updated: bool,
}

/// Applies ejectables to one consumer project
pub struct Executor<'a> {
    settings: &'a EjectSettings,
    tracked: &'a dyn TrackedFiles,
}

impl<'a> Executor<'a> {
    pub fn new(settings: &'a EjectSettings, tracked: &'a dyn TrackedFiles) -> Self {
        Executor { settings, tracked }
    }

    /// Apply every action of `ejectable`, then drop its package from the manifest
    pub fn apply(&self, ejectable: &Ejectable) -> Result<EjectReport, EjectError> {
        let selection = ejectable.selection();
        info!(
            "Ejecting {} ({} actions)",
            selection,
            ejectable.actions.len()
        );

        let mut outcomes = Vec::with_capacity(ejectable.actions.len());
        for (i, action) in ejectable.actions.iter().enumerate() {
            debug!("Action #{}: {}", i + 1, action);
            let outcome = self
                .apply_action(ejectable, action)
                .map_err(|message| EjectError::Action {
                    ejectable: selection.to_string(),
                    index: i + 1,
                    action: action.to_string(),
                    message,
                })?;
            outcomes.push(outcome);
        }

        let manifest_updated =
            match remove_dependency(&self.settings.manifest_path, &ejectable.package_name) {
                Ok(()) => true,
                Err(ManifestError::DependencyNotDeclared { name, path }) => {
                    warn!("'{}' is no longer declared in {:?}", name, path);
                    false
                }
                Err(e) => return Err(e.into()),
            };

        Ok(EjectReport {
            selection,
            outcomes,
            manifest_updated,
        })
    }

    fn apply_action(
        &self,
        ejectable: &Ejectable,
        action: &EjectAction,
    ) -> Result<ActionOutcome, String> {
        match action {
            EjectAction::MoveSourceCode { relative_path } => {
                let relative = relative_path.trim_start_matches('/');
                let src = ejectable.package_root_dir.join(relative);
                let dst = self.settings.consumer_root.join(relative);
                let stats = copy_source_tree(&src, &dst).map_err(|e| e.to_string())?;
                info!(
                    "Copied {} file(s) into {:?}, kept {} existing",
                    stats.copied, dst, stats.skipped
                );
                Ok(ActionOutcome::Moved {
                    relative_path: relative_path.clone(),
                    stats,
                })
            }
            EjectAction::ModifyImportPaths {
                import_path_old,
                import_path_new,
            } => {
                let candidates = self
                    .tracked
                    .tracked_files(&self.settings.consumer_root)
                    .map_err(|e| e.to_string())?;
                let new = NewSpecifier::classify(
                    import_path_new,
                    &self.settings.consumer_root,
                    &self.settings.source_root,
                );
                let rewriter = ImportRewriter::new(
                    &self.settings.consumer_root,
                    &self.settings.script_extensions,
                );
                let report = rewriter
                    .rewrite(import_path_old, &new, &candidates)
                    .map_err(|e| e.to_string())?;
                Ok(ActionOutcome::Rewrote {
                    import_path_old: import_path_old.clone(),
                    import_path_new: import_path_new.clone(),
                    report,
                })
            }
        }
    }
}

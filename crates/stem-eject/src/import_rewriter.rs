//! Text-level import specifier rewriting
//!
//! No parser is involved. One tolerant pattern finds import statements whose
//! specifier is exactly the old path; only the quoted specifier is replaced and
//! every other byte of the file is kept as is.
//!
//! Recognised forms, with arbitrary whitespace and newlines between tokens and
//! either quote style:
//!
//! ```text
//! import 'old'                      import def from 'old'
//! import { a, b } from 'old'        import def, { a } from 'old'
//! import * as ns from 'old'         import type { T } from 'old'
//! export { a } from 'old'           export * from 'old'
//! import('old')                     require('old')
//! ```
//!
//! The pattern may over-match in unusual formatting; it must never miss one of
//! the forms above. Comments are the exception: a block comment between tokens
//! (`import { A } /* c */ from 'old'`) or a `}` inside a comment within the
//! braces stops the match, and such imports are left for the user to fix.

use crate::script_files::is_script_file;
use regex::{Captures, Regex};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use stem_config::project_paths::{normalize, relative_import_path, to_posix};
use thiserror::Error;
use tracing::{debug, info};

const STATIC_CLAUSE: &str = r"\b(?:import|export)\s*(?:type\s+)?(?:[\w$]+\s*,?\s*)?(?:\*\s*(?:as\s+[\w$]+\s*)?)?(?:\{[^}]*\}\s*)?(?:from\s*)?";
const CALL_CLAUSE: &str = r"\b(?:import|require)\s*\(\s*";

#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("Invalid import pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Failed to rewrite {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Pattern matching an import of exactly `import_path_old`.
///
/// The specifier lands in the `single` or `double` group depending on its quotes.
pub fn import_pattern(import_path_old: &str) -> Result<Regex, regex::Error> {
    let old = regex::escape(import_path_old);
    Regex::new(&format!(
        r#"(?:{STATIC_CLAUSE}|{CALL_CLAUSE})(?:'(?P<single>{old})'|"(?P<double>{old})")"#
    ))
}

/// Replacement target of a `modifyImportPaths` action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewSpecifier {
    /// Bare package specifier, substituted verbatim
    Package(String),
    /// Absolute location inside the consumer project
    ProjectPath(PathBuf),
}

impl NewSpecifier {
    /// `./x`, `../x` and `/x` are project paths under `consumer_root/source_root`;
    /// anything else is a package specifier.
    pub fn classify(import_path_new: &str, consumer_root: &Path, source_root: &str) -> Self {
        let is_project_path = import_path_new.starts_with("./")
            || import_path_new.starts_with("../")
            || import_path_new.starts_with('/');
        if !is_project_path {
            return NewSpecifier::Package(import_path_new.to_string());
        }

        let base = consumer_root.join(source_root);
        let target = base.join(import_path_new.trim_start_matches('/'));
        NewSpecifier::ProjectPath(normalize(&target))
    }

    /// Specifier as written in `file` (an absolute path)
    pub fn for_file(&self, file: &Path) -> String {
        match self {
            NewSpecifier::Package(name) => name.clone(),
            NewSpecifier::ProjectPath(target) => {
                let from_dir = file.parent().unwrap_or(file);
                relative_import_path(from_dir, target)
            }
        }
    }
}

/// Rewrite every matched specifier in `content` to `new_specifier`.
///
/// Returns the new content and the number of rewritten imports, or `None`
/// when the content would not change.
pub fn rewrite_imports(
    content: &str,
    pattern: &Regex,
    new_specifier: &str,
) -> Option<(String, usize)> {
    let mut count = 0usize;
    let rewritten = pattern.replace_all(content, |caps: &Captures<'_>| {
        let whole = &caps[0];
        let Some(quoted) = caps.name("single").or_else(|| caps.name("double")) else {
            return whole.to_string();
        };
        let Some(start) = caps.get(0).map(|m| m.start()) else {
            return whole.to_string();
        };
        count += 1;
        let (from, to) = (quoted.start() - start, quoted.end() - start);
        format!("{}{}{}", &whole[..from], new_specifier, &whole[to..])
    });

    if rewritten == content {
        return None;
    }
    Some((rewritten.into_owned(), count))
}

/// Outcome of one rewrite pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    pub files_scanned: usize,
    pub files_changed: usize,
    pub imports_rewritten: usize,
    /// Changed files, relative to the consumer root
    pub changed_files: Vec<PathBuf>,
}

/// Repoints imports of one old specifier across a set of project files
#[derive(Debug)]
pub struct ImportRewriter<'a> {
    consumer_root: &'a Path,
    script_extensions: &'a [String],
}

impl<'a> ImportRewriter<'a> {
    pub fn new(consumer_root: &'a Path, script_extensions: &'a [String]) -> Self {
        ImportRewriter {
            consumer_root,
            script_extensions,
        }
    }

    /// Rewrite `import_path_old` to `new` in the script files among `candidates`
    /// (paths relative to the consumer root).
    pub fn rewrite(
        &self,
        import_path_old: &str,
        new: &NewSpecifier,
        candidates: &[PathBuf],
    ) -> Result<RewriteReport, RewriteError> {
        let pattern = import_pattern(import_path_old)?;
        let mut report = RewriteReport::default();

        for relative in candidates {
            if !is_script_file(relative, self.script_extensions) {
                continue;
            }
            let path = self.consumer_root.join(relative);
            if !path.is_file() {
                debug!("Skipping tracked file missing on disk: {:?}", relative);
                continue;
            }
            report.files_scanned += 1;

            let content = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(source) => return Err(RewriteError::Io { path, source }),
            };
            let Ok(content) = String::from_utf8(content) else {
                debug!("Skipping non UTF-8 file: {:?}", relative);
                continue;
            };
            if !content.contains(import_path_old) {
                continue;
            }

            let specifier = new.for_file(&path);
            let Some((updated, count)) = rewrite_imports(&content, &pattern, &specifier) else {
                continue;
            };

            fs::write(&path, updated).map_err(|source| RewriteError::Io {
                path: path.clone(),
                source,
            })?;
            debug!(
                "Rewrote {} import(s) in {}: '{}' -> '{}'",
                count,
                to_posix(relative),
                import_path_old,
                specifier
            );
            report.files_changed += 1;
            report.imports_rewritten += count;
            report.changed_files.push(relative.clone());
        }

        info!(
            "Rewrote {} import(s) of '{}' in {} of {} script files",
            report.imports_rewritten, import_path_old, report.files_changed, report.files_scanned
        );
        Ok(report)
    }
}

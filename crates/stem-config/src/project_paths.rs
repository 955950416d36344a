//! Path helpers for locating the consumer project and computing import paths
//!
//! Import specifiers always use posix separators, whatever the host platform.

use std::path::{Component, Path, PathBuf};

/// File name of the project manifest
pub const MANIFEST_FILE_NAME: &str = "package.json";

/// Walk from `start` up to the filesystem root looking for `package.json`
pub fn find_manifest_upward(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(MANIFEST_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

/// Directory of the nearest `package.json` at or above `start`
pub fn find_consumer_root(start: &Path) -> Option<PathBuf> {
    find_manifest_upward(start).and_then(|manifest| manifest.parent().map(Path::to_path_buf))
}

/// Render a path with `/` separators
pub fn to_posix(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Lexically resolve `.` and `..` components without touching the filesystem
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = match out.components().next_back() {
                    Some(Component::Normal(_)) => out.pop(),
                    _ => false,
                };
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Relative path from `from_dir` to `target`, both normalized lexically.
///
/// The result is posix-style and always usable as a relative import
/// specifier: it starts with `./` or `../` (or is `.` for the same directory).
pub fn relative_import_path(from_dir: &Path, target: &Path) -> String {
    let from = normalize(from_dir);
    let target = normalize(target);

    let from_parts: Vec<Component> = from.components().collect();
    let target_parts: Vec<Component> = target.components().collect();

    let common = from_parts
        .iter()
        .zip(target_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut segments: Vec<String> = Vec::new();
    for _ in common..from_parts.len() {
        segments.push("..".to_string());
    }
    for part in &target_parts[common..] {
        segments.push(part.as_os_str().to_string_lossy().to_string());
    }

    if segments.is_empty() {
        return ".".to_string();
    }
    let joined = segments.join("/");
    if joined.starts_with("..") {
        joined
    } else {
        format!("./{}", joined)
    }
}

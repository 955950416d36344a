use std::path::Path;

/// Whether `path` ends in one of `extensions` (given without the leading dot)
pub fn is_script_file(path: &Path, extensions: &[String]) -> bool {
    let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    extensions.iter().any(|ext| {
        file_name
            .strip_suffix(ext.as_str())
            .is_some_and(|stem| stem.len() > 1 && stem.ends_with('.'))
    })
}

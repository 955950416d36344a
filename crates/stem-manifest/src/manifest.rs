//! Project manifest (`package.json`) reading and surgical editing
//!
//! Reading goes through `serde_json`. Removing a dependency never re-serializes
//! the document: the declaring line is cut out of the raw text so indentation,
//! key order and everything else stays exactly as the user wrote it.

use crate::errors::ManifestError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

static DEPENDENCIES_OPEN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r#"^\s*"dependencies"\s*:\s*\{"#).ok());

/// The parts of a `package.json` the eject engine cares about
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageJson {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dependencies: Map<String, Value>,
    #[serde(default)]
    pub exports: Option<Value>,
}

impl PackageJson {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        debug!("Reading manifest: {:?}", path);
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Declared dependencies in file order as (name, version constraint)
    pub fn dependencies(&self) -> Vec<(&str, &str)> {
        self.dependencies
            .iter()
            .filter_map(|(name, version)| version.as_str().map(|v| (name.as_str(), v)))
            .collect()
    }

    pub fn has_dependency(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }
}

/// Remove the line(s) declaring `name` inside the top-level `"dependencies"`
/// object of a `package.json` text.
///
/// Returns `None` when no declaring line was found. Objects named
/// `dependencies` nested deeper (npm `overrides`, for one) are left alone. All
/// other lines are kept byte-for-byte, except that the preceding entry loses its
/// trailing comma when the removed entry was the last one in the object.
pub fn remove_dependency_lines(text: &str, name: &str) -> Option<String> {
    let opener = DEPENDENCIES_OPEN.as_ref()?;
    let entry = Regex::new(&format!(r#"^\s*"{}"\s*:"#, regex::escape(name))).ok()?;

    let mut kept: Vec<Cow<'_, str>> = Vec::new();
    // depth before the current line; the root object is 1, its members 2
    let mut depth: i64 = 0;
    let mut inside = false;
    let mut last_entry: Option<usize> = None;
    let mut removed = false;

    for line in text.split_inclusive('\n') {
        if !inside {
            if depth == 1 && opener.is_match(line) {
                inside = depth + brace_delta(line) > 1;
                last_entry = None;
            }
            depth += brace_delta(line);
            kept.push(Cow::Borrowed(line));
            continue;
        }

        if depth == 2 && entry.is_match(line) {
            removed = true;
            if !line.trim_end().ends_with(',') {
                if let Some(idx) = last_entry {
                    let stripped = strip_trailing_comma(&kept[idx]);
                    kept[idx] = Cow::Owned(stripped);
                }
            }
            continue;
        }

        depth += brace_delta(line);
        if depth <= 1 {
            inside = false;
        } else if is_entry_line(line) {
            last_entry = Some(kept.len());
        }
        kept.push(Cow::Borrowed(line));
    }

    removed.then(|| kept.concat())
}

/// Remove `name` from the manifest at `path`, writing only if the text changed
pub fn remove_dependency(path: &Path, name: &str) -> Result<(), ManifestError> {
    let original = fs::read_to_string(path)?;
    let Some(updated) = remove_dependency_lines(&original, name) else {
        if PackageJson::parse(&original).is_ok_and(|pkg| pkg.has_dependency(name)) {
            return Err(ManifestError::InlineDependency {
                name: name.to_string(),
                path: path.to_path_buf(),
            });
        }
        return Err(ManifestError::DependencyNotDeclared {
            name: name.to_string(),
            path: path.to_path_buf(),
        });
    };

    if updated != original {
        fs::write(path, updated)?;
        info!("Removed '{}' from {:?}", name, path);
    }
    Ok(())
}

/// Net `{` minus `}` on a line, skipping string literals and `//` comments
fn brace_delta(line: &str) -> i64 {
    let mut delta = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => delta += 1,
            '}' => delta -= 1,
            '/' if chars.peek() == Some(&'/') => break,
            _ => {}
        }
    }
    delta
}

fn is_entry_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.starts_with("//")
}

fn strip_trailing_comma(line: &str) -> String {
    let content_end = line.trim_end().len();
    let content = &line[..content_end];
    match content.strip_suffix(',') {
        Some(without) => format!("{}{}", without, &line[content_end..]),
        None => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"{
  "name": "consumer",
  "scripts": {
    "dev": "vite"
  },
  "dependencies": {
    "@org/stem-widgets": "^1.2.0",
    "react": "18.2.0",
    "@org/stem-theme": "0.4.1"
  },
  "devDependencies": {
    "@org/stem-widgets": "^1.2.0"
  }
}
"#;

    #[test]
    fn reads_dependencies_in_file_order() {
        let parsed = PackageJson::parse(MANIFEST);
        assert!(parsed.is_ok_and(|pkg| pkg.dependencies()
            == vec![
                ("@org/stem-widgets", "^1.2.0"),
                ("react", "18.2.0"),
                ("@org/stem-theme", "0.4.1"),
            ]));
    }

    #[test]
    fn removes_only_the_declaring_line() {
        let Some(updated) = remove_dependency_lines(MANIFEST, "@org/stem-widgets") else {
            panic!("dependency line not found");
        };

        let original_lines: Vec<&str> = MANIFEST.lines().collect();
        let updated_lines: Vec<&str> = updated.lines().collect();
        assert_eq!(updated_lines.len(), original_lines.len() - 1);

        let expected: Vec<&str> = original_lines
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 6)
            .map(|(_, l)| *l)
            .collect();
        assert_eq!(updated_lines, expected);
        // devDependencies entry is untouched
        assert!(updated.contains("\"devDependencies\": {\n    \"@org/stem-widgets\""));
    }

    #[test]
    fn removing_last_entry_keeps_json_valid() {
        let Some(updated) = remove_dependency_lines(MANIFEST, "@org/stem-theme") else {
            panic!("dependency line not found");
        };
        assert!(updated.contains("    \"react\": \"18.2.0\"\n  },"));
        assert!(PackageJson::parse(&updated).is_ok_and(|pkg| !pkg.has_dependency("@org/stem-theme")));
    }

    #[test]
    fn exact_name_only() {
        assert!(remove_dependency_lines(MANIFEST, "@org/stem").is_none());
        assert!(remove_dependency_lines(MANIFEST, "stem-widgets").is_none());
    }

    #[test]
    fn preserves_comments_and_crlf() {
        let text = "{\r\n  // consumer deps\r\n  \"dependencies\": {\r\n    \"a\": \"1\",\r\n    \"stem-x\": \"2\",\r\n    \"b\": \"3\"\r\n  }\r\n}\r\n";
        let updated = remove_dependency_lines(text, "stem-x");
        assert_eq!(
            updated.as_deref(),
            Some("{\r\n  // consumer deps\r\n  \"dependencies\": {\r\n    \"a\": \"1\",\r\n    \"b\": \"3\"\r\n  }\r\n}\r\n")
        );
    }

    #[test]
    fn remove_dependency_writes_file() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let path = temp_dir.path().join("package.json");
        assert!(fs::write(&path, MANIFEST).is_ok());

        assert!(remove_dependency(&path, "react").is_ok());
        let content = fs::read_to_string(&path).unwrap_or_default();
        assert!(!content.contains("\"react\""));

        let missing = remove_dependency(&path, "react");
        assert!(matches!(
            missing,
            Err(ManifestError::DependencyNotDeclared { .. })
        ));
    }

    #[test]
    fn nested_dependencies_objects_are_untouched() {
        let text = r#"{
  "overrides": {
    "foo": {
      "dependencies": {
        "@o/stem-x": "1"
      }
    }
  },
  "dependencies": {
    "@o/stem-x": "2"
  }
}
"#;
        let updated = remove_dependency_lines(text, "@o/stem-x");
        assert_eq!(
            updated.as_deref(),
            Some("{\n  \"overrides\": {\n    \"foo\": {\n      \"dependencies\": {\n        \"@o/stem-x\": \"1\"\n      }\n    }\n  },\n  \"dependencies\": {\n  }\n}\n")
        );
    }

    #[test]
    fn only_nested_declaration_is_not_removed() {
        let text = "{\n  \"overrides\": {\n    \"dependencies\": {\n      \"@o/stem-x\": \"1\"\n    }\n  }\n}\n";
        assert!(remove_dependency_lines(text, "@o/stem-x").is_none());
    }

    #[test]
    fn braces_inside_strings_do_not_shift_depth() {
        let text = "{\n  \"description\": \"uses { and }} freely\",\n  \"dependencies\": {\n    \"a\": \"1\",\n    \"stem-x\": \"2\"\n  }\n}\n";
        let updated = remove_dependency_lines(text, "stem-x");
        assert_eq!(
            updated.as_deref(),
            Some("{\n  \"description\": \"uses { and }} freely\",\n  \"dependencies\": {\n    \"a\": \"1\"\n  }\n}\n")
        );
    }

    #[test]
    fn entry_on_the_opener_line_is_reported() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let path = temp_dir.path().join("package.json");
        let text = "{\n  \"dependencies\": { \"@o/stem-x\": \"2\", \"react\": \"18\" }\n}\n";
        assert!(fs::write(&path, text).is_ok());

        assert!(remove_dependency_lines(text, "@o/stem-x").is_none());
        let result = remove_dependency(&path, "@o/stem-x");
        assert!(matches!(
            result,
            Err(ManifestError::InlineDependency { ref name, .. }) if name == "@o/stem-x"
        ));
        assert_eq!(fs::read_to_string(&path).unwrap_or_default(), text);
    }
}

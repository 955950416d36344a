//! Eject configuration types
//!
//! A stem package declares what it can eject in an `eject.config.*` module.
//! The default export is either a bare array of ejectable entries or an object
//! with an `ejectables` array. Each entry is either
//!
//! ```json
//! { "name": "minimal", "actions": [
//!     { "action": "moveSourceCode", "relativePath": "src/widgets" },
//!     { "action": "modifyImportPaths",
//!       "importPathOld": "@org/stem-widgets/widgets", "importPathNew": "./widgets" }
//! ] }
//! ```
//!
//! or the older `{ "src": ..., "importModifications": [...] }` shape, which maps
//! to one `moveSourceCode` followed by one `modifyImportPaths` per modification.

use crate::errors::ManifestError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;
use std::fmt;

/// Ordered action list of one ejectable
pub type ActionList = SmallVec<[EjectAction; 4]>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum EjectAction {
    /// Copy `relative_path` from the package root into the consumer root
    #[serde(rename_all = "camelCase")]
    MoveSourceCode { relative_path: String },
    /// Repoint imports of `import_path_old` to `import_path_new`
    #[serde(rename_all = "camelCase")]
    ModifyImportPaths {
        import_path_old: String,
        import_path_new: String,
    },
}

impl fmt::Display for EjectAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EjectAction::MoveSourceCode { relative_path } => {
                write!(f, "move source code '{}'", relative_path)
            }
            EjectAction::ModifyImportPaths {
                import_path_old,
                import_path_new,
            } => write!(
                f,
                "modify import paths '{}' -> '{}'",
                import_path_old, import_path_new
            ),
        }
    }
}

/// One ejectable as declared by a package, before it is tied to its owner
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EjectConfigEntry {
    pub variant_name: Option<String>,
    pub actions: ActionList,
}

/// The parsed default export of a package's `eject.config.*` module
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EjectConfig {
    pub entries: Vec<EjectConfigEntry>,
}

#[derive(Deserialize)]
struct DeclaredEntry {
    #[serde(default, alias = "variantName")]
    name: Option<String>,
    actions: Vec<EjectAction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportModification {
    import_path_old: String,
    import_path_new: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyEntry {
    src: String,
    #[serde(default)]
    import_modifications: Vec<ImportModification>,
}

impl EjectConfig {
    /// Build a config from a loaded module value
    pub fn from_value(value: Value) -> Result<Self, ManifestError> {
        let entries = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => {
                if let Some(inner) = map.remove("default") {
                    return Self::from_value(inner);
                }
                match map.remove("ejectables") {
                    Some(Value::Array(items)) => items,
                    Some(_) => {
                        return Err(ManifestError::InvalidEjectConfig(
                            "`ejectables` must be an array".to_string(),
                        ))
                    }
                    None => {
                        return Err(ManifestError::InvalidEjectConfig(
                            "expected an array of ejectables or an object with an `ejectables` array"
                                .to_string(),
                        ))
                    }
                }
            }
            other => {
                return Err(ManifestError::InvalidEjectConfig(format!(
                    "expected an array or object, got {}",
                    value_kind(&other)
                )))
            }
        };

        let entries = entries
            .into_iter()
            .enumerate()
            .map(|(idx, entry)| parse_entry(entry).map_err(|msg| {
                ManifestError::InvalidEjectConfig(format!("ejectable #{}: {}", idx + 1, msg))
            }))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(EjectConfig { entries })
    }
}

fn parse_entry(entry: Value) -> Result<EjectConfigEntry, String> {
    let Value::Object(ref map) = entry else {
        return Err(format!("expected an object, got {}", value_kind(&entry)));
    };

    if map.contains_key("actions") {
        let declared: DeclaredEntry = serde_json::from_value(entry).map_err(|e| e.to_string())?;
        return Ok(EjectConfigEntry {
            variant_name: declared.name,
            actions: declared.actions.into_iter().collect(),
        });
    }

    if map.contains_key("src") {
        let legacy: LegacyEntry = serde_json::from_value(entry).map_err(|e| e.to_string())?;
        let mut actions = ActionList::new();
        actions.push(EjectAction::MoveSourceCode {
            relative_path: legacy.src,
        });
        actions.extend(legacy.import_modifications.into_iter().map(|m| {
            EjectAction::ModifyImportPaths {
                import_path_old: m.import_path_old,
                import_path_new: m.import_path_new,
            }
        }));
        return Ok(EjectConfigEntry {
            variant_name: None,
            actions,
        });
    }

    Err("missing `actions`".to_string())
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

//! Ejectable lookup by (package name, variant name)

use crate::ejectable::Ejectable;
use crate::errors::EjectError;
use ahash::AHashSet;
use std::fmt;

/// Identity key of an ejectable
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub package_name: String,
    pub variant_name: Option<String>,
}

impl Selection {
    pub fn new(package_name: &str, variant_name: Option<&str>) -> Self {
        Selection {
            package_name: package_name.to_string(),
            variant_name: variant_name.map(str::to_string),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.variant_name {
            Some(variant) => write!(f, "{} {}", self.package_name, variant),
            None => write!(f, "{}", self.package_name),
        }
    }
}

/// Exact match on both package name and variant name.
///
/// `None` only matches ejectables without a variant name.
pub fn find_match<'a>(
    all: &'a [Ejectable],
    package_name: &str,
    variant_name: Option<&str>,
) -> Option<&'a Ejectable> {
    let matches: Vec<&Ejectable> = all
        .iter()
        .filter(|e| e.package_name == package_name && e.variant_name.as_deref() == variant_name)
        .collect();
    assert!(
        matches.len() <= 1,
        "{} ejectables share the key ({}, {:?})",
        matches.len(),
        package_name,
        variant_name
    );
    matches.into_iter().next()
}

/// All discovered ejectables, validated for unique identity keys
#[derive(Debug, Clone, Default)]
pub struct EjectableIndex {
    ejectables: Vec<Ejectable>,
}

impl EjectableIndex {
    pub fn build(ejectables: Vec<Ejectable>) -> Result<Self, EjectError> {
        let mut seen: AHashSet<Selection> = AHashSet::with_capacity(ejectables.len());
        for ejectable in &ejectables {
            let key = ejectable.selection();
            if ejectable.actions.is_empty() {
                return Err(EjectError::Config(format!(
                    "{}: ejectable '{}' declares no actions",
                    ejectable.package_name, key
                )));
            }
            if !seen.insert(key.clone()) {
                return Err(EjectError::Config(format!(
                    "{}: more than one ejectable is declared as '{}'",
                    ejectable.package_name, key
                )));
            }
        }
        Ok(EjectableIndex { ejectables })
    }

    pub fn len(&self) -> usize {
        self.ejectables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ejectables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ejectable> {
        self.ejectables.iter()
    }

    pub fn find(&self, package_name: &str, variant_name: Option<&str>) -> Option<&Ejectable> {
        find_match(&self.ejectables, package_name, variant_name)
    }

    /// Like [`find`](Self::find), but a miss carries every valid selection
    pub fn select(
        &self,
        package_name: &str,
        variant_name: Option<&str>,
    ) -> Result<&Ejectable, EjectError> {
        self.find(package_name, variant_name)
            .ok_or_else(|| EjectError::Selection {
                selection: Selection::new(package_name, variant_name),
                available: self.selections(),
            })
    }

    /// Identity keys in discovery order
    pub fn selections(&self) -> Vec<Selection> {
        self.ejectables.iter().map(Ejectable::selection).collect()
    }
}

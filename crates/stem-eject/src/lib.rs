//! Eject engine for stem packages
//!
//! Discovers the ejectables declared by the project's stem dependencies, copies
//! their source into the project, repoints imports at the copies and finally
//! drops the dependency from `package.json`.

pub mod ejectable;
pub mod errors;
pub mod executor;
pub mod import_rewriter;
pub mod matcher;
pub mod script_files;
pub mod tracked_files;

pub use ejectable::{discover, load_ejectables, Discovery, Ejectable, EJECT_CONFIG_MODULES};
pub use errors::EjectError;
pub use executor::{copy_source_tree, ActionOutcome, CopyStats, EjectReport, EjectSettings, Executor};
pub use import_rewriter::{ImportRewriter, NewSpecifier, RewriteReport};
pub use matcher::{find_match, EjectableIndex, Selection};
pub use tracked_files::{GitTrackedFiles, StaticTrackedFiles, TrackedFiles};

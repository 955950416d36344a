//! stem library - expose modules for testing
//!
//! The binary is a thin clap layer over these command handlers.

pub mod commands;
pub mod common;
pub mod settings;

pub use common::GlobalOpts;
pub use stem_config as config_manager;
pub use stem_logger as logger;

pub mod config;
pub mod eject;
pub mod list;

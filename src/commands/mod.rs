//! CLI command handlers
//!
//! Handlers for the commands that only read or print project state. The
//! install/update/uninstall flows live in [`crate::deps`].

pub mod cache;
pub mod init;
pub mod list;

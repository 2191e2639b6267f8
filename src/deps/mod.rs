//! Dependency installation and management.
//!
//! This module handles all dependency-related operations including:
//!
//! - **Fetching**: Shallow clones of an exact tag into the package cache
//! - **Management**: Install, update and uninstall against `cget.json` and `cget.lock.json`
//!
//! ## Commands
//!
//! - `cget install <owner/repo[@constraint]>` - Add a dependency and install it
//! - `cget install` - Install everything the manifest declares, honoring the lock
//! - `cget update` - Re-resolve every dependency and rewrite the lock
//! - `cget uninstall <owner/repo|name>` - Remove a dependency everywhere

mod fetch;
mod manage;

pub use fetch::{Fetcher, GitFetcher};
pub use manage::{BatchReport, InstallEngine, Installed, Uninstalled, parse_source};

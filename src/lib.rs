//! # cget - Header-only C++ Package Manager
//!
//! cget resolves header-only C++ dependencies from GitHub tags, pins them in
//! a lock file and exposes each one under `extern/<name>` for the build tool.
//!
//! ## Features
//!
//! - **Semver Constraints**: `owner/repo@>=1.2,<2.0` picks the newest stable tag in range
//! - **Reproducible Installs**: `cget.lock.json` pins exact versions and wins over constraints
//! - **Fetch Once**: each `name@version` is cloned once into `.cget_packages/`
//! - **Stable Include Paths**: `extern/<name>` always points at the pinned headers
//!
//! ## Quick Start
//!
//! ```bash
//! cget init --name myapp
//! cget install fmtlib/fmt@">=10.0,<11.0"
//! cget install --dev doctest/doctest
//! ```
//!
//! ## Module Organization
//!
//! - [`resolve`] - Tag listing and version selection
//! - [`manifest`] - `cget.json` loading and editing
//! - [`lock`] - `cget.lock.json` pins
//! - [`cache`] - Fetch-once package slots
//! - [`deps`] - Install, update and uninstall orchestration
//! - [`commands`] - CLI command handlers

/// Global package cache management.
pub mod cache;

/// CLI command handlers extracted from main.
pub mod commands;

/// Runtime settings (`Settings`).
pub mod config;

/// Dependency fetching and management.
pub mod deps;

/// Error types.
pub mod error;

/// Atomic writes and directory copies.
pub mod fsutil;

/// `extern/` include-root exposure.
pub mod link;

/// Lockfile (`cget.lock.json`) management.
pub mod lock;

/// Manifest (`cget.json`) management.
pub mod manifest;

/// Version constraint resolution.
pub mod resolve;

/// Terminal UI utilities (tables, colors).
pub mod ui;

pub use error::{CgetError, Result};

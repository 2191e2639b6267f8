//! # cget CLI Entry Point
//!
//! This is the main executable for the `cget` command-line tool.
//! It parses CLI arguments using clap and routes commands to the appropriate handlers.
//!
//! ## Command Structure
//!
//! - **Project**: `init`, `list`
//! - **Dependencies**: `install`, `update`, `uninstall` (`remove`)
//! - **Cache**: `cache path|list|prune|clean`

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::PathBuf;

use cget::commands;
use cget::config::Settings;
use cget::deps::{BatchReport, InstallEngine};
use cget::manifest::{Section, parse_platforms};

#[derive(Parser)]
#[command(name = "cget")]
#[command(about = "Header-only C++ package manager", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Show debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Project directory containing cget.json [default: current directory]
    #[arg(long, global = true)]
    project: Option<PathBuf>,
    /// Package cache directory [default: <project>/.cget_packages]
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new cget.json
    Init {
        /// Project name (prompted when omitted)
        #[arg(long)]
        name: Option<String>,
        /// Overwrite an existing cget.json
        #[arg(long)]
        force: bool,
    },
    /// Add a dependency (owner/repo[@constraint]) or install everything in cget.json
    Install {
        /// Dependency source, e.g. fmtlib/fmt or "nlohmann/json@>=3.10,<4.0"
        source: Option<String>,
        /// Add to devDependencies
        #[arg(long)]
        dev: bool,
        /// Re-download even if the package is cached
        #[arg(long)]
        force: bool,
        /// Comma-separated list of supported platforms (linux, macos, windows)
        #[arg(long)]
        platforms: Option<String>,
    },
    /// Re-resolve all dependencies to the latest compatible versions and rewrite the lock file
    Update,
    /// Remove a dependency by source or name
    #[command(visible_alias = "remove")]
    Uninstall {
        /// owner/repo or dependency name
        target: String,
    },
    /// List declared dependencies and their pinned versions
    List,
    /// Manage the package cache
    Cache {
        #[command(subcommand)]
        op: CacheOp,
    },
    /// Generate shell completions
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum CacheOp {
    /// Print cache directory location
    Path,
    /// List cached packages
    #[command(visible_alias = "list")]
    Ls,
    /// Remove packages the lock file does not pin
    Prune,
    /// Remove every cached package
    Clean,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "cget=debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn settings_for(cli: &Cli) -> Result<Settings> {
    let root = match &cli.project {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Could not determine current directory")?,
    };
    let root = root
        .canonicalize()
        .with_context(|| format!("Project directory {} does not exist", root.display()))?;

    let mut settings = Settings::from_env(&root);
    if let Some(dir) = &cli.cache_dir {
        let dir = if dir.is_absolute() { dir.clone() } else { root.join(dir) };
        settings = settings.with_cache_root(dir);
    }
    Ok(settings)
}

/// Usage mistakes get a one-line message instead of an error chain.
fn exit_on_precondition<T>(result: cget::Result<T>) -> cget::Result<T> {
    if let Err(err) = &result
        && err.is_precondition()
    {
        eprintln!("{} Error: {}", "x".red(), err);
        std::process::exit(1);
    }
    result
}

fn print_report(report: &BatchReport, verb: &str) {
    println!();
    println!(
        "{} {} complete. {} packages installed or updated.",
        if report.is_success() { "✓".green() } else { "!".yellow() },
        verb,
        report.installed
    );
    if !report.failed.is_empty() {
        println!(
            "{} Failed: {}",
            "x".red(),
            report.failed_names().join(", ").bold()
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let settings = settings_for(&cli)?;

    match &cli.command {
        Commands::Init { name, force } => {
            commands::init::handle_init(&settings, name.as_deref(), *force)
        }
        Commands::Install {
            source: Some(source),
            dev,
            force,
            platforms,
        } => {
            let engine = InstallEngine::from_settings(&settings);
            let section = Section::from_dev_flag(*dev);
            exit_on_precondition(engine.install_one(
                source,
                section,
                parse_platforms(platforms.as_deref()),
                *force,
            ))
            .with_context(|| format!("Failed to install '{}'", source))?;
            Ok(())
        }
        Commands::Install {
            source: None,
            force,
            ..
        } => {
            let engine = InstallEngine::from_settings(&settings);
            let report = engine.install_all(*force)?;
            print_report(&report, "Installation");
            if !report.is_success() {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Update => {
            let engine = InstallEngine::from_settings(&settings);
            let report = engine.update()?;
            print_report(&report, "Update");
            if !report.is_success() {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Uninstall { target } => {
            let engine = InstallEngine::from_settings(&settings);
            exit_on_precondition(engine.uninstall(target))?;
            Ok(())
        }
        Commands::List => commands::list::handle_list(&settings),
        Commands::Cache { op } => match op {
            CacheOp::Path => commands::cache::print_path(&settings),
            CacheOp::Ls => commands::cache::list(&settings),
            CacheOp::Prune => commands::cache::prune(&settings),
            CacheOp::Clean => commands::cache::clean(&settings),
        },
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, bin_name, &mut std::io::stdout());
            Ok(())
        }
    }
}

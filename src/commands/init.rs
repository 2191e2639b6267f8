//! `cget init` handler
//!
//! Writes an empty `cget.json` and the `extern/` directory build tooling
//! reads headers from. Project templates are out of scope.

use anyhow::{Context, Result};
use colored::*;
use inquire::Text;
use std::fs;

use crate::config::Settings;
use crate::manifest::ManifestStore;

/// Creates the manifest, prompting for a project name when none is given.
pub fn handle_init(settings: &Settings, name: Option<&str>, force: bool) -> Result<()> {
    if settings.is_project() && !force {
        println!(
            "{} Error: Project already initialized (cget.json exists). Use --force to reset it.",
            "x".red()
        );
        return Ok(());
    }

    let name = match name {
        Some(name) => name.to_string(),
        None => {
            let dir_name = settings
                .project_root
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "app".to_string());
            Text::new("Project name?").with_default(&dir_name).prompt()?
        }
    };

    ManifestStore::init(settings, &name, force)?;
    let extern_dir = settings.extern_dir();
    fs::create_dir_all(&extern_dir)
        .with_context(|| format!("Failed to create {}", extern_dir.display()))?;

    println!("{} Initialized cget.json for {}", "✓".green(), name.bold());
    println!(
        "   Add a dependency with {}",
        "cget install owner/repo".white().bold()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_manifest_and_extern() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(dir.path());
        handle_init(&settings, Some("demo"), false).unwrap();

        let store = ManifestStore::load(&settings).unwrap();
        assert_eq!(store.document().name, "demo");
        assert_eq!(store.document().version, "0.1.0");
        assert!(settings.extern_dir().is_dir());
    }

    #[test]
    fn test_init_keeps_existing_manifest_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::new(dir.path());
        handle_init(&settings, Some("first"), false).unwrap();
        handle_init(&settings, Some("second"), false).unwrap();
        assert_eq!(ManifestStore::load(&settings).unwrap().document().name, "first");

        handle_init(&settings, Some("second"), true).unwrap();
        assert_eq!(ManifestStore::load(&settings).unwrap().document().name, "second");
    }
}

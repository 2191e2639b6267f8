//! `cget list` handler

use anyhow::Result;
use colored::*;

use crate::config::Settings;
use crate::lock::LockStore;
use crate::manifest::ManifestStore;
use crate::ui;

/// One table row per declared dependency: name, section, constraint, pin, platforms.
pub fn dependency_rows(manifest: &ManifestStore, lock: &LockStore) -> Vec<Vec<String>> {
    manifest
        .entries()
        .map(|(section, spec)| {
            let locked = lock
                .get(&spec.name)
                .filter(|entry| entry.source == spec.source)
                .map(|entry| entry.version.clone())
                .unwrap_or_else(|| "-".to_string());
            let platforms = spec
                .platforms
                .as_ref()
                .map(|p| p.join(","))
                .unwrap_or_else(|| "all".to_string());
            vec![
                spec.name.clone(),
                section.key().to_string(),
                spec.source.clone(),
                spec.version.clone(),
                locked,
                platforms,
            ]
        })
        .collect()
}

pub fn handle_list(settings: &Settings) -> Result<()> {
    let manifest = ManifestStore::load(settings)?;
    let lock = LockStore::load(settings)?;

    if manifest.is_empty() {
        println!("{} No dependencies installed.", "ℹ".blue());
        return Ok(());
    }

    let mut table = ui::Table::new(&[
        "Name",
        "Section",
        "Source",
        "Constraint",
        "Locked",
        "Platforms",
    ]);
    for row in dependency_rows(&manifest, &lock) {
        table.add_row(row);
    }
    println!(
        "{} v{}",
        manifest.document().name.bold().cyan(),
        manifest.document().version
    );
    table.print();
    Ok(())
}

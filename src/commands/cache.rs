//! `cget cache` handlers
//!
//! Handles `cget cache path|list|prune|clean` against the project cache root.

use anyhow::Result;
use colored::*;

use crate::cache::{PackageCache, SlotKey};
use crate::config::Settings;
use crate::deps::GitFetcher;
use crate::lock::LockStore;
use crate::ui;

fn open(settings: &Settings) -> PackageCache<GitFetcher> {
    PackageCache::new(settings, GitFetcher)
}

pub fn print_path(settings: &Settings) -> Result<()> {
    println!("{}", settings.cache_root.display());
    Ok(())
}

pub fn list(settings: &Settings) -> Result<()> {
    let cache = open(settings);
    let slots = cache.slots()?;
    if slots.is_empty() {
        println!("{} Cache is empty.", "ℹ".blue());
        return Ok(());
    }

    let lock = LockStore::load(settings).ok();
    let mut table = ui::Table::new(&["Package", "Version", "Pinned"]);
    for slot in slots {
        let pinned = lock
            .as_ref()
            .and_then(|l| l.get(&slot.name))
            .is_some_and(|entry| entry.version == slot.version);
        table.add_row(vec![
            slot.name,
            slot.version,
            if pinned { "yes".green().to_string() } else { "no".dimmed().to_string() },
        ]);
    }
    table.print();
    Ok(())
}

/// Removes every slot the lock file does not pin.
pub fn prune(settings: &Settings) -> Result<()> {
    let cache = open(settings);
    let lock = LockStore::load(settings)?;
    let keep: Vec<SlotKey> = lock
        .entries()
        .map(|entry| SlotKey {
            name: entry.name.clone(),
            version: entry.version.clone(),
        })
        .collect();

    println!("{} Pruning unused packages...", "🧹".yellow());
    let removed = cache.prune(&keep)?;
    for slot in &removed {
        println!("   {} Removing unused: {}", "🗑️".red(), slot.dir_name());
    }
    if removed.is_empty() {
        println!("{} All cached packages are in use.", "✓".green());
    } else {
        println!("{} Removed {} unused packages.", "✓".green(), removed.len());
    }
    Ok(())
}

pub fn clean(settings: &Settings) -> Result<()> {
    let cache = open(settings);
    println!("{} Cleaning cache...", "🧹".yellow());
    let count = cache.clean()?;
    if count == 0 {
        println!("{} Cache already empty.", "✓".green());
    } else {
        println!(
            "{} Cache cleaned ({} packages). Run {} to restore.",
            "✓".green(),
            count,
            "cget install".white().bold()
        );
    }
    Ok(())
}

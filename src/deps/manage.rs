//! Dependency management commands.
//!
//! [`InstallEngine`] ties the manifest, the lock file, the resolver and the
//! package cache together. Batch operations walk the manifest in order
//! (runtime section first) and keep going past a failing dependency, so one
//! broken package never hides the state of the others.

use super::fetch::{Fetcher, GitFetcher};
use crate::cache::{Ensured, PackageCache, SlotKey};
use crate::config::Settings;
use crate::error::{CgetError, Result};
use crate::lock::{LockEntry, LockStore};
use crate::manifest::{
    DependencySpec, LATEST, ManifestStore, Reconciled, Section, validate_name,
};
use crate::resolve::{GithubTags, Resolved, RetryPolicy, TagSource, VersionResolver};
use colored::*;
use log::debug;
use semver::Version;
use std::collections::BTreeSet;

/// Splits `owner/repo[@constraint]` into `(name, source, constraint)`.
pub fn parse_source(input: &str) -> Result<(String, String, String)> {
    let bad = || CgetError::BadSourceFormat(input.to_string());
    let (source, constraint) = match input.split_once('@') {
        Some((source, constraint)) => (source.trim(), constraint.trim()),
        None => (input.trim(), LATEST),
    };
    let (owner, repo) = source.split_once('/').ok_or_else(bad)?;
    if validate_name(owner).is_err() || validate_name(repo).is_err() {
        return Err(bad());
    }
    let constraint = if constraint.is_empty() { LATEST } else { constraint };
    Ok((repo.to_string(), source.to_string(), constraint.to_string()))
}

/// Outcome of a single `install <source>`.
#[derive(Debug)]
pub struct Installed {
    pub name: String,
    pub version: Version,
    pub reconciled: Reconciled,
    pub ensured: Ensured,
}

/// Aggregate result of `install` (all) and `update`.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Packages fetched or relinked.
    pub installed: usize,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, CgetError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_names(&self) -> Vec<&str> {
        self.failed.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn record(&mut self, name: &str, result: Result<Option<Ensured>>) {
        match result {
            Ok(Some(_)) => self.installed += 1,
            Ok(None) => self.skipped.push(name.to_string()),
            Err(err) => {
                println!("   {} {}: {}", "x".red(), name.bold(), err);
                self.failed.push((name.to_string(), err));
            }
        }
    }
}

/// What `uninstall` removed.
#[derive(Debug, Default)]
pub struct Uninstalled {
    pub manifest: Vec<(Section, DependencySpec)>,
    pub lock: Vec<LockEntry>,
    pub slots: Vec<SlotKey>,
}

pub struct InstallEngine<T, F> {
    settings: Settings,
    resolver: VersionResolver<T>,
    cache: PackageCache<F>,
    platform: String,
}

impl InstallEngine<GithubTags, GitFetcher> {
    /// GitHub tag listing and libgit2 fetching.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings, GithubTags::new(settings), GitFetcher).with_retry(RetryPolicy {
            attempts: settings.retry_attempts,
            ..RetryPolicy::default()
        })
    }
}

impl<T: TagSource, F: Fetcher> InstallEngine<T, F> {
    pub fn new(settings: &Settings, tags: T, fetcher: F) -> Self {
        Self {
            settings: settings.clone(),
            resolver: VersionResolver::new(tags),
            cache: PackageCache::new(settings, fetcher),
            platform: std::env::consts::OS.to_string(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.resolver = self.resolver.with_retry(retry);
        self
    }

    /// Platform tag used to evaluate `platforms` filters.
    pub fn with_platform(mut self, platform: &str) -> Self {
        self.platform = platform.to_lowercase();
        self
    }

    pub fn cache(&self) -> &PackageCache<F> {
        &self.cache
    }

    fn lock_entry(&self, spec: &DependencySpec, pin: &Resolved) -> LockEntry {
        LockEntry {
            name: spec.name.clone(),
            source: spec.source.clone(),
            resolved: self.settings.fetch_url(&spec.source),
            version: pin.version.to_string(),
            tag: Some(pin.tag.clone()),
            platforms: spec.platforms.clone(),
        }
    }

    /// Adds or updates one dependency, then resolves, fetches and pins it.
    ///
    /// The manifest is saved before resolution and is not rolled back if a
    /// later step fails.
    pub fn install_one(
        &self,
        input: &str,
        section: Section,
        platforms: Option<Vec<String>>,
        force: bool,
    ) -> Result<Installed> {
        let mut manifest = ManifestStore::load(&self.settings)?;
        let (name, source, constraint) = parse_source(input)?;
        let mut lock = LockStore::load(&self.settings)?;

        let mut spec = DependencySpec::new(&name, &source, &constraint);
        spec.platforms = platforms;
        let reconciled = manifest.add_or_update(spec, section);
        manifest.save()?;
        match reconciled {
            Reconciled::Added => println!(
                "{} Added {} to '{}'",
                "✓".green(),
                name.bold(),
                section
            ),
            Reconciled::Updated => println!(
                "{} Updated {} in '{}'",
                "✓".green(),
                name.bold(),
                section
            ),
            Reconciled::Moved => println!(
                "{} Moved {} to '{}'",
                "!".yellow(),
                name.bold(),
                section
            ),
        }

        let spec = manifest
            .find(&name)
            .map(|(_, spec)| spec.clone())
            .ok_or_else(|| CgetError::NotFound(name.clone()))?;
        let pin = self.resolver.resolve(&source, &constraint)?;
        println!("   {} Resolved {} to {}", "📌".blue(), name, pin.version);

        let ensured = self.cache.ensure(&name, &source, &pin, force)?;
        report_ensured(&name, &pin, ensured);

        lock.upsert(self.lock_entry(&spec, &pin));
        lock.save()?;
        manifest.save()?;

        Ok(Installed {
            name,
            version: pin.version,
            reconciled,
            ensured,
        })
    }

    /// Installs every manifest entry, reusing lock pins whose source still matches.
    pub fn install_all(&self, force: bool) -> Result<BatchReport> {
        let manifest = ManifestStore::load(&self.settings)?;
        let mut lock = LockStore::load(&self.settings)?;
        let mut report = BatchReport::default();

        if manifest.is_empty() {
            println!("{} No dependencies declared in cget.json", "!".yellow());
            return Ok(report);
        }
        println!(
            "{} Installing {} dependencies...",
            "📦".blue(),
            manifest.len()
        );

        for (_, spec) in manifest.entries() {
            if !spec.applies_to(&self.platform) {
                println!(
                    "   {} Skipping '{}' (not for {})",
                    "-".dimmed(),
                    spec.name,
                    self.platform
                );
                report.skipped.push(spec.name.clone());
                continue;
            }
            let result = self.install_pinned(spec, &mut lock, force);
            report.record(&spec.name, result);
        }

        lock.save()?;
        Ok(report)
    }

    fn install_pinned(
        &self,
        spec: &DependencySpec,
        lock: &mut LockStore,
        force: bool,
    ) -> Result<Option<Ensured>> {
        let locked = lock
            .get(&spec.name)
            .filter(|entry| entry.source == spec.source)
            .and_then(|entry| Resolved::from_pin(&entry.version, entry.tag.as_deref()));

        let pin = match locked {
            Some(pin) => {
                debug!("{}: using locked {}", spec.name, pin.version);
                pin
            }
            None => {
                let pin = self.resolver.resolve(&spec.source, &spec.version)?;
                lock.upsert(self.lock_entry(spec, &pin));
                pin
            }
        };

        if !force && self.cache.is_installed(&spec.name, &pin.version) {
            println!(
                "   {} Skipping '{}' (already installed)",
                "⚡".green(),
                spec.name
            );
            return Ok(None);
        }

        let ensured = self.cache.ensure(&spec.name, &spec.source, &pin, force)?;
        report_ensured(&spec.name, &pin, ensured);
        Ok(Some(ensured))
    }

    /// Re-resolves everything against live tags, refetches, and rewrites the lock.
    ///
    /// Entries whose dependency left the manifest are dropped. A dependency
    /// that fails keeps its previous pin, if it had one.
    pub fn update(&self) -> Result<BatchReport> {
        let manifest = ManifestStore::load(&self.settings)?;
        let previous = LockStore::load(&self.settings)?;
        let mut lock = previous.fresh();
        let mut report = BatchReport::default();

        println!("{} Checking for updates...", "📦".blue());

        for (_, spec) in manifest.entries() {
            let result = self.update_one(spec, &mut lock);
            if result.is_err()
                && let Some(prev) = previous
                    .get(&spec.name)
                    .filter(|entry| entry.source == spec.source)
            {
                lock.upsert(prev.clone());
            }
            report.record(&spec.name, result);
        }

        lock.save()?;
        Ok(report)
    }

    fn update_one(&self, spec: &DependencySpec, lock: &mut LockStore) -> Result<Option<Ensured>> {
        let pin = self.resolver.resolve(&spec.source, &spec.version)?;
        lock.upsert(self.lock_entry(spec, &pin));
        println!(
            "   {} Updated '{}' to {}",
            "📌".blue(),
            spec.name,
            pin.version
        );

        if !spec.applies_to(&self.platform) {
            return Ok(None);
        }
        let ensured = self.cache.ensure(&spec.name, &spec.source, &pin, true)?;
        Ok(Some(ensured))
    }

    /// Removes a dependency by source or name from the manifest, lock, cache and `extern/`.
    ///
    /// An `owner/repo` target only touches lock entries recorded for that
    /// source; a bare name also matches lock entries by name. Lock and cache
    /// are cleaned even when the manifest has no match, in which case
    /// `NotFound` is still returned. Names still declared in the manifest
    /// keep their slots and link.
    pub fn uninstall(&self, target: &str) -> Result<Uninstalled> {
        let by_source = if target.contains('/') {
            let (_, source, _) = parse_source(target)?;
            Some(source)
        } else {
            validate_name(target)?;
            None
        };
        let mut manifest = ManifestStore::load(&self.settings)?;
        let mut lock = LockStore::load(&self.settings)?;
        let mut removed = Uninstalled::default();

        let manifest_result = manifest.remove(by_source.as_deref().unwrap_or(target));
        if let Ok(entries) = &manifest_result {
            manifest.save()?;
            removed.manifest = entries.clone();
        }

        let mut sources: BTreeSet<String> = removed
            .manifest
            .iter()
            .map(|(_, spec)| spec.source.clone())
            .collect();
        sources.extend(by_source);
        let mut names: BTreeSet<String> = removed
            .manifest
            .iter()
            .map(|(_, spec)| spec.name.clone())
            .collect();
        if !target.contains('/') {
            names.insert(target.to_string());
        }

        for source in &sources {
            removed.lock.extend(lock.remove_by_source(source));
        }
        for name in &names {
            if let Some(entry) = lock.remove(name) {
                removed.lock.push(entry);
            }
        }
        lock.save()?;

        names.extend(removed.lock.iter().map(|entry| entry.name.clone()));
        names.retain(|name| validate_name(name).is_ok() && manifest.find(name).is_none());
        for name in &names {
            for slot in self.cache.slots_of(name)? {
                self.cache.remove(&slot.name, &slot.version)?;
                removed.slots.push(slot);
            }
            self.cache.links().remove(name)?;
        }

        match manifest_result {
            Ok(_) => {
                println!("{} Removed dependency '{}'", "✓".green(), target.bold());
                Ok(removed)
            }
            Err(err) => {
                if !removed.lock.is_empty() || !removed.slots.is_empty() {
                    println!(
                        "{} '{}' was not in cget.json; cleaned {} lock entries and {} cached packages",
                        "!".yellow(),
                        target,
                        removed.lock.len(),
                        removed.slots.len()
                    );
                }
                Err(err)
            }
        }
    }
}

fn report_ensured(name: &str, pin: &Resolved, ensured: Ensured) {
    match ensured {
        Ensured::Cached => println!("   {} Using cached: {}@{}", "⚡".green(), name, pin.version),
        Ensured::Relinked => println!("   {} Relinked extern/{}", "🔗".cyan(), name),
        Ensured::Fetched => println!("   {} Installed {}@{}", "✓".green(), name, pin.version),
    }
}

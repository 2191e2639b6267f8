//! Package cache management.
//!
//! Each resolved dependency lives in `<cache-root>/<name>@<version>/` (by
//! default `.cget_packages/` inside the project). A slot is written once: it is
//! fetched into a staging directory next to the slots and renamed into place,
//! so a slot is either complete or absent.
//!
//! ## Commands
//!
//! - `cget cache path` - Print cache directory location
//! - `cget cache list` - List cached packages
//! - `cget cache prune` - Remove slots the lock file does not pin
//! - `cget cache clean` - Remove every slot

use crate::config::Settings;
use crate::deps::Fetcher;
use crate::error::{CgetError, Result};
use crate::link::{ExternLinks, absolute, find_include_root};
use crate::resolve::Resolved;
use log::debug;
use semver::Version;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What `ensure` had to do to satisfy a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ensured {
    /// Slot and link were already in place.
    Cached,
    /// Slot was present; only `extern/<name>` was repaired.
    Relinked,
    Fetched,
}

/// A cache slot identified by its directory name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SlotKey {
    pub name: String,
    pub version: String,
}

impl SlotKey {
    pub fn dir_name(&self) -> String {
        format!("{}@{}", self.name, self.version)
    }
}

pub struct PackageCache<F> {
    settings: Settings,
    links: ExternLinks,
    fetcher: F,
}

impl<F: Fetcher> PackageCache<F> {
    pub fn new(settings: &Settings, fetcher: F) -> Self {
        Self {
            links: ExternLinks::new(settings.extern_dir()),
            settings: settings.clone(),
            fetcher,
        }
    }

    pub fn root(&self) -> &Path {
        &self.settings.cache_root
    }

    pub fn links(&self) -> &ExternLinks {
        &self.links
    }

    pub fn slot_path(&self, name: &str, version: &Version) -> PathBuf {
        self.root().join(format!("{}@{}", name, version))
    }

    pub fn has_slot(&self, name: &str, version: &Version) -> bool {
        self.slot_path(name, version).is_dir()
    }

    /// True when the slot is present and `extern/<name>` links to its include root.
    pub fn is_installed(&self, name: &str, version: &Version) -> bool {
        self.has_slot(name, version)
            && find_include_root(&self.slot_path(name, version), name)
                .is_some_and(|include| self.links.points_to(name, &include))
    }

    /// Makes sure `name@version` is cached and exposed as `extern/<name>`.
    ///
    /// An existing slot is reused unless `force` is set; a forced refetch
    /// replaces the slot only after the new tree is complete.
    pub fn ensure(&self, name: &str, source: &str, pin: &Resolved, force: bool) -> Result<Ensured> {
        let slot = self.slot_path(name, &pin.version);

        if slot.is_dir() && !force {
            let include = self.include_root(name, &slot)?;
            if self.links.points_to(name, &include) {
                return Ok(Ensured::Cached);
            }
            debug!("repairing extern/{} -> {}", name, include.display());
            self.links.expose(name, &include)?;
            return Ok(Ensured::Relinked);
        }

        self.fetch_into_slot(name, source, pin, &slot)?;
        let include = self.include_root(name, &slot)?;
        self.links.expose(name, &include)?;
        Ok(Ensured::Fetched)
    }

    fn include_root(&self, name: &str, slot: &Path) -> Result<PathBuf> {
        find_include_root(slot, name).ok_or_else(|| CgetError::UnresolvableIncludeRoot {
            name: name.to_string(),
            slot: slot.to_path_buf(),
        })
    }

    fn fetch_into_slot(&self, name: &str, source: &str, pin: &Resolved, slot: &Path) -> Result<()> {
        let root = self.root();
        let write_err = |e: io::Error| CgetError::CacheWrite {
            path: slot.to_path_buf(),
            source: e,
        };
        fs::create_dir_all(root).map_err(write_err)?;

        // Dropped on any early return, which discards a partial fetch.
        let staging = tempfile::Builder::new()
            .prefix(".fetch-")
            .tempdir_in(root)
            .map_err(write_err)?;
        let url = self.settings.fetch_url(source);
        self.fetcher.fetch(name, &url, &pin.tag, staging.path())?;

        if !slot.exists() {
            return fs::rename(staging.path(), slot).map_err(write_err);
        }

        let trash = tempfile::Builder::new()
            .prefix(".old-")
            .tempdir_in(root)
            .map_err(write_err)?;
        let parked = trash.path().join("slot");
        fs::rename(slot, &parked).map_err(write_err)?;
        if let Err(e) = fs::rename(staging.path(), slot) {
            let _ = fs::rename(&parked, slot);
            return Err(write_err(e));
        }
        debug!("replaced slot {}", slot.display());
        Ok(())
    }

    /// Deletes `name@version`, and `extern/<name>` if it points into that slot.
    pub fn remove(&self, name: &str, version: &str) -> Result<bool> {
        let slot = self.root().join(format!("{}@{}", name, version));
        if self
            .links
            .target(name)
            .is_some_and(|target| target.starts_with(absolute(&slot)))
        {
            self.links.remove(name)?;
        }
        if !slot.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&slot).map_err(|source| CgetError::CacheWrite {
            path: slot.clone(),
            source,
        })?;
        debug!("removed slot {}", slot.display());
        Ok(true)
    }

    /// Every complete slot on disk, sorted.
    pub fn slots(&self) -> Result<Vec<SlotKey>> {
        let root = self.root();
        if !root.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(root).map_err(|e| CgetError::io(root, e))?;
        let mut slots: Vec<SlotKey> = entries
            .flatten()
            .filter(|e| e.file_type().is_ok_and(|ft| ft.is_dir()))
            .filter_map(|e| {
                let dir = e.file_name().to_string_lossy().to_string();
                if dir.starts_with('.') {
                    return None;
                }
                let (name, version) = dir.rsplit_once('@')?;
                Some(SlotKey {
                    name: name.to_string(),
                    version: version.to_string(),
                })
            })
            .collect();
        slots.sort();
        Ok(slots)
    }

    pub fn slots_of(&self, name: &str) -> Result<Vec<SlotKey>> {
        Ok(self
            .slots()?
            .into_iter()
            .filter(|s| s.name == name)
            .collect())
    }

    /// Removes slots not in `keep`, returning what was removed.
    pub fn prune(&self, keep: &[SlotKey]) -> Result<Vec<SlotKey>> {
        let mut removed = Vec::new();
        for slot in self.slots()? {
            if !keep.contains(&slot) {
                self.remove(&slot.name, &slot.version)?;
                removed.push(slot);
            }
        }
        Ok(removed)
    }

    pub fn clean(&self) -> Result<usize> {
        Ok(self.prune(&[])?.len())
    }
}

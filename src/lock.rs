use crate::config::Settings;
use crate::error::{CgetError, Result};
use crate::fsutil;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(transparent)]
pub struct LockDocument {
    pub packages: BTreeMap<String, LockEntry>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LockEntry {
    pub name: String,
    pub source: String,
    /// Fetch URL the version was resolved against.
    pub resolved: String,
    pub version: String,
    /// Remote tag the version came from (`v1.2.0` vs `1.2.0`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,
}

/// `cget.lock.json`, a machine-maintained map of name to pinned version.
#[derive(Debug)]
pub struct LockStore {
    path: PathBuf,
    doc: LockDocument,
}

impl LockStore {
    pub fn load(settings: &Settings) -> Result<Self> {
        Self::load_from(&settings.lock_path())
    }

    /// A missing lock file is an empty lock.
    pub fn load_from(path: &Path) -> Result<Self> {
        let doc = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| CgetError::io(path, e))?;
            serde_json::from_str(&content).map_err(|source| CgetError::InvalidDocument {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            LockDocument::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    /// An empty lock that will be written to the same path, for wholesale rewrites.
    pub fn fresh(&self) -> Self {
        Self {
            path: self.path.clone(),
            doc: LockDocument::default(),
        }
    }

    pub fn save(&self) -> Result<()> {
        let mut content = serde_json::to_string_pretty(&self.doc).map_err(|source| {
            CgetError::InvalidDocument {
                path: self.path.clone(),
                source,
            }
        })?;
        content.push('\n');
        fsutil::write_atomic(&self.path, content.as_bytes())
    }

    pub fn get(&self, name: &str) -> Option<&LockEntry> {
        self.doc.packages.get(name)
    }

    pub fn upsert(&mut self, entry: LockEntry) {
        self.doc.packages.insert(entry.name.clone(), entry);
    }

    pub fn remove(&mut self, name: &str) -> Option<LockEntry> {
        self.doc.packages.remove(name)
    }

    /// Drops every entry recorded for `source`.
    pub fn remove_by_source(&mut self, source: &str) -> Vec<LockEntry> {
        let names: Vec<String> = self
            .doc
            .packages
            .values()
            .filter(|e| e.source == source)
            .map(|e| e.name.clone())
            .collect();
        names
            .iter()
            .filter_map(|n| self.doc.packages.remove(n))
            .collect()
    }

    pub fn entries(&self) -> impl Iterator<Item = &LockEntry> {
        self.doc.packages.values()
    }

    pub fn document(&self) -> &LockDocument {
        &self.doc
    }

    pub fn len(&self) -> usize {
        self.doc.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.packages.is_empty()
    }
}

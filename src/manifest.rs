//! Project manifest (`cget.json`) management.
//!
//! The manifest is the human-edited list of desired dependencies, split into a
//! runtime section (`dependencies`) and a development section
//! (`devDependencies`). A dependency name lives in exactly one section.
//!
//! ## Example
//!
//! ```json
//! {
//!   "name": "demo",
//!   "version": "0.1.0",
//!   "dependencies": [
//!     { "name": "fmt", "source": "fmtlib/fmt", "version": ">=10.0,<11.0" }
//!   ],
//!   "devDependencies": [
//!     { "name": "doctest", "source": "doctest/doctest", "version": "latest", "platforms": ["linux"] }
//!   ]
//! }
//! ```

use crate::config::Settings;
use crate::error::{CgetError, Result};
use crate::fsutil;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const LATEST: &str = "latest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Runtime,
    Development,
}

impl Section {
    pub fn from_dev_flag(dev: bool) -> Self {
        if dev {
            Section::Development
        } else {
            Section::Runtime
        }
    }

    /// JSON key of the section.
    pub fn key(self) -> &'static str {
        match self {
            Section::Runtime => "dependencies",
            Section::Development => "devDependencies",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Section::Runtime => Section::Development,
            Section::Development => Section::Runtime,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencySpec {
    pub name: String,
    /// `owner/repo`
    pub source: String,
    /// Version constraint, `latest` for any stable version.
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,
}

impl DependencySpec {
    pub fn new(name: &str, source: &str, version: &str) -> Self {
        Self {
            name: name.to_string(),
            source: source.to_string(),
            version: version.to_string(),
            platforms: None,
        }
    }

    /// True when the dependency has no platform filter or lists `platform`.
    pub fn applies_to(&self, platform: &str) -> bool {
        match &self.platforms {
            None => true,
            Some(list) if list.is_empty() => true,
            Some(list) => list.iter().any(|p| platform_matches(p, platform)),
        }
    }

    fn merge(&mut self, incoming: DependencySpec) {
        self.source = incoming.source;
        self.version = incoming.version;
        if incoming.platforms.is_some() {
            self.platforms = incoming.platforms;
        }
    }
}

fn platform_matches(tag: &str, platform: &str) -> bool {
    let tag = tag.trim().to_lowercase();
    match tag.as_str() {
        "darwin" | "osx" | "mac" => platform == "macos",
        "win" | "win32" | "win64" => platform == "windows",
        "unix" => platform != "windows",
        _ => tag == platform,
    }
}

/// Parses a comma separated `--platforms` value into lowercase tags.
pub fn parse_platforms(raw: Option<&str>) -> Option<Vec<String>> {
    let raw = raw?;
    let parsed: Vec<String> = raw
        .split(',')
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect();
    if parsed.is_empty() { None } else { Some(parsed) }
}

/// A name must be one plain path component: it names `extern/<name>` and
/// the `<name>@<version>` cache slot.
pub fn validate_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let single = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single || name.contains(['/', '\\']) {
        return Err(CgetError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestDocument {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub dependencies: Vec<DependencySpec>,
    #[serde(rename = "devDependencies", default)]
    pub dev_dependencies: Vec<DependencySpec>,
    /// Consumed by the build step, carried through untouched.
    #[serde(
        rename = "compilerOptions",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub compiler_options: Option<serde_json::Value>,
}

impl ManifestDocument {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: "0.1.0".to_string(),
            dependencies: Vec::new(),
            dev_dependencies: Vec::new(),
            compiler_options: None,
        }
    }

    pub fn section(&self, section: Section) -> &[DependencySpec] {
        match section {
            Section::Runtime => &self.dependencies,
            Section::Development => &self.dev_dependencies,
        }
    }

    fn section_mut(&mut self, section: Section) -> &mut Vec<DependencySpec> {
        match section {
            Section::Runtime => &mut self.dependencies,
            Section::Development => &mut self.dev_dependencies,
        }
    }
}

/// What `add_or_update` did with the incoming entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    Added,
    Updated,
    /// Migrated from the other section.
    Moved,
}

#[derive(Debug)]
pub struct ManifestStore {
    path: PathBuf,
    doc: ManifestDocument,
}

impl ManifestStore {
    pub fn load(settings: &Settings) -> Result<Self> {
        Self::load_from(&settings.manifest_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let root = path.parent().unwrap_or(Path::new(".")).to_path_buf();
            return Err(CgetError::ManifestMissing(root));
        }
        let content = fs::read_to_string(path).map_err(|e| CgetError::io(path, e))?;
        let doc = serde_json::from_str(&content).map_err(|source| CgetError::InvalidDocument {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    /// Creates and saves an empty manifest named `name`.
    pub fn init(settings: &Settings, name: &str, force: bool) -> Result<Self> {
        let path = settings.manifest_path();
        if path.exists() && !force {
            return Err(CgetError::AlreadyExists(path));
        }
        let store = Self {
            path,
            doc: ManifestDocument::new(name),
        };
        store.save()?;
        Ok(store)
    }

    pub fn document(&self) -> &ManifestDocument {
        &self.doc
    }

    /// All entries in manifest order, runtime section first.
    pub fn entries(&self) -> impl Iterator<Item = (Section, &DependencySpec)> {
        self.doc
            .dependencies
            .iter()
            .map(|d| (Section::Runtime, d))
            .chain(
                self.doc
                    .dev_dependencies
                    .iter()
                    .map(|d| (Section::Development, d)),
            )
    }

    pub fn find(&self, name: &str) -> Option<(Section, &DependencySpec)> {
        self.entries().find(|(_, d)| d.name == name)
    }

    pub fn len(&self) -> usize {
        self.doc.dependencies.len() + self.doc.dev_dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn add_or_update(&mut self, entry: DependencySpec, section: Section) -> Reconciled {
        let target = self.doc.section_mut(section);
        if let Some(existing) = target.iter_mut().find(|d| d.name == entry.name) {
            existing.merge(entry);
            return Reconciled::Updated;
        }

        let other = self.doc.section_mut(section.other());
        if let Some(pos) = other.iter().position(|d| d.name == entry.name) {
            let mut moved = other.remove(pos);
            moved.merge(entry);
            self.doc.section_mut(section).push(moved);
            return Reconciled::Moved;
        }

        self.doc.section_mut(section).push(entry);
        Reconciled::Added
    }

    /// Removes every entry whose name or source equals `target`.
    pub fn remove(&mut self, target: &str) -> Result<Vec<(Section, DependencySpec)>> {
        let mut removed = Vec::new();
        for section in [Section::Runtime, Section::Development] {
            let deps = self.doc.section_mut(section);
            let (gone, kept): (Vec<_>, Vec<_>) = deps
                .drain(..)
                .partition(|d| d.name == target || d.source == target);
            *deps = kept;
            removed.extend(gone.into_iter().map(|d| (section, d)));
        }
        if removed.is_empty() {
            return Err(CgetError::NotFound(target.to_string()));
        }
        Ok(removed)
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
}

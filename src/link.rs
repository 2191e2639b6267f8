//! `extern/<name>` exposure of a package's include root.
//!
//! Build tooling adds `extern/` to its include path, so each link must point at
//! a directory that holds the package's public headers. A link is a directory
//! symlink where the platform allows one, a plain copy otherwise.

use crate::error::{CgetError, Result};
use crate::manifest::validate_name;
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx", "h++", "inl", "ipp", "tpp"];

pub fn is_header(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| HEADER_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

fn contains_header(dir: &Path) -> bool {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .any(|e| e.file_type().is_file() && is_header(e.path()))
}

/// First of `include/<name>`, `<name>`, `include`, `.` that exists and holds a header.
pub fn find_include_root(slot: &Path, name: &str) -> Option<PathBuf> {
    let candidates = [
        slot.join("include").join(name),
        slot.join(name),
        slot.join("include"),
        slot.to_path_buf(),
    ];
    candidates
        .into_iter()
        .find(|candidate| candidate.is_dir() && contains_header(candidate))
}

/// Stable per-name links under the project's `extern/` directory.
#[derive(Debug, Clone)]
pub struct ExternLinks {
    dir: PathBuf,
}

impl ExternLinks {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Whether anything (link, dangling link or copy) occupies `extern/<name>`.
    pub fn exists(&self, name: &str) -> bool {
        fs::symlink_metadata(self.path(name)).is_ok()
    }

    /// Symlink target of `extern/<name>`; `None` for copies and missing links.
    pub fn target(&self, name: &str) -> Option<PathBuf> {
        fs::read_link(self.path(name)).ok()
    }

    /// True when `extern/<name>` is a symlink to `target`.
    pub fn points_to(&self, name: &str, target: &Path) -> bool {
        self.target(name).is_some_and(|t| t == absolute(target))
    }

    /// `extern/<name>`, for names that are a single plain path component.
    fn entry(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.path(name))
    }

    /// Removes any existing entry, then links `extern/<name>` to `target`.
    ///
    /// Links always record an absolute target.
    pub fn expose(&self, name: &str, target: &Path) -> Result<()> {
        let link_err = |source: io::Error| CgetError::Link {
            name: name.to_string(),
            source,
        };
        let link = self.entry(name)?;
        let target = absolute(target);
        fs::create_dir_all(&self.dir).map_err(link_err)?;
        self.remove(name)?;

        match symlink_dir(&target, &link) {
            Ok(()) => {
                debug!("linked {} -> {}", link.display(), target.display());
                Ok(())
            }
            Err(e) if cfg!(windows) => {
                debug!("symlink unavailable ({}), copying {}", e, target.display());
                crate::fsutil::copy_dir_all(&target, &link).map_err(link_err)
            }
            Err(e) => Err(link_err(e)),
        }
    }

    /// Deletes `extern/<name>` whatever it is. Missing is fine.
    pub fn remove(&self, name: &str) -> Result<()> {
        let link = self.entry(name)?;
        let Ok(meta) = fs::symlink_metadata(&link) else {
            return Ok(());
        };
        let result = if meta.file_type().is_symlink() {
            remove_symlink(&link)
        } else if meta.is_dir() {
            fs::remove_dir_all(&link)
        } else {
            fs::remove_file(&link)
        };
        result.map_err(|source| CgetError::Link {
            name: name.to_string(),
            source,
        })
    }
}

pub(crate) fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(unix)]
fn remove_symlink(link: &Path) -> io::Result<()> {
    fs::remove_file(link)
}

#[cfg(windows)]
fn remove_symlink(link: &Path) -> io::Result<()> {
    // Directory symlinks are directories to the Windows API.
    fs::remove_dir(link).or_else(|_| fs::remove_file(link))
}

//! Error taxonomy for resolution, cache and document operations.
//!
//! Every variant that concerns a single dependency carries its name, so a
//! batch report can say which package failed and why.

use std::io;
use std::path::PathBuf;

pub type Result<T, E = CgetError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum CgetError {
    #[error("cget.json not found in {}. Run `cget init` first.", .0.display())]
    ManifestMissing(PathBuf),

    #[error("invalid document {}: {source}", .path.display())]
    InvalidDocument {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} already exists (use --force to overwrite)", .0.display())]
    AlreadyExists(PathBuf),

    #[error("dependency '{0}' must be in 'owner/repo[@constraint]' format")]
    BadSourceFormat(String),

    #[error("'{0}' is not a valid dependency name")]
    InvalidName(String),

    #[error("invalid version constraint '{constraint}': {detail}")]
    InvalidConstraint { constraint: String, detail: String },

    #[error("network failure for '{target}': {detail}")]
    Network { target: String, detail: String },

    #[error("no stable version of '{source_id}' satisfies '{constraint}'")]
    NoMatchingVersion {
        source_id: String,
        constraint: String,
    },

    #[error("could not find an include directory with headers for '{name}' in {}", .slot.display())]
    UnresolvableIncludeRoot { name: String, slot: PathBuf },

    #[error("failed to write cache slot {}: {source}", .path.display())]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to link extern/{name}: {source} (try running with elevated privileges)")]
    Link {
        name: String,
        #[source]
        source: io::Error,
    },

    #[error("dependency '{0}' not found")]
    NotFound(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CgetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CgetError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn network(target: impl Into<String>, detail: impl ToString) -> Self {
        CgetError::Network {
            target: target.into(),
            detail: detail.to_string(),
        }
    }

    /// Precondition failures abort an operation before anything is written.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            CgetError::ManifestMissing(_)
                | CgetError::BadSourceFormat(_)
                | CgetError::InvalidName(_)
        )
    }
}

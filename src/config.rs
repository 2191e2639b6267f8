//! Runtime settings for a cget invocation.
//!
//! Every store and engine takes a [`Settings`] instead of looking at the
//! current directory, so a single process can operate on any project root.

use std::path::PathBuf;
use std::time::Duration;

pub const MANIFEST_FILE: &str = "cget.json";
pub const LOCK_FILE: &str = "cget.lock.json";
pub const CACHE_DIR: &str = ".cget_packages";
pub const EXTERN_DIR: &str = "extern";

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_GIT_HOST: &str = "github.com";

#[derive(Debug, Clone)]
pub struct Settings {
    pub project_root: PathBuf,
    pub cache_root: PathBuf,
    /// Base URL of the tag-listing API (GitHub compatible).
    pub api_url: String,
    pub git_host: String,
    pub token: Option<String>,
    pub http_timeout: Duration,
    pub retry_attempts: u32,
}

impl Settings {
    /// Defaults for a project rooted at `project_root`, cache inside the project.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        Self {
            cache_root: project_root.join(CACHE_DIR),
            project_root,
            api_url: DEFAULT_API_URL.to_string(),
            git_host: DEFAULT_GIT_HOST.to_string(),
            token: None,
            http_timeout: Duration::from_secs(30),
            retry_attempts: 3,
        }
    }

    /// Applies `CGET_CACHE_DIR`, `CGET_API_URL`, `CGET_GIT_HOST` and `GITHUB_TOKEN`.
    pub fn from_env(project_root: impl Into<PathBuf>) -> Self {
        Self::from_vars(project_root, |key| {
            std::env::var(key).ok().filter(|v| !v.trim().is_empty())
        })
    }

    /// Same as [`Settings::from_env`], reading variables through `var`.
    ///
    /// A relative cache directory is taken relative to the project root.
    pub fn from_vars(
        project_root: impl Into<PathBuf>,
        var: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let mut settings = Self::new(project_root);
        if let Some(dir) = var("CGET_CACHE_DIR") {
            settings.cache_root = settings.project_root.join(dir);
        }
        if let Some(url) = var("CGET_API_URL") {
            settings.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(host) = var("CGET_GIT_HOST") {
            settings.git_host = host;
        }
        settings.token = var("GITHUB_TOKEN");
        settings
    }

    pub fn with_cache_root(mut self, cache_root: impl Into<PathBuf>) -> Self {
        self.cache_root = cache_root.into();
        self
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.project_root.join(MANIFEST_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.project_root.join(LOCK_FILE)
    }

    pub fn extern_dir(&self) -> PathBuf {
        self.project_root.join(EXTERN_DIR)
    }

    /// `https://<host>/<owner>/<repo>.git`
    pub fn fetch_url(&self, source: &str) -> String {
        format!("https://{}/{}.git", self.git_host, source)
    }

    pub fn tags_url(&self, source: &str) -> String {
        format!("{}/repos/{}/tags", self.api_url, source)
    }

    pub fn is_project(&self) -> bool {
        self.manifest_path().exists()
    }
}

//! Shared fixtures for the integration tests: in-memory tag listings, a
//! fetcher that writes a tiny header tree, and throwaway project roots.

#![allow(dead_code)]

use cget::config::Settings;
use cget::deps::{Fetcher, InstallEngine};
use cget::error::{CgetError, Result};
use cget::resolve::{PAGE_SIZE, RetryPolicy, TagSource};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

#[derive(Default)]
pub struct FakeTags {
    repos: RefCell<HashMap<String, Vec<String>>>,
    pub requests: Cell<u32>,
}

impl FakeTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, source: &str, tags: &[&str]) -> Self {
        self.set(source, tags);
        self
    }

    pub fn set(&self, source: &str, tags: &[&str]) {
        self.repos.borrow_mut().insert(
            source.to_string(),
            tags.iter().map(|t| t.to_string()).collect(),
        );
    }
}

impl TagSource for FakeTags {
    fn list_page(&self, source: &str, page: u32) -> Result<Vec<String>> {
        self.requests.set(self.requests.get() + 1);
        let repos = self.repos.borrow();
        let Some(tags) = repos.get(source) else {
            return Err(CgetError::Network {
                target: source.to_string(),
                detail: "404 Not Found".to_string(),
            });
        };
        let start = (page as usize - 1) * PAGE_SIZE;
        Ok(tags.iter().skip(start).take(PAGE_SIZE).cloned().collect())
    }
}

/// Writes `include/<name>/<name>.hpp` containing the fetched tag.
#[derive(Default)]
pub struct FakeFetcher {
    pub calls: RefCell<Vec<(String, String)>>,
    failing: RefCell<HashSet<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, name: &str) {
        self.failing.borrow_mut().insert(name.to_string());
    }

    pub fn recover(&self, name: &str) {
        self.failing.borrow_mut().remove(name);
    }

    pub fn fetches_of(&self, name: &str) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, tag)| tag.clone())
            .collect()
    }

    pub fn total(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl Fetcher for FakeFetcher {
    fn fetch(&self, name: &str, _url: &str, tag: &str, dest: &Path) -> Result<()> {
        self.calls
            .borrow_mut()
            .push((name.to_string(), tag.to_string()));
        if self.failing.borrow().contains(name) {
            return Err(CgetError::Network {
                target: name.to_string(),
                detail: "connection reset".to_string(),
            });
        }
        let dir = dest.join("include").join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{name}.hpp")), format!("// {tag}\n")).unwrap();
        Ok(())
    }
}

pub fn project(manifest: &str) -> (tempfile::TempDir, Settings) {
    let dir = tempfile::tempdir().expect("Failed to create temp project");
    fs::write(dir.path().join("cget.json"), manifest).expect("Failed to write cget.json");
    let settings = Settings::new(dir.path());
    (dir, settings)
}

pub fn empty_project() -> (tempfile::TempDir, Settings) {
    project(r#"{ "name": "demo", "version": "0.1.0", "dependencies": [], "devDependencies": [] }"#)
}

pub fn engine<'a>(
    settings: &Settings,
    tags: &'a FakeTags,
    fetcher: &'a FakeFetcher,
) -> InstallEngine<&'a FakeTags, &'a FakeFetcher> {
    InstallEngine::new(settings, tags, fetcher)
        .with_retry(RetryPolicy::none())
        .with_platform("linux")
}

pub fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).expect("Failed to read document"))
        .expect("Document is not valid JSON")
}

/// Standard tag set: stable 1.x releases, a 2.0 release candidate and junk.
pub const TAGS: &[&str] = &["v1.0.0", "v1.2.0", "v2.0.0-rc1", "v1.5.0", "bogus"];

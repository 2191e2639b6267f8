//! Source fetching.
//!
//! A [`Fetcher`] materializes one tag of a repository into an empty directory.
//! The default [`GitFetcher`] does a depth-1 fetch of exactly that tag with
//! libgit2 and checks it out, then drops the `.git` directory so cache slots
//! hold plain source trees.

use crate::error::{CgetError, Result};
use colored::*;
use git2::{AutotagOption, FetchOptions, Repository};
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use std::fs;
use std::path::Path;

pub trait Fetcher {
    /// Fetches `tag` of the repository at `url` into the empty directory `dest`.
    fn fetch(&self, name: &str, url: &str, tag: &str, dest: &Path) -> Result<()>;
}

impl<T: Fetcher + ?Sized> Fetcher for &T {
    fn fetch(&self, name: &str, url: &str, tag: &str, dest: &Path) -> Result<()> {
        (**self).fetch(name, url, tag, dest)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GitFetcher;

impl Fetcher for GitFetcher {
    fn fetch(&self, name: &str, url: &str, tag: &str, dest: &Path) -> Result<()> {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.blue} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⣾⣽⣻⢿⡿⣟⣯⣷"),
        );
        pb.set_message(format!("Downloading {}@{}...", name, tag));
        pb.enable_steady_tick(std::time::Duration::from_millis(100));

        match shallow_checkout(url, tag, dest) {
            Ok(()) => {
                pb.finish_with_message(format!("{} Downloaded {}@{}", "✓".green(), name, tag));
                Ok(())
            }
            Err(err) => {
                pb.finish_with_message(format!("{} Failed {}", "x".red(), name));
                Err(CgetError::network(name, format!("cloning {} at {}: {}", url, tag, err)))
            }
        }
    }
}

fn shallow_checkout(url: &str, tag: &str, dest: &Path) -> std::result::Result<(), git2::Error> {
    let repo = Repository::init(dest)?;
    let mut remote = repo.remote_anonymous(url)?;

    let refspec = format!("+refs/tags/{tag}:refs/tags/{tag}");
    let mut opts = FetchOptions::new();
    opts.depth(1);
    opts.download_tags(AutotagOption::None);
    debug!("fetching {} from {}", refspec, url);
    remote.fetch(&[refspec.as_str()], Some(&mut opts), None)?;

    let commit_id = repo
        .find_reference(&format!("refs/tags/{}", tag))?
        .peel_to_commit()?
        .id();
    repo.set_head_detached(commit_id)?;
    let mut checkout = git2::build::CheckoutBuilder::new();
    checkout.force();
    repo.checkout_head(Some(&mut checkout))?;
    drop(remote);
    drop(repo);

    let git_dir = dest.join(".git");
    if git_dir.exists() {
        fs::remove_dir_all(&git_dir)
            .map_err(|e| git2::Error::from_str(&format!("removing .git: {}", e)))?;
    }
    Ok(())
}

//! Version resolution against remote tag lists.
//!
//! A constraint such as `>=1.2,<2.0` is matched against every stable semver
//! tag of a repository and the highest match wins. Tags are listed through a
//! [`TagSource`], which keeps the HTTP transport swappable.

use crate::config::Settings;
use crate::error::{CgetError, Result};
use crate::manifest::LATEST;
use log::{debug, trace, warn};
use semver::{Comparator, Op, Version, VersionReq};
use serde::Deserialize;
use std::time::Duration;

/// Tags requested per page from the listing endpoint.
pub const PAGE_SIZE: usize = 100;

/// One page of a repository's tag names. Page numbers start at 1; an empty
/// page marks the end of the list.
pub trait TagSource {
    fn list_page(&self, source: &str, page: u32) -> Result<Vec<String>>;
}

impl<T: TagSource + ?Sized> TagSource for &T {
    fn list_page(&self, source: &str, page: u32) -> Result<Vec<String>> {
        (**self).list_page(source, page)
    }
}

#[derive(Deserialize, Debug)]
struct RemoteTag {
    name: String,
}

/// GitHub `GET /repos/{owner}/{repo}/tags` client.
pub struct GithubTags {
    agent: ureq::Agent,
    settings: Settings,
}

impl GithubTags {
    pub fn new(settings: &Settings) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(settings.http_timeout))
            .build()
            .into();
        Self {
            agent,
            settings: settings.clone(),
        }
    }
}

impl TagSource for GithubTags {
    fn list_page(&self, source: &str, page: u32) -> Result<Vec<String>> {
        let url = self.settings.tags_url(source);
        trace!("GET {} page={}", url, page);

        let mut request = self
            .agent
            .get(&url)
            .query("per_page", PAGE_SIZE.to_string())
            .query("page", page.to_string())
            .header("User-Agent", "cget")
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.settings.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let mut response = request
            .call()
            .map_err(|e| CgetError::network(source, format!("listing tags: {}", e)))?;
        let tags: Vec<RemoteTag> = response
            .body_mut()
            .read_json()
            .map_err(|e| CgetError::network(source, format!("malformed tag list: {}", e)))?;
        Ok(tags.into_iter().map(|t| t.name).collect())
    }
}

/// Bounded exponential backoff for idempotent reads.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            attempts: 1,
            base_delay: Duration::ZERO,
        }
    }

    /// Runs `op`, retrying network failures only.
    fn run<T>(&self, what: &str, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Err(err @ CgetError::Network { .. }) if attempt < attempts => {
                    let delay = self.base_delay * 2u32.saturating_pow(attempt - 1);
                    warn!("{} failed (attempt {}/{}): {}", what, attempt, attempts, err);
                    std::thread::sleep(delay);
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

/// A concrete version plus the tag it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub version: Version,
    pub tag: String,
}

impl Resolved {
    /// Rebuilds a pin from a lock entry; the tag defaults to `v<version>`.
    pub fn from_pin(version: &str, tag: Option<&str>) -> Option<Self> {
        let version = Version::parse(version).ok()?;
        let tag = tag
            .map(str::to_string)
            .unwrap_or_else(|| format!("v{}", version));
        Some(Self { version, tag })
    }
}

pub struct VersionResolver<T> {
    tags: T,
    retry: RetryPolicy,
}

impl<T: TagSource> VersionResolver<T> {
    pub fn new(tags: T) -> Self {
        Self {
            tags,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Every tag of `source`, page by page until an empty page comes back.
    pub fn list_tags(&self, source: &str) -> Result<Vec<String>> {
        let mut all = Vec::new();
        let mut page = 1;
        loop {
            let what = format!("tag listing for {} (page {})", source, page);
            let batch = self.retry.run(&what, || self.tags.list_page(source, page))?;
            if batch.is_empty() {
                break;
            }
            all.extend(batch);
            page += 1;
        }
        debug!("{}: {} tags across {} pages", source, all.len(), page - 1);
        Ok(all)
    }

    pub fn resolve(&self, source: &str, constraint: &str) -> Result<Resolved> {
        let parsed = parse_constraint(constraint)?;
        let tags = self.list_tags(source)?;
        select(&tags, &parsed).ok_or_else(|| CgetError::NoMatchingVersion {
            source_id: source.to_string(),
            constraint: constraint.to_string(),
        })
    }
}

/// A version constraint from the manifest.
///
/// Clauses are comma separated and all must hold. Semver requirements
/// (`>=1.2`, `<2.0`, `^1.4`, `~1.4`) are used as-is; the PEP 440 operators
/// `==`, `~=` and `!=` are translated, and a bare `X.Y.Z` is exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    req: VersionReq,
    excluded: Vec<VersionReq>,
}

impl Constraint {
    pub fn any() -> Self {
        Self {
            req: VersionReq::STAR,
            excluded: Vec::new(),
        }
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.req.matches(version) && !self.excluded.iter().any(|ex| ex.matches(version))
    }
}

/// Parses a constraint; `latest`, `*` and the empty string mean any version.
pub fn parse_constraint(raw: &str) -> Result<Constraint> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "*" || trimmed.eq_ignore_ascii_case(LATEST) {
        return Ok(Constraint::any());
    }
    let invalid = |detail: String| CgetError::InvalidConstraint {
        constraint: raw.to_string(),
        detail,
    };

    let mut comparators = Vec::new();
    let mut excluded = Vec::new();
    for clause in trimmed.split(',').map(str::trim) {
        if clause.is_empty() {
            return Err(invalid("empty clause".to_string()));
        }
        if let Some(rest) = clause.strip_prefix("==") {
            comparators.extend(pinned(rest.trim()).map_err(invalid)?.comparators);
        } else if let Some(rest) = clause.strip_prefix("!=") {
            excluded.push(pinned(rest.trim()).map_err(invalid)?);
        } else if let Some(rest) = clause.strip_prefix("~=") {
            comparators.extend(compatible(rest.trim()).map_err(invalid)?);
        } else if let Ok(version) = Version::parse(clause.trim_start_matches('v')) {
            comparators.push(bound(Op::Exact, &version));
        } else {
            let req = VersionReq::parse(clause).map_err(|e| invalid(e.to_string()))?;
            comparators.extend(req.comparators);
        }
    }

    Ok(Constraint {
        req: VersionReq { comparators },
        excluded,
    })
}

/// `1.2` is exactly `1.2.0`; `1.2.*` is any `1.2.x`.
fn pinned(text: &str) -> std::result::Result<VersionReq, String> {
    if let Some(prefix) = text.strip_suffix(".*") {
        return VersionReq::parse(&format!("={}", prefix.trim_start_matches('v')))
            .map_err(|e| e.to_string());
    }
    let version = parse_tag(text).ok_or_else(|| format!("'{}' is not a version", text))?;
    Ok(VersionReq {
        comparators: vec![bound(Op::Exact, &version)],
    })
}

/// `~=1.2` is `>=1.2.0, <2.0.0`; `~=1.2.3` is `>=1.2.3, <1.3.0`.
fn compatible(text: &str) -> std::result::Result<Vec<Comparator>, String> {
    let version = parse_tag(text).ok_or_else(|| format!("'{}' is not a version", text))?;
    let upper = match text.trim_start_matches('v').split('.').count() {
        2 => Version::new(version.major + 1, 0, 0),
        3 => Version::new(version.major, version.minor + 1, 0),
        _ => return Err(format!("'~={}' needs two or three version components", text)),
    };
    Ok(vec![bound(Op::GreaterEq, &version), bound(Op::Less, &upper)])
}

fn bound(op: Op, version: &Version) -> Comparator {
    Comparator {
        op,
        major: version.major,
        minor: Some(version.minor),
        patch: Some(version.patch),
        pre: version.pre.clone(),
    }
}

/// Tag name to version: strips a leading `v` and pads `1` / `1.2` with zeros.
pub fn parse_tag(tag: &str) -> Option<Version> {
    let clean = tag.strip_prefix('v').or_else(|| tag.strip_prefix('V')).unwrap_or(tag);
    if let Ok(version) = Version::parse(clean) {
        return Some(version);
    }

    let parts: Vec<&str> = clean.split('.').collect();
    let numeric = parts
        .iter()
        .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
    if !numeric || parts.len() > 2 {
        return None;
    }
    let padded = match parts.len() {
        1 => format!("{}.0.0", clean),
        _ => format!("{}.0", clean),
    };
    Version::parse(&padded).ok()
}

/// Highest stable version among `tags` matching `constraint`.
pub fn select(tags: &[String], constraint: &Constraint) -> Option<Resolved> {
    let mut best: Option<Resolved> = None;
    for tag in tags {
        let Some(version) = parse_tag(tag) else {
            trace!("ignoring non-semver tag {}", tag);
            continue;
        };
        if !version.pre.is_empty() || !constraint.matches(&version) {
            continue;
        }
        if best.as_ref().is_none_or(|b| version > b.version) {
            best = Some(Resolved {
                version,
                tag: tag.clone(),
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct PagedTags {
        tags: Vec<String>,
        requests: Cell<u32>,
        failures_left: Cell<u32>,
    }

    impl PagedTags {
        fn new(tags: &[&str]) -> Self {
            Self {
                tags: tags.iter().map(|t| t.to_string()).collect(),
                requests: Cell::new(0),
                failures_left: Cell::new(0),
            }
        }
    }

    impl TagSource for PagedTags {
        fn list_page(&self, source: &str, page: u32) -> Result<Vec<String>> {
            self.requests.set(self.requests.get() + 1);
            if self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Err(CgetError::network(source, "connection reset"));
            }
            let start = (page as usize - 1) * PAGE_SIZE;
            Ok(self.tags.iter().skip(start).take(PAGE_SIZE).cloned().collect())
        }
    }

    const SAMPLE: &[&str] = &["v1.0.0", "v1.2.0", "v2.0.0-rc1", "v1.5.0", "bogus"];

    #[test]
    fn test_resolve_picks_highest_stable_match() {
        let resolver = VersionResolver::new(PagedTags::new(SAMPLE));
        let resolved = resolver.resolve("owner/repo", ">=1.0,<2.0").unwrap();
        assert_eq!(resolved.version, Version::new(1, 5, 0));
        assert_eq!(resolved.tag, "v1.5.0");
    }

    #[test]
    fn test_resolve_no_match() {
        let resolver = VersionResolver::new(PagedTags::new(SAMPLE));
        let err = resolver.resolve("owner/repo", ">=3.0").unwrap_err();
        assert!(matches!(err, CgetError::NoMatchingVersion { .. }));
    }

    #[test]
    fn test_latest_excludes_prerelease() {
        let resolver = VersionResolver::new(PagedTags::new(SAMPLE));
        let resolved = resolver.resolve("owner/repo", "latest").unwrap();
        assert_eq!(resolved.version, Version::new(1, 5, 0));
    }

    #[test]
    fn test_pagination_reads_until_empty_page() {
        let tags: Vec<String> = (0..250).map(|i| format!("v0.{}.0", i)).collect();
        let refs: Vec<&str> = tags.iter().map(String::as_str).collect();
        let source = PagedTags::new(&refs);
        let resolver = VersionResolver::new(&source);
        assert_eq!(resolver.list_tags("o/r").unwrap().len(), 250);
        assert_eq!(source.requests.get(), 4);

        let resolved = resolver.resolve("o/r", "latest").unwrap();
        assert_eq!(resolved.version, Version::new(0, 249, 0));
    }

    #[test]
    fn test_listing_retries_network_failures() {
        let source = PagedTags::new(SAMPLE);
        source.failures_left.set(2);
        let resolver = VersionResolver::new(&source).with_retry(RetryPolicy {
            attempts: 3,
            base_delay: Duration::ZERO,
        });
        assert_eq!(resolver.list_tags("o/r").unwrap().len(), 5);
    }

    #[test]
    fn test_listing_failure_is_fatal() {
        let source = PagedTags::new(SAMPLE);
        source.failures_left.set(5);
        let resolver = VersionResolver::new(&source).with_retry(RetryPolicy::none());
        let err = resolver.resolve("o/r", "latest").unwrap_err();
        assert!(matches!(err, CgetError::Network { .. }));
        assert_eq!(source.requests.get(), 1);
    }

    #[test]
    fn test_parse_tag_variants() {
        assert_eq!(parse_tag("v3.11.2"), Some(Version::new(3, 11, 2)));
        assert_eq!(parse_tag("10.2.1"), Some(Version::new(10, 2, 1)));
        assert_eq!(parse_tag("v2.4"), Some(Version::new(2, 4, 0)));
        assert_eq!(parse_tag("7"), Some(Version::new(7, 0, 0)));
        assert_eq!(parse_tag("release-1.0"), None);
        assert_eq!(parse_tag("bogus"), None);
        assert_eq!(parse_tag("1.2.3.4"), None);
    }

    #[test]
    fn test_parse_constraint_forms() {
        assert_eq!(parse_constraint("latest").unwrap(), Constraint::any());
        assert_eq!(parse_constraint("").unwrap(), Constraint::any());

        let exact = parse_constraint("1.2.3").unwrap();
        assert!(exact.matches(&Version::new(1, 2, 3)));
        assert!(!exact.matches(&Version::new(1, 2, 4)));

        let ranged = parse_constraint(">=1.0, <2.0").unwrap();
        assert!(ranged.matches(&Version::new(1, 9, 9)));
        assert!(!ranged.matches(&Version::new(2, 0, 0)));

        assert!(matches!(
            parse_constraint(">=banana"),
            Err(CgetError::InvalidConstraint { .. })
        ));
        assert!(matches!(
            parse_constraint(">=1.0,"),
            Err(CgetError::InvalidConstraint { .. })
        ));
    }

    #[test]
    fn test_double_equals_is_exact() {
        let eq = parse_constraint("==1.2").unwrap();
        assert!(eq.matches(&Version::new(1, 2, 0)));
        assert!(!eq.matches(&Version::new(1, 2, 5)));

        let wildcard = parse_constraint("==1.2.*").unwrap();
        assert!(wildcard.matches(&Version::new(1, 2, 5)));
        assert!(!wildcard.matches(&Version::new(1, 3, 0)));
    }

    #[test]
    fn test_compatible_release() {
        let minor = parse_constraint("~=1.2").unwrap();
        assert!(minor.matches(&Version::new(1, 2, 0)));
        assert!(minor.matches(&Version::new(1, 9, 3)));
        assert!(!minor.matches(&Version::new(2, 0, 0)));
        assert!(!minor.matches(&Version::new(1, 1, 9)));

        let patch = parse_constraint("~=1.2.3").unwrap();
        assert!(patch.matches(&Version::new(1, 2, 7)));
        assert!(!patch.matches(&Version::new(1, 3, 0)));

        assert!(matches!(
            parse_constraint("~=1"),
            Err(CgetError::InvalidConstraint { .. })
        ));
    }

    #[test]
    fn test_not_equal_excludes() {
        let tags: Vec<String> = ["v1.0.0", "v1.2.0", "v1.5.0"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        let constraint = parse_constraint(">=1.0,!=1.5.0").unwrap();
        assert_eq!(select(&tags, &constraint).unwrap().version, Version::new(1, 2, 0));

        let only_excluded = parse_constraint("!=1.5").unwrap();
        assert!(only_excluded.matches(&Version::new(1, 2, 0)));
        assert!(!only_excluded.matches(&Version::new(1, 5, 0)));

        let minor_excluded = parse_constraint("~=1.0, !=1.5.*").unwrap();
        assert_eq!(select(&tags, &minor_excluded).unwrap().version, Version::new(1, 2, 0));
    }

    #[test]
    fn test_duplicate_versions_keep_first_tag() {
        let tags = vec!["1.0.0".to_string(), "v1.0.0".to_string()];
        let resolved = select(&tags, &Constraint::any()).unwrap();
        assert_eq!(resolved.tag, "1.0.0");
    }

    #[test]
    fn test_resolved_from_pin() {
        let pin = Resolved::from_pin("1.5.0", None).unwrap();
        assert_eq!(pin.tag, "v1.5.0");
        let pin = Resolved::from_pin("1.5.0", Some("1.5.0")).unwrap();
        assert_eq!(pin.tag, "1.5.0");
        assert!(Resolved::from_pin("nope", None).is_none());
    }
}

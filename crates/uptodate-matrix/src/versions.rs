//! Version Resolver: filtering, ordering and windowing of candidate
//! version strings.

use std::collections::BTreeSet;

use regex::Regex;
use tracing::{debug, warn};
use uptodate_common::error::{Result, UptodateError};

/// User policy applied to a list of candidate versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionPolicy {
    /// Regular expressions; a candidate must match at least one. An empty
    /// list matches everything.
    pub filters: Vec<String>,
    /// First version to emit (inclusive).
    pub start_at: Option<String>,
    /// Last version to scan (inclusive).
    pub end_at: Option<String>,
    /// Versions never emitted, unless also included.
    pub skips: BTreeSet<String>,
    /// Versions always emitted when present.
    pub includes: BTreeSet<String>,
}

impl VersionPolicy {
    /// Policy that keeps every candidate.
    #[must_use]
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Uses `filter` when no filter is set.
    #[must_use]
    pub fn with_default_filter(mut self, filter: &str) -> Self {
        if self.filters.iter().all(|f| f.is_empty()) {
            self.filters = vec![filter.to_string()];
        }
        self
    }

    /// Compiles the filters into one alternation; `None` matches all.
    ///
    /// # Errors
    ///
    /// Returns [`UptodateError::Config`] if a pattern is invalid.
    pub fn compile_filter(&self) -> Result<Option<Regex>> {
        let patterns: Vec<String> = self
            .filters
            .iter()
            .filter(|f| !f.is_empty())
            .map(|f| format!("(?:{f})"))
            .collect();
        if patterns.is_empty() {
            return Ok(None);
        }
        Regex::new(&patterns.join("|"))
            .map(Some)
            .map_err(|e| UptodateError::config(format!("invalid version filter: {e}")))
    }

    /// Applies the policy to `candidates`.
    ///
    /// Candidates are sorted ascending when every one of them is a strict
    /// semantic version, otherwise kept in input order. `includes` bypass
    /// every other rule. A `start_at` that names no candidate is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`UptodateError::Config`] if a filter is invalid.
    pub fn resolve(&self, candidates: &[String]) -> Result<Vec<String>> {
        let filter = self.compile_filter()?;
        let sorted = sort_candidates(candidates);

        let start_at = self.start_at.as_deref().filter(|s| !s.is_empty());
        let end_at = self.end_at.as_deref().filter(|s| !s.is_empty());
        let mut gate_open = match start_at {
            None => true,
            Some(start) if !sorted.iter().any(|c| c == start) => {
                warn!(start_at = start, "start version not among candidates, ignoring it");
                true
            }
            Some(_) => false,
        };

        let mut stopped = false;
        let mut emitted = Vec::new();
        for candidate in sorted {
            let is_end = end_at == Some(candidate.as_str());
            if self.includes.contains(&candidate) {
                emitted.push(candidate);
                stopped |= is_end;
                continue;
            }
            if stopped {
                continue;
            }
            if start_at == Some(candidate.as_str()) {
                gate_open = true;
            }
            let matches = filter.as_ref().is_none_or(|re| re.is_match(&candidate));
            if gate_open && matches && !self.skips.contains(&candidate) {
                emitted.push(candidate);
            }
            stopped |= is_end;
        }
        debug!(count = emitted.len(), "resolved versions");
        Ok(emitted)
    }
}

/// Sorts ascending by semantic version when every candidate parses as
/// one; otherwise returns the input order.
#[must_use]
pub fn sort_candidates(candidates: &[String]) -> Vec<String> {
    let parsed: Option<Vec<(semver::Version, &String)>> = candidates
        .iter()
        .map(|c| semver::Version::parse(c).ok().map(|v| (v, c)))
        .collect();
    match parsed {
        Some(mut versions) if !versions.is_empty() => {
            versions.sort_by(|a, b| a.0.cmp(&b.0));
            versions.into_iter().map(|(_, c)| c.clone()).collect()
        }
        _ => candidates.to_vec(),
    }
}

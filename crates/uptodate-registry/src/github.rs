//! Releases and commits from the GitHub REST API.

use serde::Deserialize;
use uptodate_common::error::Result;

use crate::http::{HttpClient, github_headers};
use crate::{Commit, Release, SourceHost};

#[derive(Debug, Deserialize)]
struct ReleaseRecord {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tag_name: String,
}

impl From<ReleaseRecord> for Release {
    fn from(record: ReleaseRecord) -> Self {
        let name = record
            .name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| record.tag_name.clone());
        Self {
            name,
            tag_name: record.tag_name,
        }
    }
}

/// [`SourceHost`] backed by the GitHub v3 API.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    api: String,
    token: Option<String>,
    http: HttpClient,
}

impl GitHubClient {
    /// Creates a client rooted at `api`, authenticating with `token` when set.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api: impl Into<String>, token: Option<String>) -> Result<Self> {
        Ok(Self {
            api: api.into().trim_end_matches('/').to_string(),
            token,
            http: HttpClient::new()?,
        })
    }
}

impl SourceHost for GitHubClient {
    fn list_releases(&self, repository: &str) -> Result<Vec<Release>> {
        let url = format!("{}/repos/{repository}/releases", self.api);
        let records: Option<Vec<ReleaseRecord>> = self
            .http
            .get_json(&url, github_headers(self.token.as_deref()))?;
        Ok(records
            .unwrap_or_default()
            .into_iter()
            .map(Release::from)
            .collect())
    }

    fn list_commits(&self, repository: &str, branch: &str) -> Result<Vec<Commit>> {
        let url = format!("{}/repos/{repository}/commits?sha={branch}", self.api);
        let commits: Option<Vec<Commit>> = self
            .http
            .get_json(&url, github_headers(self.token.as_deref()))?;
        Ok(commits.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_name_falls_back_to_tag() {
        let records: Vec<ReleaseRecord> = serde_json::from_str(
            r#"[{"name": "", "tag_name": "v2.0.0"}, {"name": "Release 1", "tag_name": "v1.0.0"}]"#,
        )
        .expect("decode");
        let releases: Vec<Release> = records.into_iter().map(Release::from).collect();
        assert_eq!(releases[0].name, "v2.0.0");
        assert_eq!(releases[1].name, "Release 1");
    }

    #[test]
    fn commits_decode_sha_only() {
        let commits: Vec<Commit> = serde_json::from_str(
            r#"[{"sha": "0123abcd", "commit": {"message": "fix"}}]"#,
        )
        .expect("decode");
        assert_eq!(commits[0].sha, "0123abcd");
    }
}

//! Registry lookups through the crane web front-end.
//!
//! `GET <api>/ls/<repo>` lists tags (one per line), `GET <api>/config/<ref>`
//! returns the image config blob and `GET <api>/digest/<ref>` the manifest
//! digest.

use std::collections::BTreeMap;

use reqwest::header::HeaderMap;
use serde::Deserialize;
use uptodate_common::error::Result;
use uptodate_common::types::Digest;

use crate::Registry;
use crate::http::HttpClient;

/// The subset of an OCI image config that carries labels.
#[derive(Debug, Default, Deserialize)]
pub struct ImageConfig {
    /// Runtime configuration section.
    #[serde(default)]
    pub config: Option<RuntimeConfig>,
}

/// Runtime configuration of an image.
#[derive(Debug, Default, Deserialize)]
pub struct RuntimeConfig {
    /// Image labels.
    #[serde(rename = "Labels", default)]
    pub labels: Option<BTreeMap<String, String>>,
}

impl ImageConfig {
    /// Consumes the config and returns its labels.
    #[must_use]
    pub fn into_labels(self) -> BTreeMap<String, String> {
        self.config.and_then(|c| c.labels).unwrap_or_default()
    }
}

/// [`Registry`] backed by the crane web front-end.
#[derive(Debug, Clone)]
pub struct CraneRegistry {
    api: String,
    http: HttpClient,
}

impl CraneRegistry {
    /// Creates a registry client rooted at `api`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api: impl Into<String>) -> Result<Self> {
        Ok(Self {
            api: api.into().trim_end_matches('/').to_string(),
            http: HttpClient::new()?,
        })
    }

    fn url(&self, command: &str, reference: &str) -> String {
        format!("{}/{command}/{reference}", self.api)
    }
}

/// Splits a newline-separated tag listing, dropping blank lines.
#[must_use]
pub fn parse_tag_listing(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

impl Registry for CraneRegistry {
    fn list_tags(&self, repository: &str) -> Result<Vec<String>> {
        let url = self.url("ls", repository);
        let tags = self
            .http
            .get_text(&url, HeaderMap::new())?
            .map(|body| parse_tag_listing(&body))
            .unwrap_or_default();
        tracing::debug!(repository, count = tags.len(), "listed tags");
        Ok(tags)
    }

    fn image_labels(&self, reference: &str) -> Result<BTreeMap<String, String>> {
        let url = self.url("config", reference);
        let Some(body) = self.http.get_text(&url, HeaderMap::new())? else {
            return Ok(BTreeMap::new());
        };
        // An unreadable config means unknown state, which callers rebuild.
        match serde_json::from_str::<ImageConfig>(&body) {
            Ok(config) => Ok(config.into_labels()),
            Err(e) => {
                tracing::warn!(reference, error = %e, "unreadable image config");
                Ok(BTreeMap::new())
            }
        }
    }

    fn resolve_digest(&self, reference: &str) -> Result<Option<Digest>> {
        let url = self.url("digest", reference);
        let Some(body) = self.http.get_text(&url, HeaderMap::new())? else {
            return Ok(None);
        };
        match Digest::parse(body.trim()) {
            Ok(digest) => Ok(Some(digest)),
            Err(e) => {
                tracing::warn!(reference, error = %e, "registry returned no usable digest");
                Ok(None)
            }
        }
    }
}

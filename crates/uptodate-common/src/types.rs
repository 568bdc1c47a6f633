//! Domain primitive types used across the uptodate workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TAG;
use crate::error::{Result, UptodateError};

/// A container image reference split into `repository[:tag][@digest]`.
///
/// A `:` only starts a tag when it comes after the last `/`, so registry
/// ports (`localhost:5000/app`) stay part of the repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    /// Registry host and repository path, e.g. `ghcr.io/org/app`.
    pub repository: String,
    /// Explicit tag, if present.
    pub tag: Option<String>,
    /// Explicit digest, if present.
    pub digest: Option<String>,
}

impl ImageRef {
    /// Splits a reference string into its parts. Never fails; an empty
    /// repository is left for callers to reject.
    #[must_use]
    pub fn parse(reference: &str) -> Self {
        let reference = reference.trim();
        let (name, digest) = match reference.split_once('@') {
            Some((name, digest)) => (name, Some(digest.to_string())),
            None => (reference, None),
        };
        let slash = name.rfind('/').map_or(0, |i| i + 1);
        let (repository, tag) = match name[slash..].find(':') {
            Some(colon) => {
                let colon = slash + colon;
                (&name[..colon], Some(name[colon + 1..].to_string()))
            }
            None => (name, None),
        };
        Self {
            repository: repository.to_string(),
            tag,
            digest,
        }
    }

    /// Returns the tag, or `latest` when none was given.
    #[must_use]
    pub fn tag_or_default(&self) -> &str {
        self.tag.as_deref().unwrap_or(DEFAULT_TAG)
    }

    /// Returns `repository:tag` with the default tag filled in.
    #[must_use]
    pub fn tagged(&self) -> String {
        format!("{}:{}", self.repository, self.tag_or_default())
    }

    /// Returns `repository:tag@digest` pinned to `digest`.
    #[must_use]
    pub fn pinned(&self, digest: &Digest) -> String {
        format!("{}@{digest}", self.tagged())
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repository)?;
        if let Some(tag) = &self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(digest) = &self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

/// Returns whether an image reference depends on build-time substitution.
#[must_use]
pub fn is_templated(reference: &str) -> bool {
    reference.contains('$')
}

/// Content-addressed image digest of the form `<algorithm>:<hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest(String);

impl Digest {
    /// Parses a digest string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not `<algorithm>:<hex>`.
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        let trimmed = value.trim();
        let valid = trimmed.split_once(':').is_some_and(|(algo, hex)| {
            !algo.is_empty()
                && algo.chars().all(|c| c.is_ascii_alphanumeric())
                && !hex.is_empty()
                && hex.chars().all(|c| c.is_ascii_hexdigit())
        });
        if !valid {
            return Err(UptodateError::config(format!(
                "invalid image digest: {value}"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the digest string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a build variable takes part in naming the image it builds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingRole {
    /// Contributes `-<slug>-<value>` to the container name.
    Container,
    /// Contributes `<slug>-<value>` to the image tag.
    Tag,
    /// Passed as a build arg only.
    #[default]
    Manual,
}

impl fmt::Display for NamingRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container => write!(f, "container"),
            Self::Tag => write!(f, "tag"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// One file-level record handed to the pipeline output channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Display name (usually the path).
    pub name: String,
    /// Path of the file the record is about.
    pub filename: String,
    /// Command that produced the record.
    pub parser: String,
    /// Extra identifier, e.g. a tag or a change action.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
}

impl FileRecord {
    /// Creates a record named after `filename`.
    pub fn new(filename: impl Into<String>, parser: impl Into<String>) -> Self {
        let filename = filename.into();
        Self {
            name: filename.clone(),
            filename,
            parser: parser.into(),
            identifier: None,
        }
    }

    /// Attaches an identifier.
    #[must_use]
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

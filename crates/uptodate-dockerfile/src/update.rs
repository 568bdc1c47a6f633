//! Pending rewrites of `FROM` statements.
//!
//! An [`Update`] records the statement it replaces by source span so the
//! writer can apply every update of a file in one pass against the
//! original line array.

use serde::Serialize;
use tracing::{debug, info, warn};
use uptodate_common::error::Result;
use uptodate_common::types::{ImageRef, is_templated};
use uptodate_registry::Registry;

use crate::parser::ast::{BuildFile, Instruction};

/// One pending rewrite of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Update {
    /// Instruction keyword of the rewritten line.
    pub keyword: String,
    /// Flags carried over unchanged.
    pub flags: Vec<String>,
    /// Arguments before the rewrite.
    pub original: String,
    /// Arguments after the rewrite.
    pub updated: String,
    /// 0-based first line in the original file.
    pub line_index: usize,
    /// 0-based last line in the original file.
    pub end_index: usize,
}

impl Update {
    /// Builds an update replacing the arguments of `instruction`.
    #[must_use]
    pub fn replacing(instruction: &Instruction, updated: String) -> Self {
        Self {
            keyword: instruction.keyword.clone(),
            flags: instruction.flags.clone(),
            original: instruction.joined_args(),
            updated,
            line_index: instruction.start_index(),
            end_index: instruction.end_index(),
        }
    }

    /// The reconstructed source line.
    #[must_use]
    pub fn line(&self) -> String {
        let mut parts = Vec::with_capacity(self.flags.len() + 2);
        parts.push(self.keyword.as_str());
        parts.extend(self.flags.iter().map(String::as_str));
        parts.push(self.updated.as_str());
        parts.join(" ")
    }
}

/// Resolves an image reference to its pinned `repository:tag@digest` form.
///
/// Returns `None` for templated references, for references carrying a
/// digest but no tag, and when the registry does not know the tag.
///
/// # Errors
///
/// Propagates registry transport errors.
pub fn resolve_reference(reference: &str, registry: &dyn Registry) -> Result<Option<String>> {
    if is_templated(reference) {
        debug!(reference, "skipping templated image reference");
        return Ok(None);
    }
    let image = ImageRef::parse(reference);
    if image.repository.is_empty() {
        return Ok(None);
    }
    if image.tag.is_none() {
        if image.digest.is_some() {
            warn!(reference, "image has a digest but no tag, cannot be looked up");
            return Ok(None);
        }
        warn!(reference, "no tag specified, defaulting to latest");
    }

    let tagged = image.tagged();
    match registry.resolve_digest(&tagged)? {
        Some(digest) => Ok(Some(image.pinned(&digest))),
        None => {
            info!(reference = %tagged, "cannot find digest for image");
            Ok(None)
        }
    }
}

/// Computes the update for one `FROM` instruction, if any.
///
/// # Errors
///
/// Propagates registry transport errors.
pub fn resolve_from(instruction: &Instruction, registry: &dyn Registry) -> Result<Option<Update>> {
    let Some((image, extras)) = instruction.args.split_first() else {
        return Ok(None);
    };
    let Some(pinned) = resolve_reference(image, registry)? else {
        return Ok(None);
    };

    let updated = std::iter::once(pinned.as_str())
        .chain(extras.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");
    if updated == instruction.joined_args() {
        debug!(image = %image, "already pinned to the newest digest");
        return Ok(None);
    }
    Ok(Some(Update::replacing(instruction, updated)))
}

/// Computes updates for every `FROM` of `file`.
///
/// # Errors
///
/// Propagates registry transport errors.
pub fn resolve_froms(file: &BuildFile, registry: &dyn Registry) -> Result<Vec<Update>> {
    let mut updates = Vec::new();
    for from in file.froms() {
        if let Some(update) = resolve_from(from, registry)? {
            updates.push(update);
        }
    }
    Ok(updates)
}

/// Rewrites every `FROM` of `repository` to `repository:tag`, dropping
/// any pinned digest. Templated references are left alone.
#[must_use]
pub fn replace_froms(file: &BuildFile, repository: &str, tag: &str) -> Vec<Update> {
    file.froms()
        .filter_map(|from| {
            let (image, extras) = from.args.split_first()?;
            if is_templated(image) || ImageRef::parse(image).repository != repository {
                return None;
            }
            let updated = std::iter::once(format!("{repository}:{tag}"))
                .chain(extras.iter().cloned())
                .collect::<Vec<_>>()
                .join(" ");
            Some(Update::replacing(from, updated))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use uptodate_registry::memory::InMemoryRegistry;

    use super::*;

    const DIGEST: &str = "sha256:abc";

    fn registry() -> InMemoryRegistry {
        InMemoryRegistry::new()
            .with_digest("ubuntu:20.04", DIGEST)
            .with_digest("alpine:latest", "sha256:def")
    }

    fn parse(content: &str) -> BuildFile {
        BuildFile::parse("Dockerfile", content).expect("should parse")
    }

    #[test]
    fn resolve_from_pins_digest() {
        let file = parse("FROM ubuntu:20.04\n");
        let updates = resolve_froms(&file, &registry()).expect("should resolve");
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].line(), "FROM ubuntu:20.04@sha256:abc");
        assert_eq!(updates[0].original, "ubuntu:20.04");
        assert_eq!(updates[0].line_index, 0);
    }

    #[test]
    fn resolve_from_already_pinned_is_noop() {
        let file = parse("FROM ubuntu:20.04@sha256:abc\n");
        let updates = resolve_froms(&file, &registry()).expect("should resolve");
        assert!(updates.is_empty());
    }

    #[test]
    fn resolve_from_stale_digest_is_replaced() {
        let file = parse("FROM ubuntu:20.04@sha256:0000 AS base\n");
        let updates = resolve_froms(&file, &registry()).expect("should resolve");
        assert_eq!(updates[0].updated, "ubuntu:20.04@sha256:abc AS base");
    }

    #[test]
    fn resolve_from_keeps_flags_and_stage_name() {
        let file = parse("FROM --platform=linux/arm64 ubuntu:20.04 AS build\n");
        let updates = resolve_froms(&file, &registry()).expect("should resolve");
        assert_eq!(
            updates[0].line(),
            "FROM --platform=linux/arm64 ubuntu:20.04@sha256:abc AS build"
        );
    }

    #[test]
    fn resolve_from_untagged_defaults_to_latest() {
        let file = parse("FROM alpine\n");
        let updates = resolve_froms(&file, &registry()).expect("should resolve");
        assert_eq!(updates[0].updated, "alpine:latest@sha256:def");
    }

    #[test]
    fn resolve_from_templated_or_ambiguous_skipped() {
        let registry = registry();
        let file = parse("FROM ubuntu:$VERSION\nFROM ubuntu@sha256:abc\nFROM unknown:1.0\n");
        let updates = resolve_froms(&file, &registry).expect("should resolve");
        assert!(updates.is_empty());
        // only the unknown image reaches the registry
        assert_eq!(registry.digest_lookups(), 1);
    }

    #[test]
    fn replace_froms_matches_repository_only() {
        let file = parse("FROM ghcr.io/org/base:1.0@sha256:abc AS a\nFROM alpine:3.14\n");
        let updates = replace_froms(&file, "ghcr.io/org/base", "2.0");
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].line(), "FROM ghcr.io/org/base:2.0 AS a");
    }
}

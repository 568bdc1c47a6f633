//! # uptodate-dockerfile
//!
//! Build-file handling for uptodate: a `nom` based instruction parser,
//! digest pinning of `FROM` lines, resolution of recognized `ARG`
//! defaults, and an atomic writer that applies every pending update of a
//! file in one pass against the original line numbers.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod args;
pub mod discover;
pub mod engine;
pub mod listing;
pub mod parser;
pub mod update;
pub mod writer;

pub use engine::{DockerfileUpdater, FileOutcome, FileState, UpdateReport};
pub use parser::ast::{BuildFile, Instruction};
pub use update::{Update, resolve_reference};

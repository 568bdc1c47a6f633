//! # uptodate-matrix
//!
//! Build-matrix engine for uptodate.
//!
//! Handles:
//! - **Spec**: discovery, decoding and validation of `uptodate.yaml`.
//! - **Versions**: filtering, ordering and windowing of version lists.
//! - **Variables**: expansion of build args into value lists.
//! - **Matrix**: zip and cartesian generation with exclusions.
//! - **Naming**: deterministic container names.
//! - **Staleness**: rebuild decisions from published image labels.
//! - **Planner**: [`planner::BuildResult`]s for `dockerbuild` and `dockerbases`.
//! - **Hierarchy**: per-tag Dockerfile directories.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod hierarchy;
pub mod matrix;
pub mod naming;
pub mod planner;
pub mod spec;
pub mod staleness;
pub mod variables;
pub mod versions;

pub use matrix::MatrixEntry;
pub use planner::{BuildResult, PlanMode, PlanOptions, Planner};

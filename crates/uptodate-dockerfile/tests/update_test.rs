//! End-to-end checks of the build-file update engine.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;

use uptodate_common::constants::DOCKERFILE_NAME;
use uptodate_dockerfile::discover::find_files;
use uptodate_dockerfile::update::resolve_froms;
use uptodate_dockerfile::{BuildFile, DockerfileUpdater, FileState};
use uptodate_registry::memory::InMemoryRegistry;

fn registry() -> InMemoryRegistry {
    InMemoryRegistry::new()
        .with_digest("ubuntu:20.04", "sha256:abc")
        .with_digest("python:3.9", "sha256:123")
}

fn write(path: &Path, content: &str) {
    std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    std::fs::write(path, content).expect("write");
}

#[test]
fn update_then_rerun_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("Dockerfile");
    write(&path, "FROM ubuntu:20.04\nRUN echo hello\n");
    let registry = registry();
    let updater = DockerfileUpdater::new(&registry);

    let first = updater.run(&[path.clone()], false);
    assert_eq!(first.update_count(), 1);
    assert_eq!(
        std::fs::read_to_string(&path).expect("read"),
        "FROM ubuntu:20.04@sha256:abc\nRUN echo hello\n"
    );

    let second = updater.run(&[path.clone()], false);
    assert_eq!(second.update_count(), 0);
    assert_eq!(second.files[0].state, FileState::Current);

    let parsed = BuildFile::load(&path).expect("parse");
    assert!(resolve_froms(&parsed, &registry).expect("resolve").is_empty());
}

#[test]
fn multi_stage_updates_keep_later_line_numbers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("Dockerfile");
    write(
        &path,
        "FROM \\\n    ubuntu:20.04 AS build\nRUN make\n\nFROM python:3.9\nCOPY --from=build /out /out\n",
    );
    let registry = registry();
    let report = DockerfileUpdater::new(&registry).run(&[path.clone()], false);
    assert_eq!(report.update_count(), 2);
    assert_eq!(
        std::fs::read_to_string(&path).expect("read"),
        "FROM ubuntu:20.04@sha256:abc AS build\nRUN make\n\nFROM python:3.9@sha256:123\nCOPY --from=build /out /out\n"
    );
}

#[test]
fn discovered_tree_processed_independently() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(&dir.path().join("a/Dockerfile"), "FROM ubuntu:20.04\n");
    write(&dir.path().join("b/Dockerfile"), "this is not a build file\n");
    write(&dir.path().join("c/Dockerfile.gpu"), "FROM ubuntu:$TAG\n");

    let paths = find_files(dir.path(), DOCKERFILE_NAME).expect("walk");
    assert_eq!(paths.len(), 3);

    let registry = registry();
    let report = DockerfileUpdater::new(&registry).run(&paths, true);
    assert_eq!(report.checked(), 3);
    assert_eq!(report.modified(), 1);
    assert_eq!(report.skipped().count(), 1);
}

//! `uptodate.yaml` spec files: discovery, decoding, validation.

pub mod model;
pub mod validator;

use std::path::{Path, PathBuf};

use uptodate_common::constants::SPEC_FILE_NAME;
use uptodate_common::error::{Result, UptodateError};
use uptodate_dockerfile::discover::find_files;

pub use self::model::{BuildArgKind, BuildSpec, HierarchySpec, SpecFile, VariableSpec};
use self::model::RawSpecDocument;

/// Decodes and validates spec text read from `path`.
///
/// # Errors
///
/// Returns [`UptodateError::Config`] if the YAML is malformed or fails
/// validation.
pub fn parse_spec(path: &Path, content: &str) -> Result<SpecFile> {
    let raw = if content.trim().is_empty() {
        RawSpecDocument::default()
    } else {
        serde_yaml::from_str(content)
            .map_err(|e| UptodateError::config(format!("{}: {e}", path.display())))?
    };
    validator::validate(path, raw)
}

/// Reads, decodes and validates the spec file at `path`.
///
/// # Errors
///
/// Returns [`UptodateError::Io`] if the file cannot be read, otherwise as
/// [`parse_spec`].
pub fn load_spec(path: &Path) -> Result<SpecFile> {
    let content = std::fs::read_to_string(path).map_err(|e| UptodateError::io(path, e))?;
    parse_spec(path, &content)
}

/// Finds spec files below `root`.
///
/// # Errors
///
/// Returns [`UptodateError::NotFound`] if `root` does not exist.
pub fn find_spec_files(root: &Path) -> Result<Vec<PathBuf>> {
    find_files(root, SPEC_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use uptodate_common::types::NamingRole;

    use super::*;

    fn parse(content: &str) -> Result<SpecFile> {
        parse_spec(Path::new("uptodate.yaml"), content)
    }

    #[test]
    fn build_args_keep_declaration_order() {
        let spec = parse(
            r"
dockerbuild:
  build_args:
    zeta:
      values: [a]
    alpha:
      type: container
      name: ubuntu
    mid:
      type: spack
      name: zlib
",
        )
        .expect("should parse");
        let build = spec.build.expect("build section");
        let names: Vec<_> = build.variables.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert!(build.active);
    }

    #[test]
    fn default_roles_follow_kind() {
        let spec = parse(
            r"
dockerbuild:
  build_args:
    os:
      versions: ['18.04']
    base:
      type: container
      name: ubuntu
      slug: b
    llvm:
      type: spack
      name: llvm
      role: manual
",
        )
        .expect("should parse");
        let vars = spec.build.expect("build").variables;
        assert_eq!(vars[0].role, NamingRole::Tag);
        assert_eq!(vars[1].role, NamingRole::Container);
        assert_eq!(vars[1].slug, "b");
        assert_eq!(vars[2].role, NamingRole::Manual);
        assert_eq!(vars[2].slug, "llvm");
    }

    #[test]
    fn numeric_scalars_read_as_text() {
        let spec = parse(
            r"
dockerbuild:
  build_args:
    os:
      values: [18.04, '20.04', 22]
",
        )
        .expect("should parse");
        let vars = spec.build.expect("build").variables;
        assert_eq!(
            vars[0].kind,
            BuildArgKind::Manual {
                values: vec!["18.04".into(), "20.04".into(), "22".into()],
                versions: Vec::new(),
            }
        );
    }

    #[test]
    fn unknown_type_is_config_error() {
        let err = parse("dockerbuild:\n  build_args:\n    x:\n      type: contianer\n      name: a\n")
            .unwrap_err();
        assert!(err.to_string().contains("unknown type \"contianer\""));
    }

    #[test]
    fn container_without_name_is_config_error() {
        let err = parse("dockerbuild:\n  build_args:\n    base:\n      type: container\n")
            .unwrap_err();
        assert!(err.to_string().contains("requires a name"));
    }

    #[test]
    fn unknown_field_is_config_error() {
        assert!(parse("dockerbuild:\n  build_args:\n    os:\n      valuez: [a]\n").is_err());
    }

    #[test]
    fn unequal_exclude_columns_rejected() {
        let err = parse(
            "dockerbuild:\n  build_args:\n    a:\n      values: [1]\n  exclude:\n    a: [1, 2]\n    b: [1]\n",
        )
        .unwrap_err();
        assert!(matches!(err, UptodateError::Config { .. }));
    }

    #[test]
    fn inactive_and_hierarchy_sections_decoded() {
        let spec = parse(
            r"
dockerbuild:
  active: false
  build_args:
    a:
      values: [x]
dockerhierarchy:
  container:
    name: ghcr.io/rse-ops/ubuntu
    startat: 16.04
    skips: ['17.04']
",
        )
        .expect("should parse");
        assert!(!spec.build.expect("build").active);
        let hierarchy = spec.hierarchy.expect("hierarchy");
        assert_eq!(hierarchy.container, "ghcr.io/rse-ops/ubuntu");
        assert_eq!(hierarchy.policy.start_at.as_deref(), Some("16.04"));
        assert!(hierarchy.policy.skips.contains("17.04"));
    }

    #[test]
    fn empty_file_has_no_sections() {
        let spec = parse("\n").expect("should parse");
        assert!(spec.build.is_none());
        assert!(spec.hierarchy.is_none());
    }

    #[test]
    fn find_spec_files_matches_prefix() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("a")).expect("mkdir");
        std::fs::write(dir.path().join("a/uptodate.yaml"), "").expect("write");
        std::fs::write(dir.path().join("a/uptodate.yaml.bak"), "").expect("write");
        std::fs::write(dir.path().join("a/other.yaml"), "").expect("write");
        let found = find_spec_files(dir.path()).expect("walk");
        assert_eq!(found.len(), 2);
    }
}

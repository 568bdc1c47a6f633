//! System-wide constants and defaults.

/// Application name used in CLI output.
pub const APP_NAME: &str = "uptodate";

/// File name (or name prefix) of declarative spec files.
pub const SPEC_FILE_NAME: &str = "uptodate.yaml";

/// File name (or name prefix) of build files.
pub const DOCKERFILE_NAME: &str = "Dockerfile";

/// Tag assumed when an image reference carries none.
pub const DEFAULT_TAG: &str = "latest";

/// Branch that changed-file detection compares against by default.
pub const DEFAULT_BRANCH: &str = "main";

/// Prefix of image labels recording the matrix values of a build.
///
/// Full key shape: `uptodate_matrix_<type>_<name>`.
pub const MATRIX_LABEL_PREFIX: &str = "uptodate_matrix_";

/// `ARG` prefix resolved against the package index.
pub const SPACK_ARG_PREFIX: &str = "uptodate_spack_";

/// `ARG` prefix resolved to the newest GitHub release.
pub const GITHUB_RELEASE_ARG_PREFIX: &str = "uptodate_github_release_";

/// `ARG` prefix resolved to the newest commit on a GitHub branch.
pub const GITHUB_COMMIT_ARG_PREFIX: &str = "uptodate_github_commit_";

/// Separator between org, repository, and branch inside GitHub `ARG` names.
pub const GITHUB_ARG_SEPARATOR: &str = "__";

/// Filter used by docker hierarchies that declare none: major.minor with
/// an optional patch.
pub const VERSION_REGEX: &str = "[0-9]+[.][0-9]+(?:[.][0-9]+)?";

/// Default crane web front-end used for tag, config, and digest lookups.
pub const DEFAULT_REGISTRY_API: &str = "https://crane.ggcr.dev";

/// Default package index holding `<package>.json` metadata.
pub const DEFAULT_PACKAGE_INDEX: &str = "https://spack.github.io/packages/data/packages";

/// Default GitHub REST endpoint.
pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

/// Environment variable naming the pipeline output file.
pub const GITHUB_OUTPUT_ENV: &str = "GITHUB_OUTPUT";

/// Prefix of environment variables read into the run configuration.
pub const ENV_PREFIX: &str = "UPTODATE_";

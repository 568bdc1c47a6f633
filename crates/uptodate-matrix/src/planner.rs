//! Build planner: turns spec files into [`BuildResult`]s.
//!
//! For each spec file the planner expands variables, generates the matrix, finds
//! the build files, and keeps every (file, entry) pair the staleness
//! comparator says needs a build.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};
use uptodate_common::constants::DOCKERFILE_NAME;
use uptodate_common::error::Result;
use uptodate_dockerfile::discover::find_files;
use uptodate_registry::{PackageIndex, Registry};

use crate::matrix::{MatrixEntry, allow_list, generate};
use crate::naming::{NamingRoles, container_name};
use crate::spec::{BuildSpec, load_spec};
use crate::staleness::{Label, LatestCache, build_labels, current_labels, decide, latest_values};
use crate::variables::{ResolvedVariable, Sources, expand};

/// One proposed build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildResult {
    /// Spec file the build comes from.
    pub name: String,
    /// Build file to build.
    pub filename: String,
    /// Command that produced the result.
    pub parser: String,
    /// Build arguments of the matrix entry.
    pub buildargs: MatrixEntry,
    /// `docker build` invocation without the image name.
    pub command_prefix: String,
    /// Human-readable summary.
    pub description: String,
    /// Image name to build.
    pub container_name: String,
    /// Build context, when it is not the build file's directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Which build files a spec drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanMode {
    /// Build files below the spec directory.
    Build,
    /// Every build file below a shared bases directory, built with the
    /// spec directory as context.
    Bases {
        /// Directory holding the base build files.
        bases_dir: PathBuf,
    },
}

impl PlanMode {
    /// Parser name recorded on results.
    #[must_use]
    pub const fn parser(&self) -> &'static str {
        match self {
            Self::Build => "dockerbuild",
            Self::Bases { .. } => "dockerbases",
        }
    }
}

/// Options of one planning run.
#[derive(Debug, Clone)]
pub struct PlanOptions {
    /// Registry prefix for names; enables label comparison when set.
    pub registry: Option<String>,
    /// Build every entry regardless of published labels.
    pub build_all: bool,
    /// Build-file selection.
    pub mode: PlanMode,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            registry: None,
            build_all: false,
            mode: PlanMode::Build,
        }
    }
}

/// Plans builds against a registry and a package index.
pub struct Planner<'a> {
    sources: Sources<'a>,
    cache: LatestCache,
}

impl std::fmt::Debug for Planner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Planner")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Matrix of one spec with the naming roles it was generated for.
#[derive(Debug, Clone)]
pub struct SpecMatrix {
    /// Naming roles in declaration order.
    pub roles: NamingRoles,
    /// Matrix entries.
    pub entries: Vec<MatrixEntry>,
}

impl<'a> Planner<'a> {
    /// Creates a planner.
    #[must_use]
    pub fn new(registry: &'a dyn Registry, packages: &'a dyn PackageIndex) -> Self {
        Self {
            sources: Sources { registry, packages },
            cache: LatestCache::new(),
        }
    }

    /// Expands a build section into its matrix and naming roles.
    ///
    /// With an explicit matrix only the build args it names take part and
    /// no values are looked up.
    ///
    /// # Errors
    ///
    /// Returns configuration and collaborator errors.
    pub fn matrix(&self, build: &BuildSpec) -> Result<SpecMatrix> {
        let allowed = build.matrix.as_ref().map(allow_list);
        let specs: Vec<_> = build
            .variables
            .iter()
            .filter(|v| allowed.as_ref().is_none_or(|a| a.contains(&v.name)))
            .collect();
        let roles = NamingRoles::from_specs(specs.iter().copied());

        let variables: Vec<ResolvedVariable> = if build.matrix.is_some() {
            Vec::new()
        } else {
            specs
                .iter()
                .map(|spec| expand(spec, self.sources))
                .collect::<Result<_>>()?
        };
        let entries = generate(&variables, build.matrix.as_ref(), build.exclude.as_ref())?;
        Ok(SpecMatrix { roles, entries })
    }

    /// Plans builds for every spec file in `spec_paths`.
    ///
    /// # Errors
    ///
    /// Returns the first configuration or collaborator error.
    pub fn plan(&self, spec_paths: &[PathBuf], options: &PlanOptions) -> Result<Vec<BuildResult>> {
        let bases = match &options.mode {
            PlanMode::Bases { bases_dir } => {
                let bases = find_files(bases_dir, DOCKERFILE_NAME)?;
                if bases.is_empty() {
                    info!(dir = %bases_dir.display(), "no Dockerfile found under bases, nothing to build");
                    return Ok(Vec::new());
                }
                Some(bases)
            }
            PlanMode::Build => None,
        };

        let mut results = Vec::new();
        for path in spec_paths {
            results.extend(self.plan_spec(path, options, bases.as_deref())?);
        }
        Ok(results)
    }

    fn plan_spec(
        &self,
        path: &Path,
        options: &PlanOptions,
        bases: Option<&[PathBuf]>,
    ) -> Result<Vec<BuildResult>> {
        let spec = load_spec(path)?;
        let Some(build) = spec.build.as_ref() else {
            info!(path = %path.display(), "dockerbuild section not found, skipping");
            return Ok(Vec::new());
        };
        if !build.active {
            info!(path = %path.display(), "dockerbuild is not active, skipping");
            return Ok(Vec::new());
        }

        let SpecMatrix { roles, entries } = self.matrix(build)?;
        if entries.is_empty() {
            warn!(path = %path.display(), "build matrix is empty");
            return Ok(Vec::new());
        }

        let spec_dir = parent_dir(path);
        let dirname = directory_name(spec_dir);
        let dockerfiles = match bases {
            Some(bases) => bases.to_vec(),
            None => find_files(spec_dir, DOCKERFILE_NAME)?,
        };

        let latest: Vec<BTreeMap<String, String>> = entries
            .iter()
            .map(|entry| latest_values(entry, &roles, self.sources.registry, &self.cache))
            .collect::<Result<_>>()?;

        let mut current: BTreeMap<String, Option<BTreeMap<String, Label>>> = BTreeMap::new();
        let mut results = Vec::new();
        for dockerfile in &dockerfiles {
            let basename = match (&build.container_basename, &options.mode) {
                (Some(custom), _) => custom.clone(),
                (None, PlanMode::Build) => dirname.clone(),
                (None, PlanMode::Bases { bases_dir }) => bases_basename(&dirname, bases_dir, dockerfile),
            };

            for (entry, latest) in entries.iter().zip(&latest) {
                let name = container_name(options.registry.as_deref(), &basename, entry, &roles);
                let published = match (&options.registry, current.get(&name)) {
                    (None, _) => None,
                    (Some(_), Some(cached)) => cached.clone(),
                    (Some(_), None) => {
                        let labels = current_labels(&name, self.sources.registry)?;
                        let _ = current.insert(name.clone(), labels.clone());
                        labels
                    }
                };

                let decision = decide(latest, published.as_ref(), options.build_all);
                debug!(container = %name, ?decision, "staleness decision");
                if !decision.should_build() {
                    continue;
                }

                let labels = build_labels(latest, &roles);
                let file_arg = match options.mode {
                    PlanMode::Build => file_name(dockerfile),
                    PlanMode::Bases { .. } => dockerfile.display().to_string(),
                };
                let command_prefix = build_command(&file_arg, entry, &labels);
                info!(container = %name, command = %command_prefix, "planned build");
                results.push(BuildResult {
                    name: path.display().to_string(),
                    filename: dockerfile.display().to_string(),
                    parser: options.mode.parser().to_string(),
                    buildargs: entry.clone(),
                    command_prefix,
                    description: build_description(dockerfile, entry),
                    container_name: name,
                    context: matches!(options.mode, PlanMode::Bases { .. })
                        .then(|| spec_dir.display().to_string()),
                });
            }
        }
        Ok(results)
    }
}

fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

fn directory_name(dir: &Path) -> String {
    dir.canonicalize()
        .ok()
        .as_deref()
        .and_then(Path::file_name)
        .or_else(|| dir.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// `<dirname>-<dir/of/base/relative/to/bases>` with separators as dashes.
fn bases_basename(dirname: &str, bases_dir: &Path, dockerfile: &Path) -> String {
    let relative = parent_dir(dockerfile)
        .strip_prefix(bases_dir)
        .map(|rel| {
            rel.components()
                .filter_map(|c| match c {
                    Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("-")
        })
        .unwrap_or_default();
    let relative = relative.trim_matches('-');
    if relative.is_empty() {
        dirname.to_string()
    } else {
        format!("{dirname}-{relative}")
    }
}

/// `docker build -f <file> --build-arg k=v... --label k=v...`, sorted.
#[must_use]
pub fn build_command(file: &str, entry: &MatrixEntry, labels: &BTreeMap<String, String>) -> String {
    let mut command = format!("docker build -f {file}");
    for (key, value) in entry.iter() {
        let _ = write!(command, " --build-arg {key}={value}");
    }
    for (key, value) in labels {
        let _ = write!(command, " --label {key}={value}");
    }
    command
}

/// `<build file directory> k:v ...`.
#[must_use]
pub fn build_description(dockerfile: &Path, entry: &MatrixEntry) -> String {
    let mut description = parent_dir(dockerfile).display().to_string();
    for (key, value) in entry.iter() {
        let _ = write!(description, " {key}:{value}");
    }
    description
}

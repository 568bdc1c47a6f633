//! Syntax tree for parsed build files.

use std::path::{Path, PathBuf};

/// One logical instruction of a build file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Upper-cased keyword (`FROM`, `ARG`, ...).
    pub keyword: String,
    /// Leading `--name=value` flags, in source order.
    pub flags: Vec<String>,
    /// Whitespace-separated arguments after the flags.
    pub args: Vec<String>,
    /// Logical instruction text as assembled from its physical lines.
    pub original: String,
    /// 1-based first source line.
    pub start_line: usize,
    /// 1-based last source line.
    pub end_line: usize,
}

impl Instruction {
    /// 0-based index of the first source line.
    #[must_use]
    pub const fn start_index(&self) -> usize {
        self.start_line.saturating_sub(1)
    }

    /// 0-based index of the last source line.
    #[must_use]
    pub const fn end_index(&self) -> usize {
        self.end_line.saturating_sub(1)
    }

    /// Returns whether this is a `keyword` instruction (case-insensitive).
    #[must_use]
    pub fn is(&self, keyword: &str) -> bool {
        self.keyword.eq_ignore_ascii_case(keyword)
    }

    /// Arguments rejoined with single spaces.
    #[must_use]
    pub fn joined_args(&self) -> String {
        self.args.join(" ")
    }
}

/// A build declaration within an `ARG` instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgDecl {
    /// Variable name.
    pub name: String,
    /// Default value, if the declaration carries one.
    pub default: Option<String>,
}

impl ArgDecl {
    /// Splits `name[=default]`.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token.split_once('=') {
            Some((name, default)) => Self {
                name: name.to_string(),
                default: Some(default.to_string()),
            },
            None => Self {
                name: token.to_string(),
                default: None,
            },
        }
    }
}

/// A parsed build file.
#[derive(Debug, Clone)]
pub struct BuildFile {
    /// Location on disk.
    pub path: PathBuf,
    /// Instructions in source order.
    pub instructions: Vec<Instruction>,
}

impl BuildFile {
    /// `FROM` instructions in source order.
    pub fn froms(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter().filter(|i| i.is("FROM"))
    }

    /// `ARG` instructions in source order.
    pub fn args(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter().filter(|i| i.is("ARG"))
    }

    /// Every variable declared by an `ARG` instruction.
    pub fn arg_decls(&self) -> impl Iterator<Item = ArgDecl> + '_ {
        self.args()
            .flat_map(|i| i.args.iter())
            .map(|token| ArgDecl::parse(token))
    }

    /// Returns whether the file declares any build argument.
    #[must_use]
    pub fn has_build_args(&self) -> bool {
        self.args().next().is_some()
    }

    /// Returns whether some build argument has no default value.
    #[must_use]
    pub fn has_empty_build_args(&self) -> bool {
        self.arg_decls()
            .any(|d| d.default.as_deref().is_none_or(str::is_empty))
    }

    /// File name component of the path.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Directory holding the file.
    #[must_use]
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

//! Build-file parser built on `nom`.
//!
//! Source text is reassembled into logical instructions by the
//! [`lexer`], then each instruction is tokenized into keyword, flags and
//! arguments and kept with its source line span.

pub mod ast;
pub mod lexer;

use std::path::Path;

use uptodate_common::error::{Result, UptodateError};

use self::ast::{BuildFile, Instruction};

/// Instruction keywords accepted in a build file.
pub const KEYWORDS: &[&str] = &[
    "ADD",
    "ARG",
    "CMD",
    "COPY",
    "ENTRYPOINT",
    "ENV",
    "EXPOSE",
    "FROM",
    "HEALTHCHECK",
    "LABEL",
    "MAINTAINER",
    "ONBUILD",
    "RUN",
    "SHELL",
    "STOPSIGNAL",
    "USER",
    "VOLUME",
    "WORKDIR",
];

/// Parses build-file text into instructions.
///
/// # Errors
///
/// Returns [`UptodateError::Parse`] if the text holds no instruction or a
/// line does not start with a known keyword.
pub fn parse_instructions(path: &Path, input: &str) -> Result<Vec<Instruction>> {
    let mut instructions = Vec::new();
    for line in lexer::logical_lines(input) {
        let raw = lexer::tokenize_instruction(&line.text).map_err(|message| {
            UptodateError::Parse {
                path: path.to_path_buf(),
                message: format!("line {}: {message}", line.start_line),
            }
        })?;
        let keyword = raw.keyword.to_ascii_uppercase();
        if !KEYWORDS.contains(&keyword.as_str()) {
            return Err(UptodateError::Parse {
                path: path.to_path_buf(),
                message: format!("line {}: unknown instruction `{}`", line.start_line, raw.keyword),
            });
        }
        instructions.push(Instruction {
            keyword,
            flags: raw.flags.iter().map(|f| (*f).to_string()).collect(),
            args: raw.rest.split_whitespace().map(str::to_string).collect(),
            original: line.text.clone(),
            start_line: line.start_line,
            end_line: line.end_line,
        });
    }
    if instructions.is_empty() {
        return Err(UptodateError::Parse {
            path: path.to_path_buf(),
            message: "no instructions found".to_string(),
        });
    }
    Ok(instructions)
}

impl BuildFile {
    /// Parses `content` as the build file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`UptodateError::Parse`] on malformed content.
    pub fn parse(path: impl Into<std::path::PathBuf>, content: &str) -> Result<Self> {
        let path = path.into();
        let instructions = parse_instructions(&path, content)?;
        Ok(Self { path, instructions })
    }

    /// Reads and parses the build file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`UptodateError::Io`] if the file cannot be read, or
    /// [`UptodateError::Parse`] on malformed content.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| UptodateError::io(path, e))?;
        Self::parse(path, &content)
    }
}

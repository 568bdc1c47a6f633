//! Tokenization of build-file text using `nom`.
//!
//! Physical lines are first joined into logical instructions, honouring
//! the escape character and dropping comment lines inside continuations.
//! Heredoc bodies (`RUN <<EOF` ... `EOF`) belong to the span of the
//! instruction that opens them and are never tokenized. Each logical instruction is then split into its keyword, `--flags`,
//! and the remaining argument text.

use std::collections::VecDeque;

use nom::{
    IResult, Parser,
    bytes::complete::{tag, take_while1},
    character::complete::{char, space1},
    combinator::{opt, recognize},
    multi::many0,
    sequence::preceded,
};

/// Default line-continuation character.
pub const DEFAULT_ESCAPE: char = '\\';

/// One instruction reassembled from its physical lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    /// Instruction text with continuations joined by a single space.
    pub text: String,
    /// 1-based line the instruction starts on.
    pub start_line: usize,
    /// 1-based line the instruction ends on.
    pub end_line: usize,
}

/// An instruction split into its parts, borrowing from the logical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInstruction<'a> {
    /// Keyword as written (`FROM`, `from`, ...).
    pub keyword: &'a str,
    /// Leading `--name=value` flags.
    pub flags: Vec<&'a str>,
    /// Everything after keyword and flags, trimmed.
    pub rest: &'a str,
}

/// Instructions whose arguments may open heredocs.
const HEREDOC_KEYWORDS: [&str; 3] = ["RUN", "COPY", "ADD"];

/// A heredoc opened by an instruction and awaiting its terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Heredoc {
    terminator: String,
    strip_tabs: bool,
}

impl Heredoc {
    fn closes_on(&self, line: &str) -> bool {
        let line = if self.strip_tabs {
            line.trim_start_matches('\t')
        } else {
            line
        };
        line == self.terminator
    }
}

/// Parses the `<<` or `<<-` that opens a heredoc word.
fn heredoc_open(input: &str) -> IResult<&str, Option<char>> {
    preceded(tag("<<"), opt(char('-'))).parse(input)
}

/// Recognizes `<<WORD`, `<<-WORD`, `<<"WORD"` and `<<'WORD'`.
fn heredoc_marker(word: &str) -> Option<Heredoc> {
    let word = word.trim_start_matches(|c: char| c.is_ascii_digit());
    let (name, dash) = heredoc_open(word).ok()?;
    if name.starts_with('<') {
        return None;
    }
    let name = ['"', '\'']
        .iter()
        .find_map(|q| name.strip_prefix(*q).and_then(|n| n.strip_suffix(*q)))
        .unwrap_or(name);
    if name.is_empty() {
        return None;
    }
    Some(Heredoc {
        terminator: name.to_string(),
        strip_tabs: dash.is_some(),
    })
}

/// Heredocs opened by a logical instruction, in body order.
fn heredocs_opened(text: &str) -> Vec<Heredoc> {
    let mut words = text.split_whitespace();
    let opens = words
        .next()
        .is_some_and(|k| HEREDOC_KEYWORDS.iter().any(|h| k.eq_ignore_ascii_case(h)));
    if !opens {
        return Vec::new();
    }
    words.filter_map(heredoc_marker).collect()
}

/// Reads a leading `# escape=<c>` parser directive, if any.
#[must_use]
pub fn escape_directive(input: &str) -> char {
    for line in input.lines() {
        let trimmed = line.trim();
        let Some(directive) = trimmed.strip_prefix('#') else {
            break;
        };
        let Some((key, value)) = directive.split_once('=') else {
            break;
        };
        if key.trim().eq_ignore_ascii_case("escape") {
            if let Some(c) = value.trim().chars().next() {
                return c;
            }
        }
    }
    DEFAULT_ESCAPE
}

/// Joins physical lines into logical instructions.
///
/// Blank lines and `#` comments are skipped, including inside a
/// continuation. An unterminated continuation at end of input closes on
/// the last line. Heredoc body lines, up to and including each
/// terminator, extend the opening instruction's `end_line`; an
/// unterminated heredoc runs to end of input.
#[must_use]
pub fn logical_lines(input: &str) -> Vec<LogicalLine> {
    let escape = escape_directive(input);
    let mut lines: Vec<LogicalLine> = Vec::new();
    let mut current: Option<(String, usize)> = None;
    let mut pending: VecDeque<Heredoc> = VecDeque::new();
    let mut last_line = 0;

    for (idx, raw) in input.lines().enumerate() {
        let number = idx + 1;
        if let Some(heredoc) = pending.front() {
            if heredoc.closes_on(raw) {
                let _ = pending.pop_front();
            }
            if let Some(opener) = lines.last_mut() {
                opener.end_line = number;
            }
            continue;
        }
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        last_line = number;

        let (body, continues) = match trimmed.strip_suffix(escape) {
            Some(body) => (body.trim_end(), true),
            None => (trimmed, false),
        };

        match current.as_mut() {
            None => current = Some((body.to_string(), number)),
            Some((text, _)) => {
                if !body.is_empty() {
                    text.push(' ');
                    text.push_str(body);
                }
            }
        }

        if !continues {
            if let Some((text, start_line)) = current.take() {
                pending.extend(heredocs_opened(&text));
                lines.push(LogicalLine {
                    text,
                    start_line,
                    end_line: number,
                });
            }
        }
    }

    if let Some((text, start_line)) = current {
        lines.push(LogicalLine {
            text,
            start_line,
            end_line: last_line,
        });
    }
    lines
}

fn keyword(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphabetic()).parse(input)
}

/// Parses one ` --flag[=value]` preceded by whitespace.
fn flag(input: &str) -> IResult<&str, &str> {
    preceded(
        space1,
        recognize(preceded(tag("--"), take_while1(|c: char| !c.is_whitespace()))),
    )
    .parse(input)
}

fn instruction(input: &str) -> IResult<&str, (&str, Vec<&str>)> {
    (keyword, many0(flag)).parse(input)
}

/// Splits a logical instruction into keyword, flags, and arguments.
///
/// # Errors
///
/// Returns a diagnostic if the text does not start with a keyword.
pub fn tokenize_instruction(text: &str) -> Result<RawInstruction<'_>, String> {
    let (rest, (keyword, flags)) =
        instruction(text).map_err(|e| format!("expected instruction keyword ({e})"))?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return Err(format!(
            "unexpected character after keyword `{keyword}`: \"{}\"",
            rest.chars().take(20).collect::<String>()
        ));
    }
    Ok(RawInstruction {
        keyword,
        flags,
        rest: rest.trim(),
    })
}

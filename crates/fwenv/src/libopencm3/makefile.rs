//! The slice of libopencm3's per-family Makefiles needed to find sources:
//! `include`, `VPATH` and the `OBJS` list.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Search path every `vpath` starts with.
pub const CURRENT_DIR: &str = "./";

/// What one Makefile (or a merge of several) contributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakefileData {
    /// Further Makefiles, as written after `include`.
    pub includes: Vec<String>,
    /// Directories searched for sources; always starts with `./`.
    pub vpath: Vec<String>,
    /// Object file names, e.g. `gpio.o`.
    pub objs: Vec<String>,
}

impl Default for MakefileData {
    fn default() -> Self {
        Self {
            includes: Vec::new(),
            vpath: vec![CURRENT_DIR.to_string()],
            objs: Vec::new(),
        }
    }
}

impl MakefileData {
    /// Append the values of `other` not already present, field by field.
    pub fn merge(&mut self, other: MakefileData) {
        merge_unique(&mut self.includes, other.includes);
        merge_unique(&mut self.vpath, other.vpath);
        merge_unique(&mut self.objs, other.objs);
    }
}

fn merge_unique(into: &mut Vec<String>, from: Vec<String>) {
    for value in from {
        if !into.contains(&value) {
            into.push(value);
        }
    }
}

struct Patterns {
    include: Regex,
    vpath: Regex,
    objs: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        include: compile(r"^include\s+(.+?)\s*$"),
        vpath: compile(r"^VPATH\s*\+?=\s*(.*?)\s*$"),
        objs: compile(r"^OBJS\s*\+?=(.*)$"),
    })
}

#[allow(clippy::expect_used)] // literal patterns, covered by the parser tests
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern")
}

/// Parse Makefile text. `origin` only names the file in errors.
///
/// # Errors
///
/// `Error::MissingObjs` when the text has no `OBJS` assignment.
pub fn parse_makefile_str(content: &str, origin: &Path) -> Result<MakefileData> {
    let pats = patterns();
    let mut data = MakefileData::default();
    let lines: Vec<&str> = content.lines().collect();

    for line in &lines {
        if let Some(caps) = pats.include.captures(line) {
            if let Some(path) = caps.get(1) {
                data.includes.push(path.as_str().to_string());
            }
        } else if let Some(caps) = pats.vpath.captures(line) {
            if let Some(paths) = caps.get(1) {
                data.vpath.extend(
                    paths
                        .as_str()
                        .split(':')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(str::to_string),
                );
            }
        }
    }

    let start = lines
        .iter()
        .position(|line| pats.objs.is_match(line))
        .ok_or_else(|| Error::MissingObjs(origin.to_path_buf()))?;
    data.objs = collect_objs(lines.iter().skip(start).copied(), &pats.objs);
    Ok(data)
}

/// Tokens of the `OBJS` run starting at the first line of `lines`: each
/// assignment with its backslash continuations, then any further `OBJS`
/// assignments separated only by blank or comment lines.
fn collect_objs<'a>(lines: impl Iterator<Item = &'a str>, objs: &Regex) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut continued = false;
    for line in lines {
        let body = if continued {
            line
        } else if let Some(caps) = objs.captures(line) {
            caps.get(1).map_or("", |m| m.as_str())
        } else if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        } else {
            break;
        };

        let body = body.trim_end();
        continued = body.ends_with('\\');
        let body = body.trim_end_matches('\\');
        tokens.extend(
            body.split_whitespace()
                .filter(|t| t.ends_with(".o"))
                .map(str::to_string),
        );
    }
    tokens
}

/// Read and parse one Makefile.
///
/// # Errors
///
/// `Error::Io` if unreadable, `Error::MissingObjs` without an `OBJS` list.
pub fn parse_makefile_data(path: &Path) -> Result<MakefileData> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let data = parse_makefile_str(&content, path)?;
    tracing::debug!(
        makefile = %path.display(),
        includes = data.includes.len(),
        vpath = data.vpath.len(),
        objs = data.objs.len(),
        "parsed makefile"
    );
    Ok(data)
}

//! `BuildEnv` — the mutable record both framework builders write into.
//!
//! Nothing here knows about a specific framework. The builders append flags,
//! record preprocessing commands and declare libraries; the downstream
//! compile/link step (or the `xtask` CLI) consumes the result.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::Serialize;

use crate::config::Options;
use crate::error::{Error, Result};
use crate::tool::{ToolCommand, ToolRunner};

/// Preprocessor define: bare `NAME` or `NAME=value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Define {
    Flag(String),
    Value(String, String),
}

impl Define {
    pub fn flag(name: impl Into<String>) -> Self {
        Self::Flag(name.into())
    }

    pub fn value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Value(name.into(), value.into())
    }

    /// Define name without the value.
    pub fn name(&self) -> &str {
        match self {
            Self::Flag(name) | Self::Value(name, _) => name,
        }
    }
}

impl fmt::Display for Define {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(name) => f.write_str(name),
            Self::Value(name, value) => write!(f, "{name}={value}"),
        }
    }
}

/// A file-producing step, e.g. running a linker template through `cpp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildCommand {
    pub target: PathBuf,
    pub source: PathBuf,
    /// Program followed by its arguments, variables already expanded.
    pub argv: Vec<String>,
    /// Human-readable progress line.
    pub description: String,
}

/// A static library to build from a list of sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryBuild {
    /// Output directory under `$BUILD_DIR`.
    pub name: PathBuf,
    pub sources: Vec<PathBuf>,
}

/// Entry of the link library list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Lib {
    /// `-l<name>`
    Named(String),
    /// A library built from framework sources.
    Built(LibraryBuild),
}

impl Lib {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildEnv {
    /// Construction variables expanded by [`BuildEnv::subst`].
    pub vars: BTreeMap<String, String>,

    pub asflags: Vec<String>,
    pub asppflags: Vec<String>,
    pub cflags: Vec<String>,
    pub ccflags: Vec<String>,
    pub cxxflags: Vec<String>,
    pub cppdefines: Vec<Define>,
    pub cpppath: Vec<PathBuf>,
    pub libpath: Vec<PathBuf>,
    pub libs: Vec<Lib>,
    pub linkflags: Vec<String>,
    pub libsource_dirs: Vec<PathBuf>,

    /// Emitted before the library list on the link line.
    pub lib_flags_prefix: Vec<String>,
    /// Emitted after the library list on the link line.
    pub lib_flags_suffix: Vec<String>,

    pub ldscript_path: Option<PathBuf>,
    pub commands: Vec<BuildCommand>,
    /// `(target, prerequisite)` pairs.
    pub dependencies: Vec<(PathBuf, PathBuf)>,
    /// `(build_dir, source_dir)`: sources under `source_dir` compile into
    /// `build_dir`.
    pub variant_dirs: Vec<(PathBuf, PathBuf)>,
}

#[allow(clippy::expect_used)] // literal pattern, covered by the subst tests
fn var_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))")
            .expect("static pattern")
    })
}

impl BuildEnv {
    /// Fresh environment with the standard variables taken from `opts`.
    pub fn new(opts: &Options) -> Self {
        let mut env = Self::default();
        env.set_var("BUILD_DIR", opts.build_dir.to_string_lossy());
        env.set_var("PROGNAME", &opts.progname);
        env.set_var("PROGSUFFIX", &opts.progsuffix);
        env.set_var("CC", &opts.cc);
        env.set_var("CXX", &opts.cxx);
        env.set_var("PYTHONEXE", &opts.pythonexe);
        env
    }

    pub fn set_var(&mut self, name: &str, value: impl AsRef<str>) {
        self.vars
            .insert(name.to_string(), value.as_ref().to_string());
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Expand `$NAME` and `${NAME}`. Unknown variables expand to nothing.
    pub fn subst(&self, text: &str) -> String {
        var_pattern()
            .replace_all(text, |caps: &Captures<'_>| {
                caps.get(1)
                    .or_else(|| caps.get(2))
                    .and_then(|name| self.var(name.as_str()))
                    .unwrap_or_default()
                    .to_string()
            })
            .into_owned()
    }

    /// [`subst`](Self::subst) for paths.
    pub fn subst_path(&self, path: impl AsRef<Path>) -> PathBuf {
        PathBuf::from(self.subst(&path.as_ref().to_string_lossy()))
    }

    /// `$BUILD_DIR/$PROGNAME$PROGSUFFIX`
    pub fn program_path(&self) -> PathBuf {
        self.subst_path("$BUILD_DIR/$PROGNAME$PROGSUFFIX")
    }

    /// Define names, bare or valued, in order.
    pub fn define_names(&self) -> impl Iterator<Item = &str> {
        self.cppdefines.iter().map(Define::name)
    }

    /// Append a define unless one with the same name and value exists.
    pub fn append_unique_define(&mut self, define: Define) {
        if !self.cppdefines.contains(&define) {
            self.cppdefines.push(define);
        }
    }

    /// Record a command producing `target` from `source`; returns the
    /// expanded target path.
    pub fn command(
        &mut self,
        target: impl AsRef<Path>,
        source: impl AsRef<Path>,
        argv: Vec<String>,
        description: &str,
    ) -> PathBuf {
        let target = self.subst_path(target);
        let source = self.subst_path(source);
        let argv = argv
            .iter()
            .map(|arg| self.subst(arg))
            .filter(|arg| !arg.is_empty())
            .collect();
        let description = description.replace("$TARGET", &target.to_string_lossy());
        self.commands.push(BuildCommand {
            target: target.clone(),
            source,
            argv,
            description,
        });
        target
    }

    pub fn depends(&mut self, target: impl AsRef<Path>, prerequisite: impl AsRef<Path>) {
        let target = self.subst_path(target);
        let prerequisite = self.subst_path(prerequisite);
        self.dependencies.push((target, prerequisite));
    }

    pub fn variant_dir(&mut self, build_dir: impl AsRef<Path>, source_dir: impl AsRef<Path>) {
        let build_dir = self.subst_path(build_dir);
        self.variant_dirs
            .push((build_dir, source_dir.as_ref().to_path_buf()));
    }

    /// Declare a library to build; the caller decides where it goes in `libs`.
    pub fn library(&self, name: impl AsRef<Path>, sources: Vec<PathBuf>) -> Lib {
        Lib::Built(LibraryBuild {
            name: self.subst_path(name),
            sources: sources.iter().map(|s| self.subst_path(s)).collect(),
        })
    }

    /// Run every recorded command in order.
    ///
    /// # Errors
    ///
    /// `Error::Io` if a target directory cannot be created,
    /// `Error::ToolSpawn` / `Error::CommandFailed` if a command cannot run or
    /// exits non-zero.
    pub fn execute(&self, runner: &dyn ToolRunner) -> Result<()> {
        for cmd in &self.commands {
            if let Some(parent) = cmd.target.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
            tracing::info!("{}", cmd.description);
            let Some((program, args)) = cmd.argv.split_first() else {
                continue;
            };
            let output = runner.run(&ToolCommand::new(program).args(args.iter().cloned()))?;
            if !output.success() {
                return Err(Error::CommandFailed {
                    description: cmd.description.clone(),
                    status: output.status,
                    stderr: output.stderr,
                });
            }
        }
        Ok(())
    }
}

//! External tool invocation.
//!
//! Generator scripts and the preprocessor are run through [`ToolRunner`] so
//! the builders see a structured `(status, stdout, stderr)` result and tests
//! can substitute a recording runner (`mocks` feature).

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Error, Result};

/// Program, arguments and optional working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_string_lossy().into_owned()));
        self
    }

    #[must_use]
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit status; `-1` when the process was killed by a signal.
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(status: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            status,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs a command to completion.
pub trait ToolRunner {
    /// # Errors
    ///
    /// `Error::ToolSpawn` when the program cannot be started. A non-zero
    /// exit is *not* an error here; callers inspect [`ToolOutput::status`].
    fn run(&self, cmd: &ToolCommand) -> Result<ToolOutput>;
}

/// [`ToolRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ToolRunner for ProcessRunner {
    fn run(&self, cmd: &ToolCommand) -> Result<ToolOutput> {
        let mut process = Command::new(&cmd.program);
        process.args(&cmd.args);
        if let Some(cwd) = &cmd.cwd {
            process.current_dir(cwd);
        }
        tracing::debug!(program = %cmd.program, args = ?cmd.args, "running tool");
        let output = process.output().map_err(|source| Error::ToolSpawn {
            program: cmd.program.clone(),
            source,
        })?;
        Ok(ToolOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_args_and_cwd() {
        let cmd = ToolCommand::new("python3")
            .arg("scripts/genlink.py")
            .args(["ld/devices.data", "stm32f103c8"])
            .current_dir("/fw");
        assert_eq!(cmd.args, vec!["scripts/genlink.py", "ld/devices.data", "stm32f103c8"]);
        assert_eq!(cmd.cwd.as_deref(), Some(Path::new("/fw")));
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let err = ProcessRunner
            .run(&ToolCommand::new("definitely-not-a-real-tool-7f3a"))
            .unwrap_err();
        assert!(matches!(err, Error::ToolSpawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn captures_status_and_output() {
        let out = ProcessRunner
            .run(&ToolCommand::new("sh").args(["-c", "echo hi; echo err >&2; exit 3"]))
            .unwrap();
        assert_eq!(out.status, 3);
        assert_eq!(out.stdout.trim(), "hi");
        assert_eq!(out.stderr.trim(), "err");
        assert!(!out.success());
    }
}

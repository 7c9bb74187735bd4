//! External process execution.
//!
//! External tools are described by a [`CommandSpec`] (program, arguments and an
//! optional working directory) rather than a shell string. The working directory
//! is set on the child only; the current directory of this process is never changed.
//!
//! Execution is fail-fast: [`run_sequence`] stops at the first command that exits
//! non-zero, so later steps never run after a failure.

use crate::error::{ProcessError, Result};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

/// A structured external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: OsString,
    args: Vec<OsString>,
    current_dir: Option<PathBuf>,
}

impl CommandSpec {
    /// Create a command for `program`, resolved through `PATH` when not a path
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    /// Append `<flag><path>`, e.g. `-plugin=` followed by a path
    pub fn flag_path(self, flag: &str, path: &Path) -> Self {
        let mut arg = OsString::from(flag);
        arg.push(path.as_os_str());
        self.arg(arg)
    }

    /// Run the child in `dir`
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Program name or path
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Arguments in order
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Working directory of the child, if set
    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }
}

fn quote(part: &OsStr) -> String {
    let s = part.to_string_lossy();
    if s.is_empty() || s.contains(|c: char| c.is_whitespace() || c == '"') {
        format!("\"{}\"", s.replace('"', "\\\""))
    } else {
        s.into_owned()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

/// Execute `command` and wait for it, returning its exit code.
///
/// A child terminated by a signal reports `-1`.
pub async fn run(command: &CommandSpec) -> Result<i32> {
    let program = which::which(&command.program).map_err(|e| ProcessError::ToolNotFound {
        program: command.program.to_string_lossy().into_owned(),
        reason: e.to_string(),
    })?;

    let mut cmd = tokio::process::Command::new(&program);
    cmd.args(&command.args);
    if let Some(dir) = &command.current_dir {
        cmd.current_dir(dir);
    }

    log::info!("running {}", command);
    let status = cmd
        .status()
        .await
        .map_err(|error| ProcessError::SpawnFailed {
            command: command.to_string(),
            error,
        })?;

    let code = status.code().unwrap_or(-1);
    log::debug!("{} exited with {}", command, code);
    Ok(code)
}

/// Execute `command`, failing with [`ProcessError::CommandFailed`] on a non-zero exit.
pub async fn run_checked(command: &CommandSpec) -> Result<()> {
    let code = run(command).await?;
    if code != 0 {
        return Err(ProcessError::CommandFailed {
            command: command.to_string(),
            code,
        }
        .into());
    }
    Ok(())
}

/// Execute `commands` in order, stopping at the first failure.
pub async fn run_sequence(commands: &[CommandSpec]) -> Result<()> {
    for command in commands {
        run_checked(command).await?;
    }
    Ok(())
}

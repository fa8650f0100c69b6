//! External command execution.
//!
//! The checksum and publish steps shell out through the [`CommandRunner`]
//! trait so that tests can swap in an in-memory fake. [`TokioCommandRunner`]
//! is the real implementation.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

/// Ceiling applied to every external command.
pub const SUBPROCESS_TIMEOUT: Duration = Duration::from_secs(30);

const REDACTED: &str = "[REDACTED]";

/// A program invocation: program, arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program to execute
    pub program: String,
    /// Arguments passed verbatim (no shell)
    pub args: Vec<String>,
    /// Working directory, inherited when `None`
    pub current_dir: Option<PathBuf>,
    secrets: Vec<String>,
}

impl CommandSpec {
    /// Creates a spec for `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            secrets: Vec::new(),
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Appends a path argument.
    #[must_use]
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    /// Sets the working directory.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Masks `secret` wherever it appears in [`CommandSpec::display`].
    #[must_use]
    pub fn redacting(mut self, secret: impl Into<String>) -> Self {
        let secret = secret.into();
        if !secret.is_empty() {
            self.secrets.push(secret);
        }
        self
    }

    /// Command line suitable for logs and error messages.
    #[must_use]
    pub fn display(&self) -> String {
        let mut line = std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        for secret in &self.secrets {
            line = line.replace(secret.as_str(), REDACTED);
        }
        line
    }
}

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output, lossily decoded
    pub stdout: String,
    /// Standard error, lossily decoded
    pub stderr: String,
}

impl CommandOutput {
    /// Creates output with the given stdout and empty stderr.
    #[must_use]
    pub fn stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }
}

/// Runs external commands under a time limit.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `command` to completion, or fails once `timeout` elapses.
    ///
    /// # Errors
    ///
    /// - [`Error::ProcessTimeout`] when the deadline passes,
    /// - [`Error::ProcessExit`] when the command exits non-zero,
    /// - [`Error::ProcessSpawn`] when it cannot be started.
    async fn run(&self, command: &CommandSpec, timeout: Duration) -> Result<CommandOutput>;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, command: &CommandSpec, timeout: Duration) -> Result<CommandOutput> {
        let command_line = command.display();
        let start_time = Instant::now();
        debug!(command = %command_line, timeout_secs = timeout.as_secs(), "Running command");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.current_dir {
            cmd.current_dir(dir);
        }

        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(io_error)) => return Err(Error::process_spawn(command_line, io_error)),
            Err(_elapsed) => {
                warn!(command = %command_line, "Command timed out after {} seconds", timeout.as_secs());
                return Err(Error::process_timeout(command_line, timeout));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            warn!(command = %command_line, code = ?output.status.code(), "Command failed");
            return Err(Error::process_exit(
                command_line,
                output.status.code(),
                stderr.trim(),
            ));
        }

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = start_time.elapsed().as_millis() as u64;
        debug!(command = %command_line, duration_ms, "Command completed");
        Ok(CommandOutput { stdout, stderr })
    }
}

//! Error types for the release pipeline.
//!
//! Every failure a run can hit maps onto one variant here. Components return
//! these through [`Result`]; none of them terminate the process.

use miette::Diagnostic;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for release operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while publishing a formula.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// A required configuration value is missing or malformed.
    #[error("{message}")]
    #[diagnostic(code(releaser::config), help("{help}"))]
    Config {
        /// The error message
        message: String,
        /// Help text for the user
        help: String,
    },

    /// An outbound request failed or returned a non-success status.
    #[error("Request to {url} failed: {message}")]
    #[diagnostic(
        code(releaser::transport),
        help("Check the token permissions and that the repository has a published release")
    )]
    Transport {
        /// The requested URL
        url: String,
        /// The error message
        message: String,
        /// HTTP status, when the server answered
        status: Option<u16>,
    },

    /// An external command exceeded its time budget.
    #[error("Command `{command}` timed out after {} seconds", timeout.as_secs())]
    #[diagnostic(code(releaser::process_timeout))]
    ProcessTimeout {
        /// The command line (secrets redacted)
        command: String,
        /// The ceiling that was exceeded
        timeout: Duration,
    },

    /// An external command ran but exited unsuccessfully.
    #[error("Command `{command}` failed with exit status {}", exit_label(*code))]
    #[diagnostic(code(releaser::process_exit), help("{stderr}"))]
    ProcessExit {
        /// The command line (secrets redacted)
        command: String,
        /// Exit code, `None` when killed by a signal
        code: Option<i32>,
        /// Captured standard error
        stderr: String,
    },

    /// An external command could not be started at all.
    #[error("Failed to start command `{command}`")]
    #[diagnostic(
        code(releaser::process_spawn),
        help("Ensure the program is installed and on PATH")
    )]
    ProcessSpawn {
        /// The command line (secrets redacted)
        command: String,
        /// The underlying source error
        #[source]
        source: std::io::Error,
    },

    /// An external command succeeded but produced unusable output.
    #[error("Command `{command}` produced unexpected output: {message}")]
    #[diagnostic(code(releaser::process_output))]
    ProcessOutput {
        /// The command line (secrets redacted)
        command: String,
        /// The error message
        message: String,
    },

    /// A local filesystem operation failed.
    #[error("Failed to {operation} {}", path.display())]
    #[diagnostic(
        code(releaser::io),
        help("Check file permissions and ensure the path exists")
    )]
    Io {
        /// What was being attempted (e.g. "write", "create directory")
        operation: &'static str,
        /// The path that caused the error
        path: PathBuf,
        /// The underlying source error
        #[source]
        source: std::io::Error,
    },
}

fn exit_label(code: Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

impl Error {
    /// Create a new configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a new transport error without an HTTP status.
    #[must_use]
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new transport error for a non-success HTTP status.
    #[must_use]
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::Transport {
            url: url.into(),
            message: format!("server responded with HTTP {status}"),
            status: Some(status),
        }
    }

    /// Create a new process timeout error.
    #[must_use]
    pub fn process_timeout(command: impl Into<String>, timeout: Duration) -> Self {
        Self::ProcessTimeout {
            command: command.into(),
            timeout,
        }
    }

    /// Create a new process exit error.
    #[must_use]
    pub fn process_exit(
        command: impl Into<String>,
        code: Option<i32>,
        stderr: impl Into<String>,
    ) -> Self {
        Self::ProcessExit {
            command: command.into(),
            code,
            stderr: stderr.into(),
        }
    }

    /// Create a new process spawn error.
    #[must_use]
    pub fn process_spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::ProcessSpawn {
            command: command.into(),
            source,
        }
    }

    /// Create a new process output error.
    #[must_use]
    pub fn process_output(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProcessOutput {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error.
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Short machine-readable kind, used in JSON error envelopes.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Transport { .. } => "transport",
            Self::ProcessTimeout { .. } => "process_timeout",
            Self::ProcessExit { .. } => "process_exit",
            Self::ProcessSpawn { .. } => "process_spawn",
            Self::ProcessOutput { .. } => "process_output",
            Self::Io { .. } => "io",
        }
    }
}

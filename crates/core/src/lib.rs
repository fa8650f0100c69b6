//! Shared building blocks for homebrew-releaser.
//!
//! - [`config`] - environment snapshot and validated [`ReleaseConfig`]
//! - [`error`] - the [`Error`] taxonomy every stage reports through
//! - [`fs`] - file writing with explicit failure signaling
//! - [`process`] - the [`CommandRunner`] seam for external commands

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod config;
pub mod error;
pub mod fs;
pub mod process;

pub use config::{Committer, EnvSnapshot, FormulaFields, ReleaseConfig, Repository};
pub use error::{Error, Result};
pub use fs::{WriteMode, write_file};
pub use process::{
    CommandOutput, CommandRunner, CommandSpec, SUBPROCESS_TIMEOUT, TokioCommandRunner,
};

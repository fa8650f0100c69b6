//! Release pipeline for homebrew-releaser.
//!
//! The [`ReleaseOrchestrator`] composes the GitHub and Homebrew crates into a
//! single linear run and reports either a [`RunReport`] or the failing
//! [`Stage`].
//!
//! # Example
//!
//! ```rust,ignore
//! use releaser_core::{EnvSnapshot, TokioCommandRunner};
//! use releaser_github::HttpFetcher;
//! use releaser_release::{ReleaseOrchestrator, RunOverrides};
//!
//! let fetcher = HttpFetcher::new();
//! let orchestrator = ReleaseOrchestrator::new(&fetcher, &TokioCommandRunner);
//! let report = orchestrator
//!     .run(&EnvSnapshot::capture(), &RunOverrides::default())
//!     .await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod orchestrator;

pub use orchestrator::{ReleaseOrchestrator, RunOverrides, RunReport, Stage, StageError};

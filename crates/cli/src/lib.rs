//! homebrew-releaser command-line application.
//!
//! Exposes argument parsing, tracing setup and result rendering so the
//! binary stays a thin wrapper.

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod cli;
pub mod tracing;

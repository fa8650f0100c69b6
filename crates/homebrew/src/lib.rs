//! Homebrew side of homebrew-releaser.
//!
//! - [`checksum`] hashes the downloaded archive with `shasum`
//! - [`formula`] renders the Ruby formula
//! - [`publish`] commits the formula to the tap with git

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod checksum;
pub mod formula;
pub mod publish;

pub use checksum::compute_checksum;
pub use formula::{FormulaData, FormulaGenerator};
pub use publish::{PublishOutcome, PublishRequest, Publisher};

//! GitHub access for homebrew-releaser.
//!
//! This crate looks up a repository's latest release through the REST API and
//! downloads its source archive.
//!
//! # Example
//!
//! ```rust,ignore
//! use releaser_github::{ArchiveResolver, HttpFetcher, archive_path};
//!
//! let fetcher = HttpFetcher::new();
//! let resolver = ArchiveResolver::new(&fetcher, &config.api_url, &config.token);
//! let metadata = resolver.fetch_metadata(&config.repository).await?;
//! let dest = archive_path(&config.work_dir, &config.repository.name, &metadata.version);
//! let archive = resolver.fetch_archive(&metadata, &dest).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod fetch;
pub mod release;

pub use fetch::{FetchRequest, Fetcher, HttpFetcher, Payload, ResponseKind};
pub use release::{ArchiveArtifact, ArchiveResolver, ReleaseMetadata, archive_path};

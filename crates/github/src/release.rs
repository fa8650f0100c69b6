//! Latest-release lookup and archive download.

use crate::fetch::{FetchRequest, Fetcher, ResponseKind};
use releaser_core::{Error, Repository, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Release metadata from the API.
#[derive(Debug, Deserialize)]
struct LatestRelease {
    tag_name: String,
    tarball_url: Option<String>,
}

/// The release being published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseMetadata {
    /// Tag name, e.g. `v1.2.0`
    pub version: String,
    /// Source archive download URL
    pub archive_url: String,
}

/// Downloaded archive on local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveArtifact {
    /// Local path
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
}

/// URL of the latest-release endpoint for `repository`.
#[must_use]
pub fn latest_release_url(api_url: &str, repository: &Repository) -> String {
    format!(
        "{}/repos/{}/{}/releases/latest",
        api_url.trim_end_matches('/'),
        repository.owner,
        repository.name
    )
}

/// Local path the archive of `version` is stored at.
#[must_use]
pub fn archive_path(work_dir: &Path, name: &str, version: &str) -> PathBuf {
    let version = version.replace(['/', '\\'], "-");
    work_dir.join(format!("{name}-{version}.tar.gz"))
}

/// Parses the latest-release response body.
///
/// # Errors
///
/// Returns [`Error::Transport`] for `url` when the body is not a release or
/// lacks a tag or archive URL.
pub fn parse_release(url: &str, body: &str) -> Result<ReleaseMetadata> {
    let release: LatestRelease = serde_json::from_str(body)
        .map_err(|e| Error::transport(url, format!("unexpected release metadata: {e}")))?;

    let version = release.tag_name.trim();
    if version.is_empty() {
        return Err(Error::transport(url, "release metadata has an empty tag_name"));
    }

    let archive_url = release
        .tarball_url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| Error::transport(url, "release metadata has no tarball_url"))?;

    Ok(ReleaseMetadata {
        version: version.to_string(),
        archive_url: archive_url.to_string(),
    })
}

/// Resolves a repository's latest release to a local archive.
///
/// Issues one metadata request and one archive download, both through the
/// [`Fetcher`].
pub struct ArchiveResolver<'a> {
    fetcher: &'a dyn Fetcher,
    api_url: &'a str,
    token: &'a SecretString,
}

impl<'a> ArchiveResolver<'a> {
    /// Creates a resolver.
    #[must_use]
    pub fn new(fetcher: &'a dyn Fetcher, api_url: &'a str, token: &'a SecretString) -> Self {
        Self {
            fetcher,
            api_url,
            token,
        }
    }

    /// Fetches the latest release's tag and archive URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when the request fails or the response is
    /// not usable release metadata.
    pub async fn fetch_metadata(&self, repository: &Repository) -> Result<ReleaseMetadata> {
        let url = latest_release_url(self.api_url, repository);
        debug!(%url, repository = %repository, "Fetching latest release");

        let body = self
            .fetcher
            .fetch(&FetchRequest::new(
                url.as_str(),
                ResponseKind::Text,
                self.token.clone(),
            ))
            .await?
            .into_text();

        let metadata = parse_release(&url, &body)?;
        info!(
            version = %metadata.version,
            archive_url = %metadata.archive_url,
            "Found latest release"
        );
        Ok(metadata)
    }

    /// Downloads the archive named in `metadata` to `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] when the download fails, or
    /// [`Error::Io`] when the archive cannot be written.
    pub async fn fetch_archive(
        &self,
        metadata: &ReleaseMetadata,
        dest: &Path,
    ) -> Result<ArchiveArtifact> {
        debug!(url = %metadata.archive_url, dest = %dest.display(), "Downloading archive");

        let size = self
            .fetcher
            .download(
                &FetchRequest::new(
                    metadata.archive_url.as_str(),
                    ResponseKind::Binary,
                    self.token.clone(),
                ),
                dest,
            )
            .await?;
        info!(path = %dest.display(), bytes = size, "Archive downloaded");

        Ok(ArchiveArtifact {
            path: dest.to_path_buf(),
            size,
        })
    }
}

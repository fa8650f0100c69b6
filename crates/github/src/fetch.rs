//! Outbound HTTP requests against the GitHub API.
//!
//! All transport failures (connection errors, timeouts, non-success statuses,
//! unreadable bodies) come back as [`Error::Transport`]. Requests are never
//! retried.

use async_trait::async_trait;
use bytes::Bytes;
use releaser_core::{Error, Result, WriteMode, write_file};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio::sync::OnceCell;
use tracing::debug;

/// User agent sent with every request.
pub const USER_AGENT_VALUE: &str = "homebrew-releaser";

/// Media type requested from the API.
pub const ACCEPT_VALUE: &str = "application/vnd.github+json";

/// API version pinned on every request.
pub const API_VERSION: &str = "2022-11-28";

/// How the response body should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Decode the body as UTF-8 text (JSON metadata)
    Text,
    /// Keep the body as raw bytes (archives)
    Binary,
}

/// A single GET request.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Absolute URL
    pub url: String,
    /// Body handling
    pub kind: ResponseKind,
    /// Bearer token for the `Authorization` header
    pub token: SecretString,
}

impl FetchRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(url: impl Into<String>, kind: ResponseKind, token: SecretString) -> Self {
        Self {
            url: url.into(),
            kind,
            token,
        }
    }
}

/// Response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Decoded text
    Text(String),
    /// Raw bytes
    Binary(Bytes),
}

impl Payload {
    /// Body as text; binary bodies are decoded lossily.
    #[must_use]
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Binary(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// Body as bytes.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Text(text) => Bytes::from(text),
            Self::Binary(bytes) => bytes,
        }
    }
}

/// Performs outbound read requests.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issues one GET request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] for any transport-level failure.
    async fn fetch(&self, request: &FetchRequest) -> Result<Payload>;

    /// Issues one GET request and writes the body to `dest`, returning the
    /// number of bytes written.
    ///
    /// The default buffers the whole body through [`Fetcher::fetch`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] for transport failures and [`Error::Io`]
    /// when `dest` cannot be written.
    async fn download(&self, request: &FetchRequest, dest: &Path) -> Result<u64> {
        let bytes = self.fetch(request).await?.into_bytes();
        write_file(dest, &bytes, WriteMode::Overwrite)?;
        Ok(bytes.len() as u64)
    }
}

/// Builds the fixed header set for a request.
///
/// # Errors
///
/// Returns [`Error::Transport`] when the token cannot be sent as a header.
pub fn request_headers(url: &str, token: &SecretString) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    headers.insert(
        HeaderName::from_static("x-github-api-version"),
        HeaderValue::from_static(API_VERSION),
    );

    let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
        .map_err(|_| Error::transport(url, "access token contains invalid header characters"))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);

    Ok(headers)
}

/// [`Fetcher`] backed by `reqwest`.
///
/// The client is built on first use, so constructing a fetcher never fails.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: OnceCell<Client>,
}

impl HttpFetcher {
    /// Creates a fetcher with default client settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self {
            client: OnceCell::new_with(Some(client)),
        }
    }

    async fn client(&self, url: &str) -> Result<&Client> {
        self.client
            .get_or_try_init(|| async {
                Client::builder()
                    .build()
                    .map_err(|e| Error::transport(url, format!("failed to create HTTP client: {e}")))
            })
            .await
    }

    /// Sends the GET and rejects non-success statuses.
    async fn send(&self, request: &FetchRequest) -> Result<Response> {
        let url = request.url.as_str();
        debug!(%url, kind = ?request.kind, "Sending GET request");

        let response = self
            .client(url)
            .await?
            .get(url)
            .headers(request_headers(url, &request.token)?)
            .send()
            .await
            .map_err(|e| Error::transport(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::http_status(url, status.as_u16()));
        }
        debug!(%url, status = status.as_u16(), "Response received");
        Ok(response)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<Payload> {
        let url = request.url.as_str();
        let response = self.send(request).await?;
        let read_error = |e: reqwest::Error| Error::transport(url, format!("failed to read body: {e}"));

        Ok(match request.kind {
            ResponseKind::Text => Payload::Text(response.text().await.map_err(read_error)?),
            ResponseKind::Binary => Payload::Binary(response.bytes().await.map_err(read_error)?),
        })
    }

    async fn download(&self, request: &FetchRequest, dest: &Path) -> Result<u64> {
        let url = request.url.as_str();
        let mut response = self.send(request).await?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::io("create directory", parent, e))?;
        }
        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| Error::io("create", dest, e))?;

        let mut written: u64 = 0;
        loop {
            let chunk = match response.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    drop(file);
                    let _ = tokio::fs::remove_file(dest).await;
                    return Err(Error::transport(url, format!("failed to read body: {e}")));
                }
            };
            file.write_all(&chunk)
                .await
                .map_err(|e| Error::io("write", dest, e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| Error::io("write", dest, e))?;

        debug!(%url, dest = %dest.display(), bytes = written, "Download completed");
        Ok(written)
    }
}

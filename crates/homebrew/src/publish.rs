//! Publishing a rendered formula to the tap with git.
//!
//! The tap is cloned fresh into the working directory, the formula is copied
//! in, and a single commit is pushed. Every git invocation goes through the
//! [`CommandRunner`] with [`SUBPROCESS_TIMEOUT`].

use releaser_core::fs::{copy_file, remove_dir_if_exists};
use releaser_core::{
    CommandRunner, CommandSpec, Committer, ReleaseConfig, Repository, Result, SUBPROCESS_TIMEOUT,
};
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const GIT: &str = "git";

/// Everything needed to publish one formula.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    /// Tap repository
    pub tap: Repository,
    /// Base URL of the GitHub server hosting the tap
    pub server_url: String,
    /// Commit identity
    pub committer: Committer,
    /// Formula name, also the file stem
    pub formula_name: String,
    /// Rendered formula on local disk
    pub formula_file: PathBuf,
    /// Folder inside the tap holding formulas
    pub formula_folder: String,
    /// Release version, as tagged
    pub version: String,
    /// Where the tap is cloned
    pub checkout_dir: PathBuf,
    /// Token used in the clone URL
    pub token: SecretString,
    /// Enter the publish step without running any command
    pub skip_commit: bool,
}

impl PublishRequest {
    /// Builds a request for `version` from the run configuration.
    #[must_use]
    pub fn new(config: &ReleaseConfig, formula_file: &Path, version: &str) -> Self {
        Self {
            tap: config.tap.clone(),
            server_url: config.server_url.clone(),
            committer: config.committer.clone(),
            formula_name: config.formula_name().to_string(),
            formula_file: formula_file.to_path_buf(),
            formula_folder: config.formula_folder.clone(),
            version: version.to_string(),
            checkout_dir: config.work_dir.join(&config.tap.name),
            token: config.token.clone(),
            skip_commit: config.skip_commit,
        }
    }

    /// Formula path relative to the tap root.
    #[must_use]
    pub fn formula_path(&self) -> String {
        if self.formula_folder.is_empty() {
            format!("{}.rb", self.formula_name)
        } else {
            format!("{}/{}.rb", self.formula_folder, self.formula_name)
        }
    }

    /// Message of the formula commit.
    #[must_use]
    pub fn commit_message(&self) -> String {
        format!(
            "Brew formula update for {} version {}",
            self.formula_name, self.version
        )
    }

    /// Token-authenticated clone URL of the tap.
    fn clone_url(&self) -> String {
        let (scheme, host) = self
            .server_url
            .split_once("://")
            .unwrap_or(("https", self.server_url.as_str()));
        format!(
            "{scheme}://x-access-token:{}@{}/{}/{}.git",
            self.token.expose_secret(),
            host.trim_end_matches('/'),
            self.tap.owner,
            self.tap.name
        )
    }
}

/// Result of the publish step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// A commit was created and pushed.
    Pushed {
        /// Commit message used
        commit_message: String,
        /// Formula path inside the tap
        formula_path: String,
    },
    /// Skip-commit mode; nothing was run.
    Skipped,
}

/// Commits formulas to a tap through git.
pub struct Publisher<'a> {
    runner: &'a dyn CommandRunner,
}

impl<'a> Publisher<'a> {
    /// Creates a publisher over `runner`.
    #[must_use]
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner }
    }

    /// Clones the tap, commits the formula and pushes.
    ///
    /// # Errors
    ///
    /// Returns the first failing git command's error, or [`Error::Io`] when
    /// the checkout cannot be prepared or the formula cannot be copied.
    ///
    /// [`Error::Io`]: releaser_core::Error::Io
    pub async fn publish(&self, request: &PublishRequest) -> Result<PublishOutcome> {
        if request.skip_commit {
            info!(tap = %request.tap, "Skipping commit and push");
            return Ok(PublishOutcome::Skipped);
        }

        let checkout = &request.checkout_dir;
        let formula_path = request.formula_path();
        let commit_message = request.commit_message();
        let token = request.token.expose_secret();

        remove_dir_if_exists(checkout)?;
        self.git(
            CommandSpec::new(GIT)
                .args(["clone", "--depth=1"])
                .arg(request.clone_url())
                .path_arg(checkout)
                .redacting(token),
        )
        .await?;

        copy_file(&request.formula_file, &checkout.join(&formula_path))?;
        debug!(path = %formula_path, "Copied formula into tap checkout");

        self.git(in_checkout(checkout).arg("add").arg(formula_path.as_str()))
            .await?;
        self.git(
            in_checkout(checkout)
                .arg("-c")
                .arg(format!("user.name={}", request.committer.name))
                .arg("-c")
                .arg(format!("user.email={}", request.committer.email))
                .args(["commit", "-m"])
                .arg(commit_message.as_str()),
        )
        .await?;
        self.git(
            in_checkout(checkout)
                .args(["push", "origin", "HEAD"])
                .redacting(token),
        )
        .await?;

        info!(
            tap = %request.tap,
            path = %formula_path,
            version = %request.version,
            "Formula pushed to tap"
        );

        Ok(PublishOutcome::Pushed {
            commit_message,
            formula_path,
        })
    }

    async fn git(&self, command: CommandSpec) -> Result<()> {
        self.runner.run(&command, SUBPROCESS_TIMEOUT).await?;
        Ok(())
    }
}

fn in_checkout(checkout: &Path) -> CommandSpec {
    CommandSpec::new(GIT).arg("-C").path_arg(checkout)
}

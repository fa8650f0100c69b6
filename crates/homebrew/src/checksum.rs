//! Archive checksumming via `shasum`.

use releaser_core::{CommandRunner, CommandSpec, Error, Result, SUBPROCESS_TIMEOUT};
use std::path::Path;
use tracing::info;

/// Program used to hash archives.
pub const CHECKSUM_PROGRAM: &str = "shasum";

/// Builds `shasum -a 256 <path>`.
#[must_use]
pub fn checksum_command(path: &Path) -> CommandSpec {
    CommandSpec::new(CHECKSUM_PROGRAM)
        .args(["-a", "256"])
        .path_arg(path)
}

/// Takes the first whitespace-delimited token of `stdout` as the digest.
///
/// # Errors
///
/// Returns [`Error::ProcessOutput`] when `stdout` is blank.
pub fn parse_digest(command: &CommandSpec, stdout: &str) -> Result<String> {
    stdout
        .split_whitespace()
        .next()
        .map(String::from)
        .ok_or_else(|| Error::process_output(command.display(), "no digest on standard output"))
}

/// Computes the SHA-256 digest of the file at `path`.
///
/// Runs the checksum command exactly once, bounded by [`SUBPROCESS_TIMEOUT`].
///
/// # Errors
///
/// Returns the runner's timeout, exit or spawn error unchanged, or
/// [`Error::ProcessOutput`] when no digest is printed.
pub async fn compute_checksum(runner: &dyn CommandRunner, path: &Path) -> Result<String> {
    let command = checksum_command(path);
    let output = runner.run(&command, SUBPROCESS_TIMEOUT).await?;
    let digest = parse_digest(&command, &output.stdout)?;
    info!(path = %path.display(), sha256 = %digest, "Computed archive checksum");
    Ok(digest)
}

//! Release orchestrator.
//!
//! Drives one run through a fixed sequence of stages:
//! validate config, fetch metadata, fetch archive, compute checksum, render
//! formula, write formula, publish. The first failure ends the run and is
//! reported together with the stage it happened in.

use miette::Diagnostic;
use releaser_core::{
    CommandRunner, EnvSnapshot, Error, ReleaseConfig, WriteMode, write_file,
};
use releaser_github::{ArchiveResolver, Fetcher, archive_path};
use releaser_homebrew::{
    FormulaData, FormulaGenerator, PublishOutcome, PublishRequest, Publisher, compute_checksum,
};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Validate the environment into a configuration.
    ValidateConfig,
    /// Look up the latest release.
    FetchMetadata,
    /// Download the release archive.
    FetchArchive,
    /// Hash the archive.
    ComputeChecksum,
    /// Render the formula text.
    RenderFormula,
    /// Persist the formula locally.
    WriteFormula,
    /// Commit the formula to the tap.
    Publish,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Self; 7] = [
        Self::ValidateConfig,
        Self::FetchMetadata,
        Self::FetchArchive,
        Self::ComputeChecksum,
        Self::RenderFormula,
        Self::WriteFormula,
        Self::Publish,
    ];

    /// Short stage name used in logs and error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ValidateConfig => "validate-config",
            Self::FetchMetadata => "fetch-metadata",
            Self::FetchArchive => "fetch-archive",
            Self::ComputeChecksum => "compute-checksum",
            Self::RenderFormula => "render-formula",
            Self::WriteFormula => "write-formula",
            Self::Publish => "publish",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A run failure, tagged with the stage that failed.
#[derive(Error, Debug, Diagnostic)]
#[error("Stage {stage} failed: {error}")]
#[diagnostic(forward(error))]
pub struct StageError {
    /// Stage that failed
    pub stage: Stage,
    /// Underlying failure
    pub error: Error,
}

impl StageError {
    /// Wraps `error` as a failure of `stage`.
    #[must_use]
    pub const fn new(stage: Stage, error: Error) -> Self {
        Self { stage, error }
    }
}

/// Command-line values layered over the environment.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    /// Force skip-commit mode
    pub skip_commit: bool,
    /// Replace the working directory
    pub work_dir: Option<PathBuf>,
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Released version (tag name)
    pub version: String,
    /// SHA-256 of the archive
    pub checksum: String,
    /// Local path of the rendered formula
    pub formula_path: PathBuf,
    /// Publish step result
    pub outcome: PublishOutcome,
}

/// Release orchestrator.
///
/// Holds the two I/O seams; everything else is derived per run from the
/// environment snapshot.
pub struct ReleaseOrchestrator<'a> {
    fetcher: &'a dyn Fetcher,
    runner: &'a dyn CommandRunner,
}

impl<'a> ReleaseOrchestrator<'a> {
    /// Creates an orchestrator over a fetcher and a command runner.
    #[must_use]
    pub fn new(fetcher: &'a dyn Fetcher, runner: &'a dyn CommandRunner) -> Self {
        Self { fetcher, runner }
    }

    /// Runs the full pipeline once.
    ///
    /// # Errors
    ///
    /// Returns a [`StageError`] for the first stage that fails. No later stage
    /// runs after a failure.
    pub async fn run(
        &self,
        env: &EnvSnapshot,
        overrides: &RunOverrides,
    ) -> Result<RunReport, StageError> {
        enter(Stage::ValidateConfig);
        let mut config = ReleaseConfig::from_env(env).map_err(at(Stage::ValidateConfig))?;
        if overrides.skip_commit {
            config = config.with_skip_commit(true);
        }
        if let Some(dir) = &overrides.work_dir {
            config = config.with_work_dir(dir);
        }
        debug!(
            repository = %config.repository,
            tap = %config.tap,
            work_dir = %config.work_dir.display(),
            skip_commit = config.skip_commit,
            "Configuration validated"
        );

        let resolver = ArchiveResolver::new(self.fetcher, &config.api_url, &config.token);

        enter(Stage::FetchMetadata);
        let metadata = resolver
            .fetch_metadata(&config.repository)
            .await
            .map_err(at(Stage::FetchMetadata))?;

        enter(Stage::FetchArchive);
        let dest = archive_path(&config.work_dir, config.formula_name(), &metadata.version);
        let archive = resolver
            .fetch_archive(&metadata, &dest)
            .await
            .map_err(at(Stage::FetchArchive))?;

        enter(Stage::ComputeChecksum);
        let checksum = compute_checksum(self.runner, &archive.path)
            .await
            .map_err(at(Stage::ComputeChecksum))?;

        enter(Stage::RenderFormula);
        let formula = FormulaGenerator::generate(&FormulaData::new(&config, &metadata, &checksum));

        enter(Stage::WriteFormula);
        let formula_path = config
            .work_dir
            .join(format!("{}.rb", config.formula_name()));
        write_file(&formula_path, &formula, WriteMode::Overwrite)
            .map_err(at(Stage::WriteFormula))?;

        enter(Stage::Publish);
        let request = PublishRequest::new(&config, &formula_path, &metadata.version);
        let outcome = Publisher::new(self.runner)
            .publish(&request)
            .await
            .map_err(at(Stage::Publish))?;

        info!(
            version = %metadata.version,
            formula = %formula_path.display(),
            "Release complete"
        );

        Ok(RunReport {
            version: metadata.version,
            checksum,
            formula_path,
            outcome,
        })
    }
}

fn enter(stage: Stage) {
    info!(stage = %stage, "Entering stage");
}

fn at(stage: Stage) -> impl FnOnce(Error) -> StageError {
    move |error| StageError::new(stage, error)
}

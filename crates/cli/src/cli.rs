//! Command-line surface: argument parsing, the run entry point and output
//! rendering.

use crate::tracing::{LogLevel, TracingFormat};
use clap::Parser;
use miette::Report;
use releaser_core::{EnvSnapshot, TokioCommandRunner};
use releaser_github::HttpFetcher;
use releaser_homebrew::PublishOutcome;
use releaser_release::{ReleaseOrchestrator, RunOverrides, RunReport, StageError};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;

/// Exit code for a successful run
pub const EXIT_OK: i32 = 0;
/// Exit code for any failed run
pub const EXIT_FAILURE: i32 = 1;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "homebrew-releaser")]
#[command(about = "Publish a Homebrew formula to a tap for the latest GitHub release")]
#[command(long_about = None)]
#[command(version)]
pub struct Cli {
    /// Skip the commit and push
    #[arg(long, help = "Render and write the formula but do not commit or push it")]
    pub skip_commit: bool,

    /// Working directory override
    #[arg(
        long,
        value_name = "DIR",
        help = "Working directory for the archive and tap checkout"
    )]
    pub work_dir: Option<PathBuf>,

    /// Log level
    #[arg(
        short = 'L',
        long,
        help = "Set logging level",
        default_value = "info",
        value_enum
    )]
    pub level: LogLevel,

    /// Log format
    #[arg(
        long,
        help = "Log output format; json also renders the result as JSON",
        default_value = "pretty",
        value_enum
    )]
    pub log_format: TracingFormat,
}

impl Cli {
    /// Whether results and errors are rendered as JSON.
    #[must_use]
    pub fn json_mode(&self) -> bool {
        self.log_format == TracingFormat::Json
    }

    /// Flag values layered over the environment.
    #[must_use]
    pub fn overrides(&self) -> RunOverrides {
        RunOverrides {
            skip_commit: self.skip_commit,
            work_dir: self.work_dir.clone(),
        }
    }
}

/// Parses process arguments, exiting on `--help` or invalid input.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}

/// Runs the pipeline once against the real network and processes.
///
/// # Errors
///
/// Returns the failing stage and cause.
pub async fn execute(cli: &Cli) -> Result<RunReport, StageError> {
    let env = EnvSnapshot::capture();
    let fetcher = HttpFetcher::new();
    let runner = TokioCommandRunner;

    ReleaseOrchestrator::new(&fetcher, &runner)
        .run(&env, &cli.overrides())
        .await
}

/// Maps a run result to the process exit code.
#[must_use]
pub const fn exit_code_for(result: &Result<RunReport, StageError>) -> i32 {
    match result {
        Ok(_) => EXIT_OK,
        Err(_) => EXIT_FAILURE,
    }
}

#[derive(Debug, Serialize)]
struct Envelope<T: Serialize> {
    status: &'static str,
    #[serde(flatten)]
    body: T,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    stage: &'static str,
    code: &'static str,
    message: String,
}

#[derive(Debug, Serialize)]
struct ReportBody<'a> {
    version: &'a str,
    sha256: &'a str,
    formula: String,
    published: bool,
}

fn error_envelope(err: &StageError) -> Envelope<ErrorBody> {
    Envelope {
        status: "error",
        body: ErrorBody {
            stage: err.stage.name(),
            code: err.error.kind(),
            message: err.to_string(),
        },
    }
}

fn report_envelope(report: &RunReport) -> Envelope<ReportBody<'_>> {
    Envelope {
        status: "ok",
        body: ReportBody {
            version: &report.version,
            sha256: &report.checksum,
            formula: report.formula_path.display().to_string(),
            published: matches!(report.outcome, PublishOutcome::Pushed { .. }),
        },
    }
}

/// Render a failure on stderr, or as a JSON envelope on stdout.
#[allow(clippy::print_stdout, clippy::print_stderr)]
pub fn render_error(err: StageError, json_mode: bool) {
    if json_mode {
        match serde_json::to_string(&error_envelope(&err)) {
            Ok(json) => println!("{json}"),
            Err(_) => eprintln!("Error serializing error response"),
        }
    } else {
        let report = Report::new(err);
        eprintln!("{report:?}");
        let _ = io::stderr().flush();
    }
}

/// Render a successful run on stdout.
#[allow(clippy::print_stdout)]
pub fn render_report(report: &RunReport, json_mode: bool) {
    if json_mode {
        if let Ok(json) = serde_json::to_string(&report_envelope(report)) {
            println!("{json}");
        }
        return;
    }

    match &report.outcome {
        PublishOutcome::Pushed { formula_path, .. } => {
            println!("Published {formula_path} for {}", report.version);
        }
        PublishOutcome::Skipped => println!(
            "Wrote {} for {} (commit skipped)",
            report.formula_path.display(),
            report.version
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use releaser_core::Error;
    use releaser_core::config::{MISSING_ENV_MESSAGE, keys};
    use releaser_release::Stage;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["homebrew-releaser"]).unwrap();

        assert!(!cli.skip_commit);
        assert!(cli.work_dir.is_none());
        assert_eq!(cli.level, LogLevel::Info);
        assert_eq!(cli.log_format, TracingFormat::Pretty);
        assert!(!cli.json_mode());
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "homebrew-releaser",
            "--skip-commit",
            "--work-dir",
            "/tmp/releaser",
            "-L",
            "debug",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.level, LogLevel::Debug);
        assert!(cli.json_mode());
        let overrides = cli.overrides();
        assert!(overrides.skip_commit);
        assert_eq!(overrides.work_dir, Some(PathBuf::from("/tmp/releaser")));
    }

    #[test]
    fn test_cli_rejects_unknown_level() {
        assert!(Cli::try_parse_from(["homebrew-releaser", "--level", "loud"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let failure: Result<RunReport, StageError> = Err(StageError::new(
            Stage::Publish,
            Error::process_exit("git push origin HEAD", Some(1), "rejected"),
        ));
        assert_eq!(exit_code_for(&failure), EXIT_FAILURE);

        let success: Result<RunReport, StageError> = Ok(RunReport {
            version: "v1.0.0".to_string(),
            checksum: "abc123".to_string(),
            formula_path: PathBuf::from("/tmp/tool.rb"),
            outcome: PublishOutcome::Skipped,
        });
        assert_eq!(exit_code_for(&success), EXIT_OK);
    }

    #[test]
    fn test_error_envelope() {
        let err = StageError::new(
            Stage::FetchArchive,
            Error::http_status("https://api.github.com/x", 502),
        );
        let json = serde_json::to_value(error_envelope(&err)).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["stage"], "fetch-archive");
        assert_eq!(json["code"], "transport");
        assert!(json["message"].as_str().unwrap().contains("HTTP 502"));
    }

    #[test]
    fn test_report_envelope() {
        let report = RunReport {
            version: "v1.0.0".to_string(),
            checksum: "abc123".to_string(),
            formula_path: PathBuf::from("/tmp/tool.rb"),
            outcome: PublishOutcome::Pushed {
                commit_message: "Brew formula update for tool version v1.0.0".to_string(),
                formula_path: "Formula/tool.rb".to_string(),
            },
        };
        let json = serde_json::to_value(report_envelope(&report)).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], "v1.0.0");
        assert_eq!(json["sha256"], "abc123");
        assert_eq!(json["published"], true);
    }

    #[tokio::test]
    async fn test_execute_without_environment_fails_validation() {
        let unset: Vec<(&str, Option<&str>)> =
            keys::REQUIRED.iter().map(|key| (*key, None)).collect();
        let cli = Cli::try_parse_from(["homebrew-releaser"]).unwrap();

        let err = temp_env::async_with_vars(unset, execute(&cli))
            .await
            .unwrap_err();

        assert_eq!(err.stage, Stage::ValidateConfig);
        assert!(err.to_string().contains(MISSING_ENV_MESSAGE));
    }
}

//! Run configuration.
//!
//! The process environment is captured once into an [`EnvSnapshot`] at startup
//! and validated into an immutable [`ReleaseConfig`]. Validation is all or
//! nothing: every required key is checked before an error is returned, and no
//! network or process call happens until it succeeds.

use crate::error::{Error, Result};
use secrecy::SecretString;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Message reported when any required value is absent.
pub const MISSING_ENV_MESSAGE: &str =
    "You must provide all necessary environment variables. Please reference the documentation.";

/// Default GitHub API base URL.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Default GitHub web host, used for the tap clone URL.
pub const DEFAULT_SERVER_URL: &str = "https://github.com";

/// Default folder inside the tap that holds formulas.
pub const DEFAULT_FORMULA_FOLDER: &str = "Formula";

/// Environment keys read by [`ReleaseConfig::from_env`].
pub mod keys {
    /// Source repository as `owner/name`.
    pub const GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";
    /// Token used for the API and for pushing to the tap.
    pub const GITHUB_TOKEN: &str = "INPUT_GITHUB_TOKEN";
    /// Owner of the tap repository.
    pub const HOMEBREW_OWNER: &str = "INPUT_HOMEBREW_OWNER";
    /// Name of the tap repository.
    pub const HOMEBREW_TAP: &str = "INPUT_HOMEBREW_TAP";
    /// Committer name.
    pub const COMMIT_OWNER: &str = "INPUT_COMMIT_OWNER";
    /// Committer email.
    pub const COMMIT_EMAIL: &str = "INPUT_COMMIT_EMAIL";
    /// Formula `desc`.
    pub const DESCRIPTION: &str = "INPUT_DESCRIPTION";
    /// Formula `homepage`.
    pub const HOMEPAGE: &str = "INPUT_HOMEPAGE";
    /// Formula `license`.
    pub const LICENSE: &str = "INPUT_LICENSE";
    /// Body of the formula's `install` method.
    pub const INSTALL: &str = "INPUT_INSTALL";
    /// Body of the formula's `test` block.
    pub const TEST: &str = "INPUT_TEST";
    /// Newline or comma separated dependency list.
    pub const DEPENDS_ON: &str = "INPUT_DEPENDS_ON";
    /// Folder inside the tap that holds formulas.
    pub const FORMULA_FOLDER: &str = "INPUT_FORMULA_FOLDER";
    /// Local working directory for the archive and tap checkout.
    pub const WORK_DIR: &str = "INPUT_WORK_DIR";
    /// Render and write the formula but do not commit it.
    pub const SKIP_COMMIT: &str = "INPUT_SKIP_COMMIT";
    /// GitHub API base URL (set by GitHub Actions, also on GHES).
    pub const API_URL: &str = "GITHUB_API_URL";
    /// GitHub web base URL hosting the tap (set by GitHub Actions, also on GHES).
    pub const SERVER_URL: &str = "GITHUB_SERVER_URL";

    /// Keys that must be present and non-empty.
    pub const REQUIRED: &[&str] = &[
        GITHUB_REPOSITORY,
        GITHUB_TOKEN,
        HOMEBREW_OWNER,
        HOMEBREW_TAP,
        COMMIT_OWNER,
        COMMIT_EMAIL,
        DESCRIPTION,
        HOMEPAGE,
        LICENSE,
        INSTALL,
        TEST,
    ];
}

/// Point-in-time copy of the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Captures the current process environment.
    #[must_use]
    pub fn capture() -> Self {
        Self::from_pairs(std::env::vars())
    }

    /// Builds a snapshot from explicit pairs.
    #[must_use]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Returns a copy with `key` set to `value`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Returns a copy with `key` removed.
    #[must_use]
    pub fn without(mut self, key: &str) -> Self {
        self.vars.remove(key);
        self
    }

    /// Looks up a value, treating whitespace-only values as absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Looks up a value verbatim, still treating whitespace-only values as
    /// absent.
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// A GitHub repository identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// Owning user or organization
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl Repository {
    /// Creates a repository identity.
    #[must_use]
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parses an `owner/name` slug, splitting on the first slash.
    #[must_use]
    pub fn parse(slug: &str) -> Option<Self> {
        let (owner, name) = slug.split_once('/')?;
        let (owner, name) = (owner.trim(), name.trim());
        if owner.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(owner, name))
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Identity recorded on the tap commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committer {
    /// Author name
    pub name: String,
    /// Author email
    pub email: String,
}

/// Fields substituted into the formula template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaFields {
    /// One-line description
    pub description: String,
    /// Project homepage URL
    pub homepage: String,
    /// SPDX license identifier
    pub license: String,
    /// Ruby body of `def install`
    pub install: String,
    /// Ruby body of `test do`
    pub test: String,
    /// Formula dependencies, in declaration order
    pub depends_on: Vec<String>,
}

/// Immutable configuration for a single run.
#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    /// Repository whose latest release is published
    pub repository: Repository,
    /// Access token for the API and the tap push
    pub token: SecretString,
    /// Tap repository receiving the formula
    pub tap: Repository,
    /// Commit identity
    pub committer: Committer,
    /// Template fields
    pub formula: FormulaFields,
    /// Folder inside the tap that holds formulas
    pub formula_folder: String,
    /// Local working directory
    pub work_dir: PathBuf,
    /// Skip the commit and push
    pub skip_commit: bool,
    /// GitHub API base URL, without trailing slash
    pub api_url: String,
    /// GitHub web base URL, without trailing slash
    pub server_url: String,
}

impl ReleaseConfig {
    /// Validates an environment snapshot into a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] listing every missing key when any required
    /// value is absent, or when a value is malformed.
    pub fn from_env(env: &EnvSnapshot) -> Result<Self> {
        let missing: Vec<&str> = keys::REQUIRED
            .iter()
            .copied()
            .filter(|key| env.get(key).is_none())
            .collect();

        if !missing.is_empty() {
            debug!(missing = ?missing, "Required configuration is missing");
            return Err(Error::config(
                MISSING_ENV_MESSAGE,
                format!("Missing: {}", missing.join(", ")),
            ));
        }

        // Presence of every required key is established above.
        let required = |key: &str| env.get(key).unwrap_or_default().to_string();
        // Ruby blocks keep their indentation.
        let block = |key: &str| env.get_raw(key).unwrap_or_default().to_string();

        let slug = required(keys::GITHUB_REPOSITORY);
        let repository = Repository::parse(&slug).ok_or_else(|| {
            Error::config(
                format!("Invalid {}: '{slug}'", keys::GITHUB_REPOSITORY),
                "Expected 'owner/name'",
            )
        })?;

        let skip_commit = match env.get(keys::SKIP_COMMIT) {
            Some(raw) => parse_bool(raw).ok_or_else(|| {
                Error::config(
                    format!("Invalid {}: '{raw}'", keys::SKIP_COMMIT),
                    "Expected true or false",
                )
            })?,
            None => false,
        };

        let work_dir = env.get(keys::WORK_DIR).map_or_else(
            || std::env::temp_dir().join("homebrew-releaser"),
            PathBuf::from,
        );

        Ok(Self {
            repository,
            token: SecretString::from(required(keys::GITHUB_TOKEN)),
            tap: Repository::new(
                required(keys::HOMEBREW_OWNER),
                required(keys::HOMEBREW_TAP),
            ),
            committer: Committer {
                name: required(keys::COMMIT_OWNER),
                email: required(keys::COMMIT_EMAIL),
            },
            formula: FormulaFields {
                description: required(keys::DESCRIPTION),
                homepage: required(keys::HOMEPAGE),
                license: required(keys::LICENSE),
                install: block(keys::INSTALL),
                test: block(keys::TEST),
                depends_on: env
                    .get(keys::DEPENDS_ON)
                    .map(parse_list)
                    .unwrap_or_default(),
            },
            formula_folder: env
                .get(keys::FORMULA_FOLDER)
                .unwrap_or(DEFAULT_FORMULA_FOLDER)
                .trim_matches('/')
                .to_string(),
            work_dir,
            skip_commit,
            api_url: env
                .get(keys::API_URL)
                .unwrap_or(DEFAULT_API_URL)
                .trim_end_matches('/')
                .to_string(),
            server_url: env
                .get(keys::SERVER_URL)
                .unwrap_or(DEFAULT_SERVER_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// Sets skip-commit mode.
    #[must_use]
    pub const fn with_skip_commit(mut self, skip_commit: bool) -> Self {
        self.skip_commit = skip_commit;
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// Formula name, which is the source repository name.
    #[must_use]
    pub fn formula_name(&self) -> &str {
        &self.repository.name
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(['\n', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn complete_env() -> EnvSnapshot {
        EnvSnapshot::from_pairs([
            (keys::GITHUB_REPOSITORY, "Justintime50/tool"),
            (keys::GITHUB_TOKEN, "ghp_secret"),
            (keys::HOMEBREW_OWNER, "Justintime50"),
            (keys::HOMEBREW_TAP, "homebrew-formulas"),
            (keys::COMMIT_OWNER, "releaser-bot"),
            (keys::COMMIT_EMAIL, "bot@example.com"),
            (keys::DESCRIPTION, "A tool"),
            (keys::HOMEPAGE, "https://example.com"),
            (keys::LICENSE, "MIT"),
            (keys::INSTALL, "bin.install \"tool\""),
            (keys::TEST, "system bin/\"tool\", \"--version\""),
        ])
    }

    #[test]
    fn test_complete_env_validates() {
        let config = ReleaseConfig::from_env(&complete_env()).unwrap();
        assert_eq!(config.repository, Repository::new("Justintime50", "tool"));
        assert_eq!(config.tap, Repository::new("Justintime50", "homebrew-formulas"));
        assert_eq!(config.committer.email, "bot@example.com");
        assert_eq!(config.token.expose_secret(), "ghp_secret");
        assert_eq!(config.formula_folder, DEFAULT_FORMULA_FOLDER);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert!(config.formula.depends_on.is_empty());
        assert!(!config.skip_commit);
        assert_eq!(config.formula_name(), "tool");
    }

    #[test]
    fn test_empty_env_reports_fixed_message() {
        let err = ReleaseConfig::from_env(&EnvSnapshot::default()).unwrap_err();
        assert_eq!(err.to_string(), MISSING_ENV_MESSAGE);
    }

    #[test]
    fn test_every_required_key_is_enforced() {
        for key in keys::REQUIRED {
            let env = complete_env().without(key);
            let err = ReleaseConfig::from_env(&env).unwrap_err();
            match err {
                Error::Config { message, help } => {
                    assert_eq!(message, MISSING_ENV_MESSAGE);
                    assert!(help.contains(key), "help should name {key}: {help}");
                }
                other => panic!("expected config error, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_all_missing_keys_listed_together() {
        let env = complete_env()
            .without(keys::GITHUB_TOKEN)
            .without(keys::INSTALL);
        let Error::Config { help, .. } = ReleaseConfig::from_env(&env).unwrap_err() else {
            panic!("expected config error");
        };
        assert!(help.contains(keys::GITHUB_TOKEN));
        assert!(help.contains(keys::INSTALL));
    }

    #[test]
    fn test_whitespace_value_counts_as_missing() {
        let env = complete_env().with(keys::COMMIT_EMAIL, "   ");
        assert!(ReleaseConfig::from_env(&env).is_err());
    }

    #[test]
    fn test_malformed_repository_slug() {
        let env = complete_env().with(keys::GITHUB_REPOSITORY, "no-slash");
        let err = ReleaseConfig::from_env(&env).unwrap_err();
        assert!(err.to_string().contains("GITHUB_REPOSITORY"));
    }

    #[test]
    fn test_optional_values() {
        let env = complete_env()
            .with(keys::DEPENDS_ON, "openssl@3\npython, go\n\n")
            .with(keys::FORMULA_FOLDER, "/Formula/")
            .with(keys::SKIP_COMMIT, "TRUE")
            .with(keys::WORK_DIR, "/tmp/releaser")
            .with(keys::API_URL, "https://ghe.example.com/api/v3/")
            .with(keys::SERVER_URL, "https://ghe.example.com/");
        let config = ReleaseConfig::from_env(&env).unwrap();
        assert_eq!(config.formula.depends_on, vec!["openssl@3", "python", "go"]);
        assert_eq!(config.formula_folder, "Formula");
        assert!(config.skip_commit);
        assert_eq!(config.work_dir, PathBuf::from("/tmp/releaser"));
        assert_eq!(config.api_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.server_url, "https://ghe.example.com");
    }

    #[test]
    fn test_install_and_test_blocks_keep_indentation() {
        let install = "  if OS.mac?\n    bin.install \"tool\"\n  end\n";
        let env = complete_env()
            .with(keys::INSTALL, install)
            .with(keys::TEST, "\tsystem \"true\"");
        let config = ReleaseConfig::from_env(&env).unwrap();
        assert_eq!(config.formula.install, install);
        assert_eq!(config.formula.test, "\tsystem \"true\"");
    }

    #[test]
    fn test_get_raw_treats_blank_as_missing() {
        let env = EnvSnapshot::from_pairs([("A", "  x "), ("B", " \n ")]);
        assert_eq!(env.get_raw("A"), Some("  x "));
        assert_eq!(env.get("A"), Some("x"));
        assert!(env.get_raw("B").is_none());
        assert!(env.get_raw("C").is_none());
    }

    #[test]
    fn test_invalid_skip_commit() {
        let env = complete_env().with(keys::SKIP_COMMIT, "sometimes");
        let err = ReleaseConfig::from_env(&env).unwrap_err();
        assert!(err.to_string().contains(keys::SKIP_COMMIT));
    }

    #[test]
    fn test_token_is_redacted_in_debug() {
        let config = ReleaseConfig::from_env(&complete_env()).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("ghp_secret"));
    }

    #[test]
    fn test_builder_overrides() {
        let config = ReleaseConfig::from_env(&complete_env())
            .unwrap()
            .with_skip_commit(true)
            .with_work_dir("/work");
        assert!(config.skip_commit);
        assert_eq!(config.work_dir, PathBuf::from("/work"));
    }

    #[test]
    fn test_capture_reads_process_env() {
        temp_env::with_vars(
            [
                ("GITHUB_REPOSITORY", Some("octo/cat")),
                ("INPUT_GITHUB_TOKEN", None::<&str>),
            ],
            || {
                let env = EnvSnapshot::capture();
                assert_eq!(env.get(keys::GITHUB_REPOSITORY), Some("octo/cat"));
                assert!(env.get(keys::GITHUB_TOKEN).is_none());
            },
        );
    }

    #[test]
    fn test_repository_parse() {
        assert_eq!(
            Repository::parse("my-org/homebrew-formulas"),
            Some(Repository::new("my-org", "homebrew-formulas"))
        );
        assert!(Repository::parse("invalid").is_none());
        assert!(Repository::parse("/name").is_none());
        assert!(Repository::parse("owner/").is_none());
        assert_eq!(Repository::new("a", "b").to_string(), "a/b");
    }
}

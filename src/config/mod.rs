//! Application configuration loaded from CLI, environment, and files.
//!
//! Values are merged with ortho-config's layered approach.
//!
//! # Precedence
//!
//! Configuration values are loaded with the following precedence (lowest to
//! highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.beacon.toml` in the current directory, home
//!    directory, or XDG config directory
//! 3. **Environment variables** – `BEACON_*`, plus the legacy `GITHUB_TOKEN`
//!    fallback for the token
//! 4. **Command-line arguments** – `--token`, `--login`, `--track`, ...
//!
//! # Configuration File
//!
//! ```toml
//! token = "ghp_example"
//! login = "octocat"
//! database_url = "beacon.sqlite"
//! poll_interval_seconds = 600
//! fallback_repositories = ["octo/widgets", "octo/gadgets"]
//! flow_rules = ["feature/*=develop", "release/*=main,develop"]
//!
//! [attention]
//! review_request = 60
//! ci_failure = 40
//! ```
//!
//! Attention weights are read from files only; omitted weights keep their
//! defaults.

use std::env;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::attention::AttentionWeights;
use crate::github::{GitHubError, PersonalAccessToken, RepositoryLocator};
use crate::resolve::{FlowRuleError, parse_flow_rules};
use crate::sync::SyncSettings;

/// Default GitHub REST API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 300;
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// What the binary should do, derived from the loaded flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    /// Apply migrations and exit.
    MigrateDatabase,
    /// Add a repository to the tracked set and exit.
    TrackRepository,
    /// Remove a repository from the tracked set and exit.
    UntrackRepository,
    /// Run one manual sync.
    SyncOnce,
    /// Sync repeatedly on an interval.
    Poll,
}

/// Errors raised while loading or interpreting configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// ortho-config could not parse arguments or files.
    #[error("failed to load configuration: {message}")]
    Load {
        /// Error description.
        message: String,
    },
    /// A configured repository name is invalid.
    #[error("invalid repository in configuration: {0}")]
    Repository(#[from] GitHubError),
    /// A configured flow rule is invalid.
    #[error(transparent)]
    FlowRule(#[from] FlowRuleError),
    /// The API base is not an absolute HTTP(S) URL.
    #[error("api_base `{value}` is not an absolute http(s) URL")]
    InvalidApiBase {
        /// Configured value.
        value: String,
    },
    /// An interval that must be positive was zero.
    #[error("{field} must be greater than zero")]
    ZeroInterval {
        /// Offending field name.
        field: &'static str,
    },
}

/// Beacon configuration supporting CLI, environment, and file sources.
///
/// # Example
///
/// ```no_run
/// use beacon::BeaconConfig;
/// use ortho_config::OrthoConfig;
///
/// let config = BeaconConfig::load().expect("failed to load configuration");
/// let token = config.resolve_token().expect("token required");
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "BEACON",
    discovery(
        dotfile_name = ".beacon.toml",
        config_file_name = "beacon.toml",
        app_name = "beacon"
    )
)]
pub struct BeaconConfig {
    /// Personal access token for GitHub API authentication.
    ///
    /// Can be provided via:
    /// - CLI: `--token <TOKEN>` or `-t <TOKEN>`
    /// - Environment: `BEACON_TOKEN` or `GITHUB_TOKEN` (legacy)
    /// - Config file: `token = "..."`
    #[ortho_config(cli_short = 't')]
    pub token: Option<String>,

    /// Login the sync acts as.
    ///
    /// When unset, the login is read from the authenticated user.
    #[ortho_config(cli_short = 'l')]
    pub login: Option<String>,

    /// GitHub REST API base URL, for GitHub Enterprise or test servers.
    #[ortho_config()]
    pub api_base: String,

    /// Local `SQLite` database URL/path used for persistence.
    ///
    /// Can be provided via:
    /// - CLI: `--database-url <PATH>`
    /// - Environment: `BEACON_DATABASE_URL`
    /// - Config file: `database_url = "..."`
    #[ortho_config()]
    pub database_url: Option<String>,

    /// Runs database migrations and exits.
    #[ortho_config()]
    pub migrate_db: bool,

    /// Keeps syncing every `poll_interval_seconds` instead of exiting after
    /// one run.
    ///
    /// Note: `BEACON_POLL` is not read because `ortho_config` does not load
    /// boolean values from the environment.
    #[ortho_config(cli_short = 'p')]
    pub poll: bool,

    /// Seconds between polling runs.
    #[ortho_config()]
    pub poll_interval_seconds: u64,

    /// Per-request timeout for GitHub API calls, in seconds.
    #[ortho_config()]
    pub request_timeout_seconds: u64,

    /// Repositories (`owner/name`) seeded when the viewer tracks nothing.
    #[ortho_config()]
    pub fallback_repositories: Vec<String>,

    /// Repository (`owner/name`) to start tracking.
    #[ortho_config()]
    pub track: Option<String>,

    /// Repository (`owner/name`) to stop tracking.
    #[ortho_config()]
    pub untrack: Option<String>,

    /// Ordered branch-flow rules (`pattern=target1,target2`).
    #[ortho_config()]
    pub flow_rules: Vec<String>,

    /// Emits logs as JSON lines instead of human-readable text.
    #[ortho_config()]
    pub log_json: bool,

    /// Attention score magnitudes, from the `[attention]` table.
    #[ortho_config(skip_cli)]
    pub attention: AttentionWeights,
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            token: None,
            login: None,
            api_base: DEFAULT_API_BASE.to_owned(),
            database_url: None,
            migrate_db: false,
            poll: false,
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECONDS,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
            fallback_repositories: Vec::new(),
            track: None,
            untrack: None,
            flow_rules: Vec::new(),
            log_json: false,
            attention: AttentionWeights::default(),
        }
    }
}

impl BeaconConfig {
    /// Loads configuration from the process arguments, environment and files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when ortho-config fails.
    pub fn load_layers() -> Result<Self, ConfigError> {
        Self::load().map_err(|error| ConfigError::Load {
            message: error.to_string(),
        })
    }

    /// Resolves the token from configuration or the legacy `GITHUB_TOKEN`
    /// environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::MissingToken`] when no source provides a
    /// non-blank value.
    pub fn resolve_token(&self) -> Result<PersonalAccessToken, GitHubError> {
        let raw = self
            .token
            .clone()
            .or_else(|| env::var("GITHUB_TOKEN").ok())
            .ok_or(GitHubError::MissingToken)?;
        PersonalAccessToken::new(raw)
    }

    /// Determines what to do from the loaded flags.
    ///
    /// Migration wins over tracking changes, which win over syncing.
    #[must_use]
    pub const fn operation_mode(&self) -> OperationMode {
        if self.migrate_db {
            OperationMode::MigrateDatabase
        } else if self.track.is_some() {
            OperationMode::TrackRepository
        } else if self.untrack.is_some() {
            OperationMode::UntrackRepository
        } else if self.poll {
            OperationMode::Poll
        } else {
            OperationMode::SyncOnce
        }
    }

    /// Returns the API base after checking it is an absolute HTTP(S) URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiBase`] otherwise.
    pub fn api_base(&self) -> Result<&str, ConfigError> {
        let trimmed = self.api_base.trim();
        match Url::parse(trimmed) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(trimmed),
            _ => Err(ConfigError::InvalidApiBase {
                value: self.api_base.clone(),
            }),
        }
    }

    /// Interval between polling runs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroInterval`] when the interval is zero.
    pub const fn poll_interval(&self) -> Result<Duration, ConfigError> {
        positive_seconds(self.poll_interval_seconds, "poll_interval_seconds")
    }

    /// Per-request timeout for GitHub calls.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroInterval`] when the timeout is zero.
    pub const fn request_timeout(&self) -> Result<Duration, ConfigError> {
        positive_seconds(self.request_timeout_seconds, "request_timeout_seconds")
    }

    /// Builds the settings shared by every repository in a run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a fallback repository or flow rule does
    /// not parse.
    pub fn sync_settings(&self) -> Result<SyncSettings, ConfigError> {
        let fallback_repositories = self
            .fallback_repositories
            .iter()
            .map(|name| RepositoryLocator::parse(name))
            .collect::<Result<Vec<_>, _>>()?;
        let flow_rules = parse_flow_rules(&self.flow_rules)?;

        Ok(SyncSettings {
            weights: self.attention,
            flow_rules,
            fallback_repositories,
        })
    }
}

const fn positive_seconds(seconds: u64, field: &'static str) -> Result<Duration, ConfigError> {
    if seconds == 0 {
        Err(ConfigError::ZeroInterval { field })
    } else {
        Ok(Duration::from_secs(seconds))
    }
}

#[cfg(test)]
mod tests;

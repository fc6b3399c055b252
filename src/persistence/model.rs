//! Records written to and read from the sync database.

use chrono::{DateTime, Utc};

use crate::github::{PullRequestLifecycle, RepositoryLocator};
use crate::resolve::{CiState, FlowViolation, ReviewState};
use crate::sync::SyncIssue;

use super::PersistenceError;

/// How a repository entered the tracked set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Added by the user.
    Explicit,
    /// Seeded from the fallback list.
    Seeded,
}

impl Provenance {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Explicit => "EXPLICIT",
            Self::Seeded => "SEEDED",
        }
    }

    pub(super) fn parse(value: &str) -> Result<Self, PersistenceError> {
        match value {
            "EXPLICIT" => Ok(Self::Explicit),
            "SEEDED" => Ok(Self::Seeded),
            other => Err(PersistenceError::CorruptValue {
                field: "tracked_repositories.provenance",
                value: other.to_owned(),
            }),
        }
    }
}

/// A repository tracked by one viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedRepository {
    /// Row identifier.
    pub id: i64,
    /// Login of the viewer tracking the repository.
    pub viewer_login: String,
    /// Owner and name.
    pub locator: RepositoryLocator,
    /// Default branch as of the last sync.
    pub default_branch: Option<String>,
    /// How the repository was added.
    pub provenance: Provenance,
    /// End of the last successful repository sync.
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// Insert-or-revive request for a tracked repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTrackedRepository {
    /// Login of the viewer tracking the repository.
    pub viewer_login: String,
    /// Owner and name.
    pub locator: RepositoryLocator,
    /// Default branch, when already known.
    pub default_branch: Option<String>,
    /// How the repository was added.
    pub provenance: Provenance,
}

/// Reconciled state of one pull request.
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequestRecord {
    /// Owning tracked repository.
    pub repository_id: i64,
    /// Pull request number.
    pub number: u64,
    /// Title.
    pub title: String,
    /// Description body.
    pub description: Option<String>,
    /// Open, closed or merged.
    pub lifecycle: PullRequestLifecycle,
    /// Draft flag.
    pub draft: bool,
    /// Author login.
    pub author: Option<String>,
    /// Canonical CI state.
    pub ci_state: CiState,
    /// Canonical review state.
    pub review_state: ReviewState,
    /// Lines added.
    pub additions: u64,
    /// Lines removed.
    pub deletions: u64,
    /// Files touched.
    pub changed_files: u64,
    /// Issue and review comment count.
    pub comment_count: u64,
    /// Commit count.
    pub commit_count: u64,
    /// Creation time on the host.
    pub created_at: DateTime<Utc>,
    /// Last update time on the host.
    pub remote_updated_at: DateTime<Utc>,
    /// Most recent of the update, comment and review times.
    pub last_activity_at: DateTime<Utc>,
    /// Head branch.
    pub head_ref: String,
    /// Base branch.
    pub base_ref: String,
    /// Source pattern of the matching flow rule.
    pub flow_phase: Option<String>,
    /// Flow rule violation, if any.
    pub flow_violation: Option<FlowViolation>,
    /// Upstream payload, stored verbatim.
    pub raw_payload: serde_json::Value,
}

/// A pull request and its attention verdict, as listed for a viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttentionEntry {
    /// Repository full name.
    pub repository: String,
    /// Pull request number.
    pub number: u64,
    /// Title.
    pub title: String,
    /// Stored CI state.
    pub ci_state: String,
    /// Stored review state.
    pub review_state: String,
    /// Clamped score.
    pub final_score: i64,
    /// Attention reason text.
    pub reason: Option<String>,
    /// Whether the pull request needs attention.
    pub needs_attention: bool,
}

/// What started a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncTrigger {
    /// Started explicitly by the user.
    Manual,
    /// Started by the polling loop.
    Poll,
}

impl SyncTrigger {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "MANUAL",
            Self::Poll => "POLL",
        }
    }
}

/// Lifecycle of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncRunStatus {
    /// Still executing.
    Running,
    /// Finished without issues.
    Success,
    /// Finished with issues after upserting something.
    Partial,
    /// Finished with issues and nothing upserted.
    Failed,
}

impl SyncRunStatus {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Success => "SUCCESS",
            Self::Partial => "PARTIAL",
            Self::Failed => "FAILED",
        }
    }

    pub(super) fn parse(value: &str) -> Result<Self, PersistenceError> {
        match value {
            "RUNNING" => Ok(Self::Running),
            "SUCCESS" => Ok(Self::Success),
            "PARTIAL" => Ok(Self::Partial),
            "FAILED" => Ok(Self::Failed),
            other => Err(PersistenceError::CorruptValue {
                field: "sync_runs.status",
                value: other.to_owned(),
            }),
        }
    }
}

/// Identifier of a sync run row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SyncRunId(pub i64);

/// Terminal figures written when a run is finalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRunOutcome {
    /// Terminal status; never [`SyncRunStatus::Running`].
    pub status: SyncRunStatus,
    /// Pull requests listed.
    pub pulled: u64,
    /// Pull requests written.
    pub upserted: u64,
    /// Issues collected.
    pub issues: Vec<SyncIssue>,
    /// Finish time.
    pub finished_at: DateTime<Utc>,
}

/// A stored sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRunRecord {
    /// Row identifier.
    pub id: SyncRunId,
    /// Trigger text.
    pub trigger: String,
    /// Current status.
    pub status: SyncRunStatus,
    /// Pull requests listed.
    pub pulled: u64,
    /// Pull requests written.
    pub upserted: u64,
    /// Number of issues.
    pub error_count: u64,
    /// Repositories attempted.
    pub repositories: Vec<String>,
    /// Issues recorded at finalisation.
    pub issues: Vec<SyncIssue>,
    /// Finish time, once finalised.
    pub finished_at: Option<DateTime<Utc>>,
}

//! Data models for the GitHub payloads consumed by the sync engine.
//!
//! Types prefixed with `Api` are deserialisation targets mirroring the REST
//! response shapes. They convert into the public domain types through
//! `TryFrom`, and enumerated strings are mapped exhaustively: an unknown value
//! fails the conversion with [`GitHubError::UnexpectedValue`] instead of being
//! silently defaulted.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::error::GitHubError;
use super::locator::PullRequestNumber;

/// Lifecycle state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullRequestLifecycle {
    /// Open for review.
    Open,
    /// Closed without merging.
    Closed,
    /// Merged into its base branch.
    Merged,
}

impl PullRequestLifecycle {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Merged => "MERGED",
        }
    }
}

/// Pull request as observed on GitHub, together with its raw payload.
#[derive(Debug, Clone, PartialEq)]
pub struct PullRequestSnapshot {
    /// Pull request number.
    pub number: PullRequestNumber,
    /// Title of the pull request.
    pub title: String,
    /// Description body, if any.
    pub body: Option<String>,
    /// Lifecycle state.
    pub lifecycle: PullRequestLifecycle,
    /// Whether the pull request is a draft.
    pub draft: bool,
    /// Author login if present.
    pub author: Option<String>,
    /// Head branch name.
    pub head_ref: String,
    /// Head commit SHA.
    pub head_sha: String,
    /// Base branch name.
    pub base_ref: String,
    /// Logins of reviewers whose review is still requested.
    pub requested_reviewers: Vec<String>,
    /// Number of teams whose review is still requested.
    pub requested_team_count: usize,
    /// Logins of assignees.
    pub assignees: Vec<String>,
    /// Added lines (zero when the listing payload omits it).
    pub additions: u64,
    /// Deleted lines.
    pub deletions: u64,
    /// Changed files.
    pub changed_files: u64,
    /// Issue comment count.
    pub comments: u64,
    /// Review comment count.
    pub review_comments: u64,
    /// Commit count.
    pub commits: u64,
    /// GitHub's mergeability verdict, when computed.
    pub mergeable: Option<bool>,
    /// GitHub's mergeable state (`clean`, `dirty`, `blocked`, ...).
    pub mergeable_state: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last remote update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Verbatim payload returned by GitHub.
    pub raw: serde_json::Value,
}

/// Reads the pull request number from one entry of an open pull request
/// listing.
///
/// Only the number is decoded; the full payload is read again per pull
/// request, so a malformed entry fails alone.
///
/// # Errors
///
/// Returns [`GitHubError::Api`] when the entry has no numeric `number` and
/// [`GitHubError::InvalidPullRequestNumber`] when it is zero.
pub(super) fn listed_pull_request_number(
    raw: serde_json::Value,
) -> Result<PullRequestNumber, GitHubError> {
    let entry: ApiListedPullRequest =
        serde_json::from_value(raw).map_err(|error| GitHubError::Api {
            message: format!("pull request listing entry deserialisation failed: {error}"),
        })?;
    PullRequestNumber::new(entry.number)
}

impl PullRequestSnapshot {
    /// Returns true when GitHub reports merge conflicts against the base.
    #[must_use]
    pub fn has_merge_conflicts(&self) -> bool {
        self.mergeable == Some(false) || self.mergeable_state.as_deref() == Some("dirty")
    }

    /// Returns true when any reviewer or team is still requested.
    #[must_use]
    pub fn has_pending_review_requests(&self) -> bool {
        !self.requested_reviewers.is_empty() || self.requested_team_count > 0
    }

    /// Decodes a raw pull request payload.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError::Api`] when the payload does not match the pull
    /// request shape and [`GitHubError::UnexpectedValue`] for unknown states.
    pub fn from_raw(raw: serde_json::Value) -> Result<Self, GitHubError> {
        let api: ApiPullRequest =
            serde_json::from_value(raw.clone()).map_err(|error| GitHubError::Api {
                message: format!("pull request payload deserialisation failed: {error}"),
            })?;
        Self::from_api(api, raw)
    }

    fn from_api(api: ApiPullRequest, raw: serde_json::Value) -> Result<Self, GitHubError> {
        let lifecycle = match api.state.as_str() {
            "open" => PullRequestLifecycle::Open,
            "closed" if api.merged_at.is_some() || api.merged == Some(true) => {
                PullRequestLifecycle::Merged
            }
            "closed" => PullRequestLifecycle::Closed,
            other => {
                return Err(GitHubError::UnexpectedValue {
                    field: "pull_request.state",
                    value: other.to_owned(),
                });
            }
        };

        Ok(Self {
            number: PullRequestNumber::new(api.number)?,
            title: api.title,
            body: api.body,
            lifecycle,
            draft: api.draft.unwrap_or(false),
            author: api.user.and_then(|user| user.login),
            head_ref: api.head.branch,
            head_sha: api.head.sha,
            base_ref: api.base.branch,
            requested_reviewers: api
                .requested_reviewers
                .into_iter()
                .filter_map(|user| user.login)
                .collect(),
            requested_team_count: api.requested_teams.len(),
            assignees: api
                .assignees
                .into_iter()
                .filter_map(|user| user.login)
                .collect(),
            additions: api.additions.unwrap_or(0),
            deletions: api.deletions.unwrap_or(0),
            changed_files: api.changed_files.unwrap_or(0),
            comments: api.comments.unwrap_or(0),
            review_comments: api.review_comments.unwrap_or(0),
            commits: api.commits.unwrap_or(0),
            mergeable: api.mergeable,
            mergeable_state: api.mergeable_state,
            created_at: api.created_at,
            updated_at: api.updated_at,
            raw,
        })
    }
}

/// State reported by the legacy commit status API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatusState {
    /// All contexts passed.
    Success,
    /// A context failed.
    Failure,
    /// A context errored.
    Errored,
    /// A context is still running.
    Pending,
}

impl TryFrom<&str> for CommitStatusState {
    type Error = GitHubError;

    fn try_from(value: &str) -> Result<Self, GitHubError> {
        match value {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "error" => Ok(Self::Errored),
            "pending" => Ok(Self::Pending),
            other => Err(GitHubError::UnexpectedValue {
                field: "status.state",
                value: other.to_owned(),
            }),
        }
    }
}

/// Combined commit status for a ref.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinedStatus {
    /// Aggregate state computed by GitHub.
    pub state: CommitStatusState,
    /// Individual status contexts.
    pub statuses: Vec<CommitStatusState>,
}

/// Lifecycle status of a check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckRunStatus {
    /// Waiting for a runner.
    Queued,
    /// Currently running.
    InProgress,
    /// Finished; see the conclusion.
    Completed,
    /// Waiting on a deployment protection rule.
    Waiting,
    /// Requested but not yet queued.
    Requested,
    /// Pending.
    Pending,
}

impl TryFrom<&str> for CheckRunStatus {
    type Error = GitHubError;

    fn try_from(value: &str) -> Result<Self, GitHubError> {
        match value {
            "queued" => Ok(Self::Queued),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "waiting" => Ok(Self::Waiting),
            "requested" => Ok(Self::Requested),
            "pending" => Ok(Self::Pending),
            other => Err(GitHubError::UnexpectedValue {
                field: "check_run.status",
                value: other.to_owned(),
            }),
        }
    }
}

/// Conclusion of a completed check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckConclusion {
    /// Passed.
    Success,
    /// Failed.
    Failure,
    /// Neither passed nor failed.
    Neutral,
    /// Cancelled before completion.
    Cancelled,
    /// Skipped.
    Skipped,
    /// Exceeded its time limit.
    TimedOut,
    /// Requires manual action.
    ActionRequired,
    /// Superseded by a newer run.
    Stale,
    /// Failed to start.
    StartupFailure,
}

impl TryFrom<&str> for CheckConclusion {
    type Error = GitHubError;

    fn try_from(value: &str) -> Result<Self, GitHubError> {
        match value {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            "neutral" => Ok(Self::Neutral),
            "cancelled" => Ok(Self::Cancelled),
            "skipped" => Ok(Self::Skipped),
            "timed_out" => Ok(Self::TimedOut),
            "action_required" => Ok(Self::ActionRequired),
            "stale" => Ok(Self::Stale),
            "startup_failure" => Ok(Self::StartupFailure),
            other => Err(GitHubError::UnexpectedValue {
                field: "check_run.conclusion",
                value: other.to_owned(),
            }),
        }
    }
}

/// A check run attached to a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckRun {
    /// Run status.
    pub status: CheckRunStatus,
    /// Conclusion once completed.
    pub conclusion: Option<CheckConclusion>,
}

/// Outcome of a submitted review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewVerdict {
    /// Approved the changes.
    Approved,
    /// Requested changes.
    ChangesRequested,
    /// Left comments only.
    Commented,
    /// Review was dismissed.
    Dismissed,
    /// Review has not been submitted yet.
    Pending,
}

impl TryFrom<&str> for ReviewVerdict {
    type Error = GitHubError;

    fn try_from(value: &str) -> Result<Self, GitHubError> {
        match value {
            "APPROVED" => Ok(Self::Approved),
            "CHANGES_REQUESTED" => Ok(Self::ChangesRequested),
            "COMMENTED" => Ok(Self::Commented),
            "DISMISSED" => Ok(Self::Dismissed),
            "PENDING" => Ok(Self::Pending),
            other => Err(GitHubError::UnexpectedValue {
                field: "review.state",
                value: other.to_owned(),
            }),
        }
    }
}

/// A pull request review.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Review {
    /// Reviewer login.
    pub author: Option<String>,
    /// Review outcome.
    pub verdict: ReviewVerdict,
    /// Submission time; absent for pending reviews.
    pub submitted_at: Option<DateTime<Utc>>,
}

/// An issue (conversation) comment on a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueComment {
    /// Comment author login.
    pub author: Option<String>,
    /// Comment body.
    pub body: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Repository metadata needed to track a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryDetails {
    /// `owner/name` as reported by GitHub.
    pub full_name: String,
    /// Default branch name.
    pub default_branch: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiUser {
    pub(super) login: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiTeam {}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiBranchRef {
    #[serde(rename = "ref")]
    pub(super) branch: String,
    pub(super) sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiPullRequest {
    pub(super) number: u64,
    pub(super) title: String,
    pub(super) body: Option<String>,
    pub(super) state: String,
    pub(super) draft: Option<bool>,
    pub(super) merged: Option<bool>,
    pub(super) merged_at: Option<DateTime<Utc>>,
    pub(super) user: Option<ApiUser>,
    pub(super) head: ApiBranchRef,
    pub(super) base: ApiBranchRef,
    #[serde(default)]
    pub(super) requested_reviewers: Vec<ApiUser>,
    #[serde(default)]
    pub(super) requested_teams: Vec<ApiTeam>,
    #[serde(default)]
    pub(super) assignees: Vec<ApiUser>,
    pub(super) additions: Option<u64>,
    pub(super) deletions: Option<u64>,
    pub(super) changed_files: Option<u64>,
    pub(super) comments: Option<u64>,
    pub(super) review_comments: Option<u64>,
    pub(super) commits: Option<u64>,
    pub(super) mergeable: Option<bool>,
    pub(super) mergeable_state: Option<String>,
    pub(super) created_at: DateTime<Utc>,
    pub(super) updated_at: DateTime<Utc>,
}

/// The one field a listing entry must carry for the sync to fetch details.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiListedPullRequest {
    pub(super) number: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiCommitStatus {
    pub(super) state: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiCombinedStatus {
    pub(super) state: String,
    #[serde(default)]
    pub(super) statuses: Vec<ApiCommitStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiCheckRun {
    pub(super) status: String,
    pub(super) conclusion: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiCheckRuns {
    #[serde(default)]
    pub(super) total_count: Option<u64>,
    #[serde(default)]
    pub(super) check_runs: Vec<ApiCheckRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiReview {
    pub(super) user: Option<ApiUser>,
    pub(super) state: String,
    pub(super) submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiIssueComment {
    pub(super) user: Option<ApiUser>,
    pub(super) body: Option<String>,
    pub(super) created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiRepository {
    pub(super) full_name: String,
    pub(super) default_branch: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ApiAuthenticatedUser {
    pub(super) login: String,
}

impl TryFrom<ApiCombinedStatus> for CombinedStatus {
    type Error = GitHubError;

    fn try_from(value: ApiCombinedStatus) -> Result<Self, GitHubError> {
        let statuses = value
            .statuses
            .iter()
            .map(|status| CommitStatusState::try_from(status.state.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            state: CommitStatusState::try_from(value.state.as_str())?,
            statuses,
        })
    }
}

impl TryFrom<ApiCheckRun> for CheckRun {
    type Error = GitHubError;

    fn try_from(value: ApiCheckRun) -> Result<Self, GitHubError> {
        Ok(Self {
            status: CheckRunStatus::try_from(value.status.as_str())?,
            conclusion: value
                .conclusion
                .as_deref()
                .map(CheckConclusion::try_from)
                .transpose()?,
        })
    }
}

impl TryFrom<ApiReview> for Review {
    type Error = GitHubError;

    fn try_from(value: ApiReview) -> Result<Self, GitHubError> {
        Ok(Self {
            author: value.user.and_then(|user| user.login),
            verdict: ReviewVerdict::try_from(value.state.as_str())?,
            submitted_at: value.submitted_at,
        })
    }
}

impl From<ApiIssueComment> for IssueComment {
    fn from(value: ApiIssueComment) -> Self {
        Self {
            author: value.user.and_then(|user| user.login),
            body: value.body,
            created_at: value.created_at,
        }
    }
}

impl From<ApiRepository> for RepositoryDetails {
    fn from(value: ApiRepository) -> Self {
        Self {
            full_name: value.full_name,
            default_branch: value.default_branch,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::{
        CheckConclusion, CommitStatusState, PullRequestLifecycle, PullRequestSnapshot,
        ReviewVerdict, listed_pull_request_number,
    };
    use crate::github::GitHubError;

    fn pull_request_json(state: &str, merged_at: Option<&str>) -> serde_json::Value {
        json!({
            "number": 7,
            "title": "Add widgets",
            "body": "cc @octocat",
            "state": state,
            "draft": false,
            "merged_at": merged_at,
            "user": { "login": "hubot" },
            "head": { "ref": "feature/widgets", "sha": "abc123" },
            "base": { "ref": "develop", "sha": "def456" },
            "requested_reviewers": [{ "login": "octocat" }],
            "requested_teams": [],
            "assignees": [],
            "additions": 12,
            "deletions": 3,
            "mergeable_state": "dirty",
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-02T00:00:00Z",
            "labels": [{ "name": "kept-in-raw" }]
        })
    }

    #[rstest]
    #[case("open", None, PullRequestLifecycle::Open)]
    #[case("closed", None, PullRequestLifecycle::Closed)]
    #[case("closed", Some("2026-01-03T00:00:00Z"), PullRequestLifecycle::Merged)]
    fn lifecycle_is_derived_from_state_and_merge_time(
        #[case] state: &str,
        #[case] merged_at: Option<&str>,
        #[case] expected: PullRequestLifecycle,
    ) {
        let snapshot = PullRequestSnapshot::from_raw(pull_request_json(state, merged_at))
            .expect("payload should decode");
        assert_eq!(snapshot.lifecycle, expected);
    }

    #[rstest]
    fn snapshot_keeps_raw_payload_and_reads_branches() {
        let raw = pull_request_json("open", None);
        let snapshot = PullRequestSnapshot::from_raw(raw.clone()).expect("payload should decode");

        assert_eq!(snapshot.raw, raw);
        assert_eq!(snapshot.head_ref, "feature/widgets");
        assert_eq!(snapshot.base_ref, "develop");
        assert_eq!(snapshot.requested_reviewers, vec!["octocat".to_owned()]);
        assert!(snapshot.has_merge_conflicts());
        assert_eq!(snapshot.commits, 0, "absent metrics default to zero");
    }

    #[rstest]
    fn unknown_pull_request_state_fails_loudly() {
        let error = PullRequestSnapshot::from_raw(pull_request_json("archived", None))
            .expect_err("unknown state should be rejected");
        assert_eq!(
            error,
            GitHubError::UnexpectedValue {
                field: "pull_request.state",
                value: "archived".to_owned(),
            }
        );
    }

    #[rstest]
    fn listing_entries_only_need_a_number() {
        let number = listed_pull_request_number(json!({ "number": 12, "head": {} }))
            .expect("entry should decode");
        assert_eq!(number.get(), 12);

        assert!(matches!(
            listed_pull_request_number(json!({ "title": "no number" })),
            Err(GitHubError::Api { .. })
        ));
        assert_eq!(
            listed_pull_request_number(json!({ "number": 0 })),
            Err(GitHubError::InvalidPullRequestNumber)
        );
    }

    #[rstest]
    fn enumerated_strings_map_exhaustively() {
        assert_eq!(
            CommitStatusState::try_from("error"),
            Ok(CommitStatusState::Errored)
        );
        assert_eq!(
            CheckConclusion::try_from("startup_failure"),
            Ok(CheckConclusion::StartupFailure)
        );
        assert_eq!(
            ReviewVerdict::try_from("CHANGES_REQUESTED"),
            Ok(ReviewVerdict::ChangesRequested)
        );
        assert!(ReviewVerdict::try_from("approved").is_err());
        assert!(CheckConclusion::try_from("exploded").is_err());
    }
}

//! Synchronisation of one tracked repository.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::attention::{
    AttentionAssessment, AttentionInput, AttentionWeights, ReasonSignals, assess_attention,
    hours_since,
};
use crate::github::{HostingGateway, PullRequestNumber, PullRequestSnapshot, RepositoryLocator};
use crate::persistence::{PersistenceError, PullRequestRecord, SyncStore, TrackedRepository};
use crate::resolve::{
    FlowRule, assess_flow, count_mentions, latest_submitted_review, resolve_review_state,
    viewer_has_last_activity,
};

use super::SyncIssue;
use super::signals::{PullRequestSignals, gather_signals};

/// Inputs shared by every repository in a run.
#[derive(Debug, Clone, Default)]
pub struct SyncSettings {
    /// Attention score magnitudes.
    pub weights: AttentionWeights,
    /// Ordered branch-flow rules.
    pub flow_rules: Vec<FlowRule>,
    /// Repositories seeded when a viewer tracks nothing.
    pub fallback_repositories: Vec<RepositoryLocator>,
}

/// Counts and issues from one repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositorySyncReport {
    /// Open pull requests listed.
    pub pulled: u64,
    /// Pull requests written with their attention state.
    pub upserted: u64,
    /// Per-repository and per-pull-request problems.
    pub issues: Vec<SyncIssue>,
}

/// A storage failure that makes continuing the run pointless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageUnavailable {
    /// Counts gathered before the failure.
    pub partial: RepositorySyncReport,
    /// The failure.
    pub error: PersistenceError,
}

/// Reconciles one repository's open pull requests into the store.
pub struct RepositorySynchronizer<'a> {
    gateway: &'a dyn HostingGateway,
    store: &'a dyn SyncStore,
    settings: &'a SyncSettings,
    viewer_login: &'a str,
}

impl<'a> RepositorySynchronizer<'a> {
    /// Creates a synchronizer acting as `viewer_login`.
    #[must_use]
    pub const fn new(
        gateway: &'a dyn HostingGateway,
        store: &'a dyn SyncStore,
        settings: &'a SyncSettings,
        viewer_login: &'a str,
    ) -> Self {
        Self {
            gateway,
            store,
            settings,
            viewer_login,
        }
    }

    /// Syncs every open pull request of `repository`.
    ///
    /// Failures of individual pull requests, and of the repository itself,
    /// are returned as issues in the report.
    ///
    /// # Errors
    ///
    /// Returns [`StorageUnavailable`] when the store cannot be reached at all.
    pub async fn sync(
        &self,
        repository: &TrackedRepository,
        now: DateTime<Utc>,
    ) -> Result<RepositorySyncReport, StorageUnavailable> {
        let locator = &repository.locator;
        let mut report = RepositorySyncReport::default();

        let details = match self.gateway.repository(locator).await {
            Ok(details) => details,
            Err(error) => {
                warn!(repository = %locator, %error, "repository unavailable");
                report
                    .issues
                    .push(SyncIssue::repository(locator, error.to_string()));
                return Ok(report);
            }
        };
        let listed = match self.gateway.list_open_pull_requests(locator).await {
            Ok(listed) => listed,
            Err(error) => {
                warn!(repository = %locator, %error, "listing pull requests failed");
                report
                    .issues
                    .push(SyncIssue::repository(locator, error.to_string()));
                return Ok(report);
            }
        };
        report.pulled = u64::try_from(listed.len()).unwrap_or(u64::MAX);

        for entry in listed {
            let number = match entry {
                Ok(number) => number,
                Err(error) => {
                    warn!(repository = %locator, %error, "unreadable pull request listing entry");
                    report
                        .issues
                        .push(SyncIssue::repository(locator, error.to_string()));
                    continue;
                }
            };
            match self.sync_pull_request(repository, number, now).await {
                Ok(()) => report.upserted = report.upserted.saturating_add(1),
                Err(PullRequestFailure::Issue(issue)) => {
                    warn!(%issue, "pull request skipped");
                    report.issues.push(issue);
                }
                Err(PullRequestFailure::Storage(error)) => {
                    return Err(StorageUnavailable {
                        partial: report,
                        error,
                    });
                }
            }
        }

        if let Err(error) =
            self.store
                .record_repository_sync(repository.id, &details.default_branch, now)
        {
            if is_storage_outage(&error) {
                return Err(StorageUnavailable {
                    partial: report,
                    error,
                });
            }
            report
                .issues
                .push(SyncIssue::repository(locator, error.to_string()));
        }

        info!(
            repository = %locator,
            pulled = report.pulled,
            upserted = report.upserted,
            issues = report.issues.len(),
            "repository synced"
        );
        Ok(report)
    }

    async fn sync_pull_request(
        &self,
        repository: &TrackedRepository,
        number: PullRequestNumber,
        now: DateTime<Utc>,
    ) -> Result<(), PullRequestFailure> {
        let locator = &repository.locator;
        let pull = self
            .gateway
            .pull_request(locator, number)
            .await
            .map_err(|error| {
                PullRequestFailure::Issue(SyncIssue::pull_request(locator, number, error.to_string()))
            })?;

        let signals = gather_signals(self.gateway, locator, &pull).await;
        let (record, attention) = self.reconcile(repository.id, pull, &signals, now);
        debug!(
            repository = %locator,
            pull = record.number,
            score = attention.final_score,
            reason = attention.reason.map(|reason| reason.as_str()),
            "pull request scored"
        );

        self.store
            .upsert_pull_request(&record, &attention)
            .map_err(|error| {
                if is_storage_outage(&error) {
                    PullRequestFailure::Storage(error)
                } else {
                    PullRequestFailure::Issue(SyncIssue::pull_request(
                        locator,
                        number,
                        error.to_string(),
                    ))
                }
            })
    }

    fn reconcile(
        &self,
        repository_id: i64,
        pull: PullRequestSnapshot,
        signals: &PullRequestSignals,
        now: DateTime<Utc>,
    ) -> (PullRequestRecord, AttentionAssessment) {
        let viewer = self.viewer_login;
        let reviews = signals.reviews.as_deref();
        let comments = signals.comments.as_deref();

        let review_state = resolve_review_state(&pull, reviews);
        let viewer_acted_last =
            viewer_has_last_activity(reviews.unwrap_or_default(), comments, viewer);
        let mentions = count_mentions(pull.body.as_deref(), comments.unwrap_or_default(), viewer);
        let flow = assess_flow(&pull.head_ref, &pull.base_ref, &self.settings.flow_rules);
        let review_requested = contains_login(&pull.requested_reviewers, viewer);
        let assigned = contains_login(&pull.assignees, viewer);
        let comment_count = pull.comments.saturating_add(pull.review_comments);

        let attention = assess_attention(
            &AttentionInput {
                review_requested,
                assigned,
                ci_state: signals.ci_state,
                hours_since_update: hours_since(pull.updated_at, now),
                mentions,
                additions: pull.additions,
                deletions: pull.deletions,
                comments: comment_count,
                commits: pull.commits,
                draft: pull.draft,
                viewer_acted_last,
            },
            &ReasonSignals {
                review_requested,
                assigned,
                merge_conflicts: pull.has_merge_conflicts(),
                review_state,
                ci_state: signals.ci_state,
            },
            &self.settings.weights,
        );

        let last_activity_at = [
            Some(pull.updated_at),
            comments.and_then(|found| found.iter().map(|comment| comment.created_at).max()),
            reviews
                .and_then(latest_submitted_review)
                .and_then(|review| review.submitted_at),
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(pull.updated_at);

        let record = PullRequestRecord {
            repository_id,
            number: pull.number.get(),
            title: pull.title,
            description: pull.body,
            lifecycle: pull.lifecycle,
            draft: pull.draft,
            author: pull.author,
            ci_state: signals.ci_state,
            review_state,
            additions: pull.additions,
            deletions: pull.deletions,
            changed_files: pull.changed_files,
            comment_count,
            commit_count: pull.commits,
            created_at: pull.created_at,
            remote_updated_at: pull.updated_at,
            last_activity_at,
            head_ref: pull.head_ref,
            base_ref: pull.base_ref,
            flow_phase: flow.phase,
            flow_violation: flow.violation,
            raw_payload: pull.raw,
        };

        (record, attention)
    }
}

enum PullRequestFailure {
    Issue(SyncIssue),
    Storage(PersistenceError),
}

fn contains_login(logins: &[String], viewer: &str) -> bool {
    logins.iter().any(|login| login.eq_ignore_ascii_case(viewer))
}

/// Storage failures that no later write could avoid.
const fn is_storage_outage(error: &PersistenceError) -> bool {
    matches!(
        error,
        PersistenceError::ConnectionFailed { .. }
            | PersistenceError::PragmaFailed { .. }
            | PersistenceError::SchemaNotInitialised
    )
}

//! Continuous-integration state resolution.
//!
//! GitHub reports CI through two independent APIs: the legacy commit status
//! API and the checks API. Each is folded into a [`SignalOutcome`] and the two
//! outcomes are merged with failure taking precedence over pending, and
//! pending over success, so a stale or coincidental green never masks a
//! problem reported by the other signal.

use crate::github::models::{
    CheckConclusion, CheckRun, CheckRunStatus, CombinedStatus, CommitStatusState,
};

/// Aggregate CI state for a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiState {
    /// Every reported signal passed.
    Success,
    /// At least one signal failed.
    Failure,
    /// At least one signal is still running and none failed.
    Pending,
    /// Neither API reported anything for the commit.
    Unknown,
}

impl CiState {
    /// Returns the persisted representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
            Self::Pending => "PENDING",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Outcome of one CI signal after folding its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalOutcome {
    /// The signal had no usable entries (or could not be fetched).
    #[default]
    NoEntries,
    /// All entries passed.
    Success,
    /// Some entry is still running.
    Pending,
    /// Some entry failed.
    Failure,
}

impl SignalOutcome {
    const fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Failure, _) | (_, Self::Failure) => Self::Failure,
            (Self::Pending, _) | (_, Self::Pending) => Self::Pending,
            (Self::Success, _) | (_, Self::Success) => Self::Success,
            (Self::NoEntries, Self::NoEntries) => Self::NoEntries,
        }
    }
}

/// Folds a combined status into a signal outcome.
///
/// GitHub reports `pending` for a combined status without any contexts, so an
/// empty context list is treated as having no entries rather than pending.
#[must_use]
pub fn summarise_combined_status(status: &CombinedStatus) -> SignalOutcome {
    status
        .statuses
        .iter()
        .map(|state| match state {
            CommitStatusState::Failure | CommitStatusState::Errored => SignalOutcome::Failure,
            CommitStatusState::Pending => SignalOutcome::Pending,
            CommitStatusState::Success => SignalOutcome::Success,
        })
        .fold(SignalOutcome::NoEntries, SignalOutcome::merge)
}

/// Folds check runs into a signal outcome.
#[must_use]
pub fn summarise_check_runs(runs: &[CheckRun]) -> SignalOutcome {
    runs.iter()
        .map(check_run_outcome)
        .fold(SignalOutcome::NoEntries, SignalOutcome::merge)
}

const fn check_run_outcome(run: &CheckRun) -> SignalOutcome {
    match run.status {
        CheckRunStatus::Queued
        | CheckRunStatus::InProgress
        | CheckRunStatus::Waiting
        | CheckRunStatus::Requested
        | CheckRunStatus::Pending => SignalOutcome::Pending,
        CheckRunStatus::Completed => match run.conclusion {
            Some(
                CheckConclusion::Failure
                | CheckConclusion::TimedOut
                | CheckConclusion::Cancelled
                | CheckConclusion::ActionRequired
                | CheckConclusion::StartupFailure,
            ) => SignalOutcome::Failure,
            Some(
                CheckConclusion::Success | CheckConclusion::Neutral | CheckConclusion::Skipped,
            ) => SignalOutcome::Success,
            Some(CheckConclusion::Stale) | None => SignalOutcome::NoEntries,
        },
    }
}

/// Merges the two CI signals into one state.
#[must_use]
pub const fn resolve_ci_state(status: SignalOutcome, checks: SignalOutcome) -> CiState {
    match status.merge(checks) {
        SignalOutcome::Failure => CiState::Failure,
        SignalOutcome::Pending => CiState::Pending,
        SignalOutcome::Success => CiState::Success,
        SignalOutcome::NoEntries => CiState::Unknown,
    }
}

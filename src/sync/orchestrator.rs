//! Drives one sync run across every tracked repository of a viewer.

use tracing::{error, info, warn};

use crate::clock::Clock;
use crate::github::{GatewayFactory, HostingGateway};
use crate::persistence::{
    NewTrackedRepository, PersistenceError, Provenance, SyncRunId, SyncRunOutcome, SyncRunStatus,
    SyncStore, SyncTrigger, TrackedRepository,
};
use crate::telemetry::{TelemetryEvent, TelemetrySink};

use super::identity::{CredentialResolver, select_identity};
use super::repository::{RepositorySynchronizer, StorageUnavailable, SyncSettings};
use super::{SyncError, SyncIssue};

/// Result of a finalised sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRunSummary {
    /// Sync run row identifier.
    pub run_id: SyncRunId,
    /// Identity the run acted as.
    pub viewer_login: String,
    /// Terminal status.
    pub status: SyncRunStatus,
    /// Open pull requests listed.
    pub pulled: u64,
    /// Pull requests written.
    pub upserted: u64,
    /// Every recorded issue.
    pub issues: Vec<SyncIssue>,
}

/// Collaborators needed by the orchestrator.
pub struct SyncOrchestrator<'a> {
    store: &'a dyn SyncStore,
    credentials: &'a dyn CredentialResolver,
    gateways: &'a dyn GatewayFactory,
    settings: &'a SyncSettings,
    telemetry: &'a dyn TelemetrySink,
    clock: &'a dyn Clock,
}

#[derive(Debug, Default)]
struct RunTally {
    pulled: u64,
    upserted: u64,
    issues: Vec<SyncIssue>,
}

impl RunTally {
    fn absorb(&mut self, pulled: u64, upserted: u64, issues: Vec<SyncIssue>) {
        self.pulled = self.pulled.saturating_add(pulled);
        self.upserted = self.upserted.saturating_add(upserted);
        self.issues.extend(issues);
    }

    fn status(&self) -> SyncRunStatus {
        if self.issues.is_empty() {
            SyncRunStatus::Success
        } else if self.upserted > 0 {
            SyncRunStatus::Partial
        } else {
            SyncRunStatus::Failed
        }
    }
}

impl<'a> SyncOrchestrator<'a> {
    /// Wires the orchestrator's collaborators.
    #[must_use]
    pub const fn new(
        store: &'a dyn SyncStore,
        credentials: &'a dyn CredentialResolver,
        gateways: &'a dyn GatewayFactory,
        settings: &'a SyncSettings,
        telemetry: &'a dyn TelemetrySink,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            store,
            credentials,
            gateways,
            settings,
            telemetry,
            clock,
        }
    }

    /// Executes one sync run.
    ///
    /// Once the run row exists it is always finalised, even when the run
    /// aborts.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when the identity, credentials, client or
    /// tracked repositories cannot be resolved before the run starts, or when
    /// the run cannot be finalised.
    pub async fn run(
        &self,
        trigger: SyncTrigger,
        explicit_login: Option<&str>,
    ) -> Result<SyncRunSummary, SyncError> {
        let viewer_login = select_identity(explicit_login, &self.credentials.identities())?;
        let token = self.credentials.token_for(&viewer_login)?;
        let gateway = self.gateways.gateway_for(&token)?;

        let mut tally = RunTally::default();
        let repositories = self
            .resolve_repositories(gateway.as_ref(), &viewer_login, &mut tally)
            .await?;
        let names: Vec<String> = repositories
            .iter()
            .map(|repository| repository.locator.full_name())
            .collect();

        let run_id = self
            .store
            .create_sync_run(trigger, &names, self.clock.now())?;
        info!(run = run_id.0, viewer = %viewer_login, trigger = trigger.as_str(), repositories = names.len(), "sync run started");

        let status = match self
            .sync_repositories(gateway.as_ref(), &viewer_login, &repositories, &mut tally)
            .await
        {
            Ok(()) => tally.status(),
            Err(failure) => {
                error!(run = run_id.0, error = %failure, "sync run aborted");
                tally.issues.push(SyncIssue::run(failure.to_string()));
                SyncRunStatus::Failed
            }
        };

        self.finalize(run_id, viewer_login, status, tally)
    }

    async fn resolve_repositories(
        &self,
        gateway: &dyn HostingGateway,
        viewer_login: &str,
        tally: &mut RunTally,
    ) -> Result<Vec<TrackedRepository>, SyncError> {
        let tracked = self.store.tracked_repositories(viewer_login)?;
        if !tracked.is_empty() {
            return Ok(tracked);
        }
        // Seeding is a first-run convenience; an emptied set stays empty.
        if self.store.has_tracking_history(viewer_login)? {
            info!(viewer = %viewer_login, "tracked set is empty; nothing to sync");
            return Ok(tracked);
        }

        let mut seeded = Vec::with_capacity(self.settings.fallback_repositories.len());
        for locator in &self.settings.fallback_repositories {
            let details = match gateway.repository(locator).await {
                Ok(details) => details,
                Err(failure) => {
                    warn!(repository = %locator, error = %failure, "seeding repository failed");
                    tally
                        .issues
                        .push(SyncIssue::repository(locator, failure.to_string()));
                    continue;
                }
            };
            let request = NewTrackedRepository {
                viewer_login: viewer_login.to_owned(),
                locator: locator.clone(),
                default_branch: Some(details.default_branch),
                provenance: Provenance::Seeded,
            };
            match self.store.upsert_tracked_repository(&request) {
                Ok(repository) => seeded.push(repository),
                Err(failure) => {
                    warn!(repository = %locator, error = %failure, "seeding repository failed");
                    tally
                        .issues
                        .push(SyncIssue::repository(locator, failure.to_string()));
                }
            }
        }
        Ok(seeded)
    }

    async fn sync_repositories(
        &self,
        gateway: &dyn HostingGateway,
        viewer_login: &str,
        repositories: &[TrackedRepository],
        tally: &mut RunTally,
    ) -> Result<(), PersistenceError> {
        let synchronizer =
            RepositorySynchronizer::new(gateway, self.store, self.settings, viewer_login);

        for repository in repositories {
            match synchronizer.sync(repository, self.clock.now()).await {
                Ok(report) => tally.absorb(report.pulled, report.upserted, report.issues),
                Err(StorageUnavailable { partial, error }) => {
                    tally.absorb(partial.pulled, partial.upserted, partial.issues);
                    return Err(error);
                }
            }
        }
        Ok(())
    }

    fn finalize(
        &self,
        run_id: SyncRunId,
        viewer_login: String,
        status: SyncRunStatus,
        tally: RunTally,
    ) -> Result<SyncRunSummary, SyncError> {
        let outcome = SyncRunOutcome {
            status,
            pulled: tally.pulled,
            upserted: tally.upserted,
            issues: tally.issues,
            finished_at: self.clock.now(),
        };

        if !self.store.finalize_sync_run(run_id, &outcome)? {
            warn!(run = run_id.0, "sync run was already finalised");
        }

        self.telemetry.record(TelemetryEvent::SyncRunFinished {
            run_id: run_id.0,
            status: status.as_str().to_owned(),
            pulled: outcome.pulled,
            upserted: outcome.upserted,
            issues: u64::try_from(outcome.issues.len()).unwrap_or(u64::MAX),
        });
        info!(
            run = run_id.0,
            status = status.as_str(),
            pulled = outcome.pulled,
            upserted = outcome.upserted,
            issues = outcome.issues.len(),
            "sync run finished"
        );

        Ok(SyncRunSummary {
            run_id,
            viewer_login,
            status,
            pulled: outcome.pulled,
            upserted: outcome.upserted,
            issues: outcome.issues,
        })
    }
}

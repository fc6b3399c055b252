//! Beacon CLI entrypoint: migrate, edit the tracked set, or sync.

use std::io::{self, Write};
use std::process::ExitCode;

use beacon::clock::SystemClock;
use beacon::config::{ConfigError, OperationMode};
use beacon::github::{
    GatewayFactory, GitHubError, HostingGateway, OctocrabGatewayFactory, RepositoryLocator,
};
use beacon::persistence::{
    AttentionEntry, NewTrackedRepository, PersistenceError, Provenance, SqliteSyncStore, SyncStore,
    SyncTrigger, migrate_database,
};
use beacon::sync::{StaticCredentials, SyncError, SyncOrchestrator, SyncRunSummary, SyncSettings};
use beacon::BeaconConfig;
use beacon::telemetry::StderrJsonlTelemetrySink;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_LOG_FILTER: &str = "beacon=info";

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    GitHub(#[from] GitHubError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match BeaconConfig::load_layers() {
        Ok(config) => config,
        Err(load_error) => return report(&load_error.into()),
    };
    init_tracing(config.log_json);

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => report(&failure),
    }
}

fn report(failure: &CliError) -> ExitCode {
    if writeln!(io::stderr().lock(), "{failure}").is_err() {
        return ExitCode::FAILURE;
    }
    ExitCode::FAILURE
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .try_init()
    };
    if let Err(init_error) = installed {
        let _ignored = writeln!(io::stderr().lock(), "failed to install logging: {init_error}");
    }
}

async fn run(config: &BeaconConfig) -> Result<(), CliError> {
    let database_url = config
        .database_url
        .as_deref()
        .ok_or(PersistenceError::MissingDatabaseUrl)?;

    if config.operation_mode() == OperationMode::MigrateDatabase {
        let version = migrate_database(database_url, &StderrJsonlTelemetrySink)?;
        writeln!(
            io::stdout().lock(),
            "Database migrated to schema version {}",
            version.as_str()
        )?;
        return Ok(());
    }

    let store = SqliteSyncStore::new(database_url)?;
    let token = config.resolve_token()?;
    let gateways = OctocrabGatewayFactory::new(config.api_base()?, config.request_timeout()?);
    let gateway = gateways.gateway_for(&token)?;
    let login = match config.login.clone() {
        Some(login) => login,
        None => gateway.authenticated_login().await?,
    };

    match config.operation_mode() {
        OperationMode::TrackRepository => {
            let name = config.track.as_deref().unwrap_or_default();
            track(&store, gateway.as_ref(), &login, name).await
        }
        OperationMode::UntrackRepository => {
            let name = config.untrack.as_deref().unwrap_or_default();
            untrack(&store, &login, name)
        }
        OperationMode::SyncOnce | OperationMode::Poll | OperationMode::MigrateDatabase => {
            let settings = config.sync_settings()?;
            let session = SyncSession {
                store: &store,
                credentials: StaticCredentials::default().with(login.clone(), token),
                gateways: &gateways,
                settings: &settings,
                login: &login,
            };
            if config.operation_mode() == OperationMode::Poll {
                session.poll(config.poll_interval()?).await
            } else {
                session.run_once(SyncTrigger::Manual).await
            }
        }
    }
}

async fn track(
    store: &SqliteSyncStore,
    gateway: &dyn HostingGateway,
    login: &str,
    name: &str,
) -> Result<(), CliError> {
    let locator = RepositoryLocator::parse(name)?;
    let details = gateway.repository(&locator).await?;
    let tracked = store.upsert_tracked_repository(&NewTrackedRepository {
        viewer_login: login.to_owned(),
        locator,
        default_branch: Some(details.default_branch),
        provenance: Provenance::Explicit,
    })?;
    writeln!(
        io::stdout().lock(),
        "Tracking {} for {login}",
        tracked.locator.full_name()
    )?;
    Ok(())
}

fn untrack(store: &SqliteSyncStore, login: &str, name: &str) -> Result<(), CliError> {
    let locator = RepositoryLocator::parse(name)?;
    let removed = store.untrack_repository(login, &locator.full_name())?;
    let message = if removed {
        format!("Stopped tracking {} for {login}", locator.full_name())
    } else {
        format!("{} was not tracked for {login}", locator.full_name())
    };
    writeln!(io::stdout().lock(), "{message}")?;
    Ok(())
}

struct SyncSession<'a> {
    store: &'a SqliteSyncStore,
    credentials: StaticCredentials,
    gateways: &'a OctocrabGatewayFactory,
    settings: &'a SyncSettings,
    login: &'a str,
}

impl SyncSession<'_> {
    async fn run_once(&self, trigger: SyncTrigger) -> Result<(), CliError> {
        let telemetry = StderrJsonlTelemetrySink;
        let clock = SystemClock;
        let orchestrator = SyncOrchestrator::new(
            self.store,
            &self.credentials,
            self.gateways,
            self.settings,
            &telemetry,
            &clock,
        );
        let summary = orchestrator.run(trigger, Some(self.login)).await?;
        let entries = self.store.attention_entries(self.login)?;
        write_report(&summary, &entries)?;
        Ok(())
    }

    async fn poll(&self, interval: std::time::Duration) -> Result<(), CliError> {
        info!(interval_seconds = interval.as_secs(), "polling started");
        loop {
            if let Err(run_error) = self.run_once(SyncTrigger::Poll).await {
                error!(error = %run_error, "sync run failed");
            }
            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    info!("polling stopped");
                    return Ok(());
                }
            }
        }
    }
}

fn write_report(summary: &SyncRunSummary, entries: &[AttentionEntry]) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(
        stdout,
        "Sync run {} for {}: {} ({} pulled, {} upserted, {} issues)",
        summary.run_id.0,
        summary.viewer_login,
        summary.status.as_str(),
        summary.pulled,
        summary.upserted,
        summary.issues.len()
    )?;
    for issue in &summary.issues {
        writeln!(stdout, "  - {issue}")?;
    }

    let needing: Vec<&AttentionEntry> = entries.iter().filter(|entry| entry.needs_attention).collect();
    if needing.is_empty() {
        return writeln!(stdout, "Nothing needs your attention.");
    }
    writeln!(stdout, "Needs attention:")?;
    for entry in needing {
        writeln!(
            stdout,
            "{:>5}  {}#{}  {}  [{}]",
            entry.final_score,
            entry.repository,
            entry.number,
            entry.title,
            entry.reason.as_deref().unwrap_or("-")
        )?;
    }
    Ok(())
}

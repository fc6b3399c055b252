//! Beacon library crate: a pull request sync and attention engine.
//!
//! Beacon reconciles the open pull requests of every repository a viewer
//! tracks into a local `SQLite` database, resolving CI, review and activity
//! signals into an urgency score and an attention reason. It also provides a
//! per-feature circuit breaker and a resilient invoker for external AI
//! command-line tools.

pub mod attention;
pub mod clock;
pub mod config;
pub mod github;
pub mod persistence;
pub mod resilience;
pub mod resolve;
pub mod sync;
pub mod telemetry;

pub use config::BeaconConfig;
pub use github::{GitHubError, HostingGateway, OctocrabGateway, PersonalAccessToken};
pub use sync::{SyncError, SyncOrchestrator, SyncRunSummary};

//! Tests for the `SQLite` sync store.

use chrono::{DateTime, Utc};
use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::SqliteSyncStore;
use crate::attention::{AttentionAssessment, AttentionReason, ScoreBreakdown};
use crate::github::test_fixtures::at;
use crate::github::{PullRequestLifecycle, RepositoryLocator};
use crate::persistence::{
    NewTrackedRepository, PersistenceError, Provenance, PullRequestRecord, SyncRunOutcome,
    SyncRunStatus, SyncStore, SyncTrigger, TrackedRepository, migrate_database,
};
use crate::resolve::{CiState, FlowViolation, ReviewState};
use crate::sync::SyncIssue;
use crate::telemetry::NoopTelemetrySink;

struct MigratedStore {
    _temp_dir: TempDir,
    store: SqliteSyncStore,
}

#[fixture]
fn migrated() -> MigratedStore {
    let temp_dir = TempDir::new().expect("temp dir should be created");
    let database_url = temp_dir
        .path()
        .join("beacon.sqlite")
        .to_string_lossy()
        .into_owned();
    migrate_database(&database_url, &NoopTelemetrySink).expect("migrations should run");
    let store = SqliteSyncStore::new(database_url).expect("store should build");
    MigratedStore {
        _temp_dir: temp_dir,
        store,
    }
}

fn track(store: &SqliteSyncStore, viewer: &str, full_name: &str) -> TrackedRepository {
    track_as(store, viewer, full_name, Provenance::Explicit)
}

fn track_as(
    store: &SqliteSyncStore,
    viewer: &str,
    full_name: &str,
    provenance: Provenance,
) -> TrackedRepository {
    store
        .upsert_tracked_repository(&NewTrackedRepository {
            viewer_login: viewer.to_owned(),
            locator: RepositoryLocator::parse(full_name).expect("locator should parse"),
            default_branch: None,
            provenance,
        })
        .expect("repository should be tracked")
}

fn record(repository_id: i64, number: u64, title: &str) -> PullRequestRecord {
    let updated: DateTime<Utc> = at("2026-01-02T00:00:00Z");
    PullRequestRecord {
        repository_id,
        number,
        title: title.to_owned(),
        description: Some("body".to_owned()),
        lifecycle: PullRequestLifecycle::Open,
        draft: false,
        author: Some("hubot".to_owned()),
        ci_state: CiState::Failure,
        review_state: ReviewState::Unreviewed,
        additions: 10,
        deletions: 2,
        changed_files: 1,
        comment_count: 0,
        commit_count: 1,
        created_at: at("2026-01-01T00:00:00Z"),
        remote_updated_at: updated,
        last_activity_at: updated,
        head_ref: "feature/x".to_owned(),
        base_ref: "main".to_owned(),
        flow_phase: Some("feature/*".to_owned()),
        flow_violation: Some(FlowViolation {
            rule: "feature/*".to_owned(),
            head: "feature/x".to_owned(),
            base: "main".to_owned(),
            expected_targets: vec!["develop".to_owned()],
        }),
        raw_payload: serde_json::json!({ "number": number }),
    }
}

fn attention(final_score: i64, reason: Option<AttentionReason>) -> AttentionAssessment {
    AttentionAssessment {
        breakdown: ScoreBreakdown {
            ci_penalty: final_score,
            ..ScoreBreakdown::default()
        },
        final_score,
        reason,
        needs_attention: reason.is_some_and(|found| !found.is_informational()),
    }
}

#[rstest]
fn tracking_is_unique_per_viewer_and_soft_removed(migrated: MigratedStore) {
    let store = &migrated.store;
    let first = track(store, "octocat", "octo/widgets");
    let again = track(store, "octocat", "octo/widgets");
    let other_viewer = track(store, "hubot", "octo/widgets");

    assert_eq!(first.id, again.id);
    assert_ne!(first.id, other_viewer.id);

    assert!(
        store
            .untrack_repository("octocat", "octo/widgets")
            .expect("untrack should succeed")
    );
    assert!(
        !store
            .untrack_repository("octocat", "octo/widgets")
            .expect("second untrack should succeed")
    );
    assert!(
        store
            .tracked_repositories("octocat")
            .expect("listing should succeed")
            .is_empty()
    );
    assert_eq!(
        store
            .tracked_repositories("hubot")
            .expect("listing should succeed")
            .len(),
        1
    );

    let revived = track(store, "octocat", "octo/widgets");
    assert_eq!(revived.id, first.id);
}

#[rstest]
fn explicit_tracking_upgrades_seeded_rows(migrated: MigratedStore) {
    let store = &migrated.store;
    let seeded = track_as(store, "octocat", "octo/widgets", Provenance::Seeded);
    assert!(
        store
            .untrack_repository("octocat", "octo/widgets")
            .expect("untrack should succeed")
    );

    let explicit = track(store, "octocat", "octo/widgets");
    assert_eq!(explicit.id, seeded.id);
    assert_eq!(explicit.provenance, Provenance::Explicit);

    let reseeded = track_as(store, "octocat", "octo/widgets", Provenance::Seeded);
    assert_eq!(
        reseeded.provenance,
        Provenance::Explicit,
        "seeding never downgrades an explicit row"
    );
}

#[rstest]
fn tracking_history_outlives_untracking(migrated: MigratedStore) {
    let store = &migrated.store;
    assert!(
        !store
            .has_tracking_history("octocat")
            .expect("history should load")
    );

    track_as(store, "octocat", "octo/widgets", Provenance::Seeded);
    store
        .untrack_repository("octocat", "octo/widgets")
        .expect("untrack should succeed");

    assert!(
        store
            .has_tracking_history("octocat")
            .expect("history should load")
    );
    assert!(
        !store
            .has_tracking_history("hubot")
            .expect("history should load")
    );
}

#[rstest]
fn repository_sync_refreshes_default_branch(migrated: MigratedStore) {
    let store = &migrated.store;
    let tracked = track(store, "octocat", "octo/widgets");
    let synced_at = at("2026-03-01T10:00:00Z");

    store
        .record_repository_sync(tracked.id, "trunk", synced_at)
        .expect("sync should be recorded");

    let listed = store
        .tracked_repositories("octocat")
        .expect("listing should succeed");
    let repository = listed.first().expect("repository should be listed");
    assert_eq!(repository.default_branch.as_deref(), Some("trunk"));
    assert_eq!(repository.last_synced_at, Some(synced_at));
    assert_eq!(repository.provenance, Provenance::Explicit);
}

#[rstest]
fn pull_request_upserts_are_idempotent(migrated: MigratedStore) {
    let store = &migrated.store;
    let tracked = track(store, "octocat", "octo/widgets");

    store
        .upsert_pull_request(
            &record(tracked.id, 7, "First title"),
            &attention(40, Some(AttentionReason::CiFailing)),
        )
        .expect("first upsert should succeed");
    store
        .upsert_pull_request(
            &record(tracked.id, 7, "Second title"),
            &attention(40, Some(AttentionReason::CiFailing)),
        )
        .expect("second upsert should succeed");

    let entries = store
        .attention_entries("octocat")
        .expect("listing should succeed");
    assert_eq!(entries.len(), 1);
    let entry = entries.first().expect("entry should exist");
    assert_eq!(entry.title, "Second title");
    assert_eq!(entry.ci_state, "FAILURE");
    assert_eq!(entry.reason.as_deref(), Some("CI failing"));
    assert!(entry.needs_attention);
}

#[rstest]
fn attention_entries_are_ordered_by_score(migrated: MigratedStore) {
    let store = &migrated.store;
    let tracked = track(store, "octocat", "octo/widgets");

    for (number, score) in [(1, 10), (2, 70), (3, 35)] {
        store
            .upsert_pull_request(&record(tracked.id, number, "pr"), &attention(score, None))
            .expect("upsert should succeed");
    }
    let mut closed = record(tracked.id, 4, "closed");
    closed.lifecycle = PullRequestLifecycle::Closed;
    store
        .upsert_pull_request(&closed, &attention(99, None))
        .expect("upsert should succeed");

    let numbers: Vec<u64> = store
        .attention_entries("octocat")
        .expect("listing should succeed")
        .iter()
        .map(|entry| entry.number)
        .collect();
    assert_eq!(numbers, vec![2, 3, 1]);
}

#[rstest]
fn sync_runs_finalise_exactly_once(migrated: MigratedStore) {
    let store = &migrated.store;
    let repositories = vec!["octo/widgets".to_owned()];
    let run_id = store
        .create_sync_run(SyncTrigger::Manual, &repositories, at("2026-01-01T00:00:00Z"))
        .expect("run should be created");

    let running = store
        .sync_run(run_id)
        .expect("load should succeed")
        .expect("run should exist");
    assert_eq!(running.status, SyncRunStatus::Running);
    assert_eq!(running.repositories, repositories);

    let repository = RepositoryLocator::parse("octo/widgets").expect("locator should parse");
    let outcome = SyncRunOutcome {
        status: SyncRunStatus::Partial,
        pulled: 5,
        upserted: 4,
        issues: vec![SyncIssue::repository(&repository, "boom")],
        finished_at: at("2026-01-01T00:05:00Z"),
    };
    assert!(
        store
            .finalize_sync_run(run_id, &outcome)
            .expect("finalize should succeed")
    );

    let overwrite = SyncRunOutcome {
        status: SyncRunStatus::Success,
        issues: Vec::new(),
        ..outcome.clone()
    };
    assert!(
        !store
            .finalize_sync_run(run_id, &overwrite)
            .expect("second finalize should succeed")
    );

    let finished = store
        .sync_run(run_id)
        .expect("load should succeed")
        .expect("run should exist");
    assert_eq!(finished.status, SyncRunStatus::Partial);
    assert_eq!(finished.trigger, "MANUAL");
    assert_eq!((finished.pulled, finished.upserted, finished.error_count), (5, 4, 1));
    assert_eq!(finished.issues, outcome.issues);
    assert_eq!(finished.finished_at, Some(outcome.finished_at));
}

#[rstest]
fn unmigrated_database_reports_missing_schema() {
    let temp_dir = TempDir::new().expect("temp dir should be created");
    let database_url = temp_dir.path().join("empty.sqlite");
    let store =
        SqliteSyncStore::new(database_url.to_string_lossy()).expect("store should build");

    assert_eq!(
        store.tracked_repositories("octocat"),
        Err(PersistenceError::SchemaNotInitialised)
    );
}

#[rstest]
fn blank_database_url_is_rejected() {
    assert!(matches!(
        SqliteSyncStore::new(" "),
        Err(PersistenceError::BlankDatabaseUrl)
    ));
}

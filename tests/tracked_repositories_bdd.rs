//! Behavioural tests for migrations and the tracked repository set.

mod support;

use std::sync::Arc;

use beacon::github::RepositoryLocator;
use beacon::persistence::{
    NewTrackedRepository, PersistenceError, Provenance, SqliteSyncStore, SyncStore,
    migrate_database,
};
use beacon::telemetry::TelemetryEvent;
use beacon::telemetry::test_support::RecordingSink;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use tempfile::TempDir;

use support::create_temp_dir;

#[derive(ScenarioState, Default)]
struct StorageState {
    database_url: Slot<String>,
    temp_dir: Slot<TempDir>,
    schema_version: Slot<String>,
    error: Slot<PersistenceError>,
    telemetry: Slot<Arc<RecordingSink>>,
    store: Slot<Arc<SqliteSyncStore>>,
}

#[fixture]
fn storage_state() -> StorageState {
    StorageState::default()
}

fn unquote(value: &str) -> &str {
    value.trim_matches('"')
}

fn use_temporary_file(storage_state: &StorageState) -> String {
    let temp_dir = create_temp_dir();
    let database_url = temp_dir
        .path()
        .join("beacon.sqlite")
        .to_string_lossy()
        .to_string();
    storage_state.temp_dir.set(temp_dir);
    storage_state.database_url.set(database_url.clone());
    storage_state.telemetry.set(Arc::new(RecordingSink::default()));
    database_url
}

#[expect(clippy::expect_used, reason = "test code; panics are acceptable")]
fn store(storage_state: &StorageState) -> Arc<SqliteSyncStore> {
    storage_state
        .store
        .with_ref(Arc::clone)
        .expect("store not initialised")
}

#[expect(clippy::expect_used, reason = "test code; panics are acceptable")]
fn recorded_events(storage_state: &StorageState) -> Vec<TelemetryEvent> {
    storage_state
        .telemetry
        .with_ref(|sink| sink.events())
        .expect("telemetry sink not initialised")
}

// --- Given steps ---

#[given("a temporary database file")]
fn temporary_database_file(storage_state: &StorageState) {
    use_temporary_file(storage_state);
}

#[given("a blank database URL")]
fn blank_database_url(storage_state: &StorageState) {
    storage_state.database_url.set("   ".to_owned());
    storage_state.telemetry.set(Arc::new(RecordingSink::default()));
}

#[expect(clippy::expect_used, reason = "test code; panics are acceptable")]
#[given("a migrated database")]
fn migrated_database(storage_state: &StorageState) {
    let database_url = use_temporary_file(storage_state);
    migrate_database(&database_url, &RecordingSink::default()).expect("migrations should apply");
    let store = SqliteSyncStore::new(database_url).expect("store should open");
    storage_state.store.set(Arc::new(store));
}

// --- When steps ---

#[expect(clippy::expect_used, reason = "test code; panics are acceptable")]
#[when("database migrations are run")]
fn run_migrations(storage_state: &StorageState) {
    let telemetry = storage_state
        .telemetry
        .with_ref(Arc::clone)
        .expect("telemetry sink not initialised");
    let database_url = storage_state
        .database_url
        .with_ref(Clone::clone)
        .expect("database URL not initialised");

    match migrate_database(&database_url, telemetry.as_ref()) {
        Ok(version) => storage_state.schema_version.set(version.as_str().to_owned()),
        Err(error) => storage_state.error.set(error),
    }
}

#[expect(clippy::expect_used, reason = "test code; panics are acceptable")]
#[when("{viewer} starts tracking {name}")]
fn starts_tracking(storage_state: &StorageState, viewer: String, name: String) {
    let locator = RepositoryLocator::parse(unquote(&name)).expect("repository should parse");
    store(storage_state)
        .upsert_tracked_repository(&NewTrackedRepository {
            viewer_login: unquote(&viewer).to_owned(),
            locator,
            default_branch: None,
            provenance: Provenance::Explicit,
        })
        .expect("repository should be tracked");
}

#[expect(clippy::expect_used, reason = "test code; panics are acceptable")]
#[when("{viewer} stops tracking {name}")]
fn stops_tracking(storage_state: &StorageState, viewer: String, name: String) {
    let removed = store(storage_state)
        .untrack_repository(unquote(&viewer), unquote(&name))
        .expect("untracking should succeed");
    assert!(removed, "expected a tracked row to change");
}

// --- Then steps ---

#[expect(clippy::expect_used, reason = "test code; panics are acceptable")]
#[then("the schema version is {expected}")]
fn schema_version_is(storage_state: &StorageState, expected: String) {
    let actual = storage_state
        .schema_version
        .with_ref(Clone::clone)
        .expect("schema version missing");

    assert_eq!(actual, unquote(&expected), "schema version mismatch");
}

#[then("telemetry records the schema version {expected}")]
fn telemetry_records_schema_version(storage_state: &StorageState, expected: String) {
    let events = recorded_events(storage_state);

    assert_eq!(
        events,
        vec![TelemetryEvent::SchemaVersionRecorded {
            schema_version: unquote(&expected).to_owned(),
        }]
    );
}

#[expect(clippy::expect_used, reason = "test code; panics are acceptable")]
#[then("a persistence error {expected} is reported")]
fn persistence_error_is(storage_state: &StorageState, expected: String) {
    let error = storage_state
        .error
        .with_ref(ToString::to_string)
        .expect("expected persistence error");

    assert_eq!(error, unquote(&expected));
}

#[then("no telemetry is recorded")]
fn no_telemetry_is_recorded(storage_state: &StorageState) {
    let events = recorded_events(storage_state);
    assert!(events.is_empty(), "expected no telemetry events, got {events:?}");
}

#[expect(clippy::expect_used, reason = "test code; panics are acceptable")]
#[then("{viewer} has {count:usize} tracked repositories")]
fn tracked_count_is(storage_state: &StorageState, viewer: String, count: usize) {
    let tracked = store(storage_state)
        .tracked_repositories(unquote(&viewer))
        .expect("tracked repositories should load");

    assert_eq!(tracked.len(), count, "tracked set size mismatch");
}

#[expect(clippy::expect_used, reason = "test code; panics are acceptable")]
#[then("{viewer} tracks {name}")]
fn viewer_tracks(storage_state: &StorageState, viewer: String, name: String) {
    let tracked = store(storage_state)
        .tracked_repositories(unquote(&viewer))
        .expect("tracked repositories should load");
    let names: Vec<String> = tracked
        .iter()
        .map(|repository| repository.locator.full_name())
        .collect();

    assert_eq!(names, vec![unquote(&name).to_owned()]);
}

#[scenario(path = "tests/features/tracked_repositories.feature", index = 0)]
fn migrations_record_schema_version(storage_state: StorageState) {
    let _ = storage_state;
}

#[scenario(path = "tests/features/tracked_repositories.feature", index = 1)]
fn blank_database_url_is_rejected(storage_state: StorageState) {
    let _ = storage_state;
}

#[scenario(path = "tests/features/tracked_repositories.feature", index = 2)]
fn tracking_twice_keeps_one_row(storage_state: StorageState) {
    let _ = storage_state;
}

#[scenario(path = "tests/features/tracked_repositories.feature", index = 3)]
fn untracked_repositories_can_be_revived(storage_state: StorageState) {
    let _ = storage_state;
}

#[scenario(path = "tests/features/tracked_repositories.feature", index = 4)]
fn viewers_keep_separate_sets(storage_state: StorageState) {
    let _ = storage_state;
}

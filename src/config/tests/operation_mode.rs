//! Tests for operation mode selection.

use rstest::rstest;

use crate::BeaconConfig;
use crate::config::OperationMode;

#[rstest]
#[case::defaults_to_single_sync(BeaconConfig::default(), OperationMode::SyncOnce)]
#[case::poll(
    BeaconConfig { poll: true, ..Default::default() },
    OperationMode::Poll
)]
#[case::track(
    BeaconConfig { track: Some("octo/widgets".to_owned()), poll: true, ..Default::default() },
    OperationMode::TrackRepository
)]
#[case::untrack(
    BeaconConfig { untrack: Some("octo/widgets".to_owned()), ..Default::default() },
    OperationMode::UntrackRepository
)]
#[case::migrate_wins(
    BeaconConfig {
        migrate_db: true,
        track: Some("octo/widgets".to_owned()),
        poll: true,
        ..Default::default()
    },
    OperationMode::MigrateDatabase
)]
fn operation_mode_follows_flag_priority(
    #[case] config: BeaconConfig,
    #[case] expected: OperationMode,
) {
    assert_eq!(config.operation_mode(), expected);
}

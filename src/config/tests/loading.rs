//! Tests for loading configuration from real arguments and environment.

use ortho_config::OrthoConfig;
use rstest::rstest;

use crate::BeaconConfig;
use crate::attention::AttentionWeights;

/// Loads configuration with an isolated home directory and the given
/// environment overrides.
fn load_isolated(env: &[(&'static str, Option<&str>)], cli_args: &[&str]) -> BeaconConfig {
    load_isolated_with_file(None, env, cli_args)
}

/// Like [`load_isolated`], with `dotfile` written to `.beacon.toml` in the
/// isolated home directory.
fn load_isolated_with_file(
    dotfile: Option<&str>,
    env: &[(&'static str, Option<&str>)],
    cli_args: &[&str],
) -> BeaconConfig {
    let temp_dir = tempfile::TempDir::new().expect("temp dir should be created");
    let home = temp_dir.path().to_string_lossy().to_string();
    if let Some(contents) = dotfile {
        std::fs::write(temp_dir.path().join(".beacon.toml"), contents)
            .expect("dotfile should be written");
    }

    let mut vars: Vec<(&str, Option<&str>)> = vec![
        ("HOME", Some(home.as_str())),
        ("XDG_CONFIG_HOME", Some(home.as_str())),
        ("BEACON_LOGIN", None),
    ];
    vars.extend_from_slice(env);
    let _guard = env_lock::lock_env(vars);

    let mut args: Vec<std::ffi::OsString> = vec![std::ffi::OsString::from("beacon")];
    args.extend(cli_args.iter().map(std::ffi::OsString::from));

    BeaconConfig::load_from_iter(args).expect("config should load")
}

#[rstest]
#[case::default(None, &[], 300)]
#[case::environment(Some("120"), &[], 120)]
#[case::cli_beats_environment(Some("120"), &["--poll-interval-seconds", "45"], 45)]
fn poll_interval_loads_from_each_layer(
    #[case] env_value: Option<&str>,
    #[case] cli_args: &[&str],
    #[case] expected: u64,
) {
    let config = load_isolated(&[("BEACON_POLL_INTERVAL_SECONDS", env_value)], cli_args);

    assert_eq!(config.poll_interval_seconds, expected);
}

#[rstest]
fn flags_load_from_cli() {
    let config = load_isolated(
        &[("BEACON_POLL_INTERVAL_SECONDS", None)],
        &["--poll", "--track", "octo/widgets", "-l", "octocat"],
    );

    assert!(config.poll, "poll flag should be set");
    assert_eq!(config.track.as_deref(), Some("octo/widgets"));
    assert_eq!(config.login.as_deref(), Some("octocat"));
}

#[rstest]
fn attention_weights_load_from_the_dotfile() {
    let config = load_isolated_with_file(
        Some("poll_interval_seconds = 90\n\n[attention]\nreview_request = 70\nmention_cap = 5\n"),
        &[("BEACON_POLL_INTERVAL_SECONDS", None)],
        &[],
    );

    assert_eq!(config.poll_interval_seconds, 90);
    assert_eq!(config.attention.review_request, 70);
    assert_eq!(config.attention.mention_cap, 5);
    assert_eq!(
        config.attention.ci_failure,
        AttentionWeights::default().ci_failure
    );
    assert_eq!(
        config
            .sync_settings()
            .expect("settings should build")
            .weights
            .review_request,
        70
    );
}

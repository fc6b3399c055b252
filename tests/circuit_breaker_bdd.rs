//! Behavioural tests for the per-feature circuit breaker.

use std::sync::Arc;
use std::time::Duration;

use beacon::clock::ManualClock;
use beacon::resilience::{BreakerConfig, CircuitBreakerRegistry, CircuitOpen};
use beacon::telemetry::test_support::RecordingSink;
use chrono::{DateTime, TimeDelta, Utc};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};

#[derive(ScenarioState, Default)]
struct BreakerState {
    clock: Slot<Arc<ManualClock>>,
    registry: Slot<Arc<CircuitBreakerRegistry>>,
    telemetry: Slot<Arc<RecordingSink>>,
}

#[fixture]
fn breaker_state() -> BreakerState {
    BreakerState::default()
}

fn unquote(value: &str) -> &str {
    value.trim_matches('"')
}

#[expect(clippy::expect_used, reason = "test code; panics are acceptable")]
fn registry(state: &BreakerState) -> Arc<CircuitBreakerRegistry> {
    state
        .registry
        .with_ref(Arc::clone)
        .expect("circuit breaker not initialised")
}

#[expect(clippy::expect_used, reason = "test code; panics are acceptable")]
fn check(state: &BreakerState, feature: &str) -> Result<(), CircuitOpen> {
    state
        .registry
        .with_ref(|registry| registry.check_circuit(unquote(feature)))
        .expect("circuit breaker not initialised")
}

// --- Given steps ---

#[expect(clippy::expect_used, reason = "test code; panics are acceptable")]
#[given("a circuit breaker with threshold {threshold:u32} and cooldown {cooldown:u64} seconds")]
fn circuit_breaker(breaker_state: &BreakerState, threshold: u32, cooldown: u64) {
    let start = DateTime::parse_from_rfc3339("2026-10-19T08:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc);
    let clock = Arc::new(ManualClock::new(start));
    let telemetry = Arc::new(RecordingSink::default());
    let config = BreakerConfig {
        failure_threshold: threshold,
        cooldown: Duration::from_secs(cooldown),
    };
    let registry = CircuitBreakerRegistry::new(config, Arc::clone(&clock) as _)
        .with_telemetry(Arc::clone(&telemetry) as _);

    breaker_state.clock.set(clock);
    breaker_state.telemetry.set(telemetry);
    breaker_state.registry.set(Arc::new(registry));
}

// --- When steps ---

#[when("{count:u32} failures are recorded for {feature}")]
fn failures_recorded(breaker_state: &BreakerState, count: u32, feature: String) {
    let breakers = registry(breaker_state);
    for _ in 0..count {
        breakers.record_failure(unquote(&feature));
    }
}

#[when("a failure is recorded for {feature}")]
fn failure_recorded(breaker_state: &BreakerState, feature: String) {
    registry(breaker_state).record_failure(unquote(&feature));
}

#[when("a success is recorded for {feature}")]
fn success_recorded(breaker_state: &BreakerState, feature: String) {
    registry(breaker_state).record_success(unquote(&feature));
}

#[expect(clippy::expect_used, reason = "test code; panics are acceptable")]
#[when("{seconds:i64} seconds pass")]
fn time_passes(breaker_state: &BreakerState, seconds: i64) {
    breaker_state
        .clock
        .with_ref(|clock| clock.advance(TimeDelta::seconds(seconds)))
        .expect("clock not initialised");
}

#[when("the probe for {feature} is admitted")]
fn probe_admitted(breaker_state: &BreakerState, feature: String) {
    let result = check(breaker_state, &feature);
    assert!(result.is_ok(), "probe should be admitted, got {result:?}");
}

// --- Then steps ---

#[then("the circuit for {feature} is {state}")]
fn circuit_is(breaker_state: &BreakerState, feature: String, state: String) {
    let actual = registry(breaker_state).state(unquote(&feature));

    assert_eq!(actual.as_str(), unquote(&state), "circuit state mismatch");
}

#[then("a check for {feature} is allowed")]
fn check_allowed(breaker_state: &BreakerState, feature: String) {
    let result = check(breaker_state, &feature);
    assert!(result.is_ok(), "expected check to pass, got {result:?}");
}

#[then("a check for {feature} is rejected with retry after {seconds:u64} seconds")]
fn check_rejected_with_retry(breaker_state: &BreakerState, feature: String, seconds: u64) {
    let result = check(breaker_state, &feature);

    assert_eq!(
        result,
        Err(CircuitOpen {
            feature: unquote(&feature).to_owned(),
            retry_after: Duration::from_secs(seconds),
        })
    );
}

#[then("the next check for {feature} is rejected")]
fn next_check_rejected(breaker_state: &BreakerState, feature: String) {
    let result = check(breaker_state, &feature);
    assert!(result.is_err(), "expected rejection while probe is in flight");
}

#[scenario(path = "tests/features/circuit_breaker.feature", index = 0)]
fn consecutive_failures_open_the_circuit(breaker_state: BreakerState) {
    let _ = breaker_state;
}

#[scenario(path = "tests/features/circuit_breaker.feature", index = 1)]
fn failures_below_threshold_keep_circuit_closed(breaker_state: BreakerState) {
    let _ = breaker_state;
}

#[scenario(path = "tests/features/circuit_breaker.feature", index = 2)]
fn cooldown_admits_one_probe(breaker_state: BreakerState) {
    let _ = breaker_state;
}

#[scenario(path = "tests/features/circuit_breaker.feature", index = 3)]
fn successful_probe_closes_circuit(breaker_state: BreakerState) {
    let _ = breaker_state;
}

#[scenario(path = "tests/features/circuit_breaker.feature", index = 4)]
fn failed_probe_reopens_circuit(breaker_state: BreakerState) {
    let _ = breaker_state;
}

#[scenario(path = "tests/features/circuit_breaker.feature", index = 5)]
fn circuits_are_independent(breaker_state: BreakerState) {
    let events = breaker_state
        .telemetry
        .with_ref(|sink| sink.events())
        .unwrap_or_default();
    assert_eq!(events.len(), 1, "only the failing feature changes state");
}

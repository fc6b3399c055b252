//! Per-feature circuit breaker registry.
//!
//! Each feature key owns an independent circuit. A circuit opens after a run
//! of consecutive failures, rejects calls until the cooldown elapses, then
//! admits exactly one probe. The probe's outcome decides whether the circuit
//! closes again or reopens for another cooldown.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::telemetry::{TelemetryEvent, TelemetrySink};

/// Default number of consecutive failures that opens a circuit.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default time an open circuit rejects calls before admitting a probe.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Observable state of one circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CircuitState {
    /// Calls flow normally.
    #[default]
    Closed,
    /// Calls are rejected until the cooldown elapses.
    Open,
    /// A single probe call is allowed through.
    HalfOpen,
}

impl CircuitState {
    /// Returns the canonical upper-case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "CLOSED",
            Self::Open => "OPEN",
            Self::HalfOpen => "HALF_OPEN",
        }
    }
}

/// Thresholds shared by every circuit in a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakerConfig {
    /// Consecutive failures that open a closed circuit.
    pub failure_threshold: u32,
    /// How long an open circuit waits before admitting a probe.
    pub cooldown: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

/// Rejection returned while a circuit refuses calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circuit for `{feature}` is open; retry after {}s", retry_after.as_secs())]
pub struct CircuitOpen {
    /// Feature key whose circuit rejected the call.
    pub feature: String,
    /// Time remaining until the circuit will admit a probe.
    pub retry_after: Duration,
}

/// Point-in-time counters for one circuit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CircuitSnapshot {
    /// Current state.
    pub state: CircuitState,
    /// Failures since the last success.
    pub consecutive_failures: u32,
    /// When the most recent failure was recorded.
    pub last_failure_at: Option<DateTime<Utc>>,
    /// Successes recorded over the circuit's lifetime.
    pub total_successes: u64,
    /// Failures recorded over the circuit's lifetime.
    pub total_failures: u64,
}

#[derive(Debug, Default)]
struct Circuit {
    counters: CircuitSnapshot,
    opened_at: Option<DateTime<Utc>>,
    probe_in_flight: bool,
}

/// Registry of independent circuits keyed by feature name.
pub struct CircuitBreakerRegistry {
    config: BreakerConfig,
    clock: Arc<dyn Clock>,
    telemetry: Option<Arc<dyn TelemetrySink>>,
    circuits: Mutex<HashMap<String, Circuit>>,
}

impl std::fmt::Debug for CircuitBreakerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreakerRegistry")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CircuitBreakerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(config: BreakerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            telemetry: None,
            circuits: Mutex::new(HashMap::new()),
        }
    }

    /// Emits a telemetry event on every state transition.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Decides whether a call for `feature` may proceed.
    ///
    /// An open circuit whose cooldown has elapsed moves to half-open and the
    /// caller becomes its single probe.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitOpen`] while the circuit is open within its cooldown,
    /// or while a half-open probe is still in flight.
    pub fn check_circuit(&self, feature: &str) -> Result<(), CircuitOpen> {
        let now = self.clock.now();
        let mut circuits = self.lock();
        let circuit = circuits.entry(feature.to_owned()).or_default();

        match circuit.counters.state {
            CircuitState::Closed => Ok(()),
            CircuitState::HalfOpen if circuit.probe_in_flight => Err(CircuitOpen {
                feature: feature.to_owned(),
                retry_after: self.config.cooldown,
            }),
            CircuitState::HalfOpen => {
                circuit.probe_in_flight = true;
                Ok(())
            }
            CircuitState::Open => {
                let remaining = self.remaining_cooldown(circuit.opened_at, now);
                if remaining.is_zero() {
                    circuit.probe_in_flight = true;
                    self.transition(feature, circuit, CircuitState::HalfOpen);
                    Ok(())
                } else {
                    Err(CircuitOpen {
                        feature: feature.to_owned(),
                        retry_after: remaining,
                    })
                }
            }
        }
    }

    /// Records a successful call, closing the circuit.
    pub fn record_success(&self, feature: &str) {
        let mut circuits = self.lock();
        let circuit = circuits.entry(feature.to_owned()).or_default();

        circuit.counters.total_successes = circuit.counters.total_successes.saturating_add(1);
        circuit.counters.consecutive_failures = 0;
        circuit.probe_in_flight = false;
        circuit.opened_at = None;
        if circuit.counters.state != CircuitState::Closed {
            self.transition(feature, circuit, CircuitState::Closed);
        }
    }

    /// Records a failed call, opening the circuit when the threshold is met
    /// or when a half-open probe fails.
    pub fn record_failure(&self, feature: &str) {
        let now = self.clock.now();
        let mut circuits = self.lock();
        let circuit = circuits.entry(feature.to_owned()).or_default();

        circuit.counters.total_failures = circuit.counters.total_failures.saturating_add(1);
        circuit.counters.consecutive_failures =
            circuit.counters.consecutive_failures.saturating_add(1);
        circuit.counters.last_failure_at = Some(now);

        let should_open = match circuit.counters.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => {
                circuit.counters.consecutive_failures >= self.config.failure_threshold
            }
            CircuitState::Open => false,
        };

        if should_open {
            circuit.probe_in_flight = false;
            circuit.opened_at = Some(now);
            self.transition(feature, circuit, CircuitState::Open);
        }
    }

    /// Returns the counters for `feature`, or a fresh closed snapshot when
    /// the feature has never been seen.
    #[must_use]
    pub fn snapshot(&self, feature: &str) -> CircuitSnapshot {
        self.lock()
            .get(feature)
            .map(|circuit| circuit.counters.clone())
            .unwrap_or_default()
    }

    /// Returns the current state for `feature`.
    #[must_use]
    pub fn state(&self, feature: &str) -> CircuitState {
        self.snapshot(feature).state
    }

    fn remaining_cooldown(&self, opened_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
        let Some(opened) = opened_at else {
            return Duration::ZERO;
        };
        let cooldown = TimeDelta::from_std(self.config.cooldown).unwrap_or(TimeDelta::MAX);
        let reopens_at = opened.checked_add_signed(cooldown).unwrap_or(DateTime::<Utc>::MAX_UTC);
        (reopens_at - now).to_std().unwrap_or(Duration::ZERO)
    }

    fn transition(&self, feature: &str, circuit: &mut Circuit, to: CircuitState) {
        let from = circuit.counters.state;
        circuit.counters.state = to;

        if to == CircuitState::Open {
            warn!(
                feature,
                from = from.as_str(),
                failures = circuit.counters.consecutive_failures,
                "circuit opened"
            );
        } else {
            info!(feature, from = from.as_str(), to = to.as_str(), "circuit state changed");
        }

        if let Some(sink) = &self.telemetry {
            sink.record(TelemetryEvent::CircuitStateChanged {
                feature: feature.to_owned(),
                from: from.as_str().to_owned(),
                to: to.as_str().to_owned(),
            });
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Circuit>> {
        self.circuits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{DateTime, TimeDelta, Utc};
    use rstest::{fixture, rstest};

    use super::{BreakerConfig, CircuitBreakerRegistry, CircuitOpen, CircuitState};
    use crate::clock::ManualClock;
    use crate::telemetry::TelemetryEvent;
    use crate::telemetry::test_support::RecordingSink;

    const FEATURE: &str = "summaries";

    struct Harness {
        clock: Arc<ManualClock>,
        telemetry: Arc<RecordingSink>,
        registry: CircuitBreakerRegistry,
    }

    impl Harness {
        fn fail(&self, times: u32) {
            for _ in 0..times {
                self.registry.record_failure(FEATURE);
            }
        }
    }

    #[fixture]
    fn harness() -> Harness {
        let start = DateTime::parse_from_rfc3339("2026-10-19T09:00:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc);
        let clock = Arc::new(ManualClock::new(start));
        let telemetry = Arc::new(RecordingSink::default());
        let config = BreakerConfig {
            failure_threshold: 3,
            cooldown: Duration::from_secs(60),
        };
        let registry = CircuitBreakerRegistry::new(config, Arc::clone(&clock) as _)
            .with_telemetry(Arc::clone(&telemetry) as _);
        Harness {
            clock,
            telemetry,
            registry,
        }
    }

    #[rstest]
    fn stays_closed_below_threshold(harness: Harness) {
        harness.fail(2);

        assert_eq!(harness.registry.state(FEATURE), CircuitState::Closed);
        assert!(harness.registry.check_circuit(FEATURE).is_ok());
    }

    #[rstest]
    fn opens_at_threshold_and_reports_retry_after(harness: Harness) {
        harness.fail(3);
        harness.clock.advance(TimeDelta::seconds(20));

        let rejection = harness
            .registry
            .check_circuit(FEATURE)
            .expect_err("open circuit should reject");

        assert_eq!(
            rejection,
            CircuitOpen {
                feature: FEATURE.to_owned(),
                retry_after: Duration::from_secs(40),
            }
        );
    }

    #[rstest]
    fn admits_exactly_one_probe_after_cooldown(harness: Harness) {
        harness.fail(3);
        harness.clock.advance(TimeDelta::seconds(60));

        assert!(harness.registry.check_circuit(FEATURE).is_ok());
        assert_eq!(harness.registry.state(FEATURE), CircuitState::HalfOpen);
        assert!(harness.registry.check_circuit(FEATURE).is_err());
    }

    #[rstest]
    fn successful_probe_closes_and_resets(harness: Harness) {
        harness.fail(3);
        harness.clock.advance(TimeDelta::seconds(61));
        harness.registry.check_circuit(FEATURE).expect("probe admitted");

        harness.registry.record_success(FEATURE);

        let snapshot = harness.registry.snapshot(FEATURE);
        assert_eq!(snapshot.state, CircuitState::Closed);
        assert_eq!(snapshot.consecutive_failures, 0);
        assert_eq!(snapshot.total_failures, 3);
        assert_eq!(snapshot.total_successes, 1);
        assert!(harness.registry.check_circuit(FEATURE).is_ok());
    }

    #[rstest]
    fn failed_probe_reopens_for_a_full_cooldown(harness: Harness) {
        harness.fail(3);
        harness.clock.advance(TimeDelta::seconds(60));
        harness.registry.check_circuit(FEATURE).expect("probe admitted");

        harness.registry.record_failure(FEATURE);

        let rejection = harness
            .registry
            .check_circuit(FEATURE)
            .expect_err("reopened circuit should reject");
        assert_eq!(rejection.retry_after, Duration::from_secs(60));
        assert_eq!(harness.registry.state(FEATURE), CircuitState::Open);
    }

    #[rstest]
    fn features_are_independent(harness: Harness) {
        harness.fail(3);

        assert!(harness.registry.check_circuit("other").is_ok());
        assert_eq!(harness.registry.state("other"), CircuitState::Closed);
    }

    #[rstest]
    fn success_resets_consecutive_failures(harness: Harness) {
        harness.fail(2);
        harness.registry.record_success(FEATURE);
        harness.fail(2);

        assert_eq!(harness.registry.state(FEATURE), CircuitState::Closed);
        assert_eq!(harness.registry.snapshot(FEATURE).consecutive_failures, 2);
    }

    #[rstest]
    fn transitions_are_reported_to_telemetry(harness: Harness) {
        harness.fail(3);
        harness.clock.advance(TimeDelta::seconds(60));
        harness.registry.check_circuit(FEATURE).expect("probe admitted");
        harness.registry.record_success(FEATURE);

        let transitions: Vec<(String, String)> = harness
            .telemetry
            .take()
            .into_iter()
            .filter_map(|event| match event {
                TelemetryEvent::CircuitStateChanged { from, to, .. } => Some((from, to)),
                _ => None,
            })
            .collect();

        assert_eq!(
            transitions,
            vec![
                ("CLOSED".to_owned(), "OPEN".to_owned()),
                ("OPEN".to_owned(), "HALF_OPEN".to_owned()),
                ("HALF_OPEN".to_owned(), "CLOSED".to_owned()),
            ]
        );
    }
}

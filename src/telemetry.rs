//! Application telemetry events and sinks.
//!
//! Telemetry is local-only: events capture operational signals such as the
//! active schema version, sync run outcomes and circuit breaker transitions
//! for debugging. Nothing is transmitted anywhere.

use std::io;

use serde::{Deserialize, Serialize};

/// A structured telemetry event emitted by Beacon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// Records the current database schema version after migrations apply.
    SchemaVersionRecorded {
        /// Diesel migration version string (e.g. `20261019000000`).
        schema_version: String,
    },
    /// A sync run reached a terminal status.
    SyncRunFinished {
        /// Sync run row identifier.
        run_id: i64,
        /// Terminal status.
        status: String,
        /// Pull requests listed.
        pulled: u64,
        /// Pull requests written.
        upserted: u64,
        /// Issues recorded.
        issues: u64,
    },
    /// A circuit breaker changed state.
    CircuitStateChanged {
        /// Feature key guarded by the breaker.
        feature: String,
        /// Previous state.
        from: String,
        /// New state.
        to: String,
    },
}

/// A sink that can record telemetry events.
pub trait TelemetrySink: Send + Sync {
    /// Records a telemetry event.
    fn record(&self, event: TelemetryEvent);
}

/// Telemetry sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record(&self, _event: TelemetryEvent) {}
}

/// Records telemetry events to stderr as JSON lines (JSONL).
#[derive(Debug, Default)]
pub struct StderrJsonlTelemetrySink;

impl TelemetrySink for StderrJsonlTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        let Ok(serialised) = serde_json::to_string(&event) else {
            return;
        };

        let _ignored = writeln_stderr(&serialised);
    }
}

fn writeln_stderr(message: &str) -> io::Result<()> {
    use io::Write;

    let mut stderr = io::stderr().lock();
    writeln!(stderr, "{message}")
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    //! In-memory sink for asserting on emitted events.

    use std::sync::{Mutex, PoisonError};

    use super::{TelemetryEvent, TelemetrySink};

    /// Sink that keeps every event in memory.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        events: Mutex<Vec<TelemetryEvent>>,
    }

    impl RecordingSink {
        /// Returns a copy of the recorded events.
        #[must_use]
        pub fn events(&self) -> Vec<TelemetryEvent> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Drains the recorded events.
        pub fn take(&self) -> Vec<TelemetryEvent> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .drain(..)
                .collect()
        }
    }

    impl TelemetrySink for RecordingSink {
        fn record(&self, event: TelemetryEvent) {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event);
        }
    }
}

//! Invoker calls gated by a per-feature circuit.

use std::sync::Arc;

use thiserror::Error;

use super::breaker::{CircuitBreakerRegistry, CircuitOpen};
use super::invoker::{InvocationOutput, InvocationRequest, Invoker, InvokerError};

/// Errors from a guarded invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardedInvokeError {
    /// The feature's circuit rejected the call without running it.
    #[error(transparent)]
    CircuitOpen(#[from] CircuitOpen),
    /// The call ran and failed.
    #[error(transparent)]
    Invoker(#[from] InvokerError),
}

/// Runs invocations through the breaker registered for a feature key.
///
/// Every completed invocation is reported back to the breaker, so a run of
/// exhausted retries eventually opens the circuit and later calls fail fast.
#[derive(Clone)]
pub struct GuardedInvoker {
    breakers: Arc<CircuitBreakerRegistry>,
    invoker: Arc<dyn Invoker>,
}

impl std::fmt::Debug for GuardedInvoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedInvoker")
            .field("breakers", &self.breakers)
            .finish_non_exhaustive()
    }
}

impl GuardedInvoker {
    /// Combines a breaker registry with an invoker.
    #[must_use]
    pub fn new(breakers: Arc<CircuitBreakerRegistry>, invoker: Arc<dyn Invoker>) -> Self {
        Self { breakers, invoker }
    }

    /// Invokes `request` on behalf of `feature`.
    ///
    /// # Errors
    ///
    /// Returns [`GuardedInvokeError::CircuitOpen`] when the circuit rejects
    /// the call, or [`GuardedInvokeError::Invoker`] when the invocation fails.
    pub async fn invoke(
        &self,
        feature: &str,
        request: &InvocationRequest,
    ) -> Result<InvocationOutput, GuardedInvokeError> {
        self.breakers.check_circuit(feature)?;

        match self.invoker.invoke(request).await {
            Ok(output) => {
                self.breakers.record_success(feature);
                Ok(output)
            }
            Err(error) => {
                self.breakers.record_failure(feature);
                Err(error.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{DateTime, TimeDelta, Utc};
    use rstest::rstest;

    use super::{GuardedInvokeError, GuardedInvoker};
    use crate::clock::ManualClock;
    use crate::resilience::breaker::{BreakerConfig, CircuitBreakerRegistry, CircuitState};
    use crate::resilience::invoker::{
        InvocationOutput, InvocationRequest, InvokerError, MockInvoker,
    };

    fn registry(clock: &Arc<ManualClock>) -> Arc<CircuitBreakerRegistry> {
        let config = BreakerConfig {
            failure_threshold: 2,
            cooldown: Duration::from_secs(30),
        };
        Arc::new(CircuitBreakerRegistry::new(config, Arc::clone(clock) as _))
    }

    fn clock() -> Arc<ManualClock> {
        let start = DateTime::parse_from_rfc3339("2026-10-19T12:00:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc);
        Arc::new(ManualClock::new(start))
    }

    fn exhausted() -> InvokerError {
        InvokerError::Exhausted {
            attempts: 3,
            exit_code: Some(1),
            stderr_excerpt: "model unavailable".to_owned(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn open_circuit_skips_the_invoker() {
        let clock = clock();
        let breakers = registry(&clock);
        let mut invoker = MockInvoker::new();
        invoker
            .expect_invoke()
            .times(2)
            .returning(|_| Err(exhausted()));
        let guarded = GuardedInvoker::new(Arc::clone(&breakers), Arc::new(invoker));
        let request = InvocationRequest::new("summarise");

        for _ in 0..2 {
            let result = guarded.invoke("summaries", &request).await;
            assert_eq!(result, Err(GuardedInvokeError::Invoker(exhausted())));
        }
        let rejected = guarded.invoke("summaries", &request).await;

        assert!(
            matches!(rejected, Err(GuardedInvokeError::CircuitOpen(ref open)) if open.feature == "summaries"),
            "unexpected result: {rejected:?}"
        );
        assert_eq!(breakers.state("summaries"), CircuitState::Open);
    }

    #[rstest]
    #[tokio::test]
    async fn successful_probe_closes_the_circuit() {
        let clock = clock();
        let breakers = registry(&clock);
        breakers.record_failure("labels");
        breakers.record_failure("labels");
        clock.advance(TimeDelta::seconds(30));

        let mut invoker = MockInvoker::new();
        invoker
            .expect_invoke()
            .withf(|request| request.prompt == "label it")
            .times(1)
            .returning(|_| Ok(InvocationOutput::Text("bug".to_owned())));
        let guarded = GuardedInvoker::new(Arc::clone(&breakers), Arc::new(invoker));

        let output = guarded
            .invoke("labels", &InvocationRequest::new("label it"))
            .await
            .expect("probe should run");

        assert_eq!(output, InvocationOutput::Text("bug".to_owned()));
        assert_eq!(breakers.state("labels"), CircuitState::Closed);
    }
}

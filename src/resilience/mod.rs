//! Failure isolation for calls to external AI tooling.
//!
//! [`CircuitBreakerRegistry`] tracks per-feature circuits, [`ProcessInvoker`]
//! runs one external process with timeouts, retries and bounded capture, and
//! [`GuardedInvoker`] composes the two.

pub mod breaker;
pub mod guarded;
pub mod invoker;

pub use breaker::{
    BreakerConfig, CircuitBreakerRegistry, CircuitOpen, CircuitSnapshot, CircuitState,
    DEFAULT_COOLDOWN, DEFAULT_FAILURE_THRESHOLD,
};
pub use guarded::{GuardedInvokeError, GuardedInvoker};
pub use invoker::{
    DEFAULT_OUTPUT_LIMIT, InvocationOutput, InvocationRequest, Invoker, InvokerConfig,
    InvokerError, OutputStream, ProcessInvoker, TIMEOUT_EXIT_CODE,
};

//! Resilient invocation of an external AI command-line process.
//!
//! One call runs `<command> -p <prompt> [--model <model>]
//! [--json-schema <file>] [--context-file <file>]` under a wall-clock
//! timeout with bounded output capture. Non-zero exits and timeouts are
//! retried with doubling backoff; spawn failures and oversized output are
//! not. Successful stdout is interpreted as JSON where possible.

mod capture;
mod output;
mod scratch;
mod termination;

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use capture::{CaptureFailure, capture_bounded};
pub use output::InvocationOutput;
use output::parse_output;
use scratch::ScratchFiles;
use termination::terminate_child;

/// Exit code reported for an attempt that hit the wall-clock timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Default cap on captured bytes per stream (10 MiB).
pub const DEFAULT_OUTPUT_LIMIT: usize = 10 * 1024 * 1024;

const STDERR_EXCERPT_CHARS: usize = 2_000;

/// Which output stream a capture refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

impl OutputStream {
    /// Returns the conventional stream name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// Errors returned by an invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokerError {
    /// The process could not be started.
    #[error("failed to spawn `{command}`: {message}")]
    Spawn {
        /// Command that failed to start.
        command: String,
        /// Underlying error description.
        message: String,
    },
    /// A stream exceeded the capture limit and the process was terminated.
    #[error("{} exceeded the {limit} byte capture limit", stream.as_str())]
    OutputTooLarge {
        /// Stream that overflowed.
        stream: OutputStream,
        /// Configured limit in bytes.
        limit: usize,
    },
    /// Every attempt exited unsuccessfully or timed out.
    #[error("invocation failed after {attempts} attempt(s) (exit code {}): {stderr_excerpt}",
        exit_code.map_or_else(|| "none".to_owned(), |code| code.to_string()))]
    Exhausted {
        /// Attempts made, including the first.
        attempts: u32,
        /// Exit code of the last attempt, if the process reported one.
        exit_code: Option<i32>,
        /// Tail of the last attempt's stderr.
        stderr_excerpt: String,
    },
    /// Local I/O around the invocation failed.
    #[error("invocation I/O failed: {message}")]
    Io {
        /// Error description.
        message: String,
    },
}

/// One invocation's inputs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InvocationRequest {
    /// Prompt passed via `-p`.
    pub prompt: String,
    /// Optional model passed via `--model`.
    pub model: Option<String>,
    /// Optional JSON schema written to a scratch file for `--json-schema`.
    pub schema: Option<serde_json::Value>,
    /// Optional context payload written to a scratch file for `--context-file`.
    pub context: Option<String>,
}

impl InvocationRequest {
    /// Creates a request carrying only a prompt.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the output schema.
    #[must_use]
    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Sets the context payload.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Tunables for [`ProcessInvoker`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokerConfig {
    /// Executable to run.
    pub command: String,
    /// Wall-clock limit for one attempt.
    pub timeout: Duration,
    /// Time between SIGTERM and SIGKILL.
    pub grace_period: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each later retry.
    pub base_delay: Duration,
    /// Byte cap applied to stdout and stderr separately.
    pub output_limit: usize,
}

impl InvokerConfig {
    /// Creates a configuration with default limits for `command`.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: Duration::from_secs(120),
            grace_period: Duration::from_secs(5),
            max_retries: 2,
            base_delay: Duration::from_secs(1),
            output_limit: DEFAULT_OUTPUT_LIMIT,
        }
    }
}

/// Something that can run one invocation to completion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Invoker: Send + Sync {
    /// Runs the request, retrying as configured.
    async fn invoke(&self, request: &InvocationRequest) -> Result<InvocationOutput, InvokerError>;
}

/// Runs the configured command as a child process.
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    config: InvokerConfig,
}

enum AttemptOutcome {
    Completed(String),
    Failed {
        exit_code: Option<i32>,
        stderr: String,
    },
}

impl ProcessInvoker {
    /// Creates an invoker.
    #[must_use]
    pub const fn new(config: InvokerConfig) -> Self {
        Self { config }
    }

    fn build_command(&self, request: &InvocationRequest, scratch: &ScratchFiles) -> Command {
        let mut command = Command::new(&self.config.command);
        command.arg("-p").arg(&request.prompt);
        if let Some(model) = &request.model {
            command.arg("--model").arg(model);
        }
        if let Some(schema) = &scratch.schema {
            command.arg("--json-schema").arg(schema.as_str());
        }
        if let Some(context) = &scratch.context {
            command.arg("--context-file").arg(context.as_str());
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    async fn attempt(
        &self,
        request: &InvocationRequest,
        scratch: &ScratchFiles,
    ) -> Result<AttemptOutcome, InvokerError> {
        let mut child = self
            .build_command(request, scratch)
            .spawn()
            .map_err(|error| InvokerError::Spawn {
                command: self.config.command.clone(),
                message: error.to_string(),
            })?;

        let limit = self.config.output_limit;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let collected = tokio::time::timeout(self.config.timeout, async {
            let (out, err) = tokio::try_join!(
                capture_bounded(stdout, OutputStream::Stdout, limit),
                capture_bounded(stderr, OutputStream::Stderr, limit),
            )?;
            let status = child.wait().await.map_err(CaptureFailure::Io)?;
            Ok::<_, CaptureFailure>((status, out, err))
        })
        .await;

        match collected {
            Ok(Ok((status, out, err))) => {
                if status.success() {
                    Ok(AttemptOutcome::Completed(
                        String::from_utf8_lossy(&out).into_owned(),
                    ))
                } else {
                    Ok(AttemptOutcome::Failed {
                        exit_code: status.code(),
                        stderr: String::from_utf8_lossy(&err).into_owned(),
                    })
                }
            }
            Ok(Err(failure)) => {
                self.stop(&mut child).await;
                Err(match failure {
                    CaptureFailure::Overflow(stream) => {
                        InvokerError::OutputTooLarge { stream, limit }
                    }
                    CaptureFailure::Io(error) => InvokerError::Io {
                        message: error.to_string(),
                    },
                })
            }
            Err(_elapsed) => {
                self.stop(&mut child).await;
                Ok(AttemptOutcome::Failed {
                    exit_code: Some(TIMEOUT_EXIT_CODE),
                    stderr: format!("timed out after {}s", self.config.timeout.as_secs()),
                })
            }
        }
    }

    async fn stop(&self, child: &mut Child) {
        terminate_child(child, self.config.grace_period).await;
    }
}

#[async_trait]
impl Invoker for ProcessInvoker {
    async fn invoke(&self, request: &InvocationRequest) -> Result<InvocationOutput, InvokerError> {
        let scratch = ScratchFiles::prepare(request)?;
        let mut delay = self.config.base_delay;
        let mut attempts: u32 = 0;

        loop {
            attempts = attempts.saturating_add(1);
            match self.attempt(request, &scratch).await? {
                AttemptOutcome::Completed(stdout) => {
                    debug!(command = %self.config.command, attempts, "invocation succeeded");
                    return Ok(parse_output(&stdout));
                }
                AttemptOutcome::Failed { exit_code, stderr } => {
                    if attempts > self.config.max_retries {
                        return Err(InvokerError::Exhausted {
                            attempts,
                            exit_code,
                            stderr_excerpt: tail(&stderr, STDERR_EXCERPT_CHARS),
                        });
                    }
                    warn!(
                        command = %self.config.command,
                        attempt = attempts,
                        exit_code = ?exit_code,
                        retry_in_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "invocation failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
            }
        }
    }
}

/// Keeps the last `max_chars` characters of trimmed `text`.
fn tail(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    let total = trimmed.chars().count();
    trimmed
        .chars()
        .skip(total.saturating_sub(max_chars))
        .collect()
}

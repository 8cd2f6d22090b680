use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::warn;

use crate::config::RetryConfig;
use crate::error::PipelineError;

/// Guard around the two blocking external collaborators, the entity
/// extractor and the embedder. Each attempt runs under a deadline and an
/// overrun counts as a failed attempt like any transport error; once the
/// attempt budget is spent the failure surfaces as `ExternalUnavailable`,
/// which the pipeline treats as recoverable (zero entities, zero
/// semantic edges) rather than fatal.
pub struct CollaboratorBoundary {
    collaborator: &'static str,
    attempt_budget: usize,
    attempt_deadline: Duration,
    first_wait: Duration,
    wait_ceiling: Duration,
}

impl CollaboratorBoundary {
    pub fn new(
        collaborator: &'static str,
        attempt_budget: usize,
        attempt_deadline: Duration,
        first_wait: Duration,
        wait_ceiling: Duration,
    ) -> Self {
        Self {
            collaborator,
            attempt_budget: attempt_budget.max(1),
            attempt_deadline,
            first_wait,
            wait_ceiling,
        }
    }

    pub fn from_config(collaborator: &'static str, config: &RetryConfig) -> Self {
        Self::new(
            collaborator,
            config.max_retries + 1,
            Duration::from_secs(config.attempt_timeout_secs),
            Duration::from_millis(config.initial_backoff_ms),
            Duration::from_millis(config.max_backoff_ms),
        )
    }

    /// Drive one external call to completion within the attempt budget,
    /// doubling the wait between attempts up to the ceiling.
    pub async fn call<T, F, Fut>(&self, mut operation: F) -> Result<T, PipelineError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = anyhow::Result<T>>,
    {
        let mut wait = self.first_wait;
        let mut last_failure = String::new();

        for attempt in 1..=self.attempt_budget {
            let outcome = match timeout(self.attempt_deadline, operation()).await {
                Ok(result) => result,
                Err(_) => Err(anyhow::anyhow!(
                    "no reply within {}ms",
                    self.attempt_deadline.as_millis()
                )),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) => {
                    last_failure = format!("{e:#}");
                    if attempt < self.attempt_budget {
                        warn!(
                            collaborator = self.collaborator,
                            attempt,
                            budget = self.attempt_budget,
                            wait_ms = wait.as_millis() as u64,
                            failure = %last_failure,
                            "external call failed, trying again"
                        );
                        sleep(wait).await;
                        wait = std::cmp::min(wait.saturating_mul(2), self.wait_ceiling);
                    }
                }
            }
        }

        Err(PipelineError::ExternalUnavailable(format!(
            "{} gave up after {} attempts: {}",
            self.collaborator, self.attempt_budget, last_failure
        )))
    }
}

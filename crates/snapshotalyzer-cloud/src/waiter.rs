//! Bounded polling until an instance reaches a lifecycle state
//!
//! Stop and start requests return as soon as the provider accepts them; the
//! orchestrator needs to block until the instance is actually `stopped` or
//! `running`. This module is the one place that loop lives.

use crate::error::{CloudError, Result};
use crate::model::InstanceState;
use crate::provider::ResourceClient;
use std::time::Duration;
use tokio::time::sleep;

/// Polling schedule (capped exponential backoff)
#[derive(Debug, Clone, PartialEq)]
pub struct WaitConfig {
    /// Number of state checks before giving up
    pub max_attempts: u32,
    /// Delay after the first unsuccessful check (milliseconds)
    pub initial_delay_ms: u64,
    /// Upper bound for a single delay (milliseconds)
    pub max_delay_ms: u64,
    /// Backoff multiplier; 1.0 gives a fixed interval
    pub multiplier: f64,
}

impl Default for WaitConfig {
    /// 40 checks every 15 seconds, the same budget as the EC2 instance waiters
    fn default() -> Self {
        Self::fixed(Duration::from_secs(15), 40)
    }
}

impl WaitConfig {
    /// Poll at a fixed interval
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        let ms = interval.as_millis() as u64;
        Self {
            max_attempts,
            initial_delay_ms: ms,
            max_delay_ms: ms,
            multiplier: 1.0,
        }
    }

    /// Delay to sleep after attempt `attempt` (0-based) failed
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let delay = self.initial_delay_ms as f64 * self.multiplier.powi(attempt as i32);
        (delay as u64).min(self.max_delay_ms)
    }

    /// Worst-case time spent sleeping before a timeout is reported
    pub fn timeout(&self) -> Duration {
        let total: u64 = (0..self.max_attempts.saturating_sub(1))
            .map(|attempt| self.delay_for_attempt(attempt))
            .sum();
        Duration::from_millis(total)
    }
}

/// Block until `instance_id` reports `target`.
///
/// # Returns
/// * `Ok(())` - the target state was observed
/// * `Err(CloudError::InstanceNotFound)` - the instance disappeared
/// * `Err(CloudError::UnexpectedState)` - the instance is shutting down or terminated
/// * `Err(CloudError::Timeout)` - `max_attempts` checks without reaching `target`
pub async fn wait_for_instance_state<C>(
    client: &C,
    instance_id: &str,
    target: InstanceState,
    config: &WaitConfig,
) -> Result<()>
where
    C: ResourceClient + ?Sized,
{
    tracing::debug!(
        instance = instance_id,
        target = %target,
        max_wait_secs = config.timeout().as_secs(),
        "waiting for instance state"
    );
    let mut waited_ms = 0u64;

    for attempt in 0..config.max_attempts {
        let instance = client
            .describe_instance(instance_id)
            .await?
            .ok_or_else(|| CloudError::InstanceNotFound(instance_id.to_string()))?;

        if instance.state == target {
            tracing::debug!(
                instance = instance_id,
                state = %target,
                attempts = attempt + 1,
                "instance reached state"
            );
            return Ok(());
        }

        if instance.state.is_terminal() && !target.is_terminal() {
            return Err(CloudError::UnexpectedState {
                instance_id: instance_id.to_string(),
                expected: target.to_string(),
                actual: instance.state.to_string(),
            });
        }

        // no sleep after the last check
        if attempt + 1 < config.max_attempts {
            let delay_ms = config.delay_for_attempt(attempt);
            tracing::trace!(
                instance = instance_id,
                current = %instance.state,
                delay_ms,
                "waiting for {}",
                target
            );
            sleep(Duration::from_millis(delay_ms)).await;
            waited_ms += delay_ms;
        }
    }

    Err(CloudError::Timeout {
        instance_id: instance_id.to_string(),
        expected: target.to_string(),
        waited_secs: waited_ms / 1000,
    })
}

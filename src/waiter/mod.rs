//! Bounded polling for discrete resource states.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{CaselockError, Result};

/// Polls a state probe until it observes a target state.
///
/// The wait is bounded: `max_attempts × poll_interval` is the absolute
/// ceiling. Success requires the target state to be observed at the moment of
/// a poll; otherwise the wait fails after exactly `max_attempts` polls, or
/// earlier if a poll observes a state from which the target is unreachable.
/// A state-change request already issued by the caller is never rolled back.
pub struct StateWaiter {
    poll_interval: Duration,
    max_attempts: u32,
}

impl StateWaiter {
    pub fn new(poll_interval: Duration, max_attempts: u32) -> Self {
        Self {
            poll_interval,
            max_attempts,
        }
    }

    /// Waits for `target`, treating no state as a dead end.
    pub async fn wait_for<S, F, Fut>(&self, resource_id: &str, target: S, probe: F) -> Result<u32>
    where
        S: PartialEq + Copy + fmt::Display,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<S>>,
    {
        self.wait_until(resource_id, target, probe, |_| false).await
    }

    /// Waits for `target`; `dead_end` marks observed states from which the
    /// target is unreachable and ends the wait immediately.
    pub async fn wait_until<S, F, Fut, D>(
        &self,
        resource_id: &str,
        target: S,
        probe: F,
        dead_end: D,
    ) -> Result<u32>
    where
        S: PartialEq + Copy + fmt::Display,
        F: Fn() -> Fut,
        Fut: Future<Output = Result<S>>,
        D: Fn(&S) -> bool,
    {
        let mut last_observed: Option<S> = None;

        for attempt in 1..=self.max_attempts {
            let observed = probe().await?;
            debug!(resource_id, state = %observed, attempt, "state polled");

            if observed == target {
                return Ok(attempt);
            }
            if dead_end(&observed) {
                warn!(resource_id, state = %observed, "target state unreachable, abandoning wait");
                return Err(self.timeout(resource_id, target, attempt, Some(observed)));
            }

            last_observed = Some(observed);
            if attempt < self.max_attempts {
                sleep(self.poll_interval).await;
            }
        }

        Err(self.timeout(resource_id, target, self.max_attempts, last_observed))
    }

    fn timeout<S: fmt::Display>(
        &self,
        resource_id: &str,
        target: S,
        attempts: u32,
        last_observed: Option<S>,
    ) -> CaselockError {
        CaselockError::WaitTimeout {
            resource_id: resource_id.to_string(),
            target: target.to_string(),
            attempts,
            last_observed: last_observed
                .map(|state| state.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        }
    }
}

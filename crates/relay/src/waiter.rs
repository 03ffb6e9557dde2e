//! Bounded polling for relay task completion

use crate::relayer::Relayer;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use types::{utils, RelayStatus, Result};

/// Polling parameters for [`wait_for_relay`]
#[derive(Debug, Clone, Copy)]
pub struct PollOptions {
    /// Interval between status lookups
    pub poll_period: Duration,
    /// Give up once this much time has passed since entry
    pub stop_after: Duration,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            poll_period: Duration::from_millis(5000),
            stop_after: Duration::from_millis(60_000),
        }
    }
}

/// Poll an adapter until the task reaches a terminal status or the
/// deadline passes.
///
/// The deadline is computed once at entry. At least one lookup happens
/// even for a zero deadline. When the deadline passes without a terminal
/// state the last observed status is returned as-is; timeout is not an
/// error kind, so callers must check `is_complete`/`is_error` on the
/// returned value themselves. Lookup failures propagate unchanged.
pub async fn wait_for_relay(
    relayer: &dyn Relayer,
    task_id: &str,
    options: PollOptions,
) -> Result<RelayStatus> {
    let deadline = Instant::now() + options.stop_after;

    loop {
        let status = relayer.lookup(task_id).await?;
        tracing::debug!(
            relayer = relayer.name(),
            task_id = %utils::sanitize_for_logging(task_id),
            is_complete = status.is_complete,
            is_error = status.is_error,
            "relay status"
        );

        if status.is_terminal() {
            return Ok(status);
        }

        if Instant::now() >= deadline {
            tracing::warn!(
                relayer = relayer.name(),
                task_id = %utils::sanitize_for_logging(task_id),
                "gave up waiting for relay task"
            );
            return Ok(status);
        }

        sleep(options.poll_period).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::{primitives::U256, rpc::types::TransactionRequest};
    use async_trait::async_trait;
    use std::{
        collections::VecDeque,
        sync::atomic::{AtomicUsize, Ordering},
        sync::Mutex,
    };
    use tokio_test::assert_ok;
    use types::{RelayError, RelayResponse};

    /// Replays a scripted sequence of statuses, repeating the last one
    struct ScriptedRelayer {
        script: Mutex<VecDeque<RelayStatus>>,
        last: Mutex<Option<RelayStatus>>,
        lookups: AtomicUsize,
    }

    impl ScriptedRelayer {
        fn new(script: Vec<RelayStatus>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(None),
                lookups: AtomicUsize::new(0),
            }
        }

        fn lookups(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Relayer for ScriptedRelayer {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn send(&self, _tx: &TransactionRequest) -> Result<RelayResponse> {
            Ok(RelayResponse::new("scripted-task"))
        }

        async fn lookup(&self, _task_id: &str) -> Result<RelayStatus> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            let mut last = self.last.lock().unwrap();
            if let Some(status) = script.pop_front() {
                *last = Some(status.clone());
            }
            last.clone().ok_or_else(|| RelayError::UnexpectedResponse {
                relayer: "scripted".to_string(),
                message: "no scripted status".to_string(),
            })
        }

        async fn supports_chain(&self, _chain_id: u64) -> Result<bool> {
            Ok(true)
        }

        async fn get_balance(&self) -> Result<U256> {
            Ok(U256::ZERO)
        }

        async fn fund(&self, _amount: U256) -> Result<()> {
            Ok(())
        }
    }

    fn options(period_ms: u64, stop_after_ms: u64) -> PollOptions {
        PollOptions {
            poll_period: Duration::from_millis(period_ms),
            stop_after: Duration::from_millis(stop_after_ms),
        }
    }

    #[tokio::test]
    async fn returns_on_the_first_terminal_poll_without_sleeping() {
        let relayer = ScriptedRelayer::new(vec![RelayStatus::complete(None)]);

        let started = Instant::now();
        let status = assert_ok!(wait_for_relay(&relayer, "task", options(1000, 5000)).await);

        assert!(status.is_complete);
        assert_eq!(relayer.lookups(), 1);
        // No poll interval elapsed for an immediately terminal task
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn pending_task_returns_after_the_deadline_with_the_last_status() {
        let relayer = ScriptedRelayer::new(vec![RelayStatus::pending()]);

        let started = Instant::now();
        let status = assert_ok!(wait_for_relay(&relayer, "task", options(50, 100)).await);
        let elapsed = started.elapsed();

        assert!(!status.is_terminal());
        assert!(relayer.lookups() >= 2);
        assert!(elapsed >= Duration::from_millis(100));
        // ~stop_after plus at most one extra poll period
        assert!(elapsed < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn at_least_one_lookup_happens_for_a_zero_deadline() {
        let relayer = ScriptedRelayer::new(vec![RelayStatus::pending()]);

        let status = assert_ok!(wait_for_relay(&relayer, "task", options(50, 0)).await);

        assert!(!status.is_terminal());
        assert_eq!(relayer.lookups(), 1);
    }

    #[tokio::test]
    async fn polling_stops_on_an_error_status() {
        let relayer = ScriptedRelayer::new(vec![
            RelayStatus::pending(),
            RelayStatus::errored(None),
        ]);

        let status = assert_ok!(wait_for_relay(&relayer, "task", options(10, 5000)).await);

        assert!(status.is_error);
        assert_eq!(relayer.lookups(), 2);
    }

    #[tokio::test]
    async fn lookup_failures_propagate() {
        let relayer = ScriptedRelayer::new(vec![]);

        let result = wait_for_relay(&relayer, "task", options(10, 5000)).await;
        assert!(matches!(
            result,
            Err(RelayError::UnexpectedResponse { .. })
        ));
    }
}

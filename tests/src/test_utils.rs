//! Helpers shared by the scenario tests: logging, waiting and ticking.

use std::future::Future;
use std::time::Duration;

use nextgsim_e2agent::{AgentEvent, TickHandle};
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tracing_subscriber::{fmt, EnvFilter};

/// Result type for integration tests
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Routes `tracing` output through the test harness. `RUST_LOG` overrides
/// the default `info` filter; repeated calls are no-ops.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
}

/// Polls `condition` every `poll_interval` until it holds or `limit` elapses.
pub async fn wait_for_condition<F, Fut>(
    mut condition: F,
    limit: Duration,
    poll_interval: Duration,
) -> TestResult
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let polled = timeout(limit, async {
        while !condition().await {
            sleep(poll_interval).await;
        }
    })
    .await;

    polled.map_err(|_| format!("Condition not met within {limit:?}").into())
}

/// Waits for the first agent event matching `predicate`, skipping others.
pub async fn wait_for_event<F>(
    events: &mut mpsc::UnboundedReceiver<AgentEvent>,
    mut predicate: F,
) -> TestResult<AgentEvent>
where
    F: FnMut(&AgentEvent) -> bool,
{
    let result = timeout(DEFAULT_TEST_TIMEOUT, async {
        while let Some(event) = events.recv().await {
            if predicate(&event) {
                return Some(event);
            }
        }
        None
    })
    .await;

    match result {
        Ok(Some(event)) => Ok(event),
        Ok(None) => Err("Agent event channel closed".into()),
        Err(_) => Err("Event not received within timeout".into()),
    }
}

/// Advances the agent clock by `count` ticks.
pub fn tick_n(ticks: &TickHandle, count: u64) {
    for _ in 0..count {
        ticks.tick();
    }
}

/// Default timeout for test operations
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Default poll interval for condition checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Short wait used to assert that nothing was sent
pub const QUIET_PERIOD: Duration = Duration::from_millis(50);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_wait_for_condition_success() {
        let flag = Arc::new(AtomicBool::new(false));
        let flag_clone = flag.clone();

        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            flag_clone.store(true, Ordering::SeqCst);
        });

        let result = wait_for_condition(
            || async { flag.load(Ordering::SeqCst) },
            Duration::from_secs(1),
            Duration::from_millis(10),
        )
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_wait_for_condition_timeout() {
        let result = wait_for_condition(
            || async { false },
            Duration::from_millis(100),
            Duration::from_millis(10),
        )
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_wait_for_event_skips_others() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.send(AgentEvent::SetupFailed { attempts: 1 }).unwrap();
        tx.send(AgentEvent::Stopped).unwrap();

        let event = wait_for_event(&mut rx, |e| *e == AgentEvent::Stopped)
            .await
            .unwrap();
        assert_eq!(event, AgentEvent::Stopped);

        drop(tx);
        assert!(wait_for_event(&mut rx, |_| true).await.is_err());
    }
}

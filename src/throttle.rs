use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Process-wide spacing gate shared by every upstream adapter.
///
/// One clock for all upstreams: a geocode followed by a route still waits
/// the full interval. The lock is held across the sleep, so concurrent
/// callers queue up (FIFO, tokio's mutex is fair) and leave one at a time.
#[derive(Debug)]
pub struct ThrottleGate {
    interval: Duration,
    last_acquired: Mutex<Option<Instant>>,
}

impl ThrottleGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_acquired: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until at least `interval` has passed since the previous
    /// acquisition started, then record now as the new start.
    pub async fn acquire(&self) {
        let mut last = self.last_acquired.lock().await;

        if let Some(previous) = *last {
            let ready_at = previous + self.interval;
            if ready_at > Instant::now() {
                tracing::debug!(
                    wait_ms = (ready_at - Instant::now()).as_millis() as u64,
                    "throttling upstream request"
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_acquire_does_not_wait() {
        let gate = ThrottleGate::new(Duration::from_millis(1000));
        let start = Instant::now();
        gate.acquire().await;
        assert_eq!(Instant::now() - start, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn second_acquire_waits_for_interval() {
        let gate = ThrottleGate::new(Duration::from_millis(1000));
        let start = Instant::now();
        gate.acquire().await;
        gate.acquire().await;
        assert!(Instant::now() - start >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_time_counts_toward_interval() {
        let gate = ThrottleGate::new(Duration::from_millis(1000));
        gate.acquire().await;
        tokio::time::sleep(Duration::from_millis(600)).await;

        let before = Instant::now();
        gate.acquire().await;
        let waited = Instant::now() - before;
        assert!(waited >= Duration::from_millis(400));
        assert!(waited < Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_are_serialized() {
        let gate = Arc::new(ThrottleGate::new(Duration::from_millis(500)));
        let start = Instant::now();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move {
                    gate.acquire().await;
                    Instant::now()
                })
            })
            .collect();

        let mut stamps = Vec::new();
        for handle in handles {
            stamps.push(handle.await.unwrap());
        }
        stamps.sort();

        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(500));
        }
        assert!(*stamps.last().unwrap() - start >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_never_waits() {
        let gate = ThrottleGate::new(Duration::ZERO);
        let start = Instant::now();
        for _ in 0..5 {
            gate.acquire().await;
        }
        assert_eq!(Instant::now() - start, Duration::ZERO);
    }
}

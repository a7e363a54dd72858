//! Step pacing for rollouts.
//!
//! A rollout waits on its [`Pacer`] before every step. Production uses
//! [`IntervalPacer`] (a tokio timer, which also runs on tokio's paused test
//! clock); tests that need to release steps one at a time use
//! [`ManualPacer`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

/// Boxed step future returned by [`Pacer::wait_step`].
pub type BoxFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Decides when the next rollout step may run.
pub trait Pacer: Send + Sync {
    /// Resolves when the caller may take its next step.
    fn wait_step(&self) -> BoxFuture<'_>;
}

/// Fixed delay before every step.
#[derive(Debug, Clone, Copy)]
pub struct IntervalPacer {
    interval: Duration,
}

impl IntervalPacer {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for IntervalPacer {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl Pacer for IntervalPacer {
    fn wait_step(&self) -> BoxFuture<'_> {
        Box::pin(tokio::time::sleep(self.interval))
    }
}

/// Steps wait until they are released with [`ManualPacer::release`].
///
/// Releases are counted, so a release issued before a rollout reaches its
/// next step is not lost. Clones share the same counter.
#[derive(Debug, Clone)]
pub struct ManualPacer {
    steps: Arc<Semaphore>,
}

impl ManualPacer {
    pub fn new() -> Self {
        Self {
            steps: Arc::new(Semaphore::new(0)),
        }
    }

    /// Allow `n` more steps to proceed.
    pub fn release(&self, n: usize) {
        self.steps.add_permits(n);
    }
}

impl Default for ManualPacer {
    fn default() -> Self {
        Self::new()
    }
}

impl Pacer for ManualPacer {
    fn wait_step(&self) -> BoxFuture<'_> {
        Box::pin(async move {
            // The semaphore is never closed.
            if let Ok(permit) = self.steps.acquire().await {
                permit.forget();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn interval_pacer_waits_for_interval() {
        let pacer = IntervalPacer::new(Duration::from_millis(500));
        let started = tokio::time::Instant::now();
        pacer.wait_step().await;
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn manual_pacer_counts_releases() {
        let pacer = ManualPacer::new();
        pacer.release(2);

        pacer.wait_step().await;
        pacer.wait_step().await;
        let third = tokio::time::timeout(Duration::from_millis(20), pacer.wait_step()).await;
        assert!(third.is_err());
    }

    #[tokio::test]
    async fn manual_pacer_blocks_without_release() {
        let pacer = ManualPacer::new();
        let waited = tokio::time::timeout(Duration::from_millis(20), pacer.wait_step()).await;
        assert!(waited.is_err());
    }
}

//! bounded admission control for concurrently-running simulations
//! at most `max_concurrent_simulations` run at once, queued
//! FIFO, the rest wait.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::cancellation::CancellationToken;
use crate::error::{CoreError, CoreResult};

#[derive(Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
}

impl ConcurrencyGate {
    pub fn new(max_concurrent_simulations: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent_simulations.max(1))),
        }
    }

    /// run `f` once a permit is available, holding it for the duration of
    /// the returned future. callers queue FIFO on `tokio::sync::Semaphore`'s
    /// own fairness guarantee. if `cancellation` fires while still queued,
    /// returns `Cancelled` without ever acquiring a permit; if it fires after
    /// a permit was already granted, the permit is released as soon as `f`
    /// (which is expected to watch the same token) unwinds.
    pub async fn with_permit<F, Fut, T>(
        &self,
        cancellation: Option<&CancellationToken>,
        f: F,
    ) -> CoreResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let permit = match cancellation {
            Some(token) => {
                tokio::select! {
                    permit = self.semaphore.acquire() => permit,
                    _ = token.cancelled() => return Err(CoreError::Cancelled),
                }
            }
            None => self.semaphore.acquire().await,
        };
        let _permit = permit.expect("semaphore is never closed");
        Ok(f().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn admits_up_to_the_configured_limit() {
        let gate = ConcurrencyGate::new(2);
        let concurrent = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let gate = gate.clone();
            let concurrent = concurrent.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                gate.with_permit(None, || async {
                    let now = concurrent.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                    concurrent.fetch_sub(1, Ordering::SeqCst);
                })
                .await
                .unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert!(max_seen.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn releases_the_permit_after_completion() {
        let gate = ConcurrencyGate::new(1);
        gate.with_permit(None, || async { 1 }).await.unwrap();
        let result = gate.with_permit(None, || async { 2 }).await.unwrap();
        assert_eq!(result, 2);
    }

    #[tokio::test]
    async fn cancelling_a_queued_waiter_returns_cancelled_without_a_permit() {
        let gate = ConcurrencyGate::new(1);
        let token = CancellationToken::new();

        // hold the only permit so the next request queues.
        let holder = gate.clone();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let held = tokio::spawn(async move {
            holder
                .with_permit(None, || async move {
                    let _ = release_rx.await;
                })
                .await
                .unwrap();
        });

        tokio::task::yield_now().await;
        token.cancel();
        let result = gate.with_permit(Some(&token), || async { 1 }).await;
        assert!(matches!(result, Err(CoreError::Cancelled)));

        let _ = release_tx.send(());
        held.await.unwrap();
    }
}

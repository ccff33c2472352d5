/*!
Concurrency utilities handed to consumers rather than used internally:
a counting permit for bounding how many callers enter a critical
section at once, and a parallel map that limits simultaneous in-flight
work while preserving input order.
*/

use std::sync::Arc;

use futures::{stream, StreamExt};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A counting permit bounding concurrent access to some resource.
/// Waiters are granted permits in the order they called `acquire`
/// (`tokio::sync::Semaphore`'s own FIFO wake order).
#[derive(Clone)]
pub struct CountingPermit {
    semaphore: Arc<Semaphore>,
}

impl CountingPermit {
    /// Build a permit allowing up to `capacity` concurrent holders.
    pub fn new(capacity: usize) -> Self {
        CountingPermit {
            semaphore: Arc::new(Semaphore::new(capacity)),
        }
    }

    /// Wait for a permit. The returned guard releases it on drop.
    pub async fn acquire(&self) -> PermitGuard {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("CountingPermit's semaphore is never closed");
        PermitGuard(permit)
    }
}

/// Holds one permit from a [CountingPermit]; releases it on drop.
pub struct PermitGuard(OwnedSemaphorePermit);

/// Apply `f` to every item in `items`, running at most `concurrency`
/// mappers at once, and returning results in the same order as the
/// input regardless of completion order.
pub async fn bounded_parallel_map<T, U, F, Fut>(items: Vec<T>, concurrency: usize, f: F) -> Vec<U>
where
    F: Fn(T) -> Fut,
    Fut: std::future::Future<Output = U>,
{
    stream::iter(items.into_iter().map(f))
        .buffered(concurrency.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_permit_bounds_concurrent_holders() {
        let permit = CountingPermit::new(2);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..6 {
            let permit = permit.clone();
            let in_flight = in_flight.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _guard = permit.acquire().await;
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert!(max_seen.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_bounded_parallel_map_preserves_input_order() {
        let items = vec![5, 4, 3, 2, 1];
        let results = bounded_parallel_map(items, 3, |x| async move {
            tokio::time::sleep(Duration::from_millis(x as u64)).await;
            x * 10
        })
        .await;
        assert_eq!(results, vec![50, 40, 30, 20, 10]);
    }

    #[tokio::test]
    async fn test_bounded_parallel_map_limits_concurrency() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let items: Vec<usize> = (0..8).collect();

        let in_flight_for_map = in_flight.clone();
        let max_seen_for_map = max_seen.clone();
        let _ = bounded_parallel_map(items, 3, move |_| {
            let in_flight = in_flight_for_map.clone();
            let max_seen = max_seen_for_map.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await;
        assert!(max_seen.load(Ordering::SeqCst) <= 3);
    }
}

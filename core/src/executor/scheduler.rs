use std::future::Future;
use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tokio::sync::Semaphore;

use crate::error::GeoError;

/// Runs `task_fn` over every item with at most `max_concurrency` in flight.
///
/// Each task returns its own value and the coordinator drains them as they
/// finish, so output order is completion order. All tasks are always driven
/// to completion; a task that wants to fail should return an `Err` inside `T`.
pub async fn run_bounded<I, F, Fut, T>(
    items: I,
    max_concurrency: usize,
    task_fn: F,
) -> Result<Vec<T>, GeoError>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = T>,
{
    let sem = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut futs = FuturesUnordered::new();

    for item in items {
        let sem = sem.clone();
        let fut = task_fn(item);
        futs.push(async move {
            let _permit = sem
                .acquire_owned()
                .await
                .map_err(|_| GeoError::pipeline("scheduler", "semaphore closed unexpectedly"))?;
            Ok::<T, GeoError>(fut.await)
        });
    }

    let mut results = Vec::with_capacity(futs.len());
    while let Some(res) = futs.next().await {
        results.push(res?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn never_exceeds_bound_and_returns_every_item() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let out = run_bounded(0..20usize, 3, |i| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                i
            }
        })
        .await
        .unwrap();

        let mut sorted = out.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..20).collect::<Vec<_>>());
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn zero_bound_is_treated_as_one() {
        let out = run_bounded(vec!["a", "b"], 0, |s| async move { s.len() })
            .await
            .unwrap();
        assert_eq!(out, vec![1, 1]);
    }
}

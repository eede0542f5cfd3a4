//! Bounded concurrent mapping over lazy streams
//!
//! Runs an async transform over each item of a source stream with at most
//! `concurrency` transforms in flight, flattening each transform's zero or
//! more results into a single output stream.
//!
//! The source is only polled while fewer than `concurrency` transforms are
//! pending, so a slow consumer suspends the source. Dropping the output
//! stream drops every in-flight transform and starts no new ones.

use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::future::Future;

/// Ordering of the mapped output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MapOrder {
    /// Results are yielded as soon as any transform completes
    #[default]
    Unordered,
    /// Results are yielded in source order
    Ordered,
}

/// Map `source` through `transform` with at most `concurrency` transforms in flight.
///
/// A `concurrency` of zero is treated as one.
pub fn bounded_map<S, F, Fut, I>(
    source: S,
    concurrency: usize,
    order: MapOrder,
    transform: F,
) -> BoxStream<'static, I::Item>
where
    S: Stream + Send + 'static,
    F: FnMut(S::Item) -> Fut + Send + 'static,
    Fut: Future<Output = I> + Send + 'static,
    I: IntoIterator + Send + 'static,
    I::IntoIter: Send + 'static,
    I::Item: Send + 'static,
{
    let limit = concurrency.max(1);
    let pending = source.map(transform);

    let completed: BoxStream<'static, I> = match order {
        MapOrder::Ordered => pending.buffered(limit).boxed(),
        MapOrder::Unordered => pending.buffer_unordered(limit).boxed(),
    };

    completed.flat_map(stream::iter).boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_ordered_preserves_source_order() {
        let source = stream::iter(vec![30u64, 10, 20, 0]);

        let out: Vec<u64> = bounded_map(source, 4, MapOrder::Ordered, |delay| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Some(delay)
        })
        .collect()
        .await;

        assert_eq!(out, vec![30, 10, 20, 0]);
    }

    #[tokio::test]
    async fn test_unordered_yields_every_result() {
        let source = stream::iter(vec![30u64, 10, 20, 0]);

        let mut out: Vec<u64> = bounded_map(source, 4, MapOrder::Unordered, |delay| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Some(delay)
        })
        .collect()
        .await;

        assert_eq!(out.first(), Some(&0));
        out.sort();
        assert_eq!(out, vec![0, 10, 20, 30]);
    }

    #[tokio::test]
    async fn test_flattens_zero_or_more_results() {
        let source = stream::iter(vec![0usize, 1, 2, 3]);

        let out: Vec<usize> = bounded_map(source, 2, MapOrder::Ordered, |n| async move {
            vec![n; n]
        })
        .collect()
        .await;

        assert_eq!(out, vec![1, 2, 2, 3, 3, 3]);
    }

    #[tokio::test]
    async fn test_never_exceeds_concurrency() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let out: Vec<usize> = {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            bounded_map(stream::iter(0..20usize), 3, MapOrder::Unordered, move |n| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Some(n)
                }
            })
            .collect()
            .await
        };

        assert_eq!(out.len(), 20);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_early_stop_does_not_start_more_work() {
        let started = Arc::new(AtomicUsize::new(0));

        let first: Vec<usize> = {
            let started = Arc::clone(&started);
            bounded_map(stream::iter(0..100usize), 2, MapOrder::Ordered, move |n| {
                let started = Arc::clone(&started);
                async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    Some(n)
                }
            })
            .take(3)
            .collect()
            .await
        };

        assert_eq!(first, vec![0, 1, 2]);
        assert!(started.load(Ordering::SeqCst) <= 5);
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_progresses() {
        let out: Vec<u8> =
            bounded_map(stream::iter(vec![1u8, 2]), 0, MapOrder::Ordered, |n| async move {
                Some(n)
            })
            .collect()
            .await;

        assert_eq!(out, vec![1, 2]);
    }
}

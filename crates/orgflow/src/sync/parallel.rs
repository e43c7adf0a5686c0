//! Bounded fan-out primitives.
//!
//! Both primitives spawn one task per item, gate actual work behind a
//! semaphore, and report fractional progress from a completion counter.
//! Completion order is whatever the scheduler produces; only the progress
//! sequence is ordered.

use std::collections::HashSet;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

/// Fractional progress callback, receiving percentages in `[0.0, 100.0]`.
pub type ProgressCallback = Box<dyn Fn(f64) + Send + Sync>;

/// Invoke a progress callback if one is present.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, percent: f64) {
    if let Some(cb) = on_progress {
        cb(percent);
    }
}

/// Runs one async unit of work per item, bounded by `concurrency`.
///
/// Progress: `0.0` is emitted before any item runs, then
/// `completed / total * 100` after each completion, ending at exactly
/// `100.0`. Zero items emit exactly one `0.0`. The sequence is strictly
/// increasing after the initial zero.
///
/// Errors: every item is attempted; the first per-item error (in completion
/// order) is returned after all items settle.
///
/// Cancellation is cooperative: once the token fires, queued items are
/// skipped and no further progress is emitted.
pub struct ParallelTask;

impl ParallelTask {
    pub async fn run<T, E, F, Fut>(
        items: Vec<T>,
        concurrency: usize,
        cancel: CancellationToken,
        on_progress: Option<&ProgressCallback>,
        per_item: F,
    ) -> Result<(), E>
    where
        T: Send + 'static,
        E: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        let mut first_error = None;
        drive(items, concurrency, cancel, on_progress, per_item, |result| {
            if let Err(e) = result {
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        })
        .await;

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Like [`ParallelTask`], but each item yields a set of results that are
/// unioned (deduplicating by item equality) into one aggregate set.
pub struct ParallelFetcher;

impl ParallelFetcher {
    pub async fn run<T, R, E, F, Fut>(
        items: Vec<T>,
        concurrency: usize,
        cancel: CancellationToken,
        on_progress: Option<&ProgressCallback>,
        per_item: F,
    ) -> Result<HashSet<R>, E>
    where
        T: Send + 'static,
        R: Eq + Hash + Send + 'static,
        E: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HashSet<R>, E>> + Send + 'static,
    {
        let mut aggregate = HashSet::new();
        let mut first_error = None;
        drive(items, concurrency, cancel, on_progress, per_item, |result| {
            match result {
                Ok(set) => aggregate.extend(set),
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        })
        .await;

        match first_error {
            Some(e) => Err(e),
            None => Ok(aggregate),
        }
    }
}

/// Common fan-out loop: spawn, gate on the semaphore, funnel completions
/// back over a channel, and account progress as they arrive.
async fn drive<T, O, F, Fut>(
    items: Vec<T>,
    concurrency: usize,
    cancel: CancellationToken,
    on_progress: Option<&ProgressCallback>,
    per_item: F,
    mut on_complete: impl FnMut(O),
) where
    T: Send + 'static,
    O: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
{
    let total = items.len();
    emit(on_progress, 0.0);
    if total == 0 {
        return;
    }

    let semaphore = Arc::new(Semaphore::new(concurrency.clamp(1, total)));
    let per_item = Arc::new(per_item);
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<O>();

    let mut handles = Vec::with_capacity(total);
    for item in items {
        let semaphore = Arc::clone(&semaphore);
        let per_item = Arc::clone(&per_item);
        let cancel = cancel.clone();
        let done_tx = done_tx.clone();
        handles.push(tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire().await else {
                return;
            };
            if cancel.is_cancelled() {
                return;
            }
            let output = per_item(item).await;
            // Receiver dropping means the driver gave up; nothing to do.
            let _ = done_tx.send(output);
        }));
    }
    drop(done_tx);

    let mut completed = 0usize;
    while let Some(output) = done_rx.recv().await {
        completed += 1;
        on_complete(output);
        if !cancel.is_cancelled() {
            emit(on_progress, completed as f64 * 100.0 / total as f64);
        }
    }

    for handle in handles {
        if let Err(join_err) = handle.await {
            tracing::warn!(error = %join_err, "fan-out task panicked or was aborted");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    fn recording_callback() -> (ProgressCallback, Arc<Mutex<Vec<f64>>>) {
        let seen: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
        let capture = Arc::clone(&seen);
        let callback: ProgressCallback = Box::new(move |percent| {
            capture
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(percent);
        });
        (callback, seen)
    }

    #[tokio::test]
    async fn test_progress_sequence_is_exactly_the_completion_fractions() {
        let (callback, seen) = recording_callback();

        ParallelTask::run(
            vec![1u32, 2, 3, 4, 5],
            4,
            CancellationToken::new(),
            Some(&callback),
            |_| async { Ok::<(), String>(()) },
        )
        .await
        .unwrap();

        // Percentages come from the completion counter, so the sequence is
        // the same no matter which order items finish in.
        let seen = seen.lock().unwrap_or_else(|e| e.into_inner());
        let expected: Vec<f64> = (0..=5).map(|i| f64::from(i) * 100.0 / 5.0).collect();
        assert_eq!(*seen, expected);
        assert_eq!(*seen, vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
    }

    #[tokio::test]
    async fn test_progress_ends_at_exactly_one_hundred() {
        let (callback, seen) = recording_callback();

        ParallelTask::run(
            vec![1u32, 2, 3],
            4,
            CancellationToken::new(),
            Some(&callback),
            |_| async { Ok::<(), String>(()) },
        )
        .await
        .unwrap();

        let seen = seen.lock().unwrap_or_else(|e| e.into_inner());
        let expected: Vec<f64> = (0..=3).map(|i| f64::from(i) * 100.0 / 3.0).collect();
        assert_eq!(*seen, expected);
        assert_eq!(*seen.last().unwrap(), 100.0, "final value is exact");
    }

    #[tokio::test]
    async fn test_zero_items_emit_single_zero() {
        let (callback, seen) = recording_callback();

        let result: Result<(), String> = ParallelTask::run(
            Vec::<u32>::new(),
            4,
            CancellationToken::new(),
            Some(&callback),
            |_| async { Ok(()) },
        )
        .await;

        result.unwrap();
        assert_eq!(*seen.lock().unwrap_or_else(|e| e.into_inner()), vec![0.0]);
    }

    #[tokio::test]
    async fn test_first_error_propagates_after_all_items_settle() {
        let attempted = Arc::new(AtomicUsize::new(0));
        let attempted_capture = Arc::clone(&attempted);

        let err = ParallelTask::run(
            vec![1u32, 2, 3, 4, 5],
            2,
            CancellationToken::new(),
            None,
            move |n| {
                let attempted = Arc::clone(&attempted_capture);
                async move {
                    attempted.fetch_add(1, Ordering::SeqCst);
                    if n == 3 { Err(format!("item {n} failed")) } else { Ok(()) }
                }
            },
        )
        .await
        .expect_err("item 3 fails");

        assert_eq!(err, "item 3 failed");
        assert_eq!(attempted.load(Ordering::SeqCst), 5, "every item is attempted");
    }

    #[tokio::test]
    async fn test_fetcher_unions_and_deduplicates() {
        let merged: HashSet<u32> = ParallelFetcher::run(
            vec![0u32, 10, 20],
            4,
            CancellationToken::new(),
            None,
            |base| async move {
                // Overlapping windows: each item also returns its neighbor's
                // first value.
                Ok::<_, String>(HashSet::from([base, base + 1, (base + 10) % 30]))
            },
        )
        .await
        .unwrap();

        assert_eq!(
            merged,
            HashSet::from([0, 1, 10, 11, 20, 21]),
            "overlap collapses by equality"
        );
    }

    #[tokio::test]
    async fn test_items_run_concurrently_within_the_bound() {
        // Four 50ms sleeps with concurrency 4 must finish well under the
        // 200ms a sequential run would take.
        let started = std::time::Instant::now();

        ParallelFetcher::run(
            vec![1u32, 2, 3, 4],
            4,
            CancellationToken::new(),
            None,
            |n| async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, String>(HashSet::from([n]))
            },
        )
        .await
        .unwrap();

        assert!(
            started.elapsed() < Duration::from_millis(150),
            "fan-out took {:?}, expected ~50ms",
            started.elapsed()
        );
    }

    #[tokio::test]
    async fn test_concurrency_bound_is_respected() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let running_capture = Arc::clone(&running);
        let peak_capture = Arc::clone(&peak);

        ParallelTask::run(
            (0u32..12).collect(),
            3,
            CancellationToken::new(),
            None,
            move |_| {
                let running = Arc::clone(&running_capture);
                let peak = Arc::clone(&peak_capture);
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                    Ok::<(), String>(())
                }
            },
        )
        .await
        .unwrap();

        assert!(
            peak.load(Ordering::SeqCst) <= 3,
            "no more than 3 items may run at once, saw {}",
            peak.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn test_cancellation_skips_queued_items() {
        let cancel = CancellationToken::new();
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_capture = Arc::clone(&ran);
        let cancel_inner = cancel.clone();

        let merged: HashSet<u32> = ParallelFetcher::run(
            (0u32..8).collect(),
            1,
            cancel.clone(),
            None,
            move |n| {
                let ran = Arc::clone(&ran_capture);
                let cancel = cancel_inner.clone();
                async move {
                    ran.fetch_add(1, Ordering::SeqCst);
                    if n == 1 {
                        cancel.cancel();
                    }
                    Ok::<_, String>(HashSet::from([n]))
                }
            },
        )
        .await
        .unwrap();

        // With concurrency 1, items queued behind the cancelling one are
        // skipped; partial results are still returned.
        assert!(ran.load(Ordering::SeqCst) < 8);
        assert!(!merged.is_empty());
    }
}

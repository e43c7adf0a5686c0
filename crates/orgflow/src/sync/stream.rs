//! Filtering decorator over an open interactions stream.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::backend::{BackendError, InteractionsStream};
use crate::model::Interaction;
use crate::sync::filter::InteractionsFilter;

/// Wraps a backend stream, filtering every batch before it goes on the wire.
///
/// `close` is idempotent: the inner stream sees exactly one close no matter
/// how many callers race to shut the stream down. This lets the orchestrator
/// close unconditionally in its cleanup path while fan-out tasks share the
/// same handle.
pub struct FilteredInteractionsStream {
    inner: Box<dyn InteractionsStream>,
    filter: InteractionsFilter,
    closed: AtomicBool,
}

impl FilteredInteractionsStream {
    pub fn new(inner: Box<dyn InteractionsStream>, filter: InteractionsFilter) -> Self {
        Self {
            inner,
            filter,
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl InteractionsStream for FilteredInteractionsStream {
    async fn send(&self, batch: HashSet<Interaction>) -> Result<usize, BackendError> {
        let kept = self.filter.filter(batch);
        if kept.is_empty() {
            // Fully filtered batches never reach the wire.
            return Ok(0);
        }
        self.inner.send(kept).await
    }

    async fn close(&self) -> Result<(), BackendError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.inner.close().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::model::{Employee, InteractionKind, TimeRange};

    #[derive(Default)]
    struct CountingStream {
        sent: AtomicUsize,
        batch_sizes: std::sync::Mutex<Vec<usize>>,
        closes: AtomicUsize,
    }

    #[async_trait]
    impl InteractionsStream for Arc<CountingStream> {
        async fn send(&self, batch: HashSet<Interaction>) -> Result<usize, BackendError> {
            self.sent.fetch_add(batch.len(), Ordering::SeqCst);
            self.batch_sizes
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(batch.len());
            Ok(batch.len())
        }

        async fn close(&self) -> Result<(), BackendError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).single().unwrap()
    }

    fn filtered(inner: Arc<CountingStream>) -> FilteredInteractionsStream {
        FilteredInteractionsStream::new(
            Box::new(inner),
            InteractionsFilter::new(TimeRange::bounded(at(8), at(16)).unwrap()),
        )
    }

    fn batch_of(total: usize, in_range: usize) -> HashSet<Interaction> {
        (0..total)
            .map(|i| {
                let hour = if i < in_range { 9 } else { 20 };
                Interaction::new(
                    InteractionKind::Chat,
                    at(hour),
                    Employee::internal("a@corp.example"),
                    Employee::internal("b@corp.example"),
                    format!("msg-{i}"),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_send_reports_post_filter_count() {
        let inner = Arc::new(CountingStream::default());
        let stream = filtered(Arc::clone(&inner));

        let accepted = stream.send(batch_of(10, 4)).await.unwrap();

        assert_eq!(accepted, 4);
        assert_eq!(inner.sent.load(Ordering::SeqCst), 4);
        assert_eq!(
            *inner.batch_sizes.lock().unwrap_or_else(|e| e.into_inner()),
            vec![4]
        );
    }

    #[tokio::test]
    async fn test_fully_filtered_batch_skips_the_wire() {
        let inner = Arc::new(CountingStream::default());
        let stream = filtered(Arc::clone(&inner));

        let accepted = stream.send(batch_of(3, 0)).await.unwrap();

        assert_eq!(accepted, 0);
        assert!(
            inner
                .batch_sizes
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_close_forwards_exactly_once() {
        let inner = Arc::new(CountingStream::default());
        let stream = filtered(Arc::clone(&inner));

        stream.close().await.unwrap();
        stream.close().await.unwrap();
        stream.close().await.unwrap();

        assert_eq!(inner.closes.load(Ordering::SeqCst), 1);
    }
}

use crate::recorder::{ClickEvent, ClickSink};
use std::sync::Arc;
use tracing::{error, trace, Instrument};

/// Runs click recordings as detached background tasks.
///
/// [`submit`](Self::submit) returns immediately and nothing ever joins the
/// spawned task: a failed recording is logged and dropped, never returned
/// to the request that caused it.
#[derive(Clone)]
pub struct ClickDispatcher {
    sink: Arc<dyn ClickSink>,
}

impl ClickDispatcher {
    pub fn new(sink: Arc<dyn ClickSink>) -> Self {
        Self { sink }
    }

    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, event: ClickEvent) {
        let sink = Arc::clone(&self.sink);
        let link_id = event.link_id;
        trace!(link_id = %link_id, "Submitting click for background recording");

        let span = tracing::debug_span!("record_click", link_id = %link_id);
        tokio::spawn(
            async move {
                if let Err(e) = sink.record(event).await {
                    error!(link_id = %link_id, error = %e, "Failed to record click");
                }
            }
            .instrument(span),
        );
    }
}

impl std::fmt::Debug for ClickDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickDispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordingError;
    use crate::recorder::ClickRecorder;
    use crate::testing::{link, CountingStore};
    use affilink_cache::MokaKvCache;
    use affilink_core::{Click, ClickRepository, LinkId, LinkRepository, NewClick, StorageError};
    use async_trait::async_trait;
    use jiff::Timestamp;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn event(link_id: LinkId) -> ClickEvent {
        ClickEvent {
            link_id,
            referrer: None,
            user_agent: Some("curl/8.5".to_string()),
            client_address: Some("198.51.100.4".to_string()),
        }
    }

    fn store_down() -> RecordingError {
        RecordingError::Storage(StorageError::Unavailable("store is down".to_string()))
    }

    /// Blocks every recording until released.
    struct GatedSink {
        gate: Notify,
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl ClickSink for GatedSink {
        async fn record(&self, _event: ClickEvent) -> Result<Click, RecordingError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Err(store_down())
        }
    }

    /// Fails the first `failures` recordings, then accepts every later one.
    struct FlakySink {
        failures: usize,
        attempts: AtomicUsize,
        recorded: Mutex<Vec<LinkId>>,
    }

    impl FlakySink {
        fn failing_first(failures: usize) -> Self {
            Self {
                failures,
                attempts: AtomicUsize::new(0),
                recorded: Mutex::new(Vec::new()),
            }
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }

        fn recorded(&self) -> Vec<LinkId> {
            self.recorded.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ClickSink for FlakySink {
        async fn record(&self, event: ClickEvent) -> Result<Click, RecordingError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if attempt < self.failures {
                return Err(store_down());
            }
            self.recorded.lock().unwrap().push(event.link_id);
            Ok(Click::from_new(
                attempt as u64 + 1,
                NewClick {
                    link_id: event.link_id,
                    timestamp: Timestamp::now(),
                    referrer: event.referrer,
                    user_agent: event.user_agent,
                    client_hash: None,
                },
            ))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn submitted_click_is_recorded_in_background() {
        let store = Arc::new(CountingStore::default());
        let stored = link("matcha-lz", "https://www.lazada.co.th/products/matcha-powder-123");
        store.inner.insert_link(&stored).await.unwrap();
        let recorder = ClickRecorder::new(Arc::clone(&store), Arc::new(MokaKvCache::new()));
        let dispatcher = ClickDispatcher::new(Arc::new(recorder));

        dispatcher.submit(event(stored.id));

        awaitility::at_most(Duration::from_secs(5))
            .poll_interval(Duration::from_millis(10))
            .until_async(|| async { store.inner.count_clicks(stored.id).await.unwrap() == 1 })
            .await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn submit_does_not_wait_for_recording() {
        let sink = Arc::new(GatedSink {
            gate: Notify::new(),
            attempts: AtomicUsize::new(0),
        });
        let dispatcher = ClickDispatcher::new(Arc::clone(&sink) as Arc<dyn ClickSink>);

        dispatcher.submit(event(LinkId::new()));

        awaitility::at_most(Duration::from_secs(5))
            .poll_interval(Duration::from_millis(10))
            .until_async(|| async { sink.attempts.load(Ordering::SeqCst) == 1 })
            .await;

        // The failing recording is released only after submit has returned.
        sink.gate.notify_one();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failed_recordings_do_not_stop_later_ones() {
        let sink = Arc::new(FlakySink::failing_first(2));
        let dispatcher = ClickDispatcher::new(Arc::clone(&sink) as Arc<dyn ClickSink>);

        dispatcher.submit(event(LinkId::new()));
        dispatcher.submit(event(LinkId::new()));
        awaitility::at_most(Duration::from_secs(5))
            .poll_interval(Duration::from_millis(10))
            .until(|| sink.attempts() == 2);
        assert!(sink.recorded().is_empty());

        let later = LinkId::new();
        dispatcher.submit(event(later));
        awaitility::at_most(Duration::from_secs(5))
            .poll_interval(Duration::from_millis(10))
            .until(|| sink.recorded() == vec![later]);
        assert_eq!(sink.attempts(), 3);
    }
}

//! Source poller behaviour

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chain_reader::testing::MockReader;
use chain_reader::{
    PollerConfig, ReaderError, ReaderResult, SlotSource, Source, SourcePoller,
};
use tokio::time::{sleep, timeout};

/// Source that replays scripted results, then keeps counting upwards
struct ScriptedSource {
    script: Mutex<VecDeque<ReaderResult<u64>>>,
    fetches: Arc<AtomicUsize>,
    delay: Duration,
}

impl ScriptedSource {
    fn new(script: Vec<ReaderResult<u64>>) -> (Self, Arc<AtomicUsize>) {
        let fetches = Arc::new(AtomicUsize::new(0));
        let source = Self {
            script: Mutex::new(script.into()),
            fetches: fetches.clone(),
            delay: Duration::ZERO,
        };
        (source, fetches)
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl Source for ScriptedSource {
    type Output = u64;

    async fn fetch(&self) -> ReaderResult<u64> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) as u64 + 1;
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        let scripted = self.script.lock().unwrap().pop_front();
        scripted.unwrap_or(Ok(n))
    }
}

fn config(poll_interval_ms: u64, fetch_timeout_ms: u64, buffer_capacity: usize) -> PollerConfig {
    PollerConfig {
        poll_interval_ms,
        fetch_timeout_ms,
        buffer_capacity,
    }
}

#[tokio::test]
async fn test_initial_fetch_happens_immediately() {
    let (source, fetches) = ScriptedSource::new(vec![Ok(7)]);
    // A long interval means only the initial fetch can deliver in time
    let (handle, mut updates) = SourcePoller::new(source, config(60_000, 1_000, 4))
        .start()
        .unwrap();

    let first = timeout(Duration::from_secs(1), updates.recv())
        .await
        .expect("initial fetch should not wait for the interval");
    assert_eq!(first, Some(7));
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert!(!handle.is_finished());

    handle.stop().await;
}

#[tokio::test]
async fn test_no_update_sends_nothing() {
    let (source, _fetches) = ScriptedSource::new(vec![
        Err(ReaderError::NoUpdate),
        Err(ReaderError::NoUpdate),
        Ok(100),
    ]);
    let (handle, mut updates) = SourcePoller::new(source, config(10, 5, 4)).start().unwrap();

    let first = timeout(Duration::from_secs(1), updates.recv()).await.unwrap();
    assert_eq!(first, Some(100));

    handle.stop().await;
}

#[tokio::test]
async fn test_errors_do_not_stop_polling() {
    let (source, fetches) = ScriptedSource::new(vec![
        Err(ReaderError::Rpc("connection refused".to_string())),
        Err(ReaderError::Rpc("connection refused".to_string())),
        Ok(3),
    ]);
    let (handle, mut updates) = SourcePoller::new(source, config(10, 5, 4)).start().unwrap();

    let first = timeout(Duration::from_secs(1), updates.recv()).await.unwrap();
    assert_eq!(first, Some(3));
    assert!(fetches.load(Ordering::SeqCst) >= 3);

    handle.stop().await;
}

#[tokio::test]
async fn test_slow_fetch_times_out_and_polling_continues() {
    let (source, fetches) = ScriptedSource::new(vec![]);
    let source = source.with_delay(Duration::from_millis(50));
    let (handle, mut updates) = SourcePoller::new(source, config(20, 10, 4)).start().unwrap();

    sleep(Duration::from_millis(200)).await;
    assert!(fetches.load(Ordering::SeqCst) >= 2);
    assert!(updates.try_recv().is_err());

    handle.stop().await;
}

#[tokio::test]
async fn test_stop_closes_channel() {
    let (source, fetches) = ScriptedSource::new(vec![]);
    let (handle, mut updates) = SourcePoller::new(source, config(10, 5, 64)).start().unwrap();

    assert!(timeout(Duration::from_secs(1), updates.recv()).await.unwrap().is_some());
    handle.stop().await;

    // Drain what was buffered before the stop, then the channel reports closed
    let drained = timeout(Duration::from_secs(1), async {
        while updates.recv().await.is_some() {}
    })
    .await;
    assert!(drained.is_ok());

    // Ticks that came due while stopping must not trigger another fetch
    let after_stop = fetches.load(Ordering::SeqCst);
    sleep(Duration::from_millis(50)).await;
    assert_eq!(fetches.load(Ordering::SeqCst), after_stop);
}

#[tokio::test]
async fn test_dropping_handle_stops_poller() {
    let (source, fetches) = ScriptedSource::new(vec![]);
    let (handle, mut updates) = SourcePoller::new(source, config(10, 5, 64)).start().unwrap();

    assert!(timeout(Duration::from_secs(1), updates.recv()).await.unwrap().is_some());
    drop(handle);

    let drained = timeout(Duration::from_secs(1), async {
        while updates.recv().await.is_some() {}
    })
    .await;
    assert!(drained.is_ok());

    let after_stop = fetches.load(Ordering::SeqCst);
    sleep(Duration::from_millis(50)).await;
    assert_eq!(fetches.load(Ordering::SeqCst), after_stop);
}

#[tokio::test]
async fn test_dropping_receiver_stops_quiet_poller() {
    // Never produces a value, so the loop never gets to send
    let script = (0..1_000).map(|_| Err(ReaderError::NoUpdate)).collect();
    let (source, fetches) = ScriptedSource::new(script);
    let (handle, updates) = SourcePoller::new(source, config(10, 5, 4)).start().unwrap();

    assert!(timeout(Duration::from_secs(1), async {
        while fetches.load(Ordering::SeqCst) == 0 {
            sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .is_ok());
    drop(updates);

    sleep(Duration::from_millis(100)).await;
    assert!(handle.is_finished());

    let after_drop = fetches.load(Ordering::SeqCst);
    sleep(Duration::from_millis(50)).await;
    assert_eq!(fetches.load(Ordering::SeqCst), after_drop);

    handle.stop().await;
}

#[tokio::test]
async fn test_invalid_config_is_rejected_on_start() {
    let (source, fetches) = ScriptedSource::new(vec![]);
    let err = SourcePoller::new(source, config(0, 0, 4)).start().unwrap_err();
    assert!(matches!(err, ReaderError::InvalidConfig(_)));

    let (source, _) = ScriptedSource::new(vec![]);
    let err = SourcePoller::new(source, config(10, 50, 4)).start().unwrap_err();
    assert!(matches!(err, ReaderError::InvalidConfig(_)));

    let (source, _) = ScriptedSource::new(vec![]);
    let err = SourcePoller::new(source, config(10, 5, 0)).start().unwrap_err();
    assert!(matches!(err, ReaderError::InvalidConfig(_)));

    // Nothing was spawned
    sleep(Duration::from_millis(20)).await;
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_full_buffer_drops_updates_without_blocking() {
    let (source, fetches) = ScriptedSource::new(vec![]);
    let (handle, mut updates) = SourcePoller::new(source, config(5, 5, 1)).start().unwrap();

    // Nobody reads for a while; the loop must keep fetching
    sleep(Duration::from_millis(100)).await;
    assert!(fetches.load(Ordering::SeqCst) > 2);

    // Only the oldest update survived in the single slot
    assert_eq!(updates.recv().await, Some(1));

    handle.stop().await;
}

#[tokio::test]
async fn test_slot_source_with_mock_reader() {
    let reader = Arc::new(MockReader::new());
    reader.set_slot(50);
    let source = SlotSource::new(reader.clone());
    let (handle, mut updates) = SourcePoller::new(source, config(10, 5, 8)).start().unwrap();

    assert_eq!(
        timeout(Duration::from_secs(1), updates.recv()).await.unwrap(),
        Some(50)
    );

    reader.advance_slot(3);
    assert_eq!(
        timeout(Duration::from_secs(1), updates.recv()).await.unwrap(),
        Some(53)
    );

    handle.stop().await;
}

//! Periodic polling of a data source
//!
//! A [`SourcePoller`] fetches from a [`Source`] once on start and then on every
//! poll interval, pushing results into a bounded channel. Fetch failures are
//! logged and never stop the loop.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::PollerConfig;
use crate::error::{ReaderError, ReaderResult};

/// Something that can be fetched repeatedly
#[async_trait]
pub trait Source: Send + Sync + 'static {
    type Output: Send + 'static;

    /// Fetch the current value. Return [`ReaderError::NoUpdate`] when nothing changed.
    async fn fetch(&self) -> ReaderResult<Self::Output>;
}

pub struct SourcePoller<S: Source> {
    source: Arc<S>,
    config: PollerConfig,
}

/// Controls a running poller. Dropping the handle stops the loop.
#[derive(Debug)]
pub struct PollerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl<S: Source> SourcePoller<S> {
    pub fn new(source: S, config: PollerConfig) -> Self {
        Self::from_arc(Arc::new(source), config)
    }

    /// Poll a source that is shared with other owners
    pub fn from_arc(source: Arc<S>, config: PollerConfig) -> Self {
        Self { source, config }
    }

    /// Spawn the polling loop on the current tokio runtime. Fails without
    /// spawning anything when the poller config is invalid.
    pub fn start(self) -> ReaderResult<(PollerHandle, mpsc::Receiver<S::Output>)> {
        self.config.validate()?;

        let (updates_tx, updates_rx) = mpsc::channel(self.config.buffer_capacity);
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(run(self.source, self.config, updates_tx, stop_rx));

        Ok((
            PollerHandle {
                stop: stop_tx,
                task,
            },
            updates_rx,
        ))
    }
}

impl PollerHandle {
    /// Signal the loop to stop and wait for it to exit
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "poller task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn run<S: Source>(
    source: Arc<S>,
    config: PollerConfig,
    updates: mpsc::Sender<S::Output>,
    mut stop: watch::Receiver<bool>,
) {
    info!(
        poll_interval = ?config.poll_interval(),
        fetch_timeout = ?config.fetch_timeout(),
        "poller started"
    );

    // First tick completes immediately, which gives the initial fetch.
    let mut ticker = time::interval(config.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            // Err means the handle was dropped
            _ = stop.changed() => break,
            _ = updates.closed() => {
                debug!("update receiver dropped");
                break;
            }
            _ = ticker.tick() => {}
        }

        let update = match time::timeout(config.fetch_timeout(), source.fetch()).await {
            Ok(Ok(update)) => update,
            Ok(Err(ReaderError::NoUpdate)) => {
                debug!("no update found");
                continue;
            }
            Ok(Err(err)) => {
                error!(error = %err, "failed to fetch from source");
                continue;
            }
            Err(_) => {
                error!(timeout = ?config.fetch_timeout(), "fetch from source timed out");
                continue;
            }
        };

        match updates.try_send(update) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(capacity = config.buffer_capacity, "update buffer full, dropping update");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("update receiver dropped");
                break;
            }
        }
    }

    info!("poller stopped");
}

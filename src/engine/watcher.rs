use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::OutputConfig;
use crate::docker::{Connector, Daemon, EventSubscription, LifecycleEvent};
use crate::render::Renderer;

use super::pipeline::Pipeline;

/// Delays used by the [`EventWatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatcherTiming {
    /// Wait after a failed connect, ping or subscribe before trying again.
    pub retry_delay: Duration,
    /// Longest time to wait for an event before probing the daemon again.
    pub liveness_interval: Duration,
}

impl Default for WatcherTiming {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(10),
            liveness_interval: Duration::from_secs(10),
        }
    }
}

/// Connection state of the watcher. The daemon handle is dropped on every way back to
/// `Disconnected`, and the subscription with it.
enum WatchState<D> {
    Disconnected,
    Connected(D),
    Subscribed(D, EventSubscription),
}

/// Keeps watched outputs in sync with container lifecycle events.
///
/// Any start, stop or die event triggers a full pass over all watched outputs. Connection
/// problems are logged and retried forever; the watcher only returns on shutdown, which also
/// abandons a daemon call or pass that is still running.
pub(crate) struct EventWatcher<C: Connector, R> {
    connector: Arc<C>,
    pipeline: Pipeline<R>,
    outputs: Vec<Arc<OutputConfig>>,
    timing: WatcherTiming,
    shutdown: CancellationToken,
}

impl<C: Connector, R: Renderer> EventWatcher<C, R> {
    pub fn new(
        connector: Arc<C>,
        pipeline: Pipeline<R>,
        outputs: Vec<Arc<OutputConfig>>,
        timing: WatcherTiming,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            connector,
            pipeline,
            outputs,
            timing,
            shutdown,
        }
    }

    /// Runs until shutdown, starting from `initial` if a handle is already available.
    pub async fn run(self, initial: Option<C::Daemon>) {
        let mut state = match initial {
            Some(daemon) => WatchState::Connected(daemon),
            None => WatchState::Disconnected,
        };
        while let Some(next) = self.step(state).await {
            state = next;
        }
        log::info!("Stopped watching docker events");
    }

    /// Performs one transition. `None` means shutdown was requested.
    async fn step(&self, state: WatchState<C::Daemon>) -> Option<WatchState<C::Daemon>> {
        match state {
            WatchState::Disconnected => self.connect().await,
            WatchState::Connected(daemon) => self.subscribe(daemon).await,
            WatchState::Subscribed(daemon, events) => self.wait(daemon, events).await,
        }
    }

    async fn connect(&self) -> Option<WatchState<C::Daemon>> {
        match self.until_shutdown(self.connector.connect()).await? {
            Ok(daemon) => {
                log::info!("Connected to docker daemon");
                // Events may have been missed while disconnected.
                self.until_shutdown(self.pipeline.generate_all(&daemon, &self.outputs))
                    .await?;
                Some(WatchState::Connected(daemon))
            }
            Err(err) => {
                log::error!("Unable to connect to docker daemon: {err}");
                self.pause().await?;
                Some(WatchState::Disconnected)
            }
        }
    }

    async fn subscribe(&self, daemon: C::Daemon) -> Option<WatchState<C::Daemon>> {
        if !self.is_alive(&daemon).await? {
            drop(daemon);
            self.pause().await?;
            return Some(WatchState::Disconnected);
        }
        match self.until_shutdown(daemon.subscribe()).await? {
            Ok(events) => {
                log::info!("Watching docker events");
                Some(WatchState::Subscribed(daemon, events))
            }
            Err(err) => {
                log::error!("Error registering docker event listener: {err}");
                self.pause().await?;
                Some(WatchState::Connected(daemon))
            }
        }
    }

    async fn wait(
        &self,
        daemon: C::Daemon,
        mut events: EventSubscription,
    ) -> Option<WatchState<C::Daemon>> {
        let received = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => return None,
            event = events.recv() => Some(event),
            _ = tokio::time::sleep(self.timing.liveness_interval) => None,
        };

        match received {
            Some(Some(event)) => self.until_shutdown(self.on_event(&daemon, &event)).await?,
            Some(None) => {
                log::warn!("Docker event stream closed");
                drop(events);
                return Some(WatchState::Disconnected);
            }
            None => log::trace!("No docker events, pinging daemon"),
        }

        if !self.is_alive(&daemon).await? {
            drop(events);
            drop(daemon);
            self.pause().await?;
            return Some(WatchState::Disconnected);
        }
        Some(WatchState::Subscribed(daemon, events))
    }

    /// Pings the daemon, giving up after the liveness interval. `None` if shutdown was requested.
    async fn is_alive(&self, daemon: &C::Daemon) -> Option<bool> {
        let ping = tokio::time::timeout(self.timing.liveness_interval, daemon.ping());
        match self.until_shutdown(ping).await? {
            Ok(Ok(())) => Some(true),
            Ok(Err(err)) => {
                log::error!("Unable to ping docker daemon: {err}");
                Some(false)
            }
            Err(_) => {
                log::error!(
                    "Docker daemon did not answer ping within {:?}",
                    self.timing.liveness_interval
                );
                Some(false)
            }
        }
    }

    async fn on_event(&self, daemon: &C::Daemon, event: &LifecycleEvent) {
        if !event.status.is_actionable() {
            log::debug!(
                "Ignoring event {} for container {}",
                event.status.as_str(),
                event.container_id.short()
            );
            return;
        }
        log::info!(
            "Received event {} for container {}",
            event.status.as_str(),
            event.container_id.short()
        );
        self.pipeline.generate_all(daemon, &self.outputs).await;
    }

    /// Drives `fut` to completion unless shutdown is requested first.
    async fn until_shutdown<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => None,
            out = fut => Some(out),
        }
    }

    /// Sleeps for the retry delay. `None` if shutdown was requested meanwhile.
    async fn pause(&self) -> Option<()> {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => None,
            _ = tokio::time::sleep(self.timing.retry_delay) => Some(()),
        }
    }
}

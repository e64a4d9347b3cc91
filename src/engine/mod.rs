//! The synchronization engine: one startup pass, then interval tasks and the event watcher.
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::OutputConfig;
use crate::docker::Connector;
use crate::render::Renderer;

mod error;
mod interval;
mod pipeline;
mod watcher;

pub use error::{Error, Result};
pub use watcher::WatcherTiming;

use interval::IntervalTask;
use pipeline::Pipeline;
use watcher::EventWatcher;

/// Owns the output set and drives every regeneration activity.
pub struct Engine<C, R> {
    connector: Arc<C>,
    pipeline: Pipeline<R>,
    outputs: Vec<Arc<OutputConfig>>,
    timing: WatcherTiming,
    shutdown: CancellationToken,
}

impl<C: Connector, R: Renderer> Engine<C, R> {
    pub fn new(
        connector: C,
        renderer: R,
        outputs: Vec<OutputConfig>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            connector: Arc::new(connector),
            pipeline: Pipeline::new(Arc::new(renderer)),
            outputs: outputs.into_iter().map(Arc::new).collect(),
            timing: WatcherTiming::default(),
            shutdown,
        }
    }

    pub fn with_timing(mut self, timing: WatcherTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Generates every output once, then keeps them up to date until shutdown.
    ///
    /// Returns once all interval tasks and the event watcher have stopped. Shutdown during the
    /// startup pass abandons it and returns right away.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] if no daemon handle can be built at startup.
    pub async fn run(self) -> Result<()> {
        let startup = async {
            let daemon = self.connector.connect().await.map_err(Error::Connect)?;
            self.pipeline.generate_all(&daemon, &self.outputs).await;
            Ok::<_, Error>(daemon)
        };
        let daemon = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                log::info!("Shutdown requested during the startup pass");
                return Ok(());
            }
            daemon = startup => Arc::new(daemon?),
        };

        let mut join_handles = Vec::new();
        for output in &self.outputs {
            let Some(period) = output.interval() else {
                continue;
            };
            let task = IntervalTask::new(
                Arc::clone(output),
                period,
                Arc::clone(&daemon),
                self.pipeline.clone(),
                self.shutdown.clone(),
            );
            join_handles.push(tokio::spawn(task.run()));
        }

        let watched: Vec<_> = self
            .outputs
            .iter()
            .filter(|o| o.watch)
            .map(Arc::clone)
            .collect();
        if !watched.is_empty() {
            // The watcher owns a handle of its own and replaces it on reconnect.
            let initial = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => None,
                connected = self.connector.connect() => match connected {
                    Ok(daemon) => Some(daemon),
                    Err(err) => {
                        log::error!("Unable to connect to docker daemon: {err}");
                        None
                    }
                },
            };
            let watcher = EventWatcher::new(
                Arc::clone(&self.connector),
                self.pipeline.clone(),
                watched,
                self.timing,
                self.shutdown.clone(),
            );
            join_handles.push(tokio::spawn(watcher.run(initial)));
        }

        for handle in join_handles {
            if let Err(err) = handle.await {
                log::error!("Generator task failed: {err}");
            }
        }

        Ok(())
    }
}

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::OutputConfig;
use crate::docker::Daemon;
use crate::notify;
use crate::render::Renderer;

use super::pipeline::Pipeline;

/// Regenerates one output on a fixed period until shutdown.
///
/// Unlike the startup and event passes, every successful tick notifies, whether or not the
/// content changed: the output may depend on state the change check cannot see.
pub(crate) struct IntervalTask<D, R> {
    output: Arc<OutputConfig>,
    period: Duration,
    daemon: Arc<D>,
    pipeline: Pipeline<R>,
    shutdown: CancellationToken,
}

impl<D: Daemon, R: Renderer> IntervalTask<D, R> {
    pub fn new(
        output: Arc<OutputConfig>,
        period: Duration,
        daemon: Arc<D>,
        pipeline: Pipeline<R>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            output,
            period,
            daemon,
            pipeline,
            shutdown,
        }
    }

    pub async fn run(self) {
        log::info!(
            "Generating {} every {} seconds",
            self.output.dest_display(),
            self.period.as_secs_f64()
        );
        let mut ticker = tokio::time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            // A tick stuck on the daemon must not hold up shutdown.
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = self.tick() => {}
            }
        }
        log::debug!("Stopped interval task for {}", self.output.dest_display());
    }

    async fn tick(&self) {
        let snapshot = match self.daemon.snapshot().await {
            Ok(snapshot) => Arc::new(snapshot),
            Err(err) => {
                log::error!("Error listing containers: {err}");
                return;
            }
        };
        if self.pipeline.render(&self.output, &snapshot).await.is_some() {
            notify::notify(self.daemon.as_ref(), &self.output).await;
        }
    }
}

use std::sync::Arc;

use crate::config::OutputConfig;
use crate::container::Snapshot;
use crate::docker::Daemon;
use crate::notify;
use crate::render::Renderer;

/// Snapshot → render → notify, shared by the startup pass, interval ticks and event triggers.
pub(crate) struct Pipeline<R> {
    renderer: Arc<R>,
}

impl<R> Clone for Pipeline<R> {
    fn clone(&self) -> Self {
        Self {
            renderer: Arc::clone(&self.renderer),
        }
    }
}

impl<R: Renderer> Pipeline<R> {
    pub fn new(renderer: Arc<R>) -> Self {
        Self { renderer }
    }

    /// Renders every output against one shared snapshot and notifies the ones that changed.
    ///
    /// A failed snapshot pull aborts the whole pass before anything is rendered.
    pub async fn generate_all<D: Daemon>(&self, daemon: &D, outputs: &[Arc<OutputConfig>]) {
        let snapshot = match daemon.snapshot().await {
            Ok(snapshot) => Arc::new(snapshot),
            Err(err) => {
                log::error!("Error listing containers: {err}");
                return;
            }
        };

        for output in outputs {
            match self.render(output, &snapshot).await {
                Some(true) => notify::notify(daemon, output).await,
                Some(false) => log::info!(
                    "Contents of {} did not change. Skipping notification '{}'",
                    output.dest_display(),
                    output.notify_cmd
                ),
                None => {}
            }
        }
    }

    /// Renders one output on the blocking pool. `None` if rendering failed; the error is logged.
    pub async fn render(
        &self,
        output: &Arc<OutputConfig>,
        snapshot: &Arc<Snapshot>,
    ) -> Option<bool> {
        let renderer = Arc::clone(&self.renderer);
        let task_output = Arc::clone(output);
        let snapshot = Arc::clone(snapshot);
        let rendered =
            tokio::task::spawn_blocking(move || renderer.render(&task_output, &snapshot)).await;
        match rendered {
            Ok(Ok(changed)) => Some(changed),
            Ok(Err(err)) => {
                log::error!("Error generating {}: {}", output.dest_display(), err);
                None
            }
            Err(err) => {
                log::error!("Render task for {} failed: {}", output.dest_display(), err);
                None
            }
        }
    }
}

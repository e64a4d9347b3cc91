use tokio_util::sync::CancellationToken;

/// Container Gen: renders text templates from the state of the containers running on a
/// Docker daemon and keeps the rendered files in sync with it.
///
/// Outputs are regenerated at startup, on container lifecycle events and on a fixed
/// interval. After a regeneration changed a file, a shell command runs and signals are
/// sent to the configured containers.
pub mod cli;
pub mod config;
pub mod container;
pub mod docker;
pub mod engine;
pub mod error;
pub mod notify;
pub mod render;

#[cfg(test)]
mod testutil;

pub use config::GeneratorConfig;

/// Validates the configuration and runs the engine until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the daemon cannot be reached at startup.
pub async fn run(
    config: GeneratorConfig,
    shutdown: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    log::debug!(
        "Starting with {} output(s), watching events: {}",
        config.outputs.len(),
        config.has_watched_outputs()
    );

    let connector = docker::DockerConnector::new(config.endpoint, config.tls);
    let renderer = render::FileRenderer::new();
    engine::Engine::new(connector, renderer, config.outputs, shutdown)
        .run()
        .await?;

    log::info!("All outputs stopped");
    Ok(())
}

use clap::Parser;
use container_gen::cli::Cli;
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;

/// Entry point for Container Gen.
///
/// Renders the configured templates once and, for watched or interval outputs, keeps
/// them up to date until SIGINT or SIGTERM is received.
///
/// # Examples
///
/// ```bash
/// container-gen --watch --notify "nginx -s reload" nginx.tmpl /etc/nginx/conf.d/default.conf
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Cli::parse().into_config()?;

    let shutdown = CancellationToken::new();
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = sigint.recv() => log::info!("Received SIGINT, shutting down"),
                _ = sigterm.recv() => log::info!("Received SIGTERM, shutting down"),
            }
            shutdown.cancel();
        });
    }

    container_gen::run(config, shutdown).await
}

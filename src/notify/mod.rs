//! Side effects after an output changed: a shell command, then container signals.
//!
//! Everything here is best effort. Failures are logged and never stop the remaining actions.
use std::collections::BTreeMap;
use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::net::unix::pipe;

use crate::config::{OutputConfig, Signal};
use crate::docker::Daemon;
use crate::error::ResultLogExt;

mod error;

pub use error::{Error, Result};

const SHELL: &str = "/bin/sh";

/// Runs the notify command, then signals every notify target of `output`.
pub async fn notify<D: Daemon>(daemon: &D, output: &OutputConfig) {
    run_notify_cmd(&output.notify_cmd)
        .await
        .log_err("Error running notify command");
    send_signals(daemon, &output.notify_containers).await;
}

/// Runs `cmd` through `/bin/sh -c`. An empty command is a no-op.
///
/// Stdout and stderr share one pipe, so the captured output keeps the order the command wrote it.
///
/// # Errors
///
/// - [`Error::Spawn`] if the shell cannot be started.
/// - [`Error::Output`] if waiting for the command or reading its output fails.
/// - [`Error::Failed`] if the command exits unsuccessfully; its combined output is attached.
pub async fn run_notify_cmd(cmd: &str) -> Result<()> {
    if cmd.is_empty() {
        return Ok(());
    }

    log::info!("Running '{cmd}'");
    let spawn_err = |source| Error::Spawn {
        cmd: cmd.to_owned(),
        source,
    };
    let output_err = |source| Error::Output {
        cmd: cmd.to_owned(),
        source,
    };

    let (tx, mut rx) = pipe::pipe().map_err(spawn_err)?;
    let stdout = tx.into_blocking_fd().map_err(spawn_err)?;
    let stderr = stdout.try_clone().map_err(spawn_err)?;
    let mut command = tokio::process::Command::new(SHELL);
    command
        .arg("-c")
        .arg(cmd)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(stderr)
        .kill_on_drop(true);
    let mut child = command.spawn().map_err(spawn_err)?;
    // Closes the write ends held here, so reading stops once the command is done.
    drop(command);

    let mut combined = Vec::new();
    let (status, read) = tokio::join!(child.wait(), rx.read_to_end(&mut combined));
    let status = status.map_err(output_err)?;
    read.map_err(output_err)?;

    if status.success() {
        return Ok(());
    }
    Err(Error::Failed {
        cmd: cmd.to_owned(),
        status,
        output: String::from_utf8_lossy(&combined).trim_end().to_owned(),
    })
}

/// Sends each target its signal. A failed target is logged and the rest are still signalled.
pub async fn send_signals<D: Daemon>(daemon: &D, targets: &BTreeMap<String, Signal>) {
    for (container, signal) in targets {
        log::info!("Sending container '{container}' signal '{signal}'");
        daemon
            .kill(container, *signal)
            .await
            .log_err(format_args!("Error sending signal to container '{container}'"));
    }
}

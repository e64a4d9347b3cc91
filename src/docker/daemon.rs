use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::Signal;
use crate::container::{ContainerID, Snapshot};

use super::Result;

/// A live handle to the container runtime.
///
/// Handles are never mutated; reconnecting means asking the [`Connector`] for a new one and
/// dropping the old.
pub trait Daemon: Send + Sync + 'static {
    /// Liveness check.
    fn ping(&self) -> impl Future<Output = Result<()>> + Send;

    /// Pulls the full list of running containers.
    fn snapshot(&self) -> impl Future<Output = Result<Snapshot>> + Send;

    /// Subscribes to the lifecycle event stream. Dropping the returned subscription unsubscribes.
    fn subscribe(&self) -> impl Future<Output = Result<EventSubscription>> + Send;

    /// Asks the runtime to deliver `signal` to `container` (id or name).
    fn kill(&self, container: &str, signal: Signal) -> impl Future<Output = Result<()>> + Send;
}

/// Builds [`Daemon`] handles.
pub trait Connector: Send + Sync + 'static {
    type Daemon: Daemon;

    fn connect(&self) -> impl Future<Output = Result<Self::Daemon>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventStatus {
    Start,
    Stop,
    Die,
    Other(String),
}

impl EventStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "start" => EventStatus::Start,
            "stop" => EventStatus::Stop,
            "die" => EventStatus::Die,
            other => EventStatus::Other(other.to_owned()),
        }
    }

    /// Only start, stop and die change the set of running containers.
    pub fn is_actionable(&self) -> bool {
        !matches!(self, EventStatus::Other(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventStatus::Start => "start",
            EventStatus::Stop => "stop",
            EventStatus::Die => "die",
            EventStatus::Other(other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleEvent {
    pub container_id: ContainerID,
    pub status: EventStatus,
}

/// Receiving side of an event subscription.
///
/// The channel closing means the subscription is lost. Dropping the subscription stops the task
/// feeding it, if any.
#[derive(Debug)]
pub struct EventSubscription {
    rx: mpsc::Receiver<LifecycleEvent>,
    feeder: Option<JoinHandle<()>>,
}

impl EventSubscription {
    pub fn new(rx: mpsc::Receiver<LifecycleEvent>, feeder: Option<JoinHandle<()>>) -> Self {
        Self { rx, feeder }
    }

    /// Waits for the next event, `None` once the stream is gone.
    pub async fn recv(&mut self) -> Option<LifecycleEvent> {
        self.rx.recv().await
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        if let Some(feeder) = self.feeder.take() {
            feeder.abort();
        }
    }
}

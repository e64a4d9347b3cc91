//! In-memory fakes for the daemon and renderer seams.
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::{OutputConfig, Signal};
use crate::container::{ContainerID, RuntimeContainer, Snapshot};
use crate::docker::{self, Connector, Daemon, EventStatus, EventSubscription, LifecycleEvent};
use crate::render::{self, Renderer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect,
    Ping,
    Snapshot,
    Subscribe,
    Kill(String, Signal),
    Render(PathBuf),
}

#[derive(Debug, Default)]
pub struct FakeState {
    calls: Mutex<Vec<Call>>,
    connect_failures: AtomicUsize,
    ping_failures: AtomicUsize,
    subscribe_failures: AtomicUsize,
    pings_hang: AtomicBool,
    snapshots_hang: AtomicBool,
    snapshot_fails: AtomicBool,
    kill_failures: Mutex<HashSet<String>>,
    subscribers: Mutex<Vec<mpsc::Sender<LifecycleEvent>>>,
    unchanged: Mutex<HashSet<PathBuf>>,
    render_failures: Mutex<HashSet<PathBuf>>,
    kill_marker: Mutex<Option<PathBuf>>,
    marker_seen: Mutex<Option<bool>>,
}

fn fake_error() -> docker::Error {
    docker::Error::Api {
        path: "/fake".to_owned(),
        status: 500,
        message: "fake failure".to_owned(),
    }
}

/// Pops one pending failure off a counter.
fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

impl FakeState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn daemon(self: &Arc<Self>) -> FakeDaemon {
        FakeDaemon {
            state: Arc::clone(self),
        }
    }

    pub fn connector(self: &Arc<Self>) -> FakeConnector {
        FakeConnector {
            state: Arc::clone(self),
        }
    }

    pub fn renderer(self: &Arc<Self>) -> FakeRenderer {
        FakeRenderer {
            state: Arc::clone(self),
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn renders(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Render(template) => Some(template),
                _ => None,
            })
            .collect()
    }

    pub fn kills(&self) -> Vec<(String, Signal)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Kill(container, signal) => Some((container, signal)),
                _ => None,
            })
            .collect()
    }

    pub fn fail_next_connects(&self, n: usize) {
        self.connect_failures.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_pings(&self, n: usize) {
        self.ping_failures.store(n, Ordering::SeqCst);
    }

    pub fn fail_next_subscribes(&self, n: usize) {
        self.subscribe_failures.store(n, Ordering::SeqCst);
    }

    /// Makes pings never complete, as a daemon that stopped answering would.
    pub fn set_pings_hang(&self, hang: bool) {
        self.pings_hang.store(hang, Ordering::SeqCst);
    }

    /// Makes snapshot pulls never complete.
    pub fn set_snapshots_hang(&self, hang: bool) {
        self.snapshots_hang.store(hang, Ordering::SeqCst);
    }

    pub fn set_snapshot_fails(&self, fails: bool) {
        self.snapshot_fails.store(fails, Ordering::SeqCst);
    }

    pub fn fail_kill(&self, container: &str) {
        self.kill_failures
            .lock()
            .unwrap()
            .insert(container.to_owned());
    }

    /// Makes renders of `template` report "unchanged".
    pub fn set_unchanged(&self, template: impl Into<PathBuf>) {
        self.unchanged.lock().unwrap().insert(template.into());
    }

    pub fn fail_render(&self, template: impl Into<PathBuf>) {
        self.render_failures.lock().unwrap().insert(template.into());
    }

    /// On the next kill, record whether `marker` exists.
    pub fn record_marker_on_kill(&self, marker: PathBuf) {
        *self.kill_marker.lock().unwrap() = Some(marker);
    }

    pub fn marker_seen_on_kill(&self) -> Option<bool> {
        *self.marker_seen.lock().unwrap()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap()
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }

    /// Delivers an event to the newest live subscription.
    pub async fn emit(&self, id: &str, status: &str) {
        let tx = self
            .subscribers
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|tx| !tx.is_closed())
            .cloned()
            .expect("no live subscription");
        tx.send(LifecycleEvent {
            container_id: ContainerID::new(id).unwrap(),
            status: EventStatus::parse(status),
        })
        .await
        .unwrap();
    }

    /// Closes every event stream, as a daemon restart would.
    pub fn close_subscriptions(&self) {
        self.subscribers.lock().unwrap().clear();
    }
}

#[derive(Debug, Clone)]
pub struct FakeDaemon {
    state: Arc<FakeState>,
}

impl Daemon for FakeDaemon {
    async fn ping(&self) -> docker::Result<()> {
        self.state.record(Call::Ping);
        if self.state.pings_hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if take_failure(&self.state.ping_failures) {
            return Err(fake_error());
        }
        Ok(())
    }

    async fn snapshot(&self) -> docker::Result<Snapshot> {
        self.state.record(Call::Snapshot);
        if self.state.snapshots_hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.state.snapshot_fails.load(Ordering::SeqCst) {
            return Err(fake_error());
        }
        Ok(vec![RuntimeContainer::new(ContainerID::new("abc").unwrap())])
    }

    async fn subscribe(&self) -> docker::Result<EventSubscription> {
        self.state.record(Call::Subscribe);
        if take_failure(&self.state.subscribe_failures) {
            return Err(fake_error());
        }
        let (tx, rx) = mpsc::channel(16);
        self.state.subscribers.lock().unwrap().push(tx);
        Ok(EventSubscription::new(rx, None))
    }

    async fn kill(&self, container: &str, signal: Signal) -> docker::Result<()> {
        self.state.record(Call::Kill(container.to_owned(), signal));
        if let Some(marker) = self.state.kill_marker.lock().unwrap().take() {
            *self.state.marker_seen.lock().unwrap() = Some(marker.exists());
        }
        if self.state.kill_failures.lock().unwrap().contains(container) {
            return Err(fake_error());
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FakeConnector {
    state: Arc<FakeState>,
}

impl Connector for FakeConnector {
    type Daemon = FakeDaemon;

    async fn connect(&self) -> docker::Result<FakeDaemon> {
        self.state.record(Call::Connect);
        if take_failure(&self.state.connect_failures) {
            return Err(fake_error());
        }
        Ok(self.state.daemon())
    }
}

#[derive(Debug, Clone)]
pub struct FakeRenderer {
    state: Arc<FakeState>,
}

impl Renderer for FakeRenderer {
    fn render(&self, output: &OutputConfig, _snapshot: &Snapshot) -> render::Result<bool> {
        self.state.record(Call::Render(output.template.clone()));
        if self.state.render_failures.lock().unwrap().contains(&output.template) {
            return Err(render::Error::TemplateRead {
                path: output.template.clone(),
                source: std::io::Error::other("fake failure"),
            });
        }
        Ok(!self.state.unchanged.lock().unwrap().contains(&output.template))
    }
}

/// Polls `cond` until it holds, panicking after a few seconds.
pub async fn wait_for(what: &str, cond: impl Fn() -> bool) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

/// An output that writes nothing but appends `name` to `log` when notified.
pub fn logged_output(name: &str, log: &std::path::Path) -> OutputConfig {
    OutputConfig {
        notify_cmd: format!("echo {name} >> {}", log.display()),
        ..OutputConfig::new(name)
    }
}

pub fn read_log(log: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .map(str::to_owned)
        .collect()
}

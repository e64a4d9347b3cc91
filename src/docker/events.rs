use http_body_util::BodyExt;
use hyper::body::Incoming;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::container::ContainerID;

use super::{EventStatus, LifecycleEvent};

/// Raw event as emitted by `GET /events`.
///
/// Older daemons fill `status`/`id`, newer ones `Action`/`Actor.ID`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiEvent {
    status: Option<String>,
    id: Option<String>,
    #[serde(rename = "Type")]
    kind: Option<String>,
    #[serde(rename = "Action")]
    action: Option<String>,
    #[serde(rename = "Actor")]
    actor: Option<Actor>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Actor {
    #[serde(rename = "ID")]
    id: Option<String>,
}

impl ApiEvent {
    fn into_lifecycle_event(self) -> Option<LifecycleEvent> {
        if self.kind.as_deref().is_some_and(|k| k != "container") {
            return None;
        }
        let status = self.status.or(self.action)?;
        let id = self.id.or(self.actor.and_then(|a| a.id))?;
        let container_id = ContainerID::new(id).ok()?;

        Some(LifecycleEvent {
            container_id,
            status: EventStatus::parse(&status),
        })
    }
}

/// Splits the newline-delimited JSON event stream into [`LifecycleEvent`]s.
#[derive(Debug, Default)]
pub(super) struct EventDecoder {
    buf: Vec<u8>,
}

impl EventDecoder {
    /// Feeds a chunk of the stream, returning every event completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<LifecycleEvent> {
        self.buf.extend_from_slice(chunk);
        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = line.trim_ascii();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_slice::<ApiEvent>(line) {
                Ok(event) => events.extend(event.into_lifecycle_event()),
                Err(err) => log::warn!(
                    "failed to decode docker event `{}`: {}",
                    String::from_utf8_lossy(line),
                    err
                ),
            }
        }
        events
    }
}

/// Forwards decoded events until the stream ends or the receiver goes away.
pub(super) async fn forward_events(mut body: Incoming, tx: mpsc::Sender<LifecycleEvent>) {
    let mut decoder = EventDecoder::default();
    while let Some(frame) = body.frame().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("docker event stream failed: {err}");
                return;
            }
        };
        let Some(data) = frame.data_ref() else {
            continue;
        };
        for event in decoder.push(data) {
            if tx.send(event).await.is_err() {
                return;
            }
        }
    }
    log::debug!("docker event stream ended");
}

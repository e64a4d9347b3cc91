//! Docker Engine API access.
//!
//! The [`Daemon`] and [`Connector`] traits are the seam the engine drives; [`DockerClient`] and
//! [`DockerConnector`] implement them over HTTP/1.1 on a Unix socket, plain TCP or TCP with TLS.
mod client;
mod daemon;
mod endpoint;
mod error;
mod events;
mod models;
mod tls;
mod transport;

pub use client::{DockerClient, DockerConnector};
pub use daemon::{Connector, Daemon, EventStatus, EventSubscription, LifecycleEvent};
pub use endpoint::{DEFAULT_ENDPOINT, Endpoint, resolve_endpoint};
pub use error::{Error, Result};

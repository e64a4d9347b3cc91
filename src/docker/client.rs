use std::sync::Arc;
use std::time::Duration;

use http_body_util::{BodyExt, Empty};
use hyper::body::{Bytes, Incoming};
use hyper::{Method, Request, Response};
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tower::ServiceExt;

use crate::config::{Signal, TlsConfig};
use crate::container::Snapshot;

use super::events::forward_events;
use super::models::{ApiError, ContainerInspect, ContainerSummary};
use super::tls;
use super::transport::DaemonConnector;
use super::{Connector, Daemon, Endpoint, Error, EventSubscription, Result, resolve_endpoint};

/// Number of decoded events buffered between the stream reader and the watcher.
const EVENT_BUFFER: usize = 100;

/// Longest time a single API request may take, the event stream body excluded.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Docker Engine API client over HTTP/1.1.
///
/// Every request opens its own connection, so a client stays usable across daemon restarts.
#[derive(Debug, Clone)]
pub struct DockerClient {
    endpoint: Endpoint,
    connector: DaemonConnector,
    timeout: Duration,
}

impl DockerClient {
    /// Builds a client for `endpoint`. TCP endpoints use TLS when `tls` is enabled; Unix sockets
    /// ignore it.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if TLS verification is requested without a CA cert.
    /// - [`Error::TlsMaterial`], [`Error::MissingPrivateKey`] or [`Error::TlsSetup`] if the TLS
    ///   files cannot be loaded.
    /// - [`Error::InvalidServerName`] if the TCP host cannot be used as a TLS server name.
    pub fn new(endpoint: Endpoint, tls: &TlsConfig) -> Result<Self> {
        let mut connector = DaemonConnector::new(endpoint.clone());
        if let Endpoint::Tcp(addr) = &endpoint {
            tls.validate()?;
            if tls.is_enabled() {
                log::debug!("Using TLS for {endpoint}");
                let config = tls::client_config(tls)?;
                connector = connector.with_tls(Arc::new(config), tls::server_name(addr)?);
            }
        }

        Ok(Self {
            endpoint,
            connector,
            timeout: REQUEST_TIMEOUT,
        })
    }

    /// Overrides how long a single request may take.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sends a request and returns once the response head arrived.
    async fn send(&self, method: Method, path: &str) -> Result<Response<Incoming>> {
        tokio::time::timeout(self.timeout, self.exchange(method, path))
            .await
            .map_err(|_| self.timed_out(path))?
    }

    /// Sends a request and collects the whole response body.
    async fn request(&self, method: Method, path: &str) -> Result<Bytes> {
        let exchange = async {
            let response = self.exchange(method, path).await?;
            collect(path, response).await
        };
        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| self.timed_out(path))?
    }

    fn timed_out(&self, path: &str) -> Error {
        Error::Timeout {
            path: path.to_owned(),
            after: self.timeout,
        }
    }

    async fn exchange(&self, method: Method, path: &str) -> Result<Response<Incoming>> {
        let io = self
            .connector
            .clone()
            .oneshot(hyper::Uri::from_static("http://docker/"))
            .await
            .map_err(|source| Error::Connect {
                endpoint: self.endpoint.to_string(),
                source,
            })?;
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(Error::Handshake)?;
        tokio::spawn(async move {
            if let Err(err) = conn.await {
                log::debug!("docker connection closed: {err}");
            }
        });

        let request = Request::builder()
            .method(method)
            .uri(path)
            .header(hyper::header::HOST, "docker")
            .body(Empty::<Bytes>::new())
            .map_err(|source| Error::BuildRequest {
                path: path.to_owned(),
                source,
            })?;
        let response = sender
            .send_request(request)
            .await
            .map_err(|source| Error::Request {
                path: path.to_owned(),
                source,
            })?;

        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = collect(path, response).await?;
        let message = serde_json::from_slice::<ApiError>(&body)
            .map(|e| e.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(&body).trim().to_owned());
        Err(Error::Api {
            path: path.to_owned(),
            status,
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.request(Method::GET, path).await?;
        serde_json::from_slice(&body).map_err(|source| Error::Decode {
            path: path.to_owned(),
            source,
        })
    }

    async fn inspect(&self, id: &str) -> Result<ContainerInspect> {
        self.get_json(&format!("/containers/{id}/json")).await
    }
}

async fn collect(path: &str, response: Response<Incoming>) -> Result<Bytes> {
    Ok(response
        .into_body()
        .collect()
        .await
        .map_err(|source| Error::Request {
            path: path.to_owned(),
            source,
        })?
        .to_bytes())
}

impl Daemon for DockerClient {
    async fn ping(&self) -> Result<()> {
        self.request(Method::GET, "/_ping").await?;
        Ok(())
    }

    async fn snapshot(&self) -> Result<Snapshot> {
        let summaries: Vec<ContainerSummary> = self.get_json("/containers/json").await?;
        let mut snapshot = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let inspect = match self.inspect(&summary.id).await {
                Ok(inspect) => inspect,
                Err(err) => {
                    log::warn!("error inspecting container {}: {}", summary.id, err);
                    continue;
                }
            };
            match inspect.into_runtime_container() {
                Ok(container) => snapshot.push(container),
                Err(err) => log::warn!("skipping container {}: {}", summary.id, err),
            }
        }
        log::trace!("Pulled snapshot with {} containers", snapshot.len());
        Ok(snapshot)
    }

    async fn subscribe(&self) -> Result<EventSubscription> {
        let response = self.send(Method::GET, "/events").await?;
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let feeder = tokio::spawn(forward_events(response.into_body(), tx));
        Ok(EventSubscription::new(rx, Some(feeder)))
    }

    async fn kill(&self, container: &str, signal: Signal) -> Result<()> {
        let path = format!("/containers/{container}/kill?signal={}", signal.number());
        self.request(Method::POST, &path).await?;
        Ok(())
    }
}

/// Resolves the endpoint on every connect, so a changed `DOCKER_HOST` is picked up on reconnect.
#[derive(Debug, Clone)]
pub struct DockerConnector {
    endpoint: Option<String>,
    tls: TlsConfig,
}

impl DockerConnector {
    pub fn new(endpoint: Option<String>, tls: TlsConfig) -> Self {
        Self { endpoint, tls }
    }
}

impl Connector for DockerConnector {
    type Daemon = DockerClient;

    async fn connect(&self) -> Result<DockerClient> {
        let raw = resolve_endpoint(self.endpoint.as_deref());
        let endpoint = Endpoint::parse(&raw)?;
        log::debug!("Using docker endpoint {endpoint}");
        DockerClient::new(endpoint, &self.tls)
    }
}

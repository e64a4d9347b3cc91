use std::sync::Arc;
use std::{fmt, pin, task};

use hyper_util::rt::TokioIo;
use rustls::ClientConfig;
use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::TlsConnector;

use super::Endpoint;

/// A byte stream to the daemon: a Unix socket, a TCP connection or TLS over TCP.
pub(super) trait Io: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Io for T {}

pub(super) type DaemonStream = TokioIo<Box<dyn Io>>;

/// Opens a fresh stream to the daemon for every request.
#[derive(Debug, Clone)]
pub(super) struct DaemonConnector {
    endpoint: Endpoint,
    tls: Option<TlsTarget>,
}

#[derive(Clone)]
struct TlsTarget {
    connector: TlsConnector,
    server_name: ServerName<'static>,
}

impl fmt::Debug for TlsTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsTarget")
            .field("server_name", &self.server_name)
            .finish_non_exhaustive()
    }
}

impl DaemonConnector {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            tls: None,
        }
    }

    /// Wraps TCP connections in TLS. Unix socket connections are left as they are.
    pub fn with_tls(mut self, config: Arc<ClientConfig>, server_name: ServerName<'static>) -> Self {
        self.tls = Some(TlsTarget {
            connector: TlsConnector::from(config),
            server_name,
        });
        self
    }
}

impl tower::Service<hyper::Uri> for DaemonConnector {
    type Response = DaemonStream;

    type Error = std::io::Error;

    type Future = pin::Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, _req: hyper::Uri) -> Self::Future {
        let endpoint = self.endpoint.clone();
        let tls = self.tls.clone();
        Box::pin(async move {
            let stream: Box<dyn Io> = match endpoint {
                Endpoint::Unix(path) => {
                    log::trace!("Connecting to {}...", path.display());
                    Box::new(tokio::net::UnixStream::connect(path).await?)
                }
                Endpoint::Tcp(addr) => {
                    log::trace!("Connecting to {addr}...");
                    let tcp = tokio::net::TcpStream::connect(addr).await?;
                    match tls {
                        Some(tls) => Box::new(tls.connector.connect(tls.server_name, tcp).await?),
                        None => Box::new(tcp),
                    }
                }
            };

            Ok(TokioIo::new(stream))
        })
    }
}

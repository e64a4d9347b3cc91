use std::fmt;
use std::path::PathBuf;

use super::{Error, Result};

pub const DEFAULT_ENDPOINT: &str = "unix:///var/run/docker.sock";
const DEFAULT_SOCKET_PATH: &str = "/var/run/docker.sock";
const DEFAULT_TCP_HOST: &str = "127.0.0.1";

/// Where the docker daemon listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Unix(PathBuf),
    /// `host:port`
    Tcp(String),
}

impl Endpoint {
    /// Parses `unix:///path/to/socket` or `tcp://host:port`.
    ///
    /// An empty string yields the default socket. `unix://` without a path falls back to the
    /// default socket path and `tcp://:port` to `127.0.0.1`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] for a missing `scheme://` prefix, an unknown scheme or a
    /// TCP address without a port.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason| Error::InvalidEndpoint {
            endpoint: raw.to_owned(),
            reason,
        };
        if raw.is_empty() {
            return Ok(Endpoint::Unix(PathBuf::from(DEFAULT_SOCKET_PATH)));
        }
        let (scheme, addr) = raw
            .split_once("://")
            .ok_or_else(|| invalid("expected `unix://` or `tcp://` prefix"))?;
        match scheme {
            "unix" if addr.is_empty() => Ok(Endpoint::Unix(PathBuf::from(DEFAULT_SOCKET_PATH))),
            "unix" => Ok(Endpoint::Unix(PathBuf::from(addr))),
            "tcp" => {
                let addr = addr.trim_end_matches('/');
                let (host, port) = addr
                    .rsplit_once(':')
                    .ok_or_else(|| invalid("missing port"))?;
                if port.is_empty() || port.parse::<u16>().is_err() {
                    return Err(invalid("invalid port"));
                }
                let host = if host.is_empty() { DEFAULT_TCP_HOST } else { host };
                Ok(Endpoint::Tcp(format!("{host}:{port}")))
            }
            _ => Err(invalid("unsupported scheme")),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "unix://{}", path.display()),
            Endpoint::Tcp(addr) => write!(f, "tcp://{addr}"),
        }
    }
}

/// Picks the endpoint from the explicit setting, then `DOCKER_HOST`, then the default socket.
pub fn resolve_endpoint(configured: Option<&str>) -> String {
    resolve_endpoint_from(configured, std::env::var("DOCKER_HOST").ok())
}

fn resolve_endpoint_from(configured: Option<&str>, docker_host: Option<String>) -> String {
    configured
        .filter(|e| !e.is_empty())
        .map(str::to_owned)
        .or(docker_host.filter(|e| !e.is_empty()))
        .unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        assert_eq!(resolve_endpoint_from(None, None), DEFAULT_ENDPOINT);
        assert_eq!(resolve_endpoint_from(Some(""), None), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_docker_host_endpoint() {
        let endpoint = resolve_endpoint_from(None, Some("tcp://127.0.0.1:4243".to_owned()));
        assert_eq!(endpoint, "tcp://127.0.0.1:4243");
    }

    #[test]
    fn test_flag_endpoint_wins() {
        let endpoint = resolve_endpoint_from(
            Some("tcp://127.0.0.1:5555"),
            Some("tcp://127.0.0.1:4243".to_owned()),
        );
        assert_eq!(endpoint, "tcp://127.0.0.1:5555");
    }

    #[test]
    fn test_parse_unix() {
        assert_eq!(
            Endpoint::parse("unix:///var/run/docker.sock").unwrap(),
            Endpoint::Unix(PathBuf::from("/var/run/docker.sock"))
        );
        assert_eq!(
            Endpoint::parse("").unwrap(),
            Endpoint::Unix(PathBuf::from("/var/run/docker.sock"))
        );
        assert_eq!(
            Endpoint::parse("unix://").unwrap(),
            Endpoint::Unix(PathBuf::from("/var/run/docker.sock"))
        );
    }

    #[test]
    fn test_parse_unix_bad_format() {
        assert!(matches!(
            Endpoint::parse("unix:/var/run/docker.sock"),
            Err(Error::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_parse_tcp() {
        assert_eq!(
            Endpoint::parse("tcp://127.0.0.1:4243").unwrap(),
            Endpoint::Tcp("127.0.0.1:4243".to_owned())
        );
        assert_eq!(
            Endpoint::parse("tcp://:4243").unwrap(),
            Endpoint::Tcp("127.0.0.1:4243".to_owned())
        );
        assert!(Endpoint::parse("tcp://127.0.0.1").is_err());
        assert!(Endpoint::parse("tcp://127.0.0.1:http").is_err());
        assert!(Endpoint::parse("udp://127.0.0.1:53").is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for raw in ["unix:///run/docker.sock", "tcp://10.0.0.1:2375"] {
            assert_eq!(Endpoint::parse(raw).unwrap().to_string(), raw);
        }
    }
}

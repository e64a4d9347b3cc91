use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, verify_tls12_signature, verify_tls13_signature};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};

use crate::config::TlsConfig;

use super::{Error, Result};

/// Builds the client side of a TLS connection to the daemon.
///
/// The daemon certificate is checked against the CA cert when one exists, otherwise it is
/// accepted as is. The client certificate is presented when both cert and key exist.
pub(super) fn client_config(tls: &TlsConfig) -> Result<ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .map_err(Error::TlsSetup)?;

    let builder = match tls.ca_cert_file() {
        Some(ca) => {
            let mut roots = RootCertStore::empty();
            for cert in read_certs(ca)? {
                roots.add(cert).map_err(Error::TlsSetup)?;
            }
            builder.with_root_certificates(roots)
        }
        None => {
            log::warn!("No CA cert available, the docker daemon certificate is not verified");
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(AcceptAnyCert(provider)))
        }
    };

    match (tls.cert_file(), tls.key_file()) {
        (Some(cert), Some(key)) => builder
            .with_client_auth_cert(read_certs(cert)?, read_key(key)?)
            .map_err(Error::TlsSetup),
        _ => Ok(builder.with_no_client_auth()),
    }
}

/// The name the daemon certificate must be valid for, taken from a `host:port` address.
pub(super) fn server_name(addr: &str) -> Result<ServerName<'static>> {
    let host = addr.rsplit_once(':').map_or(addr, |(host, _)| host);
    let host = host.trim_start_matches('[').trim_end_matches(']');
    ServerName::try_from(host.to_owned()).map_err(|_| Error::InvalidServerName(host.to_owned()))
}

fn read_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let tls_err = |source| Error::TlsMaterial {
        path: path.to_path_buf(),
        source,
    };
    let file = std::fs::File::open(path).map_err(tls_err)?;
    rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(tls_err)
}

fn read_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let tls_err = |source| Error::TlsMaterial {
        path: path.to_path_buf(),
        source,
    };
    let file = std::fs::File::open(path).map_err(tls_err)?;
    rustls_pemfile::private_key(&mut BufReader::new(file))
        .map_err(tls_err)?
        .ok_or_else(|| Error::MissingPrivateKey(path.to_path_buf()))
}

/// Accepts any daemon certificate while still checking handshake signatures.
#[derive(Debug)]
struct AcceptAnyCert(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.0.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_server_name() {
        assert_eq!(
            server_name("127.0.0.1:2376").unwrap(),
            ServerName::try_from("127.0.0.1").unwrap()
        );
        assert_eq!(
            server_name("docker.internal:2376").unwrap(),
            ServerName::try_from("docker.internal").unwrap()
        );
        assert_eq!(
            server_name("[::1]:2376").unwrap(),
            ServerName::try_from("::1").unwrap()
        );
    }

    #[test]
    fn test_client_config_without_material() {
        assert!(client_config(&TlsConfig::default()).is_ok());
    }

    #[test]
    fn test_client_config_with_client_cert() {
        let certified = rcgen::generate_simple_self_signed(vec!["client".to_owned()]).unwrap();
        let mut cert = tempfile::NamedTempFile::new().unwrap();
        cert.write_all(certified.cert.pem().as_bytes()).unwrap();
        let mut key = tempfile::NamedTempFile::new().unwrap();
        key.write_all(certified.key_pair.serialize_pem().as_bytes())
            .unwrap();

        let tls = TlsConfig {
            cert: Some(cert.path().to_path_buf()),
            key: Some(key.path().to_path_buf()),
            ca_cert: Some(cert.path().to_path_buf()),
            verify: true,
        };
        let config = client_config(&tls).unwrap();
        assert!(config.client_auth_cert_resolver.has_certs());
    }

    #[test]
    fn test_key_file_without_key() {
        let certified = rcgen::generate_simple_self_signed(vec!["client".to_owned()]).unwrap();
        let mut cert = tempfile::NamedTempFile::new().unwrap();
        cert.write_all(certified.cert.pem().as_bytes()).unwrap();

        let tls = TlsConfig {
            cert: Some(cert.path().to_path_buf()),
            key: Some(cert.path().to_path_buf()),
            ..TlsConfig::default()
        };
        match client_config(&tls) {
            Err(Error::MissingPrivateKey(path)) => assert_eq!(path, PathBuf::from(cert.path())),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}

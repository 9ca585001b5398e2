//! TLS trust policy and client configuration building.
//!
//! The default [`TrustPolicy::SelfSigned`] mode accepts server
//! certificates presented without an intermediate chain, which is how
//! internally issued certificates appear in the deployments this client
//! targets. Chains with intermediates still validate against the webpki
//! root set. This is a deliberate security trade-off: do not use the
//! default mode against endpoints reachable by untrusted networks.

use std::sync::Arc;

use rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use rustls::client::WebPkiServerVerifier;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tracing::warn;

use crate::error::RestError;

/// Decides whether a server certificate is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustPolicy {
    /// Accept self-signed certificates (chains without intermediates);
    /// longer chains validate against the webpki roots. The default,
    /// for environments using internally issued certificates.
    #[default]
    SelfSigned,
    /// Full validation against the webpki root set only.
    SystemRoots,
}

impl TrustPolicy {
    /// Builds the rustls client configuration for this policy.
    ///
    /// # Errors
    ///
    /// Returns [`RestError::TlsConfiguration`] if the trust material
    /// cannot be assembled into a verifier.
    pub fn build_client_config(self) -> Result<Arc<ClientConfig>, RestError> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let webpki = WebPkiServerVerifier::builder(Arc::new(roots))
            .build()
            .map_err(|e| RestError::TlsConfiguration {
                reason: e.to_string(),
            })?;

        let config = match self {
            Self::SystemRoots => ClientConfig::builder()
                .with_webpki_verifier(webpki)
                .with_no_client_auth(),
            Self::SelfSigned => {
                warn!("TLS trust policy accepts self-signed server certificates");
                let verifier = Arc::new(SelfSignedTrust { inner: webpki });
                ClientConfig::builder()
                    .dangerous()
                    .with_custom_certificate_verifier(verifier)
                    .with_no_client_auth()
            }
        };

        Ok(Arc::new(config))
    }
}

/// Verifier that trusts certificates presented without intermediates.
///
/// A lone certificate is taken as self-signed and accepted; anything
/// with a chain goes through full webpki validation.
#[derive(Debug)]
struct SelfSignedTrust {
    inner: Arc<WebPkiServerVerifier>,
}

impl ServerCertVerifier for SelfSignedTrust {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        if intermediates.is_empty() {
            return Ok(ServerCertVerified::assertion());
        }
        self.inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn webpki() -> Arc<WebPkiServerVerifier> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        WebPkiServerVerifier::builder(Arc::new(roots))
            .build()
            .expect("verifier")
    }

    #[test]
    fn default_policy_is_self_signed() {
        assert_eq!(TrustPolicy::default(), TrustPolicy::SelfSigned);
    }

    #[test]
    fn self_signed_policy_builds() {
        assert!(TrustPolicy::SelfSigned.build_client_config().is_ok());
    }

    #[test]
    fn system_roots_policy_builds() {
        assert!(TrustPolicy::SystemRoots.build_client_config().is_ok());
    }

    #[test]
    fn lone_certificate_is_accepted() {
        let verifier = SelfSignedTrust { inner: webpki() };
        let cert = CertificateDer::from(vec![0u8; 16]);
        let name = ServerName::try_from("localhost").expect("name");
        let result =
            verifier.verify_server_cert(&cert, &[], &name, &[], UnixTime::now());
        assert!(result.is_ok());
    }

    #[test]
    fn chained_certificate_is_validated() {
        // Garbage with an intermediate must fall through to webpki,
        // which rejects it.
        let verifier = SelfSignedTrust { inner: webpki() };
        let cert = CertificateDer::from(vec![0u8; 16]);
        let intermediate = CertificateDer::from(vec![1u8; 16]);
        let name = ServerName::try_from("localhost").expect("name");
        let result = verifier.verify_server_cert(
            &cert,
            std::slice::from_ref(&intermediate),
            &name,
            &[],
            UnixTime::now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn verify_schemes_delegate_to_webpki() {
        let verifier = SelfSignedTrust { inner: webpki() };
        assert!(!verifier.supported_verify_schemes().is_empty());
    }
}

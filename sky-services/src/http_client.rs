//! Shared HTTPS client construction for the archive backends.
//!
//! Every backend talks TLS to a public archive endpoint, so they all go
//! through one builder wired to the webpki root store. Connections are
//! pooled; repeated queries against the same service reuse them.

use std::sync::Arc;
use std::time::Duration;

use hyper::client::HttpConnector;
use hyper::{Body, Client};
use hyper_rustls::HttpsConnector;
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore};
use webpki_roots::TLS_SERVER_ROOTS;

use crate::traits::ServiceResult;

pub(crate) type HyperClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Archive endpoints drop idle connections quickly; keep our pool timeout
/// shorter so requests never go out on a half-closed socket.
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

#[allow(clippy::unnecessary_wraps)]
pub(crate) fn build_https_client() -> ServiceResult<HyperClient> {
    let trust_anchors = TLS_SERVER_ROOTS.iter().map(|anchor| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            anchor.subject,
            anchor.spki,
            anchor.name_constraints,
        )
    });
    let mut roots = RootCertStore::empty();
    roots.add_trust_anchors(trust_anchors);

    let config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);

    let connector = HttpsConnector::from((http, Arc::new(config)));

    Ok(Client::builder()
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .build::<_, Body>(connector))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn client_builds_without_io() {
        assert!(build_https_client().is_ok());
    }
}

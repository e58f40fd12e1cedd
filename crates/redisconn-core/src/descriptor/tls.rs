//! Direct TLS with a CA certificate file

use tracing::debug;

use super::{DerivationError, Endpoint, TlsMaterial, require, require_secure, validate_url};
use crate::config::{ConfigSnapshot, vars};

pub(super) async fn derive(snapshot: &ConfigSnapshot) -> Result<Endpoint, DerivationError> {
    let url = require(snapshot.composed_url.as_deref(), vars::URL)?;
    require_secure(url)?;
    validate_url(url)?;

    let path = snapshot
        .certificate_path
        .as_deref()
        .ok_or(DerivationError::MissingValue { var: vars::CERT })?;

    debug!(path = %path.display(), "reading CA certificate");
    let certificate = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| DerivationError::CertificateRead {
            path: path.display().to_string(),
            source,
        })?;

    Ok(Endpoint {
        url: url.to_string(),
        tls: Some(TlsMaterial {
            trust_anchors: vec![certificate],
        }),
        auth: None,
    })
}

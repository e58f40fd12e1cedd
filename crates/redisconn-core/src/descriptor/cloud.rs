//! Cloud-platform brokered credentials

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::{DerivationError, Endpoint, TlsMaterial, require, require_secure, validate_url};
use crate::config::{ConfigSnapshot, vars};
use crate::strategy::CloudPlatform;

pub(super) fn derive(
    platform: CloudPlatform,
    snapshot: &ConfigSnapshot,
) -> Result<Endpoint, DerivationError> {
    let payload = require(snapshot.broker_payload.as_deref(), vars::BROKER_PAYLOAD)?;
    let credentials = platform.extract_credentials(payload)?;

    require_secure(&credentials.composed_url)?;
    validate_url(&credentials.composed_url)?;

    let encoded: String = credentials
        .certificate_base64
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let certificate = String::from_utf8(STANDARD.decode(encoded)?)?;

    Ok(Endpoint {
        url: credentials.composed_url,
        tls: Some(TlsMaterial {
            trust_anchors: vec![certificate],
        }),
        auth: None,
    })
}

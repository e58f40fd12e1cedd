//! Supported cloud platforms and their service-binding formats

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::descriptor::DerivationError;

/// Cloud platform that brokers Redis credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudPlatform {
    /// IBM Cloud, `databases-for-redis` service bindings
    IbmCloud,
}

/// Connection material extracted from a broker payload
#[derive(Clone, PartialEq)]
pub struct BrokerCredentials {
    pub composed_url: String,
    pub certificate_base64: String,
}

impl fmt::Debug for BrokerCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerCredentials")
            .field("composed_url", &crate::descriptor::redact_url(&self.composed_url))
            .field("certificate_base64", &"<pem>")
            .finish()
    }
}

impl CloudPlatform {
    pub const ALL: [CloudPlatform; 1] = [CloudPlatform::IbmCloud];

    /// Selector literal
    pub fn name(&self) -> &'static str {
        match self {
            CloudPlatform::IbmCloud => "ibmcloud",
        }
    }

    /// Service label under which the Redis binding is published
    pub fn service_label(&self) -> &'static str {
        match self {
            CloudPlatform::IbmCloud => "databases-for-redis",
        }
    }

    /// Extract the composed URL and CA certificate from a raw broker payload
    pub fn extract_credentials(&self, payload: &str) -> Result<BrokerCredentials, DerivationError> {
        let payload: Value =
            serde_json::from_str(payload).map_err(DerivationError::BrokerPayloadParse)?;

        match self {
            CloudPlatform::IbmCloud => ibm::extract(&payload, self.service_label()),
        }
    }
}

impl fmt::Display for CloudPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CloudPlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CloudPlatform::ALL
            .into_iter()
            .find(|platform| platform.name() == s)
            .ok_or_else(|| s.to_string())
    }
}

mod ibm {
    use super::*;

    #[derive(Deserialize)]
    struct Binding {
        credentials: Credentials,
    }

    #[derive(Deserialize)]
    struct Credentials {
        connection: Connection,
    }

    #[derive(Deserialize)]
    struct Connection {
        rediss: Rediss,
    }

    #[derive(Deserialize)]
    struct Rediss {
        composed: Vec<String>,
        certificate: Certificate,
    }

    #[derive(Deserialize)]
    struct Certificate {
        certificate_base64: String,
    }

    pub(super) fn extract(
        payload: &Value,
        label: &'static str,
    ) -> Result<BrokerCredentials, DerivationError> {
        let binding = payload
            .get(label)
            .and_then(Value::as_array)
            .and_then(|bindings| bindings.first())
            .ok_or(DerivationError::NoRedisBindingFound { service: label })?;

        let binding = Binding::deserialize(binding)
            .map_err(|e| DerivationError::MalformedBrokerCredentials(e.to_string()))?;
        let rediss = binding.credentials.connection.rediss;

        let composed_url = rediss
            .composed
            .into_iter()
            .next()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                DerivationError::MalformedBrokerCredentials(
                    "credentials.connection.rediss.composed is empty".to_string(),
                )
            })?;

        if rediss.certificate.certificate_base64.is_empty() {
            return Err(DerivationError::MalformedBrokerCredentials(
                "credentials.connection.rediss.certificate.certificate_base64 is empty".to_string(),
            ));
        }

        Ok(BrokerCredentials {
            composed_url,
            certificate_base64: rediss.certificate.certificate_base64,
        })
    }
}

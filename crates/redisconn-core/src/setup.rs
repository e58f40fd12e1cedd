//! End-to-end setup pipeline
//!
//! Snapshot, resolution, derivation and connection in one place. The
//! `Result`-returning steps are for callers that want the failure; [`Setup::client`]
//! logs it and hands back either a ready handle or nothing.

use redis::aio::ConnectionManager;
use tracing::{debug, error, warn};

use crate::config::ConfigSnapshot;
use crate::descriptor::ConnectionDescriptor;
use crate::error::{Error, Result};
use crate::strategy::{self, Resolution};
use crate::supervisor::{self, ClientHandle, RedisTransport, Transport};

/// One setup attempt over a fixed configuration snapshot
#[derive(Debug, Clone)]
pub struct Setup {
    snapshot: ConfigSnapshot,
}

impl Setup {
    pub fn new(snapshot: ConfigSnapshot) -> Self {
        Self { snapshot }
    }

    /// Setup over the process environment
    pub fn from_env() -> Self {
        Self::new(ConfigSnapshot::load())
    }

    pub fn snapshot(&self) -> &ConfigSnapshot {
        &self.snapshot
    }

    /// Resolve the connection method
    pub fn resolve(&self) -> Result<Resolution> {
        Ok(strategy::resolve(&self.snapshot)?)
    }

    /// Resolve and derive the connection descriptor
    pub async fn descriptor(&self) -> Result<ConnectionDescriptor> {
        let method = self.resolve()?.into_result()?;
        Ok(method.derive(&self.snapshot).await?)
    }

    /// Run the whole pipeline over an arbitrary transport
    pub async fn connect_with<T: Transport>(
        &self,
        transport: &T,
    ) -> Result<ClientHandle<T::Connection>> {
        let descriptor = self.descriptor().await?;
        Ok(supervisor::connect(transport, &descriptor).await?)
    }

    /// Ready Redis client, or `None` after logging why not
    pub async fn client(&self) -> Option<ClientHandle<ConnectionManager>> {
        match self.connect_with(&RedisTransport::new()).await {
            Ok(handle) => {
                debug!(prefix = %handle.key_prefix(), "redis client handle available");
                Some(handle)
            }
            Err(Error::NotConfigured(not_configured)) => {
                warn!(
                    method = %not_configured.method,
                    "redis connection is not configured, no client will be created"
                );
                None
            }
            Err(e) => {
                error!(error = %e, "failed to set up redis connection");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::strategy::ConnectionMethod;

    fn snapshot() -> ConfigSnapshot {
        ConfigSnapshot {
            prefix: Some("app:".into()),
            connection_method: Some("no-auth".into()),
            instance_url: Some("redis://localhost:6379".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_descriptor_for_no_auth() {
        let descriptor = Setup::new(snapshot()).descriptor().await.unwrap();
        assert_eq!(descriptor.method, ConnectionMethod::NoAuth);
        assert_eq!(descriptor.url, "redis://localhost:6379");
        assert_eq!(descriptor.key_prefix(), "app:");
    }

    #[tokio::test]
    async fn test_descriptor_surfaces_not_configured() {
        let setup = Setup::new(ConfigSnapshot {
            instance_url: None,
            ..snapshot()
        });
        assert!(setup.descriptor().await.unwrap_err().is_not_configured());
    }

    #[tokio::test]
    async fn test_descriptor_surfaces_config_error() {
        let setup = Setup::new(ConfigSnapshot {
            prefix: None,
            ..snapshot()
        });
        assert!(matches!(
            setup.descriptor().await,
            Err(Error::Config(ConfigError::PrefixMissing))
        ));
    }

    #[tokio::test]
    async fn test_client_is_none_without_configuration() {
        let setup = Setup::new(ConfigSnapshot::default());
        assert!(setup.client().await.is_none());
    }

    #[tokio::test]
    async fn test_client_is_none_when_not_configured() {
        let setup = Setup::new(ConfigSnapshot {
            connection_method: Some("basic-auth".into()),
            ..snapshot()
        });
        assert!(setup.client().await.is_none());
    }
}

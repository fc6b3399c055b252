//! Construction of authenticated gateways.

use std::sync::Arc;
use std::time::Duration;

use super::{HostingGateway, OctocrabGateway};
use crate::github::error::GitHubError;
use crate::github::locator::PersonalAccessToken;

/// Builds a gateway authenticated with a specific token.
pub trait GatewayFactory: Send + Sync {
    /// Returns a gateway acting as the owner of `token`.
    ///
    /// # Errors
    ///
    /// Returns [`GitHubError`] when the client cannot be constructed.
    fn gateway_for(
        &self,
        token: &PersonalAccessToken,
    ) -> Result<Arc<dyn HostingGateway>, GitHubError>;
}

impl<F> GatewayFactory for F
where
    F: Fn(&PersonalAccessToken) -> Result<Arc<dyn HostingGateway>, GitHubError> + Send + Sync,
{
    fn gateway_for(
        &self,
        token: &PersonalAccessToken,
    ) -> Result<Arc<dyn HostingGateway>, GitHubError> {
        self(token)
    }
}

/// Factory producing [`OctocrabGateway`] instances for one API base.
#[derive(Debug, Clone)]
pub struct OctocrabGatewayFactory {
    api_base: String,
    request_timeout: Duration,
}

impl OctocrabGatewayFactory {
    /// Creates a factory for `api_base` with a per-request timeout.
    #[must_use]
    pub fn new(api_base: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            api_base: api_base.into(),
            request_timeout,
        }
    }
}

impl GatewayFactory for OctocrabGatewayFactory {
    fn gateway_for(
        &self,
        token: &PersonalAccessToken,
    ) -> Result<Arc<dyn HostingGateway>, GitHubError> {
        let gateway = OctocrabGateway::for_token(token, &self.api_base, self.request_timeout)?;
        Ok(Arc::new(gateway))
    }
}

//! Innermost HTTP transport and a small client on top of the user chain

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, Request, Response, Url};
use tracing::debug;

use crate::config::KubeClientConfig;
use crate::error::{TransportError, TransportResult};
use crate::transport::{build_user_chain, CallScope, RoundTripper};

/// Sends requests with a shared `reqwest::Client`.
pub struct ClientTransport {
    client: reqwest::Client,
}

impl ClientTransport {
    /// Build a client honouring the config's timeout and user agent.
    pub fn new(config: &KubeClientConfig) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::ClientBuild(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }
}

#[async_trait]
impl RoundTripper for ClientTransport {
    async fn round_trip(&self, request: &Request, _scope: &CallScope) -> TransportResult<Response> {
        let owned = request
            .try_clone()
            .ok_or_else(|| TransportError::RequestNotCloneable {
                url: request.url().to_string(),
            })?;
        debug!(method = %request.method(), url = %request.url(), "sending request");
        Ok(self.client.execute(owned).await?)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Client for API calls made on behalf of a user.
///
/// One instance (and one transport chain) is shared by every caller; the
/// per-user credential travels with each call in its [`CallScope`].
#[derive(Clone)]
pub struct KubeClient {
    config: KubeClientConfig,
    transport: Arc<dyn RoundTripper>,
}

impl KubeClient {
    /// Client over the standard injection -> capture -> HTTP chain.
    pub fn new(config: KubeClientConfig) -> TransportResult<Self> {
        let base: Arc<dyn RoundTripper> = Arc::new(ClientTransport::new(&config)?);
        Ok(Self {
            transport: build_user_chain(base),
            config,
        })
    }

    /// Client over a caller-assembled chain.
    pub fn with_transport(config: KubeClientConfig, transport: Arc<dyn RoundTripper>) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &KubeClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &Arc<dyn RoundTripper> {
        &self.transport
    }

    /// Build a request for an API path relative to the configured server.
    pub fn request(&self, method: Method, path: &str) -> TransportResult<Request> {
        let raw = self.config.url(path);
        let url = Url::parse(&raw).map_err(|e| TransportError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        Ok(Request::new(method, url))
    }

    /// Send a prepared request through the chain.
    pub async fn send(&self, request: &Request, scope: &CallScope) -> TransportResult<Response> {
        self.transport.round_trip(request, scope).await
    }

    pub async fn get(&self, path: &str, scope: &CallScope) -> TransportResult<Response> {
        let request = self.request(Method::GET, path)?;
        self.send(&request, scope).await
    }
}

impl std::fmt::Debug for KubeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{find_stage, innermost, CaptureStage, InjectionStage};

    #[test]
    fn new_client_wraps_http_transport_in_user_chain() {
        let client = KubeClient::new(KubeClientConfig::new("https://api.example.com")).unwrap();
        let chain = client.transport().as_ref();

        assert!(chain.as_any().is::<InjectionStage>());
        assert!(find_stage::<CaptureStage>(chain).is_some());
        assert!(innermost(chain).as_any().is::<ClientTransport>());
    }

    #[test]
    fn request_resolves_path_against_server() {
        let client = KubeClient::new(KubeClientConfig::new("https://api.example.com/")).unwrap();
        let request = client.request(Method::GET, "/api/v1/pods").unwrap();
        assert_eq!(request.url().as_str(), "https://api.example.com/api/v1/pods");
    }

    #[test]
    fn request_rejects_unparseable_server() {
        let client = KubeClient::new(KubeClientConfig::new("not a url")).unwrap();
        let err = client.request(Method::GET, "/api").unwrap_err();
        assert!(matches!(err, TransportError::InvalidUrl { .. }));
    }
}

//! Credential-aware transport chain
//!
//! Requests to the Kubernetes API (or git hosts) made on behalf of a user
//! travel through a chain of [`RoundTripper`] stages:
//!
//! - [`InjectionStage`] overrides the request's `Authorization` header with
//!   the credential bound to the current call's [`CallScope`], working on a
//!   clone so the caller's request is never modified.
//! - [`CaptureStage`] records the `Authorization` header actually sent and
//!   echoes it back on the response in [`USER_CREDENTIAL_HEADER`].
//!
//! Each stage exposes the transport it wraps ([`RoundTripper::wrapped`]) so
//! callers can walk the chain with [`find_stage`] and [`innermost`]. Stages
//! hold no per-call state and can be shared across concurrent calls.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Request, Response};
use tracing::debug;

use crate::error::{TransportError, TransportResult};

/// Response header carrying the credential the call was sent with.
pub const USER_CREDENTIAL_HEADER: &str = "x-shipyard-user-credential";

/// Per-call request scope.
///
/// Carries the caller-supplied credential for exactly one call. It is read
/// only while the call is in flight and never shared between calls.
#[derive(Clone, Default)]
pub struct CallScope {
    credential: Option<String>,
}

impl CallScope {
    /// Scope with no user credential; the request goes out as built.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Scope overriding the request credential with `credential`
    /// (a full `Authorization` header value, e.g. `Bearer ...`).
    pub fn with_credential(credential: impl Into<String>) -> Self {
        Self {
            credential: Some(credential.into()),
        }
    }

    /// Credential bound to this call, if any.
    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }
}

impl std::fmt::Debug for CallScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallScope")
            .field(
                "credential",
                &self.credential.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// One stage of the transport chain.
///
/// Stages see the request by reference, and the innermost transport
/// ([`crate::ClientTransport`]) sends an owned clone of it. Requests
/// travelling the chain therefore need a buffered body (bytes, text, JSON,
/// form); a streaming body cannot be cloned and fails with
/// [`TransportError::RequestNotCloneable`] whether or not a credential is
/// injected.
#[async_trait]
pub trait RoundTripper: Send + Sync + 'static {
    /// Send `request` and return the response.
    ///
    /// Stages must not mutate `request`; a stage that needs a different
    /// request delegates a clone.
    async fn round_trip(&self, request: &Request, scope: &CallScope) -> TransportResult<Response>;

    /// Transport this stage delegates to; `None` for the innermost transport.
    fn wrapped(&self) -> Option<&dyn RoundTripper> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// First stage of type `T` found walking inwards from `transport`.
pub fn find_stage<T: RoundTripper>(transport: &dyn RoundTripper) -> Option<&T> {
    let mut current = Some(transport);
    while let Some(stage) = current {
        if let Some(found) = stage.as_any().downcast_ref::<T>() {
            return Some(found);
        }
        current = stage.wrapped();
    }
    None
}

/// The transport at the bottom of the chain.
pub fn innermost(transport: &dyn RoundTripper) -> &dyn RoundTripper {
    let mut current = transport;
    while let Some(inner) = current.wrapped() {
        current = inner;
    }
    current
}

/// Wrap `base` as injection -> capture -> base, so the captured credential
/// is the one actually sent.
pub fn build_user_chain(base: Arc<dyn RoundTripper>) -> Arc<dyn RoundTripper> {
    Arc::new(InjectionStage::new(Arc::new(CaptureStage::new(base))))
}

/// Credential echoed on a response by a [`CaptureStage`].
pub fn credential_used(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(USER_CREDENTIAL_HEADER)
        .and_then(|v| v.to_str().ok())
}

// ---------------------------------------------------------------------------
// CaptureStage
// ---------------------------------------------------------------------------

/// Echoes the request's `Authorization` header on the response.
///
/// If the wrapped transport fails there is no response, and the error is
/// returned untouched.
pub struct CaptureStage {
    inner: Arc<dyn RoundTripper>,
}

impl CaptureStage {
    pub fn new(inner: Arc<dyn RoundTripper>) -> Self {
        Self { inner }
    }

    /// Shared handle to the wrapped transport, for bypassing this stage.
    pub fn inner(&self) -> Arc<dyn RoundTripper> {
        Arc::clone(&self.inner)
    }
}

#[async_trait]
impl RoundTripper for CaptureStage {
    async fn round_trip(&self, request: &Request, scope: &CallScope) -> TransportResult<Response> {
        let mut captured = request
            .headers()
            .get(AUTHORIZATION)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(""));
        captured.set_sensitive(true);

        let mut response = self.inner.round_trip(request, scope).await?;
        response
            .headers_mut()
            .insert(HeaderName::from_static(USER_CREDENTIAL_HEADER), captured);
        Ok(response)
    }

    fn wrapped(&self) -> Option<&dyn RoundTripper> {
        Some(self.inner.as_ref())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// ---------------------------------------------------------------------------
// InjectionStage
// ---------------------------------------------------------------------------

/// Overrides `Authorization` with the call scope's credential.
///
/// Without a scoped credential the original request is forwarded as is.
pub struct InjectionStage {
    inner: Arc<dyn RoundTripper>,
}

impl InjectionStage {
    pub fn new(inner: Arc<dyn RoundTripper>) -> Self {
        Self { inner }
    }

    /// Shared handle to the wrapped transport, for bypassing this stage.
    pub fn inner(&self) -> Arc<dyn RoundTripper> {
        Arc::clone(&self.inner)
    }
}

#[async_trait]
impl RoundTripper for InjectionStage {
    async fn round_trip(&self, request: &Request, scope: &CallScope) -> TransportResult<Response> {
        let Some(credential) = scope.credential() else {
            return self.inner.round_trip(request, scope).await;
        };

        let mut value =
            HeaderValue::from_str(credential).map_err(|_| TransportError::InvalidCredential {
                url: request.url().to_string(),
            })?;
        value.set_sensitive(true);

        let mut scoped = request
            .try_clone()
            .ok_or_else(|| TransportError::RequestNotCloneable {
                url: request.url().to_string(),
            })?;
        scoped.headers_mut().insert(AUTHORIZATION, value);
        debug!(method = %request.method(), url = %request.url(), "injected scoped credential");

        self.inner.round_trip(&scoped, scope).await
    }

    fn wrapped(&self) -> Option<&dyn RoundTripper> {
        Some(self.inner.as_ref())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unreachable;

    #[async_trait]
    impl RoundTripper for Unreachable {
        async fn round_trip(
            &self,
            request: &Request,
            _scope: &CallScope,
        ) -> TransportResult<Response> {
            Err(TransportError::Http(format!("unreachable: {}", request.url())))
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn request() -> Request {
        let url = reqwest::Url::parse("https://api.example.com/api/v1/namespaces").expect("url");
        Request::new(reqwest::Method::GET, url)
    }

    #[test]
    fn call_scope_debug_redacts_credential() {
        let scope = CallScope::with_credential("Bearer topsecret");
        let out = format!("{:?}", scope);
        assert!(!out.contains("topsecret"));
        assert_eq!(scope.credential(), Some("Bearer topsecret"));
        assert_eq!(CallScope::anonymous().credential(), None);
    }

    #[test]
    fn chain_can_be_walked_to_each_stage() {
        let chain = build_user_chain(Arc::new(Unreachable));

        assert!(find_stage::<InjectionStage>(chain.as_ref()).is_some());
        let capture = find_stage::<CaptureStage>(chain.as_ref()).expect("capture stage");
        assert!(capture.inner().as_any().is::<Unreachable>());
        assert!(innermost(chain.as_ref()).as_any().is::<Unreachable>());
    }

    #[test]
    fn find_stage_misses_absent_stage() {
        let chain: Arc<dyn RoundTripper> = Arc::new(CaptureStage::new(Arc::new(Unreachable)));
        assert!(find_stage::<InjectionStage>(chain.as_ref()).is_none());
    }

    #[tokio::test]
    async fn invalid_credential_is_rejected_before_delegating() {
        let stage = InjectionStage::new(Arc::new(Unreachable));
        let err = stage
            .round_trip(&request(), &CallScope::with_credential("bad\nvalue"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidCredential { .. }));
    }

    #[tokio::test]
    async fn capture_passes_errors_through() {
        let stage = CaptureStage::new(Arc::new(Unreachable));
        let err = stage
            .round_trip(&request(), &CallScope::anonymous())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unreachable: https://api.example.com"));
    }
}

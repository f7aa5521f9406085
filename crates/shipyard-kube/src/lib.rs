//! Shipyard-Kube: credential-aware HTTP transport
//!
//! Calls to the Kubernetes API made on behalf of a user share one client and
//! one transport chain. The user's credential travels with each call in a
//! [`CallScope`]; [`InjectionStage`] puts it on the wire and
//! [`CaptureStage`] reports back which credential was actually sent.
//!
//! ## Layer 3 - Transport
//!
//! Focus: per-call credentials without shared mutable state.

pub mod client;
pub mod config;
pub mod error;
pub mod transport;

pub use client::{ClientTransport, KubeClient};
pub use config::KubeClientConfig;
pub use error::{TransportError, TransportResult};
pub use transport::{
    build_user_chain, credential_used, find_stage, innermost, CallScope, CaptureStage,
    InjectionStage, RoundTripper, USER_CREDENTIAL_HEADER,
};

//! Shipyard Core Library
//!
//! Resolves Helm chart subscriptions to pinned versions and applies
//! promotion mechanisms (render service, Kustomize) against an
//! Environment's state.

pub mod charts;
pub mod config;
pub mod domain;
pub mod fakes;
pub mod obs;
pub mod promotion;
pub mod telemetry;

pub use charts::{
    latest_satisfying, ChartRegistry, ChartVersion, ChartVersionResolver, ConstraintError,
    VersionConstraint,
};
pub use config::PromotionConfig;
pub use domain::{
    BoxError, Chart, ChartSubscription, EnvironmentState, ErrorKind, GitCommit, Image,
    KustomizeImageUpdate, KustomizeMechanism, PromotionError, PromotionMechanism,
    PromotionResult, RepoUpdate,
};
pub use obs::{
    emit_charts_resolved, emit_promotion_failed, emit_promotion_finished,
    emit_promotion_started, emit_update_applied, promotion_span,
};
pub use promotion::{
    ActionTaken, ImageSetter, KustomizeCli, PromotionApplier, PromotionOutcome, RenderOutcome,
    RenderRequest, RenderResponse, RenderService,
};
pub use telemetry::{init_tracing, init_tracing_from_env, LogFormat, TelemetryConfig};

pub use shipyard_credentials::{CredentialStore, CredentialType, Credentials};

/// Shipyard version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

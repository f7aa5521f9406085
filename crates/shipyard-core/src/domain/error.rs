//! Promotion error taxonomy.
//!
//! Every variant names the resource it concerns (registry, chart,
//! repository, branch or path) so operators can act on the message alone.

use shipyard_credentials::{CredentialError, CredentialType};

/// Error returned by external collaborators (registries, render service,
/// image setters).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Broad classification of a [`PromotionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is wrong; retrying will not help.
    Validation,
    /// Nothing satisfies the request.
    NotFound,
    /// The credential store could not be queried.
    Credential,
    /// A registry, render service or tool failed.
    Upstream,
}

/// Errors produced by chart resolution and promotion application.
#[derive(Debug, thiserror::Error)]
pub enum PromotionError {
    #[error(
        "invalid update specified; cannot write to branch {branch:?} of repo {repo_url:?} \
         because it will form a subscription loop"
    )]
    SubscriptionLoop { repo_url: String, branch: String },

    #[error("invalid update specified for repo {repo_url:?}: {reason}")]
    InvalidUpdate { repo_url: String, reason: String },

    #[error("invalid semver constraint {constraint:?} for chart {chart:?} in registry {registry_url:?}: {reason}")]
    InvalidConstraint {
        registry_url: String,
        chart: String,
        constraint: String,
        reason: String,
    },

    #[error("found no suitable version of chart {chart:?} in registry {registry_url:?}")]
    NoSuitableVersion { registry_url: String, chart: String },

    #[error("error obtaining credentials for {} {key:?}: {source}", repo_noun(.cred_type))]
    Credentials {
        cred_type: CredentialType,
        key: String,
        #[source]
        source: CredentialError,
    },

    #[error("error searching for latest version of chart {chart:?} in registry {registry_url:?}: {source}")]
    Registry {
        registry_url: String,
        chart: String,
        #[source]
        source: BoxError,
    },

    #[error("error rendering manifests via render service for repo {repo_url:?} (branch {branch:?}): {source}")]
    Render {
        repo_url: String,
        branch: String,
        #[source]
        source: BoxError,
    },

    #[error("error updating image {image:?} to tag {tag:?} in {path}/kustomization.yaml: {source}")]
    Kustomize {
        path: String,
        image: String,
        tag: String,
        #[source]
        source: BoxError,
    },
}

impl PromotionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PromotionError::SubscriptionLoop { .. }
            | PromotionError::InvalidUpdate { .. }
            | PromotionError::InvalidConstraint { .. } => ErrorKind::Validation,
            PromotionError::NoSuitableVersion { .. } => ErrorKind::NotFound,
            PromotionError::Credentials { .. } => ErrorKind::Credential,
            PromotionError::Registry { .. }
            | PromotionError::Render { .. }
            | PromotionError::Kustomize { .. } => ErrorKind::Upstream,
        }
    }
}

fn repo_noun(cred_type: &CredentialType) -> &'static str {
    match cred_type {
        CredentialType::Git => "git repo",
        CredentialType::Helm => "chart registry",
        CredentialType::Image => "image repo",
    }
}

/// Result type for promotion operations.
pub type PromotionResult<T> = std::result::Result<T, PromotionError>;

//! Manifest render service boundary.
//!
//! The render service takes a source commit plus image overrides, renders
//! the manifests, and commits the result to a target branch. Shipyard only
//! drives it; the rendering itself happens elsewhere.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shipyard_credentials::Credentials;

use crate::domain::{BoxError, Image};

/// What the render service did with the rendered manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTaken {
    /// Committed straight to the target branch.
    PushedDirectly,
    /// Opened a pull request against the target branch.
    OpenedProposal,
    /// Rendered output matched the branch; nothing committed.
    None,
}

/// Input for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub repo_url: String,
    pub target_branch: String,
    /// Source commit to render from.
    pub commit_id: String,
    /// Images to substitute while rendering.
    pub images: Vec<Image>,
    pub credentials: Option<Credentials>,
}

/// Result of one render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderResponse {
    pub action_taken: ActionTaken,
    /// Commit id on the target branch after the render.
    pub commit_id: String,
}

/// Renders manifests and commits them to a branch.
#[async_trait]
pub trait RenderService: Send + Sync {
    async fn render_manifests(&self, request: RenderRequest) -> Result<RenderResponse, BoxError>;
}

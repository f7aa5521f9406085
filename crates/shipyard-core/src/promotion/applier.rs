//! Promotion mechanism application.
//!
//! [`PromotionApplier`] walks a list of [`RepoUpdate`]s in order and applies
//! each one's mechanism against the Environment's state. Update N sees the
//! state produced by updates 1..N-1.
//!
//! Application is all-or-nothing: work happens on a private copy of the
//! caller's state, and the copy is only handed back when every update
//! succeeded. On error the caller keeps its original state and receives no
//! change summary.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shipyard_credentials::{CredentialStore, CredentialType};
use tracing::{debug, warn, Instrument};

use crate::config::PromotionConfig;
use crate::domain::{
    EnvironmentState, KustomizeMechanism, PromotionError, PromotionMechanism, PromotionResult,
    RepoUpdate,
};
use crate::obs::{
    emit_promotion_failed, emit_promotion_finished, emit_promotion_started,
    emit_update_applied, promotion_span,
};
use crate::promotion::kustomize::ImageSetter;
use crate::promotion::render::{ActionTaken, RenderRequest, RenderService};

/// Structural record of one render-mechanism update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOutcome {
    pub repo_url: String,
    pub branch: String,
    pub action_taken: ActionTaken,
    pub commit_id: String,
}

/// Result of a successful [`PromotionApplier::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionOutcome {
    /// New Environment state.
    pub state: EnvironmentState,
    /// Human-readable lines describing local changes (Kustomize edits).
    pub change_summary: Vec<String>,
    /// Render-service results, in update order.
    pub render_outcomes: Vec<RenderOutcome>,
}

/// Applies promotion mechanisms against an Environment's state.
///
/// Collaborators are injected at construction; callers are expected to run
/// at most one `apply` per Environment at a time.
pub struct PromotionApplier {
    credentials: Arc<dyn CredentialStore>,
    renderer: Arc<dyn RenderService>,
    image_setter: Arc<dyn ImageSetter>,
    config: PromotionConfig,
}

impl PromotionApplier {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        renderer: Arc<dyn RenderService>,
        image_setter: Arc<dyn ImageSetter>,
        config: PromotionConfig,
    ) -> Self {
        Self {
            credentials,
            renderer,
            image_setter,
            config,
        }
    }

    /// Apply `updates` in order against `current`.
    ///
    /// `current` is never modified. The first failing update aborts the
    /// whole call.
    pub async fn apply(
        &self,
        namespace: &str,
        current: &EnvironmentState,
        updates: &[RepoUpdate],
    ) -> PromotionResult<PromotionOutcome> {
        self.apply_updates(namespace, current, updates)
            .instrument(promotion_span(namespace))
            .await
    }

    async fn apply_updates(
        &self,
        namespace: &str,
        current: &EnvironmentState,
        updates: &[RepoUpdate],
    ) -> PromotionResult<PromotionOutcome> {
        emit_promotion_started(namespace, updates.len());

        let mut state = current.clone();
        let mut change_summary = Vec::new();
        let mut render_outcomes = Vec::new();

        for (index, update) in updates.iter().enumerate() {
            let step = match &update.mechanism {
                PromotionMechanism::None => Ok(()),
                PromotionMechanism::Kustomize(mechanism) => {
                    let applied = self
                        .apply_kustomize(&update.repo_url, &state, mechanism)
                        .await;
                    applied.map(|lines| change_summary.extend(lines))
                }
                PromotionMechanism::Render => {
                    let rendered = self.apply_render(namespace, &state, update).await;
                    rendered.map(|(next, outcome)| {
                        state = next;
                        render_outcomes.push(outcome);
                    })
                }
            };
            if let Err(err) = step {
                emit_promotion_failed(namespace, index, &update.repo_url, &err);
                return Err(err);
            }
            emit_update_applied(namespace, index, &update.repo_url, update.mechanism.name());
        }

        emit_promotion_finished(namespace, updates.len(), change_summary.len());
        Ok(PromotionOutcome {
            state,
            change_summary,
            render_outcomes,
        })
    }

    /// Run `kustomize edit set image` for each declared image and describe
    /// the edits. Does not touch the state.
    ///
    /// Every declared path must stay inside the working directory; if one
    /// does not, no image is set.
    pub async fn apply_kustomize(
        &self,
        repo_url: &str,
        state: &EnvironmentState,
        mechanism: &KustomizeMechanism,
    ) -> PromotionResult<Vec<String>> {
        let dirs = mechanism
            .images
            .iter()
            .map(|image_update| {
                self.config
                    .resolve(&image_update.path)
                    .ok_or_else(|| PromotionError::InvalidUpdate {
                        repo_url: repo_url.to_string(),
                        reason: format!(
                            "kustomize path {:?} escapes the working directory",
                            image_update.path
                        ),
                    })
            })
            .collect::<PromotionResult<Vec<_>>>()?;

        let mut changes = Vec::with_capacity(mechanism.images.len());
        for (image_update, dir) in mechanism.images.iter().zip(dirs) {
            let Some(image) = state.image_for(&image_update.image) else {
                warn!(
                    image = %image_update.image,
                    path = %image_update.path,
                    "no image in state matches kustomize update; skipping"
                );
                continue;
            };
            let path = image_update.path.trim_end_matches('/');

            self.image_setter
                .set_image(&dir, &image.repo_url, &image.tag)
                .await
                .map_err(|source| PromotionError::Kustomize {
                    path: path.to_string(),
                    image: image.repo_url.clone(),
                    tag: image.tag.clone(),
                    source,
                })?;

            debug!(path = %path, image = %image.reference(), "updated kustomization image");
            changes.push(format!(
                "updated {}/kustomization.yaml to use image {}:{}",
                path, image.repo_url, image.tag
            ));
        }
        Ok(changes)
    }

    /// Render manifests for `update.repo_url` into `update.write_branch` and
    /// return a copy of `state` whose matching commit records the rendered
    /// commit as its health-check commit.
    pub async fn apply_render(
        &self,
        namespace: &str,
        state: &EnvironmentState,
        update: &RepoUpdate,
    ) -> PromotionResult<(EnvironmentState, RenderOutcome)> {
        if update.forms_subscription_loop(state) {
            return Err(PromotionError::SubscriptionLoop {
                repo_url: update.repo_url.clone(),
                branch: update.write_branch.clone(),
            });
        }
        if update.write_branch.is_empty() {
            return Err(PromotionError::InvalidUpdate {
                repo_url: update.repo_url.clone(),
                reason: "render mechanism requires a write branch".to_string(),
            });
        }
        let commit = state
            .commit_for(&update.repo_url)
            .ok_or_else(|| PromotionError::InvalidUpdate {
                repo_url: update.repo_url.clone(),
                reason: "state has no commit for this repo to render from".to_string(),
            })?;

        let credentials = self
            .credentials
            .get(namespace, CredentialType::Git, &update.repo_url)
            .await
            .map_err(|source| PromotionError::Credentials {
                cred_type: CredentialType::Git,
                key: update.repo_url.clone(),
                source,
            })?;
        if credentials.is_none() {
            debug!(repo = %update.repo_url, "found no credentials for git repo");
        }

        let request = RenderRequest {
            repo_url: update.repo_url.clone(),
            target_branch: update.write_branch.clone(),
            commit_id: commit.id.clone(),
            images: state.images.clone(),
            credentials,
        };
        let response = self
            .renderer
            .render_manifests(request)
            .await
            .map_err(|source| PromotionError::Render {
                repo_url: update.repo_url.clone(),
                branch: update.write_branch.clone(),
                source,
            })?;
        debug!(
            repo = %update.repo_url,
            branch = %update.write_branch,
            action = ?response.action_taken,
            commit = %response.commit_id,
            "rendered manifests"
        );

        let next = state
            .with_health_check_commit(&update.repo_url, &response.commit_id)
            .ok_or_else(|| PromotionError::InvalidUpdate {
                repo_url: update.repo_url.clone(),
                reason: "state has no commit for this repo to render from".to_string(),
            })?;

        Ok((
            next,
            RenderOutcome {
                repo_url: update.repo_url.clone(),
                branch: update.write_branch.clone(),
                action_taken: response.action_taken,
                commit_id: response.commit_id,
            },
        ))
    }
}

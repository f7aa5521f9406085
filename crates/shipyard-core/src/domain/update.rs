//! Subscriptions and per-repository promotion updates.

use serde::{Deserialize, Serialize};

use crate::domain::state::EnvironmentState;

/// Declared Helm chart source.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSubscription {
    pub registry_url: String,
    pub name: String,
    /// Version constraint; empty means "latest available".
    #[serde(default)]
    pub semver_constraint: String,
}

impl ChartSubscription {
    pub fn new(
        registry_url: impl Into<String>,
        name: impl Into<String>,
        semver_constraint: impl Into<String>,
    ) -> Self {
        Self {
            registry_url: registry_url.into(),
            name: name.into(),
            semver_constraint: semver_constraint.into(),
        }
    }
}

/// One image to substitute in a kustomization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KustomizeImageUpdate {
    /// Image repository; matched against the state's images.
    pub image: String,
    /// Directory containing `kustomization.yaml`, relative to the work dir.
    pub path: String,
}

/// Kustomize-based promotion: `kustomize edit set image` per entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KustomizeMechanism {
    #[serde(default)]
    pub images: Vec<KustomizeImageUpdate>,
}

/// How an update propagates state into a repository.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromotionMechanism {
    /// Nothing to do for this repository.
    #[default]
    None,
    /// Render manifests through the render service and commit them to the
    /// write branch.
    Render,
    /// Substitute image tags in local kustomizations.
    Kustomize(KustomizeMechanism),
}

impl PromotionMechanism {
    pub fn name(&self) -> &'static str {
        match self {
            PromotionMechanism::None => "none",
            PromotionMechanism::Render => "render",
            PromotionMechanism::Kustomize(_) => "kustomize",
        }
    }
}

/// A promotion update targeting one git repository.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoUpdate {
    pub repo_url: String,
    #[serde(default)]
    pub write_branch: String,
    #[serde(default)]
    pub mechanism: PromotionMechanism,
}

impl RepoUpdate {
    pub fn new(
        repo_url: impl Into<String>,
        write_branch: impl Into<String>,
        mechanism: PromotionMechanism,
    ) -> Self {
        Self {
            repo_url: repo_url.into(),
            write_branch: write_branch.into(),
            mechanism,
        }
    }

    /// Writing to a branch the Environment also reads from would re-trigger
    /// the Environment on its own output.
    pub fn forms_subscription_loop(&self, state: &EnvironmentState) -> bool {
        state.reads_branch(&self.repo_url, &self.write_branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::GitCommit;

    #[test]
    fn loop_detected_only_for_same_repo_and_branch() {
        let state = EnvironmentState {
            commits: vec![GitCommit {
                repo_url: "https://git.example.com/app".to_string(),
                branch: "main".to_string(),
                id: "abc".to_string(),
                health_check_commit: None,
            }],
            ..Default::default()
        };

        let looping =
            RepoUpdate::new("https://git.example.com/app", "main", PromotionMechanism::Render);
        assert!(looping.forms_subscription_loop(&state));

        let other_branch =
            RepoUpdate::new("https://git.example.com/app", "env/prod", PromotionMechanism::Render);
        assert!(!other_branch.forms_subscription_loop(&state));

        let other_repo =
            RepoUpdate::new("https://git.example.com/infra", "main", PromotionMechanism::Render);
        assert!(!other_repo.forms_subscription_loop(&state));
    }

    #[test]
    fn mechanism_is_tagged_in_json() {
        let update: RepoUpdate = serde_json::from_value(serde_json::json!({
            "repoUrl": "https://git.example.com/app",
            "writeBranch": "env/dev",
            "mechanism": {
                "type": "kustomize",
                "images": [{ "image": "ghcr.io/example/app", "path": "overlays/dev" }]
            }
        }))
        .expect("deserialize");

        match update.mechanism {
            PromotionMechanism::Kustomize(ref k) => assert_eq!(k.images.len(), 1),
            ref other => panic!("unexpected mechanism {}", other.name()),
        }

        let none: RepoUpdate = serde_json::from_value(serde_json::json!({
            "repoUrl": "https://git.example.com/app"
        }))
        .expect("deserialize");
        assert_eq!(none.mechanism, PromotionMechanism::None);
    }
}

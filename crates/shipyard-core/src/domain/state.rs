//! Environment state snapshots.
//!
//! An [`EnvironmentState`] records what is currently promoted into an
//! Environment. States are plain values: every operation that "updates" a
//! state returns a new one and leaves its input untouched, so the caller can
//! compare old and new or discard the new one on failure.

use serde::{Deserialize, Serialize};

/// A git commit the Environment is subscribed to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitCommit {
    /// Repository the commit was read from.
    pub repo_url: String,
    /// Branch the commit was read from.
    #[serde(default)]
    pub branch: String,
    /// Commit id (SHA).
    pub id: String,
    /// Commit produced by rendering this commit's manifests, if any.
    /// Health checks should track this commit instead of `id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_check_commit: Option<String>,
}

/// A container image at a specific tag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub repo_url: String,
    pub tag: String,
}

impl Image {
    pub fn new(repo_url: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            repo_url: repo_url.into(),
            tag: tag.into(),
        }
    }

    /// `repo:tag` reference.
    pub fn reference(&self) -> String {
        format!("{}:{}", self.repo_url, self.tag)
    }
}

/// A Helm chart pinned to a concrete version.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub registry_url: String,
    pub name: String,
    pub version: String,
}

/// Snapshot of everything promoted into an Environment.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnvironmentState {
    #[serde(default)]
    pub commits: Vec<GitCommit>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub charts: Vec<Chart>,
}

impl EnvironmentState {
    /// First commit read from `repo_url`.
    pub fn commit_for(&self, repo_url: &str) -> Option<&GitCommit> {
        self.commits.iter().find(|c| c.repo_url == repo_url)
    }

    /// First image whose repository is `repo_url`.
    pub fn image_for(&self, repo_url: &str) -> Option<&Image> {
        self.images.iter().find(|i| i.repo_url == repo_url)
    }

    /// Whether any commit of `repo_url` is read from `branch`.
    pub fn reads_branch(&self, repo_url: &str, branch: &str) -> bool {
        self.commits
            .iter()
            .any(|c| c.repo_url == repo_url && c.branch == branch)
    }

    /// Copy of this state with its charts replaced.
    pub fn with_charts(&self, charts: Vec<Chart>) -> Self {
        Self {
            charts,
            ..self.clone()
        }
    }

    /// Copy of this state with `health_check_commit` set on the first commit
    /// of `repo_url`. Returns `None` when no such commit exists.
    pub fn with_health_check_commit(&self, repo_url: &str, commit_id: &str) -> Option<Self> {
        let index = self.commits.iter().position(|c| c.repo_url == repo_url)?;
        let mut next = self.clone();
        next.commits[index].health_check_commit = Some(commit_id.to_string());
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EnvironmentState {
        EnvironmentState {
            commits: vec![
                GitCommit {
                    repo_url: "https://git.example.com/app".to_string(),
                    branch: "main".to_string(),
                    id: "abc123".to_string(),
                    health_check_commit: None,
                },
                GitCommit {
                    repo_url: "https://git.example.com/infra".to_string(),
                    branch: "main".to_string(),
                    id: "def456".to_string(),
                    health_check_commit: None,
                },
            ],
            images: vec![Image::new("ghcr.io/example/app", "1.4.0")],
            charts: vec![],
        }
    }

    #[test]
    fn with_health_check_commit_leaves_original_untouched() {
        let original = sample();
        let next = original
            .with_health_check_commit("https://git.example.com/infra", "rendered-1")
            .expect("commit exists");

        assert_eq!(original, sample());
        assert_eq!(
            next.commits[1].health_check_commit.as_deref(),
            Some("rendered-1")
        );
        assert_eq!(next.commits[0], original.commits[0]);
        assert_eq!(next.images, original.images);
    }

    #[test]
    fn with_health_check_commit_unknown_repo_is_none() {
        assert!(sample()
            .with_health_check_commit("https://git.example.com/nope", "x")
            .is_none());
    }

    #[test]
    fn reads_branch_requires_matching_repo() {
        let state = sample();
        assert!(state.reads_branch("https://git.example.com/app", "main"));
        assert!(!state.reads_branch("https://git.example.com/other", "main"));
        assert!(!state.reads_branch("https://git.example.com/app", "env/prod"));
    }

    #[test]
    fn image_reference_joins_repo_and_tag() {
        assert_eq!(
            Image::new("ghcr.io/example/app", "1.4.0").reference(),
            "ghcr.io/example/app:1.4.0"
        );
    }

    #[test]
    fn state_serializes_with_camel_case_fields() {
        let json = serde_json::to_value(sample()).expect("serialize");
        assert_eq!(json["commits"][0]["repoUrl"], "https://git.example.com/app");
        assert!(json["commits"][0].get("healthCheckCommit").is_none());
    }
}

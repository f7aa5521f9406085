//! Kustomize image substitution.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::BoxError;

/// Sets an image tag in the `kustomization.yaml` found in a directory.
#[async_trait]
pub trait ImageSetter: Send + Sync {
    async fn set_image(&self, dir: &Path, repo_url: &str, tag: &str) -> Result<(), BoxError>;
}

/// [`ImageSetter`] backed by the `kustomize` binary
/// (`kustomize edit set image <repo>=<repo>:<tag>`).
#[derive(Debug, Clone)]
pub struct KustomizeCli {
    binary: PathBuf,
}

impl Default for KustomizeCli {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("kustomize"),
        }
    }
}

impl KustomizeCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `kustomize` binary instead of the one on `PATH`.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait]
impl ImageSetter for KustomizeCli {
    async fn set_image(&self, dir: &Path, repo_url: &str, tag: &str) -> Result<(), BoxError> {
        let mapping = format!("{repo_url}={repo_url}:{tag}");
        debug!(dir = %dir.display(), image = %mapping, "running kustomize edit set image");

        let output = Command::new(&self.binary)
            .args(["edit", "set", "image", &mapping])
            .current_dir(dir)
            .output()
            .await
            .map_err(|e| format!("failed to run {}: {e}", self.binary.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!("kustomize edit set image failed: {}", stderr.trim()).into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cli = KustomizeCli::with_binary("shipyard-no-such-kustomize");
        let err = cli
            .set_image(dir.path(), "ghcr.io/example/app", "1.0.0")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("shipyard-no-such-kustomize"));
    }
}

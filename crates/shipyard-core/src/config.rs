//! Promotion configuration.

use std::path::{Component, Path, PathBuf};

/// Environment variable naming the working directory for local mechanisms.
pub const WORK_DIR_ENV: &str = "SHIPYARD_WORK_DIR";

/// Settings for [`crate::promotion::PromotionApplier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionConfig {
    /// Checked-out repository that Kustomize paths are resolved against.
    pub work_dir: PathBuf,
}

impl Default for PromotionConfig {
    fn default() -> Self {
        PromotionConfig {
            work_dir: std::env::var(WORK_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl PromotionConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Config rooted at a specific working directory
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        PromotionConfig {
            work_dir: work_dir.into(),
        }
    }

    /// Location of a declared path inside the working directory.
    ///
    /// Absolute paths are taken relative to the working directory, so
    /// `/overlays/dev` and `overlays/dev` name the same place. `..` may
    /// step back out of a subdirectory but never above the working
    /// directory; such paths return `None`.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let mut relative = PathBuf::new();
        for component in Path::new(path).components() {
            match component {
                Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
                Component::ParentDir => {
                    if !relative.pop() {
                        return None;
                    }
                }
                Component::Normal(part) => relative.push(part),
            }
        }
        Some(self.work_dir.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_joins_relative_paths() {
        let config = PromotionConfig::new("/checkout");
        assert_eq!(
            config.resolve("overlays/dev"),
            Some(PathBuf::from("/checkout/overlays/dev"))
        );
        assert_eq!(
            config.resolve("./overlays/dev/"),
            Some(PathBuf::from("/checkout/overlays/dev"))
        );
        assert_eq!(config.resolve(""), Some(PathBuf::from("/checkout")));
    }

    #[test]
    fn resolve_keeps_absolute_paths_under_work_dir() {
        let config = PromotionConfig::new("/checkout");
        assert_eq!(
            config.resolve("/abs/dir"),
            Some(PathBuf::from("/checkout/abs/dir"))
        );
    }

    #[test]
    fn resolve_rejects_paths_climbing_out_of_work_dir() {
        let config = PromotionConfig::new("/checkout");
        assert_eq!(
            config.resolve("overlays/../base"),
            Some(PathBuf::from("/checkout/base"))
        );
        assert_eq!(config.resolve("../etc"), None);
        assert_eq!(config.resolve("overlays/../../etc"), None);
        assert_eq!(config.resolve("/../etc"), None);
    }
}

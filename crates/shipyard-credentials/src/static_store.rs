//! File-backed credential store
//!
//! Loads a JSON document of credential entries once and serves lookups from
//! memory. Useful for local runs and for controllers that mount a secret as
//! a file:
//!
//! ```json
//! {
//!   "entries": [
//!     { "namespace": "team-a", "type": "git",
//!       "repo": "https://github.com/example/deploy",
//!       "username": "bot", "password": "token" }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{CredentialError, CredentialResult};
use crate::store::{CredentialStore, CredentialType, Credentials};

/// Environment variable naming the credentials file.
pub const CREDENTIALS_FILE_ENV: &str = "SHIPYARD_CREDENTIALS_FILE";

#[derive(Debug, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    entries: Vec<CredentialEntry>,
}

#[derive(Deserialize)]
struct CredentialEntry {
    namespace: String,
    #[serde(rename = "type")]
    cred_type: CredentialType,
    repo: String,
    username: String,
    password: String,
}

impl std::fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialEntry")
            .field("namespace", &self.namespace)
            .field("cred_type", &self.cred_type)
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

/// Normalise a repository key so equivalent git URLs share an entry.
///
/// Git URLs drop a trailing `/` and `.git` suffix; other types only drop
/// the trailing `/`.
pub fn normalize_repo_key(cred_type: CredentialType, repo_key: &str) -> String {
    let trimmed = repo_key.trim().trim_end_matches('/');
    match cred_type {
        CredentialType::Git => trimmed.trim_end_matches(".git").to_string(),
        CredentialType::Helm | CredentialType::Image => trimmed.to_string(),
    }
}

/// Read-only credential store loaded from a JSON document.
#[derive(Debug, Default)]
pub struct StaticCredentialStore {
    entries: HashMap<(String, CredentialType, String), Credentials>,
}

impl StaticCredentialStore {
    /// Parse a JSON credential document.
    pub fn from_json(json: &str) -> CredentialResult<Self> {
        let file: CredentialFile = serde_json::from_str(json)?;
        let mut entries = HashMap::with_capacity(file.entries.len());
        for entry in file.entries {
            if entry.username.is_empty() && entry.password.is_empty() {
                return Err(CredentialError::Malformed {
                    key: entry.repo,
                    reason: "username and password are both empty".to_string(),
                });
            }
            let key = normalize_repo_key(entry.cred_type, &entry.repo);
            entries.insert(
                (entry.namespace, entry.cred_type, key),
                Credentials::new(entry.username, entry.password),
            );
        }
        debug!(entries = entries.len(), "loaded static credentials");
        Ok(Self { entries })
    }

    /// Load a JSON credential document from disk.
    pub async fn load(path: &Path) -> CredentialResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::from_json(&content)
    }

    /// Load from the file named by `SHIPYARD_CREDENTIALS_FILE`.
    ///
    /// Returns an empty store when the variable is unset.
    pub async fn from_env() -> CredentialResult<Self> {
        match std::env::var(CREDENTIALS_FILE_ENV) {
            Ok(path) => Self::load(Path::new(&path)).await,
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CredentialStore for StaticCredentialStore {
    async fn get(
        &self,
        namespace: &str,
        cred_type: CredentialType,
        repo_key: &str,
    ) -> CredentialResult<Option<Credentials>> {
        let key = (
            namespace.to_string(),
            cred_type,
            normalize_repo_key(cred_type, repo_key),
        );
        Ok(self.entries.get(&key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "entries": [
            { "namespace": "team-a", "type": "git",
              "repo": "https://github.com/example/deploy.git",
              "username": "bot", "password": "token" },
            { "namespace": "team-a", "type": "helm",
              "repo": "https://charts.example.com/",
              "username": "reader", "password": "s3cret" }
        ]
    }"#;

    #[test]
    fn normalize_strips_git_suffix_only_for_git() {
        assert_eq!(
            normalize_repo_key(CredentialType::Git, "https://h/x/repo.git/"),
            "https://h/x/repo"
        );
        assert_eq!(
            normalize_repo_key(CredentialType::Helm, "https://h/charts.git/"),
            "https://h/charts.git"
        );
    }

    #[tokio::test]
    async fn lookups_match_normalised_keys() {
        let store = StaticCredentialStore::from_json(DOC).expect("parse");
        assert_eq!(store.len(), 2);

        let git = store
            .get("team-a", CredentialType::Git, "https://github.com/example/deploy")
            .await
            .expect("lookup");
        assert_eq!(git, Some(Credentials::new("bot", "token")));

        let helm = store
            .get("team-a", CredentialType::Helm, "https://charts.example.com")
            .await
            .expect("lookup");
        assert_eq!(helm, Some(Credentials::new("reader", "s3cret")));

        let missing = store
            .get("team-b", CredentialType::Git, "https://github.com/example/deploy")
            .await
            .expect("lookup");
        assert!(missing.is_none());
    }

    #[test]
    fn empty_entry_is_rejected() {
        let doc = r#"{ "entries": [ { "namespace": "n", "type": "image",
            "repo": "ghcr.io/example/app", "username": "", "password": "" } ] }"#;
        let err = StaticCredentialStore::from_json(doc).unwrap_err();
        assert!(err.to_string().contains("ghcr.io/example/app"));
    }

    #[test]
    fn unknown_type_fails_to_parse() {
        let doc = r#"{ "entries": [ { "namespace": "n", "type": "ssh",
            "repo": "r", "username": "u", "password": "p" } ] }"#;
        assert!(matches!(
            StaticCredentialStore::from_json(doc),
            Err(CredentialError::Json(_))
        ));
    }

    #[tokio::test]
    async fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("credentials.json");
        tokio::fs::write(&path, DOC).await.expect("write");

        let store = StaticCredentialStore::load(&path).await.expect("load");
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = StaticCredentialStore::load(&dir.path().join("absent.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::Io(_)));
    }
}

//! Credential store abstraction
//!
//! Promotions reach three kinds of remote repositories: git repositories
//! (manifests), Helm chart registries, and container image registries. Each
//! kind can require its own credentials, looked up per namespace and
//! repository key (the repository or registry URL).
//!
//! The trait is async and backend-agnostic. In-memory fakes live in the
//! `fakes` module; a file-backed store lives in `static_store`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{CredentialError, CredentialResult};

/// Kind of repository a credential unlocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialType {
    Git,
    Helm,
    Image,
}

impl CredentialType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialType::Git => "git",
            CredentialType::Helm => "helm",
            CredentialType::Image => "image",
        }
    }
}

impl std::fmt::Display for CredentialType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CredentialType {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "git" => Ok(CredentialType::Git),
            "helm" => Ok(CredentialType::Helm),
            "image" => Ok(CredentialType::Image),
            other => Err(CredentialError::UnknownType(other.to_string())),
        }
    }
}

/// Username/password pair for a repository.
///
/// `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Keyed lookup of repository credentials.
///
/// Guarantees:
/// - `Ok(None)` means no credentials are stored for the key; callers may
///   proceed anonymously.
/// - `Err(_)` means the lookup itself failed and must not be treated as
///   "not found".
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up credentials for `repo_key` of the given type in `namespace`.
    async fn get(
        &self,
        namespace: &str,
        cred_type: CredentialType,
        repo_key: &str,
    ) -> CredentialResult<Option<Credentials>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_type_round_trips_through_str() {
        for t in [CredentialType::Git, CredentialType::Helm, CredentialType::Image] {
            let parsed: CredentialType = t.as_str().parse().expect("parse");
            assert_eq!(parsed, t);
        }
        assert!("ssh".parse::<CredentialType>().is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let creds = Credentials::new("robot", "hunter2");
        let out = format!("{:?}", creds);
        assert!(out.contains("robot"));
        assert!(!out.contains("hunter2"));
    }
}

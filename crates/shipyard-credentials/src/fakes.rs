//! In-memory fakes for the credential store (testing only)
//!
//! Provides `MemoryCredentialStore` and `FailingCredentialStore`, which
//! satisfy the `CredentialStore` contract without any secret backend. Both
//! count lookups so tests can assert a store was never consulted.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{CredentialError, CredentialResult};
use crate::store::{CredentialStore, CredentialType, Credentials};

// ---------------------------------------------------------------------------
// MemoryCredentialStore
// ---------------------------------------------------------------------------

type Key = (String, CredentialType, String);

/// In-memory store backed by a `HashMap<(namespace, type, repo_key), Credentials>`.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: HashMap<Key, Credentials>,
    lookups: AtomicUsize,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, builder style.
    pub fn with(
        mut self,
        namespace: &str,
        cred_type: CredentialType,
        repo_key: &str,
        creds: Credentials,
    ) -> Self {
        self.entries.insert(
            (namespace.to_string(), cred_type, repo_key.to_string()),
            creds,
        );
        self
    }

    /// Number of `get` calls served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(
        &self,
        namespace: &str,
        cred_type: CredentialType,
        repo_key: &str,
    ) -> CredentialResult<Option<Credentials>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let key = (namespace.to_string(), cred_type, repo_key.to_string());
        Ok(self.entries.get(&key).cloned())
    }
}

// ---------------------------------------------------------------------------
// FailingCredentialStore
// ---------------------------------------------------------------------------

/// Store whose every lookup fails with a backend error.
#[derive(Debug)]
pub struct FailingCredentialStore {
    message: String,
    lookups: AtomicUsize,
}

impl FailingCredentialStore {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            lookups: AtomicUsize::new(0),
        }
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialStore for FailingCredentialStore {
    async fn get(
        &self,
        _namespace: &str,
        _cred_type: CredentialType,
        _repo_key: &str,
    ) -> CredentialResult<Option<Credentials>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Err(CredentialError::Backend(self.message.clone()))
    }
}

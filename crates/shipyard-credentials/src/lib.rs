//! Shipyard Credentials: repository credential lookup for promotions
//!
//! Promotions read charts from Helm registries, write manifests to git
//! repositories, and reference container images. This crate provides the
//! keyed credential lookup they share.
//!
//! ## Modules
//!
//! - `store`: the `CredentialStore` trait and credential types
//! - `static_store`: JSON-file backed store
//! - `fakes`: in-memory stores for tests

pub mod error;
pub mod fakes;
pub mod static_store;
pub mod store;

pub use error::{CredentialError, CredentialResult};
pub use static_store::{normalize_repo_key, StaticCredentialStore, CREDENTIALS_FILE_ENV};
pub use store::{CredentialStore, CredentialType, Credentials};

//! Domain models for Shipyard.
//!
//! Canonical definitions for the core entities:
//! - `EnvironmentState`: what is currently promoted into an Environment
//! - `ChartSubscription`: declared Helm chart source
//! - `RepoUpdate`: per-repository promotion instruction
//! - `PromotionError`: error taxonomy shared by resolution and application

pub mod error;
pub mod state;
pub mod update;

// Re-export main types and errors
pub use error::{BoxError, ErrorKind, PromotionError, PromotionResult};
pub use state::{Chart, EnvironmentState, GitCommit, Image};
pub use update::{
    ChartSubscription, KustomizeImageUpdate, KustomizeMechanism, PromotionMechanism, RepoUpdate,
};

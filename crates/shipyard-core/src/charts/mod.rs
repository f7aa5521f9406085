//! Helm chart subscription resolution.
//!
//! Provides:
//! - [`constraint::VersionConstraint`]: Helm-style semver constraint parsing and matching
//! - [`resolver::ChartVersionResolver`]: credential-aware latest-version lookup per subscription

pub mod constraint;
pub mod resolver;

pub use constraint::{latest_satisfying, ChartVersion, ConstraintError, VersionConstraint};
pub use resolver::{ChartRegistry, ChartVersionResolver};

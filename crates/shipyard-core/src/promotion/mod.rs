//! Promotion mechanisms.
//!
//! Provides:
//! - [`applier::PromotionApplier`]: ordered, all-or-nothing application of repo updates
//! - [`render::RenderService`]: manifest render service boundary
//! - [`kustomize::ImageSetter`] / [`kustomize::KustomizeCli`]: kustomization image substitution

pub mod applier;
pub mod kustomize;
pub mod render;

pub use applier::{PromotionApplier, PromotionOutcome, RenderOutcome};
pub use kustomize::{ImageSetter, KustomizeCli};
pub use render::{ActionTaken, RenderRequest, RenderResponse, RenderService};

//! Structured observability hooks for promotion lifecycle events.
//!
//! This module provides:
//! - Namespace-scoped tracing spans via [`promotion_span`], attached to
//!   promotion futures with [`tracing::Instrument`]
//! - Emission functions for key lifecycle events: start, update applied,
//!   finish, failure, and chart resolution
//!
//! Events are emitted at `info!` level (failures at `warn!`). For JSON
//! output, initialise tracing with [`crate::telemetry::init_tracing`].

use tracing::{info, Span};

/// Span tagging every event of one promotion with its namespace.
///
/// Attach it to the promotion future rather than entering it, so the
/// future stays `Send` and the span is only active while the future is
/// polled.
///
/// # Example
///
/// ```ignore
/// use tracing::Instrument;
///
/// async { /* ... */ }.instrument(promotion_span("team-a")).await;
/// ```
pub fn promotion_span(namespace: &str) -> Span {
    tracing::info_span!("shipyard.promotion", namespace = %namespace)
}

/// Emit event: promotion started with the number of updates.
pub fn emit_promotion_started(namespace: &str, updates: usize) {
    info!(event = "promotion.started", namespace = %namespace, updates = updates);
}

/// Emit event: one update applied.
pub fn emit_update_applied(namespace: &str, index: usize, repo_url: &str, mechanism: &str) {
    info!(
        event = "promotion.update_applied",
        namespace = %namespace,
        index = index,
        repo = %repo_url,
        mechanism = %mechanism,
    );
}

/// Emit event: promotion finished.
pub fn emit_promotion_finished(namespace: &str, updates: usize, changes: usize) {
    info!(
        event = "promotion.finished",
        namespace = %namespace,
        updates = updates,
        changes = changes,
    );
}

/// Emit event: promotion aborted at update `index` (warning level).
pub fn emit_promotion_failed(
    namespace: &str,
    index: usize,
    repo_url: &str,
    error: &dyn std::fmt::Display,
) {
    tracing::warn!(
        event = "promotion.failed",
        namespace = %namespace,
        index = index,
        repo = %repo_url,
        error = %error,
    );
}

/// Emit event: chart subscriptions resolved.
pub fn emit_charts_resolved(namespace: &str, charts: usize) {
    info!(event = "charts.resolved", namespace = %namespace, charts = charts);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_span_is_not_entered_on_creation() {
        tracing::subscriber::with_default(tracing_subscriber::registry(), || {
            let span = promotion_span("test-namespace");
            assert!(span.id().is_some());
            assert_ne!(Span::current().id(), span.id());

            let _entered = span.enter();
            assert_eq!(Span::current().id(), span.id());
        });
    }
}

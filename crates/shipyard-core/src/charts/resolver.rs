//! Chart subscription resolution.
//!
//! [`ChartVersionResolver`] turns declared [`ChartSubscription`]s into
//! concrete [`Chart`] pins by asking a [`ChartRegistry`] for the newest
//! version satisfying each subscription's constraint. Output positions
//! mirror input positions, and the first failing subscription (in input
//! order) aborts the whole batch.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use shipyard_credentials::{CredentialStore, CredentialType, Credentials};
use tracing::{debug, error};

use crate::charts::constraint::VersionConstraint;
use crate::domain::{BoxError, Chart, ChartSubscription, PromotionError, PromotionResult};
use crate::obs::emit_charts_resolved;

/// Registry query backend.
///
/// Inject a real implementation that talks to a Helm repository or OCI
/// registry, or a stub for tests.
#[async_trait]
pub trait ChartRegistry: Send + Sync {
    /// Highest version of `chart` in `registry_url` satisfying `constraint`.
    ///
    /// An empty constraint matches any version. `Ok("")` means nothing
    /// satisfies the constraint, which is distinct from a failed query.
    async fn latest_version(
        &self,
        registry_url: &str,
        chart: &str,
        constraint: &str,
        credentials: Option<&Credentials>,
    ) -> Result<String, BoxError>;
}

/// Resolves chart subscriptions to pinned chart versions.
pub struct ChartVersionResolver {
    credentials: Arc<dyn CredentialStore>,
    registry: Arc<dyn ChartRegistry>,
}

impl ChartVersionResolver {
    pub fn new(credentials: Arc<dyn CredentialStore>, registry: Arc<dyn ChartRegistry>) -> Self {
        Self {
            credentials,
            registry,
        }
    }

    /// Resolve `subscriptions` one after another.
    ///
    /// Returns either a chart for every subscription, in the same order, or
    /// the first error. Later subscriptions are not queried after a failure.
    pub async fn resolve_latest_charts(
        &self,
        namespace: &str,
        subscriptions: &[ChartSubscription],
    ) -> PromotionResult<Vec<Chart>> {
        let mut charts = Vec::with_capacity(subscriptions.len());
        for sub in subscriptions {
            charts.push(self.resolve_one(namespace, sub).await?);
        }
        emit_charts_resolved(namespace, charts.len());
        Ok(charts)
    }

    /// Resolve `subscriptions` with concurrent registry queries.
    ///
    /// Results are assembled at their input positions and the error
    /// reported is the first one in input order, not the first to finish.
    pub async fn resolve_latest_charts_concurrent(
        &self,
        namespace: &str,
        subscriptions: &[ChartSubscription],
    ) -> PromotionResult<Vec<Chart>> {
        let results = join_all(
            subscriptions
                .iter()
                .map(|sub| self.resolve_one(namespace, sub)),
        )
        .await;
        let charts = results.into_iter().collect::<PromotionResult<Vec<_>>>()?;
        emit_charts_resolved(namespace, charts.len());
        Ok(charts)
    }

    async fn resolve_one(
        &self,
        namespace: &str,
        sub: &ChartSubscription,
    ) -> PromotionResult<Chart> {
        VersionConstraint::parse(&sub.semver_constraint).map_err(|e| {
            PromotionError::InvalidConstraint {
                registry_url: sub.registry_url.clone(),
                chart: sub.name.clone(),
                constraint: sub.semver_constraint.clone(),
                reason: e.reason,
            }
        })?;

        let creds = self
            .credentials
            .get(namespace, CredentialType::Helm, &sub.registry_url)
            .await
            .map_err(|source| PromotionError::Credentials {
                cred_type: CredentialType::Helm,
                key: sub.registry_url.clone(),
                source,
            })?;

        debug!(
            registry = %sub.registry_url,
            chart = %sub.name,
            has_credentials = creds.is_some(),
            "looked up chart registry credentials"
        );

        let version = self
            .registry
            .latest_version(
                &sub.registry_url,
                &sub.name,
                &sub.semver_constraint,
                creds.as_ref(),
            )
            .await
            .map_err(|source| PromotionError::Registry {
                registry_url: sub.registry_url.clone(),
                chart: sub.name.clone(),
                source,
            })?;

        if version.is_empty() {
            error!(
                registry = %sub.registry_url,
                chart = %sub.name,
                "found no suitable chart version"
            );
            return Err(PromotionError::NoSuitableVersion {
                registry_url: sub.registry_url.clone(),
                chart: sub.name.clone(),
            });
        }
        debug!(
            registry = %sub.registry_url,
            chart = %sub.name,
            version = %version,
            "found latest suitable chart version"
        );

        Ok(Chart {
            registry_url: sub.registry_url.clone(),
            name: sub.name.clone(),
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::StaticChartRegistry;
    use shipyard_credentials::fakes::MemoryCredentialStore;

    #[tokio::test]
    async fn resolves_single_subscription_anonymously() {
        let registry = Arc::new(StaticChartRegistry::new().with_versions(
            "r1",
            "c1",
            &["1.0.0", "1.2.3", "2.0.0"],
        ));
        let resolver =
            ChartVersionResolver::new(Arc::new(MemoryCredentialStore::new()), registry.clone());

        let charts = resolver
            .resolve_latest_charts("ns", &[ChartSubscription::new("r1", "c1", "^1.0.0")])
            .await
            .expect("resolve");

        assert_eq!(
            charts,
            vec![Chart {
                registry_url: "r1".to_string(),
                name: "c1".to_string(),
                version: "1.2.3".to_string(),
            }]
        );
        assert_eq!(registry.queries()[0].credentials, None);
    }

    #[tokio::test]
    async fn empty_subscription_list_yields_empty_charts() {
        let resolver = ChartVersionResolver::new(
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(StaticChartRegistry::new()),
        );
        let charts = resolver
            .resolve_latest_charts("ns", &[])
            .await
            .expect("resolve");
        assert!(charts.is_empty());
    }
}

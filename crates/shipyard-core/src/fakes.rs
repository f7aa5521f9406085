//! In-memory fakes for promotion collaborators (testing only)
//!
//! Provides `StaticChartRegistry`, `StubRenderService`, and
//! `RecordingImageSetter`. Each records the calls it receives so tests can
//! assert on arguments, ordering, or that a collaborator was never invoked.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use shipyard_credentials::Credentials;

use crate::charts::constraint::{latest_satisfying, VersionConstraint};
use crate::charts::resolver::ChartRegistry;
use crate::domain::BoxError;
use crate::promotion::kustomize::ImageSetter;
use crate::promotion::render::{ActionTaken, RenderRequest, RenderResponse, RenderService};

fn record<T>(log: &Mutex<Vec<T>>, entry: T) {
    log.lock().unwrap_or_else(PoisonError::into_inner).push(entry);
}

fn snapshot<T: Clone>(log: &Mutex<Vec<T>>) -> Vec<T> {
    log.lock().unwrap_or_else(PoisonError::into_inner).clone()
}

// ---------------------------------------------------------------------------
// StaticChartRegistry
// ---------------------------------------------------------------------------

/// A `latest_version` call as seen by [`StaticChartRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryQuery {
    pub registry_url: String,
    pub chart: String,
    pub constraint: String,
    pub credentials: Option<Credentials>,
}

/// Chart registry serving fixed version lists.
#[derive(Debug, Default)]
pub struct StaticChartRegistry {
    versions: HashMap<(String, String), Vec<String>>,
    failures: HashMap<(String, String), String>,
    queries: Mutex<Vec<RegistryQuery>>,
}

impl StaticChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `versions` of `chart` in `registry_url`.
    pub fn with_versions(mut self, registry_url: &str, chart: &str, versions: &[&str]) -> Self {
        self.versions.insert(
            (registry_url.to_string(), chart.to_string()),
            versions.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    /// Make queries for `chart` in `registry_url` fail with `message`.
    pub fn with_failure(mut self, registry_url: &str, chart: &str, message: &str) -> Self {
        self.failures.insert(
            (registry_url.to_string(), chart.to_string()),
            message.to_string(),
        );
        self
    }

    pub fn queries(&self) -> Vec<RegistryQuery> {
        snapshot(&self.queries)
    }
}

#[async_trait]
impl ChartRegistry for StaticChartRegistry {
    async fn latest_version(
        &self,
        registry_url: &str,
        chart: &str,
        constraint: &str,
        credentials: Option<&Credentials>,
    ) -> Result<String, BoxError> {
        record(
            &self.queries,
            RegistryQuery {
                registry_url: registry_url.to_string(),
                chart: chart.to_string(),
                constraint: constraint.to_string(),
                credentials: credentials.cloned(),
            },
        );

        let key = (registry_url.to_string(), chart.to_string());
        if let Some(message) = self.failures.get(&key) {
            return Err(message.clone().into());
        }
        let constraint = VersionConstraint::parse(constraint)?;
        let versions = self.versions.get(&key).map(Vec::as_slice).unwrap_or_default();
        Ok(latest_satisfying(versions.iter().map(String::as_str), &constraint).unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// StubRenderService
// ---------------------------------------------------------------------------

/// Render service returning a canned response or error.
#[derive(Debug)]
pub struct StubRenderService {
    response: Result<RenderResponse, String>,
    requests: Mutex<Vec<RenderRequest>>,
}

impl StubRenderService {
    /// Every render succeeds with `action_taken` and `commit_id`.
    pub fn succeeding(action_taken: ActionTaken, commit_id: &str) -> Self {
        Self {
            response: Ok(RenderResponse {
                action_taken,
                commit_id: commit_id.to_string(),
            }),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every render fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            response: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RenderRequest> {
        snapshot(&self.requests)
    }
}

#[async_trait]
impl RenderService for StubRenderService {
    async fn render_manifests(&self, request: RenderRequest) -> Result<RenderResponse, BoxError> {
        record(&self.requests, request);
        match &self.response {
            Ok(response) => Ok(response.clone()),
            Err(message) => Err(message.clone().into()),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingImageSetter
// ---------------------------------------------------------------------------

/// A `set_image` call as seen by [`RecordingImageSetter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetImageCall {
    pub dir: PathBuf,
    pub repo_url: String,
    pub tag: String,
}

/// Image setter that records calls and optionally fails them.
#[derive(Debug, Default)]
pub struct RecordingImageSetter {
    failure: Option<String>,
    calls: Mutex<Vec<SetImageCall>>,
}

impl RecordingImageSetter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<SetImageCall> {
        snapshot(&self.calls)
    }
}

#[async_trait]
impl ImageSetter for RecordingImageSetter {
    async fn set_image(&self, dir: &Path, repo_url: &str, tag: &str) -> Result<(), BoxError> {
        record(
            &self.calls,
            SetImageCall {
                dir: dir.to_path_buf(),
                repo_url: repo_url.to_string(),
                tag: tag.to_string(),
            },
        );
        match &self.failure {
            Some(message) => Err(message.clone().into()),
            None => Ok(()),
        }
    }
}

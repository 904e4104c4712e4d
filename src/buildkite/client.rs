//! Buildkite builds API client
//!
//! Provides a trait-based seam over the builds query so collection can be
//! tested without network access.

use super::models::{Build, BuildState};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::header::LINK;
use reqwest::{Client, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

/// Builds requested per query. Only the first page is ever fetched.
pub const BUILDS_PER_PAGE: u32 = 100;

/// Source of build lists filtered by state
#[async_trait]
pub trait BuildSource: Send + Sync {
    /// Fetch the builds of an organization currently in `state`
    async fn fetch_builds(&self, org_slug: &str, state: BuildState) -> Result<Vec<Build>>;
}

/// Real implementation backed by the Buildkite REST API
pub struct BuildkiteClient {
    client: Client,
    base_url: String,
    api_access_token: String,
}

impl BuildkiteClient {
    /// Create a new client for the API at `base_url`
    pub fn new(base_url: impl Into<String>, api_access_token: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("buildkite-metrics/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::fetch(&base_url, format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            api_access_token: api_access_token.into(),
        })
    }

    /// URL of the first page of builds in `state`
    pub fn builds_url(&self, org_slug: &str, state: BuildState) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| Error::fetch(&self.base_url, e))?;

        url.path_segments_mut()
            .map_err(|_| Error::fetch(&self.base_url, "base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(["v2", "organizations", org_slug, "builds"]);

        url.query_pairs_mut()
            .append_pair("state", state.as_str())
            .append_pair("page", "1")
            .append_pair("per_page", &BUILDS_PER_PAGE.to_string());

        Ok(url)
    }
}

#[async_trait]
impl BuildSource for BuildkiteClient {
    async fn fetch_builds(&self, org_slug: &str, state: BuildState) -> Result<Vec<Build>> {
        let url = self.builds_url(org_slug, state)?;
        debug!("Requesting {}", url);

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.api_access_token)
            .send()
            .await
            .map_err(|e| Error::fetch(url.as_str(), e))?;

        if response.status() != StatusCode::OK {
            return Err(Error::http_status(url.as_str(), response.status().as_u16()));
        }

        let has_next_page = response
            .headers()
            .get(LINK)
            .and_then(|link| link.to_str().ok())
            .is_some_and(|link| link.contains("rel=\"next\""));
        if has_next_page {
            warn!(
                "More than {} {} builds exist; only the first page is counted",
                BUILDS_PER_PAGE, state
            );
        }

        response
            .json::<Vec<Build>>()
            .await
            .map_err(|e| Error::decode(url.as_str(), e))
    }
}

/// Mock implementation of BuildSource for testing
pub struct MockBuildSource {
    builds: Mutex<HashMap<BuildState, Vec<Build>>>,
    failure: Option<String>,
    requests: Mutex<Vec<(String, BuildState)>>,
}

impl MockBuildSource {
    /// Create a mock that returns no builds for any state
    pub fn new() -> Self {
        Self {
            builds: Mutex::new(HashMap::new()),
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Return `builds` whenever `state` is requested
    pub fn with_builds(mut self, state: BuildState, builds: Vec<Build>) -> Self {
        self.builds.get_mut().insert(state, builds);
        self
    }

    /// Fail every request with a transport error
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// Every (org, state) pair requested so far, in order
    pub async fn requests(&self) -> Vec<(String, BuildState)> {
        self.requests.lock().await.clone()
    }

    /// Number of fetches performed
    pub async fn fetch_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Default for MockBuildSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BuildSource for MockBuildSource {
    async fn fetch_builds(&self, org_slug: &str, state: BuildState) -> Result<Vec<Build>> {
        self.requests
            .lock()
            .await
            .push((org_slug.to_string(), state));

        if let Some(reason) = &self.failure {
            return Err(Error::fetch(format!("mock://{org_slug}/{state}"), reason));
        }

        Ok(self
            .builds
            .lock()
            .await
            .get(&state)
            .cloned()
            .unwrap_or_default())
    }
}

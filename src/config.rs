//! Invocation configuration
//!
//! A run is configured by a JSON event (the same shape the scheduled function
//! receives), then environment variables, then command line flags, each
//! layer overriding the one before it. Only the organization slug, API token
//! and queue are required.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// CloudWatch namespace metrics are published under
pub const DEFAULT_NAMESPACE: &str = "Buildkite";

/// Base URL of the Buildkite REST API
pub const DEFAULT_API_URL: &str = "https://api.buildkite.com";

/// Configuration for one collection run
///
/// Deserialization goes through [`Event`]: keys match case-insensitively and
/// a `null` value counts as absent.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value")]
pub struct Config {
    #[serde(rename = "BuildkiteOrgSlug")]
    pub org_slug: String,

    #[serde(rename = "BuildkiteApiAccessToken", skip_serializing)]
    pub api_access_token: String,

    /// The one queue tracked in addition to `default`
    #[serde(rename = "Queue")]
    pub queue: String,

    #[serde(rename = "Namespace")]
    pub namespace: String,

    #[serde(rename = "ApiUrl")]
    pub api_url: String,

    /// AWS region for CloudWatch; falls back to the AWS environment when unset
    #[serde(rename = "Region", skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

/// Wire shape of the JSON event, keyed by lowercased field name
#[derive(Deserialize)]
struct Event {
    #[serde(rename = "buildkiteorgslug", alias = "organizationslug", default)]
    org_slug: Option<String>,
    #[serde(rename = "buildkiteapiaccesstoken", alias = "apiaccesstoken", default)]
    api_access_token: Option<String>,
    #[serde(rename = "queue", default)]
    queue: Option<String>,
    #[serde(rename = "namespace", default)]
    namespace: Option<String>,
    #[serde(rename = "apiurl", default)]
    api_url: Option<String>,
    #[serde(rename = "region", default)]
    region: Option<String>,
}

impl TryFrom<Value> for Config {
    type Error = serde_json::Error;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        let value = match value {
            Value::Null => Value::Object(Map::new()),
            Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| (key.to_lowercase(), value))
                    .collect(),
            ),
            other => other,
        };
        let event: Event = serde_json::from_value(value)?;

        Ok(Self {
            org_slug: event.org_slug.unwrap_or_default(),
            api_access_token: event.api_access_token.unwrap_or_default(),
            queue: event.queue.unwrap_or_default(),
            namespace: event.namespace.unwrap_or_else(default_namespace),
            api_url: event.api_url.unwrap_or_else(default_api_url),
            region: event.region,
        })
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            org_slug: String::new(),
            api_access_token: String::new(),
            queue: String::new(),
            namespace: default_namespace(),
            api_url: default_api_url(),
            region: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.api_access_token.is_empty() {
            ""
        } else {
            "<redacted>"
        };
        f.debug_struct("Config")
            .field("org_slug", &self.org_slug)
            .field("api_access_token", &token)
            .field("queue", &self.queue)
            .field("namespace", &self.namespace)
            .field("api_url", &self.api_url)
            .field("region", &self.region)
            .finish()
    }
}

/// Environment variables read by [`ConfigOverrides::from_env`]
pub const ENV_ORG_SLUG: &str = "BUILDKITE_ORG_SLUG";
pub const ENV_API_ACCESS_TOKEN: &str = "BUILDKITE_API_ACCESS_TOKEN";
pub const ENV_QUEUE: &str = "BUILDKITE_QUEUE";
pub const ENV_NAMESPACE: &str = "BUILDKITE_METRICS_NAMESPACE";
pub const ENV_API_URL: &str = "BUILDKITE_API_URL";
pub const ENV_REGION: &str = "AWS_REGION";

/// Values that take precedence over the JSON event when present
#[derive(Clone, Default)]
pub struct ConfigOverrides {
    pub org_slug: Option<String>,
    pub api_access_token: Option<String>,
    pub queue: Option<String>,
    pub namespace: Option<String>,
    pub api_url: Option<String>,
    pub region: Option<String>,
}

impl fmt::Debug for ConfigOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOverrides")
            .field("org_slug", &self.org_slug)
            .field(
                "api_access_token",
                &self.api_access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("queue", &self.queue)
            .field("namespace", &self.namespace)
            .field("api_url", &self.api_url)
            .field("region", &self.region)
            .finish()
    }
}

impl ConfigOverrides {
    /// Overrides taken from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Overrides taken from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // A variable set to the empty string counts as unset
        let var = |name: &str| lookup(name).filter(|value| !value.is_empty());
        Self {
            org_slug: var(ENV_ORG_SLUG),
            api_access_token: var(ENV_API_ACCESS_TOKEN),
            queue: var(ENV_QUEUE),
            namespace: var(ENV_NAMESPACE),
            api_url: var(ENV_API_URL),
            region: var(ENV_REGION),
        }
    }
}

impl Config {
    /// Parse a JSON configuration event
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a JSON configuration event from a reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Load the configuration event.
    ///
    /// `None` yields the defaults, `-` reads the event from stdin, anything
    /// else is treated as a path to a JSON file.
    pub fn load(event: Option<&Path>) -> Result<Self> {
        match event {
            None => Ok(Self::default()),
            Some(path) if path.as_os_str() == "-" => Self::from_reader(std::io::stdin().lock()),
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                Self::from_json(&content)
            }
        }
    }

    /// Apply overrides on top of this configuration
    pub fn merge(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(org_slug) = overrides.org_slug {
            self.org_slug = org_slug;
        }
        if let Some(token) = overrides.api_access_token {
            self.api_access_token = token;
        }
        if let Some(queue) = overrides.queue {
            self.queue = queue;
        }
        if let Some(namespace) = overrides.namespace {
            self.namespace = namespace;
        }
        if let Some(api_url) = overrides.api_url {
            self.api_url = api_url;
        }
        if overrides.region.is_some() {
            self.region = overrides.region;
        }
        self
    }

    /// Check that every required field is present
    pub fn validate(&self) -> Result<()> {
        if self.api_access_token.is_empty() {
            return Err(Error::missing_config("BuildkiteApiAccessToken"));
        }

        if self.org_slug.is_empty() {
            return Err(Error::missing_config("BuildkiteOrgSlug"));
        }

        if self.queue.is_empty() {
            return Err(Error::missing_config("Queue"));
        }

        Ok(())
    }
}

//! Builds and jobs as returned by `GET /v2/organizations/{org}/builds`

use serde::{Deserialize, Serialize};
use std::fmt;

/// Queue a job runs on when its agent query rules name none
pub const DEFAULT_QUEUE: &str = "default";

const QUEUE_RULE_PREFIX: &str = "queue=";

/// State of a build or job.
///
/// Buildkite has many more states than the two counted here; all of them
/// collapse into `Other` so new states never break deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    Running,
    Scheduled,
    #[serde(other)]
    Other,
}

impl BuildState {
    /// The state filters queried on every run, in order
    pub const QUERIED: [BuildState; 2] = [BuildState::Running, BuildState::Scheduled];

    /// Value used for the `state` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Scheduled => "scheduled",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Build {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub number: Option<u64>,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub state: Option<BuildState>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub jobs: Vec<Job>,
}

/// A unit of work within a build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub state: Option<BuildState>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub agent_query_rules: Vec<String>,
}

impl Build {
    /// Create a build in the given state with the given jobs
    pub fn new(state: BuildState, jobs: Vec<Job>) -> Self {
        Self {
            state: Some(state),
            jobs,
            ..Self::default()
        }
    }
}

impl Job {
    /// Create a job in the given state, optionally targeting a queue
    pub fn new(state: BuildState, queue: Option<&str>) -> Self {
        Self {
            state: Some(state),
            agent_query_rules: queue
                .map(|q| vec![format!("{QUEUE_RULE_PREFIX}{q}")])
                .unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Queue named by the first `queue=` agent query rule, if any
    pub fn explicit_queue(&self) -> Option<&str> {
        self.agent_query_rules
            .iter()
            .find_map(|rule| rule.strip_prefix(QUEUE_RULE_PREFIX))
    }

    /// Queue this job is dispatched to
    pub fn queue(&self) -> &str {
        effective_queue(self.explicit_queue())
    }
}

/// Resolve an optional queue name to the queue actually used
pub fn effective_queue(explicit: Option<&str>) -> &str {
    match explicit {
        Some(queue) if !queue.is_empty() => queue,
        _ => DEFAULT_QUEUE,
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

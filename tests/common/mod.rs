//! Common test utilities and fixtures

#![allow(dead_code)]

use anyhow::Result;
use buildkite_metrics::buildkite::{Build, BuildState, Job};
use buildkite_metrics::Config;
use std::io::Write;
use tempfile::NamedTempFile;

/// Configuration tracking the `ci` queue for the `acme` organization
pub fn test_config() -> Config {
    Config {
        org_slug: "acme".to_string(),
        api_access_token: "test-token".to_string(),
        queue: "ci".to_string(),
        ..Config::default()
    }
}

/// A running build whose jobs are all running, one per queue entry
pub fn running_build(queues: &[Option<&str>]) -> Build {
    Build::new(
        BuildState::Running,
        queues
            .iter()
            .map(|queue| Job::new(BuildState::Running, *queue))
            .collect(),
    )
}

/// A scheduled build whose jobs are all scheduled, one per queue entry
pub fn scheduled_build(queues: &[Option<&str>]) -> Build {
    Build::new(
        BuildState::Scheduled,
        queues
            .iter()
            .map(|queue| Job::new(BuildState::Scheduled, *queue))
            .collect(),
    )
}

/// Write a JSON configuration event to a temporary file
pub fn write_event(json: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(json.as_bytes())?;
    file.flush()?;
    Ok(file)
}

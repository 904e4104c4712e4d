//! Running/scheduled build and job tallies

use super::datum::{Dimension, MetricDatum, MetricName};
use crate::buildkite::{Build, BuildState, Job};
use serde::{Deserialize, Serialize};

/// Counts of running and scheduled builds and jobs.
///
/// Counts only ever grow within a collection run. The `add_*` methods take
/// and return the value so a tally is threaded through explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Counts {
    pub running_builds: u64,
    pub running_jobs: u64,
    pub scheduled_builds: u64,
    pub scheduled_jobs: u64,
}

impl Counts {
    /// Count one more build. Builds in any other state are ignored.
    #[must_use]
    pub fn add_build(mut self, build: &Build) -> Self {
        match build.state {
            Some(BuildState::Running) => self.running_builds += 1,
            Some(BuildState::Scheduled) => self.scheduled_builds += 1,
            _ => {}
        }
        self
    }

    /// Count one more job. Jobs in any other state are ignored.
    #[must_use]
    pub fn add_job(mut self, job: &Job) -> Self {
        match job.state {
            Some(BuildState::Running) => self.running_jobs += 1,
            Some(BuildState::Scheduled) => self.scheduled_jobs += 1,
            _ => {}
        }
        self
    }

    /// Value of the counter reported under `name`
    pub fn get(&self, name: MetricName) -> u64 {
        match name {
            MetricName::RunningBuildsCount => self.running_builds,
            MetricName::ScheduledBuildsCount => self.scheduled_builds,
            MetricName::RunningJobsCount => self.running_jobs,
            MetricName::ScheduledJobsCount => self.scheduled_jobs,
        }
    }

    /// One datum per counter, all tagged with `dimension`
    pub fn to_metric_data(&self, dimension: Option<&Dimension>) -> Vec<MetricDatum> {
        MetricName::ALL
            .iter()
            .map(|&name| MetricDatum::count(name, self.get(name), dimension.cloned()))
            .collect()
    }
}

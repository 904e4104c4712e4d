//! Accumulation of build lists into global and per-queue counts

use super::counts::Counts;
use crate::buildkite::{Build, DEFAULT_QUEUE};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Global counts plus counts for the `default` queue and the configured queue.
///
/// Created empty at the start of a run, fed one build list per state filter,
/// then read once to produce metric data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    #[serde(flatten)]
    pub counts: Counts,
    #[serde(rename = "Queues")]
    pub queues: HashMap<String, Counts>,
}

impl AggregationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a list of builds into the result.
    ///
    /// Every build and job counts toward the global totals. Jobs on `default`
    /// or on `configured_queue` also count toward that queue, and their build
    /// counts once per queue it has jobs on. Jobs on any other queue are only
    /// visible globally.
    pub fn aggregate(&mut self, builds: &[Build], configured_queue: &str) {
        for build in builds {
            self.counts = self.counts.add_build(build);

            let mut build_queues = HashSet::new();
            for job in &build.jobs {
                self.counts = self.counts.add_job(job);

                let queue = job.queue();
                if queue == DEFAULT_QUEUE || queue == configured_queue {
                    let counts = self.queues.entry(queue.to_string()).or_default();
                    *counts = counts.add_job(job);
                    build_queues.insert(queue);
                }
            }

            for queue in build_queues {
                let counts = self.queues.entry(queue.to_string()).or_default();
                *counts = counts.add_build(build);
            }
        }

        self.ensure_queues(configured_queue);
    }

    /// Make sure both tracked queues report, even with nothing on them
    pub fn ensure_queues(&mut self, configured_queue: &str) {
        self.queues.entry(DEFAULT_QUEUE.to_string()).or_default();
        self.queues.entry(configured_queue.to_string()).or_default();
    }

    /// Counts for `queue`, zero when it is not tracked
    pub fn queue(&self, queue: &str) -> Counts {
        self.queues.get(queue).copied().unwrap_or_default()
    }
}

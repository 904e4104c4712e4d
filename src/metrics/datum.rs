//! Metric data points and their extraction from an aggregation result

use super::aggregate::AggregationResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dimension name used to tag per-queue series
pub const QUEUE_DIMENSION: &str = "Queue";

/// Unit every datum is reported in
pub const COUNT_UNIT: &str = "Count";

/// Names of the published metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricName {
    RunningBuildsCount,
    ScheduledBuildsCount,
    RunningJobsCount,
    ScheduledJobsCount,
}

impl MetricName {
    /// Emission order within one dimension set
    pub const ALL: [MetricName; 4] = [
        MetricName::RunningBuildsCount,
        MetricName::ScheduledBuildsCount,
        MetricName::RunningJobsCount,
        MetricName::ScheduledJobsCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RunningBuildsCount => "RunningBuildsCount",
            Self::ScheduledBuildsCount => "ScheduledBuildsCount",
            Self::RunningJobsCount => "RunningJobsCount",
            Self::ScheduledJobsCount => "ScheduledJobsCount",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A name/value pair distinguishing one series from another
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    /// The `Queue=<name>` dimension
    pub fn queue(name: impl Into<String>) -> Self {
        Self {
            name: QUEUE_DIMENSION.to_string(),
            value: name.into(),
        }
    }
}

/// One data point for the metrics backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDatum {
    pub name: MetricName,
    pub value: f64,
    /// `None` for the global series
    pub dimension: Option<Dimension>,
}

impl MetricDatum {
    /// Create a count datum
    pub fn count(name: MetricName, value: u64, dimension: Option<Dimension>) -> Self {
        Self {
            name,
            value: value as f64,
            dimension,
        }
    }

    /// Unit the value is expressed in
    pub fn unit(&self) -> &'static str {
        COUNT_UNIT
    }

    /// Queue this datum is tagged with, if any
    pub fn queue(&self) -> Option<&str> {
        self.dimension
            .as_ref()
            .filter(|d| d.name == QUEUE_DIMENSION)
            .map(|d| d.value.as_str())
    }
}

/// Flatten a result into data points: the global series first, then one
/// set of four per queue entry.
///
/// Queue order follows the map and is not stable between runs.
pub fn extract_metric_data(result: &AggregationResult) -> Vec<MetricDatum> {
    let mut data = result.counts.to_metric_data(None);

    for (queue, counts) in &result.queues {
        data.extend(counts.to_metric_data(Some(&Dimension::queue(queue.as_str()))));
    }

    data
}

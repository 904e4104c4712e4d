//! Build/job counting and metric publication
//!
//! Data flows one way through this module:
//!
//! ```text
//! builds ─► AggregationResult ─► extract_metric_data ─► chunk_metric_data ─► MetricsSink
//! ```

pub mod aggregate;
pub mod chunk;
pub mod counts;
pub mod datum;
pub mod sink;

pub use aggregate::AggregationResult;
pub use chunk::{chunk_metric_data, MAX_DATUMS_PER_REQUEST};
pub use counts::Counts;
pub use datum::{extract_metric_data, Dimension, MetricDatum, MetricName, QUEUE_DIMENSION};
pub use sink::{CloudWatchSink, LogSink, MetricsSink, MockMetricsSink};

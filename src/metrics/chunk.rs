//! Splitting metric data into submission-sized batches

use super::datum::MetricDatum;

/// Most data points CloudWatch accepts in one `PutMetricData` call
pub const MAX_DATUMS_PER_REQUEST: usize = 10;

/// Split `data` into consecutive batches of at most `size` points, keeping
/// order. Empty input yields no batches. A `size` of zero is treated as one.
pub fn chunk_metric_data(size: usize, data: &[MetricDatum]) -> Vec<&[MetricDatum]> {
    data.chunks(size.max(1)).collect()
}

//! A single collection run
//!
//! Validates configuration, queries running then scheduled builds, folds them
//! into one [`AggregationResult`] and publishes the resulting metric data in
//! batches. Every step runs to completion before the next starts and the
//! first failure ends the run.

use crate::buildkite::{BuildSource, BuildState};
use crate::config::Config;
use crate::error::Result;
use crate::metrics::{
    chunk_metric_data, extract_metric_data, AggregationResult, MetricsSink,
    MAX_DATUMS_PER_REQUEST,
};
use tracing::{debug, info};

/// Run one full collection and return what was aggregated.
///
/// Batches submitted before a failing one stay published.
pub async fn collect_metrics(
    config: &Config,
    source: &dyn BuildSource,
    sink: &dyn MetricsSink,
) -> Result<AggregationResult> {
    config.validate()?;

    let mut result = AggregationResult::new();
    for state in BuildState::QUERIED {
        aggregate_builds(&mut result, config, source, state).await?;
    }

    info!("Extracting cloudwatch metrics from results");
    let data = extract_metric_data(&result);

    for chunk in chunk_metric_data(MAX_DATUMS_PER_REQUEST, &data) {
        info!("Submitting chunk of {} metrics to Cloudwatch", chunk.len());
        sink.put_metric_data(&config.namespace, chunk).await?;
    }

    Ok(result)
}

/// Fetch builds in `state` and fold them into `result`
pub async fn aggregate_builds(
    result: &mut AggregationResult,
    config: &Config,
    source: &dyn BuildSource,
    state: BuildState,
) -> Result<()> {
    info!(
        "Querying buildkite for {} builds for org {}",
        state, config.org_slug
    );
    let builds = source.fetch_builds(&config.org_slug, state).await?;

    info!("Aggregating results from {} builds", builds.len());
    result.aggregate(&builds, &config.queue);
    debug!("{:?}", result);

    Ok(())
}

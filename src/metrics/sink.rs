//! Metrics backends data batches are submitted to

use super::datum::MetricDatum;
use crate::error::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_cloudwatch::config::Region;
use aws_sdk_cloudwatch::error::DisplayErrorContext;
use aws_sdk_cloudwatch::types::{self as cw, StandardUnit};
use aws_sdk_cloudwatch::Client;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Destination for batches of metric data
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Submit one batch under `namespace`
    async fn put_metric_data(&self, namespace: &str, data: &[MetricDatum]) -> Result<()>;
}

/// CloudWatch `PutMetricData` backend
pub struct CloudWatchSink {
    client: Client,
}

impl CloudWatchSink {
    /// Create a sink from the ambient AWS configuration, optionally pinning
    /// the region
    pub async fn new(region: Option<String>) -> Self {
        info!("Initializing CloudWatch client");

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let aws_config = loader.load().await;

        Self {
            client: Client::new(&aws_config),
        }
    }

    /// Create a sink around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn to_cloudwatch(datum: &MetricDatum) -> cw::MetricDatum {
        let mut builder = cw::MetricDatum::builder()
            .metric_name(datum.name.as_str())
            .value(datum.value)
            .unit(StandardUnit::from(datum.unit()));

        if let Some(dimension) = &datum.dimension {
            builder = builder.dimensions(
                cw::Dimension::builder()
                    .name(&dimension.name)
                    .value(&dimension.value)
                    .build(),
            );
        }

        builder.build()
    }
}

#[async_trait]
impl MetricsSink for CloudWatchSink {
    async fn put_metric_data(&self, namespace: &str, data: &[MetricDatum]) -> Result<()> {
        let metric_data = data.iter().map(Self::to_cloudwatch).collect::<Vec<_>>();

        self.client
            .put_metric_data()
            .namespace(namespace)
            .set_metric_data(Some(metric_data))
            .send()
            .await
            .map_err(|e| Error::submission(namespace, data.len(), DisplayErrorContext(e)))?;

        debug!("Submitted {} metrics to {}", data.len(), namespace);
        Ok(())
    }
}

/// Backend that only logs what would have been submitted
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl MetricsSink for LogSink {
    async fn put_metric_data(&self, namespace: &str, data: &[MetricDatum]) -> Result<()> {
        for datum in data {
            info!(
                namespace,
                metric = %datum.name,
                queue = datum.queue().unwrap_or("-"),
                value = datum.value,
                unit = datum.unit(),
                "dry run: not submitting"
            );
        }
        Ok(())
    }
}

/// Mock implementation of MetricsSink for testing
pub struct MockMetricsSink {
    batches: Mutex<Vec<(String, Vec<MetricDatum>)>>,
    attempts: Mutex<usize>,
    fail_on: Option<usize>,
}

impl MockMetricsSink {
    /// Create a mock that accepts every batch
    pub fn new() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            attempts: Mutex::new(0),
            fail_on: None,
        }
    }

    /// Reject the `attempt`-th submission (1-based)
    pub fn failing_on(mut self, attempt: usize) -> Self {
        self.fail_on = Some(attempt);
        self
    }

    /// Batches accepted so far, with their namespace
    pub async fn batches(&self) -> Vec<(String, Vec<MetricDatum>)> {
        self.batches.lock().await.clone()
    }

    /// Every datum accepted so far
    pub async fn data(&self) -> Vec<MetricDatum> {
        self.batches
            .lock()
            .await
            .iter()
            .flat_map(|(_, batch)| batch.iter().cloned())
            .collect()
    }

    /// Number of submissions attempted, including rejected ones
    pub async fn attempts(&self) -> usize {
        *self.attempts.lock().await
    }
}

impl Default for MockMetricsSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MetricsSink for MockMetricsSink {
    async fn put_metric_data(&self, namespace: &str, data: &[MetricDatum]) -> Result<()> {
        let attempt = {
            let mut attempts = self.attempts.lock().await;
            *attempts += 1;
            *attempts
        };

        if self.fail_on == Some(attempt) {
            return Err(Error::submission(namespace, data.len(), "mock rejection"));
        }

        self.batches
            .lock()
            .await
            .push((namespace.to_string(), data.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::datum::{Dimension, MetricName};
    use aws_sdk_cloudwatch::config::retry::RetryConfig;
    use aws_sdk_cloudwatch::config::Credentials;

    fn datum(queue: Option<&str>) -> MetricDatum {
        MetricDatum::count(MetricName::RunningBuildsCount, 3, queue.map(Dimension::queue))
    }

    #[test]
    fn test_to_cloudwatch_global() {
        let converted = CloudWatchSink::to_cloudwatch(&datum(None));
        assert!(format!("{converted:?}").contains("RunningBuildsCount"));
        assert_eq!(converted.value(), Some(3.0));
        assert_eq!(converted.unit(), Some(&StandardUnit::Count));
        assert!(converted.dimensions().is_empty());
    }

    #[test]
    fn test_to_cloudwatch_queue_dimension() {
        let converted = CloudWatchSink::to_cloudwatch(&datum(Some("deploy")));
        let dimensions = converted.dimensions();
        assert_eq!(dimensions.len(), 1);
        let rendered = format!("{:?}", dimensions[0]);
        assert!(rendered.contains("Queue"));
        assert!(rendered.contains("deploy"));
    }

    #[tokio::test]
    async fn test_cloudwatch_rejection_is_submission_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let conf = aws_sdk_cloudwatch::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(Credentials::new("AKIDTEST", "secret", None, None, "test"))
            .endpoint_url(server.url())
            .retry_config(RetryConfig::disabled())
            .build();
        let sink = CloudWatchSink::with_client(Client::from_conf(conf));

        let err = sink
            .put_metric_data("Buildkite", &[datum(None), datum(Some("deploy"))])
            .await
            .unwrap_err();

        assert!(err.is_submission_error());
        match err {
            Error::Submission {
                namespace, count, ..
            } => {
                assert_eq!(namespace, "Buildkite");
                assert_eq!(count, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_log_sink_accepts_everything() {
        let sink = LogSink;
        assert!(sink
            .put_metric_data("Buildkite", &[datum(None), datum(Some("deploy"))])
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_mock_sink_records_batches() {
        let sink = MockMetricsSink::new();
        sink.put_metric_data("Buildkite", &[datum(None)]).await.unwrap();
        sink.put_metric_data("Buildkite", &[datum(Some("ci")), datum(None)])
            .await
            .unwrap();

        let batches = sink.batches().await;
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1].0, "Buildkite");
        assert_eq!(sink.data().await.len(), 3);
        assert_eq!(sink.attempts().await, 2);
    }

    #[tokio::test]
    async fn test_mock_sink_failure() {
        let sink = MockMetricsSink::new().failing_on(2);
        assert!(sink.put_metric_data("Buildkite", &[datum(None)]).await.is_ok());

        let err = sink
            .put_metric_data("Buildkite", &[datum(None)])
            .await
            .unwrap_err();
        assert!(err.is_submission_error());
        assert_eq!(sink.batches().await.len(), 1);
    }
}

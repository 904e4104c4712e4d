//! # buildkite-metrics
//!
//! Polls the Buildkite builds API for an organization, counts running and
//! scheduled builds and jobs (globally, for the `default` queue and for one
//! configured queue) and publishes the counts to CloudWatch.
//!
//! ## Usage
//!
//! ```bash
//! buildkite-metrics collect --event event.json
//! ```
//!
//! ## Modules
//!
//! - `buildkite` - Build/job model and the builds API client
//! - `collector` - One collection run, from validation to submission
//! - `config` - Invocation configuration
//! - `error` - Error taxonomy for a run
//! - `metrics` - Counting, metric extraction, batching and metric sinks
pub mod buildkite;
pub mod collector;
pub mod config;
pub mod error;
pub mod metrics;

pub use collector::collect_metrics;
pub use config::{Config, ConfigOverrides};
pub use error::{Error, Result};

//! Buildkite REST API access
//!
//! Only the slice of the builds endpoint needed to count running and
//! scheduled work is modelled here.

pub mod client;
pub mod models;

pub use client::{BuildSource, BuildkiteClient, MockBuildSource};
pub use models::{effective_queue, Build, BuildState, Job, DEFAULT_QUEUE};

//! # pipewatch-gitlab
//!
//! GitLab CI provider model and contracts for the pipewatch exporter.
//!
//! This crate defines what the metric emission engine knows about GitLab:
//! the observation types it labels metrics with ([`ProjectRef`],
//! [`PipelineVariable`]), the full status enumerations the API can report
//! ([`statuses`]), and the injected capabilities the engine calls through:
//! a variables fetch ([`PipelineVariablesSource`]) and a rate-limiter call
//! gate ([`CallGate`]). The actual HTTP client, authentication, and retry
//! policy live with the surrounding system.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod fetch;
pub mod gate;
pub mod statuses;
pub mod types;

pub use error::ApiError;
pub use fetch::{PipelineVariablesSource, StaticVariables};
pub use gate::{CallGate, NoopGate};
pub use statuses::{JOB_STATUSES, PIPELINE_STATUSES};
pub use types::{PipelineId, PipelineVariable, ProjectId, ProjectRef};

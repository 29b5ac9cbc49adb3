//! Error types for the metric emission engine.

use pipewatch_gitlab::{ApiError, PipelineId};
use thiserror::Error;

/// A metric family could not be registered.
///
/// Raised once at startup when the default (or an operator-defined) family
/// set is installed; a collision here is a programming or configuration
/// mistake and should abort initialization, never be retried per scrape.
#[derive(Debug, Error)]
#[error("could not register metric family '{family}': {reason}")]
pub struct RegistrationError {
    /// Name of the colliding family.
    pub family: String,
    /// Why registration was refused.
    pub reason: String,
}

/// A provider fetch failed while emitting a metric.
///
/// Recoverable at the call site: the emission is skipped with the registry
/// left untouched, and the polling loop goes on with other entities.
#[derive(Debug, Error)]
#[error("could not fetch pipeline variables for pipeline {pipeline}: {source}")]
pub struct FetchError {
    /// The pipeline whose data was requested.
    pub pipeline: PipelineId,
    /// The provider failure.
    pub source: ApiError,
}

/// The configuration surface could not be realized.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The variable filter pattern is not a valid regular expression.
    #[error("invalid pipeline variables filter '{pattern}': {source}")]
    InvalidFilter {
        /// The pattern as configured.
        pattern: String,
        /// The compilation failure.
        source: regex::Error,
    },
}

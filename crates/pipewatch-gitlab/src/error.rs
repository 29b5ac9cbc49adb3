//! Error types for the GitLab provider contracts.

use crate::types::PipelineId;
use thiserror::Error;

/// Failures a provider API call can surface.
///
/// Produced by [`PipelineVariablesSource`](crate::PipelineVariablesSource)
/// implementations; the emission engine wraps these rather than inspecting
/// them, so the set only needs to be broad enough for operators to tell
/// failure classes apart in logs.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a usable response.
    #[error("network error: {reason}")]
    Network {
        /// Transport-level failure description.
        reason: String,
    },

    /// GitLab rejected the credentials.
    #[error("authentication rejected: {reason}")]
    Auth {
        /// What the provider reported.
        reason: String,
    },

    /// GitLab answered 429 and the client gave up.
    #[error("rate limited by the provider")]
    RateLimited,

    /// The addressed pipeline does not exist (or is not visible).
    #[error("pipeline {pipeline} not found")]
    NotFound {
        /// The pipeline that was addressed.
        pipeline: PipelineId,
    },

    /// The response body did not match the documented schema.
    #[error("malformed response: {reason}")]
    MalformedResponse {
        /// What failed to parse.
        reason: String,
    },
}

//! Core types describing GitLab CI observations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric identifier of a GitLab project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(u64);

impl ProjectId {
    /// Create a `ProjectId` from its numeric value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying numeric id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ProjectId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric identifier of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PipelineId(u64);

impl PipelineId {
    /// Create a `PipelineId` from its numeric value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the underlying numeric id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for PipelineId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The slice of a project's identity that metric families label on.
///
/// One `ProjectRef` exists per (project, ref) pair the polling loop watches.
/// The label tuple derived from it is the exporter's only notion of entity
/// identity; there is no separate persisted entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    /// Numeric project id, used when addressing the API.
    pub id: ProjectId,
    /// Full project path, e.g. `group/app`.
    pub path: String,
    /// Project topics, comma-joined in the order GitLab reports them.
    pub topics: String,
    /// Branch or tag the observed pipelines run against.
    pub git_ref: String,
}

impl ProjectRef {
    /// Create a new project reference.
    pub fn new(
        id: impl Into<ProjectId>,
        path: impl Into<String>,
        topics: impl Into<String>,
        git_ref: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            topics: topics.into(),
            git_ref: git_ref.into(),
        }
    }
}

/// A variable a pipeline was triggered with, as returned by the
/// `GET /projects/:id/pipelines/:pipeline_id/variables` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineVariable {
    /// Variable key.
    pub key: String,
    /// Variable value.
    pub value: String,
    /// `env_var` or `file`.
    #[serde(default = "PipelineVariable::default_type")]
    pub variable_type: String,
}

impl PipelineVariable {
    /// Create an `env_var`-typed variable.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            variable_type: Self::default_type(),
        }
    }

    fn default_type() -> String {
        "env_var".to_string()
    }
}

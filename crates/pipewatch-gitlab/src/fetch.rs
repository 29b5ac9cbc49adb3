//! Injected capability for fetching pipeline variables.

use std::collections::HashMap;
use std::future::Future;

use crate::error::ApiError;
use crate::types::{PipelineId, PipelineVariable, ProjectRef};

/// Supplies the variables a pipeline was triggered with.
///
/// The surrounding system implements this against the real GitLab endpoint
/// (with whatever pagination and retry policy it carries); tests substitute
/// [`StaticVariables`]. Variables must be returned in the order the
/// provider reports them; consumers rely on that order.
#[allow(async_fn_in_trait)]
pub trait PipelineVariablesSource: Send + Sync {
    /// Fetch the full variable list for one pipeline of a project.
    fn pipeline_variables(
        &self,
        project: &ProjectRef,
        pipeline: PipelineId,
    ) -> impl Future<Output = Result<Vec<PipelineVariable>, ApiError>> + Send;
}

/// In-memory variables source.
///
/// Answers from a fixed table and reports [`ApiError::NotFound`] for any
/// pipeline it does not know, which doubles as the failure path in tests.
#[derive(Debug, Default)]
pub struct StaticVariables {
    pipelines: HashMap<PipelineId, Vec<PipelineVariable>>,
}

impl StaticVariables {
    /// Create an empty source; every fetch fails with `NotFound`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the variable list for one pipeline.
    #[must_use]
    pub fn with_pipeline(
        mut self,
        pipeline: PipelineId,
        variables: Vec<PipelineVariable>,
    ) -> Self {
        self.pipelines.insert(pipeline, variables);
        self
    }
}

impl PipelineVariablesSource for StaticVariables {
    async fn pipeline_variables(
        &self,
        _project: &ProjectRef,
        pipeline: PipelineId,
    ) -> Result<Vec<PipelineVariable>, ApiError> {
        self.pipelines
            .get(&pipeline)
            .cloned()
            .ok_or(ApiError::NotFound { pipeline })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProjectId;

    fn project() -> ProjectRef {
        ProjectRef::new(ProjectId::new(1), "group/app", "", "main")
    }

    #[tokio::test]
    async fn static_source_returns_registered_variables_in_order() {
        let source = StaticVariables::new().with_pipeline(
            PipelineId::new(10),
            vec![
                PipelineVariable::new("B", "2"),
                PipelineVariable::new("A", "1"),
            ],
        );

        let variables = source
            .pipeline_variables(&project(), PipelineId::new(10))
            .await
            .expect("pipeline is registered");
        let keys: Vec<&str> = variables.iter().map(|v| v.key.as_str()).collect();
        assert_eq!(keys, ["B", "A"]);
    }

    #[tokio::test]
    async fn static_source_reports_unknown_pipelines() {
        let source = StaticVariables::new();
        let err = source
            .pipeline_variables(&project(), PipelineId::new(99))
            .await
            .expect_err("pipeline is not registered");
        assert!(matches!(err, ApiError::NotFound { .. }));
    }
}

//! Label model for the exporter's metric families.
//!
//! Every family shares the `project`, `topics`, `ref` prefix derived from a
//! [`ProjectRef`]; job-scoped families extend it with `stage` and
//! `job_name`, one-hot families with `status`, and the pipeline-variables
//! family with the joined key combination. Each label set is a typed struct
//! whose encoding order matches the declared label order, so a tuple of the
//! wrong arity is a compile error rather than a runtime surprise.

use std::fmt;

use pipewatch_gitlab::ProjectRef;
use prometheus_client::encoding::{EncodeLabel, EncodeLabelSet, LabelSetEncoder};

// The label sets below spell their encoding out instead of deriving it:
// the third label is named `ref`, which a struct field cannot carry
// through the derive without its raw-identifier prefix leaking into the
// exposition.

/// Labels shared by every per-project family: `project`, `topics`, `ref`.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct ProjectLabels {
    /// Full project path.
    pub project: String,
    /// Comma-joined project topics.
    pub topics: String,
    /// Branch or tag, exposed as the `ref` label.
    pub git_ref: String,
}

impl ProjectLabels {
    /// Canonical label prefix for a project reference.
    #[must_use]
    pub fn from_project(project: &ProjectRef) -> Self {
        Self {
            project: project.path.clone(),
            topics: project.topics.clone(),
            git_ref: project.git_ref.clone(),
        }
    }

    /// Extend with `stage` and `job_name` for job-scoped families.
    #[must_use]
    pub fn with_job(&self, stage: impl Into<String>, job_name: impl Into<String>) -> JobLabels {
        JobLabels {
            project: self.project.clone(),
            topics: self.topics.clone(),
            git_ref: self.git_ref.clone(),
            stage: stage.into(),
            job_name: job_name.into(),
        }
    }

    /// Extend with `status` for the pipeline one-hot family.
    #[must_use]
    pub fn with_status(&self, status: impl Into<String>) -> PipelineStatusLabels {
        PipelineStatusLabels {
            project: self.project.clone(),
            topics: self.topics.clone(),
            git_ref: self.git_ref.clone(),
            status: status.into(),
        }
    }

    /// Extend with the joined variable-key combination.
    #[must_use]
    pub fn with_variables(&self, pipeline_variables: impl Into<String>) -> VariableLabels {
        VariableLabels {
            project: self.project.clone(),
            topics: self.topics.clone(),
            git_ref: self.git_ref.clone(),
            pipeline_variables: pipeline_variables.into(),
        }
    }
}

impl From<&ProjectRef> for ProjectLabels {
    fn from(project: &ProjectRef) -> Self {
        Self::from_project(project)
    }
}

impl EncodeLabelSet for ProjectLabels {
    fn encode(&self, mut encoder: LabelSetEncoder<'_>) -> Result<(), fmt::Error> {
        ("project", self.project.as_str()).encode(encoder.encode_label())?;
        ("topics", self.topics.as_str()).encode(encoder.encode_label())?;
        ("ref", self.git_ref.as_str()).encode(encoder.encode_label())?;
        Ok(())
    }
}

/// Labels of job-scoped families: project prefix plus `stage`, `job_name`.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct JobLabels {
    /// Full project path.
    pub project: String,
    /// Comma-joined project topics.
    pub topics: String,
    /// Branch or tag, exposed as the `ref` label.
    pub git_ref: String,
    /// Pipeline stage the job belongs to.
    pub stage: String,
    /// Job name.
    pub job_name: String,
}

impl JobLabels {
    /// Extend with `status` for the job one-hot family.
    #[must_use]
    pub fn with_status(&self, status: impl Into<String>) -> JobStatusLabels {
        JobStatusLabels {
            project: self.project.clone(),
            topics: self.topics.clone(),
            git_ref: self.git_ref.clone(),
            stage: self.stage.clone(),
            job_name: self.job_name.clone(),
            status: status.into(),
        }
    }
}

impl EncodeLabelSet for JobLabels {
    fn encode(&self, mut encoder: LabelSetEncoder<'_>) -> Result<(), fmt::Error> {
        ("project", self.project.as_str()).encode(encoder.encode_label())?;
        ("topics", self.topics.as_str()).encode(encoder.encode_label())?;
        ("ref", self.git_ref.as_str()).encode(encoder.encode_label())?;
        ("stage", self.stage.as_str()).encode(encoder.encode_label())?;
        ("job_name", self.job_name.as_str()).encode(encoder.encode_label())?;
        Ok(())
    }
}

/// Labels of the pipeline status one-hot family.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct PipelineStatusLabels {
    /// Full project path.
    pub project: String,
    /// Comma-joined project topics.
    pub topics: String,
    /// Branch or tag, exposed as the `ref` label.
    pub git_ref: String,
    /// One member of the pipeline status enumeration.
    pub status: String,
}

impl EncodeLabelSet for PipelineStatusLabels {
    fn encode(&self, mut encoder: LabelSetEncoder<'_>) -> Result<(), fmt::Error> {
        ("project", self.project.as_str()).encode(encoder.encode_label())?;
        ("topics", self.topics.as_str()).encode(encoder.encode_label())?;
        ("ref", self.git_ref.as_str()).encode(encoder.encode_label())?;
        ("status", self.status.as_str()).encode(encoder.encode_label())?;
        Ok(())
    }
}

/// Labels of the job status one-hot family.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct JobStatusLabels {
    /// Full project path.
    pub project: String,
    /// Comma-joined project topics.
    pub topics: String,
    /// Branch or tag, exposed as the `ref` label.
    pub git_ref: String,
    /// Pipeline stage the job belongs to.
    pub stage: String,
    /// Job name.
    pub job_name: String,
    /// One member of the job status enumeration.
    pub status: String,
}

impl EncodeLabelSet for JobStatusLabels {
    fn encode(&self, mut encoder: LabelSetEncoder<'_>) -> Result<(), fmt::Error> {
        ("project", self.project.as_str()).encode(encoder.encode_label())?;
        ("topics", self.topics.as_str()).encode(encoder.encode_label())?;
        ("ref", self.git_ref.as_str()).encode(encoder.encode_label())?;
        ("stage", self.stage.as_str()).encode(encoder.encode_label())?;
        ("job_name", self.job_name.as_str()).encode(encoder.encode_label())?;
        ("status", self.status.as_str()).encode(encoder.encode_label())?;
        Ok(())
    }
}

/// Labels of the pipeline-variables family.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct VariableLabels {
    /// Full project path.
    pub project: String,
    /// Comma-joined project topics.
    pub topics: String,
    /// Branch or tag, exposed as the `ref` label.
    pub git_ref: String,
    /// Comma-joined matching variable keys, in fetch order.
    pub pipeline_variables: String,
}

impl EncodeLabelSet for VariableLabels {
    fn encode(&self, mut encoder: LabelSetEncoder<'_>) -> Result<(), fmt::Error> {
        ("project", self.project.as_str()).encode(encoder.encode_label())?;
        ("topics", self.topics.as_str()).encode(encoder.encode_label())?;
        ("ref", self.git_ref.as_str()).encode(encoder.encode_label())?;
        ("pipeline_variables", self.pipeline_variables.as_str()).encode(encoder.encode_label())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus_client::encoding::text::encode;
    use prometheus_client::metrics::family::Family;
    use prometheus_client::metrics::gauge::Gauge;
    use prometheus_client::registry::Registry;
    use std::sync::atomic::AtomicU64;

    fn project() -> ProjectRef {
        ProjectRef::new(1_u64, "group/app", "backend,rust", "main")
    }

    #[test]
    fn project_labels_encode_in_declared_order() {
        let mut registry = Registry::default();
        let family = Family::<ProjectLabels, Gauge<f64, AtomicU64>>::default();
        registry.register("probe", "probe", family.clone());
        family
            .get_or_create(&ProjectLabels::from_project(&project()))
            .set(1.0);

        let mut body = String::new();
        encode(&mut body, &registry).expect("encodes");
        assert!(
            body.contains(r#"probe{project="group/app",topics="backend,rust",ref="main"}"#),
            "unexpected exposition: {body}"
        );
    }

    #[test]
    fn job_status_labels_put_status_last() {
        let mut registry = Registry::default();
        let family = Family::<JobStatusLabels, Gauge<f64, AtomicU64>>::default();
        registry.register("probe", "probe", family.clone());
        let labels = ProjectLabels::from_project(&project())
            .with_job("build", "unit-test")
            .with_status("failed");
        family.get_or_create(&labels).set(1.0);

        let mut body = String::new();
        encode(&mut body, &registry).expect("encodes");
        assert!(
            body.contains(r#"stage="build",job_name="unit-test",status="failed""#),
            "unexpected exposition: {body}"
        );
    }

    #[test]
    fn identical_values_address_the_same_series() {
        let a = ProjectLabels::from_project(&project()).with_variables("CI_A,CI_B");
        let b = ProjectLabels::from_project(&project()).with_variables("CI_A,CI_B");
        assert_eq!(a, b);
    }

    #[test]
    fn different_refs_address_different_series() {
        let main = ProjectLabels::from_project(&project());
        let dev = ProjectLabels {
            git_ref: "dev".to_string(),
            ..main.clone()
        };
        assert_ne!(main, dev);
    }
}

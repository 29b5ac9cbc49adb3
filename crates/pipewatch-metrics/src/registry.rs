//! Metric registry, the default family set, and exposition.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use parking_lot::RwLock;
use pipewatch_gitlab::{CallGate, PipelineId, PipelineVariablesSource, ProjectRef};
use prometheus_client::encoding::text::{encode, encode_registry};
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::{Metric, Registry};
use regex::Regex;
use tracing::warn;

use crate::error::{FetchError, RegistrationError};
use crate::labels::{
    JobLabels, JobStatusLabels, PipelineStatusLabels, ProjectLabels, VariableLabels,
};
use crate::status::emit_status;
use crate::variables::emit_pipeline_variables;

/// A gauge holding an `f64`, the value type of every default family.
pub type FloatGauge = Gauge<f64, AtomicU64>;

/// Family of float gauges keyed by a label set.
pub type GaugeFamily<S> = Family<S, FloatGauge>;

/// Content type of the OpenMetrics text format.
pub const OPENMETRICS_CONTENT_TYPE: &str =
    "application/openmetrics-text; version=1.0.0; charset=utf-8";

/// Content type of the legacy Prometheus text format.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

const COVERAGE: &str = "gitlab_ci_pipeline_coverage";
const LAST_RUN_DURATION: &str = "gitlab_ci_pipeline_last_run_duration_seconds";
const LAST_JOB_RUN_DURATION: &str = "gitlab_ci_pipeline_last_job_run_duration_seconds";
const LAST_JOB_RUN_STATUS: &str = "gitlab_ci_pipeline_last_job_run_status";
const LAST_JOB_RUN_ARTIFACT_SIZE: &str = "gitlab_ci_pipeline_last_job_run_artifact_size";
const TIME_SINCE_LAST_JOB_RUN: &str = "gitlab_ci_pipeline_time_since_last_job_run_seconds";
const JOB_RUN_COUNT: &str = "gitlab_ci_pipeline_job_run_count";
const LAST_RUN_ID: &str = "gitlab_ci_pipeline_last_run_id";
const LAST_RUN_STATUS: &str = "gitlab_ci_pipeline_last_run_status";
const RUN_COUNT: &str = "gitlab_ci_pipeline_run_count";
const TIME_SINCE_LAST_RUN: &str = "gitlab_ci_pipeline_time_since_last_run_seconds";
const PIPELINE_VARIABLES: &str = "gitlab_ci_pipeline_run_count_with_variable";
const UNRECOGNIZED_STATUS: &str = "gitlab_ci_exporter_unrecognized_status";

/// Labels of the unrecognized-status diagnostic counter.
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct UnrecognizedStatusLabels {
    /// The status family the observation was emitted against.
    pub family: String,
    /// The observed status missing from the configured enumeration.
    pub status: String,
}

/// Process-wide metric registry.
///
/// One instance is created at startup and passed explicitly to everything
/// that emits or exposes metrics; tests build as many independent
/// registries as they need. Family names are unique: a second registration
/// under an existing name is refused.
#[derive(Clone)]
pub struct MetricsRegistry {
    inner: Arc<RwLock<Registry>>,
    names: Arc<RwLock<HashSet<String>>>,
}

impl fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("families", &self.names.read().len())
            .finish_non_exhaustive()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Registry::default())),
            names: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Register a metric family under a unique name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] naming the family when the name is
    /// already taken.
    pub fn register(
        &self,
        name: &str,
        help: &str,
        metric: impl Metric,
    ) -> Result<(), RegistrationError> {
        let mut names = self.names.write();
        if !names.insert(name.to_string()) {
            return Err(RegistrationError {
                family: name.to_string(),
                reason: "a family with this name is already registered".to_string(),
            });
        }
        self.inner.write().register(name, help, metric);
        Ok(())
    }

    /// Register every predefined family.
    ///
    /// Called once at startup; the returned [`CiMetrics`] is the only
    /// handle to the default families.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] on the first name collision.
    pub fn register_defaults(&self) -> Result<CiMetrics, RegistrationError> {
        CiMetrics::new(self)
    }

    /// Build and register a standalone gauge family with operator-defined
    /// labels, outside the default set.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError`] when the name is already taken.
    pub fn variable_labelled_gauge<S>(
        &self,
        name: &str,
        help: &str,
    ) -> Result<GaugeFamily<S>, RegistrationError>
    where
        S: Clone + Eq + Hash + EncodeLabelSet + fmt::Debug + Send + Sync + 'static,
    {
        let family = GaugeFamily::<S>::default();
        self.register(name, help, family.clone())?;
        Ok(family)
    }

    /// Produce a handler serializing the registry's current state.
    ///
    /// `use_open_metrics` selects the OpenMetrics text format; disabling it
    /// falls back to the legacy Prometheus text format. Each call to the
    /// handler takes a read-only snapshot; it never fails because of a
    /// prior fetch error.
    #[must_use]
    pub fn exposition_handler(&self, use_open_metrics: bool) -> ExpositionHandler {
        ExpositionHandler {
            registry: Arc::clone(&self.inner),
            use_open_metrics,
        }
    }
}

/// The exporter's default metric families.
///
/// Families are cheap shared handles; clone freely across workers. All
/// helpers are safe to call concurrently: series are synchronized
/// individually, so unrelated label tuples never contend.
#[derive(Clone, Debug)]
pub struct CiMetrics {
    coverage: GaugeFamily<ProjectLabels>,
    last_run_duration: GaugeFamily<ProjectLabels>,
    last_job_run_duration: GaugeFamily<JobLabels>,
    last_job_run_status: GaugeFamily<JobStatusLabels>,
    last_job_run_artifact_size: GaugeFamily<JobLabels>,
    time_since_last_job_run: GaugeFamily<JobLabels>,
    job_run_count: GaugeFamily<JobLabels>,
    last_run_id: GaugeFamily<ProjectLabels>,
    last_run_status: GaugeFamily<PipelineStatusLabels>,
    run_count: GaugeFamily<ProjectLabels>,
    time_since_last_run: GaugeFamily<ProjectLabels>,
    pipeline_variables: GaugeFamily<VariableLabels>,
    unrecognized_status: Family<UnrecognizedStatusLabels, Counter>,
}

impl CiMetrics {
    fn new(registry: &MetricsRegistry) -> Result<Self, RegistrationError> {
        let coverage = GaugeFamily::default();
        registry.register(
            COVERAGE,
            "Coverage of the most recent pipeline",
            coverage.clone(),
        )?;

        let last_run_duration = GaugeFamily::default();
        registry.register(
            LAST_RUN_DURATION,
            "Duration of last pipeline run",
            last_run_duration.clone(),
        )?;

        let last_job_run_duration = GaugeFamily::default();
        registry.register(
            LAST_JOB_RUN_DURATION,
            "Duration of last job run",
            last_job_run_duration.clone(),
        )?;

        let last_job_run_status = GaugeFamily::default();
        registry.register(
            LAST_JOB_RUN_STATUS,
            "Status of the most recent job",
            last_job_run_status.clone(),
        )?;

        let last_job_run_artifact_size = GaugeFamily::default();
        registry.register(
            LAST_JOB_RUN_ARTIFACT_SIZE,
            "Filesize of the most recent job artifacts",
            last_job_run_artifact_size.clone(),
        )?;

        let time_since_last_job_run = GaugeFamily::default();
        registry.register(
            TIME_SINCE_LAST_JOB_RUN,
            "Elapsed time since most recent GitLab CI job run",
            time_since_last_job_run.clone(),
        )?;

        let job_run_count = GaugeFamily::default();
        registry.register(
            JOB_RUN_COUNT,
            "GitLab CI pipeline job run count",
            job_run_count.clone(),
        )?;

        let last_run_id = GaugeFamily::default();
        registry.register(
            LAST_RUN_ID,
            "ID of the most recent pipeline",
            last_run_id.clone(),
        )?;

        let last_run_status = GaugeFamily::default();
        registry.register(
            LAST_RUN_STATUS,
            "Status of the most recent pipeline",
            last_run_status.clone(),
        )?;

        let run_count = GaugeFamily::default();
        registry.register(RUN_COUNT, "GitLab CI pipeline run count", run_count.clone())?;

        let time_since_last_run = GaugeFamily::default();
        registry.register(
            TIME_SINCE_LAST_RUN,
            "Elapsed time since most recent GitLab CI pipeline run",
            time_since_last_run.clone(),
        )?;

        let pipeline_variables = GaugeFamily::default();
        registry.register(
            PIPELINE_VARIABLES,
            "Count of pipelines with variables",
            pipeline_variables.clone(),
        )?;

        let unrecognized_status = Family::<UnrecognizedStatusLabels, Counter>::default();
        registry.register(
            UNRECOGNIZED_STATUS,
            "Observed statuses missing from the configured enumeration",
            unrecognized_status.clone(),
        )?;

        Ok(Self {
            coverage,
            last_run_duration,
            last_job_run_duration,
            last_job_run_status,
            last_job_run_artifact_size,
            time_since_last_job_run,
            job_run_count,
            last_run_id,
            last_run_status,
            run_count,
            time_since_last_run,
            pipeline_variables,
            unrecognized_status,
        })
    }

    /// Set the coverage percentage of a project's most recent pipeline.
    pub fn set_coverage(&self, project: &ProjectRef, percent: f64) {
        self.coverage
            .get_or_create(&ProjectLabels::from_project(project))
            .set(percent);
    }

    /// Get the recorded coverage for a project.
    #[must_use]
    pub fn get_coverage(&self, project: &ProjectRef) -> f64 {
        self.coverage
            .get_or_create(&ProjectLabels::from_project(project))
            .get()
    }

    /// Set the duration of the most recent pipeline run.
    pub fn set_last_run_duration_seconds(&self, project: &ProjectRef, seconds: f64) {
        self.last_run_duration
            .get_or_create(&ProjectLabels::from_project(project))
            .set(seconds);
    }

    /// Set the id of the most recent pipeline run.
    pub fn set_last_run_id(&self, project: &ProjectRef, pipeline: PipelineId) {
        self.last_run_id
            .get_or_create(&ProjectLabels::from_project(project))
            .set(pipeline.get() as f64);
    }

    /// One-hot encode the most recent pipeline status across the supplied
    /// enumeration.
    ///
    /// A status outside the enumeration turns every member off and is
    /// recorded on the unrecognized-status diagnostic.
    pub fn set_last_run_status(
        &self,
        project: &ProjectRef,
        statuses: &[impl AsRef<str>],
        observed: &str,
        sparse: bool,
    ) {
        let base = ProjectLabels::from_project(project);
        emit_status(&self.last_run_status, statuses, observed, sparse, |s| {
            base.with_status(s)
        });
        self.note_unrecognized(LAST_RUN_STATUS, statuses, observed);
    }

    /// Increment the pipeline run count.
    pub fn inc_run_count(&self, project: &ProjectRef) {
        self.run_count
            .get_or_create(&ProjectLabels::from_project(project))
            .inc();
    }

    /// Get the recorded pipeline run count.
    #[must_use]
    pub fn get_run_count(&self, project: &ProjectRef) -> f64 {
        self.run_count
            .get_or_create(&ProjectLabels::from_project(project))
            .get()
    }

    /// Set the elapsed time since the most recent pipeline run.
    pub fn set_time_since_last_run_seconds(&self, project: &ProjectRef, seconds: f64) {
        self.time_since_last_run
            .get_or_create(&ProjectLabels::from_project(project))
            .set(seconds);
    }

    /// Set the duration of a job's most recent run.
    pub fn set_last_job_run_duration_seconds(
        &self,
        project: &ProjectRef,
        stage: &str,
        job_name: &str,
        seconds: f64,
    ) {
        self.last_job_run_duration
            .get_or_create(&ProjectLabels::from_project(project).with_job(stage, job_name))
            .set(seconds);
    }

    /// One-hot encode a job's most recent status across the supplied
    /// enumeration.
    ///
    /// A status outside the enumeration turns every member off and is
    /// recorded on the unrecognized-status diagnostic.
    pub fn set_last_job_run_status(
        &self,
        project: &ProjectRef,
        stage: &str,
        job_name: &str,
        statuses: &[impl AsRef<str>],
        observed: &str,
        sparse: bool,
    ) {
        let base = ProjectLabels::from_project(project).with_job(stage, job_name);
        emit_status(&self.last_job_run_status, statuses, observed, sparse, |s| {
            base.with_status(s)
        });
        self.note_unrecognized(LAST_JOB_RUN_STATUS, statuses, observed);
    }

    /// Set the artifact size of a job's most recent run.
    pub fn set_last_job_run_artifact_size(
        &self,
        project: &ProjectRef,
        stage: &str,
        job_name: &str,
        bytes: f64,
    ) {
        self.last_job_run_artifact_size
            .get_or_create(&ProjectLabels::from_project(project).with_job(stage, job_name))
            .set(bytes);
    }

    /// Set the elapsed time since a job's most recent run.
    pub fn set_time_since_last_job_run_seconds(
        &self,
        project: &ProjectRef,
        stage: &str,
        job_name: &str,
        seconds: f64,
    ) {
        self.time_since_last_job_run
            .get_or_create(&ProjectLabels::from_project(project).with_job(stage, job_name))
            .set(seconds);
    }

    /// Increment a job's run count.
    pub fn inc_job_run_count(&self, project: &ProjectRef, stage: &str, job_name: &str) {
        self.job_run_count
            .get_or_create(&ProjectLabels::from_project(project).with_job(stage, job_name))
            .inc();
    }

    /// Get a job's recorded run count.
    #[must_use]
    pub fn get_job_run_count(&self, project: &ProjectRef, stage: &str, job_name: &str) -> f64 {
        self.job_run_count
            .get_or_create(&ProjectLabels::from_project(project).with_job(stage, job_name))
            .get()
    }

    /// Record which variables of interest a pipeline was triggered with.
    ///
    /// See [`emit_pipeline_variables`] for the gate/fetch/filter contract.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when the variables fetch fails; no metric is
    /// emitted in that case.
    pub async fn record_pipeline_variables<G, S>(
        &self,
        project: &ProjectRef,
        pipeline: PipelineId,
        gate: &G,
        source: &S,
        filter: &Regex,
    ) -> Result<(), FetchError>
    where
        G: CallGate,
        S: PipelineVariablesSource,
    {
        emit_pipeline_variables(
            &self.pipeline_variables,
            project,
            pipeline,
            gate,
            source,
            filter,
        )
        .await
    }

    /// Get how often an unrecognized status was observed against a family.
    #[must_use]
    pub fn get_unrecognized_status_count(&self, family: &str, status: &str) -> u64 {
        self.unrecognized_status
            .get_or_create(&UnrecognizedStatusLabels {
                family: family.to_string(),
                status: status.to_string(),
            })
            .get()
    }

    fn note_unrecognized(&self, family: &str, statuses: &[impl AsRef<str>], observed: &str) {
        if statuses.iter().any(|s| s.as_ref() == observed) {
            return;
        }
        warn!(
            family,
            status = observed,
            "observed status missing from the configured enumeration"
        );
        self.unrecognized_status
            .get_or_create(&UnrecognizedStatusLabels {
                family: family.to_string(),
                status: observed.to_string(),
            })
            .inc();
    }
}

/// Serializes the registry for scraping.
///
/// Framework-neutral: the surrounding HTTP layer calls [`handle`] per
/// request and copies body and content type into its response type.
///
/// [`handle`]: ExpositionHandler::handle
#[derive(Clone)]
pub struct ExpositionHandler {
    registry: Arc<RwLock<Registry>>,
    use_open_metrics: bool,
}

impl fmt::Debug for ExpositionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpositionHandler")
            .field("use_open_metrics", &self.use_open_metrics)
            .finish_non_exhaustive()
    }
}

impl ExpositionHandler {
    /// Serialize the current state of every registered family.
    #[must_use]
    pub fn handle(&self) -> ExpositionResponse {
        let registry = self.registry.read();
        let mut body = String::new();
        let result = if self.use_open_metrics {
            encode(&mut body, &registry)
        } else {
            encode_registry(&mut body, &registry)
        };
        if result.is_err() {
            tracing::error!("failed to encode metrics exposition");
            body.clear();
        }
        ExpositionResponse {
            body,
            content_type: if self.use_open_metrics {
                OPENMETRICS_CONTENT_TYPE
            } else {
                TEXT_CONTENT_TYPE
            },
        }
    }
}

/// One rendered scrape.
#[derive(Debug, Clone)]
pub struct ExpositionResponse {
    /// Serialized metrics in the selected text format.
    pub body: String,
    /// Value for the `Content-Type` response header.
    pub content_type: &'static str,
}

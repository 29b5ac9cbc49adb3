//! Pipeline variable metrics.
//!
//! Pipelines can be triggered with arbitrary variables; exposing each key
//! as its own label would explode cardinality with the cross-product of
//! keys. Instead, the keys matching the configured filter are joined into a
//! single label value, so cardinality is bounded by the set of observed
//! key *combinations*, and the gauge counts pipeline runs per combination.

use pipewatch_gitlab::{CallGate, PipelineId, PipelineVariablesSource, ProjectRef};
use regex::Regex;
use tracing::debug;

use crate::error::FetchError;
use crate::labels::{ProjectLabels, VariableLabels};
use crate::registry::GaugeFamily;

/// Record which variables of interest a pipeline was triggered with.
///
/// Waits on the rate-limiter gate, fetches the pipeline's variables through
/// the injected source, keeps the keys matching `filter` in fetch order,
/// joins them with `,` and increments the gauge for that combination.
///
/// No series is created when nothing matches; absence, not zero, means
/// "no variables of interest".
///
/// # Errors
///
/// Returns [`FetchError`] naming the pipeline when the fetch fails; the
/// gauge family is left untouched in that case.
pub async fn emit_pipeline_variables<G, S>(
    gauge: &GaugeFamily<VariableLabels>,
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
    gate.acquire().await;
    let variables = source
        .pipeline_variables(project, pipeline)
        .await
        .map_err(|source| FetchError { pipeline, source })?;

    let matching: Vec<&str> = variables
        .iter()
        .map(|variable| variable.key.as_str())
        .filter(|key| filter.is_match(key))
        .collect();
    if matching.is_empty() {
        return Ok(());
    }

    let joined = matching.join(",");
    debug!(%pipeline, variables = %joined, "recording pipeline variables");
    gauge
        .get_or_create(&ProjectLabels::from_project(project).with_variables(joined))
        .inc();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipewatch_gitlab::{NoopGate, PipelineVariable, StaticVariables};
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn project() -> ProjectRef {
        ProjectRef::new(1_u64, "group/app", "backend", "main")
    }

    fn filter(pattern: &str) -> Regex {
        Regex::new(pattern).expect("test pattern compiles")
    }

    /// Gate that counts how often it is acquired.
    #[derive(Debug, Default)]
    struct CountingGate {
        acquired: AtomicUsize,
    }

    impl CallGate for CountingGate {
        fn acquire(&self) -> impl Future<Output = ()> + Send {
            self.acquired.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test]
    async fn matching_keys_join_in_fetch_order() {
        let gauge = GaugeFamily::<VariableLabels>::default();
        let source = StaticVariables::new().with_pipeline(
            PipelineId::new(7),
            vec![
                PipelineVariable::new("B", "2"),
                PipelineVariable::new("A", "1"),
            ],
        );

        emit_pipeline_variables(
            &gauge,
            &project(),
            PipelineId::new(7),
            &NoopGate,
            &source,
            &filter(".*"),
        )
        .await
        .expect("fetch succeeds");

        let labels = ProjectLabels::from_project(&project()).with_variables("B,A");
        assert_eq!(gauge.get_or_create(&labels).get(), 1.0);
    }

    #[tokio::test]
    async fn non_matching_keys_are_dropped() {
        let gauge = GaugeFamily::<VariableLabels>::default();
        let source = StaticVariables::new().with_pipeline(
            PipelineId::new(7),
            vec![
                PipelineVariable::new("CI_ENV", "prod"),
                PipelineVariable::new("SECRET", "x"),
                PipelineVariable::new("CI_TAG", "v1"),
            ],
        );

        emit_pipeline_variables(
            &gauge,
            &project(),
            PipelineId::new(7),
            &NoopGate,
            &source,
            &filter("^CI_.*"),
        )
        .await
        .expect("fetch succeeds");

        let labels = ProjectLabels::from_project(&project()).with_variables("CI_ENV,CI_TAG");
        assert_eq!(gauge.get_or_create(&labels).get(), 1.0);
    }

    #[tokio::test]
    async fn zero_matches_create_no_series() {
        let gauge = GaugeFamily::<VariableLabels>::default();
        let source = StaticVariables::new().with_pipeline(
            PipelineId::new(7),
            vec![PipelineVariable::new("SECRET", "x")],
        );

        emit_pipeline_variables(
            &gauge,
            &project(),
            PipelineId::new(7),
            &NoopGate,
            &source,
            &filter("^CI_.*"),
        )
        .await
        .expect("fetch succeeds");

        // The family must not have materialized any series.
        let mut registry = prometheus_client::registry::Registry::default();
        registry.register("vars", "probe", gauge.clone());
        let mut body = String::new();
        prometheus_client::encoding::text::encode(&mut body, &registry).expect("encodes");
        assert!(!body.contains("vars{"), "exposition: {body}");
    }

    #[tokio::test]
    async fn repeated_runs_increment_the_same_series() {
        let gauge = GaugeFamily::<VariableLabels>::default();
        let source = StaticVariables::new().with_pipeline(
            PipelineId::new(7),
            vec![PipelineVariable::new("CI_ENV", "prod")],
        );

        for _ in 0..3 {
            emit_pipeline_variables(
                &gauge,
                &project(),
                PipelineId::new(7),
                &NoopGate,
                &source,
                &filter("^CI_.*"),
            )
            .await
            .expect("fetch succeeds");
        }

        let labels = ProjectLabels::from_project(&project()).with_variables("CI_ENV");
        assert_eq!(gauge.get_or_create(&labels).get(), 3.0);
    }

    #[tokio::test]
    async fn fetch_failure_names_the_pipeline_and_emits_nothing() {
        let gauge = GaugeFamily::<VariableLabels>::default();
        let source = StaticVariables::new();

        let err = emit_pipeline_variables(
            &gauge,
            &project(),
            PipelineId::new(42),
            &NoopGate,
            &source,
            &filter(".*"),
        )
        .await
        .expect_err("pipeline is unknown");

        assert!(err.to_string().contains("42"), "error: {err}");
        let mut registry = prometheus_client::registry::Registry::default();
        registry.register("vars", "probe", gauge.clone());
        let mut body = String::new();
        prometheus_client::encoding::text::encode(&mut body, &registry).expect("encodes");
        assert!(!body.contains("vars{"), "exposition: {body}");
    }

    #[tokio::test]
    async fn gate_is_acquired_once_per_emission() {
        let gauge = GaugeFamily::<VariableLabels>::default();
        let gate = CountingGate::default();
        let source = StaticVariables::new().with_pipeline(
            PipelineId::new(7),
            vec![PipelineVariable::new("CI_ENV", "prod")],
        );

        emit_pipeline_variables(
            &gauge,
            &project(),
            PipelineId::new(7),
            &gate,
            &source,
            &filter(".*"),
        )
        .await
        .expect("fetch succeeds");

        assert_eq!(gate.acquired.load(Ordering::SeqCst), 1);
    }
}

//! # pipewatch-metrics
//!
//! Metric emission engine for the pipewatch GitLab CI exporter.
//!
//! An external polling loop observes pipelines and jobs through the GitLab
//! API and feeds each observation into the engine, which maintains a set of
//! labelled gauge families and serves them for scraping. The engine holds
//! no history: every scrape reflects the most recently fetched state.
//!
//! - [`MetricsRegistry`] owns the families and produces the exposition
//!   handler (OpenMetrics by default, legacy Prometheus text on request).
//! - [`CiMetrics`] is the handle to the default family set, with one-hot
//!   status encoding in dense (zero-fill) or sparse (delete) mode.
//! - [`emit_pipeline_variables`] records which pipelines ran with variables
//!   of interest, behind a rate-limiter call gate and a key filter.
//!
//! # Example
//!
//! ```rust
//! use pipewatch_gitlab::{ProjectRef, JOB_STATUSES};
//! use pipewatch_metrics::MetricsRegistry;
//!
//! let registry = MetricsRegistry::new();
//! let metrics = registry.register_defaults().unwrap();
//!
//! let project = ProjectRef::new(3_u64, "group/app", "backend", "main");
//! metrics.set_coverage(&project, 87.3);
//! metrics.set_last_job_run_status(&project, "test", "unit", JOB_STATUSES, "success", false);
//!
//! let scrape = registry.exposition_handler(true).handle();
//! assert!(scrape.body.contains("gitlab_ci_pipeline_coverage"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod labels;
pub mod registry;
pub mod status;
pub mod variables;

pub use config::MetricsConfig;
pub use error::{ConfigError, FetchError, RegistrationError};
pub use registry::{
    CiMetrics, ExpositionHandler, ExpositionResponse, FloatGauge, GaugeFamily, MetricsRegistry,
    OPENMETRICS_CONTENT_TYPE, TEXT_CONTENT_TYPE,
};
pub use status::{emit_status, one_hot, SeriesAction};
pub use variables::emit_pipeline_variables;

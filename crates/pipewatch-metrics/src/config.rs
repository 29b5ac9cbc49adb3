//! Configuration surface consumed by the emission engine.
//!
//! The surrounding configuration layer deserializes this from whatever
//! source it owns and hands it in at startup; nothing here is re-read per
//! scrape.

use pipewatch_gitlab::{JOB_STATUSES, PIPELINE_STATUSES};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Delete non-matching status series instead of zero-filling them.
    pub sparse: bool,
    /// Serve the OpenMetrics text format; legacy Prometheus text otherwise.
    pub use_open_metrics: bool,
    /// Regular expression selecting pipeline variable keys of interest.
    pub variables_filter: String,
    /// Full status enumeration for the pipeline one-hot family.
    pub pipeline_statuses: Vec<String>,
    /// Full status enumeration for the job one-hot family.
    pub job_statuses: Vec<String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            sparse: false,
            use_open_metrics: true,
            variables_filter: ".*".to_string(),
            pipeline_statuses: PIPELINE_STATUSES.iter().map(|s| (*s).to_string()).collect(),
            job_statuses: JOB_STATUSES.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

impl MetricsConfig {
    /// Compile the variable key filter.
    ///
    /// Compiled once at startup so an invalid pattern surfaces here and
    /// never on the emission path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFilter`] when the pattern does not
    /// compile.
    pub fn compile_filter(&self) -> Result<Regex, ConfigError> {
        Regex::new(&self.variables_filter).map_err(|source| ConfigError::InvalidFilter {
            pattern: self.variables_filter.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_the_full_enumerations() {
        let config = MetricsConfig::default();
        assert!(!config.sparse);
        assert!(config.use_open_metrics);
        assert_eq!(config.pipeline_statuses.len(), PIPELINE_STATUSES.len());
        assert_eq!(config.job_statuses.len(), JOB_STATUSES.len());
        assert!(config.compile_filter().is_ok());
    }

    #[test]
    fn partial_config_fills_in_defaults() {
        let config: MetricsConfig =
            serde_json::from_str(r#"{"sparse": true, "variables_filter": "^CI_.*"}"#)
                .expect("deserializes");
        assert!(config.sparse);
        assert!(config.use_open_metrics);
        assert_eq!(config.variables_filter, "^CI_.*");
        assert!(config.job_statuses.contains(&"success".to_string()));
    }

    #[test]
    fn invalid_filter_is_a_config_error() {
        let config = MetricsConfig {
            variables_filter: "([".to_string(),
            ..MetricsConfig::default()
        };
        let err = config.compile_filter().expect_err("pattern is invalid");
        assert!(err.to_string().contains("(["), "error: {err}");
    }
}

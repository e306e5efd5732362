use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::graph::DriverMode;
use crate::rules::DutyRules;
use crate::trip::Location;

/// Settings of one solve. Every field has a default, so a partial JSON file works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub rules: DutyRules,
    pub mode: DriverMode,
    /// Pricing rounds before the loop stops without convergence
    pub max_iterations: usize,
    /// Wall-clock budget of the integer resolve
    pub integer_time_limit_secs: u64,
    /// A duty is only added when its dual price exceeds `1 + convergence_epsilon`
    pub convergence_epsilon: f64,
    /// Locations where a duty may start and end without penalty
    pub depot_locations: Vec<Location>,
    /// Verifier penalty per duty end away from a depot
    pub changeover_penalty: i64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            rules: DutyRules::default(),
            mode: DriverMode::Single,
            max_iterations: 1000,
            integer_time_limit_secs: 300,
            convergence_epsilon: 1e-12,
            depot_locations: vec![1, 99999],
            changeover_penalty: 30,
        }
    }
}

impl SolverConfig {
    pub fn from_json(source: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&source)
    }

    pub fn integer_time_limit(&self) -> Duration {
        Duration::from_secs(self.integer_time_limit_secs)
    }

    pub fn is_depot(&self, location: Location) -> bool {
        self.depot_locations.contains(&location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SolverConfig::from_json(
            r#"{ "mode": "relay", "rules": { "max_span": 600 }, "max_iterations": 50 }"#,
        )
        .unwrap();

        assert_eq!(config.mode, DriverMode::Relay);
        assert_eq!(config.max_iterations, 50);
        assert_eq!(config.rules.max_span, 600);
        assert_eq!(config.rules.min_break, 30);
        assert_eq!(config.integer_time_limit(), Duration::from_secs(300));
        assert!(config.is_depot(99999));
    }

    #[test]
    fn test_rejects_unknown_mode() {
        let err = SolverConfig::from_json(r#"{ "mode": "triple" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = SolverConfig::from_json_path("/nonexistent/dutygen.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

//! Run configuration from environment.

use greenreach_core::{ClassificationRules, ClassifierConfig, NetworkConfig};
use std::env;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub near_threshold_m: f64,
    pub moderate_threshold_m: f64,
    pub coordinate_precision: f64,
    pub export_paths: bool,
}

impl Default for Config {
    fn default() -> Self {
        let rules = ClassificationRules::default();
        Self {
            near_threshold_m: rules.near_threshold_m,
            moderate_threshold_m: rules.moderate_threshold_m,
            coordinate_precision: NetworkConfig::default().coordinate_precision,
            export_paths: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            near_threshold_m: lookup("GREENREACH_NEAR_M")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.near_threshold_m),
            moderate_threshold_m: lookup("GREENREACH_MODERATE_M")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.moderate_threshold_m),
            coordinate_precision: lookup("GREENREACH_PRECISION")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.coordinate_precision),
            export_paths: lookup("GREENREACH_EXPORT_PATHS")
                .map(|s| !matches!(s.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no"))
                .unwrap_or(defaults.export_paths),
        }
    }

    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            rules: ClassificationRules {
                near_threshold_m: self.near_threshold_m,
                moderate_threshold_m: self.moderate_threshold_m,
            },
            network: NetworkConfig {
                coordinate_precision: self.coordinate_precision,
            },
            export_paths: self.export_paths,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn unset_environment_gives_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config, Config::default());
        assert_eq!(config.near_threshold_m, 100.0);
        assert_eq!(config.moderate_threshold_m, 250.0);
        assert!(config.export_paths);
    }

    #[test]
    fn reads_overrides_and_ignores_garbage() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("GREENREACH_NEAR_M", "150"),
            ("GREENREACH_MODERATE_M", "not-a-number"),
            ("GREENREACH_EXPORT_PATHS", "false"),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.near_threshold_m, 150.0);
        assert_eq!(config.moderate_threshold_m, 250.0);
        assert!(!config.export_paths);

        let classifier = config.classifier_config();
        assert_eq!(classifier.rules.near_threshold_m, 150.0);
        assert!(!classifier.export_paths);
    }
}

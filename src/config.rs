//! Run configuration for the command line.
//!
//! A TOML file names the input files, the optional output path, and the
//! analysis options:
//!
//! ```toml
//! input-files = ["tree.json"]
//! output-path = "results.json"
//!
//! [analysis]
//! probability = "true"
//! importance = "1"
//!
//! [approximations]
//! approx = "rare-event"
//!
//! [limits]
//! mission-time = 48.0
//! num-trials = 777
//! seed = 97531
//! ```
//!
//! Analysis switches are the strings `"1"`, `"true"`, `"0"`, `"false"`;
//! anything else is rejected as a validation error rather than silently
//! defaulted.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::settings::Settings;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default, rename = "input-files")]
    input_files: Vec<String>,
    #[serde(default, rename = "output-path")]
    output_path: Option<String>,
    #[serde(default)]
    analysis: RawAnalysis,
    #[serde(default)]
    approximations: RawApproximations,
    #[serde(default)]
    limits: RawLimits,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAnalysis {
    probability: Option<String>,
    importance: Option<String>,
    uncertainty: Option<String>,
    ccf: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawApproximations {
    approx: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLimits {
    #[serde(rename = "limit-order")]
    limit_order: Option<u32>,
    #[serde(rename = "mission-time")]
    mission_time: Option<f64>,
    #[serde(rename = "cut-off")]
    cut_off: Option<f64>,
    #[serde(rename = "num-sums")]
    num_sums: Option<u32>,
    #[serde(rename = "num-trials")]
    num_trials: Option<u32>,
    seed: Option<u64>,
}

/// Parsed run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub input_files: Vec<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub settings: Settings,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let raw: RawConfig =
            toml::from_str(text).map_err(|e| Error::config(format!("malformed configuration: {}", e)))?;

        let mut settings = Settings::default();
        if let Some(flag) = raw.analysis.probability.as_deref() {
            settings.probability_analysis(parse_bool_flag(flag)?);
        }
        if let Some(flag) = raw.analysis.importance.as_deref() {
            settings.importance_analysis(parse_bool_flag(flag)?);
        }
        if let Some(flag) = raw.analysis.uncertainty.as_deref() {
            settings.uncertainty_analysis(parse_bool_flag(flag)?);
        }
        if let Some(flag) = raw.analysis.ccf.as_deref() {
            settings.ccf_analysis(parse_bool_flag(flag)?);
        }
        if let Some(name) = raw.approximations.approx.as_deref() {
            settings.approx(name)?;
        }
        if let Some(limit) = raw.limits.limit_order {
            settings.limit_order(limit)?;
        }
        if let Some(hours) = raw.limits.mission_time {
            settings.mission_time(hours)?;
        }
        if let Some(cut_off) = raw.limits.cut_off {
            settings.cut_off(cut_off)?;
        }
        if let Some(n) = raw.limits.num_sums {
            settings.num_sums(n)?;
        }
        if let Some(n) = raw.limits.num_trials {
            settings.num_trials(n)?;
        }
        if let Some(seed) = raw.limits.seed {
            settings.seed(seed);
        }

        Ok(Self {
            input_files: raw.input_files.into_iter().map(PathBuf::from).collect(),
            output_path: raw.output_path.map(PathBuf::from),
            settings,
        })
    }
}

/// Strict boolean flags: `"1"`, `"true"`, `"0"`, `"false"`, nothing else.
pub fn parse_bool_flag(flag: &str) -> Result<bool> {
    match flag {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(Error::settings(format!(
            "'{}' is not a boolean flag; use \"1\", \"true\", \"0\", or \"false\"",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Config::from_file("./nonexistent_configuration.toml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_malformed_toml_is_validation_error() {
        let err = Config::parse("input-files = not-a-list").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_full_settings() {
        let text = r#"
            input-files = ["input/fta/correct_tree_input_with_probs.json"]
            output-path = "temp_results.json"

            [analysis]
            probability = "true"
            importance = "1"
            uncertainty = "true"
            ccf = "1"

            [approximations]
            approx = "rare-event"

            [limits]
            limit-order = 11
            mission-time = 48.0
            cut-off = 0.009
            num-sums = 42
            num-trials = 777
            seed = 97531
        "#;
        let config = Config::parse(text).unwrap();

        assert_eq!(config.input_files.len(), 1);
        assert_eq!(
            config.input_files[0],
            PathBuf::from("input/fta/correct_tree_input_with_probs.json")
        );
        assert_eq!(config.output_path, Some(PathBuf::from("temp_results.json")));

        let mut expected = Settings::default();
        expected
            .probability_analysis(true)
            .importance_analysis(true)
            .uncertainty_analysis(true)
            .ccf_analysis(true)
            .approx("rare-event")
            .unwrap()
            .limit_order(11)
            .unwrap()
            .mission_time(48.0)
            .unwrap()
            .cut_off(0.009)
            .unwrap()
            .num_sums(42)
            .unwrap()
            .num_trials(777)
            .unwrap()
            .seed(97531);
        assert_eq!(config.settings, expected);
    }

    #[test]
    fn test_bool_flags_are_strict() {
        assert!(parse_bool_flag("1").unwrap());
        assert!(parse_bool_flag("true").unwrap());
        assert!(!parse_bool_flag("0").unwrap());
        assert!(!parse_bool_flag("false").unwrap());
        for bad in ["yes", "no", "True", "TRUE", "on", ""] {
            assert!(matches!(parse_bool_flag(bad), Err(Error::InvalidSettings { .. })), "{}", bad);
        }
    }

    #[test]
    fn test_bad_flag_in_analysis_section() {
        let err = Config::parse("[analysis]\nprobability = \"yes\"").unwrap_err();
        assert!(matches!(err, Error::InvalidSettings { .. }));
    }

    #[test]
    fn test_unknown_approximation_rejected() {
        let err = Config::parse("[approximations]\napprox = \"exact\"").unwrap_err();
        assert!(matches!(err, Error::InvalidSettings { .. }));
    }

    #[test]
    fn test_out_of_range_limits_rejected() {
        assert!(Config::parse("[limits]\nnum-trials = 0").is_err());
        assert!(Config::parse("[limits]\ncut-off = 1.5").is_err());
        assert!(Config::parse("[limits]\nmission-time = -1.0").is_err());
    }

    #[test]
    fn test_empty_config_is_defaults() {
        let config = Config::parse("").unwrap();
        assert!(config.input_files.is_empty());
        assert_eq!(config.settings, Settings::default());
    }
}

//! Generator settings loaded from YAML.
//!
//! Every field is optional; anything left out falls back to the generator
//! defaults. Command-line flags are layered on top with [`GeneratorSettings::merge`].

use serde::Deserialize;

use crate::error::{AnovaError, Result};
use crate::generator::GeneratorConfig;

/// File prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "synthetic";

/// Generator settings as written in a YAML file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSettings {
    /// Birthdate as `DD/MM/YY`.
    pub dob: Option<String>,
    pub replications: Option<usize>,
    pub tol_mean: Option<f64>,
    pub tol_std: Option<f64>,
    pub decimals: Option<u32>,
    /// Output file name prefix.
    pub prefix: Option<String>,
    /// Seed for reproducible output.
    pub seed: Option<u64>,
}

impl GeneratorSettings {
    /// Parses settings from YAML text.
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml_ng::from_str(content)?)
    }

    /// Overrides fields of `self` with the ones set in `other`.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            dob: other.dob.or(self.dob),
            replications: other.replications.or(self.replications),
            tol_mean: other.tol_mean.or(self.tol_mean),
            tol_std: other.tol_std.or(self.tol_std),
            decimals: other.decimals.or(self.decimals),
            prefix: other.prefix.or(self.prefix),
            seed: other.seed.or(self.seed),
        }
    }

    pub fn prefix(&self) -> &str {
        self.prefix
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PREFIX)
    }

    /// Builds and validates a generator configuration.
    pub fn to_config(&self) -> Result<GeneratorConfig> {
        let mut config = match self.dob.as_deref() {
            Some(dob) => {
                let (day, month, year) = parse_birthdate(dob)?;
                GeneratorConfig::from_birthdate(day, month, year)?
            }
            None => GeneratorConfig::default(),
        };
        if let Some(replications) = self.replications {
            config.replications = replications;
        }
        if let Some(tol) = self.tol_mean {
            config.tolerance.mean = tol;
        }
        if let Some(tol) = self.tol_std {
            config.tolerance.std = tol;
        }
        if let Some(decimals) = self.decimals {
            config.num_decimals = decimals;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Parses `DD/MM/YY` (also accepting `-` or `.` as separators).
pub fn parse_birthdate(text: &str) -> Result<(u8, u8, u8)> {
    let invalid = || {
        AnovaError::configuration(format!(
            "birthdate must look like DD/MM/YY, got '{text}'"
        ))
    };
    let parts: Vec<&str> = text.trim().split(['/', '-', '.']).collect();
    let [day, month, year] = parts.as_slice() else {
        return Err(invalid());
    };
    let parse = |s: &str| s.trim().parse::<u8>().map_err(|_| invalid());
    Ok((parse(*day)?, parse(*month)?, parse(*year)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_settings_yaml() {
        let yaml = r"
dob: 29/07/03
replications: 10
tol_mean: 0.1
decimals: 3
seed: 42
";
        let settings = GeneratorSettings::from_yaml(yaml).unwrap();
        assert_eq!(settings.dob.as_deref(), Some("29/07/03"));
        assert_eq!(settings.seed, Some(42));

        let config = settings.to_config().unwrap();
        assert_eq!((config.d1, config.d2, config.m2, config.y2), (2, 9, 7, 3));
        assert_eq!(config.replications, 10);
        assert_eq!(config.num_decimals, 3);
        assert!((config.tolerance.mean - 0.1).abs() < f64::EPSILON);
        assert!((config.tolerance.std - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(GeneratorSettings::from_yaml("replicates: 3\n").is_err());
    }

    #[test]
    fn cli_values_override_file() {
        let file = GeneratorSettings {
            replications: Some(10),
            prefix: Some("file".to_string()),
            ..Default::default()
        };
        let cli = GeneratorSettings {
            replications: Some(30),
            ..Default::default()
        };
        let merged = file.merge(cli);
        assert_eq!(merged.replications, Some(30));
        assert_eq!(merged.prefix(), "file");
    }

    #[test]
    fn blank_prefix_uses_default() {
        let settings = GeneratorSettings {
            prefix: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(settings.prefix(), DEFAULT_PREFIX);
    }

    #[test]
    fn birthdate_formats() {
        assert_eq!(parse_birthdate("10/03/24").unwrap(), (10, 3, 24));
        assert_eq!(parse_birthdate("1-12-99").unwrap(), (1, 12, 99));
        assert!(parse_birthdate("10/03").is_err());
        assert!(parse_birthdate("aa/03/24").is_err());
    }

    #[test]
    fn zero_replications_rejected() {
        let settings = GeneratorSettings {
            replications: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            settings.to_config().unwrap_err(),
            AnovaError::Configuration(_)
        ));
    }
}

use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::cluster::optics::Optics;
use crate::text::language::LanguageKind;

/// Longest accepted analysis window, about a century.
pub const MAX_WINDOW_HOURS: i64 = 24 * 366 * 100;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Every
/// value has a default; CLI flags override them per invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    /// Stop words and stemmer used for feature extraction
    pub language: LanguageKind,
    /// OPTICS density threshold, also the smallest cluster kept
    pub min_samples: usize,
    /// Candidates are documents published within this many hours
    pub window_hours: i64,
    /// Exclusive cosine-distance neighbourhood radius
    pub max_eps: f64,
    /// Steepness threshold for cluster extraction
    pub xi: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "./newscluster.db".to_string(),
            language: LanguageKind::French,
            min_samples: 3,
            window_hours: 24,
            max_eps: 1.0,
            xi: 0.05,
        }
    }
}

/// Parse an optional environment variable, naming it in the error.
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{name} has an invalid value: {raw:?}")),
        Err(_) => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();

        let language = match env::var("NEWSCLUSTER_LANGUAGE") {
            Ok(raw) => raw
                .parse()
                .context("NEWSCLUSTER_LANGUAGE has an invalid value")?,
            Err(_) => defaults.language,
        };

        let config = Self {
            db_path: env::var("NEWSCLUSTER_DB_PATH").unwrap_or(defaults.db_path),
            language,
            min_samples: parse_var("NEWSCLUSTER_MIN_SAMPLES")?.unwrap_or(defaults.min_samples),
            window_hours: parse_var("NEWSCLUSTER_WINDOW_HOURS")?.unwrap_or(defaults.window_hours),
            max_eps: parse_var("NEWSCLUSTER_MAX_EPS")?.unwrap_or(defaults.max_eps),
            xi: parse_var("NEWSCLUSTER_XI")?.unwrap_or(defaults.xi),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges. Call again after applying CLI overrides.
    pub fn validate(&self) -> Result<()> {
        if self.min_samples < 2 {
            anyhow::bail!(
                "NEWSCLUSTER_MIN_SAMPLES must be at least 2 (got {})",
                self.min_samples
            );
        }
        if !(self.xi > 0.0 && self.xi < 1.0) {
            anyhow::bail!("NEWSCLUSTER_XI must be between 0 and 1 (got {})", self.xi);
        }
        if self.max_eps <= 0.0 || self.max_eps.is_nan() {
            anyhow::bail!("NEWSCLUSTER_MAX_EPS must be positive (got {})", self.max_eps);
        }
        if self.window_hours <= 0 || self.window_hours > MAX_WINDOW_HOURS {
            anyhow::bail!(
                "NEWSCLUSTER_WINDOW_HOURS must be between 1 and {} (got {})",
                MAX_WINDOW_HOURS,
                self.window_hours
            );
        }
        Ok(())
    }

    /// The clusterer these settings describe.
    pub fn clusterer(&self) -> Optics {
        Optics::new(self.min_samples)
            .with_max_eps(self.max_eps)
            .with_xi(self.xi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        let optics = config.clusterer();
        assert_eq!(optics.min_samples, 3);
        assert_eq!(optics.max_eps, 1.0);
        assert_eq!(optics.xi, 0.05);
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let config = Config {
            min_samples: 1,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            xi: 1.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            window_hours: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_huge_window_rejected() {
        let config = Config {
            window_hours: 5_000_000_000,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            window_hours: MAX_WINDOW_HOURS,
            ..Config::default()
        };
        config.validate().unwrap();
    }
}

//! Cache configuration.

use crate::error::{GeoCacheError, Result};
use serde::{Deserialize, Serialize};

/// Tuning knobs for [`GeoCategoryCache`](crate::GeoCategoryCache).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Radius in meters around a coordinate that counts as "the same place".
    #[serde(default = "CacheConfig::default_tolerance_meters")]
    pub tolerance_meters: f64,

    /// Upper bound on stored entries; `None` lets the index grow freely.
    #[serde(default)]
    pub max_entries: Option<usize>,

    /// Collapse concurrent misses for the same query key into one fetch.
    #[serde(default = "CacheConfig::default_single_flight")]
    pub single_flight: bool,
}

impl CacheConfig {
    const fn default_tolerance_meters() -> f64 {
        100.0
    }

    const fn default_single_flight() -> bool {
        true
    }

    pub fn with_tolerance_meters(mut self, meters: f64) -> Self {
        self.tolerance_meters = meters;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        assert!(max_entries > 0, "Max entries must be greater than zero");
        if max_entries > 1_000_000 {
            log::warn!(
                "Max entries of {} is very large; every entry keeps its full label list in memory",
                max_entries
            );
        }
        self.max_entries = Some(max_entries);
        self
    }

    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    /// Check invariants that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance_meters.is_finite() || self.tolerance_meters <= 0.0 {
            return Err(GeoCacheError::InvalidConfig(format!(
                "tolerance_meters must be a positive finite number, got {}",
                self.tolerance_meters
            )));
        }
        if self.max_entries == Some(0) {
            return Err(GeoCacheError::InvalidConfig(
                "max_entries must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Parse a TOML document and validate it.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: CacheConfig =
            toml::from_str(input).map_err(|e| GeoCacheError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file.
    #[cfg(feature = "toml")]
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GeoCacheError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            tolerance_meters: Self::default_tolerance_meters(),
            max_entries: None,
            single_flight: Self::default_single_flight(),
        }
    }
}

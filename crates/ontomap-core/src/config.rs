//! Mapping configuration.
//!
//! Thresholds are configuration, not constants: defaults live in
//! [`defaults`], a TOML file may override them, and environment variables
//! named in [`env_vars`] override both.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default threshold values.
pub mod defaults {
    /// Candidates scoring below this are dropped before the floor is appended
    pub const MIN_CANDIDATE_CONFIDENCE: f64 = 0.05;
    /// Ranking length before the floor candidate
    pub const MAX_CANDIDATES: usize = 5;
    /// Aggregate confidence a cluster hypothesis must reach
    pub const MIN_EQUIPMENT_CONFIDENCE: f64 = 0.5;
    /// Token similarity required between a field hint and a schema field
    pub const MIN_FIELD_SIMILARITY: f64 = 0.5;
    /// Bonus for an equipment type whose alias matches the naming tag
    pub const NAME_HINT_WEIGHT: f64 = 0.15;
    /// Per-point model invocation timeout
    pub const CLASSIFICATION_TIMEOUT_MS: u64 = 2000;
    /// Concurrent extraction/classification tasks
    pub const PARALLELISM: usize = 4;
}

/// Environment variable names.
pub mod env_vars {
    pub const MIN_CANDIDATE_CONFIDENCE: &str = "ONTOMAP_MIN_CANDIDATE_CONFIDENCE";
    pub const MAX_CANDIDATES: &str = "ONTOMAP_MAX_CANDIDATES";
    pub const MIN_EQUIPMENT_CONFIDENCE: &str = "ONTOMAP_MIN_EQUIPMENT_CONFIDENCE";
    pub const MIN_FIELD_SIMILARITY: &str = "ONTOMAP_MIN_FIELD_SIMILARITY";
    pub const NAME_HINT_WEIGHT: &str = "ONTOMAP_NAME_HINT_WEIGHT";
    pub const CLASSIFICATION_TIMEOUT_MS: &str = "ONTOMAP_CLASSIFICATION_TIMEOUT_MS";
    pub const PARALLELISM: &str = "ONTOMAP_PARALLELISM";
    /// Switches CLI logging to JSON
    pub const LOG_JSON: &str = "ONTOMAP_LOG_JSON";
}

/// Mapping pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingConfig {
    pub min_candidate_confidence: f64,
    pub max_candidates: usize,
    pub min_equipment_confidence: f64,
    pub min_field_similarity: f64,
    pub name_hint_weight: f64,
    pub classification_timeout_ms: u64,
    pub parallelism: usize,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            min_candidate_confidence: defaults::MIN_CANDIDATE_CONFIDENCE,
            max_candidates: defaults::MAX_CANDIDATES,
            min_equipment_confidence: defaults::MIN_EQUIPMENT_CONFIDENCE,
            min_field_similarity: defaults::MIN_FIELD_SIMILARITY,
            name_hint_weight: defaults::NAME_HINT_WEIGHT,
            classification_timeout_ms: defaults::CLASSIFICATION_TIMEOUT_MS,
            parallelism: defaults::PARALLELISM,
        }
    }
}

impl MappingConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file, then apply environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&raw)?;
        config.with_env_overrides()
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply environment overrides and validate.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        override_from_env(env_vars::MIN_CANDIDATE_CONFIDENCE, &mut self.min_candidate_confidence)?;
        override_from_env(env_vars::MAX_CANDIDATES, &mut self.max_candidates)?;
        override_from_env(env_vars::MIN_EQUIPMENT_CONFIDENCE, &mut self.min_equipment_confidence)?;
        override_from_env(env_vars::MIN_FIELD_SIMILARITY, &mut self.min_field_similarity)?;
        override_from_env(env_vars::NAME_HINT_WEIGHT, &mut self.name_hint_weight)?;
        override_from_env(env_vars::CLASSIFICATION_TIMEOUT_MS, &mut self.classification_timeout_ms)?;
        override_from_env(env_vars::PARALLELISM, &mut self.parallelism)?;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        let ratios = [
            ("min_candidate_confidence", self.min_candidate_confidence),
            ("min_equipment_confidence", self.min_equipment_confidence),
            ("min_field_similarity", self.min_field_similarity),
            ("name_hint_weight", self.name_hint_weight),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::config(format!("{} must be within [0, 1], got {}", name, value)));
            }
        }
        if self.max_candidates == 0 {
            return Err(Error::config("max_candidates must be at least 1"));
        }
        if self.parallelism == 0 {
            return Err(Error::config("parallelism must be at least 1"));
        }
        if self.classification_timeout_ms == 0 {
            return Err(Error::config("classification_timeout_ms must be at least 1"));
        }
        Ok(())
    }

    pub fn classification_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.classification_timeout_ms)
    }
}

fn override_from_env<T: std::str::FromStr>(var: &str, slot: &mut T) -> Result<()> {
    if let Ok(raw) = std::env::var(var) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|_| Error::config(format!("{} has an invalid value: '{}'", var, raw)))?;
    }
    Ok(())
}

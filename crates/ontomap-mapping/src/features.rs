//! Feature extraction.
//!
//! Turns a [`PointRecord`] into a fixed-shape [`FeatureVector`]: name shape,
//! unit and data-type categories, vocabulary keyword flags and a summary of
//! the sample history. Extraction is total; malformed or missing attributes
//! become [`FeatureValue::Unknown`].

use std::collections::BTreeSet;

use ontomap_core::{DataType, FeatureValue, FeatureVector, PointRecord, Sample, FEATURE_COUNT};

use crate::lexicon;

/// Default cap on history samples considered per point.
pub const DEFAULT_MAX_SAMPLES: usize = 1000;

/// Summary statistics over a point's sample history
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStats {
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Mean (average)
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Every value is 0 or 1
    pub binary: bool,
    /// Finite samples used
    pub count: usize,
}

impl HistoryStats {
    /// Summarise finite sample values. `None` when nothing usable remains.
    pub fn from_samples(samples: &[Sample]) -> Option<Self> {
        let values: Vec<f64> = samples
            .iter()
            .map(|s| s.value)
            .filter(|v| v.is_finite())
            .collect();
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = values.iter().sum::<f64>() / count as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        let binary = values.iter().all(|v| *v == 0.0 || *v == 1.0);

        Some(Self {
            min,
            max,
            mean,
            std_dev: variance.sqrt(),
            binary,
            count,
        })
    }
}

/// Extracts feature vectors from point records.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    max_samples: usize,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureExtractor {
    pub fn new() -> Self {
        Self {
            max_samples: DEFAULT_MAX_SAMPLES,
        }
    }

    /// Only the most recent `max` samples are summarised.
    pub fn with_max_samples(mut self, max: usize) -> Self {
        self.max_samples = max.max(1);
        self
    }

    /// Extract the feature vector for one point. Never fails.
    pub fn extract(&self, record: &PointRecord) -> FeatureVector {
        let mut fv = FeatureVector::unknown(record.id.clone());

        let raw = lexicon::split_name(&record.name);
        fv.set("name_length", FeatureValue::Number(record.name.chars().count() as f64));
        fv.set("token_count", FeatureValue::Number(raw.len() as f64));

        if let Some(units) = record.effective_units() {
            let category = lexicon::unit_category(units);
            fv.set(
                "unit_category",
                FeatureValue::Category(category.as_str().to_string()),
            );
        }

        let data_type = record.effective_data_type();
        if data_type != DataType::Unknown {
            fv.set(
                "data_type",
                FeatureValue::Category(data_type.as_str().to_string()),
            );
        }

        fv.tokens = self.tokens(record);

        let mut keywords: BTreeSet<String> = fv.tokens.iter().cloned().collect();
        if let Some(description) = record.description.as_deref() {
            keywords.extend(expand_tokens(&lexicon::split_name(description)));
        }
        for (feature, words) in lexicon::FLAG_KEYWORDS {
            let hit = words.iter().any(|w| keywords.contains(*w));
            fv.set(feature, FeatureValue::Flag(hit));
        }

        let start = record.history.len().saturating_sub(self.max_samples);
        match HistoryStats::from_samples(&record.history[start..]) {
            Some(stats) => {
                fv.set("has_history", FeatureValue::Flag(true));
                fv.set("history_min", FeatureValue::Number(stats.min));
                fv.set("history_max", FeatureValue::Number(stats.max));
                fv.set("history_mean", FeatureValue::Number(stats.mean));
                fv.set("history_std_dev", FeatureValue::Number(stats.std_dev));
                fv.set("history_binary", FeatureValue::Flag(stats.binary));
            }
            None => fv.set("has_history", FeatureValue::Flag(false)),
        }

        debug_assert_eq!(fv.len(), FEATURE_COUNT);
        fv
    }

    /// Normalised vocabulary tokens for a point.
    ///
    /// Equipment tags and bare numbers are dropped and abbreviations are
    /// expanded. When the name has no vocabulary words but the description
    /// does, the description is used instead.
    pub fn tokens(&self, record: &PointRecord) -> Vec<String> {
        let tokens = expand_tokens(&lexicon::split_name(&record.name));
        if tokens.iter().any(|t| lexicon::is_known_word(t)) {
            return tokens;
        }
        let described = record
            .description
            .as_deref()
            .map(|d| expand_tokens(&lexicon::split_name(d)))
            .unwrap_or_default();
        if described.iter().any(|t| lexicon::is_known_word(t)) {
            described
        } else {
            tokens
        }
    }
}

fn expand_tokens(raw: &[String]) -> Vec<String> {
    raw.iter()
        .filter(|t| !is_naming_noise(t))
        .flat_map(|t| lexicon::expand(t))
        .collect()
}

fn is_naming_noise(token: &str) -> bool {
    if token.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }
    if lexicon::parse_equipment_tag(token).is_some() {
        return true;
    }
    lexicon::equipment_kind(token).is_some() && !lexicon::is_known_word(token)
}

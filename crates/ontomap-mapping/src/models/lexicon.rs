//! Vocabulary-driven scoring model.
//!
//! Each schema point type is profiled by the words of its `snake_case` name
//! and its declared data type and unit category. A point's expanded name
//! tokens are composed into a field-grammar word set (inferring the point
//! type and measurement when the name omits them) and compared against
//! every profile.

use std::collections::BTreeSet;

use ontomap_core::{
    DataType, Error, FeatureVector, OntologySchema, Result, ScoringModel, UnitCategory,
};

use crate::lexicon;

/// Default exponent applied to raw similarities.
pub const DEFAULT_SHARPNESS: f64 = 8.0;

/// Penalty factor for each disagreeing constraint.
const MISMATCH_FACTOR: f64 = 0.5;

#[derive(Debug, Clone)]
struct ClassProfile {
    words: BTreeSet<String>,
    point_type: Option<String>,
    data_type: Option<DataType>,
    unit_category: Option<UnitCategory>,
}

/// Scores point types by field-grammar word overlap.
#[derive(Debug, Clone)]
pub struct LexiconModel {
    classes: Vec<String>,
    profiles: Vec<ClassProfile>,
    sharpness: f64,
}

impl LexiconModel {
    pub const NAME: &'static str = "lexicon";

    /// Build profiles for every point type in the schema.
    pub fn from_schema(schema: &OntologySchema) -> Self {
        let profiles = schema
            .point_types
            .iter()
            .map(|def| {
                let words: BTreeSet<String> = def
                    .name
                    .split('_')
                    .filter(|w| !w.is_empty())
                    .map(str::to_string)
                    .collect();
                let point_type = def
                    .name
                    .rsplit('_')
                    .next()
                    .filter(|w| lexicon::is_point_type(w))
                    .map(str::to_string);
                ClassProfile {
                    words,
                    point_type,
                    data_type: def.data_type,
                    unit_category: def.unit_category,
                }
            })
            .collect();

        Self {
            classes: schema.point_type_names(),
            profiles,
            sharpness: DEFAULT_SHARPNESS,
        }
    }

    /// Exponent applied to raw similarities; higher values favour the best match.
    pub fn with_sharpness(mut self, sharpness: f64) -> Self {
        self.sharpness = sharpness.max(1.0);
        self
    }

    fn score_profile(&self, profile: &ClassProfile, composed: &Composed) -> f64 {
        let union = profile.words.union(&composed.words).count();
        if union == 0 {
            return 0.0;
        }
        let mut score = profile.words.intersection(&composed.words).count() as f64 / union as f64;

        if let Some(expected) = &profile.point_type {
            if *expected != composed.point_type {
                score *= MISMATCH_FACTOR;
            }
        }
        if let Some(expected) = profile.data_type {
            if !composed.data_type.is_compatible_with(expected) {
                score *= MISMATCH_FACTOR;
            }
        }
        if let Some(expected) = profile.unit_category {
            if composed.unit_category != UnitCategory::Unknown
                && expected != UnitCategory::Unknown
                && composed.unit_category != expected
            {
                score *= MISMATCH_FACTOR;
            }
        }

        score.powf(self.sharpness)
    }
}

/// Field-grammar reading of one point.
struct Composed {
    words: BTreeSet<String>,
    point_type: String,
    data_type: DataType,
    unit_category: UnitCategory,
}

fn compose(features: &FeatureVector) -> Composed {
    let data_type = features.data_type();
    let unit_category = features.unit_category();

    let mut words: BTreeSet<String> = features
        .tokens
        .iter()
        .filter(|t| lexicon::is_known_word(t))
        .cloned()
        .collect();

    let point_type = features
        .tokens
        .iter()
        .find(|t| lexicon::is_point_type(t))
        .cloned()
        .unwrap_or_else(|| match data_type {
            DataType::Boolean | DataType::Enumerated => "status".to_string(),
            DataType::Numeric | DataType::Unknown => "sensor".to_string(),
        });
    words.insert(point_type.clone());

    if !words.iter().any(|w| lexicon::is_measurement(w)) {
        if let Some(measurement) = lexicon::measurement_for(unit_category) {
            words.insert(measurement.to_string());
        }
    }

    Composed {
        words,
        point_type,
        data_type,
        unit_category,
    }
}

impl ScoringModel for LexiconModel {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn is_available(&self) -> bool {
        !self.classes.is_empty()
    }

    fn score(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        if self.classes.is_empty() {
            return Err(Error::ModelUnavailable(
                "schema declares no point types".to_string(),
            ));
        }
        let composed = compose(features);
        Ok(self
            .profiles
            .iter()
            .map(|p| self.score_profile(p, &composed))
            .collect())
    }
}

//! Candidate classification.
//!
//! Wraps a [`ScoringModel`] and turns its per-class scores into a ranked,
//! normalised candidate list that always ends with the `unknown` floor.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use ontomap_core::{
    config::defaults, DynScoringModel, FeatureVector, MappingConfig, PointId, UNKNOWN_TYPE,
};

use crate::error::{MappingError, Result};

/// One scored point-type hypothesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub point_id: PointId,
    /// Schema point type, or [`UNKNOWN_TYPE`]
    pub type_id: String,
    /// Normalised confidence in [0, 1]
    pub confidence: f64,
}

impl Candidate {
    pub fn new(point_id: PointId, type_id: impl Into<String>, confidence: f64) -> Self {
        Self {
            point_id,
            type_id: type_id.into(),
            confidence,
        }
    }

    /// The floor candidate carrying all probability mass.
    pub fn unknown(point_id: PointId) -> Self {
        Self::new(point_id, UNKNOWN_TYPE, 1.0)
    }

    pub fn is_unknown(&self) -> bool {
        self.type_id == UNKNOWN_TYPE
    }

    /// Equipment field this candidate suggests. Point types double as field names.
    pub fn field_hint(&self) -> Option<&str> {
        if self.is_unknown() {
            None
        } else {
            Some(&self.type_id)
        }
    }
}

/// Ranks point types for feature vectors.
pub struct CandidateClassifier {
    model: DynScoringModel,
    min_confidence: f64,
    max_candidates: usize,
}

impl std::fmt::Debug for CandidateClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateClassifier")
            .field("model", &self.model.name())
            .field("min_confidence", &self.min_confidence)
            .field("max_candidates", &self.max_candidates)
            .finish()
    }
}

impl CandidateClassifier {
    pub fn new(model: DynScoringModel) -> Self {
        Self {
            model,
            min_confidence: defaults::MIN_CANDIDATE_CONFIDENCE,
            max_candidates: defaults::MAX_CANDIDATES,
        }
    }

    pub fn from_config(model: DynScoringModel, config: &MappingConfig) -> Self {
        Self::new(model)
            .with_min_confidence(config.min_candidate_confidence)
            .with_max_candidates(config.max_candidates)
    }

    pub fn with_min_confidence(mut self, min: f64) -> Self {
        self.min_confidence = min.clamp(0.0, 1.0);
        self
    }

    pub fn with_max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = max.max(1);
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Rank candidate point types for one feature vector.
    ///
    /// The result is non-empty, sorted by descending confidence, sums to 1
    /// and ends with the `unknown` floor. Fails with
    /// [`MappingError::ModelUnavailable`] when the model cannot answer.
    pub fn classify(&self, features: &FeatureVector) -> Result<Vec<Candidate>> {
        if !self.model.is_available() {
            return Err(MappingError::ModelUnavailable(format!(
                "model '{}' is not available",
                self.model.name()
            )));
        }

        let classes = self.model.classes();
        let scores = self
            .model
            .score(features)
            .map_err(MappingError::from_model)?;
        if scores.len() != classes.len() {
            return Err(MappingError::Model(format!(
                "model '{}' returned {} scores for {} classes",
                self.model.name(),
                scores.len(),
                classes.len()
            )));
        }

        let point_id = &features.point_id;
        let scores: Vec<f64> = scores
            .into_iter()
            .zip(classes)
            .map(|(s, class)| {
                if class == UNKNOWN_TYPE || !s.is_finite() || s < 0.0 {
                    0.0
                } else {
                    s
                }
            })
            .collect();
        let total: f64 = scores.iter().sum();
        if total <= 0.0 {
            return Ok(vec![Candidate::unknown(point_id.clone())]);
        }

        let mut ranked: Vec<(usize, f64)> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s / total))
            .filter(|(_, p)| *p > 0.0 && *p >= self.min_confidence)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(self.max_candidates);

        let Some(lowest) = ranked.last().map(|(_, p)| *p) else {
            return Ok(vec![Candidate::unknown(point_id.clone())]);
        };
        let kept: f64 = ranked.iter().map(|(_, p)| p).sum();
        let floor = (1.0 - kept).clamp(0.0, lowest);
        let norm = kept + floor;

        let mut candidates: Vec<Candidate> = ranked
            .into_iter()
            .map(|(i, p)| Candidate::new(point_id.clone(), classes[i].clone(), p / norm))
            .collect();
        candidates.push(Candidate::new(point_id.clone(), UNKNOWN_TYPE, floor / norm));

        tracing::trace!(
            category = "classifier",
            point = %point_id,
            top = %candidates[0].type_id,
            confidence = candidates[0].confidence,
            "Classified point"
        );
        Ok(candidates)
    }

    /// [`classify`](Self::classify) on the blocking pool, bounded by `timeout`.
    ///
    /// On timeout the model call is left to finish in the background and
    /// [`MappingError::ClassificationTimeout`] is returned.
    pub async fn classify_with_timeout(
        self: &Arc<Self>,
        features: FeatureVector,
        timeout: Duration,
    ) -> Result<Vec<Candidate>> {
        let point_id = features.point_id.clone();
        let classifier = Arc::clone(self);
        let task = tokio::task::spawn_blocking(move || classifier.classify(&features));

        match tokio::time::timeout(timeout, task).await {
            Ok(joined) => joined?,
            Err(_) => Err(MappingError::ClassificationTimeout {
                point_id,
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontomap_core::{Error, ScoringModel};

    struct FixedModel {
        classes: Vec<String>,
        scores: Vec<f64>,
    }

    impl FixedModel {
        fn new(pairs: &[(&str, f64)]) -> Arc<Self> {
            Arc::new(Self {
                classes: pairs.iter().map(|(c, _)| c.to_string()).collect(),
                scores: pairs.iter().map(|(_, s)| *s).collect(),
            })
        }
    }

    impl ScoringModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }
        fn classes(&self) -> &[String] {
            &self.classes
        }
        fn score(&self, _: &FeatureVector) -> ontomap_core::Result<Vec<f64>> {
            Ok(self.scores.clone())
        }
    }

    struct OfflineModel;

    impl ScoringModel for OfflineModel {
        fn name(&self) -> &str {
            "offline"
        }
        fn classes(&self) -> &[String] {
            &[]
        }
        fn score(&self, _: &FeatureVector) -> ontomap_core::Result<Vec<f64>> {
            Err(Error::ModelUnavailable("offline".into()))
        }
    }

    fn fv() -> FeatureVector {
        FeatureVector::unknown(PointId::new("p1"))
    }

    fn assert_well_formed(candidates: &[Candidate]) {
        assert!(!candidates.is_empty());
        assert!(candidates.last().unwrap().is_unknown());
        assert!(candidates.windows(2).all(|w| w[0].confidence >= w[1].confidence));
        let sum: f64 = candidates.iter().map(|c| c.confidence).sum();
        assert!((sum - 1.0).abs() < 1e-9, "sum was {}", sum);
    }

    #[test]
    fn test_ranking_is_normalised_with_floor() {
        let model = FixedModel::new(&[("a", 0.2), ("b", 0.7), ("c", 0.1)]);
        let candidates = CandidateClassifier::new(model).classify(&fv()).unwrap();

        assert_well_formed(&candidates);
        assert_eq!(candidates[0].type_id, "b");
        assert_eq!(candidates[1].type_id, "a");
        assert_eq!(candidates.len(), 4);
        // nothing truncated, so the floor carries no mass
        assert!(candidates[3].confidence < 1e-9);
    }

    #[test]
    fn test_truncation_moves_mass_to_floor() {
        let model = FixedModel::new(&[("a", 0.4), ("b", 0.3), ("c", 0.2), ("d", 0.1)]);
        let candidates = CandidateClassifier::new(model)
            .with_max_candidates(2)
            .classify(&fv())
            .unwrap();

        assert_well_formed(&candidates);
        assert_eq!(candidates.len(), 3);
        assert!(candidates[2].confidence > 0.0);
        assert!(candidates[2].confidence <= candidates[1].confidence);
    }

    #[test]
    fn test_zero_scores_yield_only_unknown() {
        let model = FixedModel::new(&[("a", 0.0), ("b", f64::NAN)]);
        let candidates = CandidateClassifier::new(model).classify(&fv()).unwrap();
        assert_eq!(candidates, vec![Candidate::unknown(PointId::new("p1"))]);
    }

    #[test]
    fn test_ties_break_on_class_order() {
        let model = FixedModel::new(&[("b", 0.5), ("a", 0.5)]);
        let candidates = CandidateClassifier::new(model).classify(&fv()).unwrap();
        assert_eq!(candidates[0].type_id, "b");
    }

    #[test]
    fn test_unavailable_model_is_an_error() {
        let classifier = CandidateClassifier::new(Arc::new(OfflineModel));
        assert!(matches!(
            classifier.classify(&fv()),
            Err(MappingError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_score_length_mismatch() {
        struct Short;
        impl ScoringModel for Short {
            fn name(&self) -> &str {
                "short"
            }
            fn classes(&self) -> &[String] {
                static CLASSES: std::sync::OnceLock<Vec<String>> = std::sync::OnceLock::new();
                CLASSES.get_or_init(|| vec!["a".to_string(), "b".to_string()])
            }
            fn score(&self, _: &FeatureVector) -> ontomap_core::Result<Vec<f64>> {
                Ok(vec![1.0])
            }
        }
        let err = CandidateClassifier::new(Arc::new(Short))
            .classify(&fv())
            .unwrap_err();
        assert!(matches!(err, MappingError::Model(_)));
    }

    #[tokio::test]
    async fn test_classify_with_timeout_passes_through() {
        let model = FixedModel::new(&[("a", 1.0)]);
        let classifier = Arc::new(CandidateClassifier::new(model));
        let candidates = classifier
            .classify_with_timeout(fv(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(candidates[0].type_id, "a");
        assert_eq!(candidates[0].confidence, 1.0);
    }
}

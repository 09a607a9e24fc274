//! Nearest-neighbour scoring over labelled exemplars.
//!
//! The model is loaded from a JSON artifact of labelled feature vectors.
//! Features are z-scored per dimension using exemplar statistics, and the
//! `k` nearest exemplars vote with inverse-distance weights.

use std::path::Path;

use serde::{Deserialize, Serialize};

use ontomap_core::{Error, FeatureVector, Result, ScoringModel, FEATURE_COUNT};

/// Default neighbour count.
pub const DEFAULT_K: usize = 5;

/// Exemplars required before the model will answer.
pub const MIN_EXEMPLARS: usize = 5;

const DISTANCE_EPSILON: f64 = 1e-6;

fn default_k() -> usize {
    DEFAULT_K
}

/// One labelled training vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exemplar {
    /// Point type the vector was confirmed as
    pub label: String,
    /// Numeric projection, [`FEATURE_COUNT`] values
    pub features: Vec<f64>,
}

/// Serialised model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnnArtifact {
    #[serde(default = "default_k")]
    pub k: usize,
    /// Class vocabulary; derived from exemplar labels when empty
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub exemplars: Vec<Exemplar>,
}

impl KnnArtifact {
    /// Build an artifact from confirmed feature vectors.
    pub fn from_labelled<'a, I>(k: usize, labelled: I) -> Self
    where
        I: IntoIterator<Item = (&'a FeatureVector, &'a str)>,
    {
        Self {
            k,
            classes: Vec::new(),
            exemplars: labelled
                .into_iter()
                .map(|(fv, label)| Exemplar {
                    label: label.to_string(),
                    features: fv.to_numeric(),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// k-nearest-neighbour scoring model.
#[derive(Debug, Clone)]
pub struct KnnModel {
    k: usize,
    classes: Vec<String>,
    /// (class index, scaled features)
    exemplars: Vec<(usize, Vec<f64>)>,
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl KnnModel {
    pub const NAME: &'static str = "knn";

    /// Build from an artifact.
    ///
    /// Without a declared vocabulary the classes are the distinct exemplar
    /// labels, sorted. With one, every label must belong to it.
    pub fn from_artifact(artifact: KnnArtifact) -> Result<Self> {
        if artifact.k == 0 {
            return Err(Error::model("k must be at least 1"));
        }
        for (i, exemplar) in artifact.exemplars.iter().enumerate() {
            if exemplar.features.len() != FEATURE_COUNT {
                return Err(Error::model(format!(
                    "exemplar {} has {} features, expected {}",
                    i,
                    exemplar.features.len(),
                    FEATURE_COUNT
                )));
            }
            if exemplar.features.iter().any(|v| !v.is_finite()) {
                return Err(Error::model(format!("exemplar {} has non-finite features", i)));
            }
        }

        let classes = if artifact.classes.is_empty() {
            let mut labels: Vec<String> = artifact
                .exemplars
                .iter()
                .map(|e| e.label.clone())
                .collect();
            labels.sort();
            labels.dedup();
            labels
        } else {
            artifact.classes.clone()
        };

        let (means, scales) = dimension_stats(&artifact.exemplars);
        let mut exemplars = Vec::with_capacity(artifact.exemplars.len());
        for e in &artifact.exemplars {
            let class = classes
                .iter()
                .position(|c| *c == e.label)
                .ok_or_else(|| {
                    Error::model(format!("exemplar label '{}' is not a declared class", e.label))
                })?;
            exemplars.push((class, scale(&e.features, &means, &scales)));
        }

        tracing::debug!(
            category = "model",
            model = Self::NAME,
            k = artifact.k,
            classes = classes.len(),
            exemplars = artifact.exemplars.len(),
            "Loaded nearest-neighbour artifact"
        );

        Ok(Self {
            k: artifact.k,
            classes,
            exemplars,
            means,
            scales,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let artifact: KnnArtifact = serde_json::from_str(json)?;
        Self::from_artifact(artifact)
    }

    /// Load an artifact from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    pub fn exemplar_count(&self) -> usize {
        self.exemplars.len()
    }
}

fn dimension_stats(exemplars: &[Exemplar]) -> (Vec<f64>, Vec<f64>) {
    let n = exemplars.len().max(1) as f64;
    let mut means = vec![0.0; FEATURE_COUNT];
    for e in exemplars {
        for (m, v) in means.iter_mut().zip(&e.features) {
            *m += v / n;
        }
    }
    let mut scales = vec![0.0; FEATURE_COUNT];
    for e in exemplars {
        for ((s, v), m) in scales.iter_mut().zip(&e.features).zip(&means) {
            *s += (v - m).powi(2) / n;
        }
    }
    let scales = scales
        .into_iter()
        .map(|var| {
            let sd = var.sqrt();
            if sd > f64::EPSILON {
                sd
            } else {
                1.0
            }
        })
        .collect();
    (means, scales)
}

fn scale(values: &[f64], means: &[f64], scales: &[f64]) -> Vec<f64> {
    values
        .iter()
        .zip(means)
        .zip(scales)
        .map(|((v, m), s)| (v - m) / s)
        .collect()
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

impl ScoringModel for KnnModel {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn is_available(&self) -> bool {
        self.exemplars.len() >= MIN_EXEMPLARS
    }

    fn score(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        if !self.is_available() {
            return Err(Error::ModelUnavailable(format!(
                "{} exemplars loaded, {} required",
                self.exemplars.len(),
                MIN_EXEMPLARS
            )));
        }

        let query = scale(&features.to_numeric(), &self.means, &self.scales);
        let mut neighbours: Vec<(f64, usize)> = self
            .exemplars
            .iter()
            .enumerate()
            .map(|(i, (_, x))| (distance(&query, x), i))
            .collect();
        neighbours.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut votes = vec![0.0; self.classes.len()];
        for (d, i) in neighbours.into_iter().take(self.k) {
            let class = self.exemplars[i].0;
            votes[class] += 1.0 / (d + DISTANCE_EPSILON);
        }
        let total: f64 = votes.iter().sum();
        if total > 0.0 {
            for v in votes.iter_mut() {
                *v /= total;
            }
        }
        Ok(votes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureExtractor;
    use ontomap_core::{DataType, PointRecord};

    fn labelled() -> Vec<(FeatureVector, &'static str)> {
        let extractor = FeatureExtractor::new();
        let rows = [
            ("AHU1_SAT", "°F", DataType::Numeric, "supply_air_temperature_sensor"),
            ("AHU2_SAT", "°F", DataType::Numeric, "supply_air_temperature_sensor"),
            ("AHU3_SupplyAirTemp", "°F", DataType::Numeric, "supply_air_temperature_sensor"),
            ("AHU1_SF_Cmd", "", DataType::Boolean, "supply_fan_run_command"),
            ("AHU2_SF_Cmd", "", DataType::Boolean, "supply_fan_run_command"),
            ("AHU3_SupplyFanCmd", "", DataType::Boolean, "supply_fan_run_command"),
        ];
        rows.iter()
            .map(|(name, units, dt, label)| {
                let record = PointRecord::new(*name, *name)
                    .with_units(*units)
                    .with_data_type(*dt);
                (extractor.extract(&record), *label)
            })
            .collect()
    }

    fn model(k: usize) -> KnnModel {
        let rows = labelled();
        let artifact = KnnArtifact::from_labelled(k, rows.iter().map(|(fv, l)| (fv, *l)));
        KnnModel::from_artifact(artifact).unwrap()
    }

    #[test]
    fn test_nearest_class_wins() {
        let model = model(3);
        let query = FeatureExtractor::new().extract(
            &PointRecord::new("q", "AHU9_SAT")
                .with_units("°F")
                .with_data_type(DataType::Numeric),
        );
        let scores = model.score(&query).unwrap();
        let sat = model
            .classes()
            .iter()
            .position(|c| c == "supply_air_temperature_sensor")
            .unwrap();
        assert!(scores[sat] > 0.5);
        assert!((scores.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_too_few_exemplars_is_unavailable() {
        let rows = labelled();
        let artifact = KnnArtifact::from_labelled(3, rows.iter().take(2).map(|(fv, l)| (fv, *l)));
        let model = KnnModel::from_artifact(artifact).unwrap();
        assert!(!model.is_available());
        let err = model.score(&rows[0].0).unwrap_err();
        assert!(matches!(err, Error::ModelUnavailable(_)));
    }

    #[test]
    fn test_rejects_malformed_exemplar() {
        let artifact = KnnArtifact {
            k: 3,
            classes: Vec::new(),
            exemplars: vec![Exemplar {
                label: "x".into(),
                features: vec![1.0, 2.0],
            }],
        };
        assert!(matches!(KnnModel::from_artifact(artifact), Err(Error::Model(_))));
    }

    #[test]
    fn test_rejects_undeclared_label() {
        let rows = labelled();
        let mut artifact = KnnArtifact::from_labelled(3, rows.iter().map(|(fv, l)| (fv, *l)));
        artifact.classes = vec!["supply_air_temperature_sensor".to_string()];
        assert!(matches!(KnnModel::from_artifact(artifact), Err(Error::Model(_))));
    }

    #[test]
    fn test_declared_classes_keep_their_order() {
        let rows = labelled();
        let mut artifact = KnnArtifact::from_labelled(3, rows.iter().map(|(fv, l)| (fv, *l)));
        artifact.classes = vec![
            "supply_fan_run_command".to_string(),
            "zone_air_temperature_sensor".to_string(),
            "supply_air_temperature_sensor".to_string(),
        ];
        let model = KnnModel::from_artifact(artifact).unwrap();
        assert_eq!(model.classes()[0], "supply_fan_run_command");
        assert_eq!(model.score(&rows[0].0).unwrap().len(), 3);
    }

    #[test]
    fn test_load_artifact_file() {
        let rows = labelled();
        let artifact = KnnArtifact::from_labelled(5, rows.iter().map(|(fv, l)| (fv, *l)));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knn.json");
        std::fs::write(&path, artifact.to_json().unwrap()).unwrap();

        let model = KnnModel::load(&path).unwrap();
        assert_eq!(model.exemplar_count(), 6);
        assert_eq!(model.classes().len(), 2);
    }
}

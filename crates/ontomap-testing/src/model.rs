//! Stub scoring model
//!
//! Scores come from a table keyed by point identifier. Listed classes get
//! their probability and the remaining mass is spread evenly over the other
//! classes; points missing from the table score uniformly.

use std::collections::HashMap;
use std::time::Duration;

use ontomap_core::{Error, FeatureVector, OntologySchema, Result, ScoringModel};

/// Deterministic table-driven model.
#[derive(Debug, Clone)]
pub struct StubModel {
    classes: Vec<String>,
    table: HashMap<String, Vec<(String, f64)>>,
    available: bool,
    delay: Option<Duration>,
    failing: Vec<String>,
}

impl StubModel {
    /// Model over an explicit class vocabulary.
    pub fn new(classes: Vec<String>) -> Self {
        Self {
            classes,
            table: HashMap::new(),
            available: true,
            delay: None,
            failing: Vec::new(),
        }
    }

    /// Model over a schema's point types.
    pub fn for_schema(schema: &OntologySchema) -> Self {
        Self::new(schema.point_type_names())
    }

    /// Set the probabilities for one point.
    pub fn with_scores(mut self, point: impl Into<String>, scores: &[(&str, f64)]) -> Self {
        self.insert(point, scores);
        self
    }

    pub fn insert(&mut self, point: impl Into<String>, scores: &[(&str, f64)]) {
        self.table.insert(
            point.into(),
            scores.iter().map(|(c, s)| (c.to_string(), *s)).collect(),
        );
    }

    /// A model that always reports itself unavailable.
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    /// Sleep this long inside every score call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail with a model error for this point.
    pub fn failing_for(mut self, point: impl Into<String>) -> Self {
        self.failing.push(point.into());
        self
    }
}

impl ScoringModel for StubModel {
    fn name(&self) -> &str {
        "stub"
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn score(&self, features: &FeatureVector) -> Result<Vec<f64>> {
        if !self.available {
            return Err(Error::ModelUnavailable("stub model offline".to_string()));
        }
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let point = features.point_id.as_str();
        if self.failing.iter().any(|p| p == point) {
            return Err(Error::model(format!("stub failure for '{}'", point)));
        }
        if self.classes.is_empty() {
            return Ok(Vec::new());
        }

        let Some(listed) = self.table.get(point) else {
            let uniform = 1.0 / self.classes.len() as f64;
            return Ok(vec![uniform; self.classes.len()]);
        };

        let mut scores = vec![0.0; self.classes.len()];
        let mut assigned = 0.0;
        for (class, score) in listed {
            if let Some(i) = self.classes.iter().position(|c| c == class) {
                scores[i] = *score;
                assigned += *score;
            }
        }
        let rest: Vec<usize> = (0..self.classes.len())
            .filter(|&i| !listed.iter().any(|(c, _)| *c == self.classes[i]))
            .collect();
        let remaining = (1.0 - assigned).max(0.0);
        if !rest.is_empty() {
            let share = remaining / rest.len() as f64;
            for i in rest {
                scores[i] = share;
            }
        }
        Ok(scores)
    }
}

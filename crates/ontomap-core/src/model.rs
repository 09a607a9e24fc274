//! Scoring model capability.
//!
//! The classifier treats the model as a black box: vector in, per-class
//! probabilities out. Training and artifact formats are the model's own
//! business.

use std::sync::Arc;

use crate::feature::FeatureVector;
use crate::Result;

/// Type identifier of the floor candidate appended to every ranking.
pub const UNKNOWN_TYPE: &str = "unknown";

/// Synchronous scoring capability over the ontology's point-type vocabulary.
///
/// Implementations must be deterministic for a fixed input and must report
/// [`Error::ModelUnavailable`](crate::Error::ModelUnavailable) rather than
/// fabricate scores when they cannot answer.
pub trait ScoringModel: Send + Sync {
    /// Model name, for diagnostics.
    fn name(&self) -> &str;

    /// Class labels, index-aligned with [`score`](Self::score) output.
    fn classes(&self) -> &[String];

    /// Whether the model can currently answer.
    fn is_available(&self) -> bool {
        true
    }

    /// Per-class scores, one per entry in [`classes`](Self::classes).
    fn score(&self, features: &FeatureVector) -> Result<Vec<f64>>;
}

/// Shared model handle.
pub type DynScoringModel = Arc<dyn ScoringModel>;

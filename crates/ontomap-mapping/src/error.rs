//! Error types for the mapping engine

use thiserror::Error;

use ontomap_core::PointId;

/// Mapping result type
pub type Result<T> = std::result::Result<T, MappingError>;

/// Errors raised by the mapping pipeline and its session
#[derive(Error, Debug)]
pub enum MappingError {
    /// Scoring model cannot answer
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Scoring model returned an unusable result
    #[error("Model error: {0}")]
    Model(String),

    /// Per-point model invocation exceeded its deadline
    #[error("Classification of point '{point_id}' timed out after {timeout_ms}ms")]
    ClassificationTimeout { point_id: PointId, timeout_ms: u64 },

    /// Graph requested before the session was validated
    #[error("Session has not been validated")]
    SessionNotValidated,

    /// Mutation attempted on a validated session
    #[error("Session is validated and frozen")]
    SessionFrozen,

    /// Run was cancelled between stages
    #[error("Mapping run cancelled")]
    Cancelled,

    /// Point is already bound to another field
    #[error("Point '{point_id}' is already claimed by equipment '{equipment}'")]
    PointAlreadyClaimed { point_id: PointId, equipment: String },

    /// Field on the instance is already bound
    #[error("Field '{field}' of equipment '{equipment}' is already assigned")]
    FieldAlreadyAssigned { equipment: String, field: String },

    /// Point identifier appears twice in the ingested set
    #[error("Duplicate point identifier: {0}")]
    DuplicatePoint(PointId),

    /// Equipment instance not present in the session
    #[error("Unknown equipment: {0}")]
    UnknownEquipment(String),

    /// Equipment identifier already used in the session
    #[error("Duplicate equipment: {0}")]
    DuplicateEquipment(String),

    /// Equipment type not declared in the schema
    #[error("Unknown equipment type: {0}")]
    UnknownEquipmentType(String),

    /// Field not declared on the equipment type
    #[error("Field '{field}' is not defined on equipment type '{equipment_type}'")]
    UnknownField {
        equipment_type: String,
        field: String,
    },

    /// Point not present in the session
    #[error("Unknown point: {0}")]
    UnknownPoint(PointId),

    /// Background task failed to complete
    #[error("Task failed: {0}")]
    Task(String),

    /// Core error
    #[error(transparent)]
    Core(#[from] ontomap_core::Error),
}

impl MappingError {
    /// Lift core model failures into their mapping counterparts.
    pub fn from_model(err: ontomap_core::Error) -> Self {
        match err {
            ontomap_core::Error::ModelUnavailable(msg) => MappingError::ModelUnavailable(msg),
            ontomap_core::Error::Model(msg) => MappingError::Model(msg),
            other => MappingError::Core(other),
        }
    }

    /// Whether the pipeline degrades this failure to a floor candidate.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            MappingError::ModelUnavailable(_)
                | MappingError::Model(_)
                | MappingError::ClassificationTimeout { .. }
                | MappingError::Task(_)
        )
    }
}

impl From<tokio::task::JoinError> for MappingError {
    fn from(e: tokio::task::JoinError) -> Self {
        MappingError::Task(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_errors_are_lifted() {
        let err = MappingError::from_model(ontomap_core::Error::ModelUnavailable("offline".into()));
        assert!(matches!(err, MappingError::ModelUnavailable(_)));
        assert!(err.is_degradable());

        let err = MappingError::from_model(ontomap_core::Error::schema("bad"));
        assert!(matches!(err, MappingError::Core(_)));
        assert!(!err.is_degradable());
    }

    #[test]
    fn test_timeout_message() {
        let err = MappingError::ClassificationTimeout {
            point_id: PointId::new("p7"),
            timeout_ms: 250,
        };
        assert_eq!(
            err.to_string(),
            "Classification of point 'p7' timed out after 250ms"
        );
    }
}

//! Core types and boundary traits for OntoMap.
//!
//! This crate defines the data model shared by the mapping engine and its
//! adapters: point records, feature vectors, the ontology schema, the scoring
//! model capability and the BAS point/history sources.

pub mod config;
pub mod error;
pub mod feature;
pub mod model;
pub mod point;
pub mod schema;
pub mod source;

pub use config::MappingConfig;
pub use error::{Error, Result};
pub use feature::{FeatureValue, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use model::{DynScoringModel, ScoringModel, UNKNOWN_TYPE};
pub use point::{DataType, PointId, PointRecord, Sample, UnitCategory};
pub use schema::{
    EndpointPair, EquipmentTypeDef, OntologySchema, PointTypeDef, RelationshipKindDef,
    SchemaIssue, LOCATION_ENDPOINT, WILDCARD_ENDPOINT,
};
pub use source::{
    HistorySource, InMemoryHistorySource, InMemoryPointSource, JsonPointSource, PointSource,
    TimeWindow,
};

/// Re-exports commonly used types.
pub mod prelude {
    pub use crate::config::MappingConfig;
    pub use crate::error::{Error, Result};
    pub use crate::feature::{FeatureValue, FeatureVector};
    pub use crate::model::{DynScoringModel, ScoringModel};
    pub use crate::point::{DataType, PointId, PointRecord, Sample, UnitCategory};
    pub use crate::schema::OntologySchema;
    pub use crate::source::{HistorySource, PointSource, TimeWindow};
}

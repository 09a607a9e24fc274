//! OntoMap Mapping Engine
//!
//! Maps building-automation points onto the Digital Buildings Ontology.
//!
//! ## Pipeline
//!
//! - **Feature Extractor**: point record → fixed-shape feature vector
//! - **Candidate Classifier**: feature vector → ranked point types with an `unknown` floor
//! - **Relationship Resolver**: clusters points by naming key into equipment instances and edges
//! - **Ontology Validator**: reports every schema violation in one pass
//! - **Mapping Session**: open/validated working set exposing the report and semantic graph
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ontomap_core::{JsonPointSource, OntologySchema};
//! use ontomap_mapping::{CancelSignal, LexiconModel, MappingEngine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let schema = Arc::new(OntologySchema::load_checked("dbo.json")?);
//!     let model = Arc::new(LexiconModel::from_schema(&schema));
//!     let engine = MappingEngine::new(schema, model);
//!
//!     let points = JsonPointSource::parse(&std::fs::read_to_string("points.json")?)?;
//!     let mut session = engine.open_session("hq", points)?;
//!     let report = engine.run(&mut session, &CancelSignal::never()).await?;
//!     let graph = session.graph()?;
//!     println!("{} violations", report.violations.len());
//!     println!("{}", graph.to_json()?);
//!     Ok(())
//! }
//! ```

pub mod cancel;
pub mod classifier;
pub mod engine;
pub mod equipment;
pub mod error;
pub mod features;
pub mod graph;
pub mod lexicon;
pub mod models;
pub mod naming;
pub mod report;
pub mod resolver;
pub mod session;
pub mod validator;

pub use cancel::{CancelHandle, CancelSignal};
pub use classifier::{Candidate, CandidateClassifier};
pub use engine::MappingEngine;
pub use equipment::{EdgeEndpoint, EquipmentId, EquipmentInstance, FieldAssignment, RelationshipEdge};
pub use error::{MappingError, Result};
pub use features::{FeatureExtractor, HistoryStats};
pub use graph::{EquipmentNode, LocationNode, PointBinding, SemanticGraph};
pub use models::{KnnArtifact, KnnModel, LexiconModel};
pub use naming::{structural_key, StructuralKey};
pub use report::{
    DiagnosticKind, PointDiagnostic, ReportSummary, RuleId, Subject, UnresolvedPoint,
    UnresolvedReason, ValidationReport, Violation,
};
pub use resolver::{RelationshipResolver, ResolutionSummary};
pub use session::{MappingSession, SessionInfo, SessionStatus};
pub use validator::{OntologyValidator, ValidationInput};

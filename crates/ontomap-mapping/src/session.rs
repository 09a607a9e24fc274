//! Mapping session.
//!
//! A session owns the ingested point set for one site and the working set
//! built over it: feature vectors, candidate rankings, equipment instances,
//! field bindings and relationship edges. It is either `Open` (mutable) or
//! `Validated` (frozen, with a [`ValidationReport`] and a graph available).
//! A validated session is never re-opened; [`MappingSession::reopen`]
//! starts a fresh one over the same records.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ontomap_core::{
    FeatureVector, HistorySource, OntologySchema, PointId, PointRecord, PointSource, TimeWindow,
};

use crate::classifier::Candidate;
use crate::equipment::{
    EdgeEndpoint, EquipmentId, EquipmentInstance, FieldAssignment, RelationshipEdge,
};
use crate::error::{MappingError, Result};
use crate::graph::SemanticGraph;
use crate::report::{PointDiagnostic, UnresolvedPoint, UnresolvedReason, ValidationReport};
use crate::validator::OntologyValidator;

/// Lifecycle state, for operator polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Validated,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Open => f.write_str("open"),
            SessionStatus::Validated => f.write_str("validated"),
        }
    }
}

/// Identity and counts of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: Uuid,
    pub site: String,
    pub created_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub points: usize,
}

#[derive(Debug, Clone, Default)]
struct WorkingSet {
    /// Index-aligned with the session records
    features: Vec<Option<FeatureVector>>,
    /// Index-aligned with the session records
    candidates: Vec<Vec<Candidate>>,
    instances: Vec<EquipmentInstance>,
    edges: Vec<RelationshipEdge>,
    /// Point → (equipment, field)
    claims: HashMap<PointId, (EquipmentId, String)>,
    unresolved: Vec<UnresolvedPoint>,
    diagnostics: Vec<PointDiagnostic>,
}

impl WorkingSet {
    fn empty(points: usize) -> Self {
        Self {
            features: vec![None; points],
            candidates: vec![Vec::new(); points],
            ..Default::default()
        }
    }

    fn clear_structure(&mut self) {
        self.instances.clear();
        self.edges.clear();
        self.claims.clear();
        self.unresolved.clear();
    }
}

#[derive(Debug, Clone)]
enum SessionState {
    Open(WorkingSet),
    Validated {
        work: WorkingSet,
        report: ValidationReport,
    },
}

/// Working context for mapping one site's points.
#[derive(Debug, Clone)]
pub struct MappingSession {
    id: Uuid,
    site: String,
    created_at: DateTime<Utc>,
    schema: Arc<OntologySchema>,
    records: Arc<[PointRecord]>,
    index: HashMap<PointId, usize>,
    state: SessionState,
}

impl MappingSession {
    /// Open a session over an ingested point set.
    ///
    /// Point identifiers must be unique.
    pub fn new(
        site: impl Into<String>,
        schema: Arc<OntologySchema>,
        records: Vec<PointRecord>,
    ) -> Result<Self> {
        let mut index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if index.insert(record.id.clone(), i).is_some() {
                return Err(MappingError::DuplicatePoint(record.id.clone()));
            }
        }

        let session = Self {
            id: Uuid::new_v4(),
            site: site.into(),
            created_at: Utc::now(),
            schema,
            state: SessionState::Open(WorkingSet::empty(records.len())),
            records: records.into(),
            index,
        };
        tracing::info!(
            category = "session",
            session = %session.id,
            site = %session.site,
            points = session.records.len(),
            "Opened mapping session"
        );
        Ok(session)
    }

    /// Open a session from the BAS point source, optionally filling empty
    /// histories from a history source.
    ///
    /// History read failures are logged and leave the point without history.
    pub async fn from_source(
        site: impl Into<String>,
        schema: Arc<OntologySchema>,
        points: &dyn PointSource,
        history: Option<(&dyn HistorySource, TimeWindow)>,
    ) -> Result<Self> {
        let mut records = points.enumerate().await?;
        if let Some((source, window)) = history {
            for record in records.iter_mut().filter(|r| r.history.is_empty()) {
                match source.read_history(&record.id, &window).await {
                    Ok(samples) => record.history = samples,
                    Err(e) => tracing::warn!(
                        category = "session",
                        point = %record.id,
                        error = %e,
                        "History read failed"
                    ),
                }
            }
        }
        Self::new(site, schema, records)
    }

    /// Fresh open session over the same records and schema.
    pub fn reopen(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            site: self.site.clone(),
            created_at: Utc::now(),
            schema: Arc::clone(&self.schema),
            records: Arc::clone(&self.records),
            index: self.index.clone(),
            state: SessionState::Open(WorkingSet::empty(self.records.len())),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn schema(&self) -> &OntologySchema {
        &self.schema
    }

    pub fn schema_handle(&self) -> Arc<OntologySchema> {
        Arc::clone(&self.schema)
    }

    pub fn status(&self) -> SessionStatus {
        match self.state {
            SessionState::Open(_) => SessionStatus::Open,
            SessionState::Validated { .. } => SessionStatus::Validated,
        }
    }

    pub fn is_validated(&self) -> bool {
        self.status() == SessionStatus::Validated
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id,
            site: self.site.clone(),
            created_at: self.created_at,
            status: self.status(),
            points: self.records.len(),
        }
    }

    /// Ingested records, in ingest order.
    pub fn records(&self) -> &[PointRecord] {
        &self.records
    }

    pub fn record(&self, point: &PointId) -> Option<&PointRecord> {
        self.index.get(point).map(|&i| &self.records[i])
    }

    /// Ingest position of a point.
    pub fn position(&self, point: &PointId) -> Option<usize> {
        self.index.get(point).copied()
    }

    pub fn features(&self, point: &PointId) -> Option<&FeatureVector> {
        self.index
            .get(point)
            .and_then(|&i| self.work().features[i].as_ref())
    }

    /// Candidate ranking of a point; empty before classification.
    pub fn candidates(&self, point: &PointId) -> &[Candidate] {
        self.index
            .get(point)
            .map(|&i| self.work().candidates[i].as_slice())
            .unwrap_or(&[])
    }

    pub fn instances(&self) -> &[EquipmentInstance] {
        &self.work().instances
    }

    pub fn instance(&self, id: &EquipmentId) -> Option<&EquipmentInstance> {
        self.work().instances.iter().find(|e| &e.id == id)
    }

    pub fn edges(&self) -> &[RelationshipEdge] {
        &self.work().edges
    }

    pub fn unresolved(&self) -> &[UnresolvedPoint] {
        &self.work().unresolved
    }

    pub fn diagnostics(&self) -> &[PointDiagnostic] {
        &self.work().diagnostics
    }

    /// Equipment and field a point is bound to.
    pub fn claimed_by(&self, point: &PointId) -> Option<(&EquipmentId, &str)> {
        self.work()
            .claims
            .get(point)
            .map(|(equipment, field)| (equipment, field.as_str()))
    }

    /// Report of a validated session.
    pub fn report(&self) -> Option<&ValidationReport> {
        match &self.state {
            SessionState::Open(_) => None,
            SessionState::Validated { report, .. } => Some(report),
        }
    }

    /// Semantic graph of a validated session.
    pub fn graph(&self) -> Result<SemanticGraph> {
        match self.report() {
            Some(report) => Ok(SemanticGraph::build(self, report)),
            None => Err(MappingError::SessionNotValidated),
        }
    }

    pub fn ensure_open(&self) -> Result<()> {
        match self.state {
            SessionState::Open(_) => Ok(()),
            SessionState::Validated { .. } => Err(MappingError::SessionFrozen),
        }
    }

    fn work(&self) -> &WorkingSet {
        match &self.state {
            SessionState::Open(work) => work,
            SessionState::Validated { work, .. } => work,
        }
    }

    fn work_mut(&mut self) -> Result<&mut WorkingSet> {
        match &mut self.state {
            SessionState::Open(work) => Ok(work),
            SessionState::Validated { .. } => Err(MappingError::SessionFrozen),
        }
    }

    fn index_of(&self, point: &PointId) -> Result<usize> {
        self.index
            .get(point)
            .copied()
            .ok_or_else(|| MappingError::UnknownPoint(point.clone()))
    }

    /// Store a point's feature vector.
    pub fn set_features(&mut self, features: FeatureVector) -> Result<()> {
        let i = self.index_of(&features.point_id)?;
        self.work_mut()?.features[i] = Some(features);
        Ok(())
    }

    /// Store a point's candidate ranking.
    pub fn set_candidates(&mut self, point: &PointId, candidates: Vec<Candidate>) -> Result<()> {
        let i = self.index_of(point)?;
        self.work_mut()?.candidates[i] = candidates;
        Ok(())
    }

    pub fn record_diagnostic(&mut self, diagnostic: PointDiagnostic) -> Result<()> {
        self.index_of(&diagnostic.point_id)?;
        self.work_mut()?.diagnostics.push(diagnostic);
        Ok(())
    }

    /// Drop instances, bindings, edges and unresolved markers.
    pub fn clear_structure(&mut self) -> Result<()> {
        self.work_mut()?.clear_structure();
        Ok(())
    }

    /// Discard the whole working set, leaving the session open and unresolved.
    pub fn rollback(&mut self) -> Result<()> {
        let points = self.records.len();
        *self.work_mut()? = WorkingSet::empty(points);
        tracing::info!(
            category = "session",
            session = %self.id,
            "Rolled back working set"
        );
        Ok(())
    }

    /// Add an equipment instance. Any pre-filled fields are bound through
    /// [`assign_field`](Self::assign_field).
    pub fn add_instance(&mut self, mut instance: EquipmentInstance) -> Result<()> {
        self.ensure_open()?;
        if self.schema.equipment_type(&instance.equipment_type).is_none() {
            return Err(MappingError::UnknownEquipmentType(instance.equipment_type));
        }
        if self.instance(&instance.id).is_some() {
            return Err(MappingError::DuplicateEquipment(instance.id.to_string()));
        }

        let fields = std::mem::take(&mut instance.fields);
        let id = instance.id.clone();
        self.work_mut()?.instances.push(instance);
        for (field, assignment) in fields {
            self.assign_field(&id, &field, &assignment.point_id, assignment.confidence)?;
        }
        Ok(())
    }

    /// Bind a point to an equipment field.
    ///
    /// A point fills at most one field and a field holds at most one point.
    pub fn assign_field(
        &mut self,
        equipment: &EquipmentId,
        field: &str,
        point: &PointId,
        confidence: f64,
    ) -> Result<()> {
        self.ensure_open()?;
        self.index_of(point)?;

        let instance = self
            .instance(equipment)
            .ok_or_else(|| MappingError::UnknownEquipment(equipment.to_string()))?;
        let def = self
            .schema
            .equipment_type(&instance.equipment_type)
            .ok_or_else(|| MappingError::UnknownEquipmentType(instance.equipment_type.clone()))?;
        if !def.has_field(field) {
            return Err(MappingError::UnknownField {
                equipment_type: instance.equipment_type.clone(),
                field: field.to_string(),
            });
        }
        if instance.fields.contains_key(field) {
            return Err(MappingError::FieldAlreadyAssigned {
                equipment: equipment.to_string(),
                field: field.to_string(),
            });
        }
        if let Some((owner, _)) = self.claimed_by(point) {
            return Err(MappingError::PointAlreadyClaimed {
                point_id: point.clone(),
                equipment: owner.to_string(),
            });
        }

        let work = self.work_mut()?;
        if let Some(instance) = work.instances.iter_mut().find(|e| &e.id == equipment) {
            instance.fields.insert(
                field.to_string(),
                FieldAssignment {
                    point_id: point.clone(),
                    confidence,
                },
            );
        }
        work.claims
            .insert(point.clone(), (equipment.clone(), field.to_string()));
        work.unresolved.retain(|u| &u.point_id != point);
        Ok(())
    }

    /// Release a field binding. Returns the point that held it.
    pub fn unassign_field(&mut self, equipment: &EquipmentId, field: &str) -> Result<Option<PointId>> {
        let work = self.work_mut()?;
        let instance = work
            .instances
            .iter_mut()
            .find(|e| &e.id == equipment)
            .ok_or_else(|| MappingError::UnknownEquipment(equipment.to_string()))?;
        let released = instance.fields.remove(field).map(|a| a.point_id);
        if let Some(point) = &released {
            work.claims.remove(point);
        }
        Ok(released)
    }

    /// Add a relationship edge between existing session entities.
    ///
    /// Repeated edges are ignored. Kind permissions are left to the validator.
    pub fn add_edge(&mut self, edge: RelationshipEdge) -> Result<()> {
        self.ensure_open()?;
        if self.instance(&edge.source).is_none() {
            return Err(MappingError::UnknownEquipment(edge.source.to_string()));
        }
        if let EdgeEndpoint::Equipment(target) = &edge.target {
            if self.instance(target).is_none() {
                return Err(MappingError::UnknownEquipment(target.to_string()));
            }
        }
        let work = self.work_mut()?;
        if !work.edges.contains(&edge) {
            work.edges.push(edge);
        }
        Ok(())
    }

    /// Mark a point as unbound, replacing any earlier reason.
    pub fn mark_unresolved(&mut self, point: &PointId, reason: UnresolvedReason) -> Result<()> {
        self.index_of(point)?;
        let work = self.work_mut()?;
        work.unresolved.retain(|u| &u.point_id != point);
        work.unresolved.push(UnresolvedPoint {
            point_id: point.clone(),
            reason,
        });
        Ok(())
    }

    /// Validate the working set and freeze the session.
    pub fn validate(&mut self, validator: &OntologyValidator) -> Result<&ValidationReport> {
        self.ensure_open()?;
        let report = validator.validate(self);

        let state = std::mem::replace(&mut self.state, SessionState::Open(WorkingSet::default()));
        self.state = match state {
            SessionState::Open(work) => SessionState::Validated { work, report },
            validated => validated,
        };

        tracing::info!(
            category = "session",
            session = %self.id,
            violations = self.report().map(|r| r.violations.len()).unwrap_or(0),
            "Session validated"
        );
        self.report().ok_or(MappingError::SessionNotValidated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ontomap_core::{
        EquipmentTypeDef, InMemoryHistorySource, InMemoryPointSource, PointTypeDef, Sample,
    };

    fn schema() -> Arc<OntologySchema> {
        Arc::new(
            OntologySchema::new("test", "1")
                .with_point_type(PointTypeDef::new("supply_air_temperature_sensor"))
                .with_point_type(PointTypeDef::new("return_air_temperature_sensor"))
                .with_equipment_type(
                    EquipmentTypeDef::new("AHU")
                        .with_required(&["supply_air_temperature_sensor"])
                        .with_optional(&["return_air_temperature_sensor"]),
                ),
        )
    }

    fn session() -> MappingSession {
        let records = vec![
            PointRecord::new("p1", "AHU1_SAT"),
            PointRecord::new("p2", "AHU1_RAT"),
        ];
        MappingSession::new("hq", schema(), records).unwrap()
    }

    #[test]
    fn test_duplicate_point_rejected() {
        let records = vec![PointRecord::new("p1", "a"), PointRecord::new("p1", "b")];
        let err = MappingSession::new("hq", schema(), records).unwrap_err();
        assert!(matches!(err, MappingError::DuplicatePoint(_)));
    }

    #[test]
    fn test_point_claimed_once() {
        let mut session = session();
        session
            .add_instance(EquipmentInstance::new("AHU-1", "AHU", 0.9))
            .unwrap();
        let ahu = EquipmentId::new("AHU-1");
        let p1 = PointId::new("p1");

        session
            .assign_field(&ahu, "supply_air_temperature_sensor", &p1, 0.9)
            .unwrap();
        let err = session
            .assign_field(&ahu, "return_air_temperature_sensor", &p1, 0.5)
            .unwrap_err();
        assert!(matches!(err, MappingError::PointAlreadyClaimed { .. }));

        let err = session
            .assign_field(&ahu, "supply_air_temperature_sensor", &PointId::new("p2"), 0.5)
            .unwrap_err();
        assert!(matches!(err, MappingError::FieldAlreadyAssigned { .. }));

        let err = session
            .assign_field(&ahu, "zone_air_temperature_sensor", &PointId::new("p2"), 0.5)
            .unwrap_err();
        assert!(matches!(err, MappingError::UnknownField { .. }));

        assert_eq!(
            session.claimed_by(&p1),
            Some((&ahu, "supply_air_temperature_sensor"))
        );
    }

    #[test]
    fn test_unassign_releases_point() {
        let mut session = session();
        let ahu = EquipmentId::new("AHU-1");
        session
            .add_instance(EquipmentInstance::new("AHU-1", "AHU", 0.9))
            .unwrap();
        session
            .assign_field(&ahu, "supply_air_temperature_sensor", &PointId::new("p1"), 0.9)
            .unwrap();

        let released = session
            .unassign_field(&ahu, "supply_air_temperature_sensor")
            .unwrap();
        assert_eq!(released, Some(PointId::new("p1")));
        assert!(session.claimed_by(&PointId::new("p1")).is_none());
    }

    #[test]
    fn test_edges_require_existing_instances() {
        let mut session = session();
        session
            .add_instance(EquipmentInstance::new("AHU-1", "AHU", 0.9))
            .unwrap();
        let edge = RelationshipEdge::between("feeds", "AHU-1".into(), "VAV-9".into());
        assert!(matches!(
            session.add_edge(edge),
            Err(MappingError::UnknownEquipment(_))
        ));
    }

    #[test]
    fn test_graph_requires_validation() {
        let mut session = session();
        assert!(matches!(session.graph(), Err(MappingError::SessionNotValidated)));
        assert!(session.report().is_none());

        session.validate(&OntologyValidator::new(schema())).unwrap();
        assert_eq!(session.status(), SessionStatus::Validated);
        assert!(session.graph().is_ok());
    }

    #[test]
    fn test_validated_session_is_frozen() {
        let mut session = session();
        session.validate(&OntologyValidator::new(schema())).unwrap();

        let err = session
            .add_instance(EquipmentInstance::new("AHU-1", "AHU", 0.9))
            .unwrap_err();
        assert!(matches!(err, MappingError::SessionFrozen));
        assert!(matches!(session.rollback(), Err(MappingError::SessionFrozen)));
        assert!(matches!(
            session.validate(&OntologyValidator::new(schema())),
            Err(MappingError::SessionFrozen)
        ));

        let fresh = session.reopen();
        assert_eq!(fresh.status(), SessionStatus::Open);
        assert_ne!(fresh.id(), session.id());
        assert_eq!(fresh.records().len(), 2);
    }

    #[tokio::test]
    async fn test_from_source_fills_history() {
        let points = InMemoryPointSource::new(vec![PointRecord::new("p1", "AHU1_SAT")]);
        let samples = InMemoryHistorySource::new().with_samples("p1", vec![Sample::new(10, 55.0)]);
        let history: &dyn HistorySource = &samples;

        let session = MappingSession::from_source(
            "hq",
            schema(),
            &points,
            Some((history, TimeWindow::new(0, 100))),
        )
        .await
        .unwrap();
        assert_eq!(session.records()[0].history.len(), 1);
    }
}

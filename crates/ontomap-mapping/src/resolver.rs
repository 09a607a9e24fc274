//! Relationship resolution.
//!
//! Groups classified points into clusters by structural key, picks the
//! best-scoring equipment type per cluster, binds points to that type's
//! fields and infers parent and location edges the schema permits.
//! Resolution mutates the session and is single threaded.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use ontomap_core::{
    config::defaults, EquipmentTypeDef, MappingConfig, OntologySchema, PointId, PointRecord,
    UnitCategory, LOCATION_ENDPOINT,
};

use crate::classifier::Candidate;
use crate::equipment::{EquipmentId, EquipmentInstance, RelationshipEdge};
use crate::error::Result;
use crate::lexicon;
use crate::naming::{structural_key, StructuralKey};
use crate::report::UnresolvedReason;
use crate::session::MappingSession;

/// Counts from one resolution pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSummary {
    pub clusters: usize,
    pub equipment: usize,
    pub bound_points: usize,
    pub unresolved: usize,
    pub edges: usize,
    /// Parent or location hints for which no relationship kind is permitted
    pub suppressed_edges: usize,
}

/// Points sharing a structural key, in ingest order.
#[derive(Debug)]
struct Cluster {
    key: Option<StructuralKey>,
    members: Vec<usize>,
}

struct Hypothesis<'a> {
    def: &'a EquipmentTypeDef,
    /// Aggregate confidence, clamped to [0, 1]
    score: f64,
    /// Unclamped score including the naming bonus, used for ranking
    rank: f64,
    /// Required fields some member can fill
    coverage: usize,
}

struct FieldMatch {
    score: f64,
    specificity: u8,
    point: usize,
    field: usize,
}

/// Builds equipment instances and edges over a classified session.
#[derive(Debug, Clone)]
pub struct RelationshipResolver {
    min_equipment_confidence: f64,
    min_field_similarity: f64,
    name_hint_weight: f64,
}

impl Default for RelationshipResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl RelationshipResolver {
    pub fn new() -> Self {
        Self {
            min_equipment_confidence: defaults::MIN_EQUIPMENT_CONFIDENCE,
            min_field_similarity: defaults::MIN_FIELD_SIMILARITY,
            name_hint_weight: defaults::NAME_HINT_WEIGHT,
        }
    }

    pub fn from_config(config: &MappingConfig) -> Self {
        Self::new()
            .with_min_equipment_confidence(config.min_equipment_confidence)
            .with_min_field_similarity(config.min_field_similarity)
            .with_name_hint_weight(config.name_hint_weight)
    }

    pub fn with_min_equipment_confidence(mut self, min: f64) -> Self {
        self.min_equipment_confidence = min.clamp(0.0, 1.0);
        self
    }

    pub fn with_min_field_similarity(mut self, min: f64) -> Self {
        self.min_field_similarity = min.clamp(0.0, 1.0);
        self
    }

    pub fn with_name_hint_weight(mut self, weight: f64) -> Self {
        self.name_hint_weight = weight.clamp(0.0, 1.0);
        self
    }

    /// How strongly a point's candidates support filling `field`.
    ///
    /// The best `confidence × similarity` over non-floor candidates whose
    /// hint names the same role as the field (see [`lexicon::same_role`])
    /// and is at least `min_field_similarity` similar to it.
    pub fn field_match(&self, candidates: &[Candidate], field: &str) -> f64 {
        candidates
            .iter()
            .filter_map(|c| c.field_hint().map(|hint| (c.confidence, hint)))
            .map(|(confidence, hint)| {
                if !lexicon::same_role(hint, field) {
                    return 0.0;
                }
                let similarity = lexicon::name_similarity(hint, field);
                if similarity >= self.min_field_similarity {
                    confidence * similarity
                } else {
                    0.0
                }
            })
            .fold(0.0, f64::max)
    }

    /// Rebuild equipment instances, field bindings and edges for the session.
    ///
    /// Any structure from an earlier pass is discarded first, so running
    /// twice over the same candidates gives the same result.
    pub fn resolve(&self, session: &mut MappingSession) -> Result<ResolutionSummary> {
        session.clear_structure()?;
        let schema = session.schema_handle();

        let clusters = cluster_points(session.records());
        let mut summary = ResolutionSummary {
            clusters: clusters.len(),
            ..Default::default()
        };

        let mut created: Vec<(StructuralKey, EquipmentId)> = Vec::new();
        for cluster in &clusters {
            if let Some(entry) = self.resolve_cluster(session, &schema, cluster)? {
                created.push(entry);
            }
        }
        summary.suppressed_edges = self.infer_edges(session, &schema, &created)?;

        summary.equipment = session.instances().len();
        summary.bound_points = session.instances().iter().map(|e| e.fields.len()).sum();
        summary.unresolved = session.unresolved().len();
        summary.edges = session.edges().len();

        tracing::info!(
            category = "mapping",
            stage = "resolve",
            session = %session.id(),
            clusters = summary.clusters,
            equipment = summary.equipment,
            bound = summary.bound_points,
            unresolved = summary.unresolved,
            edges = summary.edges,
            "Resolved equipment"
        );
        Ok(summary)
    }

    fn resolve_cluster(
        &self,
        session: &mut MappingSession,
        schema: &OntologySchema,
        cluster: &Cluster,
    ) -> Result<Option<(StructuralKey, EquipmentId)>> {
        let points: Vec<PointId> = cluster
            .members
            .iter()
            .map(|&i| session.records()[i].id.clone())
            .collect();

        let Some(key) = &cluster.key else {
            for point in &points {
                let reason = if top_is_unknown(session, point) {
                    UnresolvedReason::UnknownType
                } else {
                    UnresolvedReason::NoStructuralMatch
                };
                tracing::debug!(category = "resolver", point = %point, "Point has no structural key");
                session.mark_unresolved(point, reason)?;
            }
            return Ok(None);
        };

        let hypothesis = self.hypothesis(session, schema, cluster);
        let (def, score) = match hypothesis {
            Some(h) if h.score >= self.min_equipment_confidence => (h.def, h.score),
            other => {
                let best_type = other.as_ref().map(|h| h.def.name.clone());
                let confidence = other.map(|h| h.score).unwrap_or(0.0);
                tracing::debug!(
                    category = "resolver",
                    key = %key,
                    best_type = best_type.as_deref().unwrap_or("-"),
                    confidence,
                    "Cluster below equipment threshold"
                );
                for point in &points {
                    let reason = if top_is_unknown(session, point) {
                        UnresolvedReason::UnknownType
                    } else {
                        UnresolvedReason::BelowThreshold {
                            best_type: best_type.clone(),
                            confidence,
                        }
                    };
                    session.mark_unresolved(point, reason)?;
                }
                return Ok(None);
            }
        };

        let id = EquipmentId::new(key.to_string());
        let mut instance = EquipmentInstance::new(id.clone(), def.name.clone(), score);
        if let Some(location) = majority_location(session.records(), &cluster.members) {
            instance = instance.with_location(location);
        }
        session.add_instance(instance)?;

        let fields: Vec<&str> = def.fields().map(|(f, _)| f).collect();
        let matches = self.field_matches(session, schema, cluster, &fields);

        let mut bound: HashSet<usize> = HashSet::new();
        let mut filled: HashSet<usize> = HashSet::new();
        for m in matches {
            if bound.contains(&m.point) || filled.contains(&m.field) {
                continue;
            }
            let point = session.records()[m.point].id.clone();
            session.assign_field(&id, fields[m.field], &point, m.score)?;
            bound.insert(m.point);
            filled.insert(m.field);
        }

        for (&i, point) in cluster.members.iter().zip(&points) {
            if bound.contains(&i) {
                continue;
            }
            let reason = if top_is_unknown(session, point) {
                UnresolvedReason::UnknownType
            } else {
                UnresolvedReason::NoFieldAvailable {
                    equipment: id.clone(),
                }
            };
            session.mark_unresolved(point, reason)?;
        }

        tracing::debug!(
            category = "resolver",
            equipment = %id,
            equipment_type = %def.name,
            confidence = score,
            bound = bound.len(),
            members = cluster.members.len(),
            "Created equipment instance"
        );
        Ok(Some((key.clone(), id)))
    }

    /// Highest aggregate equipment-type hypothesis for a cluster.
    ///
    /// Types are ranked on the unclamped score so the naming bonus still
    /// separates them when the field evidence alone saturates. Ties go to
    /// the type covering more required fields, then to schema declaration
    /// order.
    fn hypothesis<'a>(
        &self,
        session: &MappingSession,
        schema: &'a OntologySchema,
        cluster: &Cluster,
    ) -> Option<Hypothesis<'a>> {
        if cluster.members.is_empty() {
            return None;
        }
        let tag = cluster.key.as_ref().map(|k| k.leaf().kind.as_str());
        let rankings: Vec<&[Candidate]> = cluster
            .members
            .iter()
            .map(|&i| session.candidates(&session.records()[i].id))
            .collect();

        let mut best: Option<Hypothesis<'a>> = None;
        for def in &schema.equipment_types {
            let total: f64 = rankings
                .iter()
                .map(|candidates| {
                    def.fields()
                        .map(|(field, _)| self.field_match(candidates, field))
                        .fold(0.0, f64::max)
                })
                .sum();
            let mut rank = total / rankings.len() as f64;
            if tag.map(|t| def.matches_tag(t)).unwrap_or(false) {
                rank += self.name_hint_weight;
            }
            let score = rank.clamp(0.0, 1.0);
            let coverage = def
                .required_fields
                .iter()
                .filter(|field| {
                    rankings
                        .iter()
                        .any(|candidates| self.field_match(candidates, field) > 0.0)
                })
                .count();

            let better = match &best {
                None => true,
                Some(b) => rank > b.rank || (rank == b.rank && coverage > b.coverage),
            };
            if better {
                best = Some(Hypothesis {
                    def,
                    score,
                    rank,
                    coverage,
                });
            }
        }
        best
    }

    /// Candidate (point, field) bindings, best first.
    fn field_matches(
        &self,
        session: &MappingSession,
        schema: &OntologySchema,
        cluster: &Cluster,
        fields: &[&str],
    ) -> Vec<FieldMatch> {
        let mut matches = Vec::new();
        for &i in &cluster.members {
            let record = &session.records()[i];
            let candidates = session.candidates(&record.id);
            for (f, field) in fields.iter().enumerate() {
                if !fits_field(schema, record, field) {
                    continue;
                }
                let score = self.field_match(candidates, field);
                if score > 0.0 {
                    matches.push(FieldMatch {
                        score,
                        specificity: schema
                            .point_type(field)
                            .map(|p| p.specificity())
                            .unwrap_or(0),
                        point: i,
                        field: f,
                    });
                }
            }
        }
        matches.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(b.specificity.cmp(&a.specificity))
                .then(a.point.cmp(&b.point))
                .then(a.field.cmp(&b.field))
        });
        matches
    }

    /// Add parent→child and equipment→location edges. Returns the number of
    /// hints no relationship kind permits.
    fn infer_edges(
        &self,
        session: &mut MappingSession,
        schema: &OntologySchema,
        created: &[(StructuralKey, EquipmentId)],
    ) -> Result<usize> {
        let by_key: HashMap<&StructuralKey, &EquipmentId> =
            created.iter().map(|(key, id)| (key, id)).collect();
        let mut suppressed = 0;

        for (key, child) in created {
            let mut ancestor = key.parent();
            let parent = loop {
                match ancestor {
                    Some(k) => match by_key.get(&k) {
                        Some(id) => break Some(*id),
                        None => ancestor = k.parent(),
                    },
                    None => break None,
                }
            };
            let Some(parent) = parent else {
                continue;
            };

            let (Some(parent_type), Some(child_type)) = (
                session.instance(parent).map(|e| e.equipment_type.clone()),
                session.instance(child).map(|e| e.equipment_type.clone()),
            ) else {
                continue;
            };
            let kind = schema
                .kinds_between(&parent_type, &child_type)
                .next()
                .map(|k| k.name.clone());
            match kind {
                Some(kind) => session.add_edge(RelationshipEdge::between(
                    kind,
                    parent.clone(),
                    child.clone(),
                ))?,
                None => {
                    tracing::debug!(
                        category = "resolver",
                        source = %parent,
                        target = %child,
                        source_type = %parent_type,
                        target_type = %child_type,
                        "No relationship kind permitted; edge suppressed"
                    );
                    suppressed += 1;
                }
            }
        }

        for (_, id) in created {
            let Some((equipment_type, location)) = session
                .instance(id)
                .and_then(|e| e.location.clone().map(|l| (e.equipment_type.clone(), l)))
            else {
                continue;
            };
            let kind = schema
                .kinds_between(&equipment_type, LOCATION_ENDPOINT)
                .next()
                .map(|k| k.name.clone());
            match kind {
                Some(kind) => session.add_edge(RelationshipEdge::to_location(
                    kind,
                    id.clone(),
                    location,
                ))?,
                None => {
                    tracing::debug!(
                        category = "resolver",
                        source = %id,
                        location = %location,
                        "No location relationship permitted; edge suppressed"
                    );
                    suppressed += 1;
                }
            }
        }

        Ok(suppressed)
    }
}

/// Group records by structural key in first-encounter order. Keyless
/// records each form their own cluster.
fn cluster_points(records: &[PointRecord]) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = Vec::new();
    let mut by_key: HashMap<StructuralKey, usize> = HashMap::new();

    for (i, record) in records.iter().enumerate() {
        match structural_key(record) {
            Some(key) => match by_key.get(&key) {
                Some(&c) => clusters[c].members.push(i),
                None => {
                    by_key.insert(key.clone(), clusters.len());
                    clusters.push(Cluster {
                        key: Some(key),
                        members: vec![i],
                    });
                }
            },
            None => clusters.push(Cluster {
                key: None,
                members: vec![i],
            }),
        }
    }
    clusters
}

fn top_is_unknown(session: &MappingSession, point: &PointId) -> bool {
    session
        .candidates(point)
        .first()
        .map(Candidate::is_unknown)
        .unwrap_or(true)
}

/// Most common member location; ties go to the first seen.
fn majority_location(records: &[PointRecord], members: &[usize]) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for &i in members {
        if let Some(location) = records[i].effective_location() {
            match counts.iter_mut().find(|(l, _)| *l == location) {
                Some((_, n)) => *n += 1,
                None => counts.push((location, 1)),
            }
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for (location, n) in counts {
        if best.map(|(_, b)| n > b).unwrap_or(true) {
            best = Some((location, n));
        }
    }
    best.map(|(l, _)| l.to_string())
}

/// Whether a point's data type and units allow it to fill `field`.
fn fits_field(schema: &OntologySchema, record: &PointRecord, field: &str) -> bool {
    let Some(point_type) = schema.point_type(field) else {
        return true;
    };
    if let Some(expected) = point_type.data_type {
        if !record.effective_data_type().is_compatible_with(expected) {
            return false;
        }
    }
    match (point_type.unit_category, record.effective_units()) {
        (Some(expected), Some(units)) if expected != UnitCategory::Unknown => {
            let actual = lexicon::unit_category(units);
            actual == UnitCategory::Unknown || actual == expected
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ontomap_core::{DataType, PointTypeDef, RelationshipKindDef};

    use crate::equipment::EdgeEndpoint;

    fn schema() -> Arc<OntologySchema> {
        Arc::new(
            OntologySchema::new("test", "1")
                .with_point_type(
                    PointTypeDef::new("supply_air_temperature_sensor")
                        .with_data_type(DataType::Numeric)
                        .with_unit_category(UnitCategory::Temperature),
                )
                .with_point_type(
                    PointTypeDef::new("return_air_temperature_sensor")
                        .with_data_type(DataType::Numeric)
                        .with_unit_category(UnitCategory::Temperature),
                )
                .with_point_type(
                    PointTypeDef::new("zone_air_temperature_sensor")
                        .with_data_type(DataType::Numeric)
                        .with_unit_category(UnitCategory::Temperature),
                )
                .with_equipment_type(
                    EquipmentTypeDef::new("AHU")
                        .with_aliases(&["ahu"])
                        .with_required(&["supply_air_temperature_sensor"])
                        .with_optional(&["return_air_temperature_sensor"]),
                )
                .with_equipment_type(
                    EquipmentTypeDef::new("VAV")
                        .with_aliases(&["vav"])
                        .with_required(&["zone_air_temperature_sensor"]),
                )
                .with_relationship_kind(RelationshipKindDef::new("feeds").with_endpoint("AHU", "VAV"))
                .with_relationship_kind(
                    RelationshipKindDef::new("located_in").with_endpoint("VAV", LOCATION_ENDPOINT),
                ),
        )
    }

    fn classify(session: &mut MappingSession, point: &str, type_id: &str, confidence: f64) {
        let id = PointId::new(point);
        let candidates = vec![
            Candidate::new(id.clone(), type_id, confidence),
            Candidate::new(id.clone(), ontomap_core::UNKNOWN_TYPE, 1.0 - confidence),
        ];
        session.set_candidates(&id, candidates).unwrap();
    }

    #[test]
    fn test_clusters_follow_first_encounter() {
        let records = vec![
            PointRecord::new("p1", "AHU1_SAT"),
            PointRecord::new("p2", "Misc"),
            PointRecord::new("p3", "AHU2_SAT"),
            PointRecord::new("p4", "AHU1_RAT"),
        ];
        let clusters = cluster_points(&records);
        assert_eq!(clusters.len(), 3);
        assert_eq!(clusters[0].members, vec![0, 3]);
        assert!(clusters[1].key.is_none());
        assert_eq!(clusters[2].members, vec![2]);
    }

    #[test]
    fn test_resolves_cluster_into_equipment() {
        let records = vec![
            PointRecord::new("p1", "AHU1_SAT").with_units("°F"),
            PointRecord::new("p2", "AHU1_RAT").with_units("°F"),
        ];
        let mut session = MappingSession::new("hq", schema(), records).unwrap();
        classify(&mut session, "p1", "supply_air_temperature_sensor", 0.9);
        classify(&mut session, "p2", "return_air_temperature_sensor", 0.8);

        let summary = RelationshipResolver::new().resolve(&mut session).unwrap();
        assert_eq!(summary.equipment, 1);
        assert_eq!(summary.bound_points, 2);
        assert_eq!(summary.unresolved, 0);

        let ahu = session.instance(&EquipmentId::new("AHU-1")).unwrap();
        assert_eq!(ahu.equipment_type, "AHU");
        assert_eq!(
            ahu.point_for("supply_air_temperature_sensor"),
            Some(&PointId::new("p1"))
        );
        assert_eq!(
            ahu.point_for("return_air_temperature_sensor"),
            Some(&PointId::new("p2"))
        );
    }

    #[test]
    fn test_low_confidence_cluster_stays_unresolved() {
        let records = vec![PointRecord::new("p1", "AHU1_SAT")];
        let mut session = MappingSession::new("hq", schema(), records).unwrap();
        classify(&mut session, "p1", "supply_air_temperature_sensor", 0.2);

        let summary = RelationshipResolver::new().resolve(&mut session).unwrap();
        assert_eq!(summary.equipment, 0);
        match &session.unresolved()[0].reason {
            UnresolvedReason::BelowThreshold { best_type, confidence } => {
                assert_eq!(best_type.as_deref(), Some("AHU"));
                assert!(*confidence < 0.5);
            }
            other => panic!("unexpected reason {:?}", other),
        }
    }

    #[test]
    fn test_keyless_point_has_no_structural_match() {
        let records = vec![PointRecord::new("p1", "Spare Value")];
        let mut session = MappingSession::new("hq", schema(), records).unwrap();
        classify(&mut session, "p1", "zone_air_temperature_sensor", 0.95);

        RelationshipResolver::new().resolve(&mut session).unwrap();
        assert!(session.instances().is_empty());
        assert_eq!(
            session.unresolved()[0].reason,
            UnresolvedReason::NoStructuralMatch
        );
    }

    #[test]
    fn test_competing_points_tie_break_on_ingest_order() {
        let records = vec![
            PointRecord::new("p1", "AHU1_SAT"),
            PointRecord::new("p2", "AHU1_SAT2"),
        ];
        let mut session = MappingSession::new("hq", schema(), records).unwrap();
        classify(&mut session, "p1", "supply_air_temperature_sensor", 0.9);
        classify(&mut session, "p2", "supply_air_temperature_sensor", 0.9);

        RelationshipResolver::new().resolve(&mut session).unwrap();
        let ahu = session.instance(&EquipmentId::new("AHU-1")).unwrap();
        assert_eq!(
            ahu.point_for("supply_air_temperature_sensor"),
            Some(&PointId::new("p1"))
        );
        assert_eq!(
            session.unresolved()[0].reason,
            UnresolvedReason::NoFieldAvailable {
                equipment: EquipmentId::new("AHU-1")
            }
        );
    }

    #[test]
    fn test_other_role_never_fills_field() {
        let records = vec![
            PointRecord::new("p1", "AHU1_SAT").with_units("°F"),
            PointRecord::new("p2", "AHU1_DAT").with_units("°F"),
        ];
        let mut session = MappingSession::new("hq", schema(), records).unwrap();
        classify(&mut session, "p1", "supply_air_temperature_sensor", 0.9);
        classify(&mut session, "p2", "discharge_air_temperature_sensor", 0.9);

        let resolver = RelationshipResolver::new();
        assert_eq!(
            resolver.field_match(
                session.candidates(&PointId::new("p2")),
                "return_air_temperature_sensor"
            ),
            0.0
        );

        resolver.resolve(&mut session).unwrap();
        let ahu = session.instance(&EquipmentId::new("AHU-1")).unwrap();
        assert_eq!(ahu.fields.len(), 1);
        assert_eq!(ahu.point_for("return_air_temperature_sensor"), None);
        assert_eq!(
            session.unresolved()[0].reason,
            UnresolvedReason::NoFieldAvailable {
                equipment: EquipmentId::new("AHU-1")
            }
        );
    }

    #[test]
    fn test_partial_hint_fills_matching_role() {
        let id = PointId::new("p1");
        let candidates = vec![
            Candidate::new(id.clone(), "zone_temperature_sensor", 0.8),
            Candidate::new(id, ontomap_core::UNKNOWN_TYPE, 0.2),
        ];
        let score = RelationshipResolver::new().field_match(&candidates, "zone_air_temperature_sensor");
        assert!((score - 0.8 * 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_naming_tag_breaks_saturated_tie() {
        let schema = Arc::new(
            OntologySchema::new("test", "1")
                .with_point_type(
                    PointTypeDef::new("zone_air_temperature_sensor")
                        .with_data_type(DataType::Numeric)
                        .with_unit_category(UnitCategory::Temperature),
                )
                .with_equipment_type(
                    EquipmentTypeDef::new("VAV").with_required(&["zone_air_temperature_sensor"]),
                )
                .with_equipment_type(
                    EquipmentTypeDef::new("FCU").with_required(&["zone_air_temperature_sensor"]),
                ),
        );
        let records = vec![PointRecord::new("p1", "FCU1_ZNT")];
        let mut session = MappingSession::new("hq", schema, records).unwrap();
        classify(&mut session, "p1", "zone_air_temperature_sensor", 1.0);

        RelationshipResolver::new().resolve(&mut session).unwrap();
        let fcu = session.instance(&EquipmentId::new("FCU-1")).unwrap();
        assert_eq!(fcu.equipment_type, "FCU");
        assert_eq!(fcu.confidence, 1.0);
    }

    #[test]
    fn test_state_labels_block_numeric_field() {
        let records = vec![
            PointRecord::new("p1", "AHU1_SAT").with_enum_range(vec!["Off".into(), "On".into()]),
        ];
        let mut session = MappingSession::new("hq", schema(), records).unwrap();
        classify(&mut session, "p1", "supply_air_temperature_sensor", 0.9);

        RelationshipResolver::new().resolve(&mut session).unwrap();
        assert!(session.claimed_by(&PointId::new("p1")).is_none());
        assert!(matches!(
            session.unresolved()[0].reason,
            UnresolvedReason::NoFieldAvailable { .. }
        ));
    }

    #[test]
    fn test_unit_disagreement_blocks_binding() {
        let records = vec![
            PointRecord::new("p1", "AHU1_SAT").with_units("psi"),
            PointRecord::new("p2", "AHU1_RAT").with_units("°F"),
        ];
        let mut session = MappingSession::new("hq", schema(), records).unwrap();
        classify(&mut session, "p1", "supply_air_temperature_sensor", 0.9);
        classify(&mut session, "p2", "return_air_temperature_sensor", 0.9);

        RelationshipResolver::new().resolve(&mut session).unwrap();
        assert!(session.claimed_by(&PointId::new("p1")).is_none());
        assert!(session.claimed_by(&PointId::new("p2")).is_some());
    }

    #[test]
    fn test_parent_and_location_edges() {
        let records = vec![
            PointRecord::new("p1", "AHU1_SAT"),
            PointRecord::new("p2", "VAV3_ZNT")
                .with_device_path("/Drivers/AHU1/VAV3")
                .with_location("Floor 2"),
        ];
        let mut session = MappingSession::new("hq", schema(), records).unwrap();
        classify(&mut session, "p1", "supply_air_temperature_sensor", 0.9);
        classify(&mut session, "p2", "zone_air_temperature_sensor", 0.9);

        let summary = RelationshipResolver::new().resolve(&mut session).unwrap();
        assert_eq!(summary.edges, 2);
        let edges = session.edges();
        assert_eq!(edges[0].kind, "feeds");
        assert_eq!(edges[0].source, EquipmentId::new("AHU-1"));
        assert_eq!(
            edges[0].target,
            EdgeEndpoint::Equipment(EquipmentId::new("AHU-1/VAV-3"))
        );
        assert_eq!(edges[1].kind, "located_in");
        assert_eq!(edges[1].target, EdgeEndpoint::Location("Floor 2".into()));
    }

    #[test]
    fn test_forbidden_kind_is_suppressed() {
        let records = vec![
            PointRecord::new("p1", "VAV1_ZNT"),
            PointRecord::new("p2", "AHU1_SAT").with_device_path("/Drivers/VAV1/AHU1"),
        ];
        let mut session = MappingSession::new("hq", schema(), records).unwrap();
        classify(&mut session, "p1", "zone_air_temperature_sensor", 0.9);
        classify(&mut session, "p2", "supply_air_temperature_sensor", 0.9);

        let summary = RelationshipResolver::new().resolve(&mut session).unwrap();
        assert_eq!(summary.equipment, 2);
        assert_eq!(summary.edges, 0);
        assert_eq!(summary.suppressed_edges, 1);
    }

    #[test]
    fn test_resolve_is_repeatable() {
        let records = vec![
            PointRecord::new("p1", "AHU1_SAT"),
            PointRecord::new("p2", "AHU1_RAT"),
        ];
        let mut session = MappingSession::new("hq", schema(), records).unwrap();
        classify(&mut session, "p1", "supply_air_temperature_sensor", 0.9);
        classify(&mut session, "p2", "return_air_temperature_sensor", 0.9);

        let resolver = RelationshipResolver::new();
        let first = resolver.resolve(&mut session).unwrap();
        let instances = session.instances().to_vec();
        let second = resolver.resolve(&mut session).unwrap();
        assert_eq!(first, second);
        assert_eq!(instances, session.instances());
    }
}

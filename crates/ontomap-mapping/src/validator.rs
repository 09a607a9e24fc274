//! Ontology validation.
//!
//! Checks a working set against the schema and reports every violation in
//! one pass: unknown types, missing required fields, duplicate point claims,
//! edges not permitted between their endpoint types, and points whose data
//! type or units disagree with the field they fill. Validation never stops
//! at the first failure.

use std::collections::HashMap;
use std::sync::Arc;

use ontomap_core::{OntologySchema, PointId, PointRecord, UnitCategory, LOCATION_ENDPOINT};

use crate::equipment::{EdgeEndpoint, EquipmentId, EquipmentInstance, RelationshipEdge};
use crate::lexicon;
use crate::report::{
    ReportSummary, RuleId, Subject, UnresolvedPoint, UnresolvedReason, ValidationReport, Violation,
};
use crate::session::MappingSession;

/// Borrowed view of a working set.
#[derive(Debug, Clone, Copy)]
pub struct ValidationInput<'a> {
    pub records: &'a [PointRecord],
    pub instances: &'a [EquipmentInstance],
    pub edges: &'a [RelationshipEdge],
}

/// Checks working sets against an ontology schema.
#[derive(Debug, Clone)]
pub struct OntologyValidator {
    schema: Arc<OntologySchema>,
}

impl OntologyValidator {
    pub fn new(schema: Arc<OntologySchema>) -> Self {
        Self { schema }
    }

    /// All rule violations in the input, in instance then edge order.
    pub fn check(&self, input: &ValidationInput<'_>) -> Vec<Violation> {
        let records: HashMap<&PointId, &PointRecord> =
            input.records.iter().map(|r| (&r.id, r)).collect();
        let mut violations = Vec::new();
        let mut claims: HashMap<&PointId, (&EquipmentId, &str)> = HashMap::new();

        for instance in input.instances {
            self.check_instance(instance, &records, &mut violations);

            for (field, assignment) in &instance.fields {
                let point = &assignment.point_id;
                match claims.get(point) {
                    Some((owner, owner_field)) => violations.push(Violation::new(
                        RuleId::DuplicatePointClaim,
                        Subject::Point { id: point.clone() },
                        format!(
                            "point bound to {}.{} and {}.{}",
                            owner, owner_field, instance.id, field
                        ),
                    )),
                    None => {
                        claims.insert(point, (&instance.id, field.as_str()));
                    }
                }
            }
        }

        let types: HashMap<&EquipmentId, &str> = input
            .instances
            .iter()
            .map(|e| (&e.id, e.equipment_type.as_str()))
            .collect();
        for edge in input.edges {
            self.check_edge(edge, &types, &mut violations);
        }

        violations
    }

    fn check_instance(
        &self,
        instance: &EquipmentInstance,
        records: &HashMap<&PointId, &PointRecord>,
        violations: &mut Vec<Violation>,
    ) {
        let Some(def) = self.schema.equipment_type(&instance.equipment_type) else {
            violations.push(Violation::new(
                RuleId::UnknownEquipmentType,
                Subject::Equipment {
                    id: instance.id.clone(),
                },
                format!("equipment type '{}' is not defined", instance.equipment_type),
            ));
            return;
        };

        for missing in instance.missing_required(def) {
            violations.push(Violation::new(
                RuleId::MissingRequiredField,
                Subject::Field {
                    equipment: instance.id.clone(),
                    field: missing.to_string(),
                },
                format!("required field '{}' is not assigned", missing),
            ));
        }

        for (field, assignment) in &instance.fields {
            let subject = || Subject::Field {
                equipment: instance.id.clone(),
                field: field.clone(),
            };
            if !def.has_field(field) {
                violations.push(Violation::new(
                    RuleId::UndeclaredField,
                    subject(),
                    format!("'{}' is not a field of {}", field, def.name),
                ));
                continue;
            }
            let Some(record) = records.get(&assignment.point_id) else {
                violations.push(Violation::new(
                    RuleId::UnknownPoint,
                    subject(),
                    format!("point '{}' is not in the session", assignment.point_id),
                ));
                continue;
            };
            let Some(point_type) = self.schema.point_type(field) else {
                continue;
            };

            if let Some(expected) = point_type.data_type {
                let actual = record.effective_data_type();
                if !actual.is_compatible_with(expected) {
                    violations.push(Violation::new(
                        RuleId::DataTypeMismatch,
                        subject(),
                        format!(
                            "point '{}' is {} but the field expects {}",
                            record.id,
                            actual.as_str(),
                            expected.as_str()
                        ),
                    ));
                }
            }

            if let Some(expected) = point_type.unit_category {
                let actual = record
                    .effective_units()
                    .map(lexicon::unit_category)
                    .unwrap_or(UnitCategory::Unknown);
                if expected != UnitCategory::Unknown
                    && actual != UnitCategory::Unknown
                    && actual != expected
                {
                    violations.push(Violation::new(
                        RuleId::UnitMismatch,
                        subject(),
                        format!(
                            "point '{}' has {} units but the field expects {}",
                            record.id,
                            actual.as_str(),
                            expected.as_str()
                        ),
                    ));
                }
            }
        }
    }

    fn check_edge(
        &self,
        edge: &RelationshipEdge,
        types: &HashMap<&EquipmentId, &str>,
        violations: &mut Vec<Violation>,
    ) {
        let subject = || Subject::Edge { edge: edge.clone() };

        if self.schema.relationship_kind(&edge.kind).is_none() {
            violations.push(Violation::new(
                RuleId::UnknownRelationshipKind,
                subject(),
                format!("relationship kind '{}' is not defined", edge.kind),
            ));
            return;
        }

        let Some(source_type) = types.get(&edge.source) else {
            violations.push(Violation::new(
                RuleId::DanglingEdge,
                subject(),
                format!("source '{}' is not in the session", edge.source),
            ));
            return;
        };
        let target_type = match &edge.target {
            EdgeEndpoint::Location(_) => LOCATION_ENDPOINT,
            EdgeEndpoint::Equipment(target) => match types.get(target) {
                Some(t) => *t,
                None => {
                    violations.push(Violation::new(
                        RuleId::DanglingEdge,
                        subject(),
                        format!("target '{}' is not in the session", target),
                    ));
                    return;
                }
            },
        };

        if !self.schema.permits(&edge.kind, source_type, target_type) {
            violations.push(Violation::new(
                RuleId::RelationshipNotPermitted,
                subject(),
                format!(
                    "'{}' is not permitted from {} to {}",
                    edge.kind, source_type, target_type
                ),
            ));
        }
    }

    /// Build the report for a session's current working set.
    ///
    /// Points that are neither bound nor already marked unresolved are
    /// listed as unresolved so that every point is accounted for.
    pub fn validate(&self, session: &MappingSession) -> ValidationReport {
        let input = ValidationInput {
            records: session.records(),
            instances: session.instances(),
            edges: session.edges(),
        };
        let violations = self.check(&input);

        let mut unresolved: Vec<UnresolvedPoint> = session.unresolved().to_vec();
        for record in session.records() {
            let accounted = session.claimed_by(&record.id).is_some()
                || unresolved.iter().any(|u| u.point_id == record.id);
            if !accounted {
                let top_is_unknown = session
                    .candidates(&record.id)
                    .first()
                    .map(|c| c.is_unknown())
                    .unwrap_or(true);
                unresolved.push(UnresolvedPoint {
                    point_id: record.id.clone(),
                    reason: if top_is_unknown {
                        UnresolvedReason::UnknownType
                    } else {
                        UnresolvedReason::NoStructuralMatch
                    },
                });
            }
        }
        unresolved.sort_by_key(|u| session.position(&u.point_id).unwrap_or(usize::MAX));

        let resolved_equipment = session
            .instances()
            .iter()
            .filter(|e| {
                self.schema
                    .equipment_type(&e.equipment_type)
                    .map(|def| e.is_resolved(def))
                    .unwrap_or(false)
            })
            .count();
        let summary = ReportSummary {
            points: session.records().len(),
            bound_points: session.instances().iter().map(|e| e.fields.len()).sum(),
            equipment: session.instances().len(),
            resolved_equipment,
            edges: session.edges().len(),
            unresolved: unresolved.len(),
            violations: violations.len(),
            diagnostics: session.diagnostics().len(),
        };

        tracing::debug!(
            category = "validator",
            site = %session.site(),
            violations = summary.violations,
            unresolved = summary.unresolved,
            "Validated working set"
        );

        ValidationReport {
            site: session.site().to_string(),
            schema_version: self.schema.version.clone(),
            violations,
            unresolved,
            diagnostics: session.diagnostics().to_vec(),
            summary,
        }
    }
}

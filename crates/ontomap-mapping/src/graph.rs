//! Semantic graph exported from a validated session.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use ontomap_core::PointId;

use crate::equipment::{EdgeEndpoint, EquipmentId, RelationshipEdge};
use crate::report::ValidationReport;
use crate::session::MappingSession;

/// A point bound to an equipment field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointBinding {
    pub point_id: PointId,
    pub point_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    pub confidence: f64,
}

/// Equipment node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentNode {
    pub id: EquipmentId,
    pub equipment_type: String,
    pub confidence: f64,
    /// All required fields are filled
    pub resolved: bool,
    pub fields: BTreeMap<String, PointBinding>,
}

/// Site/floor/room node referenced by edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationNode {
    pub id: String,
}

/// Typed graph of equipment, locations and relationships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticGraph {
    pub site: String,
    pub schema: String,
    pub schema_version: String,
    pub equipment: Vec<EquipmentNode>,
    pub locations: Vec<LocationNode>,
    pub edges: Vec<RelationshipEdge>,
    /// Whether validation found no violations
    pub valid: bool,
}

impl SemanticGraph {
    pub(crate) fn build(session: &MappingSession, report: &ValidationReport) -> Self {
        let schema = session.schema();

        let equipment = session
            .instances()
            .iter()
            .map(|instance| {
                let resolved = schema
                    .equipment_type(&instance.equipment_type)
                    .map(|def| instance.is_resolved(def))
                    .unwrap_or(false);
                let fields = instance
                    .fields
                    .iter()
                    .map(|(field, assignment)| {
                        let record = session.record(&assignment.point_id);
                        let binding = PointBinding {
                            point_id: assignment.point_id.clone(),
                            point_name: record.map(|r| r.name.clone()).unwrap_or_default(),
                            units: record.and_then(|r| r.effective_units()).map(str::to_string),
                            confidence: assignment.confidence,
                        };
                        (field.clone(), binding)
                    })
                    .collect();
                EquipmentNode {
                    id: instance.id.clone(),
                    equipment_type: instance.equipment_type.clone(),
                    confidence: instance.confidence,
                    resolved,
                    fields,
                }
            })
            .collect();

        let locations: BTreeSet<&str> = session
            .edges()
            .iter()
            .filter_map(|e| match &e.target {
                EdgeEndpoint::Location(name) => Some(name.as_str()),
                EdgeEndpoint::Equipment(_) => None,
            })
            .collect();

        Self {
            site: session.site().to_string(),
            schema: schema.name.clone(),
            schema_version: schema.version.clone(),
            equipment,
            locations: locations
                .into_iter()
                .map(|id| LocationNode { id: id.to_string() })
                .collect(),
            edges: session.edges().to_vec(),
            valid: report.is_valid(),
        }
    }

    pub fn node(&self, id: &EquipmentId) -> Option<&EquipmentNode> {
        self.equipment.iter().find(|n| &n.id == id)
    }

    /// Edges leaving an equipment node.
    pub fn edges_from<'a>(&'a self, id: &'a EquipmentId) -> impl Iterator<Item = &'a RelationshipEdge> + 'a {
        self.edges.iter().filter(move |e| &e.source == id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

//! Equipment instances and the relationships between them.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use ontomap_core::{EquipmentTypeDef, PointId};

/// Session-scoped equipment identifier, derived from the structural key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EquipmentId(String);

impl EquipmentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EquipmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EquipmentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EquipmentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A point bound to an equipment field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAssignment {
    pub point_id: PointId,
    /// Match score that won the field
    pub confidence: f64,
}

/// Hypothesised physical equipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentInstance {
    pub id: EquipmentId,
    /// Schema equipment type
    pub equipment_type: String,
    /// Aggregate hypothesis confidence
    pub confidence: f64,
    /// Site/floor/room hint shared by its points
    #[serde(default)]
    pub location: Option<String>,
    /// Field name → bound point
    #[serde(default)]
    pub fields: BTreeMap<String, FieldAssignment>,
}

impl EquipmentInstance {
    pub fn new(id: impl Into<EquipmentId>, equipment_type: impl Into<String>, confidence: f64) -> Self {
        Self {
            id: id.into(),
            equipment_type: equipment_type.into(),
            confidence,
            location: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Point bound to `field`, if any.
    pub fn point_for(&self, field: &str) -> Option<&PointId> {
        self.fields.get(field).map(|a| &a.point_id)
    }

    pub fn point_ids(&self) -> impl Iterator<Item = &PointId> {
        self.fields.values().map(|a| &a.point_id)
    }

    /// Required fields of `def` left empty.
    pub fn missing_required<'a>(&self, def: &'a EquipmentTypeDef) -> Vec<&'a str> {
        def.required_fields
            .iter()
            .filter(|f| !self.fields.contains_key(f.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Every required field of `def` is filled.
    pub fn is_resolved(&self, def: &EquipmentTypeDef) -> bool {
        self.missing_required(def).is_empty()
    }
}

/// Target of a relationship edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EdgeEndpoint {
    Equipment(EquipmentId),
    Location(String),
}

impl fmt::Display for EdgeEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EdgeEndpoint::Equipment(id) => write!(f, "{}", id),
            EdgeEndpoint::Location(name) => write!(f, "location:{}", name),
        }
    }
}

/// Typed, directed edge from an equipment instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipEdge {
    /// Schema relationship kind
    pub kind: String,
    pub source: EquipmentId,
    pub target: EdgeEndpoint,
}

impl RelationshipEdge {
    pub fn between(kind: impl Into<String>, source: EquipmentId, target: EquipmentId) -> Self {
        Self {
            kind: kind.into(),
            source,
            target: EdgeEndpoint::Equipment(target),
        }
    }

    pub fn to_location(kind: impl Into<String>, source: EquipmentId, location: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            source,
            target: EdgeEndpoint::Location(location.into()),
        }
    }
}

impl fmt::Display for RelationshipEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.source, self.kind, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required() {
        let def = EquipmentTypeDef::new("AHU")
            .with_required(&["supply_air_temperature_sensor", "supply_fan_run_command"]);
        let mut ahu = EquipmentInstance::new("AHU-1", "AHU", 0.9);
        ahu.fields.insert(
            "supply_fan_run_command".to_string(),
            FieldAssignment {
                point_id: PointId::new("p3"),
                confidence: 0.8,
            },
        );

        assert_eq!(ahu.missing_required(&def), vec!["supply_air_temperature_sensor"]);
        assert!(!ahu.is_resolved(&def));
        assert_eq!(ahu.point_for("supply_fan_run_command"), Some(&PointId::new("p3")));
    }

    #[test]
    fn test_edge_serialization_shape() {
        let edge = RelationshipEdge::to_location("located_in", EquipmentId::new("AHU-1"), "Floor 2");
        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["target"]["kind"], "location");
        assert_eq!(json["target"]["id"], "Floor 2");
        assert_eq!(edge.to_string(), "AHU-1 -[located_in]-> location:Floor 2");
    }
}

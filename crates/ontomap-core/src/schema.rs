//! Digital Buildings Ontology schema boundary.
//!
//! The schema is an externally supplied, versioned vocabulary: point types
//! (the standard field names a point can fill), equipment types with their
//! required and optional fields, and relationship kinds with the endpoint
//! type pairs they allow. It is read-only for the lifetime of a session.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::point::{DataType, UnitCategory};
use crate::{Error, Result};

/// Endpoint type name matching any equipment type.
pub const WILDCARD_ENDPOINT: &str = "*";

/// Endpoint type name denoting a site/location node.
pub const LOCATION_ENDPOINT: &str = "location";

/// A standard point field (e.g. `supply_air_temperature_sensor`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointTypeDef {
    pub name: String,
    /// Expected physical data type, if constrained
    #[serde(default)]
    pub data_type: Option<DataType>,
    /// Expected measurement category, if constrained
    #[serde(default)]
    pub unit_category: Option<UnitCategory>,
}

impl PointTypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
            unit_category: None,
        }
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn with_unit_category(mut self, category: UnitCategory) -> Self {
        self.unit_category = Some(category);
        self
    }

    /// How narrowly this field constrains the points that may fill it.
    pub fn specificity(&self) -> u8 {
        let base = match self.data_type {
            None | Some(DataType::Unknown) => 0,
            Some(DataType::Boolean) => 1,
            Some(DataType::Enumerated) | Some(DataType::Numeric) => 2,
        };
        let unit = match self.unit_category {
            None | Some(UnitCategory::Unknown) => 0,
            Some(_) => 1,
        };
        base + unit
    }
}

/// An equipment type (e.g. `AHU`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentTypeDef {
    pub name: String,
    /// Naming tags that suggest this type (e.g. "ahu", "rtu")
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub optional_fields: Vec<String>,
}

impl EquipmentTypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            required_fields: Vec::new(),
            optional_fields: Vec::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_required(mut self, fields: &[&str]) -> Self {
        self.required_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_optional(mut self, fields: &[&str]) -> Self {
        self.optional_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// All fields in declaration order, required first.
    pub fn fields(&self) -> impl Iterator<Item = (&str, bool)> {
        self.required_fields
            .iter()
            .map(|f| (f.as_str(), true))
            .chain(self.optional_fields.iter().map(|f| (f.as_str(), false)))
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields().any(|(f, _)| f == field)
    }

    /// Whether a naming tag (case-insensitive) matches the type name or an alias.
    pub fn matches_tag(&self, tag: &str) -> bool {
        self.name.eq_ignore_ascii_case(tag) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(tag))
    }
}

/// One legal (source type, target type) pair for a relationship kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointPair {
    pub source: String,
    pub target: String,
}

impl EndpointPair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    fn allows(&self, source: &str, target: &str) -> bool {
        endpoint_matches(&self.source, source) && endpoint_matches(&self.target, target)
    }
}

fn endpoint_matches(declared: &str, actual: &str) -> bool {
    if declared == WILDCARD_ENDPOINT {
        // The wildcard stands for equipment, never for location nodes.
        return actual != LOCATION_ENDPOINT;
    }
    declared == actual
}

/// A relationship kind (e.g. `feeds`, `controls`, `located_in`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipKindDef {
    pub name: String,
    #[serde(default)]
    pub endpoints: Vec<EndpointPair>,
}

impl RelationshipKindDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoints: Vec::new(),
        }
    }

    pub fn with_endpoint(mut self, source: &str, target: &str) -> Self {
        self.endpoints.push(EndpointPair::new(source, target));
        self
    }

    pub fn allows(&self, source: &str, target: &str) -> bool {
        self.endpoints.iter().any(|e| e.allows(source, target))
    }
}

/// A dangling or duplicate reference found by [`OntologySchema::check`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaIssue {
    /// Definition containing the problem
    pub owner: String,
    pub message: String,
}

/// Versioned ontology schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OntologySchema {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub point_types: Vec<PointTypeDef>,
    #[serde(default)]
    pub equipment_types: Vec<EquipmentTypeDef>,
    #[serde(default)]
    pub relationship_kinds: Vec<RelationshipKindDef>,
}

impl OntologySchema {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            point_types: Vec::new(),
            equipment_types: Vec::new(),
            relationship_kinds: Vec::new(),
        }
    }

    pub fn with_point_type(mut self, def: PointTypeDef) -> Self {
        self.point_types.push(def);
        self
    }

    pub fn with_equipment_type(mut self, def: EquipmentTypeDef) -> Self {
        self.equipment_types.push(def);
        self
    }

    pub fn with_relationship_kind(mut self, def: RelationshipKindDef) -> Self {
        self.relationship_kinds.push(def);
        self
    }

    /// Parse a schema from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a schema from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&raw)
    }

    /// Load and reject schemas with dangling references.
    pub fn load_checked<P: AsRef<Path>>(path: P) -> Result<Self> {
        let schema = Self::load(path)?;
        let issues = schema.check();
        if let Some(first) = issues.first() {
            return Err(Error::schema(format!(
                "{} issue(s), first in '{}': {}",
                issues.len(),
                first.owner,
                first.message
            )));
        }
        Ok(schema)
    }

    pub fn point_type(&self, name: &str) -> Option<&PointTypeDef> {
        self.point_types.iter().find(|p| p.name == name)
    }

    pub fn equipment_type(&self, name: &str) -> Option<&EquipmentTypeDef> {
        self.equipment_types.iter().find(|e| e.name == name)
    }

    pub fn relationship_kind(&self, name: &str) -> Option<&RelationshipKindDef> {
        self.relationship_kinds.iter().find(|r| r.name == name)
    }

    /// Classifier vocabulary: point type names in declaration order.
    pub fn point_type_names(&self) -> Vec<String> {
        self.point_types.iter().map(|p| p.name.clone()).collect()
    }

    /// Whether `kind` may connect an endpoint of type `source` to one of type `target`.
    pub fn permits(&self, kind: &str, source: &str, target: &str) -> bool {
        self.relationship_kind(kind)
            .map(|r| r.allows(source, target))
            .unwrap_or(false)
    }

    /// Relationship kinds allowed between two endpoint types, in declaration order.
    pub fn kinds_between<'a>(
        &'a self,
        source: &'a str,
        target: &'a str,
    ) -> impl Iterator<Item = &'a RelationshipKindDef> + 'a {
        self.relationship_kinds
            .iter()
            .filter(move |r| r.allows(source, target))
    }

    /// Report dangling references and duplicate definitions.
    pub fn check(&self) -> Vec<SchemaIssue> {
        let mut issues = Vec::new();

        let mut seen = HashSet::new();
        for point_type in &self.point_types {
            if !seen.insert(point_type.name.as_str()) {
                issues.push(SchemaIssue {
                    owner: point_type.name.clone(),
                    message: "duplicate point type".to_string(),
                });
            }
        }

        let mut seen_equipment = HashSet::new();
        for equipment in &self.equipment_types {
            if !seen_equipment.insert(equipment.name.as_str()) {
                issues.push(SchemaIssue {
                    owner: equipment.name.clone(),
                    message: "duplicate equipment type".to_string(),
                });
            }
            if equipment.name == LOCATION_ENDPOINT || equipment.name == WILDCARD_ENDPOINT {
                issues.push(SchemaIssue {
                    owner: equipment.name.clone(),
                    message: "equipment type uses a reserved endpoint name".to_string(),
                });
            }
            let mut fields = HashSet::new();
            for (field, _) in equipment.fields() {
                if !fields.insert(field) {
                    issues.push(SchemaIssue {
                        owner: equipment.name.clone(),
                        message: format!("field '{}' declared twice", field),
                    });
                }
                if self.point_type(field).is_none() {
                    issues.push(SchemaIssue {
                        owner: equipment.name.clone(),
                        message: format!("field '{}' is not a defined point type", field),
                    });
                }
            }
        }

        for kind in &self.relationship_kinds {
            for pair in &kind.endpoints {
                for endpoint in [&pair.source, &pair.target] {
                    let known = endpoint == WILDCARD_ENDPOINT
                        || endpoint == LOCATION_ENDPOINT
                        || self.equipment_type(endpoint).is_some();
                    if !known {
                        issues.push(SchemaIssue {
                            owner: kind.name.clone(),
                            message: format!("endpoint '{}' is not a defined equipment type", endpoint),
                        });
                    }
                }
            }
        }

        issues
    }
}

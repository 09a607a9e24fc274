//! Validation report and per-point outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

use ontomap_core::PointId;

use crate::equipment::{EquipmentId, RelationshipEdge};

/// Identifier of a validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleId {
    /// Instance type not declared in the schema
    UnknownEquipmentType,
    /// Required field left empty
    MissingRequiredField,
    /// Field not declared on the instance's type
    UndeclaredField,
    /// Assignment refers to a point outside the session
    UnknownPoint,
    /// Point bound to more than one field
    DuplicatePointClaim,
    /// Edge kind not declared in the schema
    UnknownRelationshipKind,
    /// Edge kind not permitted between its endpoint types
    RelationshipNotPermitted,
    /// Edge endpoint refers to a missing instance
    DanglingEdge,
    /// Point data type cannot fill the field
    DataTypeMismatch,
    /// Point unit category disagrees with the field
    UnitMismatch,
}

impl RuleId {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::UnknownEquipmentType => "unknown_equipment_type",
            RuleId::MissingRequiredField => "missing_required_field",
            RuleId::UndeclaredField => "undeclared_field",
            RuleId::UnknownPoint => "unknown_point",
            RuleId::DuplicatePointClaim => "duplicate_point_claim",
            RuleId::UnknownRelationshipKind => "unknown_relationship_kind",
            RuleId::RelationshipNotPermitted => "relationship_not_permitted",
            RuleId::DanglingEdge => "dangling_edge",
            RuleId::DataTypeMismatch => "data_type_mismatch",
            RuleId::UnitMismatch => "unit_mismatch",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a violation is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Subject {
    Equipment { id: EquipmentId },
    Field { equipment: EquipmentId, field: String },
    Point { id: PointId },
    Edge { edge: RelationshipEdge },
}

/// One rule failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub rule: RuleId,
    pub subject: Subject,
    pub message: String,
}

impl Violation {
    pub fn new(rule: RuleId, subject: Subject, message: impl Into<String>) -> Self {
        Self {
            rule,
            subject,
            message: message.into(),
        }
    }
}

/// Why a point ended without a field binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// Classifier produced no type hypothesis beyond `unknown`
    UnknownType,
    /// No naming key; the point alone supports no equipment hypothesis
    NoStructuralMatch,
    /// Best equipment hypothesis for its cluster fell below threshold
    BelowThreshold {
        best_type: Option<String>,
        confidence: f64,
    },
    /// Equipment was created but no free field matched the point
    NoFieldAvailable { equipment: EquipmentId },
}

/// A point left unbound after resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnresolvedPoint {
    pub point_id: PointId,
    #[serde(flatten)]
    pub reason: UnresolvedReason,
}

/// Degraded classification of one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    ModelUnavailable { message: String },
    ClassificationTimeout { timeout_ms: u64 },
    ModelError { message: String },
}

/// Per-point note recorded when classification fell back to the floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointDiagnostic {
    pub point_id: PointId,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

/// Summary counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub points: usize,
    pub bound_points: usize,
    pub equipment: usize,
    pub resolved_equipment: usize,
    pub edges: usize,
    pub unresolved: usize,
    pub violations: usize,
    pub diagnostics: usize,
}

/// Outcome of validating a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub site: String,
    pub schema_version: String,
    pub violations: Vec<Violation>,
    pub unresolved: Vec<UnresolvedPoint>,
    pub diagnostics: Vec<PointDiagnostic>,
    pub summary: ReportSummary,
}

impl ValidationReport {
    /// No rule failed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations_of(&self, rule: RuleId) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.rule == rule)
    }

    pub fn unresolved_reason(&self, point: &PointId) -> Option<&UnresolvedReason> {
        self.unresolved
            .iter()
            .find(|u| &u.point_id == point)
            .map(|u| &u.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_serialization_is_flat() {
        let unresolved = UnresolvedPoint {
            point_id: PointId::new("p9"),
            reason: UnresolvedReason::BelowThreshold {
                best_type: Some("AHU".into()),
                confidence: 0.2,
            },
        };
        let json = serde_json::to_value(&unresolved).unwrap();
        assert_eq!(json["point_id"], "p9");
        assert_eq!(json["reason"], "below_threshold");
        assert_eq!(json["best_type"], "AHU");
    }

    #[test]
    fn test_rule_filter() {
        let report = ValidationReport {
            site: "hq".into(),
            schema_version: "1".into(),
            violations: vec![
                Violation::new(
                    RuleId::MissingRequiredField,
                    Subject::Equipment {
                        id: EquipmentId::new("AHU-1"),
                    },
                    "missing",
                ),
                Violation::new(
                    RuleId::UnitMismatch,
                    Subject::Point {
                        id: PointId::new("p1"),
                    },
                    "unit",
                ),
            ],
            unresolved: Vec::new(),
            diagnostics: Vec::new(),
            summary: ReportSummary::default(),
        };
        assert!(!report.is_valid());
        assert_eq!(report.violations_of(RuleId::UnitMismatch).count(), 1);
    }
}

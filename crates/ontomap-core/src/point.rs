//! Building-automation point records.
//!
//! A [`PointRecord`] is one telemetry/control point as enumerated by the BAS
//! runtime. Records are immutable once they enter a mapping session.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable external identifier of a point.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointId(String);

impl PointId {
    /// Create a new point ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PointId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PointId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Physical data type of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Numeric,
    Boolean,
    Enumerated,
    #[default]
    #[serde(other)]
    Unknown,
}

impl DataType {
    /// All data type variants, in feature-encoding order.
    pub const ALL: &'static [DataType] = &[
        DataType::Unknown,
        DataType::Numeric,
        DataType::Boolean,
        DataType::Enumerated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Numeric => "numeric",
            DataType::Boolean => "boolean",
            DataType::Enumerated => "enumerated",
            DataType::Unknown => "unknown",
        }
    }

    /// Parse from a feature category label.
    pub fn from_label(label: &str) -> Self {
        match label {
            "numeric" => DataType::Numeric,
            "boolean" => DataType::Boolean,
            "enumerated" => DataType::Enumerated,
            _ => DataType::Unknown,
        }
    }

    /// Whether a point of this type can fill a field declaring `expected`.
    ///
    /// Unknown on either side is accepted; a boolean point may fill an
    /// enumerated field (two-state enum).
    pub fn is_compatible_with(&self, expected: DataType) -> bool {
        match (self, expected) {
            (DataType::Unknown, _) | (_, DataType::Unknown) => true,
            (DataType::Boolean, DataType::Enumerated) => true,
            (actual, expected) => *actual == expected,
        }
    }
}

/// Measurement category derived from engineering units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitCategory {
    Temperature,
    Pressure,
    Flowrate,
    Flowvolume,
    Power,
    Energy,
    Current,
    Voltage,
    Speed,
    Frequency,
    Percentage,
    Humidity,
    Concentration,
    #[default]
    #[serde(other)]
    Unknown,
}

impl UnitCategory {
    /// All categories, in feature-encoding order.
    pub const ALL: &'static [UnitCategory] = &[
        UnitCategory::Unknown,
        UnitCategory::Temperature,
        UnitCategory::Pressure,
        UnitCategory::Flowrate,
        UnitCategory::Flowvolume,
        UnitCategory::Power,
        UnitCategory::Energy,
        UnitCategory::Current,
        UnitCategory::Voltage,
        UnitCategory::Speed,
        UnitCategory::Frequency,
        UnitCategory::Percentage,
        UnitCategory::Humidity,
        UnitCategory::Concentration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitCategory::Temperature => "temperature",
            UnitCategory::Pressure => "pressure",
            UnitCategory::Flowrate => "flowrate",
            UnitCategory::Flowvolume => "flowvolume",
            UnitCategory::Power => "power",
            UnitCategory::Energy => "energy",
            UnitCategory::Current => "current",
            UnitCategory::Voltage => "voltage",
            UnitCategory::Speed => "speed",
            UnitCategory::Frequency => "frequency",
            UnitCategory::Percentage => "percentage",
            UnitCategory::Humidity => "humidity",
            UnitCategory::Concentration => "concentration",
            UnitCategory::Unknown => "unknown",
        }
    }

    /// Parse from a feature category label or measurement word.
    pub fn from_label(label: &str) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == label)
            .unwrap_or(UnitCategory::Unknown)
    }
}

/// A single historical sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Timestamp (unix millis)
    pub timestamp: i64,
    /// Sampled value (booleans as 0/1, enums as ordinal)
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// One BAS point as enumerated from the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    /// External identifier, stable across enumerations
    pub id: PointId,
    /// Display name (e.g. "AHU1_SAT")
    pub name: String,
    /// Free-text description
    #[serde(default)]
    pub description: Option<String>,
    /// Engineering units as reported by the runtime (e.g. "°F", "cfm")
    #[serde(default)]
    pub units: Option<String>,
    /// Physical data type
    #[serde(default)]
    pub data_type: DataType,
    /// Short sample-value history, oldest first
    #[serde(default)]
    pub history: Vec<Sample>,
    /// Container path in the BAS (e.g. "/Drivers/BacnetNetwork/AHU1")
    #[serde(default)]
    pub device_path: Option<String>,
    /// Site/floor/room hint
    #[serde(default)]
    pub location: Option<String>,
    /// State labels for boolean/enumerated points
    #[serde(default)]
    pub enum_range: Vec<String>,
    /// Display precision from facets
    #[serde(default)]
    pub precision: Option<u8>,
}

impl PointRecord {
    /// Create a bare record with only an identifier and a name.
    pub fn new(id: impl Into<PointId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            units: None,
            data_type: DataType::Unknown,
            history: Vec::new(),
            device_path: None,
            location: None,
            enum_range: Vec::new(),
            precision: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_history(mut self, history: Vec<Sample>) -> Self {
        self.history = history;
        self
    }

    pub fn with_device_path(mut self, path: impl Into<String>) -> Self {
        self.device_path = Some(path.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_enum_range(mut self, labels: Vec<String>) -> Self {
        self.enum_range = labels;
        self
    }

    /// Units with runtime placeholders ("", "null") treated as missing.
    pub fn effective_units(&self) -> Option<&str> {
        self.units
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty() && !u.eq_ignore_ascii_case("null"))
    }

    /// Declared data type, or one inferred from the state labels when the
    /// runtime did not report one: two labels read as boolean, more as
    /// enumerated.
    pub fn effective_data_type(&self) -> DataType {
        match (self.data_type, self.enum_range.len()) {
            (DataType::Unknown, 2) => DataType::Boolean,
            (DataType::Unknown, n) if n > 2 => DataType::Enumerated,
            (declared, _) => declared,
        }
    }

    /// Location with blank values treated as missing.
    pub fn effective_location(&self) -> Option<&str> {
        self.location.as_deref().map(str::trim).filter(|l| !l.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_units_are_missing() {
        let point = PointRecord::new("p1", "AHU1_SAT").with_units("null");
        assert_eq!(point.effective_units(), None);

        let point = PointRecord::new("p1", "AHU1_SAT").with_units(" °F ");
        assert_eq!(point.effective_units(), Some("°F"));
    }

    #[test]
    fn test_state_labels_imply_data_type() {
        let labels = |n: usize| (0..n).map(|i| format!("s{}", i)).collect::<Vec<_>>();

        let point = PointRecord::new("p1", "AHU1_SF").with_enum_range(labels(2));
        assert_eq!(point.effective_data_type(), DataType::Boolean);

        let point = PointRecord::new("p1", "AHU1_Mode").with_enum_range(labels(4));
        assert_eq!(point.effective_data_type(), DataType::Enumerated);

        let point = PointRecord::new("p1", "AHU1_SF")
            .with_data_type(DataType::Numeric)
            .with_enum_range(labels(2));
        assert_eq!(point.effective_data_type(), DataType::Numeric);

        assert_eq!(PointRecord::new("p1", "X").effective_data_type(), DataType::Unknown);
    }

    #[test]
    fn test_sparse_record_deserializes() {
        let point: PointRecord = serde_json::from_str(r#"{"id":"p9","name":"X"}"#).unwrap();
        assert_eq!(point.data_type, DataType::Unknown);
        assert!(point.history.is_empty());
        assert!(point.units.is_none());
    }

    #[test]
    fn test_unrecognised_data_type_is_unknown() {
        let point: PointRecord =
            serde_json::from_str(r#"{"id":"p9","name":"X","data_type":"string"}"#).unwrap();
        assert_eq!(point.data_type, DataType::Unknown);
    }

    #[test]
    fn test_data_type_compatibility() {
        assert!(DataType::Boolean.is_compatible_with(DataType::Enumerated));
        assert!(DataType::Unknown.is_compatible_with(DataType::Numeric));
        assert!(!DataType::Numeric.is_compatible_with(DataType::Boolean));
    }

    #[test]
    fn test_unrecognised_unit_label() {
        assert_eq!(UnitCategory::from_label("furlongs"), UnitCategory::Unknown);
    }
}

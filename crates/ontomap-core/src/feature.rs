//! Fixed-shape feature vectors.
//!
//! Every point yields exactly [`FEATURE_COUNT`] values in the order given by
//! [`FEATURE_NAMES`]. Missing inputs are encoded as [`FeatureValue::Unknown`],
//! never by shortening the vector.

use serde::{Deserialize, Serialize};

use crate::point::{DataType, PointId, UnitCategory};

/// Feature schema, in vector order.
pub const FEATURE_NAMES: &[&str] = &[
    // Shape of the name
    "name_length",
    "token_count",
    // Categorical
    "unit_category",
    "data_type",
    // Measurement keywords
    "has_temperature",
    "has_pressure",
    "has_flow",
    "has_humidity",
    "has_co2",
    "has_power",
    "has_speed",
    // Components
    "has_fan",
    "has_pump",
    "has_damper",
    "has_valve",
    "has_coil",
    // Point roles
    "has_setpoint",
    "has_sensor",
    "has_command",
    "has_status",
    "has_alarm",
    "has_mode",
    "has_enable",
    // Position / medium descriptors
    "is_supply",
    "is_return",
    "is_mixed",
    "is_outside",
    "is_zone",
    "is_exhaust",
    "is_chilled_water",
    "is_hot_water",
    // Sample history summary
    "has_history",
    "history_min",
    "history_max",
    "history_mean",
    "history_std_dev",
    "history_binary",
];

/// Number of features in every vector.
pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// Position of a feature in the schema.
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|n| *n == name)
}

/// One feature value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FeatureValue {
    /// Binary indicator
    Flag(bool),
    /// Numeric measurement
    Number(f64),
    /// Categorical label
    Category(String),
    /// Attribute missing from the source record
    Unknown,
}

impl FeatureValue {
    pub fn is_unknown(&self) -> bool {
        matches!(self, FeatureValue::Unknown)
    }

    pub fn as_flag(&self) -> bool {
        matches!(self, FeatureValue::Flag(true))
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_category(&self) -> Option<&str> {
        match self {
            FeatureValue::Category(c) => Some(c),
            _ => None,
        }
    }
}

/// Feature vector for one point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Point the features were derived from
    pub point_id: PointId,
    /// Normalised, abbreviation-expanded name fragments
    pub tokens: Vec<String>,
    /// Values in [`FEATURE_NAMES`] order
    pub values: Vec<FeatureValue>,
}

impl FeatureVector {
    /// Create a vector with every feature unknown.
    pub fn unknown(point_id: PointId) -> Self {
        Self {
            point_id,
            tokens: Vec::new(),
            values: vec![FeatureValue::Unknown; FEATURE_COUNT],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up a feature by name.
    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        feature_index(name).and_then(|i| self.values.get(i))
    }

    /// Set a feature by name. Unknown names are ignored.
    pub fn set(&mut self, name: &str, value: FeatureValue) {
        if let Some(slot) = feature_index(name).and_then(|i| self.values.get_mut(i)) {
            *slot = value;
        }
    }

    pub fn flag(&self, name: &str) -> bool {
        self.get(name).map(FeatureValue::as_flag).unwrap_or(false)
    }

    pub fn unit_category(&self) -> UnitCategory {
        self.get("unit_category")
            .and_then(FeatureValue::as_category)
            .map(UnitCategory::from_label)
            .unwrap_or_default()
    }

    pub fn data_type(&self) -> DataType {
        self.get("data_type")
            .and_then(FeatureValue::as_category)
            .map(DataType::from_label)
            .unwrap_or_default()
    }

    /// Numeric projection used by distance-based models.
    ///
    /// Flags map to 0/1, unknowns to 0, and categories to their ordinal in
    /// the category vocabulary scaled into [0, 1].
    pub fn to_numeric(&self) -> Vec<f64> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, value)| match value {
                FeatureValue::Flag(b) => f64::from(u8::from(*b)),
                FeatureValue::Number(n) if n.is_finite() => *n,
                FeatureValue::Number(_) | FeatureValue::Unknown => 0.0,
                FeatureValue::Category(label) => category_ordinal(FEATURE_NAMES[i], label),
            })
            .collect()
    }
}

fn category_ordinal(feature: &str, label: &str) -> f64 {
    let (position, len) = match feature {
        "unit_category" => (
            UnitCategory::ALL
                .iter()
                .position(|c| c.as_str() == label)
                .unwrap_or(0),
            UnitCategory::ALL.len(),
        ),
        "data_type" => (
            DataType::ALL
                .iter()
                .position(|d| d.as_str() == label)
                .unwrap_or(0),
            DataType::ALL.len(),
        ),
        _ => (0, 1),
    };
    position as f64 / len.max(1) as f64
}

//! Test scenario builder
//!
//! Pairs point records with the stub probabilities they should classify
//! with, so a test gets both the ingest set and a matching model.

use ontomap_core::{DataType, OntologySchema, PointRecord};

use crate::history::{DataPattern, HistoryGenerator};
use crate::model::StubModel;

/// Point set plus stub scores.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub records: Vec<PointRecord>,
    pub scores: Vec<(String, Vec<(String, f64)>)>,
}

impl Scenario {
    /// Stub model over the schema's point types loaded with this scenario's scores.
    pub fn model(&self, schema: &OntologySchema) -> StubModel {
        let mut model = StubModel::for_schema(schema);
        for (point, scores) in &self.scores {
            let pairs: Vec<(&str, f64)> = scores.iter().map(|(c, s)| (c.as_str(), *s)).collect();
            model.insert(point.clone(), &pairs);
        }
        model
    }

    /// `AHU1_SAT`, `AHU1_RAT` and `AHU1_Cmd`, each confidently classified.
    pub fn air_handler() -> Self {
        let history = HistoryGenerator::with_seed(42).starting_at(1_700_000_000_000);
        ScenarioBuilder::new("air_handler")
            .point(
                PointRecord::new("p1", "AHU1_SAT")
                    .with_units("°F")
                    .with_data_type(DataType::Numeric)
                    .with_history(history.generate(
                        &DataPattern::TrendWithNoise {
                            base: 55.0,
                            trend: 0.0,
                            noise: 1.0,
                        },
                        48,
                        300,
                    )),
                &[("supply_air_temperature_sensor", 0.9)],
            )
            .point(
                PointRecord::new("p2", "AHU1_RAT")
                    .with_units("°F")
                    .with_data_type(DataType::Numeric),
                &[("return_air_temperature_sensor", 0.9)],
            )
            .point(
                PointRecord::new("p3", "AHU1_Cmd")
                    .with_data_type(DataType::Boolean)
                    .with_history(history.generate(&DataPattern::Binary { on_rate: 0.8 }, 48, 300)),
                &[("supply_fan_run_command", 0.9)],
            )
            .build()
    }

    /// One point with no naming pattern and uniform scores.
    pub fn stray_point() -> Self {
        ScenarioBuilder::new("stray_point")
            .unscored(PointRecord::new("s1", "Spare Value 7"))
            .build()
    }

    /// An air handler feeding a VAV box on floor 2.
    pub fn air_handler_with_terminal() -> Self {
        let mut scenario = Self::air_handler();
        scenario.name = "air_handler_with_terminal".to_string();
        ScenarioBuilder::from(scenario)
            .point(
                PointRecord::new("v1", "VAV3_ZNT")
                    .with_units("°F")
                    .with_data_type(DataType::Numeric)
                    .with_device_path("/Drivers/BacnetNetwork/AHU1/VAV3")
                    .with_location("Floor 2"),
                &[("zone_air_temperature_sensor", 0.85)],
            )
            .build()
    }

    /// A VAV box nested under a fan coil unit. No relationship kind
    /// connects FCU to VAV.
    pub fn fan_coil_with_terminal() -> Self {
        ScenarioBuilder::new("fan_coil_with_terminal")
            .point(
                PointRecord::new("f1", "FCU1_ZNT")
                    .with_units("°F")
                    .with_data_type(DataType::Numeric),
                &[("zone_air_temperature_sensor", 0.9)],
            )
            .point(
                PointRecord::new("f2", "FCU1_SF_Cmd").with_data_type(DataType::Boolean),
                &[("supply_fan_run_command", 0.9)],
            )
            .point(
                PointRecord::new("v1", "VAV2_ZNT")
                    .with_units("°F")
                    .with_data_type(DataType::Numeric)
                    .with_device_path("/Drivers/FCU1/VAV2"),
                &[("zone_air_temperature_sensor", 0.9)],
            )
            .build()
    }
}

/// Builder for creating test scenarios
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    name: String,
    records: Vec<PointRecord>,
    scores: Vec<(String, Vec<(String, f64)>)>,
}

impl ScenarioBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Vec::new(),
            scores: Vec::new(),
        }
    }

    /// Add a point with its stub probabilities.
    pub fn point(mut self, record: PointRecord, scores: &[(&str, f64)]) -> Self {
        self.scores.push((
            record.id.as_str().to_string(),
            scores.iter().map(|(c, s)| (c.to_string(), *s)).collect(),
        ));
        self.records.push(record);
        self
    }

    /// Add a point the stub scores uniformly.
    pub fn unscored(mut self, record: PointRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn build(self) -> Scenario {
        Scenario {
            name: self.name,
            records: self.records,
            scores: self.scores,
        }
    }
}

impl From<Scenario> for ScenarioBuilder {
    fn from(scenario: Scenario) -> Self {
        Self {
            name: scenario.name,
            records: scenario.records,
            scores: scenario.scores,
        }
    }
}

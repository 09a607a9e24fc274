//! Sample ontology schema

use ontomap_core::{
    DataType, EquipmentTypeDef, OntologySchema, PointTypeDef, RelationshipKindDef, UnitCategory,
    LOCATION_ENDPOINT, WILDCARD_ENDPOINT,
};

fn numeric(name: &str, category: UnitCategory) -> PointTypeDef {
    PointTypeDef::new(name)
        .with_data_type(DataType::Numeric)
        .with_unit_category(category)
}

fn binary(name: &str) -> PointTypeDef {
    PointTypeDef::new(name).with_data_type(DataType::Boolean)
}

/// A small DBO-style schema with air handlers, terminal units and fan coils.
///
/// - `AHU` requires supply/return air temperature and the supply fan command
/// - `VAV` requires zone air temperature
/// - `FCU` requires zone air temperature and the supply fan command
/// - `feeds` allows AHU→VAV and AHU→FCU; `located_in` allows any equipment
///   to point at a location
pub fn sample_schema() -> OntologySchema {
    OntologySchema::new("dbo-sample", "1.2.0")
        .with_point_type(numeric("supply_air_temperature_sensor", UnitCategory::Temperature))
        .with_point_type(numeric("return_air_temperature_sensor", UnitCategory::Temperature))
        .with_point_type(numeric("mixed_air_temperature_sensor", UnitCategory::Temperature))
        .with_point_type(numeric("outside_air_temperature_sensor", UnitCategory::Temperature))
        .with_point_type(numeric("discharge_air_temperature_sensor", UnitCategory::Temperature))
        .with_point_type(numeric("supply_air_temperature_setpoint", UnitCategory::Temperature))
        .with_point_type(numeric("zone_air_temperature_sensor", UnitCategory::Temperature))
        .with_point_type(numeric("zone_air_temperature_setpoint", UnitCategory::Temperature))
        .with_point_type(numeric("supply_air_flowrate_sensor", UnitCategory::Flowrate))
        .with_point_type(numeric(
            "supply_air_damper_percentage_command",
            UnitCategory::Percentage,
        ))
        .with_point_type(binary("supply_fan_run_command"))
        .with_point_type(binary("supply_fan_run_status"))
        .with_equipment_type(
            EquipmentTypeDef::new("AHU")
                .with_aliases(&["ahu", "rtu"])
                .with_required(&[
                    "supply_air_temperature_sensor",
                    "return_air_temperature_sensor",
                    "supply_fan_run_command",
                ])
                .with_optional(&[
                    "mixed_air_temperature_sensor",
                    "outside_air_temperature_sensor",
                    "supply_air_temperature_setpoint",
                    "supply_fan_run_status",
                ]),
        )
        .with_equipment_type(
            EquipmentTypeDef::new("VAV")
                .with_aliases(&["vav"])
                .with_required(&["zone_air_temperature_sensor"])
                .with_optional(&[
                    "zone_air_temperature_setpoint",
                    "supply_air_flowrate_sensor",
                    "supply_air_damper_percentage_command",
                    "discharge_air_temperature_sensor",
                ]),
        )
        .with_equipment_type(
            EquipmentTypeDef::new("FCU")
                .with_aliases(&["fcu"])
                .with_required(&["zone_air_temperature_sensor", "supply_fan_run_command"])
                .with_optional(&["zone_air_temperature_setpoint", "supply_fan_run_status"]),
        )
        .with_relationship_kind(
            RelationshipKindDef::new("feeds")
                .with_endpoint("AHU", "VAV")
                .with_endpoint("AHU", "FCU"),
        )
        .with_relationship_kind(
            RelationshipKindDef::new("located_in").with_endpoint(WILDCARD_ENDPOINT, LOCATION_ENDPOINT),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_schema_is_consistent() {
        let schema = sample_schema();
        assert!(schema.check().is_empty(), "{:?}", schema.check());
        assert!(schema.permits("feeds", "AHU", "VAV"));
        assert!(!schema.permits("feeds", "FCU", "VAV"));
    }
}

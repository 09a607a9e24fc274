//! Building-automation naming lexicon.
//!
//! Vocabularies of the Digital Buildings field grammar
//! (`<descriptor>_<component>_<measurement>_<point_type>`), the abbreviations
//! commonly found in BAS point names, equipment naming tags and the
//! engineering-unit table. Everything here is static data plus small lookups.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use ontomap_core::UnitCategory;

/// Point-type suffixes.
pub const POINT_TYPES: &[&str] = &[
    "sensor",
    "setpoint",
    "command",
    "status",
    "alarm",
    "count",
    "accumulator",
    "mode",
    "enable",
];

/// Measurement words.
pub const MEASUREMENTS: &[&str] = &[
    "temperature",
    "pressure",
    "flowrate",
    "flowvolume",
    "power",
    "energy",
    "current",
    "voltage",
    "speed",
    "frequency",
    "percentage",
    "humidity",
    "concentration",
    "co2",
];

/// Position and medium descriptors.
pub const DESCRIPTORS: &[&str] = &[
    "supply",
    "return",
    "mixed",
    "outside",
    "discharge",
    "exhaust",
    "zone",
    "space",
    "entering",
    "leaving",
    "primary",
    "secondary",
    "chilled",
    "hot",
    "condensing",
    "differential",
    "static",
    "cooling",
    "heating",
    "run",
    "occupancy",
    "building",
];

/// Physical components.
pub const COMPONENTS: &[&str] = &[
    "air",
    "water",
    "fan",
    "pump",
    "valve",
    "damper",
    "filter",
    "coil",
    "compressor",
    "economizer",
];

const ABBREVIATIONS: &[(&str, &[&str])] = &[
    ("sat", &["supply", "air", "temperature"]),
    ("rat", &["return", "air", "temperature"]),
    ("mat", &["mixed", "air", "temperature"]),
    ("oat", &["outside", "air", "temperature"]),
    ("dat", &["discharge", "air", "temperature"]),
    ("eat", &["exhaust", "air", "temperature"]),
    ("zat", &["zone", "air", "temperature"]),
    ("znt", &["zone", "air", "temperature"]),
    ("chwst", &["chilled", "water", "supply", "temperature"]),
    ("chwrt", &["chilled", "water", "return", "temperature"]),
    ("hwst", &["hot", "water", "supply", "temperature"]),
    ("hwrt", &["hot", "water", "return", "temperature"]),
    ("sa", &["supply", "air"]),
    ("ra", &["return", "air"]),
    ("ma", &["mixed", "air"]),
    ("oa", &["outside", "air"]),
    ("da", &["discharge", "air"]),
    ("ea", &["exhaust", "air"]),
    ("zn", &["zone"]),
    ("chw", &["chilled", "water"]),
    ("hw", &["hot", "water"]),
    ("cw", &["condensing", "water"]),
    ("sf", &["supply", "fan"]),
    ("rf", &["return", "fan"]),
    ("ef", &["exhaust", "fan"]),
    ("t", &["temperature"]),
    ("temp", &["temperature"]),
    ("tmp", &["temperature"]),
    ("sp", &["setpoint"]),
    ("spt", &["setpoint"]),
    ("stpt", &["setpoint"]),
    ("cmd", &["command"]),
    ("sts", &["status"]),
    ("stat", &["status"]),
    ("ss", &["run", "command"]),
    ("alm", &["alarm"]),
    ("alrm", &["alarm"]),
    ("en", &["enable"]),
    ("ena", &["enable"]),
    ("occ", &["occupancy"]),
    ("dpr", &["damper"]),
    ("dmpr", &["damper"]),
    ("vlv", &["valve"]),
    ("press", &["pressure"]),
    ("pres", &["pressure"]),
    ("dp", &["differential", "pressure"]),
    ("flow", &["flowrate"]),
    ("cfm", &["flowrate"]),
    ("spd", &["speed"]),
    ("freq", &["frequency"]),
    ("hz", &["frequency"]),
    ("kw", &["power"]),
    ("kwh", &["energy"]),
    ("amp", &["current"]),
    ("amps", &["current"]),
    ("volt", &["voltage"]),
    ("volts", &["voltage"]),
    ("rh", &["humidity"]),
    ("hum", &["humidity"]),
    ("outdoor", &["outside"]),
    ("fault", &["alarm"]),
];

const EQUIPMENT_TAGS: &[(&str, &str)] = &[
    ("ahu", "AHU"),
    ("rtu", "RTU"),
    ("vav", "VAV"),
    ("fcu", "FCU"),
    ("doas", "DOAS"),
    ("mau", "MAU"),
    ("erv", "ERV"),
    ("hp", "HP"),
    ("uh", "UH"),
    ("cuh", "CUH"),
    ("blr", "BLR"),
    ("boiler", "BLR"),
    ("ch", "CH"),
    ("chlr", "CH"),
    ("chiller", "CH"),
    ("ct", "CT"),
    ("tower", "CT"),
    ("pmp", "PMP"),
    ("pump", "PMP"),
    ("chwp", "PMP"),
    ("hwp", "PMP"),
    ("cwp", "PMP"),
    ("fan", "FAN"),
    ("exf", "FAN"),
    ("hx", "HX"),
];

/// Keyword tokens behind each boolean name feature.
pub const FLAG_KEYWORDS: &[(&str, &[&str])] = &[
    ("has_temperature", &["temperature"]),
    ("has_pressure", &["pressure"]),
    ("has_flow", &["flowrate", "flowvolume"]),
    ("has_humidity", &["humidity"]),
    ("has_co2", &["co2", "concentration"]),
    ("has_power", &["power", "energy", "current", "voltage"]),
    ("has_speed", &["speed", "frequency"]),
    ("has_fan", &["fan"]),
    ("has_pump", &["pump"]),
    ("has_damper", &["damper"]),
    ("has_valve", &["valve"]),
    ("has_coil", &["coil"]),
    ("has_setpoint", &["setpoint"]),
    ("has_sensor", &["sensor"]),
    ("has_command", &["command"]),
    ("has_status", &["status"]),
    ("has_alarm", &["alarm"]),
    ("has_mode", &["mode"]),
    ("has_enable", &["enable"]),
    ("is_supply", &["supply", "discharge"]),
    ("is_return", &["return"]),
    ("is_mixed", &["mixed"]),
    ("is_outside", &["outside"]),
    ("is_zone", &["zone", "space"]),
    ("is_exhaust", &["exhaust"]),
    ("is_chilled_water", &["chilled"]),
    ("is_hot_water", &["hot"]),
];

const UNITS: &[(&str, UnitCategory)] = &[
    ("°f", UnitCategory::Temperature),
    ("°c", UnitCategory::Temperature),
    ("°k", UnitCategory::Temperature),
    ("℉", UnitCategory::Temperature),
    ("℃", UnitCategory::Temperature),
    ("f", UnitCategory::Temperature),
    ("c", UnitCategory::Temperature),
    ("k", UnitCategory::Temperature),
    ("degf", UnitCategory::Temperature),
    ("degc", UnitCategory::Temperature),
    ("deg", UnitCategory::Temperature),
    ("fahrenheit", UnitCategory::Temperature),
    ("celsius", UnitCategory::Temperature),
    ("kelvin", UnitCategory::Temperature),
    ("psi", UnitCategory::Pressure),
    ("psig", UnitCategory::Pressure),
    ("psia", UnitCategory::Pressure),
    ("pa", UnitCategory::Pressure),
    ("kpa", UnitCategory::Pressure),
    ("hpa", UnitCategory::Pressure),
    ("bar", UnitCategory::Pressure),
    ("mbar", UnitCategory::Pressure),
    ("inh2o", UnitCategory::Pressure),
    ("inwc", UnitCategory::Pressure),
    ("iwc", UnitCategory::Pressure),
    ("\"wc", UnitCategory::Pressure),
    ("in.w.c.", UnitCategory::Pressure),
    ("inhg", UnitCategory::Pressure),
    ("cfm", UnitCategory::Flowrate),
    ("l/s", UnitCategory::Flowrate),
    ("lps", UnitCategory::Flowrate),
    ("m3/h", UnitCategory::Flowrate),
    ("m³/h", UnitCategory::Flowrate),
    ("m3/s", UnitCategory::Flowrate),
    ("gpm", UnitCategory::Flowrate),
    ("gal/min", UnitCategory::Flowrate),
    ("lpm", UnitCategory::Flowrate),
    ("l/min", UnitCategory::Flowrate),
    ("gal", UnitCategory::Flowvolume),
    ("gallons", UnitCategory::Flowvolume),
    ("l", UnitCategory::Flowvolume),
    ("liters", UnitCategory::Flowvolume),
    ("litres", UnitCategory::Flowvolume),
    ("m3", UnitCategory::Flowvolume),
    ("m³", UnitCategory::Flowvolume),
    ("ft3", UnitCategory::Flowvolume),
    ("ccf", UnitCategory::Flowvolume),
    ("w", UnitCategory::Power),
    ("kw", UnitCategory::Power),
    ("mw", UnitCategory::Power),
    ("watts", UnitCategory::Power),
    ("kilowatts", UnitCategory::Power),
    ("hp", UnitCategory::Power),
    ("btu/h", UnitCategory::Power),
    ("btuh", UnitCategory::Power),
    ("tons", UnitCategory::Power),
    ("kwh", UnitCategory::Energy),
    ("wh", UnitCategory::Energy),
    ("mwh", UnitCategory::Energy),
    ("btu", UnitCategory::Energy),
    ("kbtu", UnitCategory::Energy),
    ("therm", UnitCategory::Energy),
    ("therms", UnitCategory::Energy),
    ("kj", UnitCategory::Energy),
    ("a", UnitCategory::Current),
    ("amp", UnitCategory::Current),
    ("amps", UnitCategory::Current),
    ("ma", UnitCategory::Current),
    ("amperes", UnitCategory::Current),
    ("v", UnitCategory::Voltage),
    ("volts", UnitCategory::Voltage),
    ("kv", UnitCategory::Voltage),
    ("mv", UnitCategory::Voltage),
    ("rpm", UnitCategory::Speed),
    ("m/s", UnitCategory::Speed),
    ("fpm", UnitCategory::Speed),
    ("ft/min", UnitCategory::Speed),
    ("hz", UnitCategory::Frequency),
    ("khz", UnitCategory::Frequency),
    ("%", UnitCategory::Percentage),
    ("percent", UnitCategory::Percentage),
    ("pct", UnitCategory::Percentage),
    ("%rh", UnitCategory::Humidity),
    ("rh", UnitCategory::Humidity),
    ("ppm", UnitCategory::Concentration),
    ("ppb", UnitCategory::Concentration),
    ("mg/m3", UnitCategory::Concentration),
    ("µg/m³", UnitCategory::Concentration),
];

/// Equipment naming tag, e.g. `AHU` + `1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EquipmentTag {
    /// Canonical equipment abbreviation
    pub kind: String,
    /// Instance number, possibly with a trailing letter
    pub number: String,
}

impl std::fmt::Display for EquipmentTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.kind, self.number)
    }
}

/// Split a point name into lowercase fragments.
///
/// Non-alphanumeric characters delimit; camelCase and `digit→word`
/// transitions split further (`SupplyAirTemp` → `supply air temp`,
/// `AHU1SAT` → `ahu1 sat`). A single trailing letter stays attached to its
/// number (`VAV101A`).
pub fn split_name(name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for segment in name.split(|c: char| !c.is_alphanumeric()) {
        if segment.is_empty() {
            continue;
        }
        let chars: Vec<char> = segment.chars().collect();
        let mut current = String::new();
        for (i, &c) in chars.iter().enumerate() {
            if i > 0 && is_boundary(&chars, i) && !current.is_empty() {
                tokens.push(current.to_lowercase());
                current.clear();
            }
            current.push(c);
        }
        if !current.is_empty() {
            tokens.push(current.to_lowercase());
        }
    }
    tokens
}

fn is_boundary(chars: &[char], i: usize) -> bool {
    let prev = chars[i - 1];
    let c = chars[i];
    if prev.is_lowercase() && c.is_uppercase() {
        return true;
    }
    if prev.is_uppercase() && c.is_uppercase() {
        return chars.get(i + 1).map(|n| n.is_lowercase()).unwrap_or(false);
    }
    if prev.is_ascii_digit() && c.is_alphabetic() {
        let run = chars[i..].iter().take_while(|n| n.is_alphabetic()).count();
        return run >= 2;
    }
    false
}

/// Expand an abbreviation to its vocabulary words.
pub fn expand(token: &str) -> Vec<String> {
    ABBREVIATIONS
        .iter()
        .find(|(abbr, _)| *abbr == token)
        .map(|(_, words)| words.iter().map(|w| (*w).to_string()).collect())
        .unwrap_or_else(|| vec![token.to_string()])
}

pub fn is_point_type(word: &str) -> bool {
    POINT_TYPES.contains(&word)
}

pub fn is_measurement(word: &str) -> bool {
    MEASUREMENTS.contains(&word)
}

pub fn is_descriptor(word: &str) -> bool {
    DESCRIPTORS.contains(&word)
}

pub fn is_component(word: &str) -> bool {
    COMPONENTS.contains(&word)
}

/// Whether the word belongs to any field-grammar vocabulary.
pub fn is_known_word(word: &str) -> bool {
    is_point_type(word) || is_measurement(word) || is_descriptor(word) || is_component(word)
}

/// Canonical equipment abbreviation for a naming tag (`boiler` → `BLR`).
pub fn equipment_kind(tag: &str) -> Option<&'static str> {
    let lower = tag.to_lowercase();
    EQUIPMENT_TAGS
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, kind)| *kind)
}

/// Parse a fused tag such as `ahu1`, `VAV101A` or `ch2`.
pub fn parse_equipment_tag(token: &str) -> Option<EquipmentTag> {
    let split = token.find(|c: char| c.is_ascii_digit())?;
    let (alpha, rest) = token.split_at(split);
    if alpha.is_empty() || !alpha.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if !is_instance_number(rest) {
        return None;
    }
    let kind = equipment_kind(alpha)?;
    Some(EquipmentTag {
        kind: kind.to_string(),
        number: rest.to_uppercase(),
    })
}

/// Digits with at most one trailing letter.
pub fn is_instance_number(s: &str) -> bool {
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return false;
    }
    let tail: Vec<char> = s.chars().skip(digits).collect();
    match tail.as_slice() {
        [] => true,
        [c] => c.is_ascii_alphabetic(),
        _ => false,
    }
}

/// Classify an engineering-unit string.
///
/// Matching is on the whole normalised string (lowercase, whitespace
/// removed), never on substrings.
pub fn unit_category(units: &str) -> UnitCategory {
    let normalized: String = units
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if normalized.is_empty() || normalized == "null" {
        return UnitCategory::Unknown;
    }
    UNITS
        .iter()
        .find(|(u, _)| *u == normalized.as_str())
        .map(|(_, category)| *category)
        .unwrap_or(UnitCategory::Unknown)
}

/// Measurement word implied by a unit category.
pub fn measurement_for(category: UnitCategory) -> Option<&'static str> {
    match category {
        UnitCategory::Temperature => Some("temperature"),
        UnitCategory::Pressure => Some("pressure"),
        UnitCategory::Flowrate => Some("flowrate"),
        UnitCategory::Flowvolume => Some("flowvolume"),
        UnitCategory::Power => Some("power"),
        UnitCategory::Energy => Some("energy"),
        UnitCategory::Current => Some("current"),
        UnitCategory::Voltage => Some("voltage"),
        UnitCategory::Speed => Some("speed"),
        UnitCategory::Frequency => Some("frequency"),
        UnitCategory::Percentage => Some("percentage"),
        UnitCategory::Humidity => Some("humidity"),
        UnitCategory::Concentration => Some("concentration"),
        UnitCategory::Unknown => None,
    }
}

/// Token-set Jaccard similarity of two `snake_case` identifiers.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let left = field_tokens(a);
    let right = field_tokens(b);
    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    left.intersection(&right).count() as f64 / union as f64
}

/// Whether two field names describe the same point role.
///
/// Descriptor, measurement and point-type words must agree exactly.
/// Component words may be omitted on one side but never contradict, so
/// `zone_temperature_sensor` fills `zone_air_temperature_sensor` while
/// `supply_water_temperature_sensor` does not.
pub fn same_role(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let (role_a, parts_a): (BTreeSet<&str>, BTreeSet<&str>) =
        field_tokens(a).into_iter().partition(|t| !is_component(t));
    let (role_b, parts_b): (BTreeSet<&str>, BTreeSet<&str>) =
        field_tokens(b).into_iter().partition(|t| !is_component(t));
    !role_a.is_empty()
        && role_a == role_b
        && (parts_a.is_subset(&parts_b) || parts_b.is_subset(&parts_a))
}

fn field_tokens(name: &str) -> BTreeSet<&str> {
    name.split('_').filter(|t| !t.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("AHU1_SAT"), vec!["ahu1", "sat"]);
        assert_eq!(split_name("SupplyAirTemp"), vec!["supply", "air", "temp"]);
        assert_eq!(split_name("AHU1SAT"), vec!["ahu1", "sat"]);
        assert_eq!(split_name("VAV101A-ZN.T"), vec!["vav101a", "zn", "t"]);
        assert_eq!(split_name("CO2"), vec!["co2"]);
        assert!(split_name("__").is_empty());
    }

    #[test]
    fn test_expand() {
        assert_eq!(expand("sat"), vec!["supply", "air", "temperature"]);
        assert_eq!(expand("cmd"), vec!["command"]);
        assert_eq!(expand("widget"), vec!["widget"]);
    }

    #[test]
    fn test_parse_equipment_tag() {
        let tag = parse_equipment_tag("ahu1").unwrap();
        assert_eq!(tag.to_string(), "AHU-1");
        assert_eq!(parse_equipment_tag("vav101a").unwrap().number, "101A");
        assert_eq!(parse_equipment_tag("boiler2").unwrap().kind, "BLR");
        assert!(parse_equipment_tag("sat").is_none());
        assert!(parse_equipment_tag("zone2").is_none());
        assert!(parse_equipment_tag("ahu1ab").is_none());
        assert!(parse_equipment_tag("co2").is_none());
    }

    #[test]
    fn test_unit_category_matches_whole_strings() {
        assert_eq!(unit_category("°F"), UnitCategory::Temperature);
        assert_eq!(unit_category("deg F"), UnitCategory::Temperature);
        assert_eq!(unit_category("in WC"), UnitCategory::Pressure);
        assert_eq!(unit_category("CFM"), UnitCategory::Flowrate);
        assert_eq!(unit_category("%RH"), UnitCategory::Humidity);
        assert_eq!(unit_category("null"), UnitCategory::Unknown);
        // no prefix matching: "f" is temperature, "furlongs" is not
        assert_eq!(unit_category("furlongs"), UnitCategory::Unknown);
    }

    #[test]
    fn test_name_similarity() {
        assert_eq!(name_similarity("supply_air_temperature_sensor", "supply_air_temperature_sensor"), 1.0);
        let sim = name_similarity("supply_air_temperature_sensor", "return_air_temperature_sensor");
        assert!((sim - 0.6).abs() < 1e-9);
        assert_eq!(name_similarity("run_command", "zone_air_temperature_sensor"), 0.0);
    }

    #[test]
    fn test_same_role() {
        assert!(same_role("supply_air_temperature_sensor", "supply_air_temperature_sensor"));
        assert!(same_role("zone_temperature_sensor", "zone_air_temperature_sensor"));
        assert!(!same_role("discharge_air_temperature_sensor", "return_air_temperature_sensor"));
        assert!(!same_role("supply_air_temperature_sensor", "supply_air_temperature_setpoint"));
        assert!(!same_role("supply_air_temperature_sensor", "supply_water_temperature_sensor"));
        assert!(!same_role("supply_fan_run_command", "supply_fan_run_status"));
        assert!(!same_role("air", "water"));
    }
}

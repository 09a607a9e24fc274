//! Structural keys derived from BAS naming conventions.
//!
//! Points that share an equipment tag chain (`AHU1_SAT`, `AHU1_RAT`) or a
//! device path (`/Drivers/AHU1/...`) are grouped under the same key. Nested
//! tags form a parent chain (`AHU-1/VAV-3`).

use std::fmt;

use serde::{Deserialize, Serialize};

use ontomap_core::PointRecord;

use crate::lexicon::{self, EquipmentTag};

/// Chain of equipment tags, outermost first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StructuralKey {
    pub chain: Vec<EquipmentTag>,
}

impl StructuralKey {
    pub fn new(chain: Vec<EquipmentTag>) -> Option<Self> {
        if chain.is_empty() {
            None
        } else {
            Some(Self { chain })
        }
    }

    /// Innermost tag.
    pub fn leaf(&self) -> &EquipmentTag {
        // chain is never empty
        &self.chain[self.chain.len() - 1]
    }

    /// Key of the enclosing equipment, if nested.
    pub fn parent(&self) -> Option<StructuralKey> {
        if self.chain.len() < 2 {
            return None;
        }
        Some(Self {
            chain: self.chain[..self.chain.len() - 1].to_vec(),
        })
    }

    pub fn depth(&self) -> usize {
        self.chain.len()
    }
}

impl fmt::Display for StructuralKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tag) in self.chain.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", tag)?;
        }
        Ok(())
    }
}

/// Derive the structural key of a point from its device path and name.
///
/// Tags are either fused (`AHU1`, `VAV101A`) or a tag word followed by an
/// instance number (`VAV 101`, `AHU-1`). Consecutive repeats are collapsed,
/// so `/AHU1/AHU1_SAT` keys as `AHU-1`.
pub fn structural_key(record: &PointRecord) -> Option<StructuralKey> {
    let mut chain: Vec<EquipmentTag> = Vec::new();

    let sources = record
        .device_path
        .as_deref()
        .into_iter()
        .chain(std::iter::once(record.name.as_str()));
    for source in sources {
        for tag in tags_in(source) {
            if chain.last() != Some(&tag) {
                chain.push(tag);
            }
        }
    }

    StructuralKey::new(chain)
}

fn tags_in(text: &str) -> Vec<EquipmentTag> {
    let tokens = lexicon::split_name(text);
    let mut tags = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if let Some(tag) = lexicon::parse_equipment_tag(&tokens[i]) {
            tags.push(tag);
            i += 1;
            continue;
        }
        if let (Some(kind), Some(next)) = (lexicon::equipment_kind(&tokens[i]), tokens.get(i + 1)) {
            if lexicon::is_instance_number(next) {
                tags.push(EquipmentTag {
                    kind: kind.to_string(),
                    number: next.to_uppercase(),
                });
                i += 2;
                continue;
            }
        }
        i += 1;
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> Option<String> {
        structural_key(&PointRecord::new("p", name)).map(|k| k.to_string())
    }

    #[test]
    fn test_fused_and_split_tags() {
        assert_eq!(key("AHU1_SAT").as_deref(), Some("AHU-1"));
        assert_eq!(key("AHU-1 SAT").as_deref(), Some("AHU-1"));
        assert_eq!(key("VAV 101A ZNT").as_deref(), Some("VAV-101A"));
        assert_eq!(key("Boiler2.HWST").as_deref(), Some("BLR-2"));
    }

    #[test]
    fn test_nested_chain() {
        let record = PointRecord::new("p", "VAV3_ZNT").with_device_path("/Drivers/AHU1/VAV3");
        let key = structural_key(&record).unwrap();
        assert_eq!(key.to_string(), "AHU-1/VAV-3");
        assert_eq!(key.parent().unwrap().to_string(), "AHU-1");
        assert_eq!(key.leaf().kind, "VAV");
    }

    #[test]
    fn test_repeated_tag_collapses() {
        let record = PointRecord::new("p", "AHU1_SAT").with_device_path("/Drivers/AHU1");
        assert_eq!(structural_key(&record).unwrap().depth(), 1);
    }

    #[test]
    fn test_no_key() {
        assert_eq!(key("Misc Value"), None);
        assert_eq!(key("Zone2_Temp"), None);
        assert_eq!(key("OAT"), None);
    }

    #[test]
    fn test_key_serde() {
        let record = PointRecord::new("p", "VAV3_ZNT").with_device_path("/Drivers/AHU1/VAV3");
        let key = structural_key(&record).unwrap();

        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json["chain"][0]["kind"], "AHU");
        assert_eq!(json["chain"][1]["number"], "3");
        let back: StructuralKey = serde_json::from_value(json).unwrap();
        assert_eq!(back, key);
    }
}

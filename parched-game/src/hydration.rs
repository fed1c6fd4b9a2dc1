//! Hydration patch entries and the per-consumption properties they resolve to.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::purity::{InvalidPurityLevel, PurityLevel};

/// Sub-key in `hydrationByType` used when no exact item code matches.
pub const WILDCARD_KEY: &str = "*";

/// Hydration granted (or taken) by one consumption of an item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HydrationProperties {
    pub hydration: f32,
    #[serde(default)]
    pub hydration_loss_delay: f32,
    pub purity: PurityLevel,
    #[serde(default)]
    pub salty: bool,
    #[serde(default)]
    pub scalding: bool,
}

impl HydrationProperties {
    /// Plain drinkable liquid of the given purity with no side effects.
    #[must_use]
    pub const fn new(hydration: f32, purity: PurityLevel) -> Self {
        Self {
            hydration,
            hydration_loss_delay: 0.0,
            purity,
            salty: false,
            scalding: false,
        }
    }

    #[must_use]
    pub const fn with_loss_delay(mut self, seconds: f32) -> Self {
        self.hydration_loss_delay = seconds;
        self
    }

    /// Scale the hydration for a partial portion (litres drunk, fraction eaten).
    #[must_use]
    pub fn scaled(mut self, portion: f32) -> Self {
        self.hydration *= portion.max(0.0);
        self
    }
}

/// Either one value for every matched item or a per-item table.
#[derive(Debug, Clone, PartialEq)]
pub enum HydrationAmount {
    Flat(f32),
    ByType(BTreeMap<String, f32>),
}

impl HydrationAmount {
    fn value_for(&self, item: &str) -> Option<f32> {
        match self {
            Self::Flat(value) => Some(*value),
            Self::ByType(values) => values
                .get(item)
                .or_else(|| values.get(WILDCARD_KEY))
                .copied(),
        }
    }
}

/// Why a single patch entry was rejected.
#[derive(Debug, Error)]
pub enum EntryError {
    #[error("entry is not a valid patch object: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("entry '{0}' has neither 'hydration' nor 'hydrationByType'")]
    MissingAmount(String),
    #[error("entry '{0}' sets both 'hydration' and 'hydrationByType'")]
    ConflictingAmount(String),
    #[error("entry '{item}' has an unusable purity: {source}")]
    Purity {
        item: String,
        #[source]
        source: InvalidPurityLevel,
    },
}

/// Patch entry exactly as it appears in a JSON file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPatch {
    itemname: String,
    #[serde(default)]
    hydration: Option<f32>,
    #[serde(default)]
    hydration_by_type: Option<BTreeMap<String, f32>>,
    #[serde(default, alias = "IsLiquid")]
    is_liquid: bool,
    #[serde(default)]
    salty: bool,
    #[serde(default)]
    scalding: bool,
    #[serde(default)]
    purity: Option<String>,
    #[serde(default)]
    hydration_loss_delay: Option<f32>,
}

/// One merged hydration rule.
#[derive(Debug, Clone, PartialEq)]
pub struct HydrationEntry {
    pub item_pattern: String,
    pub priority: i32,
    pub amount: HydrationAmount,
    pub is_liquid: bool,
    pub salty: bool,
    pub scalding: bool,
    pub purity: Option<PurityLevel>,
    pub hydration_loss_delay: Option<f32>,
}

impl HydrationEntry {
    /// Validate a raw JSON patch object into an entry.
    ///
    /// # Errors
    ///
    /// Returns [`EntryError`] if the object is malformed, sets both or neither
    /// amount fields, or names an unknown purity.
    pub fn from_value(value: serde_json::Value, priority: i32) -> Result<Self, EntryError> {
        let raw: RawPatch = serde_json::from_value(value)?;
        let amount = match (raw.hydration, raw.hydration_by_type) {
            (Some(value), None) => HydrationAmount::Flat(value),
            (None, Some(values)) => HydrationAmount::ByType(values),
            (None, None) => return Err(EntryError::MissingAmount(raw.itemname)),
            (Some(_), Some(_)) => return Err(EntryError::ConflictingAmount(raw.itemname)),
        };
        let purity = match raw.purity.as_deref() {
            Some(name) => Some(name.parse().map_err(|source| EntryError::Purity {
                item: raw.itemname.clone(),
                source,
            })?),
            None => None,
        };
        Ok(Self {
            item_pattern: raw.itemname,
            priority,
            amount,
            is_liquid: raw.is_liquid,
            salty: raw.salty,
            scalding: raw.scalding,
            purity,
            hydration_loss_delay: raw.hydration_loss_delay,
        })
    }

    /// Prefix before the trailing `*`, if this entry is a wildcard pattern.
    #[must_use]
    pub fn wildcard_prefix(&self) -> Option<&str> {
        self.item_pattern.strip_suffix('*')
    }

    /// Resolve the properties this entry grants for a concrete item code.
    #[must_use]
    pub fn properties_for(&self, item: &str) -> Option<HydrationProperties> {
        let hydration = self.amount.value_for(item)?;
        let purity = self
            .purity
            .or_else(|| PurityLevel::infer_from_code(item))
            .unwrap_or(if self.is_liquid {
                PurityLevel::Okay
            } else {
                PurityLevel::Pure
            });
        Some(HydrationProperties {
            hydration,
            hydration_loss_delay: self.hydration_loss_delay.unwrap_or(0.0).max(0.0),
            purity,
            salty: self.salty,
            scalding: self.scalding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn by_type_falls_back_to_wildcard_key() {
        let entry = HydrationEntry::from_value(
            json!({
                "itemname": "game:fruit-*",
                "hydrationByType": { "game:fruit-cherry": 15, "*": 8 },
                "IsLiquid": false
            }),
            5,
        )
        .unwrap();
        assert_eq!(entry.wildcard_prefix(), Some("game:fruit-"));
        let cherry = entry.properties_for("game:fruit-cherry").unwrap();
        assert!((cherry.hydration - 15.0).abs() < f32::EPSILON);
        assert_eq!(cherry.purity, PurityLevel::Pure);
        let other = entry.properties_for("game:fruit-unknownvariant").unwrap();
        assert!((other.hydration - 8.0).abs() < f32::EPSILON);
    }

    #[test]
    fn by_type_without_wildcard_misses_unknown_items() {
        let entry = HydrationEntry::from_value(
            json!({
                "itemname": "game:cheese-*",
                "hydrationByType": { "game:cheese-blue-1slice": -4 }
            }),
            5,
        )
        .unwrap();
        assert!(entry.properties_for("game:cheese-goat").is_none());
    }

    #[test]
    fn amount_fields_are_mutually_exclusive() {
        let both = HydrationEntry::from_value(
            json!({ "itemname": "x", "hydration": 1, "hydrationByType": { "*": 1 } }),
            5,
        );
        assert!(matches!(both, Err(EntryError::ConflictingAmount(_))));
        let neither = HydrationEntry::from_value(json!({ "itemname": "x" }), 5);
        assert!(matches!(neither, Err(EntryError::MissingAmount(_))));
        let nameless = HydrationEntry::from_value(json!({ "hydration": 3 }), 5);
        assert!(matches!(nameless, Err(EntryError::Malformed(_))));
    }

    #[test]
    fn liquid_purity_and_flags_resolve() {
        let salt = HydrationEntry::from_value(
            json!({ "itemname": "game:saltwaterportion", "hydration": -600, "isLiquid": true, "salty": true }),
            5,
        )
        .unwrap();
        let props = salt.properties_for("game:saltwaterportion").unwrap();
        assert!(props.salty);
        assert_eq!(props.purity, PurityLevel::Okay);
        assert!(props.hydration_loss_delay.abs() < f32::EPSILON);

        let bad = HydrationEntry::from_value(
            json!({ "itemname": "game:mud", "hydration": 1, "purity": "Muddy" }),
            5,
        );
        assert!(matches!(bad, Err(EntryError::Purity { .. })));
    }

    #[test]
    fn scaling_only_touches_hydration() {
        let props = HydrationProperties::new(600.0, PurityLevel::Pure).with_loss_delay(10.0);
        let half = props.scaled(0.5);
        assert!((half.hydration - 300.0).abs() < f32::EPSILON);
        assert!((half.hydration_loss_delay - 10.0).abs() < f32::EPSILON);
    }
}

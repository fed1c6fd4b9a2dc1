//! Persisted per-entity thirst attributes.
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_HYDRATION, DEFAULT_MAX_HYDRATION, INITIAL_LOSS_DELAY};

/// The `parched:thirst` attribute tree of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThirstState {
    #[serde(rename = "currenthydration")]
    pub hydration: f32,
    #[serde(rename = "maxhydration")]
    pub max_hydration: f32,
    #[serde(default)]
    pub euhydration: f32,
    #[serde(rename = "hydrationlossdelay", default)]
    pub hydration_loss_delay: f32,
    #[serde(default)]
    pub intoxication: f32,
}

impl Default for ThirstState {
    fn default() -> Self {
        Self {
            hydration: DEFAULT_HYDRATION,
            max_hydration: DEFAULT_MAX_HYDRATION,
            euhydration: 0.0,
            hydration_loss_delay: INITIAL_LOSS_DELAY,
            intoxication: 0.0,
        }
    }
}

/// Per-entity-type overrides read from the behavior's JSON attributes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct TypeAttributes {
    #[serde(rename = "currenthydration", default)]
    pub hydration: Option<f32>,
    #[serde(rename = "maxhydration", default)]
    pub max_hydration: Option<f32>,
}

impl ThirstState {
    /// Fresh state for a newly spawned entity of a given type.
    #[must_use]
    pub fn fresh(type_attributes: &TypeAttributes) -> Self {
        let defaults = Self::default();
        Self {
            hydration: type_attributes.hydration.unwrap_or(defaults.hydration),
            max_hydration: type_attributes
                .max_hydration
                .unwrap_or(defaults.max_hydration),
            ..defaults
        }
    }

    /// Reuse a stored tree unless it is missing or was never initialized.
    #[must_use]
    pub fn restore_or_fresh(stored: Option<Self>, type_attributes: &TypeAttributes) -> Self {
        match stored {
            Some(state) if state.max_hydration > 0.0 => state,
            _ => Self::fresh(type_attributes),
        }
    }

    /// Decode the attribute tree; unreadable trees count as absent.
    #[must_use]
    pub fn from_attributes(tree: &serde_json::Value) -> Option<Self> {
        match serde_json::from_value(tree.clone()) {
            Ok(state) => Some(state),
            Err(err) => {
                log::debug!("ignoring unreadable thirst tree: {err}");
                None
            }
        }
    }

    #[must_use]
    pub fn to_attributes(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    #[must_use]
    pub fn hydration_ratio(&self) -> f32 {
        if self.max_hydration > 0.0 {
            (self.hydration / self.max_hydration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    #[must_use]
    pub fn is_maxed(&self) -> bool {
        self.hydration >= self.max_hydration
    }
}

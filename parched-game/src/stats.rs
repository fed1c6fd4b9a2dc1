//! Named, blended entity stats (`hungerrate`, `parched:thirstrate`, ...).
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// How the modifiers of one stat combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BlendType {
    /// `1 + sum(modifiers)`.
    #[default]
    WeightedSum,
    /// `product(modifiers)`.
    FlatMultiply,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
struct StatCategory {
    blend: BlendType,
    modifiers: BTreeMap<String, f32>,
}

impl StatCategory {
    fn blended(&self) -> f32 {
        match self.blend {
            BlendType::WeightedSum => 1.0 + self.modifiers.values().sum::<f32>(),
            BlendType::FlatMultiply => self.modifiers.values().product(),
        }
    }
}

/// Per-entity stat table shared by every behavior on the entity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityStats {
    categories: HashMap<String, StatCategory>,
}

impl EntityStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stat; re-registering keeps existing modifiers.
    pub fn register(&mut self, category: &str, blend: BlendType) {
        self.categories
            .entry(category.to_string())
            .or_insert_with(|| StatCategory {
                blend,
                modifiers: BTreeMap::new(),
            });
    }

    #[must_use]
    pub fn is_registered(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    /// Set a named modifier, registering the stat as a weighted sum if needed.
    pub fn set(&mut self, category: &str, code: &str, value: f32) {
        self.categories
            .entry(category.to_string())
            .or_default()
            .modifiers
            .insert(code.to_string(), value);
    }

    /// Remove a modifier; unknown stats or codes are ignored.
    pub fn remove(&mut self, category: &str, code: &str) -> Option<f32> {
        self.categories.get_mut(category)?.modifiers.remove(code)
    }

    #[must_use]
    pub fn get(&self, category: &str, code: &str) -> Option<f32> {
        self.categories.get(category)?.modifiers.get(code).copied()
    }

    /// Blended value of a stat; unregistered stats are neutral.
    #[must_use]
    pub fn blended(&self, category: &str) -> f32 {
        self.categories
            .get(category)
            .map_or(1.0, StatCategory::blended)
    }
}

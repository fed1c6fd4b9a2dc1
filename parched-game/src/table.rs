//! Merged hydration table and item resolution.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::ConfigError;
use crate::hydration::{HydrationEntry, HydrationProperties};
use crate::merger::ConfigMerger;

/// Winning hydration entry per item name or pattern.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HydrationTable {
    entries: BTreeMap<String, HydrationEntry>,
    wildcards: Vec<String>,
    source_dir: Option<PathBuf>,
}

impl HydrationTable {
    /// Build a table from already-merged entries keyed by item pattern.
    #[must_use]
    pub fn from_entries(entries: BTreeMap<String, HydrationEntry>) -> Self {
        let mut wildcards: Vec<String> = entries
            .values()
            .filter(|entry| entry.wildcard_prefix().is_some())
            .map(|entry| entry.item_pattern.clone())
            .collect();
        // Longest prefix first so `bread-spelt-*` beats `bread-*`.
        wildcards.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        Self {
            entries,
            wildcards,
            source_dir: None,
        }
    }

    #[must_use]
    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn source_dir(&self) -> Option<&Path> {
        self.source_dir.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry stored under an exact pattern key.
    #[must_use]
    pub fn get(&self, pattern: &str) -> Option<&HydrationEntry> {
        self.entries.get(pattern)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &HydrationEntry)> {
        self.entries.iter()
    }

    /// Resolve the hydration an item grants when consumed.
    ///
    /// An exact key wins; otherwise wildcard patterns whose prefix matches are
    /// tried longest first. `None` means the item does not affect hydration.
    #[must_use]
    pub fn resolve(&self, item: &str) -> Option<HydrationProperties> {
        if let Some(entry) = self.entries.get(item)
            && let Some(props) = entry.properties_for(item)
        {
            return Some(props);
        }
        self.wildcards
            .iter()
            .filter_map(|pattern| self.entries.get(pattern))
            .filter(|entry| {
                entry
                    .wildcard_prefix()
                    .is_some_and(|prefix| item.starts_with(prefix))
            })
            .find_map(|entry| entry.properties_for(item))
    }

    /// Re-run the merge against the directory this table was loaded from.
    ///
    /// Tables built in memory have nothing to reload and are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the merge fails; the current table is kept.
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        let Some(dir) = self.source_dir.clone() else {
            return Ok(());
        };
        *self = ConfigMerger::new(dir).load_and_merge()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(values: Vec<serde_json::Value>) -> HydrationTable {
        let entries = values
            .into_iter()
            .map(|value| HydrationEntry::from_value(value, 5).unwrap())
            .map(|entry| (entry.item_pattern.clone(), entry))
            .collect();
        HydrationTable::from_entries(entries)
    }

    #[test]
    fn wildcard_resolution_uses_exact_then_star() {
        let table = table(vec![json!({
            "itemname": "game:fruit-*",
            "hydrationByType": { "game:fruit-cherry": 15, "*": 8 }
        })]);
        let cherry = table.resolve("game:fruit-cherry").unwrap();
        assert!((cherry.hydration - 15.0).abs() < f32::EPSILON);
        let unknown = table.resolve("game:fruit-unknownvariant").unwrap();
        assert!((unknown.hydration - 8.0).abs() < f32::EPSILON);
        assert!(table.resolve("game:vegetable-carrot").is_none());
    }

    #[test]
    fn exact_entry_beats_wildcard() {
        let table = table(vec![
            json!({ "itemname": "game:waterportion-*", "hydrationByType": { "*": 600 } }),
            json!({ "itemname": "game:waterportion-pure", "hydration": 1200 }),
        ]);
        let pure = table.resolve("game:waterportion-pure").unwrap();
        assert!((pure.hydration - 1200.0).abs() < f32::EPSILON);
    }

    #[test]
    fn longer_prefix_wins_and_falls_through_when_empty() {
        let table = table(vec![
            json!({ "itemname": "game:bread-*", "hydrationByType": { "*": -5 } }),
            json!({ "itemname": "game:bread-spelt-*", "hydrationByType": { "game:bread-spelt-charred": -10 } }),
        ]);
        let charred = table.resolve("game:bread-spelt-charred").unwrap();
        assert!((charred.hydration + 10.0).abs() < f32::EPSILON);
        let perfect = table.resolve("game:bread-spelt-perfect").unwrap();
        assert!((perfect.hydration + 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn in_memory_reload_is_a_no_op() {
        let mut table = table(vec![json!({ "itemname": "game:butter", "hydration": -5 })]);
        let before = table.clone();
        table.reload().unwrap();
        assert_eq!(table, before);
        assert!(table.source_dir().is_none());
    }
}

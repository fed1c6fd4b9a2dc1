//! Layered hydration patch loading and priority merge.
//!
//! Every `*AddItemHydration*.json` file in the config directory contributes a
//! priority and a list of patches. Two files are always present: the
//! compat defaults covering base-game items and the mod defaults for our own
//! water portions. Both are synthesized from the embedded rulesets when
//! missing.
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config::ConfigError;
use crate::constants::{
    COMPAT_PATCH_FILE, DEFAULT_PATCH_PRIORITY, MOD_PATCH_FILE, PATCH_FILE_PATTERN,
};
use crate::hydration::HydrationEntry;
use crate::table::HydrationTable;

const COMPAT_DEFAULTS: &str = include_str!("../assets/data/compat_hydration.json");
const MOD_DEFAULTS: &str = include_str!("../assets/data/mod_hydration.json");

fn patch_file_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(PATCH_FILE_PATTERN).expect("valid patch file pattern"))
}

/// Top-level shape of a patch file.
#[derive(Debug, Clone, Deserialize)]
struct PatchFileBody {
    #[serde(default)]
    priority: Option<i32>,
    #[serde(default)]
    patches: Option<Vec<serde_json::Value>>,
}

/// A parsed patch file, entries still unvalidated.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchFile {
    pub path: PathBuf,
    pub priority: i32,
    pub patches: Vec<serde_json::Value>,
}

impl PatchFile {
    /// Parse a patch file body, attributing failures to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if `body` is not a JSON patch object.
    pub fn parse(path: impl Into<PathBuf>, body: &str) -> Result<Self, ConfigError> {
        let path = path.into();
        let parsed: PatchFileBody =
            serde_json::from_str(body).map_err(|source| ConfigError::Load {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            priority: parsed.priority.unwrap_or(DEFAULT_PATCH_PRIORITY),
            patches: parsed.patches.unwrap_or_default(),
        })
    }

    /// Read and parse a patch file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Load`].
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let body = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &body)
    }
}

/// Loads every hydration patch file in a directory and merges them.
#[derive(Debug, Clone)]
pub struct ConfigMerger {
    dir: PathBuf,
}

impl ConfigMerger {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write the embedded default patch files that are missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Write`] if the directory or a file cannot be written.
    pub fn ensure_defaults(&self) -> Result<(), ConfigError> {
        fs::create_dir_all(&self.dir).map_err(|source| ConfigError::Write {
            path: self.dir.clone(),
            source,
        })?;
        for (name, body) in [(COMPAT_PATCH_FILE, COMPAT_DEFAULTS), (MOD_PATCH_FILE, MOD_DEFAULTS)] {
            let path = self.dir.join(name);
            if path.exists() {
                continue;
            }
            fs::write(&path, body).map_err(|source| ConfigError::Write {
                path: path.clone(),
                source,
            })?;
            log::info!("synthesized default hydration patches at {}", path.display());
        }
        Ok(())
    }

    /// Patch files in load order: the mod defaults first, then every other
    /// matching file sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Scan`] if the directory cannot be listed.
    pub fn discover(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let scan_err = |source| ConfigError::Scan {
            path: self.dir.clone(),
            source,
        };
        let mut found = Vec::new();
        for dir_entry in fs::read_dir(&self.dir).map_err(scan_err)? {
            let path = dir_entry.map_err(scan_err)?.path();
            let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            if name != MOD_PATCH_FILE && path.is_file() && patch_file_regex().is_match(name) {
                found.push(path);
            }
        }
        found.sort();
        found.insert(0, self.dir.join(MOD_PATCH_FILE));
        Ok(found)
    }

    /// Synthesize missing defaults, read every patch file and merge them.
    ///
    /// A malformed file aborts the whole merge so gameplay never runs on a
    /// partial table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the offending file.
    pub fn load_and_merge(&self) -> Result<HydrationTable, ConfigError> {
        self.ensure_defaults()?;
        let files = self
            .discover()?
            .iter()
            .map(|path| PatchFile::read(path))
            .collect::<Result<Vec<_>, _>>()?;
        let table = merge_patch_files(&files).with_source_dir(&self.dir);
        log::info!(
            "merged {} hydration entries from {} patch files in {}",
            table.len(),
            files.len(),
            self.dir.display()
        );
        Ok(table)
    }
}

/// Merge parsed patch files by priority.
///
/// Groups are walked highest priority first. A key written by a higher group
/// is never replaced by a lower one; inside one group later files and later
/// entries overwrite earlier ones. Entries that fail validation are logged
/// and skipped.
#[must_use]
pub fn merge_patch_files(files: &[PatchFile]) -> HydrationTable {
    let mut grouped: BTreeMap<i32, Vec<(&Path, usize, &serde_json::Value)>> = BTreeMap::new();
    for file in files {
        let group = grouped.entry(file.priority).or_default();
        group.extend(
            file.patches
                .iter()
                .enumerate()
                .map(|(idx, patch)| (file.path.as_path(), idx, patch)),
        );
    }

    let mut merged: BTreeMap<String, HydrationEntry> = BTreeMap::new();
    for (&priority, patches) in grouped.iter().rev() {
        for &(path, idx, patch) in patches {
            let entry = match HydrationEntry::from_value(patch.clone(), priority) {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("skipping patch #{idx} in {}: {err}", path.display());
                    continue;
                }
            };
            let owned_by_higher = merged
                .get(&entry.item_pattern)
                .is_some_and(|existing| existing.priority > priority);
            if !owned_by_higher {
                merged.insert(entry.item_pattern.clone(), entry);
            }
        }
    }
    HydrationTable::from_entries(merged)
}

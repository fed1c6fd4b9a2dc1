//! Vomit risk driven by the purity of an ingested liquid.
use rand::Rng;

use crate::config::SyncedConfig;
use crate::constants::VOMIT_DECAY_RATE;
use crate::purity::PurityLevel;

/// Probability of vomiting after drinking something of numeric purity `purity`.
#[must_use]
pub fn vomit_chance(purity: f64) -> f64 {
    (-VOMIT_DECAY_RATE * purity).exp()
}

/// Probability for a purity level using the server-configured thresholds.
#[must_use]
pub fn vomit_chance_for(level: PurityLevel, config: &SyncedConfig) -> f64 {
    vomit_chance(f64::from(config.purity_threshold(level)))
}

/// Draw once against the vomit chance for `level`.
pub fn roll_vomit<R>(level: PurityLevel, config: &SyncedConfig, rng: &mut R) -> bool
where
    R: Rng + ?Sized,
{
    rng.r#gen::<f64>() < vomit_chance_for(level, config)
}

//! Purity classification for drinkable liquids.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Ordinal drinkability of a liquid, cleanest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PurityLevel {
    Pure,
    Filtered,
    Potable,
    Okay,
    Stagnant,
    Yuck,
}

/// Raised when a purity name or ordinal does not map onto [`PurityLevel`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid purity level '{0}'")]
pub struct InvalidPurityLevel(pub String);

impl PurityLevel {
    pub const ALL: [Self; 6] = [
        Self::Pure,
        Self::Filtered,
        Self::Potable,
        Self::Okay,
        Self::Stagnant,
        Self::Yuck,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Pure => "Pure",
            Self::Filtered => "Filtered",
            Self::Potable => "Potable",
            Self::Okay => "Okay",
            Self::Stagnant => "Stagnant",
            Self::Yuck => "Yuck",
        }
    }

    /// Euhydration gain multiplier applied on top of the raw hydration received.
    #[must_use]
    pub const fn euhydration_multiplier(self) -> f32 {
        match self {
            Self::Pure => 1.5,
            Self::Filtered => 1.3,
            Self::Potable => 1.2,
            Self::Okay => 1.0,
            Self::Stagnant => 0.5,
            Self::Yuck => 0.0,
        }
    }

    /// Guess the purity from an item code's variant suffix.
    ///
    /// `game:waterportion-boiled` reads as [`PurityLevel::Potable`]; codes
    /// without a recognised variant yield `None`.
    #[must_use]
    pub fn infer_from_code(code: &str) -> Option<Self> {
        let variant = code.rsplit('-').next()?;
        if variant == code {
            return None;
        }
        match variant {
            "pure" | "distilled" => Some(Self::Pure),
            "filtered" => Some(Self::Filtered),
            "boiled" | "potable" => Some(Self::Potable),
            "fresh" | "okay" => Some(Self::Okay),
            "stagnant" | "murky" => Some(Self::Stagnant),
            "rot" | "rotten" | "yuck" => Some(Self::Yuck),
            _ => None,
        }
    }
}

impl fmt::Display for PurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for PurityLevel {
    type Err = InvalidPurityLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|level| level.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| InvalidPurityLevel(s.to_string()))
    }
}

impl TryFrom<u8> for PurityLevel {
    type Error = InvalidPurityLevel;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .ok_or_else(|| InvalidPurityLevel(value.to_string()))
    }
}

//! Narrow interfaces to the host game.
//!
//! The core never talks to the engine directly; the host implements
//! [`EntityHost`] for each entity carrying the thirst behavior and calls into
//! the core when the entity ticks, eats, attacks or takes damage.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::stats::EntityStats;

/// Host-assigned entity identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GameMode {
    #[default]
    Survival,
    Creative,
    Spectator,
}

impl GameMode {
    /// Modes in which the entity neither gets thirsty nor takes thirst damage.
    #[must_use]
    pub const fn is_exempt(self) -> bool {
        matches!(self, Self::Creative | Self::Spectator)
    }
}

/// Input state sampled on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub tries_to_move: bool,
    pub jump: bool,
    pub left_mouse_down: bool,
    pub right_mouse_down: bool,
    pub sprint: bool,
}

impl Controls {
    /// Any input that counts as the entity being active.
    #[must_use]
    pub const fn is_active(self) -> bool {
        self.tries_to_move || self.jump || self.left_mouse_down || self.right_mouse_down
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageKind {
    Heat,
    Hunger,
    Heal,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageSource {
    Internal,
    Revive,
    Entity,
    Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Damage {
    pub kind: DamageKind,
    pub source: DamageSource,
    pub amount: f32,
}

impl Damage {
    #[must_use]
    pub const fn internal(kind: DamageKind, amount: f32) -> Self {
        Self {
            kind,
            source: DamageSource::Internal,
            amount,
        }
    }

    /// Full heal applied when a player is revived.
    #[must_use]
    pub const fn is_revive(&self) -> bool {
        matches!(self.kind, DamageKind::Heal) && matches!(self.source, DamageSource::Revive)
    }
}

/// Everything the thirst behavior needs from the entity and its world.
pub trait EntityHost {
    // Entity ---------------------------------------------------------------
    fn is_player(&self) -> bool;
    fn game_mode(&self) -> GameMode;
    fn controls(&self) -> Controls;
    fn stats(&self) -> &EntityStats;
    fn stats_mut(&mut self) -> &mut EntityStats;
    fn receive_damage(&mut self, damage: Damage);
    /// Hunger saturation when the entity also has a hunger behavior.
    fn hunger_saturation(&self) -> Option<f32>;
    fn set_hunger_saturation(&mut self, value: f32);
    fn set_max_health_modifier(&mut self, key: &str, value: f32);

    // World ----------------------------------------------------------------
    fn elapsed_ms(&self) -> u64;
    /// Calendar speed of time multiplied by the calendar speed multiplier.
    fn calendar_speed(&self) -> f32;
    /// Temperature in °C at the entity's position.
    fn temperature(&self) -> f32;
    /// Exterior exits of the room the entity stands in; `None` outdoors.
    fn room_exit_count(&self) -> Option<u32>;
    fn play_sound(&mut self, cue: &str, range: f32);

    /// Global hunger speed modifier of the world rules.
    fn global_hunger_speed(&self) -> f32 {
        1.0
    }

    /// Persisted thirst attributes changed and should be synced to observers.
    fn mark_dirty(&mut self) {}
}

/// Lookup of live entity hosts by id, implemented by the host world.
pub trait HostRegistry {
    type Host: EntityHost;

    fn host_mut(&mut self, id: EntityId) -> Option<&mut Self::Host>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revive_detection_needs_heal_and_revive() {
        let revive = Damage {
            kind: DamageKind::Heal,
            source: DamageSource::Revive,
            amount: 100.0,
        };
        assert!(revive.is_revive());
        assert!(!Damage::internal(DamageKind::Heal, 1.0).is_revive());
    }

    #[test]
    fn sprint_alone_is_not_activity() {
        let sprint = Controls {
            sprint: true,
            ..Controls::default()
        };
        assert!(!sprint.is_active());
        assert!(GameMode::Spectator.is_exempt());
        assert!(!GameMode::Survival.is_exempt());
    }
}

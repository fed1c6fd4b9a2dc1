//! Per-entity thirst state machine.
//!
//! [`ThirstBehavior`] owns one entity's [`ThirstState`] plus the transient
//! counters driving decay. The host calls into it on every tick, when the
//! entity consumes something, attacks, or takes damage. Work that must happen
//! later (vomiting, stat expiry) is queued on the behavior and collected by
//! the owning [`ThirstSystem`] with [`ThirstBehavior::take_scheduled`].
mod state;
mod system;

pub use state::{ThirstState, TypeAttributes};
pub use system::{ThirstSystem, derive_stream_seed};

use rand::Rng;
use smallvec::SmallVec;

use crate::config::ConfigServer;
use crate::constants::{
    ATTACK_HYDRATION_COST, DELAY_ABSORB_REFUND_SECS, DETOX_INTERVAL_SECS, DETOX_STEP,
    EUHYDRATION_GAIN_DIVISOR, EUHYDRATION_THRESHOLD_RATIO, HEALTH_MODIFIER_KEY,
    HEAT_RANGE_C, HEAT_RESIST_MODIFIER, HEAT_THRESHOLD_C, HUNGER_RATE_STAT,
    HUNGER_SPEED_DIVISOR, INTOXICATION_RESET_DELAY_MS, LOSS_SCALE, SALT_PENALTY_DURATION_MS,
    SALT_WATER_MODIFIER, SPRINT_BASE, SPRINT_SCALE, SPRINT_TICKS_PER_STEP, STILLNESS_DIVISOR,
    STILLNESS_THRESHOLD_MS, THIRST_RATE_STAT, THIRST_TICK_THRESHOLD_SECS, THIRSTY_MODIFIER,
    VOMIT_DELAY_MS, VOMIT_SATURATION_FACTOR, VOMIT_SOUND, VOMIT_SOUND_RANGE,
};
use crate::curves;
use crate::host::{Damage, DamageKind, EntityHost, GameMode};
use crate::hydration::HydrationProperties;
use crate::numbers::count_to_f32;
use crate::stats::BlendType;
use crate::timers::DeferredAction;
use crate::vomit::roll_vomit;

/// What a single [`ThirstBehavior::receive_hydration`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HydrationOutcome {
    /// Hydration actually added after clamping (negative for salty/dry food).
    pub applied: f32,
    pub euhydration_gained: f32,
    pub vomit_scheduled: bool,
}

/// Thirst behavior attached to one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ThirstBehavior {
    state: ThirstState,
    thirst_counter: f32,
    sprint_counter: u32,
    detox_counter: f32,
    last_move_ms: u64,
    scheduled: SmallVec<[(u64, DeferredAction); 4]>,
}

impl ThirstBehavior {
    /// Behavior around an existing state, counters zeroed.
    #[must_use]
    pub fn new(state: ThirstState) -> Self {
        Self {
            state,
            thirst_counter: 0.0,
            sprint_counter: 0,
            detox_counter: 0.0,
            last_move_ms: 0,
            scheduled: SmallVec::new(),
        }
    }

    /// Attach the behavior to an entity.
    ///
    /// A missing or zeroed stored tree is replaced by a fresh one built from
    /// the entity type's attributes. Registers the thirst and hunger rate
    /// stats and publishes the initial boosts.
    pub fn initialize<H: EntityHost + ?Sized>(
        stored: Option<ThirstState>,
        type_attributes: &TypeAttributes,
        host: &mut H,
        cfg: &ConfigServer,
    ) -> Self {
        let mut behavior = Self::new(ThirstState::restore_or_fresh(stored, type_attributes));
        behavior.last_move_ms = host.elapsed_ms();
        let stats = host.stats_mut();
        stats.register(THIRST_RATE_STAT, BlendType::WeightedSum);
        stats.register(HUNGER_RATE_STAT, BlendType::FlatMultiply);
        behavior.update_hunger_boost(host, cfg);
        behavior.update_health_boost(host);
        behavior
    }

    #[must_use]
    pub const fn state(&self) -> &ThirstState {
        &self.state
    }

    #[must_use]
    pub const fn sprint_counter(&self) -> u32 {
        self.sprint_counter
    }

    #[must_use]
    pub const fn thirst_counter(&self) -> f32 {
        self.thirst_counter
    }

    /// Deferred actions emitted since the last call, as `(delay_ms, action)`.
    pub fn take_scheduled(&mut self) -> SmallVec<[(u64, DeferredAction); 4]> {
        std::mem::take(&mut self.scheduled)
    }

    fn schedule(&mut self, delay_ms: u64, action: DeferredAction) {
        self.scheduled.push((delay_ms, action));
    }

    /// Advance the decay clock by `dt` seconds.
    pub fn on_tick<H: EntityHost + ?Sized>(&mut self, dt: f32, host: &mut H, cfg: &ConfigServer) {
        self.detox(dt);
        if host.is_player() {
            if host.game_mode().is_exempt() {
                return;
            }
            if host.controls().is_active() {
                self.last_move_ms = host.elapsed_ms();
            }
        }
        if host.controls().sprint {
            self.sprint_counter = self.sprint_counter.saturating_add(1);
        }
        self.thirst_counter += dt;
        if self.thirst_counter <= THIRST_TICK_THRESHOLD_SECS {
            return;
        }

        let idle_ms = host.elapsed_ms().saturating_sub(self.last_move_ms);
        let mut base = host.global_hunger_speed() / HUNGER_SPEED_DIVISOR;
        if idle_ms > STILLNESS_THRESHOLD_MS {
            base /= STILLNESS_DIVISOR;
        }
        let sprint = SPRINT_SCALE
            * (SPRINT_BASE + count_to_f32(self.sprint_counter) / SPRINT_TICKS_PER_STEP)
            / LOSS_SCALE;
        let rate = host.stats().blended(THIRST_RATE_STAT);
        let amount = base * sprint * rate * host.calendar_speed();
        log::debug!(
            "thirst decay: amount={amount:.4} idle_ms={idle_ms} sprint={} rate={rate:.2}",
            self.sprint_counter
        );
        self.reduce_hydration(amount, host, cfg);
        self.thirst_counter = 0.0;
        self.sprint_counter = 0;
        self.detox(dt);
    }

    /// Apply one unit of thirst loss.
    ///
    /// While a loss delay remains it absorbs the loss (and the call returns
    /// `true`). Below 60 % hydration euhydration drains at a tenth of the
    /// hydration rate.
    pub fn reduce_hydration<H: EntityHost + ?Sized>(
        &mut self,
        amount: f32,
        host: &mut H,
        cfg: &ConfigServer,
    ) -> bool {
        let configured = cfg.synced.thirst_speed_modifier;
        let speed = if configured.abs() < f32::EPSILON {
            host.global_hunger_speed()
        } else {
            configured
        };
        let amount = amount * speed;

        let absorbed = self.state.hydration_loss_delay > 0.0;
        if absorbed {
            self.state.hydration_loss_delay -= LOSS_SCALE * amount;
            self.thirst_counter -= DELAY_ABSORB_REFUND_SECS;
        } else {
            if self.state.hydration
                < EUHYDRATION_THRESHOLD_RATIO * self.state.max_hydration
            {
                self.state.euhydration = (self.state.euhydration - amount).max(0.0);
            }
            if self.state.hydration > 0.0 {
                self.state.hydration = (self.state.hydration - amount * LOSS_SCALE).max(0.0);
                self.sprint_counter = 0;
            }
        }
        self.update_hunger_boost(host, cfg);
        self.update_health_boost(host);
        host.mark_dirty();
        absorbed
    }

    /// Spend hydration on an exertion; `amount` is in hydration points.
    pub fn consume_hydration<H: EntityHost + ?Sized>(
        &mut self,
        amount: f32,
        host: &mut H,
        cfg: &ConfigServer,
    ) -> bool {
        self.reduce_hydration(amount / LOSS_SCALE, host, cfg)
    }

    /// The entity landed an attack.
    pub fn did_attack<H: EntityHost + ?Sized>(&mut self, host: &mut H, cfg: &ConfigServer) {
        self.consume_hydration(ATTACK_HYDRATION_COST, host, cfg);
    }

    /// Wear off intoxication once per accumulated second.
    pub fn detox(&mut self, dt: f32) {
        self.detox_counter += dt;
        if self.detox_counter <= DETOX_INTERVAL_SECS {
            return;
        }
        if self.state.intoxication > 0.0 {
            self.state.intoxication = (self.state.intoxication - DETOX_STEP).max(0.0);
        }
        self.detox_counter = 0.0;
    }

    /// Apply the hydration of a consumed item.
    pub fn receive_hydration<H, R>(
        &mut self,
        props: &HydrationProperties,
        host: &mut H,
        cfg: &ConfigServer,
        rng: &mut R,
    ) -> HydrationOutcome
    where
        H: EntityHost + ?Sized,
        R: Rng + ?Sized,
    {
        let max = self.state.max_hydration;
        let was_maxed = self.state.is_maxed();
        let before = self.state.hydration;
        self.state.hydration = (before + props.hydration).clamp(0.0, max);
        if !was_maxed {
            self.state.hydration_loss_delay =
                self.state.hydration_loss_delay.max(props.hydration_loss_delay);
        }
        let mut outcome = HydrationOutcome {
            applied: self.state.hydration - before,
            ..HydrationOutcome::default()
        };

        if roll_vomit(props.purity, &cfg.synced, rng) {
            self.state.intoxication = 1.0;
            self.schedule(VOMIT_DELAY_MS, DeferredAction::Vomit);
            outcome.vomit_scheduled = true;
        }
        if props.salty {
            host.stats_mut().set(
                THIRST_RATE_STAT,
                SALT_WATER_MODIFIER,
                cfg.salt_water_thirst_penalty,
            );
            self.schedule(
                SALT_PENALTY_DURATION_MS,
                DeferredAction::RemoveStat {
                    category: THIRST_RATE_STAT.to_string(),
                    code: SALT_WATER_MODIFIER.to_string(),
                },
            );
        }
        if props.scalding {
            host.receive_damage(Damage::internal(DamageKind::Heat, cfg.scalding_damage));
        }

        self.update_hunger_boost(host, cfg);
        if !was_maxed {
            let gain = if props.salty {
                0.0
            } else {
                props.purity.euhydration_multiplier() / EUHYDRATION_GAIN_DIVISOR
            };
            let before_eu = self.state.euhydration;
            self.state.euhydration =
                (before_eu + gain * props.hydration.max(0.0)).clamp(0.0, max);
            outcome.euhydration_gained = self.state.euhydration - before_eu;
            self.update_health_boost(host);
        }
        host.mark_dirty();
        outcome
    }

    /// Throw up: lose hydration, euhydration and half the hunger saturation.
    pub fn vomit<H: EntityHost + ?Sized>(&mut self, host: &mut H, cfg: &ConfigServer) {
        self.state.hydration *= cfg.synced.vomit_hydration_multiplier;
        self.state.hydration_loss_delay = 0.0;
        self.state.euhydration *= cfg.synced.vomit_euhydration_multiplier;
        if let Some(saturation) = host.hunger_saturation() {
            host.set_hunger_saturation(saturation * VOMIT_SATURATION_FACTOR);
        }
        host.play_sound(VOMIT_SOUND, VOMIT_SOUND_RANGE);
        self.schedule(
            INTOXICATION_RESET_DELAY_MS,
            DeferredAction::ResetIntoxication,
        );
        self.update_hunger_boost(host, cfg);
        self.update_health_boost(host);
        host.mark_dirty();
    }

    pub fn reset_intoxication(&mut self) {
        self.state.intoxication = 0.0;
    }

    /// Run a deferred action that came due for this entity.
    pub fn apply_deferred<H: EntityHost + ?Sized>(
        &mut self,
        action: &DeferredAction,
        host: &mut H,
        cfg: &ConfigServer,
    ) {
        match action {
            DeferredAction::Vomit => self.vomit(host, cfg),
            DeferredAction::RemoveStat { category, code } => {
                host.stats_mut().remove(category, code);
            }
            DeferredAction::ResetIntoxication => self.reset_intoxication(),
        }
    }

    /// Hunger-rate multiplier for the current hydration ratio.
    #[must_use]
    pub fn hunger_modifier(&self, cfg: &ConfigServer) -> f32 {
        curves::hunger_modifier(
            cfg.synced.hunger_buff_curve,
            cfg.synced.lower_half_hunger_buff_curve,
            self.state.hydration_ratio(),
            cfg.synced.hunger_buff_max,
        )
    }

    /// Environmental update on the slow cadence: heat and dehydration damage.
    pub fn slow_tick<H: EntityHost + ?Sized>(&mut self, host: &mut H, cfg: &ConfigServer) {
        if host.is_player() && host.game_mode() == GameMode::Creative {
            return;
        }
        let temperature = host.temperature();
        if temperature <= HEAT_THRESHOLD_C {
            host.stats_mut().remove(THIRST_RATE_STAT, HEAT_RESIST_MODIFIER);
        } else {
            let heat = if host.room_exit_count() == Some(0) {
                0.0
            } else {
                (temperature - HEAT_THRESHOLD_C).clamp(0.0, HEAT_RANGE_C) / HEAT_RANGE_C
            };
            host.stats_mut()
                .set(THIRST_RATE_STAT, HEAT_RESIST_MODIFIER, heat);
        }

        if self.state.hydration > 0.0 {
            return;
        }
        if cfg.synced.thirst_kills {
            host.receive_damage(Damage::internal(DamageKind::Hunger, cfg.thirst_damage));
        }
        self.sprint_counter = 0;
        self.update_hunger_boost(host, cfg);
        self.update_health_boost(host);
    }

    /// Revival resets the entity to half hydration.
    pub fn on_damage<H: EntityHost + ?Sized>(&mut self, damage: &Damage, host: &mut H) {
        if !damage.is_revive() {
            return;
        }
        let half = self.state.max_hydration / 2.0;
        self.state.hydration_loss_delay = half;
        self.state.hydration = half;
        self.state.euhydration /= 2.0;
        host.mark_dirty();
    }

    fn update_hunger_boost<H: EntityHost + ?Sized>(&self, host: &mut H, cfg: &ConfigServer) {
        let modifier = self.hunger_modifier(cfg);
        host.stats_mut()
            .set(HUNGER_RATE_STAT, THIRSTY_MODIFIER, modifier);
    }

    fn update_health_boost<H: EntityHost + ?Sized>(&self, host: &mut H) {
        let boost = if self.state.max_hydration > 0.0 {
            self.state.euhydration / self.state.max_hydration
        } else {
            0.0
        };
        host.set_max_health_modifier(HEALTH_MODIFIER_KEY, boost);
    }
}

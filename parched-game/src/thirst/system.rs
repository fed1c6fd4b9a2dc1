use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use sha2::Sha256;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::Path;

use super::{HydrationOutcome, ThirstBehavior, ThirstState, TypeAttributes};
use crate::config::{ConfigError, ConfigServer};
use crate::consumption::{ConsumptionDecision, ConsumptionEvent, ConsumptionHook, HydrationHook};
use crate::constants::SLOW_TICK_INTERVAL_MS;
use crate::host::{Damage, EntityHost, EntityId, HostRegistry};
use crate::hydration::HydrationProperties;
use crate::merger::ConfigMerger;
use crate::numbers::secs_to_millis;
use crate::table::HydrationTable;
use crate::timers::TimerQueue;

/// Derive the RNG seed of one entity's vomit stream from the world seed.
#[must_use]
pub fn derive_stream_seed(world_seed: u64, entity: EntityId) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&world_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(b"thirst");
    mac.update(&entity.0.to_le_bytes());
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

#[derive(Debug)]
struct Tracked {
    behavior: ThirstBehavior,
    rng: SmallRng,
    slow_tick_ms: u64,
}

/// All thirst behaviors of one simulation side plus their deferred actions.
#[derive(Debug)]
pub struct ThirstSystem {
    table: HydrationTable,
    world_seed: u64,
    entities: BTreeMap<EntityId, Tracked>,
    timers: TimerQueue,
    now_ms: u64,
}

impl ThirstSystem {
    #[must_use]
    pub fn new(table: HydrationTable, world_seed: u64) -> Self {
        Self {
            table,
            world_seed,
            entities: BTreeMap::new(),
            timers: TimerQueue::new(),
            now_ms: 0,
        }
    }

    /// Load the hydration table from `config_dir` and start an empty side.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the patch files cannot be read or written;
    /// no system exists until the table loaded completely.
    pub fn start(config_dir: &Path, world_seed: u64) -> Result<Self, ConfigError> {
        let table = ConfigMerger::new(config_dir).load_and_merge()?;
        Ok(Self::new(table, world_seed))
    }

    #[must_use]
    pub const fn table(&self) -> &HydrationTable {
        &self.table
    }

    /// Re-merge the patch files; the old table stays active on failure.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] from the merge.
    pub fn reload_table(&mut self) -> Result<(), ConfigError> {
        self.table.reload()
    }

    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    #[must_use]
    pub fn behavior(&self, id: EntityId) -> Option<&ThirstBehavior> {
        self.entities.get(&id).map(|tracked| &tracked.behavior)
    }

    #[must_use]
    pub fn pending_timers(&self, id: EntityId) -> usize {
        self.timers.pending_for(id)
    }

    /// Attach a thirst behavior to a newly spawned or loaded entity.
    pub fn spawn<H: EntityHost + ?Sized>(
        &mut self,
        id: EntityId,
        stored: Option<ThirstState>,
        type_attributes: &TypeAttributes,
        host: &mut H,
        cfg: &ConfigServer,
    ) -> &ThirstBehavior {
        let behavior = ThirstBehavior::initialize(stored, type_attributes, host, cfg);
        log::debug!("thirst attached to {id}: {:?}", behavior.state());
        let tracked = Tracked {
            behavior,
            rng: SmallRng::seed_from_u64(derive_stream_seed(self.world_seed, id)),
            slow_tick_ms: 0,
        };
        self.timers.cancel_entity(id);
        let slot = match self.entities.entry(id) {
            Entry::Vacant(vacant) => vacant.insert(tracked),
            Entry::Occupied(occupied) => {
                let slot = occupied.into_mut();
                *slot = tracked;
                slot
            }
        };
        &slot.behavior
    }

    /// Detach an entity, cancelling its pending timers. Returns the state to
    /// persist.
    pub fn despawn(&mut self, id: EntityId) -> Option<ThirstState> {
        let cancelled = self.timers.cancel_entity(id);
        if cancelled > 0 {
            log::debug!("cancelled {cancelled} pending thirst timers for {id}");
        }
        self.entities
            .remove(&id)
            .map(|tracked| *tracked.behavior.state())
    }

    /// Advance every behavior by `dt` seconds, run slow ticks on their
    /// cadence, then fire timers that came due.
    pub fn tick<R: HostRegistry + ?Sized>(&mut self, dt: f32, hosts: &mut R, cfg: &ConfigServer) {
        let step_ms = secs_to_millis(dt);
        self.now_ms = self.now_ms.saturating_add(step_ms);
        let now = self.now_ms;

        for (&id, tracked) in &mut self.entities {
            let Some(host) = hosts.host_mut(id) else {
                continue;
            };
            tracked.behavior.on_tick(dt, host, cfg);
            tracked.slow_tick_ms = tracked.slow_tick_ms.saturating_add(step_ms);
            while tracked.slow_tick_ms >= SLOW_TICK_INTERVAL_MS {
                tracked.slow_tick_ms -= SLOW_TICK_INTERVAL_MS;
                tracked.behavior.slow_tick(host, cfg);
            }
            enqueue(&mut self.timers, id, now, &mut tracked.behavior);
        }

        for (id, action) in self.timers.pop_due(now) {
            let Some(tracked) = self.entities.get_mut(&id) else {
                log::debug!("dropping {action:?} for unknown {id}");
                continue;
            };
            let Some(host) = hosts.host_mut(id) else {
                log::debug!("{id} has no host this tick, holding {action:?}");
                self.timers.schedule(id, now, 0, action);
                continue;
            };
            tracked.behavior.apply_deferred(&action, host, cfg);
            enqueue(&mut self.timers, id, now, &mut tracked.behavior);
        }
    }

    /// Run `portion` of `item` through the [`HydrationHook`] and apply what
    /// it annotates.
    ///
    /// Returns `None` when the hook lets the item through untouched or
    /// vetoes it, or when the entity is unknown.
    pub fn consume<H: EntityHost + ?Sized>(
        &mut self,
        id: EntityId,
        item: &str,
        portion: f32,
        host: &mut H,
        cfg: &ConfigServer,
    ) -> Option<HydrationOutcome> {
        let decision = HydrationHook::new(&self.table, &cfg.synced).before_consume(
            &ConsumptionEvent {
                entity: id,
                item_code: item,
                portion,
            },
        );
        match decision {
            ConsumptionDecision::Annotate(props) => self.receive(id, &props, host, cfg),
            ConsumptionDecision::Veto(reason) => {
                log::debug!("{id} consume vetoed: {reason}");
                None
            }
            ConsumptionDecision::Proceed => None,
        }
    }

    /// Apply already-resolved hydration properties to an entity.
    pub fn receive<H: EntityHost + ?Sized>(
        &mut self,
        id: EntityId,
        props: &HydrationProperties,
        host: &mut H,
        cfg: &ConfigServer,
    ) -> Option<HydrationOutcome> {
        let tracked = self.entities.get_mut(&id)?;
        let outcome = tracked
            .behavior
            .receive_hydration(props, host, cfg, &mut tracked.rng);
        enqueue(&mut self.timers, id, self.now_ms, &mut tracked.behavior);
        Some(outcome)
    }

    pub fn did_attack<H: EntityHost + ?Sized>(
        &mut self,
        id: EntityId,
        host: &mut H,
        cfg: &ConfigServer,
    ) {
        if let Some(tracked) = self.entities.get_mut(&id) {
            tracked.behavior.did_attack(host, cfg);
        }
    }

    pub fn on_damage<H: EntityHost + ?Sized>(&mut self, id: EntityId, damage: &Damage, host: &mut H) {
        if let Some(tracked) = self.entities.get_mut(&id) {
            tracked.behavior.on_damage(damage, host);
        }
    }
}

fn enqueue(timers: &mut TimerQueue, id: EntityId, now_ms: u64, behavior: &mut ThirstBehavior) {
    for (delay_ms, action) in behavior.take_scheduled() {
        timers.schedule(id, now_ms, delay_ms, action);
    }
}

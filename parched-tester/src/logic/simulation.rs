use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use parched_game::constants::{ADMIN_PRIVILEGE, THIRST_ATTRIBUTE_KEY, THIRST_RATE_STAT, VOMIT_SOUND};
use parched_game::{
    AttributeStore, ClientConfigSync, ClientId, ConfigClient, ConfigMessage, Consumed, Controls,
    Damage, DamageKind, DamageSource, EntityHost, EntityId, EntityStats, GameMode, HostRegistry,
    Outbox, SideState, SyncError, SyncedConfig, ThirstEngine, ThirstState, TypeAttributes,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Seconds of game time per simulated tick.
pub const TICK_SECS: f32 = 1.0;
/// Calendar speed of a default world (60x real time).
pub const CALENDAR_SPEED: f32 = 60.0;
const TICK_MS: u64 = 1000;
const MAX_HEALTH: f32 = 15.0;
const PLAYER: EntityId = EntityId(1);
const ADMIN: ClientId = ClientId(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activity {
    Idle,
    Walking,
    Sprinting,
}

impl Activity {
    const fn controls(self) -> Controls {
        Controls {
            tries_to_move: !matches!(self, Self::Idle),
            jump: false,
            left_mouse_down: false,
            right_mouse_down: false,
            sprint: matches!(self, Self::Sprinting),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    pub temperature: f32,
    pub enclosed: bool,
}

impl Environment {
    pub const TEMPERATE: Self = Self {
        temperature: 20.0,
        enclosed: false,
    };
    pub const DESERT: Self = Self {
        temperature: 50.0,
        enclosed: false,
    };
}

/// Something the player drinks on a fixed cadence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drink {
    pub every_ticks: u32,
    pub item: &'static str,
    pub portion: f32,
}

pub type Expectation = fn(&SimulationSummary) -> Result<()>;

/// What a single simulated run does.
#[derive(Clone)]
pub struct SimulationPlan {
    pub ticks: u32,
    pub activity: Activity,
    pub environment: Environment,
    pub drink: Option<Drink>,
    pub attack_every: Option<u32>,
    pub clients: u64,
    pub admin_override: Option<fn(&mut SyncedConfig)>,
    pub reload_at: Option<u32>,
    pub expectations: Vec<Expectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(ticks: u32) -> Self {
        Self {
            ticks,
            activity: Activity::Idle,
            environment: Environment::TEMPERATE,
            drink: None,
            attack_every: None,
            clients: 1,
            admin_override: None,
            reload_at: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.activity = activity;
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    #[must_use]
    pub fn with_drink(mut self, item: &'static str, every_ticks: u32, portion: f32) -> Self {
        self.drink = Some(Drink {
            every_ticks,
            item,
            portion,
        });
        self
    }

    #[must_use]
    pub fn with_attacks(mut self, every_ticks: u32) -> Self {
        self.attack_every = Some(every_ticks);
        self
    }

    #[must_use]
    pub fn with_clients(mut self, clients: u64) -> Self {
        self.clients = clients;
        self
    }

    #[must_use]
    pub fn with_admin_override(mut self, edit: fn(&mut SyncedConfig)) -> Self {
        self.admin_override = Some(edit);
        self
    }

    #[must_use]
    pub fn with_reload_at(mut self, tick: u32) -> Self {
        self.reload_at = Some(tick);
        self
    }

    #[must_use]
    pub fn expect(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }
}

impl std::fmt::Debug for SimulationPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationPlan")
            .field("ticks", &self.ticks)
            .field("activity", &self.activity)
            .field("environment", &self.environment)
            .field("drink", &self.drink)
            .field("attack_every", &self.attack_every)
            .field("clients", &self.clients)
            .field("expectations", &self.expectations.len())
            .finish_non_exhaustive()
    }
}

/// Everything observed during one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationSummary {
    pub seed: u64,
    pub ticks_run: u32,
    pub final_state: ThirstState,
    pub min_hydration: f32,
    pub final_thirst_rate: f32,
    pub drinks_hydrated: u32,
    pub drinks_ignored: u32,
    pub drinks_vetoed: u32,
    pub hydration_applied: f32,
    pub damage_taken: f32,
    pub thirst_damage_events: u32,
    pub heat_damage_events: u32,
    pub vomits: u32,
    pub revives: u32,
    pub attacks: u32,
    pub clients_synced: usize,
    pub replicas_in_sync: bool,
    pub rejected_pushes: u32,
    pub reloads: u32,
    pub persisted: bool,
}

/// Simulated player standing in for a host entity.
#[derive(Debug)]
pub struct SimCreature {
    stats: EntityStats,
    controls: Controls,
    now_ms: u64,
    temperature: f32,
    enclosed: bool,
    health: f32,
    saturation: f32,
    health_modifier: f32,
    damage_taken: f32,
    thirst_damage_events: u32,
    heat_damage_events: u32,
    vomits: u32,
}

impl SimCreature {
    fn new(activity: Activity, environment: Environment) -> Self {
        Self {
            stats: EntityStats::new(),
            controls: activity.controls(),
            now_ms: 0,
            temperature: environment.temperature,
            enclosed: environment.enclosed,
            health: MAX_HEALTH,
            saturation: 1200.0,
            health_modifier: 0.0,
            damage_taken: 0.0,
            thirst_damage_events: 0,
            heat_damage_events: 0,
            vomits: 0,
        }
    }

    fn is_dead(&self) -> bool {
        self.health <= 0.0
    }
}

impl EntityHost for SimCreature {
    fn is_player(&self) -> bool {
        true
    }

    fn game_mode(&self) -> GameMode {
        GameMode::Survival
    }

    fn controls(&self) -> Controls {
        self.controls
    }

    fn stats(&self) -> &EntityStats {
        &self.stats
    }

    fn stats_mut(&mut self) -> &mut EntityStats {
        &mut self.stats
    }

    fn receive_damage(&mut self, damage: Damage) {
        if damage.kind == DamageKind::Heal {
            self.health = (self.health + damage.amount).min(MAX_HEALTH + self.health_modifier);
            return;
        }
        match damage.kind {
            DamageKind::Hunger => self.thirst_damage_events += 1,
            DamageKind::Heat => self.heat_damage_events += 1,
            DamageKind::Heal | DamageKind::Other => {}
        }
        self.health -= damage.amount;
        self.damage_taken += damage.amount;
    }

    fn hunger_saturation(&self) -> Option<f32> {
        Some(self.saturation)
    }

    fn set_hunger_saturation(&mut self, value: f32) {
        self.saturation = value;
    }

    fn set_max_health_modifier(&mut self, _key: &str, value: f32) {
        self.health_modifier = value;
    }

    fn elapsed_ms(&self) -> u64 {
        self.now_ms
    }

    fn calendar_speed(&self) -> f32 {
        CALENDAR_SPEED
    }

    fn temperature(&self) -> f32 {
        self.temperature
    }

    fn room_exit_count(&self) -> Option<u32> {
        self.enclosed.then_some(0)
    }

    fn play_sound(&mut self, cue: &str, _range: f32) {
        if cue == VOMIT_SOUND {
            self.vomits += 1;
        }
    }
}

#[derive(Debug, Default)]
struct SimWorld {
    creatures: BTreeMap<EntityId, SimCreature>,
}

impl SimWorld {
    fn advance(&mut self, step_ms: u64) {
        for creature in self.creatures.values_mut() {
            creature.now_ms += step_ms;
        }
    }

    fn player(&mut self) -> Result<&mut SimCreature> {
        self.creatures
            .get_mut(&PLAYER)
            .context("simulated player vanished")
    }
}

impl HostRegistry for SimWorld {
    type Host = SimCreature;

    fn host_mut(&mut self, id: EntityId) -> Option<&mut SimCreature> {
        self.creatures.get_mut(&id)
    }
}

/// In-memory attribute trees shared with the engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    trees: Rc<RefCell<HashMap<(EntityId, String), serde_json::Value>>>,
}

impl AttributeStore for MemoryStore {
    type Error = Infallible;

    fn load_tree(&self, entity: EntityId, key: &str) -> Result<Option<serde_json::Value>, Infallible> {
        Ok(self.trees.borrow().get(&(entity, key.to_string())).cloned())
    }

    fn save_tree(&self, entity: EntityId, key: &str, tree: &serde_json::Value) -> Result<(), Infallible> {
        self.trees
            .borrow_mut()
            .insert((entity, key.to_string()), tree.clone());
        Ok(())
    }
}

/// Loopback connection between the engine and its simulated clients.
struct ClientLink {
    wire: Outbox,
    clients: Vec<(ClientId, ClientConfigSync)>,
    rejected_pushes: u32,
}

impl ClientLink {
    fn connect(engine: &mut ThirstEngine<MemoryStore>, count: u64) -> Result<Self> {
        let mut link = Self {
            wire: Outbox::default(),
            clients: Vec::new(),
            rejected_pushes: 0,
        };
        for idx in 0..count {
            let id = ClientId(idx);
            let privileges: &[&str] = if id == ADMIN { &[ADMIN_PRIVILEGE] } else { &[] };
            engine.client_join(id, &format!("client{idx}"), privileges, &mut link.wire)?;
            link.clients
                .push((id, ClientConfigSync::with_config(ConfigClient::default())));
        }
        link.deliver()?;
        Ok(link)
    }

    fn deliver(&mut self) -> Result<()> {
        for (id, client) in &mut self.clients {
            for packet in self.wire.take_for(Some(*id)) {
                client.on_message(&packet)?;
            }
            client.take_events();
        }
        Ok(())
    }

    fn admin_push(
        &mut self,
        engine: &mut ThirstEngine<MemoryStore>,
        edit: fn(&mut SyncedConfig),
    ) -> Result<()> {
        let (_, admin) = self
            .clients
            .first_mut()
            .context("admin override needs at least one client")?;
        let mut snapshot = admin.synced().clone();
        edit(&mut snapshot);
        admin.admin_push(snapshot, &mut self.wire)?;
        for packet in self.wire.take_for(None) {
            engine.on_message(ADMIN, &packet, &mut self.wire)?;
        }
        self.deliver()
    }

    /// A player without the admin privilege tries to switch thirst damage off.
    fn probe_unauthorized(&mut self, engine: &mut ThirstEngine<MemoryStore>) -> Result<()> {
        let Some((id, client)) = self.clients.get(1) else {
            return Ok(());
        };
        let mut forged = client.synced().clone();
        forged.thirst_kills = !forged.thirst_kills;
        let payload = ConfigMessage::Snapshot(forged).encode()?;
        match engine.on_message(*id, &payload, &mut self.wire) {
            Err(SyncError::UnauthorizedConfigPush { .. }) => {
                self.rejected_pushes += 1;
                Ok(())
            }
            Err(err) => Err(err.into()),
            Ok(()) => anyhow::bail!("unprivileged push from {id} was accepted"),
        }
    }

    fn synced_count(&self) -> usize {
        self.clients
            .iter()
            .filter(|(_, client)| client.state() == SideState::Synced)
            .count()
    }

    fn in_sync(&self, expected: &SyncedConfig) -> bool {
        self.clients
            .iter()
            .all(|(_, client)| client.synced() == expected)
    }
}

/// Run `plan` once against a fresh engine loaded from `config_dir`.
///
/// # Errors
///
/// Returns an error if the engine cannot start or the config session breaks.
pub fn run_plan(plan: &SimulationPlan, seed: u64, config_dir: &Path) -> Result<SimulationSummary> {
    let store = MemoryStore::default();
    let mut engine = ThirstEngine::start(config_dir, seed, store.clone())
        .with_context(|| format!("failed to start engine from {}", config_dir.display()))?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut environment = plan.environment;
    environment.temperature += rng.gen_range(-1.5_f32..=1.5);
    let mut world = SimWorld::default();
    world
        .creatures
        .insert(PLAYER, SimCreature::new(plan.activity, environment));
    engine.spawn(PLAYER, &TypeAttributes::default(), world.player()?)?;

    let mut link = ClientLink::connect(&mut engine, plan.clients)?;
    if let Some(edit) = plan.admin_override {
        link.admin_push(&mut engine, edit)?;
    }
    link.probe_unauthorized(&mut engine)?;

    let mut summary = SimulationSummary {
        seed,
        min_hydration: engine
            .system()
            .behavior(PLAYER)
            .map_or(0.0, |behavior| behavior.state().hydration),
        ..SimulationSummary::default()
    };

    for tick in 1..=plan.ticks {
        world.advance(TICK_MS);
        engine.tick(TICK_SECS, &mut world);
        let player = world.player()?;

        if let Some(drink) = plan.drink
            && tick % drink.every_ticks == 0
        {
            match engine.consume(PLAYER, drink.item, drink.portion, player) {
                Consumed::Hydrated(outcome) => {
                    summary.drinks_hydrated += 1;
                    summary.hydration_applied += outcome.applied;
                }
                Consumed::Ignored => summary.drinks_ignored += 1,
                Consumed::Vetoed(reason) => {
                    log::debug!("drink vetoed: {reason}");
                    summary.drinks_vetoed += 1;
                }
            }
        }
        if let Some(every) = plan.attack_every
            && tick % every == 0
        {
            engine.did_attack(PLAYER, player);
            summary.attacks += 1;
        }
        if player.is_dead() {
            let revive = Damage {
                kind: DamageKind::Heal,
                source: DamageSource::Revive,
                amount: MAX_HEALTH,
            };
            player.receive_damage(revive);
            engine.on_damage(PLAYER, &revive, player);
            summary.revives += 1;
            log::debug!("player revived at tick {tick}");
        }
        if plan.reload_at == Some(tick) {
            engine.reload(&mut link.wire)?;
            link.deliver()?;
            summary.reloads += 1;
        }

        if let Some(behavior) = engine.system().behavior(PLAYER) {
            summary.min_hydration = summary.min_hydration.min(behavior.state().hydration);
        }
        summary.ticks_run = tick;
    }

    let player = world.player()?;
    summary.final_thirst_rate = player.stats.blended(THIRST_RATE_STAT);
    summary.damage_taken = player.damage_taken;
    summary.thirst_damage_events = player.thirst_damage_events;
    summary.heat_damage_events = player.heat_damage_events;
    summary.vomits = player.vomits;

    summary.clients_synced = link.synced_count();
    summary.replicas_in_sync = link.in_sync(&engine.sync().snapshot());
    summary.rejected_pushes = link.rejected_pushes;

    summary.final_state = engine
        .despawn(PLAYER)?
        .context("player was not tracked at despawn")?;
    let persisted = store
        .load_tree(PLAYER, THIRST_ATTRIBUTE_KEY)?
        .as_ref()
        .and_then(ThirstState::from_attributes);
    summary.persisted = persisted == Some(summary.final_state);
    Ok(summary)
}

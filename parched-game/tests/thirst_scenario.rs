use std::collections::BTreeMap;

use parched_game::constants::{SALT_WATER_MODIFIER, THIRST_RATE_STAT};
use parched_game::{
    ConfigMerger, ConfigServer, Controls, Damage, DamageKind, EntityHost, EntityId, EntityStats,
    GameMode, HostRegistry, HydrationProperties, PurityLevel, ThirstState, ThirstSystem,
    TypeAttributes,
};

#[derive(Debug, Default)]
struct Creature {
    stats: EntityStats,
    damage: Vec<Damage>,
    saturation: Option<f32>,
    sounds: usize,
    now_ms: u64,
}

impl EntityHost for Creature {
    fn is_player(&self) -> bool {
        true
    }
    fn game_mode(&self) -> GameMode {
        GameMode::Survival
    }
    fn controls(&self) -> Controls {
        Controls::default()
    }
    fn stats(&self) -> &EntityStats {
        &self.stats
    }
    fn stats_mut(&mut self) -> &mut EntityStats {
        &mut self.stats
    }
    fn receive_damage(&mut self, damage: Damage) {
        self.damage.push(damage);
    }
    fn hunger_saturation(&self) -> Option<f32> {
        self.saturation
    }
    fn set_hunger_saturation(&mut self, value: f32) {
        self.saturation = Some(value);
    }
    fn set_max_health_modifier(&mut self, _key: &str, _value: f32) {}
    fn elapsed_ms(&self) -> u64 {
        self.now_ms
    }
    fn calendar_speed(&self) -> f32 {
        1.0
    }
    fn temperature(&self) -> f32 {
        20.0
    }
    fn room_exit_count(&self) -> Option<u32> {
        None
    }
    fn play_sound(&mut self, _cue: &str, _range: f32) {
        self.sounds += 1;
    }
}

#[derive(Debug, Default)]
struct World {
    creatures: BTreeMap<EntityId, Creature>,
}

impl HostRegistry for World {
    type Host = Creature;

    fn host_mut(&mut self, id: EntityId) -> Option<&mut Creature> {
        self.creatures.get_mut(&id)
    }
}

const ALICE: EntityId = EntityId(1);

fn setup(stored: Option<ThirstState>) -> (ThirstSystem, World) {
    let dir = std::env::temp_dir().join(format!(
        "parched-scenario-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ));
    let table = ConfigMerger::new(&dir).load_and_merge().unwrap();
    std::fs::remove_dir_all(&dir).ok();
    let mut system = ThirstSystem::new(table, 0xC0FFEE);
    let mut world = World::default();
    let creature = world.creatures.entry(ALICE).or_default();
    creature.saturation = Some(1000.0);
    system.spawn(
        ALICE,
        stored,
        &TypeAttributes::default(),
        creature,
        &ConfigServer::default(),
    );
    (system, world)
}

fn always_vomit() -> ConfigServer {
    let mut cfg = ConfigServer::default();
    cfg.synced.rot_purity_level = 0.0;
    cfg
}

fn never_vomit() -> ConfigServer {
    let mut cfg = ConfigServer::default();
    let synced = &mut cfg.synced;
    for level in [
        &mut synced.pure_purity_level,
        &mut synced.filtered_purity_level,
        &mut synced.boiled_purity_level,
        &mut synced.okay_purity_level,
        &mut synced.stagnant_purity_level,
        &mut synced.rot_purity_level,
    ] {
        *level = 100.0;
    }
    cfg
}

fn hydration(system: &ThirstSystem) -> f32 {
    system.behavior(ALICE).unwrap().state().hydration
}

#[test]
fn vomit_fires_two_seconds_after_drinking_rot() {
    let (mut system, mut world) = setup(None);
    let cfg = always_vomit();
    let host = world.creatures.get_mut(&ALICE).unwrap();
    let outcome = system
        .receive(ALICE, &HydrationProperties::new(100.0, PurityLevel::Yuck), host, &cfg)
        .unwrap();
    assert!(outcome.vomit_scheduled);
    assert_eq!(system.pending_timers(ALICE), 1);

    system.tick(1.0, &mut world, &cfg);
    assert!((hydration(&system) - 1500.0).abs() < 1e-3);
    system.tick(1.0, &mut world, &cfg);
    assert!((hydration(&system) - 750.0).abs() < 1e-3);
    let creature = &world.creatures[&ALICE];
    assert_eq!(creature.sounds, 1);
    assert_eq!(creature.saturation, Some(500.0));

    // Intoxication resets five seconds after vomiting.
    assert_eq!(system.pending_timers(ALICE), 1);
    for _ in 0..5 {
        system.tick(1.0, &mut world, &cfg);
    }
    assert_eq!(system.pending_timers(ALICE), 0);
    assert!(system.behavior(ALICE).unwrap().state().intoxication.abs() < f32::EPSILON);
}

#[test]
fn vomit_waits_for_a_missing_host_instead_of_being_lost() {
    let (mut system, mut world) = setup(None);
    let cfg = always_vomit();
    let host = world.creatures.get_mut(&ALICE).unwrap();
    system.receive(ALICE, &HydrationProperties::new(100.0, PurityLevel::Yuck), host, &cfg);
    system.tick(1.0, &mut world, &cfg);

    // The host unloads the creature across the tick the vomit comes due.
    let creature = world.creatures.remove(&ALICE).unwrap();
    system.tick(1.0, &mut world, &cfg);
    assert_eq!(system.pending_timers(ALICE), 1);
    assert!((hydration(&system) - 1500.0).abs() < 1e-3);

    world.creatures.insert(ALICE, creature);
    system.tick(1.0, &mut world, &cfg);
    assert!((hydration(&system) - 750.0).abs() < 1e-3);
    assert_eq!(world.creatures[&ALICE].sounds, 1);

    assert_eq!(system.pending_timers(ALICE), 1);
    for _ in 0..5 {
        system.tick(1.0, &mut world, &cfg);
    }
    assert_eq!(system.pending_timers(ALICE), 0);
    assert!(system.behavior(ALICE).unwrap().state().intoxication.abs() < f32::EPSILON);
}

#[test]
fn salt_penalty_is_removed_once_the_host_returns() {
    let (mut system, mut world) = setup(None);
    let cfg = never_vomit();
    let host = world.creatures.get_mut(&ALICE).unwrap();
    system.consume(ALICE, "game:saltwaterportion", 1.0, host, &cfg);

    let creature = world.creatures.remove(&ALICE).unwrap();
    for _ in 0..12 {
        system.tick(1.0, &mut world, &cfg);
    }
    world.creatures.insert(ALICE, creature);
    assert_eq!(
        world.creatures[&ALICE].stats.get(THIRST_RATE_STAT, SALT_WATER_MODIFIER),
        Some(3.0)
    );
    system.tick(1.0, &mut world, &cfg);
    assert_eq!(
        world.creatures[&ALICE].stats.get(THIRST_RATE_STAT, SALT_WATER_MODIFIER),
        None
    );
}

#[test]
fn empty_portions_have_no_side_effects() {
    let (mut system, mut world) = setup(None);
    let cfg = always_vomit();
    let host = world.creatures.get_mut(&ALICE).unwrap();
    for (item, portion) in [
        ("game:boilingwaterportion", 0.0),
        ("game:saltwaterportion", -1.0),
        ("game:saltwaterportion", f32::NAN),
    ] {
        assert!(system.consume(ALICE, item, portion, host, &cfg).is_none());
    }
    assert!(host.damage.is_empty());
    assert_eq!(host.stats.get(THIRST_RATE_STAT, SALT_WATER_MODIFIER), None);
    assert_eq!(system.pending_timers(ALICE), 0);
    assert!((hydration(&system) - 1500.0).abs() < 1e-3);
}

#[test]
fn despawn_cancels_pending_timers() {
    let (mut system, mut world) = setup(None);
    let cfg = always_vomit();
    let host = world.creatures.get_mut(&ALICE).unwrap();
    system.receive(ALICE, &HydrationProperties::new(100.0, PurityLevel::Yuck), host, &cfg);
    assert_eq!(system.pending_timers(ALICE), 1);

    let persisted = system.despawn(ALICE).unwrap();
    assert!((persisted.intoxication - 1.0).abs() < f32::EPSILON);
    assert_eq!(system.pending_timers(ALICE), 0);
    assert!(system.is_empty());
    system.tick(5.0, &mut world, &cfg);
    assert_eq!(world.creatures[&ALICE].sounds, 0);
    assert!(system.despawn(ALICE).is_none());
}

#[test]
fn salt_water_penalty_expires_after_ten_seconds() {
    let (mut system, mut world) = setup(None);
    let cfg = never_vomit();
    let host = world.creatures.get_mut(&ALICE).unwrap();
    let outcome = system
        .consume(ALICE, "game:saltwaterportion", 1.0, host, &cfg)
        .unwrap();
    assert!((outcome.applied + 600.0).abs() < 1e-3);
    assert!(outcome.euhydration_gained.abs() < f32::EPSILON);
    let penalty = |world: &World| {
        world.creatures[&ALICE]
            .stats
            .get(THIRST_RATE_STAT, SALT_WATER_MODIFIER)
    };
    assert_eq!(penalty(&world), Some(3.0));

    for _ in 0..9 {
        system.tick(1.0, &mut world, &cfg);
    }
    assert_eq!(penalty(&world), Some(3.0));
    system.tick(1.0, &mut world, &cfg);
    assert_eq!(penalty(&world), None);
}

#[test]
fn disabled_thirst_ignores_consumption() {
    let (mut system, mut world) = setup(None);
    let mut cfg = never_vomit();
    cfg.synced.enable_thirst = false;
    let host = world.creatures.get_mut(&ALICE).unwrap();
    assert!(
        system
            .consume(ALICE, "game:saltwaterportion", 1.0, host, &cfg)
            .is_none()
    );
    assert!((hydration(&system) - 1500.0).abs() < 1e-3);
}

#[test]
fn dehydrated_entities_take_damage_on_the_slow_tick() {
    let parched = ThirstState {
        hydration: 0.0,
        hydration_loss_delay: 0.0,
        ..ThirstState::default()
    };
    let (mut system, mut world) = setup(Some(parched));
    let cfg = ConfigServer::default();
    for _ in 0..5 {
        system.tick(1.0, &mut world, &cfg);
    }
    assert!(world.creatures[&ALICE].damage.is_empty());
    system.tick(1.0, &mut world, &cfg);
    assert_eq!(
        world.creatures[&ALICE].damage,
        vec![Damage::internal(DamageKind::Hunger, 0.125)]
    );
    for _ in 0..6 {
        system.tick(1.0, &mut world, &cfg);
    }
    assert_eq!(world.creatures[&ALICE].damage.len(), 2);
}

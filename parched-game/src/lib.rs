//! Parched Game Core
//!
//! Host-agnostic thirst survival mechanics: layered hydration patch merging,
//! server/client config sync, the per-entity thirst state machine and the
//! vomit risk model. The host game reaches the core through the traits in
//! [`host`] and the hooks in [`consumption`].

pub mod config;
pub mod constants;
pub mod consumption;
pub mod curves;
pub mod host;
pub mod hydration;
pub mod merger;
pub mod numbers;
pub mod purity;
pub mod stats;
pub mod sync;
pub mod table;
pub mod thirst;
pub mod timers;
pub mod vomit;

use std::path::Path;

// Re-export commonly used types
pub use config::{ConfigClient, ConfigError, ConfigFile, ConfigServer, SyncedConfig, read_config};
pub use consumption::{
    ConsumptionDecision, ConsumptionEvent, ConsumptionHook, HydrationHook, describe_hydration,
};
pub use curves::HungerBuffCurve;
pub use host::{
    Controls, Damage, DamageKind, DamageSource, EntityHost, EntityId, GameMode, HostRegistry,
};
pub use hydration::{EntryError, HydrationAmount, HydrationEntry, HydrationProperties};
pub use merger::{ConfigMerger, PatchFile, merge_patch_files};
pub use purity::{InvalidPurityLevel, PurityLevel};
pub use stats::{BlendType, EntityStats};
pub use sync::{
    ClientChannel, ClientConfigSync, ClientId, ConfigEvent, ConfigMessage, Outbox, ServerChannel,
    ServerConfigSync, SideState, SyncError,
};
pub use table::HydrationTable;
pub use thirst::{
    HydrationOutcome, ThirstBehavior, ThirstState, ThirstSystem, TypeAttributes,
};
pub use timers::{DeferredAction, TimerId, TimerQueue};
pub use vomit::{roll_vomit, vomit_chance, vomit_chance_for};

/// Trait for abstracting the host's persisted entity attribute tree
/// Platform-specific implementations should provide this
pub trait AttributeStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the attribute subtree stored under `key` for an entity
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be read.
    fn load_tree(
        &self,
        entity: EntityId,
        key: &str,
    ) -> Result<Option<serde_json::Value>, Self::Error>;

    /// Store the attribute subtree under `key` for an entity
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be written.
    fn save_tree(
        &self,
        entity: EntityId,
        key: &str,
        tree: &serde_json::Value,
    ) -> Result<(), Self::Error>;
}

/// Result of routing one consumption through the hydration hook.
#[derive(Debug, Clone, PartialEq)]
pub enum Consumed {
    /// The item does not hydrate, thirst is disabled, or the entity is unknown.
    Ignored,
    Vetoed(String),
    Hydrated(HydrationOutcome),
}

/// Server-side coordinator: authoritative config, sync sessions and thirst
pub struct ThirstEngine<S>
where
    S: AttributeStore,
{
    storage: S,
    sync: ServerConfigSync,
    system: ThirstSystem,
}

impl<S> ThirstEngine<S>
where
    S: AttributeStore,
{
    /// Assemble an engine from already loaded parts
    pub const fn new(sync: ServerConfigSync, system: ThirstSystem, storage: S) -> Self {
        Self {
            storage,
            sync,
            system,
        }
    }

    /// Load the server config and hydration patches from `config_dir`
    ///
    /// # Errors
    ///
    /// Returns an error naming the offending file if any config cannot be
    /// read, parsed or synthesized. Nothing runs on partial data.
    pub fn start(config_dir: &Path, world_seed: u64, storage: S) -> Result<Self, ConfigError> {
        let sync = ServerConfigSync::start(config_dir)?;
        let system = ThirstSystem::start(config_dir, world_seed)?;
        log::info!(
            "thirst engine started: {} hydration entries, config {:016x}",
            system.table().len(),
            sync.snapshot().fingerprint()
        );
        Ok(Self::new(sync, system, storage))
    }

    #[must_use]
    pub const fn config(&self) -> &ConfigServer {
        self.sync.config()
    }

    #[must_use]
    pub const fn sync(&self) -> &ServerConfigSync {
        &self.sync
    }

    #[must_use]
    pub const fn system(&self) -> &ThirstSystem {
        &self.system
    }

    /// Attach thirst to an entity, restoring its persisted tree if any
    ///
    /// # Errors
    ///
    /// Returns an error if the attribute tree cannot be loaded.
    pub fn spawn<H: EntityHost + ?Sized>(
        &mut self,
        id: EntityId,
        type_attributes: &TypeAttributes,
        host: &mut H,
    ) -> Result<&ThirstBehavior, S::Error> {
        let stored = self
            .storage
            .load_tree(id, constants::THIRST_ATTRIBUTE_KEY)?
            .as_ref()
            .and_then(ThirstState::from_attributes);
        let cfg = self.sync.config();
        Ok(self.system.spawn(id, stored, type_attributes, host, cfg))
    }

    /// Detach an entity and persist its final state
    ///
    /// # Errors
    ///
    /// Returns an error if the attribute tree cannot be saved.
    pub fn despawn(&mut self, id: EntityId) -> Result<Option<ThirstState>, S::Error> {
        let Some(state) = self.system.despawn(id) else {
            return Ok(None);
        };
        self.persist(id, &state)?;
        Ok(Some(state))
    }

    /// Persist the current state of a live entity
    ///
    /// # Errors
    ///
    /// Returns an error if the attribute tree cannot be saved.
    pub fn save(&self, id: EntityId) -> Result<bool, S::Error> {
        match self.system.behavior(id) {
            Some(behavior) => self.persist(id, behavior.state()).map(|()| true),
            None => Ok(false),
        }
    }

    fn persist(&self, id: EntityId, state: &ThirstState) -> Result<(), S::Error> {
        self.storage
            .save_tree(id, constants::THIRST_ATTRIBUTE_KEY, &state.to_attributes())
    }

    pub fn tick<R: HostRegistry + ?Sized>(&mut self, dt: f32, hosts: &mut R) {
        self.system.tick(dt, hosts, self.sync.config());
    }

    /// Route a consumption through the hydration hook and apply the result
    pub fn consume<H: EntityHost + ?Sized>(
        &mut self,
        id: EntityId,
        item_code: &str,
        portion: f32,
        host: &mut H,
    ) -> Consumed {
        let cfg = self.sync.config();
        let decision = HydrationHook::new(self.system.table(), &cfg.synced).before_consume(
            &ConsumptionEvent {
                entity: id,
                item_code,
                portion,
            },
        );
        match decision {
            ConsumptionDecision::Proceed => Consumed::Ignored,
            ConsumptionDecision::Veto(reason) => Consumed::Vetoed(reason),
            ConsumptionDecision::Annotate(props) => self
                .system
                .receive(id, &props, host, cfg)
                .map_or(Consumed::Ignored, Consumed::Hydrated),
        }
    }

    pub fn did_attack<H: EntityHost + ?Sized>(&mut self, id: EntityId, host: &mut H) {
        self.system.did_attack(id, host, self.sync.config());
    }

    pub fn on_damage<H: EntityHost + ?Sized>(&mut self, id: EntityId, damage: &Damage, host: &mut H) {
        self.system.on_damage(id, damage, host);
    }

    /// A client connected
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be encoded.
    pub fn client_join<C: ServerChannel + ?Sized>(
        &mut self,
        client: ClientId,
        name: &str,
        privileges: &[&str],
        channel: &mut C,
    ) -> Result<(), SyncError> {
        self.sync.on_client_join(client, name, privileges, channel)
    }

    pub fn client_leave(&mut self, client: ClientId) -> bool {
        self.sync.on_client_leave(client)
    }

    /// Handle a config channel packet, then dispatch the events it raised
    ///
    /// # Errors
    ///
    /// Returns an error for undecodable or unauthorized packets.
    pub fn on_message<C: ServerChannel + ?Sized>(
        &mut self,
        from: ClientId,
        payload: &[u8],
        channel: &mut C,
    ) -> Result<(), SyncError> {
        self.sync.on_message(from, payload)?;
        self.dispatch_events(channel)
    }

    /// Admin-triggered reload: re-merge the patch files and rebroadcast
    ///
    /// # Errors
    ///
    /// Returns an error if the merge fails (the old table stays active) or the
    /// snapshot cannot be encoded.
    pub fn reload<C: ServerChannel + ?Sized>(&mut self, channel: &mut C) -> Result<(), SyncError> {
        self.system.reload_table()?;
        self.sync.push_event(ConfigEvent::Reloaded);
        self.dispatch_events(channel)
    }

    fn dispatch_events<C: ServerChannel + ?Sized>(&mut self, channel: &mut C) -> Result<(), SyncError> {
        for event in self.sync.take_events() {
            self.sync.handle_event(event, channel)?;
        }
        Ok(())
    }
}

//! Server-authoritative config sync over the `parched:config` channel.
//!
//! The server owns the [`ConfigServer`] read from disk and pushes
//! [`SyncedConfig`] snapshots to clients when they join and whenever a
//! [`ConfigEvent::Reloaded`] is dispatched. Clients replace their replica
//! wholesale on every snapshot. A client holding the `controlserver` privilege
//! may push a snapshot back to override the server.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::config::{ConfigClient, ConfigError, ConfigServer, SyncedConfig, read_config};
use crate::constants::{ADMIN_PRIVILEGE, CONFIG_CHANNEL};

/// Connected client as seen by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

/// Messages registered on the config channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConfigMessage {
    Snapshot(SyncedConfig),
}

impl ConfigMessage {
    /// # Errors
    ///
    /// Returns [`SyncError::Codec`] if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, SyncError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// # Errors
    ///
    /// Returns [`SyncError::Codec`] for payloads that are not a config message.
    pub fn decode(payload: &[u8]) -> Result<Self, SyncError> {
        Ok(serde_json::from_slice(payload)?)
    }
}

/// Side-local config events, dispatched explicitly by the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigEvent {
    /// A snapshot was applied; dependents should re-read their tunables.
    Reloaded,
    /// An administrator asked to push the local snapshot to the server.
    AdminSetConfig,
}

/// Lifecycle of one side's configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SideState {
    #[default]
    Unloaded,
    Loaded,
    Synced,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{client} tried to force the server config without the 'controlserver' privilege")]
    UnauthorizedConfigPush { client: ClientId },
    #[error("{0} is not connected")]
    UnknownClient(ClientId),
    #[error("config message codec error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Outbound half of the server's network channel.
pub trait ServerChannel {
    fn send(&mut self, channel: &str, to: ClientId, payload: Vec<u8>);
}

/// Outbound half of a client's network channel.
pub trait ClientChannel {
    fn send(&mut self, channel: &str, payload: Vec<u8>);
}

/// Packets captured in memory, for loopback sessions and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outbox {
    pub sent: Vec<(Option<ClientId>, Vec<u8>)>,
}

impl Outbox {
    /// Drain captured packets addressed to `client` (or to the server for `None`).
    pub fn take_for(&mut self, client: Option<ClientId>) -> Vec<Vec<u8>> {
        let (matching, rest) = std::mem::take(&mut self.sent)
            .into_iter()
            .partition::<Vec<_>, _>(|(to, _)| *to == client);
        self.sent = rest;
        matching.into_iter().map(|(_, payload)| payload).collect()
    }
}

impl ServerChannel for Outbox {
    fn send(&mut self, channel: &str, to: ClientId, payload: Vec<u8>) {
        debug_assert_eq!(channel, CONFIG_CHANNEL);
        self.sent.push((Some(to), payload));
    }
}

impl ClientChannel for Outbox {
    fn send(&mut self, channel: &str, payload: Vec<u8>) {
        debug_assert_eq!(channel, CONFIG_CHANNEL);
        self.sent.push((None, payload));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ClientInfo {
    name: String,
    privileges: BTreeSet<String>,
}

/// Server side of the protocol.
#[derive(Debug, Clone)]
pub struct ServerConfigSync {
    config: ConfigServer,
    state: SideState,
    clients: BTreeMap<ClientId, ClientInfo>,
    events: Vec<ConfigEvent>,
}

impl Default for ServerConfigSync {
    fn default() -> Self {
        Self {
            config: ConfigServer::default(),
            state: SideState::Unloaded,
            clients: BTreeMap::new(),
            events: Vec::new(),
        }
    }
}

impl ServerConfigSync {
    /// Read `parched-server.json` from `dir` (writing defaults when missing).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is unreadable, malformed or cannot
    /// be created.
    pub fn start(dir: &Path) -> Result<Self, ConfigError> {
        Ok(Self::with_config(read_config(dir)?))
    }

    #[must_use]
    pub fn with_config(config: ConfigServer) -> Self {
        Self {
            config,
            state: SideState::Loaded,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ConfigServer {
        &self.config
    }

    #[must_use]
    pub fn snapshot(&self) -> SyncedConfig {
        SyncedConfig::from_server(&self.config)
    }

    #[must_use]
    pub const fn state(&self) -> SideState {
        self.state
    }

    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        !matches!(self.state, SideState::Unloaded)
    }

    pub fn clients(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.clients.keys().copied()
    }

    /// Register a joining client and send it the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Codec`] if the snapshot cannot be encoded.
    pub fn on_client_join<C: ServerChannel + ?Sized>(
        &mut self,
        client: ClientId,
        name: &str,
        privileges: &[&str],
        channel: &mut C,
    ) -> Result<(), SyncError> {
        self.clients.insert(
            client,
            ClientInfo {
                name: name.to_string(),
                privileges: privileges.iter().map(|p| (*p).to_string()).collect(),
            },
        );
        self.send_snapshot(client, channel)
    }

    pub fn on_client_leave(&mut self, client: ClientId) -> bool {
        self.clients.remove(&client).is_some()
    }

    /// Send the current snapshot to every connected client.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Codec`] if the snapshot cannot be encoded.
    pub fn broadcast<C: ServerChannel + ?Sized>(&self, channel: &mut C) -> Result<usize, SyncError> {
        log::info!("config reloaded, sending to {} clients", self.clients.len());
        let payload = ConfigMessage::Snapshot(self.snapshot()).encode()?;
        for &client in self.clients.keys() {
            channel.send(CONFIG_CHANNEL, client, payload.clone());
        }
        Ok(self.clients.len())
    }

    fn send_snapshot<C: ServerChannel + ?Sized>(
        &self,
        client: ClientId,
        channel: &mut C,
    ) -> Result<(), SyncError> {
        let info = self
            .clients
            .get(&client)
            .ok_or(SyncError::UnknownClient(client))?;
        log::info!("sending config to {} ({client})", info.name);
        let payload = ConfigMessage::Snapshot(self.snapshot()).encode()?;
        channel.send(CONFIG_CHANNEL, client, payload);
        Ok(())
    }

    /// Handle a packet received on the config channel.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] for undecodable packets, unknown senders and
    /// unauthorized pushes. None of these are reported back to the sender.
    pub fn on_message(&mut self, from: ClientId, payload: &[u8]) -> Result<(), SyncError> {
        match ConfigMessage::decode(payload)? {
            ConfigMessage::Snapshot(snapshot) => self.force_config_from_admin(from, snapshot),
        }
    }

    /// Overwrite the authoritative config with a privileged client's snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::UnauthorizedConfigPush`] (and keeps the current
    /// config) if the sender lacks the admin privilege.
    pub fn force_config_from_admin(
        &mut self,
        from: ClientId,
        snapshot: SyncedConfig,
    ) -> Result<(), SyncError> {
        let info = self
            .clients
            .get(&from)
            .ok_or(SyncError::UnknownClient(from))?;
        if !info.privileges.contains(ADMIN_PRIVILEGE) {
            log::warn!("ignoring config push from {} ({from}): not privileged", info.name);
            return Err(SyncError::UnauthorizedConfigPush { client: from });
        }
        log::info!(
            "forcing config from admin {} ({from}), fingerprint {:016x}",
            info.name,
            snapshot.fingerprint()
        );
        self.config.update_from_synced(snapshot);
        self.events.push(ConfigEvent::Reloaded);
        Ok(())
    }

    /// Queue a side-local event for the next dispatch.
    pub fn push_event(&mut self, event: ConfigEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<ConfigEvent> {
        std::mem::take(&mut self.events)
    }

    /// Dispatch one event; only [`ConfigEvent::Reloaded`] concerns the server.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Codec`] if the broadcast snapshot cannot be encoded.
    pub fn handle_event<C: ServerChannel + ?Sized>(
        &mut self,
        event: ConfigEvent,
        channel: &mut C,
    ) -> Result<(), SyncError> {
        match event {
            ConfigEvent::Reloaded => self.broadcast(channel).map(|_| ()),
            ConfigEvent::AdminSetConfig => Ok(()),
        }
    }
}

/// Client side of the protocol.
#[derive(Debug, Clone, Default)]
pub struct ClientConfigSync {
    client_config: ConfigClient,
    synced: SyncedConfig,
    state: SideState,
    events: Vec<ConfigEvent>,
}

impl ClientConfigSync {
    /// Read `parched-client.json` from `dir` (writing defaults when missing).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is unreadable, malformed or cannot
    /// be created.
    pub fn start(dir: &Path) -> Result<Self, ConfigError> {
        Ok(Self::with_config(read_config(dir)?))
    }

    #[must_use]
    pub fn with_config(client_config: ConfigClient) -> Self {
        Self {
            client_config,
            state: SideState::Loaded,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn client_config(&self) -> &ConfigClient {
        &self.client_config
    }

    /// Replica of the server's synced tunables.
    #[must_use]
    pub const fn synced(&self) -> &SyncedConfig {
        &self.synced
    }

    #[must_use]
    pub const fn state(&self) -> SideState {
        self.state
    }

    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        !matches!(self.state, SideState::Unloaded)
    }

    /// Handle a packet from the server.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Codec`] for undecodable packets; the replica is
    /// left untouched.
    pub fn on_message(&mut self, payload: &[u8]) -> Result<(), SyncError> {
        match ConfigMessage::decode(payload)? {
            ConfigMessage::Snapshot(snapshot) => self.apply_snapshot(snapshot),
        }
        Ok(())
    }

    fn apply_snapshot(&mut self, snapshot: SyncedConfig) {
        log::info!("reloading synced config {:016x}", snapshot.fingerprint());
        self.synced = snapshot;
        self.state = SideState::Synced;
        self.events.push(ConfigEvent::Reloaded);
    }

    /// Push `snapshot` to the server as an administrator.
    ///
    /// The local replica is updated right away and a [`ConfigEvent::Reloaded`]
    /// is queued so local dependents re-initialize.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Codec`] if the snapshot cannot be encoded.
    pub fn admin_push<C: ClientChannel + ?Sized>(
        &mut self,
        snapshot: SyncedConfig,
        channel: &mut C,
    ) -> Result<(), SyncError> {
        let payload = ConfigMessage::Snapshot(snapshot.clone()).encode()?;
        channel.send(CONFIG_CHANNEL, payload);
        self.synced = snapshot;
        self.events.push(ConfigEvent::Reloaded);
        Ok(())
    }

    pub fn push_event(&mut self, event: ConfigEvent) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<ConfigEvent> {
        std::mem::take(&mut self.events)
    }

    /// Dispatch one event. `AdminSetConfig` pushes the local replica.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Codec`] if the pushed snapshot cannot be encoded.
    pub fn handle_event<C: ClientChannel + ?Sized>(
        &mut self,
        event: ConfigEvent,
        channel: &mut C,
    ) -> Result<(), SyncError> {
        match event {
            ConfigEvent::AdminSetConfig => self.admin_push(self.synced.clone(), channel),
            ConfigEvent::Reloaded => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::HungerBuffCurve;

    fn server_with_clients(count: u64) -> (ServerConfigSync, Outbox) {
        let mut server = ServerConfigSync::with_config(ConfigServer::default());
        let mut wire = Outbox::default();
        for id in 0..count {
            server
                .on_client_join(ClientId(id), &format!("player{id}"), &[], &mut wire)
                .unwrap();
        }
        (server, wire)
    }

    #[test]
    fn join_sends_to_joining_client_only() {
        let (mut server, mut wire) = server_with_clients(2);
        wire.sent.clear();
        server
            .on_client_join(ClientId(9), "late", &[], &mut wire)
            .unwrap();
        assert_eq!(wire.sent.len(), 1);
        assert_eq!(wire.sent[0].0, Some(ClientId(9)));
    }

    #[test]
    fn broadcast_replaces_every_replica() {
        let (mut server, mut wire) = server_with_clients(3);
        let mut clients: Vec<ClientConfigSync> = (0..3)
            .map(|_| {
                let mut client = ClientConfigSync::with_config(ConfigClient::default());
                client.apply_snapshot(SyncedConfig {
                    thirst_kills: false,
                    hunger_buff_max: 9.0,
                    ..SyncedConfig::default()
                });
                client
            })
            .collect();
        wire.sent.clear();

        let mut updated = server.snapshot();
        updated.thirst_speed_modifier = 2.5;
        updated.hunger_buff_curve = HungerBuffCurve::Cubic;
        server.config.update_from_synced(updated.clone());
        server.handle_event(ConfigEvent::Reloaded, &mut wire).unwrap();

        for (idx, client) in clients.iter_mut().enumerate() {
            for packet in wire.take_for(Some(ClientId(idx as u64))) {
                client.on_message(&packet).unwrap();
            }
            assert_eq!(client.synced(), &updated);
            assert_eq!(client.state(), SideState::Synced);
            assert!(client.take_events().contains(&ConfigEvent::Reloaded));
        }
        assert!(wire.sent.is_empty());
    }

    #[test]
    fn unprivileged_push_is_rejected_silently() {
        let (mut server, mut wire) = server_with_clients(1);
        wire.sent.clear();
        let before = server.config().clone();
        let mut forged = server.snapshot();
        forged.thirst_kills = false;
        let payload = ConfigMessage::Snapshot(forged).encode().unwrap();

        let err = server.on_message(ClientId(0), &payload).unwrap_err();
        assert!(matches!(err, SyncError::UnauthorizedConfigPush { client } if client == ClientId(0)));
        assert_eq!(server.config(), &before);
        assert!(wire.sent.is_empty());
        assert!(server.take_events().is_empty());
    }

    #[test]
    fn admin_push_overrides_and_rebroadcasts() {
        let mut server = ServerConfigSync::with_config(ConfigServer::default());
        let mut wire = Outbox::default();
        server
            .on_client_join(ClientId(1), "admin", &[ADMIN_PRIVILEGE], &mut wire)
            .unwrap();
        server
            .on_client_join(ClientId(2), "player", &[], &mut wire)
            .unwrap();
        let mut admin = ClientConfigSync::with_config(ConfigClient::default());
        for packet in wire.take_for(Some(ClientId(1))) {
            admin.on_message(&packet).unwrap();
        }
        wire.sent.clear();

        let mut pushed = admin.synced().clone();
        pushed.enable_thirst = false;
        admin.admin_push(pushed.clone(), &mut wire).unwrap();
        assert_eq!(admin.synced(), &pushed);

        for packet in wire.take_for(None) {
            server.on_message(ClientId(1), &packet).unwrap();
        }
        assert!(!server.config().synced.enable_thirst);
        for event in server.take_events() {
            server.handle_event(event, &mut wire).unwrap();
        }
        assert_eq!(wire.take_for(Some(ClientId(2))).len(), 1);
    }

    #[test]
    fn states_progress_and_garbage_is_rejected() {
        let mut client = ClientConfigSync::default();
        assert!(!client.is_loaded());
        client = ClientConfigSync::with_config(ConfigClient::default());
        assert_eq!(client.state(), SideState::Loaded);
        assert!(client.is_loaded());
        assert!(matches!(client.on_message(b"nope"), Err(SyncError::Codec(_))));
        assert_eq!(client.state(), SideState::Loaded);

        let mut server = ServerConfigSync::default();
        assert!(!server.is_loaded());
        let err = server
            .force_config_from_admin(ClientId(5), SyncedConfig::default())
            .unwrap_err();
        assert!(matches!(err, SyncError::UnknownClient(_)));
    }
}

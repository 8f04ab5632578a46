//! Per-session broadcast rooms
//!
//! Each open session has a room mapping connected identities to their
//! tunnels, plus a reverse index by [`Role`] so host-only and
//! participant-only announcements do not scan every connection. Delivery
//! is best-effort and nothing is replayed: a client that misses updates
//! resyncs by attaching again.

use std::collections::{HashMap, HashSet};

use dashmap::DashMap;
use enum_map::EnumMap;

use crate::{
    message::{SyncMessage, UpdateMessage},
    participant::{Id, Role},
    session::SessionId,
    tunnel::Tunnel,
};

/// Connections of a single session
struct Room<T> {
    mapping: HashMap<Id, (Role, T)>,
    reverse_mapping: EnumMap<Role, HashSet<Id>>,
}

impl<T> Default for Room<T> {
    fn default() -> Self {
        Self {
            mapping: HashMap::new(),
            reverse_mapping: EnumMap::default(),
        }
    }
}

impl<T: Tunnel> Room<T> {
    fn announce_with<S>(&self, sender: S)
    where
        S: Fn(Id, Role) -> Option<UpdateMessage>,
    {
        for (id, (role, tunnel)) in &self.mapping {
            if let Some(message) = sender(*id, *role) {
                tunnel.send_message(&message);
            }
        }
    }
}

/// All open rooms, keyed by session
pub struct Rooms<T> {
    rooms: DashMap<SessionId, Room<T>>,
}

impl<T> Default for Rooms<T> {
    fn default() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }
}

impl<T: Tunnel> Rooms<T> {
    /// Opens an empty room; an already open room is left untouched
    pub fn open(&self, session: SessionId) {
        self.rooms.entry(session).or_default();
    }

    /// Closes every tunnel in the room and removes it
    pub fn close(&self, session: SessionId) {
        if let Some((_, room)) = self.rooms.remove(&session) {
            for (_, (_, tunnel)) in room.mapping {
                tunnel.close();
            }
        }
    }

    /// Subscribes a connection, replacing and closing any previous one
    ///
    /// Returns the tunnel back if the room is not open.
    pub fn attach(&self, session: SessionId, id: Id, role: Role, tunnel: T) -> Result<(), T> {
        let Some(mut room) = self.rooms.get_mut(&session) else {
            return Err(tunnel);
        };
        if let Some((old_role, old)) = room.mapping.insert(id, (role, tunnel)) {
            room.reverse_mapping[old_role].remove(&id);
            old.close();
        }
        room.reverse_mapping[role].insert(id);
        Ok(())
    }

    /// Drops a connection and closes its tunnel, returning its role
    pub fn detach(&self, session: SessionId, id: Id) -> Option<Role> {
        let (role, tunnel) = {
            let mut room = self.rooms.get_mut(&session)?;
            let (role, tunnel) = room.mapping.remove(&id)?;
            room.reverse_mapping[role].remove(&id);
            (role, tunnel)
        };
        tunnel.close();
        Some(role)
    }

    /// Sends personalized messages; `sender` may skip a connection with `None`
    pub fn announce_with<S>(&self, session: SessionId, sender: S)
    where
        S: Fn(Id, Role) -> Option<UpdateMessage>,
    {
        if let Some(room) = self.rooms.get(&session) {
            room.announce_with(sender);
        }
    }

    /// Broadcasts to every connection in the room
    pub fn announce(&self, session: SessionId, message: &UpdateMessage) {
        self.announce_with(session, |_, _| Some(message.to_owned()));
    }

    /// Broadcasts to connections with the given role
    pub fn announce_role(&self, session: SessionId, role: Role, message: &UpdateMessage) {
        let Some(room) = self.rooms.get(&session) else {
            return;
        };
        for id in &room.reverse_mapping[role] {
            if let Some((_, tunnel)) = room.mapping.get(id) {
                tunnel.send_message(message);
            }
        }
    }

    /// Sends a state snapshot to one connection
    pub fn send_state(&self, session: SessionId, id: Id, state: &SyncMessage) {
        let Some(room) = self.rooms.get(&session) else {
            return;
        };
        if let Some((_, tunnel)) = room.mapping.get(&id) {
            tunnel.send_state(state);
        }
    }
}

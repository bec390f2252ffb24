//! Identity Registry - who is online
//!
//! Maps connection identities to server-generated display names. The
//! registry is the only source of truth for the roster; it knows nothing
//! about the transport and never emits events itself.
//!
//! # Locking
//!
//! All state sits behind one `RwLock`. Mutations that feed a roster
//! broadcast (`register_with_snapshot`, `remove_with_snapshot`) take the
//! roster snapshot inside the same write section, so a snapshot never
//! shows a half-applied join or leave. Lookups only take the read lock.

mod names;

pub use names::{NameGenerator, RandomNames, NAME_NUMBER_MAX, NAME_NUMBER_MIN};

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::types::{ConnectionId, Member};

/// Attempts made to find an unused name when unique names are enabled
pub const MAX_NAME_ATTEMPTS: usize = 32;

struct Entry {
    name: String,
    connected_at: DateTime<Utc>,
    seq: u64,
}

#[derive(Default)]
struct RegistryState {
    entries: HashMap<ConnectionId, Entry>,
    /// Insertion order: seq -> identity
    order: BTreeMap<u64, ConnectionId>,
    next_seq: u64,
}

impl RegistryState {
    fn snapshot(&self) -> Vec<String> {
        self.order
            .values()
            .filter_map(|id| self.entries.get(id))
            .map(|entry| entry.name.clone())
            .collect()
    }

    fn has_name(&self, name: &str) -> bool {
        self.entries.values().any(|entry| entry.name == name)
    }

    fn remove(&mut self, id: ConnectionId) -> Option<String> {
        let entry = self.entries.remove(&id)?;
        self.order.remove(&entry.seq);
        Some(entry.name)
    }
}

/// Authoritative identity -> display name mapping
pub struct IdentityRegistry {
    state: RwLock<RegistryState>,
    names: Box<dyn NameGenerator>,
    unique_names: bool,
}

impl IdentityRegistry {
    /// Create a registry with random `User-<N>` names, collisions allowed
    pub fn new() -> Self {
        Self::with_generator(Box::new(RandomNames))
    }

    /// Create a registry with a custom name source
    pub fn with_generator(names: Box<dyn NameGenerator>) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            names,
            unique_names: false,
        }
    }

    /// Retry name generation (up to [`MAX_NAME_ATTEMPTS`]) until the name
    /// is not already on the roster
    pub fn unique_names(mut self, enabled: bool) -> Self {
        self.unique_names = enabled;
        self
    }

    /// Register an identity and return its new display name
    pub fn register(&self, id: ConnectionId) -> String {
        self.register_with_snapshot(id).0
    }

    /// Register an identity, returning its name and the roster right after
    pub fn register_with_snapshot(&self, id: ConnectionId) -> (String, Vec<String>) {
        let mut state = self.state.write();

        // A reused identity replaces its stale entry
        state.remove(id);

        let name = self.pick_name(&state);
        let seq = state.next_seq;
        state.next_seq += 1;
        state.order.insert(seq, id);
        state.entries.insert(
            id,
            Entry {
                name: name.clone(),
                connected_at: Utc::now(),
                seq,
            },
        );

        let roster = state.snapshot();
        (name, roster)
    }

    /// Remove an identity. Returns `None` if it was not registered.
    pub fn remove(&self, id: ConnectionId) -> Option<String> {
        self.state.write().remove(id)
    }

    /// Remove an identity, returning the removed name and the roster right after
    pub fn remove_with_snapshot(&self, id: ConnectionId) -> (Option<String>, Vec<String>) {
        let mut state = self.state.write();
        let removed = state.remove(id);
        (removed, state.snapshot())
    }

    /// Display name of an online identity
    pub fn lookup(&self, id: ConnectionId) -> Option<String> {
        self.state.read().entries.get(&id).map(|entry| entry.name.clone())
    }

    /// Current roster in join order
    pub fn snapshot(&self) -> Vec<String> {
        self.state.read().snapshot()
    }

    /// Online members with their join time, in join order
    pub fn members(&self) -> Vec<Member> {
        let state = self.state.read();
        state
            .order
            .values()
            .filter_map(|id| {
                state.entries.get(id).map(|entry| Member {
                    id: *id,
                    user: entry.name.clone(),
                    connected_at: entry.connected_at,
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn pick_name(&self, state: &RegistryState) -> String {
        let mut candidate = self.names.generate();
        if !self.unique_names {
            return candidate;
        }

        for _ in 1..MAX_NAME_ATTEMPTS {
            if !state.has_name(&candidate) {
                return candidate;
            }
            candidate = self.names.generate();
        }
        candidate
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

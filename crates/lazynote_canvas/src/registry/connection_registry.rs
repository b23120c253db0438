//! In-memory connection registry with object index.
//!
//! # Responsibility
//! - Store live `Connection`s keyed by their deterministic id.
//! - Answer "which edges touch object X" without scanning the edge set.
//!
//! # Invariants
//! - `add` never overwrites: a present id leaves the registry unchanged.
//! - After every `add`/`remove`/`drain`, `index` is exactly the inverse of
//!   `connections` (provenance edges under both notes, aggregation edges
//!   under the note only) and holds no empty buckets.
//! - Bulk removal callers iterate a materialized id list, never the live map.

use crate::model::connection::{Connection, ConnectionId, ConnectionKind, ObjectId};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
    index: HashMap<ObjectId, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a connection and indexes its endpoints.
    ///
    /// Returns `false` when the id is already present. The rejected
    /// connection is dropped, which releases its render handle.
    pub fn add(&mut self, connection: Connection) -> bool {
        if self.connections.contains_key(connection.id()) {
            return false;
        }

        let id = connection.id().clone();
        for object_id in connection.endpoints() {
            self.index.entry(object_id).or_default().insert(id.clone());
        }
        self.connections.insert(id, connection);
        true
    }

    /// Removes one connection and its index entries.
    ///
    /// Returns `None` for unknown ids. The caller decides when the returned
    /// connection (and with it the render handle) is dropped.
    pub fn remove(&mut self, id: &ConnectionId) -> Option<Connection> {
        let connection = self.connections.remove(id)?;
        for object_id in connection.endpoints() {
            self.unindex(object_id, id);
        }
        Some(connection)
    }

    pub fn get(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn get_mut(&mut self, id: &ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(id)
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn all_of_kind(&self, kind: ConnectionKind) -> impl Iterator<Item = &Connection> {
        self.connections
            .values()
            .filter(move |connection| connection.kind() == kind)
    }

    pub fn count_of_kind(&self, kind: ConnectionKind) -> usize {
        self.all_of_kind(kind).count()
    }

    /// Materialized set of edge ids where `object_id` is source or target.
    pub fn edges_touching(&self, object_id: ObjectId) -> HashSet<ConnectionId> {
        self.index.get(&object_id).cloned().unwrap_or_default()
    }

    pub fn touching_count(&self, object_id: ObjectId) -> usize {
        self.index.get(&object_id).map_or(0, HashSet::len)
    }

    /// Edges touching `object_id` that satisfy `predicate`, as an owned list.
    pub fn touching_matching(
        &self,
        object_id: ObjectId,
        predicate: impl Fn(&Connection) -> bool,
    ) -> Vec<ConnectionId> {
        let Some(ids) = self.index.get(&object_id) else {
            return vec![];
        };
        ids.iter()
            .filter_map(|id| self.connections.get(id))
            .filter(|connection| predicate(connection))
            .map(|connection| connection.id().clone())
            .collect()
    }

    /// Snapshot of every id matching `predicate`, safe to mutate against.
    pub fn ids_matching(&self, predicate: impl Fn(&Connection) -> bool) -> Vec<ConnectionId> {
        self.connections
            .values()
            .filter(|connection| predicate(connection))
            .map(|connection| connection.id().clone())
            .collect()
    }

    pub fn ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().cloned().collect()
    }

    /// Objects that currently have at least one indexed edge.
    pub fn indexed_objects(&self) -> Vec<ObjectId> {
        self.index.keys().copied().collect()
    }

    /// Removes everything, handing the connections back to the caller.
    pub fn drain(&mut self) -> Vec<Connection> {
        self.index.clear();
        self.connections.drain().map(|(_, connection)| connection).collect()
    }

    fn unindex(&mut self, object_id: ObjectId, id: &ConnectionId) {
        if let Some(bucket) = self.index.get_mut(&object_id) {
            bucket.remove(id);
            if bucket.is_empty() {
                self.index.remove(&object_id);
            }
        }
    }
}

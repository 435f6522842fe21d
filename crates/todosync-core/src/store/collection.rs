// ── Entity collection ──
//
// One collection per resource type. Primary index is the identity key
// (`id`, `notification_key`, or `project_id:user_id`); a secondary
// index maps pending temp ids to their current key.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::model::{Entity, EntityId, ResourceType};

/// Id-keyed storage for a single resource type.
///
/// Holds at most one entity per identity key. Container order is
/// insertion order and carries no meaning.
#[derive(Debug, Clone)]
pub(crate) struct EntityCollection {
    resource: ResourceType,

    /// Primary storage: identity key -> entity.
    by_key: IndexMap<String, Entity>,

    /// Secondary index: temp id -> identity key, for entities still
    /// awaiting a durable id.
    temp_to_key: HashMap<String, String>,
}

impl EntityCollection {
    pub(crate) fn new(resource: ResourceType) -> Self {
        Self {
            resource,
            by_key: IndexMap::new(),
            temp_to_key: HashMap::new(),
        }
    }

    // ── Lookups ──────────────────────────────────────────────────────

    /// Resolve a durable id or pending temp id to the identity key.
    pub(crate) fn find_key(&self, id: &str) -> Option<&str> {
        if let Some((key, _)) = self.by_key.get_key_value(id) {
            return Some(key.as_str());
        }
        self.temp_to_key.get(id).map(String::as_str)
    }

    pub(crate) fn find(&self, id: &str) -> Option<&Entity> {
        let key = self.find_key(id)?;
        self.by_key.get(key)
    }

    pub(crate) fn find_mut(&mut self, id: &str) -> Option<&mut Entity> {
        let key = self.find_key(id)?.to_owned();
        self.by_key.get_mut(&key)
    }

    pub(crate) fn get_by_key(&self, key: &str) -> Option<&Entity> {
        self.by_key.get(key)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.by_key.values()
    }

    /// Mutable walk over every entity. Callers must not touch the
    /// identity fields.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.by_key.values_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_key.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Insert or replace an entity under its identity key.
    ///
    /// Returns `false` (and stores nothing) when the entity has no
    /// identity for this resource type.
    pub(crate) fn insert(&mut self, entity: Entity) -> bool {
        let Some(key) = entity.key() else {
            return false;
        };
        if let Some(temp) = entity.temp_id() {
            self.temp_to_key.insert(temp.to_owned(), key.clone());
        }
        if let Some(previous) = self.by_key.insert(key, entity) {
            self.forget_temp(&previous);
        }
        true
    }

    /// Remove the entity stored under `key`.
    pub(crate) fn remove_key(&mut self, key: &str) -> Option<Entity> {
        let entity = self.by_key.shift_remove(key)?;
        self.forget_temp(&entity);
        Some(entity)
    }

    /// Merge `fields` into the entity at `key`, re-keying it if the
    /// merge changed its identity.
    pub(crate) fn merge_at(&mut self, key: &str, fields: &Map<String, Value>) {
        let Some(entity) = self.by_key.get_mut(key) else {
            return;
        };
        entity.merge(fields);
        self.rekey(key);
    }

    /// Attach a durable id to the entity pending under `temp_id`.
    ///
    /// Returns `false` when no entity in this collection carries that
    /// temp id. If the durable key is already present (the server's
    /// copy arrived first) the server copy wins and the optimistic
    /// entity is dropped.
    pub(crate) fn resolve_temp(&mut self, temp_id: &str, durable: &EntityId) -> bool {
        let Some(key) = self.temp_to_key.remove(temp_id) else {
            return false;
        };
        let Some(mut entity) = self.by_key.shift_remove(&key) else {
            return false;
        };
        let durable_key = durable.as_key();
        if self.by_key.contains_key(&durable_key) {
            debug!(
                resource = %self.resource,
                temp_id,
                id = %durable,
                "durable entity already present, dropping optimistic copy"
            );
            return true;
        }
        entity.set("id", durable.to_value());
        entity.clear_temp_id();
        if let Some(new_key) = entity.key() {
            self.by_key.insert(new_key, entity);
        }
        true
    }

    /// Replace every top-level field equal to `temp_id` with `durable`.
    /// Returns the number of fields rewritten.
    pub(crate) fn rewrite_references(&mut self, temp_id: &str, durable: &EntityId) -> usize {
        let mut rewritten = 0;
        let mut moved = Vec::new();
        for (key, entity) in &mut self.by_key {
            let mut touched = false;
            for value in entity.data_mut().values_mut() {
                if value.as_str() == Some(temp_id) {
                    *value = durable.to_value();
                    touched = true;
                    rewritten += 1;
                }
            }
            if touched && entity.key().as_deref() != Some(key.as_str()) {
                moved.push(key.clone());
            }
        }
        for key in moved {
            self.rekey(&key);
        }
        rewritten
    }

    pub(crate) fn clear(&mut self) {
        self.by_key.clear();
        self.temp_to_key.clear();
    }

    fn rekey(&mut self, key: &str) {
        let Some(new_key) = self.by_key.get(key).and_then(Entity::key) else {
            return;
        };
        if new_key == key {
            return;
        }
        if let Some(entity) = self.by_key.shift_remove(key) {
            if let Some(temp) = entity.temp_id() {
                self.temp_to_key.insert(temp.to_owned(), new_key.clone());
            }
            self.by_key.insert(new_key, entity);
        }
    }

    fn forget_temp(&mut self, entity: &Entity) {
        if let Some(temp) = entity.temp_id() {
            self.temp_to_key.remove(temp);
        }
    }
}

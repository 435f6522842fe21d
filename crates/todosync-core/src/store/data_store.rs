// ── Local state store ──
//
// The client-side replica: one entity collection per resource type,
// the scalar/aggregate fields, and the per-type sync cursors.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;

use super::collection::EntityCollection;
use super::cursor::SyncCursors;
use crate::command::{ScalarMap, Undo};
use crate::model::{Entity, EntityId, ResourceType};

/// Local replica of the account state.
///
/// Holds exactly one entity per identity key per resource type. Only
/// reconciliation and the optimistic manager paths mutate it.
#[derive(Debug, Clone)]
pub struct DataStore {
    pub(crate) collections: HashMap<ResourceType, EntityCollection>,
    pub(crate) cursors: SyncCursors,
    pub(crate) day_orders: Map<String, Value>,
    pub(crate) day_orders_timestamp: Option<String>,
    pub(crate) live_notifications_last_read_id: Option<Value>,
    pub(crate) locations: Vec<Value>,
    pub(crate) settings_notifications: Map<String, Value>,
    pub(crate) user: Map<String, Value>,
    pub(crate) user_settings: Map<String, Value>,
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DataStore {
    pub fn new() -> Self {
        Self {
            collections: ResourceType::COLLECTIONS
                .into_iter()
                .map(|rt| (rt, EntityCollection::new(rt)))
                .collect(),
            cursors: SyncCursors::new(),
            day_orders: Map::new(),
            day_orders_timestamp: None,
            live_notifications_last_read_id: None,
            locations: Vec::new(),
            settings_notifications: Map::new(),
            user: Map::new(),
            user_settings: Map::new(),
        }
    }

    // ── Entity lookups ───────────────────────────────────────────────

    /// Find by durable id, falling back to a pending entity whose
    /// `temp_id` equals the stringified query.
    pub fn find(&self, resource: ResourceType, id: impl Into<EntityId>) -> Option<&Entity> {
        self.collections.get(&resource)?.find(&id.into().as_key())
    }

    pub(crate) fn find_mut(
        &mut self,
        resource: ResourceType,
        id: &EntityId,
    ) -> Option<&mut Entity> {
        self.collections.get_mut(&resource)?.find_mut(&id.as_key())
    }

    /// Every entity of `resource`, tombstoned ones included.
    pub fn all(&self, resource: ResourceType) -> impl Iterator<Item = &Entity> {
        self.collections
            .get(&resource)
            .into_iter()
            .flat_map(EntityCollection::iter)
    }

    pub fn count(&self, resource: ResourceType) -> usize {
        self.collections.get(&resource).map_or(0, EntityCollection::len)
    }

    pub fn collaborator_state(
        &self,
        project_id: &EntityId,
        user_id: &EntityId,
    ) -> Option<&Entity> {
        self.collections
            .get(&ResourceType::CollaboratorStates)?
            .get_by_key(&ResourceType::state_key(project_id, user_id))
    }

    // ── Scalar accessors ─────────────────────────────────────────────

    pub fn cursors(&self) -> &SyncCursors {
        &self.cursors
    }

    pub fn day_orders(&self) -> &Map<String, Value> {
        &self.day_orders
    }

    pub fn day_orders_timestamp(&self) -> Option<&str> {
        self.day_orders_timestamp.as_deref()
    }

    pub fn live_notifications_last_read_id(&self) -> Option<&Value> {
        self.live_notifications_last_read_id.as_ref()
    }

    pub fn locations(&self) -> &[Value] {
        &self.locations
    }

    pub fn settings_notifications(&self) -> &Map<String, Value> {
        &self.settings_notifications
    }

    pub fn user(&self) -> &Map<String, Value> {
        &self.user
    }

    pub fn user_settings(&self) -> &Map<String, Value> {
        &self.user_settings
    }

    pub(crate) fn scalar_mut(&mut self, target: ScalarMap) -> &mut Map<String, Value> {
        match target {
            ScalarMap::User => &mut self.user,
            ScalarMap::UserSettings => &mut self.user_settings,
            ScalarMap::DayOrders => &mut self.day_orders,
        }
    }

    // ── Structural mutation ──────────────────────────────────────────

    /// Insert (or replace) an entity in its collection.
    pub(crate) fn insert(&mut self, entity: Entity) -> bool {
        match self.collections.get_mut(&entity.resource()) {
            Some(collection) => collection.insert(entity),
            None => false,
        }
    }

    pub(crate) fn remove(&mut self, resource: ResourceType, id: &EntityId) -> Option<Entity> {
        let collection = self.collections.get_mut(&resource)?;
        let key = collection.find_key(&id.as_key())?.to_owned();
        collection.remove_key(&key)
    }

    /// Drop every entity, scalar, and cursor.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Reverse one optimistic edit.
    pub(crate) fn apply_undo(&mut self, undo: &Undo) {
        match undo {
            Undo::Discard { resource, temp_id } => {
                if self.remove(*resource, &EntityId::from(temp_id.as_str())).is_some() {
                    debug!(%resource, temp_id, "discarded rejected optimistic add");
                }
            }
            Undo::Restore {
                resource,
                id,
                fields,
            } => {
                let Some(entity) = self.find_mut(*resource, id) else {
                    return;
                };
                for (field, prior) in fields {
                    match prior {
                        Some(value) => {
                            entity.set(field.clone(), value.clone());
                        }
                        None => {
                            entity.remove(field);
                        }
                    }
                }
                debug!(%resource, %id, "restored fields after rejected command");
            }
            Undo::RestoreScalar { target, fields } => {
                let map = self.scalar_mut(*target);
                for (field, prior) in fields {
                    match prior {
                        Some(value) => {
                            map.insert(field.clone(), value.clone());
                        }
                        None => {
                            map.remove(field);
                        }
                    }
                }
            }
            Undo::RestoreLocations(prior) => self.locations.clone_from(prior),
            Undo::RestoreLastRead(prior) => {
                self.live_notifications_last_read_id.clone_from(prior);
            }
        }
    }

    // ── Export ───────────────────────────────────────────────────────

    /// The whole state in sync-payload shape (no cursor).
    ///
    /// Entities still waiting for a durable id are left out; the queued
    /// command that would create them is not part of the state.
    pub fn to_payload(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for resource in ResourceType::COLLECTIONS {
            let records: Vec<Value> = self
                .all(resource)
                .filter(|e| e.temp_id().is_none())
                .map(|e| Value::Object(e.data().clone()))
                .collect();
            out.insert(resource.name().to_owned(), Value::Array(records));
        }
        out.insert("day_orders".into(), Value::Object(self.day_orders.clone()));
        if let Some(ts) = &self.day_orders_timestamp {
            out.insert("day_orders_timestamp".into(), Value::from(ts.as_str()));
        }
        if let Some(id) = &self.live_notifications_last_read_id {
            out.insert("live_notifications_last_read_id".into(), id.clone());
        }
        out.insert("locations".into(), Value::Array(self.locations.clone()));
        out.insert(
            "settings_notifications".into(),
            Value::Object(self.settings_notifications.clone()),
        );
        out.insert("user".into(), Value::Object(self.user.clone()));
        out.insert("user_settings".into(), Value::Object(self.user_settings.clone()));
        out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn find_accepts_numeric_or_string_ids() {
        let mut store = DataStore::new();
        store.insert(Entity::new(ResourceType::Projects, obj(json!({"id": 42, "name": "A"}))));
        assert!(store.find(ResourceType::Projects, 42).is_some());
        assert!(store.find(ResourceType::Projects, "42").is_some());
        assert!(store.find(ResourceType::Items, 42).is_none());
    }

    #[test]
    fn scalar_resources_have_no_collection() {
        let mut store = DataStore::new();
        assert!(!store.insert(Entity::new(ResourceType::User, obj(json!({"id": 1})))));
        assert_eq!(store.all(ResourceType::Locations).count(), 0);
    }

    #[test]
    fn undo_restore_puts_fields_back() {
        let mut store = DataStore::new();
        store.insert(Entity::new(ResourceType::Items, obj(json!({"id": 1, "content": "new", "checked": 1}))));
        store.apply_undo(&Undo::Restore {
            resource: ResourceType::Items,
            id: EntityId::from(1),
            fields: vec![
                ("content".into(), Some(json!("old"))),
                ("checked".into(), None),
            ],
        });
        let item = store.find(ResourceType::Items, 1).unwrap();
        assert_eq!(item.get_str("content"), Some("old"));
        assert!(item.get("checked").is_none());
    }

    #[test]
    fn undo_discard_removes_pending_add() {
        let mut store = DataStore::new();
        store.insert(Entity::pending(ResourceType::Labels, "tmp", obj(json!({"name": "x"}))));
        store.apply_undo(&Undo::Discard {
            resource: ResourceType::Labels,
            temp_id: "tmp".into(),
        });
        assert_eq!(store.count(ResourceType::Labels), 0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut store = DataStore::new();
        store.insert(Entity::new(ResourceType::Items, obj(json!({"id": 1}))));
        store.user.insert("id".into(), json!(5));
        store.cursors.advance(&crate::store::SyncScope::All, "tok");
        store.reset();
        assert_eq!(store.count(ResourceType::Items), 0);
        assert!(store.user().is_empty());
        assert_eq!(store.cursors().global(), Some("*"));
    }
}

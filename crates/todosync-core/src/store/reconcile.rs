// ── Reconciliation ──
//
// Folds a server delta into the store. The payload is validated into a
// `SyncPayload` first so a malformed response never leaves the store
// half-updated. Applying the same payload twice yields the same state.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use super::cursor::SyncScope;
use super::DataStore;
use crate::command::CommandStatus;
use crate::error::CoreError;
use crate::model::{Entity, EntityId, ResourceType, is_deleted_flag};

// ── Validated payload ────────────────────────────────────────────────

/// Scalar and aggregate fields carried by a payload. `None` = absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ScalarUpdates {
    pub day_orders: Option<Map<String, Value>>,
    pub day_orders_timestamp: Option<String>,
    pub live_notifications_last_read_id: Option<Value>,
    pub locations: Option<Vec<Value>>,
    pub settings_notifications: Option<Map<String, Value>>,
    pub user: Option<Map<String, Value>>,
    pub user_settings: Option<Map<String, Value>>,
}

/// A sync response that passed shape validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct SyncPayload {
    pub sync_token: Option<String>,
    pub full_sync: bool,
    pub temp_id_mapping: IndexMap<String, EntityId>,
    pub sync_status: Option<IndexMap<String, CommandStatus>>,
    pub scalars: ScalarUpdates,
    pub collections: Vec<(ResourceType, Vec<Map<String, Value>>)>,
}

impl SyncPayload {
    /// Validate every field the store will read. Unknown fields are
    /// ignored; a known field with the wrong shape fails the whole
    /// payload.
    pub(crate) fn parse(raw: &Map<String, Value>) -> Result<Self, CoreError> {
        let mut payload = Self {
            sync_token: opt_scalar_string(raw, "sync_token")?,
            full_sync: match raw.get("full_sync") {
                None | Some(Value::Null) => false,
                Some(v) => is_deleted_flag(Some(v)),
            },
            ..Self::default()
        };

        if let Some(mapping) = opt_object(raw, "temp_id_mapping")? {
            for (temp, id) in mapping {
                let id = EntityId::from_value(id).ok_or_else(|| malformed(&format!(
                    "temp_id_mapping[{temp}] is not an id: {id}"
                )))?;
                payload.temp_id_mapping.insert(temp.clone(), id);
            }
        }

        if let Some(statuses) = opt_object(raw, "sync_status")? {
            payload.sync_status = Some(
                statuses
                    .iter()
                    .map(|(token, v)| (token.clone(), CommandStatus::from_value(v)))
                    .collect(),
            );
        }

        payload.scalars = ScalarUpdates {
            day_orders: opt_object(raw, "day_orders")?.cloned(),
            day_orders_timestamp: opt_scalar_string(raw, "day_orders_timestamp")?,
            live_notifications_last_read_id: raw
                .get("live_notifications_last_read_id")
                .filter(|v| !v.is_null())
                .cloned(),
            locations: opt_array(raw, "locations")?.cloned(),
            settings_notifications: opt_object(raw, "settings_notifications")?.cloned(),
            user: opt_object(raw, "user")?.cloned(),
            user_settings: opt_object(raw, "user_settings")?.cloned(),
        };

        for resource in ResourceType::COLLECTIONS {
            let Some(records) = opt_array(raw, resource.name())? else {
                continue;
            };
            let records = records
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    r.as_object().cloned().ok_or_else(|| {
                        malformed(&format!("{}[{i}] is not an object", resource.name()))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            payload.collections.push((resource, records));
        }

        Ok(payload)
    }
}

fn malformed(message: &str) -> CoreError {
    CoreError::MalformedResponse {
        message: message.to_owned(),
    }
}

fn opt_object<'a>(
    raw: &'a Map<String, Value>,
    field: &str,
) -> Result<Option<&'a Map<String, Value>>, CoreError> {
    match raw.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(malformed(&format!("`{field}` is not an object"))),
    }
}

fn opt_array<'a>(raw: &'a Map<String, Value>, field: &str) -> Result<Option<&'a Vec<Value>>, CoreError> {
    match raw.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items)),
        Some(_) => Err(malformed(&format!("`{field}` is not an array"))),
    }
}

fn opt_scalar_string(raw: &Map<String, Value>, field: &str) -> Result<Option<String>, CoreError> {
    match raw.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(malformed(&format!("`{field}` is not a string"))),
    }
}

// ── Summary ──────────────────────────────────────────────────────────

/// What one reconciliation pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub added: usize,
    pub updated: usize,
    pub removed: usize,
    /// Tombstones for entities the store never had.
    pub ignored_tombstones: usize,
    /// Records without an identity key.
    pub skipped: usize,
    pub temp_ids_resolved: usize,
    pub full_sync: bool,
}

// ── Application ──────────────────────────────────────────────────────

impl DataStore {
    /// Validate and apply a raw sync payload.
    ///
    /// A new `sync_token` is stored only for the types in `scope`.
    pub fn reconcile(
        &mut self,
        payload: &Map<String, Value>,
        scope: &SyncScope,
    ) -> Result<ReconcileStats, CoreError> {
        let parsed = SyncPayload::parse(payload)?;
        Ok(self.apply_payload(&parsed, scope))
    }

    pub(crate) fn apply_payload(&mut self, payload: &SyncPayload, scope: &SyncScope) -> ReconcileStats {
        let mut stats = ReconcileStats {
            full_sync: payload.full_sync,
            ..ReconcileStats::default()
        };

        if let Some(token) = &payload.sync_token {
            self.cursors.advance(scope, token);
        }

        for (temp, durable) in &payload.temp_id_mapping {
            if self.resolve_temp_id(temp, durable) {
                stats.temp_ids_resolved += 1;
            }
        }

        self.apply_scalars(&payload.scalars);

        for (resource, records) in &payload.collections {
            self.reconcile_collection(*resource, records, &mut stats);
        }

        debug!(
            added = stats.added,
            updated = stats.updated,
            removed = stats.removed,
            full_sync = stats.full_sync,
            "reconciled sync payload"
        );
        stats
    }

    fn apply_scalars(&mut self, scalars: &ScalarUpdates) {
        if let Some(day_orders) = &scalars.day_orders {
            merge_map(&mut self.day_orders, day_orders);
        }
        if let Some(ts) = &scalars.day_orders_timestamp {
            self.day_orders_timestamp = Some(ts.clone());
        }
        if let Some(id) = &scalars.live_notifications_last_read_id {
            self.live_notifications_last_read_id = Some(id.clone());
        }
        if let Some(locations) = &scalars.locations {
            self.locations.clone_from(locations);
        }
        if let Some(settings) = &scalars.settings_notifications {
            merge_map(&mut self.settings_notifications, settings);
        }
        if let Some(user) = &scalars.user {
            merge_map(&mut self.user, user);
        }
        if let Some(settings) = &scalars.user_settings {
            merge_map(&mut self.user_settings, settings);
        }
    }

    fn reconcile_collection(
        &mut self,
        resource: ResourceType,
        records: &[Map<String, Value>],
        stats: &mut ReconcileStats,
    ) {
        let Some(collection) = self.collections.get_mut(&resource) else {
            return;
        };

        for record in records {
            let Some(identity) = resource.identity(record) else {
                warn!(%resource, "record without identity key, skipping");
                stats.skipped += 1;
                continue;
            };
            let existing = collection.find_key(&identity).map(str::to_owned);

            match (existing, is_deleted_flag(record.get("is_deleted"))) {
                (Some(key), true) => {
                    collection.remove_key(&key);
                    stats.removed += 1;
                }
                (None, true) => stats.ignored_tombstones += 1,
                (Some(key), false) => {
                    collection.merge_at(&key, record);
                    stats.updated += 1;
                }
                (None, false) => {
                    collection.insert(Entity::new(resource, record.clone()));
                    stats.added += 1;
                }
            }
        }

        trace!(%resource, records = records.len(), total = collection.len(), "collection reconciled");
    }

    /// Attach `durable` to the entity created as `temp_id` and rewrite
    /// every field that still refers to the temp id.
    ///
    /// Returns `true` if an owning entity was found.
    pub fn resolve_temp_id(&mut self, temp_id: &str, durable: &EntityId) -> bool {
        let mut owner = None;
        for resource in ResourceType::ADDABLE {
            if let Some(collection) = self.collections.get_mut(&resource) {
                if collection.resolve_temp(temp_id, durable) {
                    owner = Some(resource);
                    break;
                }
            }
        }

        let rewritten: usize = self
            .collections
            .values_mut()
            .map(|c| c.rewrite_references(temp_id, durable))
            .sum();

        match owner {
            Some(resource) => debug!(%resource, temp_id, id = %durable, rewritten, "temp id resolved"),
            None => trace!(temp_id, id = %durable, rewritten, "temp id has no local owner"),
        }
        owner.is_some()
    }
}

fn merge_map(target: &mut Map<String, Value>, delta: &Map<String, Value>) {
    for (k, v) in delta {
        target.insert(k.clone(), v.clone());
    }
}

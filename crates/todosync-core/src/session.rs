// ── Sync session ──
//
// Owns the store, the command queue, the temp-id mapping table, and
// the transport. `sync` and `commit` take `&mut self`, so at most one
// request is ever in flight per session.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use todosync_api::{ApiResponse, SyncClient, SyncRequest};

use crate::cache::StateCache;
use crate::command::{Command, CommandQueue, CommandStatus, Undo};
use crate::config::SessionConfig;
use crate::error::CoreError;
use crate::model::{Entity, EntityId, ResourceType};
use crate::store::{DataStore, ReconcileStats, SyncPayload, SyncScope};
use crate::transport::Transport;

/// Result of a commit that produced a response.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitOutcome {
    /// The raw response object.
    pub response: Map<String, Value>,
    /// Per-command status, keyed by idempotency token. Empty when the
    /// service sent no status map.
    pub statuses: IndexMap<String, CommandStatus>,
    pub stats: ReconcileStats,
}

impl CommitOutcome {
    /// Rejected commands, in the order the service listed them.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &CommandStatus)> {
        self.statuses
            .iter()
            .filter(|(_, s)| !s.is_ok())
            .map(|(token, s)| (token.as_str(), s))
    }

    pub fn is_ok(&self) -> bool {
        self.statuses.values().all(CommandStatus::is_ok)
    }
}

/// A client session against the sync service.
pub struct Session<T: Transport = SyncClient> {
    config: SessionConfig,
    transport: T,
    pub(crate) store: DataStore,
    pub(crate) queue: CommandQueue,
    pub(crate) temp_ids: IndexMap<String, EntityId>,
    cache: Option<StateCache>,
}

impl Session<SyncClient> {
    /// Build the HTTP client from `config` and warm-start from the
    /// cache directory, if one is configured.
    pub fn open(config: SessionConfig) -> Result<Self, CoreError> {
        let client = SyncClient::new(&config.endpoint, config.token.clone(), &config.transport())?;
        Ok(Self::with_transport(config, client))
    }
}

impl<T: Transport> Session<T> {
    pub fn with_transport(config: SessionConfig, transport: T) -> Self {
        let cache = config
            .cache_dir
            .as_ref()
            .map(|dir| StateCache::new(dir, &config.token));
        let mut session = Self {
            config,
            transport,
            store: DataStore::new(),
            queue: CommandQueue::new(),
            temp_ids: IndexMap::new(),
            cache,
        };
        session.warm_start();
        session
    }

    fn warm_start(&mut self) {
        let Some(cache) = &self.cache else {
            return;
        };
        let cached = match cache.read() {
            Ok(Some(cached)) => cached,
            Ok(None) => {
                debug!("no cached state, cold start");
                return;
            }
            Err(e) => {
                warn!(error = %e, "ignoring unreadable state cache");
                return;
            }
        };
        match SyncPayload::parse(&cached.payload) {
            Ok(payload) => {
                self.store.apply_payload(&payload, &SyncScope::Only(Vec::new()));
                self.store.cursors = cached.cursors;
                self.temp_ids = cached.temp_ids;
                info!(
                    projects = self.store.count(ResourceType::Projects),
                    items = self.store.count(ResourceType::Items),
                    "warm start from state cache"
                );
            }
            Err(e) => warn!(error = %e, "ignoring malformed state cache"),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Temp id → durable id pairs learned from commit responses.
    pub fn temp_ids(&self) -> &IndexMap<String, EntityId> {
        &self.temp_ids
    }

    /// The cursor shared by every resource type, if they agree.
    pub fn sync_token(&self) -> Option<&str> {
        self.store.cursors().global()
    }

    /// Map a temp id that has already been resolved to its durable id.
    pub fn canonical_id(&self, id: EntityId) -> EntityId {
        if let EntityId::Text(temp) = &id {
            if let Some(durable) = self.temp_ids.get(temp) {
                return durable.clone();
            }
        }
        id
    }

    /// Replace values that name an already-resolved temp id with the
    /// durable id, so new commands never carry a stale temp id.
    pub(crate) fn canonicalize(&self, mut fields: Map<String, Value>) -> Map<String, Value> {
        if self.temp_ids.is_empty() {
            return fields;
        }
        for value in fields.values_mut() {
            if let Some(durable) = value.as_str().and_then(|s| self.temp_ids.get(s)) {
                *value = durable.to_value();
            }
        }
        fields
    }

    /// Look an entity up by durable id, pending temp id, or a temp id
    /// that was resolved in an earlier commit.
    pub fn find(&self, resource: ResourceType, id: impl Into<EntityId>) -> Option<&Entity> {
        self.store.find(resource, self.canonical_id(id.into()))
    }

    // ── Queue ────────────────────────────────────────────────────────

    /// Queue a raw command. Nothing is sent until [`Session::commit`].
    pub fn enqueue(&mut self, command: Command) {
        debug!(kind = command.kind(), uuid = command.uuid(), "command queued");
        self.queue.enqueue(command);
    }

    pub(crate) fn enqueue_with_undo(&mut self, command: Command, undo: Vec<Undo>) {
        debug!(kind = command.kind(), uuid = command.uuid(), "command queued");
        self.queue.enqueue_with_undo(command, undo);
    }

    /// Record a temp id → durable id pair and update the store.
    pub fn resolve_temp_id(&mut self, temp_id: &str, durable: &EntityId) -> bool {
        self.temp_ids.insert(temp_id.to_owned(), durable.clone());
        self.store.resolve_temp_id(temp_id, durable)
    }

    /// Drop all local state, pending commands, and cursors.
    pub fn reset_state(&mut self) {
        self.store.reset();
        self.queue.drain();
        self.temp_ids.clear();
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.clear() {
                warn!(error = %e, "failed to clear state cache");
            }
        }
        info!("local state reset");
    }

    // ── Sync ─────────────────────────────────────────────────────────

    /// Send `commands` (usually none) and fold the response into the
    /// store. Returns the raw response.
    ///
    /// Commands passed here bypass the queue and carry no optimistic
    /// undo records.
    pub async fn sync(
        &mut self,
        commands: &[Command],
        scope: &SyncScope,
    ) -> Result<Map<String, Value>, CoreError> {
        let request = self.build_request(commands, scope)?;
        let (raw, payload) = self.exchange(&request).await?;
        self.apply(&payload, scope, &[]);
        Ok(raw)
    }

    /// Read-only sync of `scope`.
    pub async fn pull(&mut self, scope: &SyncScope) -> Result<ReconcileStats, CoreError> {
        let request = self.build_request(&[], scope)?;
        let (_, payload) = self.exchange(&request).await?;
        Ok(self.apply(&payload, scope, &[]))
    }

    /// Flush the command queue.
    ///
    /// Returns `Ok(None)` without touching the network when the queue is
    /// empty. The queue is drained only once a well-formed response is
    /// in hand; on any earlier failure it is left intact and can be
    /// committed again verbatim.
    ///
    /// Optimistic edits of rejected commands are rolled back before the
    /// response's deltas are applied. With `raise_on_error`, the first
    /// rejected command in submission order is returned as
    /// [`CoreError::SyncStatus`] after the rest of the response has been
    /// applied.
    pub async fn commit(&mut self, raise_on_error: bool) -> Result<Option<CommitOutcome>, CoreError> {
        if self.queue.is_empty() {
            debug!("nothing to commit");
            return Ok(None);
        }

        let commands = self.queue.commands();
        let scope = SyncScope::All;
        let request = self.build_request(&commands, &scope)?;
        info!(commands = commands.len(), "committing queued commands");

        let (raw, payload) = self.exchange(&request).await?;
        let entries = self.queue.drain_entries();

        let statuses = payload.sync_status.clone().unwrap_or_default();
        let mut rejected = vec![false; entries.len()];
        let mut first_failure = None;
        for (i, entry) in entries.iter().enumerate() {
            let Some(status) = statuses.get(entry.command.uuid()) else {
                continue;
            };
            if status.is_ok() {
                continue;
            }
            warn!(
                kind = entry.command.kind(),
                uuid = entry.command.uuid(),
                %status,
                "command rejected"
            );
            if first_failure.is_none() {
                first_failure = Some((entry.command.uuid().to_owned(), status.clone()));
            }
            rejected[i] = true;
        }

        // Later edits are undone first so earlier prior values win. A
        // field an accepted later command also set keeps its value.
        let mut undo = Vec::new();
        for (i, entry) in entries.iter().enumerate().rev() {
            if !rejected[i] {
                continue;
            }
            let accepted_later: Vec<&Undo> = entries[i + 1..]
                .iter()
                .zip(&rejected[i + 1..])
                .filter(|(_, was_rejected)| !**was_rejected)
                .flat_map(|(later, _)| &later.undo)
                .collect();
            undo.extend(
                entry
                    .undo
                    .iter()
                    .rev()
                    .filter_map(|step| step.unshadowed(&accepted_later)),
            );
        }
        let stats = self.apply(&payload, &scope, &undo);

        if raise_on_error {
            if let Some((token, status)) = first_failure {
                return Err(CoreError::SyncStatus { token, status });
            }
        }

        Ok(Some(CommitOutcome {
            response: raw,
            statuses,
            stats,
        }))
    }

    // ── Plain calls ──────────────────────────────────────────────────

    /// GET `call` and hand back the body. Nothing is reconciled.
    pub async fn call(&self, call: &str, params: &[(&str, String)]) -> Result<ApiResponse, CoreError> {
        debug!(call, "plain GET");
        Ok(self.transport.get(call, params).await?)
    }

    // ── Single-object fetch ──────────────────────────────────────────

    /// GET `call` and reconcile the sections of the result listed in
    /// `sections` (response key, resource type).
    ///
    /// Returns `Ok(None)` when the service answers with an `error`
    /// field (the object does not exist). A plain-text body is returned
    /// as a string value and reconciles nothing.
    pub async fn fetch(
        &mut self,
        call: &str,
        params: &[(&str, String)],
        sections: &[(&str, ResourceType)],
    ) -> Result<Option<Value>, CoreError> {
        let value = match self.transport.get(call, params).await? {
            ApiResponse::Json(value) => value,
            ApiResponse::Text(text) => return Ok(Some(Value::String(text))),
        };
        let Some(object) = value.as_object() else {
            return Ok(Some(value));
        };
        if object.contains_key("error") {
            debug!(call, "object not found");
            return Ok(None);
        }

        let mut delta = Map::new();
        for (field, resource) in sections {
            let records = match object.get(*field) {
                Some(Value::Object(record)) => vec![Value::Object(record.clone())],
                Some(Value::Array(records)) => records.clone(),
                _ => continue,
            };
            delta.insert(resource.name().to_owned(), Value::Array(records));
        }
        let payload = SyncPayload::parse(&delta)?;
        self.store.apply_payload(&payload, &SyncScope::Only(Vec::new()));
        Ok(Some(value))
    }

    // ── Internals ────────────────────────────────────────────────────

    fn build_request(&self, commands: &[Command], scope: &SyncScope) -> Result<SyncRequest, CoreError> {
        let commands = commands
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SyncRequest {
            sync_token: self.store.cursors().token_for(scope),
            resource_types: scope.to_param(),
            commands,
            day_orders_timestamp: self.store.day_orders_timestamp().map(str::to_owned),
            include_notification_settings: self.config.include_notification_settings,
        })
    }

    /// Send and validate. Nothing local changes before this returns `Ok`.
    async fn exchange(
        &self,
        request: &SyncRequest,
    ) -> Result<(Map<String, Value>, SyncPayload), CoreError> {
        let raw = self.transport.sync(request).await?;
        let payload = SyncPayload::parse(&raw)?;
        Ok((raw, payload))
    }

    fn apply(&mut self, payload: &SyncPayload, scope: &SyncScope, undo: &[Undo]) -> ReconcileStats {
        for (temp, durable) in &payload.temp_id_mapping {
            self.temp_ids.insert(temp.clone(), durable.clone());
        }
        for step in undo {
            self.store.apply_undo(step);
        }
        let stats = self.store.apply_payload(payload, scope);
        self.write_cache();
        stats
    }

    fn write_cache(&self) {
        let Some(cache) = &self.cache else {
            return;
        };
        if let Err(e) = cache.write(&self.store, &self.temp_ids) {
            warn!(error = %e, "failed to write state cache");
        }
    }
}

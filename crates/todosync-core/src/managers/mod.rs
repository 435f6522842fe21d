// ── Per-resource managers ──
//
// Thin typed façades over a borrowed `Session`. Each call applies its
// optimistic edit to the store, records how to undo it, and queues one
// command. Nothing is sent until `Session::commit`.
//
// Which operations a resource offers is decided by the marker traits
// its type implements (`Creatable`, `Archivable`, ...).

mod account;
mod invitations;
mod items;
mod labels;
mod notes;
mod notifications;
mod projects;
mod queries;
mod reminders;
mod sections;
mod sharing;

use std::marker::PhantomData;

use serde_json::{Map, Value};

use crate::command::{Command, Undo};
use crate::error::CoreError;
use crate::model::{Entity, EntityId, ResourceType};
use crate::session::Session;
use crate::transport::Transport;

pub use account::{Locations, User, UserSettings};
pub use invitations::Invitations;
pub use items::{ItemDestination, Items};
pub use labels::{Filters, Labels};
pub use notes::{Notes, ProjectNotes};
pub use notifications::LiveNotifications;
pub use projects::Projects;
pub use reminders::Reminders;
pub use sections::Sections;
pub use sharing::{CollaboratorStates, Collaborators};

// ── Capability traits ────────────────────────────────────────────────

/// A resource type reachable through a manager.
pub trait Resource {
    const TYPE: ResourceType;
}

/// Supports `<object>_add`, `<object>_update` and `<object>_delete`.
pub trait Creatable: Resource {}

/// Supports `<object>_archive` / `<object>_unarchive`.
pub trait Archivable: Resource {}

/// Supports `<object>_reorder` on `child_order`.
pub trait Orderable: Resource {}

/// Supports `<object>_update_orders` on `item_order`.
pub trait OrderMapped: Resource {}

/// Has a single-object GET call whose result is reconciled.
pub trait Fetchable: Resource {
    const GET_CALL: &'static str;
    const ID_PARAM: &'static str;
    /// Response sections to reconcile: (response key, resource type).
    const SECTIONS: &'static [(&'static str, ResourceType)];
}

// ── Manager ──────────────────────────────────────────────────────────

/// Typed view of one resource type inside a session.
pub struct Manager<'s, T: Transport, R> {
    pub(crate) session: &'s mut Session<T>,
    _resource: PhantomData<R>,
}

impl<'s, T: Transport, R> Manager<'s, T, R> {
    pub(crate) fn new(session: &'s mut Session<T>) -> Self {
        Self {
            session,
            _resource: PhantomData,
        }
    }
}

impl<T: Transport, R: Resource> Manager<'_, T, R> {
    /// Command name for `action` on this type (`project_add`).
    pub(crate) fn kind(action: &str) -> String {
        match R::TYPE.object_type() {
            Some(object) => format!("{object}_{action}"),
            None => action.to_owned(),
        }
    }

    /// Look up by durable id or temp id. Like [`Manager::all`], an
    /// entity deleted locally but not yet confirmed reads as absent;
    /// [`Session::find`] still returns it.
    pub fn get(&self, id: impl Into<EntityId>) -> Option<&Entity> {
        self.session.find(R::TYPE, id).filter(|e| !e.is_deleted())
    }

    /// Every live entity of this type. Entities deleted locally but not
    /// yet confirmed by the service are skipped.
    pub fn all(&self) -> impl Iterator<Item = &Entity> {
        self.session
            .store
            .all(R::TYPE)
            .filter(|e| !e.is_deleted())
    }

    /// Set `fields` on the local entity and return the undo record.
    /// An entity that is not in the store yields no undo record.
    pub(crate) fn patch_local(&mut self, id: &EntityId, fields: &Map<String, Value>) -> Vec<Undo> {
        let Some(entity) = self.session.store.find_mut(R::TYPE, id) else {
            return Vec::new();
        };
        let prior = fields
            .iter()
            .map(|(field, value)| (field.clone(), entity.set(field.clone(), value.clone())))
            .collect();
        vec![Undo::Restore {
            resource: R::TYPE,
            id: id.clone(),
            fields: prior,
        }]
    }

    /// Queue `<object>_<action>` for `id` with `fields` applied locally.
    pub(crate) fn edit(&mut self, action: &str, id: impl Into<EntityId>, fields: Map<String, Value>) {
        let id = self.session.canonical_id(id.into());
        let fields = self.session.canonicalize(fields);
        let undo = self.patch_local(&id, &fields);

        let mut args = Map::new();
        args.insert("id".into(), id.to_value());
        args.extend(fields);
        self.session
            .enqueue_with_undo(Command::new(Self::kind(action), args), undo);
    }
}

impl<T: Transport, R: Creatable> Manager<'_, T, R> {
    /// Optimistically create an entity from `fields` and queue its add
    /// command. Returns the temp id the entity is known by until the
    /// service assigns a durable one.
    pub fn create(&mut self, fields: Map<String, Value>) -> EntityId {
        let temp = EntityId::temp();
        let temp_id = temp.to_string();
        let args = self.session.canonicalize(fields);

        self.session
            .store
            .insert(Entity::pending(R::TYPE, &temp_id, args.clone()));
        self.session.enqueue_with_undo(
            Command::create(Self::kind("add"), temp_id.clone(), args),
            vec![Undo::Discard {
                resource: R::TYPE,
                temp_id,
            }],
        );
        temp
    }

    /// Merge `fields` into the entity locally and queue the update.
    pub fn update(&mut self, id: impl Into<EntityId>, fields: Map<String, Value>) {
        self.edit("update", id, fields);
    }

    /// Mark the entity deleted locally and queue the delete. The entity
    /// leaves the store when the service confirms with a tombstone.
    pub fn delete(&mut self, id: impl Into<EntityId>) {
        let id = self.session.canonical_id(id.into());
        let undo = self.patch_local(&id, &field_map([("is_deleted", Value::Bool(true))]));
        self.session.enqueue_with_undo(
            Command::new(Self::kind("delete"), field_map([("id", id.to_value())])),
            undo,
        );
    }
}

impl<T: Transport, R: Archivable> Manager<'_, T, R> {
    pub fn archive(&mut self, id: impl Into<EntityId>) {
        self.edit_flag("archive", id, "is_archived", true);
    }

    pub fn unarchive(&mut self, id: impl Into<EntityId>) {
        self.edit_flag("unarchive", id, "is_archived", false);
    }
}

impl<T: Transport, R: Resource> Manager<'_, T, R> {
    /// Queue `<object>_<action>` with only the id, flipping `flag` locally.
    pub(crate) fn edit_flag(&mut self, action: &str, id: impl Into<EntityId>, flag: &str, on: bool) {
        let id = self.session.canonical_id(id.into());
        let undo = self.patch_local(&id, &field_map([(flag, Value::Bool(on))]));
        self.session.enqueue_with_undo(
            Command::new(Self::kind(action), field_map([("id", id.to_value())])),
            undo,
        );
    }
}

impl<T: Transport, R: Orderable> Manager<'_, T, R> {
    /// Set `child_order` on each listed entity and queue one reorder.
    pub fn reorder(&mut self, orders: &[(EntityId, i64)]) {
        let mut undo = Vec::new();
        let mut entries = Vec::with_capacity(orders.len());
        for (id, order) in orders {
            let id = self.session.canonical_id(id.clone());
            undo.extend(self.patch_local(&id, &field_map([("child_order", Value::from(*order))])));
            entries.push(Value::Object(field_map([
                ("id", id.to_value()),
                ("child_order", Value::from(*order)),
            ])));
        }
        self.session.enqueue_with_undo(
            Command::new(
                Self::kind("reorder"),
                field_map([(R::TYPE.name(), Value::Array(entries))]),
            ),
            undo,
        );
    }
}

impl<T: Transport, R: OrderMapped> Manager<'_, T, R> {
    /// Set `item_order` on each listed entity and queue one
    /// `update_orders` with the id → order mapping.
    pub fn update_orders(&mut self, orders: &[(EntityId, i64)]) {
        let mut undo = Vec::new();
        let mut mapping = Map::new();
        for (id, order) in orders {
            let id = self.session.canonical_id(id.clone());
            undo.extend(self.patch_local(&id, &field_map([("item_order", Value::from(*order))])));
            mapping.insert(id.as_key(), Value::from(*order));
        }
        self.session.enqueue_with_undo(
            Command::new(
                Self::kind("update_orders"),
                field_map([("id_order_mapping", Value::Object(mapping))]),
            ),
            undo,
        );
    }
}

impl<T: Transport, R: Fetchable> Manager<'_, T, R> {
    /// Fetch one object and reconcile it (plus related records) into
    /// the store. `Ok(None)` when the service does not know the id.
    pub async fn fetch(&mut self, id: impl Into<EntityId>) -> Result<Option<Value>, CoreError> {
        let id = self.session.canonical_id(id.into());
        self.session
            .fetch(R::GET_CALL, &[(R::ID_PARAM, id.to_string())], R::SECTIONS)
            .await
    }
}

// ── Session accessors ────────────────────────────────────────────────

impl<T: Transport> Session<T> {
    pub fn projects(&mut self) -> Manager<'_, T, Projects> {
        Manager::new(self)
    }

    pub fn items(&mut self) -> Manager<'_, T, Items> {
        Manager::new(self)
    }

    pub fn labels(&mut self) -> Manager<'_, T, Labels> {
        Manager::new(self)
    }

    pub fn filters(&mut self) -> Manager<'_, T, Filters> {
        Manager::new(self)
    }

    pub fn notes(&mut self) -> Manager<'_, T, Notes> {
        Manager::new(self)
    }

    pub fn project_notes(&mut self) -> Manager<'_, T, ProjectNotes> {
        Manager::new(self)
    }

    pub fn reminders(&mut self) -> Manager<'_, T, Reminders> {
        Manager::new(self)
    }

    pub fn sections(&mut self) -> Manager<'_, T, Sections> {
        Manager::new(self)
    }

    pub fn live_notifications(&mut self) -> Manager<'_, T, LiveNotifications> {
        Manager::new(self)
    }

    pub fn collaborators(&mut self) -> Manager<'_, T, Collaborators> {
        Manager::new(self)
    }

    pub fn collaborator_states(&mut self) -> Manager<'_, T, CollaboratorStates> {
        Manager::new(self)
    }

    pub fn invitations(&mut self) -> Manager<'_, T, Invitations> {
        Manager::new(self)
    }

    pub fn locations(&mut self) -> Manager<'_, T, Locations> {
        Manager::new(self)
    }

    pub fn user(&mut self) -> Manager<'_, T, User> {
        Manager::new(self)
    }

    pub fn user_settings(&mut self) -> Manager<'_, T, UserSettings> {
        Manager::new(self)
    }
}

/// Build an argument map from fixed pairs.
pub(crate) fn field_map<const N: usize>(pairs: [(&str, Value); N]) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v))
        .collect()
}

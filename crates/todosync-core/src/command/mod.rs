// ── Command API ──
//
// Every write is a `Command` placed on the session's queue and flushed
// by `Session::commit`. Commands are immutable once queued; the queue
// only grows until a commit obtains a response and drains it.

mod status;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::model::{EntityId, ResourceType};

pub use status::CommandStatus;

/// A single write operation, as sent in the `commands` request field.
///
/// `uuid` is the idempotency token: the service applies a given token
/// at most once, so a batch may be resent after a transport failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    temp_id: Option<String>,
    uuid: String,
    #[serde(default)]
    args: Map<String, Value>,
}

impl Command {
    pub fn new(kind: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            kind: kind.into(),
            temp_id: None,
            uuid: Uuid::new_v4().to_string(),
            args,
        }
    }

    /// A command that creates an entity known locally as `temp_id`.
    pub fn create(kind: impl Into<String>, temp_id: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            temp_id: Some(temp_id.into()),
            ..Self::new(kind, args)
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    pub fn temp_id(&self) -> Option<&str> {
        self.temp_id.as_deref()
    }

    pub fn args(&self) -> &Map<String, Value> {
        &self.args
    }
}

// ── Optimistic-edit undo records ─────────────────────────────────────

/// Scalar maps that optimistic edits can touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScalarMap {
    User,
    UserSettings,
    DayOrders,
}

/// How to reverse the local effect of a command the service rejected.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Undo {
    /// Drop an optimistically added entity.
    Discard {
        resource: ResourceType,
        temp_id: String,
    },
    /// Put fields of an entity back. `None` means the field was absent.
    Restore {
        resource: ResourceType,
        id: EntityId,
        fields: Vec<(String, Option<Value>)>,
    },
    /// Put keys of a scalar map back.
    RestoreScalar {
        target: ScalarMap,
        fields: Vec<(String, Option<Value>)>,
    },
    /// Put the whole locations list back.
    RestoreLocations(Vec<Value>),
    RestoreLastRead(Option<Value>),
}

impl Undo {
    /// This undo minus whatever `later` edits overwrote. A field another
    /// accepted command set afterwards keeps that command's value.
    /// `None` when nothing is left to restore.
    pub(crate) fn unshadowed(&self, later: &[&Undo]) -> Option<Undo> {
        match self {
            Self::Discard { .. } => Some(self.clone()),
            Self::Restore {
                resource,
                id,
                fields,
            } => {
                let key = id.as_key();
                let fields: Vec<_> = fields
                    .iter()
                    .filter(|(field, _)| {
                        !later.iter().any(|u| u.sets_entity_field(*resource, &key, field))
                    })
                    .cloned()
                    .collect();
                (!fields.is_empty()).then(|| Self::Restore {
                    resource: *resource,
                    id: id.clone(),
                    fields,
                })
            }
            Self::RestoreScalar { target, fields } => {
                let fields: Vec<_> = fields
                    .iter()
                    .filter(|(field, _)| !later.iter().any(|u| u.sets_scalar_key(*target, field)))
                    .cloned()
                    .collect();
                (!fields.is_empty()).then(|| Self::RestoreScalar {
                    target: *target,
                    fields,
                })
            }
            Self::RestoreLocations(_) => later
                .iter()
                .all(|u| !matches!(u, Self::RestoreLocations(_)))
                .then(|| self.clone()),
            Self::RestoreLastRead(_) => later
                .iter()
                .all(|u| !matches!(u, Self::RestoreLastRead(_)))
                .then(|| self.clone()),
        }
    }

    fn sets_entity_field(&self, resource: ResourceType, key: &str, field: &str) -> bool {
        match self {
            Self::Restore {
                resource: r,
                id,
                fields,
            } => *r == resource && id.as_key() == key && fields.iter().any(|(f, _)| f == field),
            _ => false,
        }
    }

    fn sets_scalar_key(&self, target: ScalarMap, field: &str) -> bool {
        match self {
            Self::RestoreScalar { target: t, fields } => {
                *t == target && fields.iter().any(|(f, _)| f == field)
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct QueuedCommand {
    pub(crate) command: Command,
    pub(crate) undo: Vec<Undo>,
}

// ── Queue ────────────────────────────────────────────────────────────

/// Ordered list of commands awaiting commit.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    entries: Vec<QueuedCommand>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command with no local effect to undo.
    pub fn enqueue(&mut self, command: Command) {
        self.enqueue_with_undo(command, Vec::new());
    }

    pub(crate) fn enqueue_with_undo(&mut self, command: Command, undo: Vec<Undo>) {
        self.entries.push(QueuedCommand { command, undo });
    }

    /// Empty the queue, returning its commands in submission order.
    pub fn drain(&mut self) -> Vec<Command> {
        self.drain_entries().into_iter().map(|e| e.command).collect()
    }

    pub(crate) fn drain_entries(&mut self) -> Vec<QueuedCommand> {
        std::mem::take(&mut self.entries)
    }

    /// Snapshot of the queued commands, in submission order.
    pub fn commands(&self) -> Vec<Command> {
        self.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.entries.iter().map(|e| &e.command)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

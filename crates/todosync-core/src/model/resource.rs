// ── Resource types ──
//
// Static table of everything the sync endpoint can scope on. Replaces
// name-based lookup of record constructors: every per-type decision
// (identity key, command prefix, whether local creates exist) is a
// match on this enum.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use super::EntityId;

/// Resource-type tag as used in `resource_types` and payload keys.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResourceType {
    // ── Entity collections ───────────────────────────────────────────
    Projects,
    Items,
    Labels,
    Filters,
    Notes,
    ProjectNotes,
    Reminders,
    Sections,
    LiveNotifications,
    Collaborators,
    CollaboratorStates,

    // ── Scalar / aggregate fields ────────────────────────────────────
    Locations,
    User,
    UserSettings,
    NotificationSettings,
    DayOrders,
}

impl ResourceType {
    /// Entity collections, in the order reconciliation visits them.
    pub const COLLECTIONS: [Self; 11] = [
        Self::Collaborators,
        Self::CollaboratorStates,
        Self::Filters,
        Self::Items,
        Self::Labels,
        Self::LiveNotifications,
        Self::Notes,
        Self::ProjectNotes,
        Self::Projects,
        Self::Reminders,
        Self::Sections,
    ];

    /// Collections that can hold locally created (temp-id) entities.
    pub const ADDABLE: [Self; 8] = [
        Self::Filters,
        Self::Items,
        Self::Labels,
        Self::Notes,
        Self::ProjectNotes,
        Self::Projects,
        Self::Reminders,
        Self::Sections,
    ];

    pub fn is_collection(self) -> bool {
        Self::COLLECTIONS.contains(&self)
    }

    pub fn supports_add(self) -> bool {
        Self::ADDABLE.contains(&self)
    }

    /// Wire name (`"project_notes"`, `"items"`, ...).
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Command prefix for this type: `project` in `project_add`.
    ///
    /// Project notes share the `note_*` commands with item notes.
    pub fn object_type(self) -> Option<&'static str> {
        match self {
            Self::Projects => Some("project"),
            Self::Items => Some("item"),
            Self::Labels => Some("label"),
            Self::Filters => Some("filter"),
            Self::Notes | Self::ProjectNotes => Some("note"),
            Self::Reminders => Some("reminder"),
            Self::Sections => Some("section"),
            Self::LiveNotifications => Some("live_notifications"),
            Self::Collaborators => Some("collaborator"),
            Self::User => Some("user"),
            Self::UserSettings => Some("user_settings"),
            Self::CollaboratorStates
            | Self::Locations
            | Self::NotificationSettings
            | Self::DayOrders => None,
        }
    }

    /// Identity key of a record within its collection.
    ///
    /// Live notifications key on `notification_key`, collaborator states
    /// on the `project_id:user_id` pair, everything else on `id`.
    pub fn identity(self, record: &Map<String, Value>) -> Option<String> {
        match self {
            Self::LiveNotifications => record
                .get("notification_key")
                .and_then(EntityId::from_value)
                .or_else(|| record.get("id").and_then(EntityId::from_value))
                .map(|id| id.as_key()),
            Self::CollaboratorStates => {
                let project = record.get("project_id").and_then(EntityId::from_value)?;
                let user = record.get("user_id").and_then(EntityId::from_value)?;
                Some(Self::state_key(&project, &user))
            }
            _ => record
                .get("id")
                .and_then(EntityId::from_value)
                .map(|id| id.as_key()),
        }
    }

    /// Composite key of a collaborator state.
    pub fn state_key(project_id: &EntityId, user_id: &EntityId) -> String {
        format!("{project_id}:{user_id}")
    }
}

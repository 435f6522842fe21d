// ── Notes ──
//
// Item notes and project notes share the `note_*` commands but live in
// separate collections.

use serde_json::Value;

use super::{Creatable, Fetchable, Manager, Resource, field_map};
use crate::model::{EntityId, ResourceType};
use crate::transport::Transport;

/// Marker for the `notes` collection (comments on items).
pub struct Notes;

impl Resource for Notes {
    const TYPE: ResourceType = ResourceType::Notes;
}
impl Creatable for Notes {}
impl Fetchable for Notes {
    const GET_CALL: &'static str = "notes/get";
    const ID_PARAM: &'static str = "note_id";
    const SECTIONS: &'static [(&'static str, ResourceType)] = &[("note", ResourceType::Notes)];
}

/// Marker for the `project_notes` collection.
pub struct ProjectNotes;

impl Resource for ProjectNotes {
    const TYPE: ResourceType = ResourceType::ProjectNotes;
}
impl Creatable for ProjectNotes {}
impl Fetchable for ProjectNotes {
    const GET_CALL: &'static str = "notes/get";
    const ID_PARAM: &'static str = "note_id";
    const SECTIONS: &'static [(&'static str, ResourceType)] =
        &[("note", ResourceType::ProjectNotes)];
}

impl<T: Transport> Manager<'_, T, Notes> {
    pub fn add(&mut self, item_id: &EntityId, content: &str) -> EntityId {
        self.create(field_map([
            ("item_id", item_id.to_value()),
            ("content", Value::from(content)),
        ]))
    }
}

impl<T: Transport> Manager<'_, T, ProjectNotes> {
    pub fn add(&mut self, project_id: &EntityId, content: &str) -> EntityId {
        self.create(field_map([
            ("project_id", project_id.to_value()),
            ("content", Value::from(content)),
        ]))
    }
}

// ── Projects ──

use serde_json::Value;

use super::{Archivable, Creatable, Fetchable, Manager, Orderable, Resource, field_map};
use crate::model::{EntityId, ResourceType};
use crate::transport::Transport;

/// Marker for the `projects` collection.
pub struct Projects;

impl Resource for Projects {
    const TYPE: ResourceType = ResourceType::Projects;
}
impl Creatable for Projects {}
impl Archivable for Projects {}
impl Orderable for Projects {}
impl Fetchable for Projects {
    const GET_CALL: &'static str = "projects/get";
    const ID_PARAM: &'static str = "project_id";
    const SECTIONS: &'static [(&'static str, ResourceType)] = &[
        ("project", ResourceType::Projects),
        ("notes", ResourceType::ProjectNotes),
    ];
}

impl<T: Transport> Manager<'_, T, Projects> {
    /// Create a top-level project named `name`.
    pub fn add(&mut self, name: &str) -> EntityId {
        self.create(field_map([("name", Value::from(name))]))
    }

    /// Re-parent a project. `None` moves it to the top level.
    pub fn move_to(&mut self, id: impl Into<EntityId>, parent_id: Option<&EntityId>) {
        let parent = parent_id.map_or(Value::Null, |p| self.session.canonical_id(p.clone()).to_value());
        self.edit("move", id, field_map([("parent_id", parent)]));
    }
}

// ── Sections ──

use serde_json::Value;

use super::{Archivable, Creatable, Fetchable, Manager, Orderable, Resource, field_map};
use crate::model::{EntityId, ResourceType};
use crate::transport::Transport;

/// Marker for the `sections` collection.
pub struct Sections;

impl Resource for Sections {
    const TYPE: ResourceType = ResourceType::Sections;
}
impl Creatable for Sections {}
impl Archivable for Sections {}
impl Orderable for Sections {}
impl Fetchable for Sections {
    const GET_CALL: &'static str = "sections/get";
    const ID_PARAM: &'static str = "section_id";
    const SECTIONS: &'static [(&'static str, ResourceType)] = &[("section", ResourceType::Sections)];
}

impl<T: Transport> Manager<'_, T, Sections> {
    pub fn add(&mut self, name: &str, project_id: &EntityId) -> EntityId {
        self.create(field_map([
            ("name", Value::from(name)),
            ("project_id", project_id.to_value()),
        ]))
    }

    /// Move a section to another project.
    pub fn move_to(&mut self, id: impl Into<EntityId>, project_id: &EntityId) {
        let project = self.session.canonical_id(project_id.clone());
        self.edit("move", id, field_map([("project_id", project.to_value())]));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use crate::config::SessionConfig;
    use crate::model::{EntityId, ResourceType};
    use crate::session::Session;
    use crate::transport::mock::MockTransport;

    #[test]
    fn section_in_new_project_refers_to_temp_id() {
        let mut s =
            Session::with_transport(SessionConfig::new("t".to_owned()), MockTransport::default());
        let project = s.projects().add("P");
        let section = s.sections().add("Backlog", &project);

        assert_eq!(
            s.find(ResourceType::Sections, section.clone()).unwrap().get("project_id"),
            Some(&project.to_value())
        );

        s.sections().move_to(section, &EntityId::from(9));
        s.sections().unarchive(EntityId::from(1));
        let kinds: Vec<_> = s.queue().iter().map(|c| c.kind().to_owned()).collect();
        assert_eq!(kinds, ["project_add", "section_add", "section_move", "section_unarchive"]);
        assert_eq!(s.queue().iter().nth(2).unwrap().args()["project_id"], json!(9));
    }
}

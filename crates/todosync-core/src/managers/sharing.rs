// ── Collaborators and per-project collaborator state ──

use serde_json::Value;

use super::{Manager, Resource, field_map};
use crate::command::Command;
use crate::model::{Entity, EntityId, ResourceType};
use crate::transport::Transport;

/// Marker for the `collaborators` collection.
pub struct Collaborators;

impl Resource for Collaborators {
    const TYPE: ResourceType = ResourceType::Collaborators;
}

/// Marker for the `collaborator_states` collection, keyed on
/// `(project_id, user_id)`.
pub struct CollaboratorStates;

impl Resource for CollaboratorStates {
    const TYPE: ResourceType = ResourceType::CollaboratorStates;
}

impl<T: Transport> Manager<'_, T, Collaborators> {
    /// Invite `email` to `project_id`. The collaborator and its state
    /// arrive with the next sync.
    pub fn share_project(&mut self, project_id: &EntityId, email: &str) {
        let args = self.session.canonicalize(field_map([
            ("project_id", project_id.to_value()),
            ("email", Value::from(email)),
        ]));
        let temp = EntityId::temp().to_string();
        self.session
            .enqueue(Command::create("share_project", temp, args));
    }

    /// Remove `email` from `project_id`.
    pub fn delete(&mut self, project_id: &EntityId, email: &str) {
        let args = self.session.canonicalize(field_map([
            ("project_id", project_id.to_value()),
            ("email", Value::from(email)),
        ]));
        self.session
            .enqueue(Command::new("delete_collaborator", args));
    }
}

impl<T: Transport> Manager<'_, T, CollaboratorStates> {
    pub fn get_by_ids(&self, project_id: &EntityId, user_id: &EntityId) -> Option<&Entity> {
        self.session.store.collaborator_state(project_id, user_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use crate::config::SessionConfig;
    use crate::model::EntityId;
    use crate::session::Session;
    use crate::store::SyncScope;
    use crate::transport::mock::MockTransport;

    #[test]
    fn share_and_unshare_commands() {
        let mut s =
            Session::with_transport(SessionConfig::new("t".to_owned()), MockTransport::default());
        s.collaborators().share_project(&EntityId::from(5), "a@example.com");
        s.collaborators().delete(&EntityId::from(5), "a@example.com");

        let cmds = s.queue().commands();
        assert_eq!(cmds[0].kind(), "share_project");
        assert!(cmds[0].temp_id().is_some());
        assert_eq!(cmds[0].args()["email"], json!("a@example.com"));
        assert_eq!(cmds[1].kind(), "delete_collaborator");
        assert!(cmds[1].temp_id().is_none());
    }

    #[tokio::test]
    async fn states_are_found_by_project_and_user() {
        let mut s =
            Session::with_transport(SessionConfig::new("t".to_owned()), MockTransport::default());
        s.transport().reply(json!({
            "sync_token": "t1",
            "collaborator_states": [
                {"project_id": 5, "user_id": 7, "state": "active"},
                {"project_id": 5, "user_id": 8, "state": "invited"},
            ],
        }));
        s.pull(&SyncScope::All).await.unwrap();

        let states = s.collaborator_states();
        let state = states
            .get_by_ids(&EntityId::from(5), &EntityId::from(8))
            .unwrap();
        assert_eq!(state.get_str("state"), Some("invited"));
        assert!(
            states
                .get_by_ids(&EntityId::from(6), &EntityId::from(7))
                .is_none()
        );
    }
}

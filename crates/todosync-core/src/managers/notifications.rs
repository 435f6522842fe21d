// ── Live notifications ──
//
// Keyed on `notification_key` in the store, so lookups by numeric id
// scan the collection.

use serde_json::Value;

use super::{Manager, Resource, field_map};
use crate::command::{Command, Undo};
use crate::model::{EntityId, ResourceType};
use crate::transport::Transport;

/// Marker for the `live_notifications` collection.
pub struct LiveNotifications;

impl Resource for LiveNotifications {
    const TYPE: ResourceType = ResourceType::LiveNotifications;
}

impl<T: Transport> Manager<'_, T, LiveNotifications> {
    /// Record the newest notification the user has seen.
    pub fn set_last_read(&mut self, id: impl Into<EntityId>) {
        let id = self.session.canonical_id(id.into());
        let prior = self
            .session
            .store
            .live_notifications_last_read_id
            .replace(id.to_value());
        self.session.enqueue_with_undo(
            Command::new(Self::kind("set_last_read"), field_map([("id", id.to_value())])),
            vec![Undo::RestoreLastRead(prior)],
        );
    }

    pub fn mark_read(&mut self, id: impl Into<EntityId>) {
        self.mark(id.into(), "mark_read", false);
    }

    pub fn mark_unread(&mut self, id: impl Into<EntityId>) {
        self.mark(id.into(), "mark_unread", true);
    }

    pub fn mark_read_all(&mut self) {
        let mut undo = Vec::new();
        let collection = self
            .session
            .store
            .collections
            .get_mut(&ResourceType::LiveNotifications);
        for entity in collection.into_iter().flat_map(|c| c.iter_mut()) {
            if let Some(key) = entity.key() {
                let prior = entity.set("is_unread", Value::Bool(false));
                undo.push(restore(key, prior));
            }
        }
        self.session
            .enqueue_with_undo(Command::new(Self::kind("mark_read_all"), field_map([])), undo);
    }

    fn mark(&mut self, id: EntityId, action: &str, unread: bool) {
        let mut undo = Vec::new();
        let collection = self
            .session
            .store
            .collections
            .get_mut(&ResourceType::LiveNotifications);
        if let Some(entity) = collection
            .into_iter()
            .flat_map(|c| c.iter_mut())
            .find(|e| e.get("id").is_some_and(|v| id.matches(v)))
        {
            if let Some(key) = entity.key() {
                let prior = entity.set("is_unread", Value::Bool(unread));
                undo.push(restore(key, prior));
            }
        }
        self.session.enqueue_with_undo(
            Command::new(Self::kind(action), field_map([("id", id.to_value())])),
            undo,
        );
    }
}

/// Undo keyed on the store key, which is the `notification_key`.
fn restore(key: String, prior: Option<Value>) -> Undo {
    Undo::Restore {
        resource: ResourceType::LiveNotifications,
        id: EntityId::Text(key),
        fields: vec![("is_unread".to_owned(), prior)],
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use crate::config::SessionConfig;
    use crate::model::ResourceType;
    use crate::session::Session;
    use crate::store::SyncScope;
    use crate::transport::mock::MockTransport;

    async fn with_notifications() -> Session<MockTransport> {
        let mut s =
            Session::with_transport(SessionConfig::new("t".to_owned()), MockTransport::default());
        s.transport().reply(json!({
            "sync_token": "t1",
            "live_notifications": [
                {"id": 1, "notification_key": "k1", "is_unread": true},
                {"id": 2, "notification_key": "k2", "is_unread": true},
            ],
        }));
        s.pull(&SyncScope::All).await.unwrap();
        s
    }

    fn unread(s: &Session<MockTransport>) -> Vec<bool> {
        s.store()
            .all(ResourceType::LiveNotifications)
            .map(|n| n.get("is_unread") == Some(&json!(true)))
            .collect()
    }

    #[tokio::test]
    async fn mark_by_id_finds_entity_keyed_on_notification_key() {
        let mut s = with_notifications().await;
        s.live_notifications().mark_read(2);
        assert_eq!(unread(&s), [true, false]);

        let cmd = s.queue().iter().last().unwrap();
        assert_eq!(cmd.kind(), "live_notifications_mark_read");
        assert_eq!(cmd.args()["id"], json!(2));
    }

    #[tokio::test]
    async fn mark_read_all_then_rejected_restores() {
        let mut s = with_notifications().await;
        s.live_notifications().mark_read_all();
        assert_eq!(unread(&s), [false, false]);

        let token = s.queue().iter().next().unwrap().uuid().to_owned();
        s.transport().reply(json!({
            "sync_token": "t2",
            "sync_status": {token: {"error_code": 1, "error": "nope"}},
        }));
        s.commit(false).await.unwrap();
        assert_eq!(unread(&s), [true, true]);
    }

    #[tokio::test]
    async fn set_last_read_is_visible_immediately() {
        let mut s = with_notifications().await;
        s.live_notifications().set_last_read(2);
        assert_eq!(s.store().live_notifications_last_read_id(), Some(&json!(2)));
        assert_eq!(
            s.queue().iter().last().unwrap().kind(),
            "live_notifications_set_last_read"
        );
    }
}

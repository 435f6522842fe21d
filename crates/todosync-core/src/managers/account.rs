// ── Account-level state: user, user settings, locations ──
//
// None of these are entity collections. Edits patch the scalar maps in
// the store and queue a single command.

use serde_json::{Map, Value};

use super::{Manager, Resource};
use crate::command::{Command, ScalarMap, Undo};
use crate::model::ResourceType;
use crate::transport::Transport;

pub struct Locations;

impl Resource for Locations {
    const TYPE: ResourceType = ResourceType::Locations;
}

pub struct User;

impl Resource for User {
    const TYPE: ResourceType = ResourceType::User;
}

pub struct UserSettings;

impl Resource for UserSettings {
    const TYPE: ResourceType = ResourceType::UserSettings;
}

impl<T: Transport> Manager<'_, T, Locations> {
    /// Current `[name, lat, lon]` entries.
    pub fn entries(&self) -> &[Value] {
        self.session.store.locations()
    }

    /// Forget every stored location.
    pub fn clear(&mut self) {
        let prior = std::mem::take(&mut self.session.store.locations);
        self.session.enqueue_with_undo(
            Command::new("clear_locations", Map::new()),
            vec![Undo::RestoreLocations(prior)],
        );
    }
}

impl<T: Transport> Manager<'_, T, User> {
    pub fn data(&self) -> &Map<String, Value> {
        self.session.store.user()
    }

    /// Merge `fields` into the user record and queue `user_update`.
    pub fn update(&mut self, fields: Map<String, Value>) {
        self.patch_scalar(ScalarMap::User, fields);
    }
}

impl<T: Transport> Manager<'_, T, UserSettings> {
    pub fn data(&self) -> &Map<String, Value> {
        self.session.store.user_settings()
    }

    /// Merge `fields` into the settings and queue `user_settings_update`.
    pub fn update(&mut self, fields: Map<String, Value>) {
        self.patch_scalar(ScalarMap::UserSettings, fields);
    }
}

impl<T: Transport, R: Resource> Manager<'_, T, R> {
    fn patch_scalar(&mut self, target: ScalarMap, fields: Map<String, Value>) {
        let map = self.session.store.scalar_mut(target);
        let prior = fields
            .iter()
            .map(|(k, v)| (k.clone(), map.insert(k.clone(), v.clone())))
            .collect();
        self.session.enqueue_with_undo(
            Command::new(Self::kind("update"), fields),
            vec![Undo::RestoreScalar {
                target,
                fields: prior,
            }],
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use crate::managers::field_map;
    use crate::config::SessionConfig;
    use crate::session::Session;
    use crate::store::SyncScope;
    use crate::transport::mock::MockTransport;

    fn session() -> Session<MockTransport> {
        Session::with_transport(SessionConfig::new("t".to_owned()), MockTransport::default())
    }

    #[tokio::test]
    async fn rejected_user_update_is_rolled_back() {
        let mut s = session();
        s.transport().reply(json!({"sync_token": "t1", "user": {"id": 1, "full_name": "Ann"}}));
        s.pull(&SyncScope::All).await.unwrap();

        s.user().update(field_map([
            ("full_name", json!("Anne")),
            ("timezone", json!("UTC")),
        ]));
        assert_eq!(s.store().user()["full_name"], json!("Anne"));
        assert_eq!(s.queue().iter().last().unwrap().kind(), "user_update");

        let token = s.queue().iter().last().unwrap().uuid().to_owned();
        s.transport().reply(json!({
            "sync_token": "t2",
            "sync_status": {token: {"error_code": 9, "error": "bad timezone"}},
        }));
        s.commit(false).await.unwrap();

        assert_eq!(s.store().user()["full_name"], json!("Ann"));
        assert!(s.store().user().get("timezone").is_none());
    }

    #[test]
    fn settings_update_command_name() {
        let mut s = session();
        s.user_settings().update(field_map([("reminder_push", json!(false))]));
        assert_eq!(s.user_settings().data()["reminder_push"], json!(false));
        assert_eq!(s.queue().iter().last().unwrap().kind(), "user_settings_update");
    }

    #[tokio::test]
    async fn clear_locations_empties_until_rejected() {
        let mut s = session();
        s.transport().reply(json!({
            "sync_token": "t1",
            "locations": [["Home", "52.5", "13.4"]],
        }));
        s.pull(&SyncScope::All).await.unwrap();

        s.locations().clear();
        assert!(s.locations().entries().is_empty());
        assert_eq!(s.queue().iter().last().unwrap().kind(), "clear_locations");

        let token = s.queue().iter().last().unwrap().uuid().to_owned();
        s.transport().reply(json!({
            "sync_token": "t2",
            "sync_status": {token: {"error": "later"}},
        }));
        s.commit(false).await.unwrap();
        assert_eq!(s.store().locations().len(), 1);
    }
}

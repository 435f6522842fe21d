// ── Reminders ──

use serde_json::{Map, Value};

use super::{Creatable, Fetchable, Manager, Resource};
use crate::model::{EntityId, ResourceType};
use crate::transport::Transport;

/// Marker for the `reminders` collection.
pub struct Reminders;

impl Resource for Reminders {
    const TYPE: ResourceType = ResourceType::Reminders;
}
impl Creatable for Reminders {}
impl Fetchable for Reminders {
    const GET_CALL: &'static str = "reminders/get";
    const ID_PARAM: &'static str = "reminder_id";
    const SECTIONS: &'static [(&'static str, ResourceType)] =
        &[("reminder", ResourceType::Reminders)];
}

impl<T: Transport> Manager<'_, T, Reminders> {
    /// Add a reminder for `item_id`. `fields` carries the trigger
    /// (`type`, `due`, `minute_offset`, ...).
    pub fn add(&mut self, item_id: &EntityId, mut fields: Map<String, Value>) -> EntityId {
        fields.insert("item_id".into(), item_id.to_value());
        self.create(fields)
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

    #[tokio::test]
    async fn fetch_missing_reminder_is_none() {
        let mut s =
            Session::with_transport(SessionConfig::new("t".to_owned()), MockTransport::default());
        let id = s.reminders().add(
            &EntityId::from(1),
            json!({"type": "relative", "minute_offset": 30}).as_object().unwrap().clone(),
        );
        assert_eq!(
            s.find(ResourceType::Reminders, id).unwrap().get("item_id"),
            Some(&json!(1))
        );

        s.transport().reply(json!({"error": "Reminder not found"}));
        assert_eq!(s.reminders().fetch(77).await.unwrap(), None);
        let gets = s.transport().gets.lock().unwrap().clone();
        assert_eq!(gets[0].0, "reminders/get");
        assert_eq!(gets[0].1, vec![("reminder_id".to_owned(), "77".to_owned())]);
    }
}

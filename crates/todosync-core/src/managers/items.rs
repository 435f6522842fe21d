// ── Items (tasks) ──

use serde_json::{Map, Value};

use super::{Creatable, Fetchable, Manager, Orderable, Resource, field_map};
use crate::command::{Command, ScalarMap, Undo};
use crate::model::{EntityId, ResourceType};
use crate::transport::Transport;

/// Marker for the `items` collection.
pub struct Items;

impl Resource for Items {
    const TYPE: ResourceType = ResourceType::Items;
}
impl Creatable for Items {}
impl Orderable for Items {}
impl Fetchable for Items {
    const GET_CALL: &'static str = "items/get";
    const ID_PARAM: &'static str = "item_id";
    const SECTIONS: &'static [(&'static str, ResourceType)] = &[
        ("item", ResourceType::Items),
        ("notes", ResourceType::Notes),
        ("project", ResourceType::Projects),
        ("section", ResourceType::Sections),
    ];
}

/// Where `item_move` sends an item. Exactly one target per move.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemDestination {
    Project(EntityId),
    Section(EntityId),
    Parent(EntityId),
}

impl ItemDestination {
    fn field(&self) -> (&'static str, &EntityId) {
        match self {
            Self::Project(id) => ("project_id", id),
            Self::Section(id) => ("section_id", id),
            Self::Parent(id) => ("parent_id", id),
        }
    }
}

impl<T: Transport> Manager<'_, T, Items> {
    /// Create an item. Lands in the inbox project when the user record
    /// names one.
    pub fn add(&mut self, content: &str) -> EntityId {
        let mut args = field_map([("content", Value::from(content))]);
        let inbox = self
            .session
            .store
            .user()
            .get("inbox_project_id")
            .or_else(|| self.session.store.user().get("inbox_project"))
            .filter(|v| !v.is_null())
            .cloned();
        if let Some(inbox) = inbox {
            args.insert("project_id".into(), inbox);
        }
        self.create(args)
    }

    /// Create an item inside `project_id` (durable or temp id).
    pub fn add_to(&mut self, content: &str, project_id: &EntityId) -> EntityId {
        self.create(field_map([
            ("content", Value::from(content)),
            ("project_id", project_id.to_value()),
        ]))
    }

    pub fn move_to(&mut self, id: impl Into<EntityId>, destination: &ItemDestination) {
        let (field, target) = destination.field();
        let target = self.session.canonical_id(target.clone());
        self.edit("move", id, field_map([(field, target.to_value())]));
    }

    pub fn complete(&mut self, id: impl Into<EntityId>) {
        self.edit_flag("complete", id, "checked", true);
    }

    pub fn uncomplete(&mut self, id: impl Into<EntityId>) {
        self.edit_flag("uncomplete", id, "checked", false);
    }

    /// Complete a task, or advance it to its next occurrence when it
    /// recurs. Locally this reads as completed until the service
    /// reports the new due date.
    pub fn close(&mut self, id: impl Into<EntityId>) {
        self.edit_flag("close", id, "checked", true);
    }

    /// Set per-day ordering of items in the "today" view.
    pub fn update_day_orders(&mut self, orders: &[(EntityId, i64)]) {
        let mut undo = Vec::new();
        let mut ids_to_orders = Map::new();
        let mut day_order_prior = Vec::new();

        for (id, order) in orders {
            let id = self.session.canonical_id(id.clone());
            undo.extend(self.patch_local(&id, &field_map([("day_order", Value::from(*order))])));

            let key = id.as_key();
            let prior = self
                .session
                .store
                .scalar_mut(ScalarMap::DayOrders)
                .insert(key.clone(), Value::from(*order));
            day_order_prior.push((key.clone(), prior));
            ids_to_orders.insert(key, Value::from(*order));
        }
        undo.push(Undo::RestoreScalar {
            target: ScalarMap::DayOrders,
            fields: day_order_prior,
        });

        self.session.enqueue_with_undo(
            Command::new(
                "item_update_day_orders",
                field_map([("ids_to_orders", Value::Object(ids_to_orders))]),
            ),
            undo,
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::session::Session;
    use crate::transport::mock::MockTransport;
    use serde_json::json;

    fn session() -> Session<MockTransport> {
        Session::with_transport(SessionConfig::new("t".to_owned()), MockTransport::default())
    }

    #[test]
    fn add_defaults_to_inbox() {
        let mut s = session();
        s.store.user.insert("inbox_project_id".into(), json!("inbox-1"));
        let id = s.items().add("buy milk");
        assert_eq!(
            s.find(ResourceType::Items, id).unwrap().get("project_id"),
            Some(&json!("inbox-1"))
        );
    }

    #[test]
    fn complete_then_uncomplete() {
        let mut s = session();
        let id = s.items().add("task");
        s.items().complete(id.clone());
        assert_eq!(s.find(ResourceType::Items, id.clone()).unwrap().get("checked"), Some(&json!(true)));
        s.items().uncomplete(id.clone());
        assert_eq!(s.find(ResourceType::Items, id).unwrap().get("checked"), Some(&json!(false)));

        let kinds: Vec<_> = s.queue().iter().map(|c| c.kind().to_owned()).collect();
        assert_eq!(kinds, ["item_add", "item_complete", "item_uncomplete"]);
    }

    #[test]
    fn move_sets_one_destination_field() {
        let mut s = session();
        let id = s.items().add("task");
        s.items().move_to(id.clone(), &ItemDestination::Section(EntityId::from(7)));

        let cmd = s.queue().iter().last().unwrap();
        assert_eq!(cmd.kind(), "item_move");
        assert_eq!(cmd.args().get("section_id"), Some(&json!(7)));
        assert!(cmd.args().get("project_id").is_none());
        assert_eq!(s.find(ResourceType::Items, id).unwrap().get("section_id"), Some(&json!(7)));
    }

    #[test]
    fn day_orders_update_item_and_map() {
        let mut s = session();
        let id = s.items().add("task");
        s.items().update_day_orders(&[(id.clone(), 3)]);

        assert_eq!(s.find(ResourceType::Items, id.clone()).unwrap().get("day_order"), Some(&json!(3)));
        assert_eq!(s.store().day_orders().get(&id.as_key()), Some(&json!(3)));
        let cmd = s.queue().iter().last().unwrap();
        assert_eq!(cmd.args()["ids_to_orders"][id.as_key()], json!(3));
    }
}

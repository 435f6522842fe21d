// ── Labels and filters ──

use serde_json::Value;

use super::{Creatable, Fetchable, Manager, OrderMapped, Resource, field_map};
use crate::model::{EntityId, ResourceType};
use crate::transport::Transport;

/// Marker for the `labels` collection.
pub struct Labels;

impl Resource for Labels {
    const TYPE: ResourceType = ResourceType::Labels;
}
impl Creatable for Labels {}
impl OrderMapped for Labels {}
impl Fetchable for Labels {
    const GET_CALL: &'static str = "labels/get";
    const ID_PARAM: &'static str = "label_id";
    const SECTIONS: &'static [(&'static str, ResourceType)] = &[("label", ResourceType::Labels)];
}

/// Marker for the `filters` collection.
pub struct Filters;

impl Resource for Filters {
    const TYPE: ResourceType = ResourceType::Filters;
}
impl Creatable for Filters {}
impl OrderMapped for Filters {}
impl Fetchable for Filters {
    const GET_CALL: &'static str = "filters/get";
    const ID_PARAM: &'static str = "filter_id";
    const SECTIONS: &'static [(&'static str, ResourceType)] = &[("filter", ResourceType::Filters)];
}

impl<T: Transport> Manager<'_, T, Labels> {
    pub fn add(&mut self, name: &str) -> EntityId {
        self.create(field_map([("name", Value::from(name))]))
    }
}

impl<T: Transport> Manager<'_, T, Filters> {
    pub fn add(&mut self, name: &str, query: &str) -> EntityId {
        self.create(field_map([
            ("name", Value::from(name)),
            ("query", Value::from(query)),
        ]))
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
    fn update_records_prior_values_for_rollback() {
        let mut s =
            Session::with_transport(SessionConfig::new("t".to_owned()), MockTransport::default());
        let label = s.labels().add("errand");
        s.labels().update(
            label.clone(),
            json!({"name": "errands", "color": "red"}).as_object().unwrap().clone(),
        );

        let stored = s.find(ResourceType::Labels, label).unwrap();
        assert_eq!(stored.get_str("name"), Some("errands"));
        assert_eq!(stored.get_str("color"), Some("red"));
        assert_eq!(s.queue().iter().last().unwrap().kind(), "label_update");
    }

    #[test]
    fn filter_orders_are_sent_as_mapping() {
        let mut s =
            Session::with_transport(SessionConfig::new("t".to_owned()), MockTransport::default());
        let f = s.filters().add("Today", "today | overdue");
        s.filters().update_orders(&[(f.clone(), 2), (EntityId::from(3), 1)]);

        let stored = s.find(ResourceType::Filters, f.clone()).unwrap();
        assert_eq!(stored.get("query"), Some(&json!("today | overdue")));
        assert_eq!(stored.get("item_order"), Some(&json!(2)));

        let cmd = s.queue().iter().last().unwrap();
        assert_eq!(cmd.kind(), "filter_update_orders");
        assert_eq!(
            cmd.args()["id_order_mapping"],
            json!({f.to_string(): 2, "3": 1})
        );
    }
}

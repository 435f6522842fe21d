// ── Entity record ──

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::{EntityId, ResourceType};

/// One domain object, as a string-keyed field map.
///
/// `temp_id` correlates an optimistically created entity with the
/// durable id the server will assign. It is local bookkeeping only and
/// is never serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    resource: ResourceType,
    data: Map<String, Value>,
    temp_id: Option<String>,
}

impl Entity {
    pub fn new(resource: ResourceType, data: Map<String, Value>) -> Self {
        Self {
            resource,
            data,
            temp_id: None,
        }
    }

    /// An entity awaiting its durable id. `id` is set to the temp id.
    pub fn pending(resource: ResourceType, temp_id: &str, mut data: Map<String, Value>) -> Self {
        data.insert("id".into(), Value::from(temp_id));
        Self {
            resource,
            data,
            temp_id: Some(temp_id.to_owned()),
        }
    }

    pub fn resource(&self) -> ResourceType {
        self.resource
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn into_data(self) -> Map<String, Value> {
        self.data
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }

    /// Set a field, returning the previous value.
    pub fn set(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.data.insert(field.into(), value)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.data.remove(field)
    }

    pub fn id(&self) -> Option<EntityId> {
        self.data.get("id").and_then(EntityId::from_value)
    }

    pub fn temp_id(&self) -> Option<&str> {
        self.temp_id.as_deref()
    }

    /// Identity key within the owning collection.
    pub fn key(&self) -> Option<String> {
        self.resource.identity(&self.data)
    }

    pub fn is_deleted(&self) -> bool {
        is_deleted_flag(self.data.get("is_deleted"))
    }

    pub(crate) fn data_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.data
    }

    pub(crate) fn clear_temp_id(&mut self) {
        self.temp_id = None;
    }

    /// Shallow field-wise merge: every field in `fields` overwrites the
    /// local one, fields absent from `fields` are kept.
    pub(crate) fn merge(&mut self, fields: &Map<String, Value>) {
        for (k, v) in fields {
            self.data.insert(k.clone(), v.clone());
        }
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}

/// Interpret an `is_deleted` field.
///
/// Missing, `null`, `0`, `false` and `"0"` all mean "not deleted".
pub fn is_deleted_flag(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !matches!(s.as_str(), "" | "0" | "false"),
        Some(Value::Array(_) | Value::Object(_)) => true,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn obj(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn pending_entity_uses_temp_id_as_id() {
        let e = Entity::pending(ResourceType::Projects, "tmp-1", obj(json!({"name": "X"})));
        assert_eq!(e.id(), Some(EntityId::from("tmp-1")));
        assert_eq!(e.temp_id(), Some("tmp-1"));
        assert_eq!(e.key().as_deref(), Some("tmp-1"));
    }

    #[test]
    fn temp_id_is_not_serialized() {
        let e = Entity::pending(ResourceType::Items, "tmp-1", obj(json!({"content": "a"})));
        assert_eq!(
            serde_json::to_value(&e).unwrap(),
            json!({"content": "a", "id": "tmp-1"})
        );
    }

    #[test]
    fn merge_overwrites_and_keeps() {
        let mut e = Entity::new(ResourceType::Items, obj(json!({"id": 1, "content": "a", "priority": 1})));
        e.merge(&obj(json!({"id": 1, "content": "b"})));
        assert_eq!(e.get_str("content"), Some("b"));
        assert_eq!(e.get("priority"), Some(&json!(1)));
    }

    #[test]
    fn deleted_flag_forms() {
        assert!(!is_deleted_flag(None));
        assert!(!is_deleted_flag(Some(&json!(0))));
        assert!(!is_deleted_flag(Some(&json!(false))));
        assert!(!is_deleted_flag(Some(&json!("0"))));
        assert!(is_deleted_flag(Some(&json!(1))));
        assert!(is_deleted_flag(Some(&json!(true))));
    }
}

// ── Sync request encoding ──
//
// The sync endpoint takes a form-encoded body. List-valued fields
// (`commands`, `resource_types`) are JSON strings inside the form.

use serde_json::Value;

/// Cursor value that asks the server for a full snapshot.
pub const WILDCARD_SYNC_TOKEN: &str = "*";

/// One request to the sync endpoint, minus the credential.
///
/// The credential is owned by [`SyncClient`](crate::SyncClient) and
/// injected at send time so a request can be logged or inspected
/// without exposing it.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncRequest {
    /// Opaque cursor echoed from the previous response (or `*`).
    pub sync_token: String,
    /// Resource-type scope. `["all"]` means full sync.
    pub resource_types: Vec<String>,
    /// Serialized commands, in submission order.
    pub commands: Vec<Value>,
    /// Last-known day-order epoch, if any.
    pub day_orders_timestamp: Option<String>,
    /// Ask the server to include notification settings.
    pub include_notification_settings: bool,
}

impl Default for SyncRequest {
    fn default() -> Self {
        Self {
            sync_token: WILDCARD_SYNC_TOKEN.into(),
            resource_types: vec!["all".into()],
            commands: Vec::new(),
            day_orders_timestamp: None,
            include_notification_settings: true,
        }
    }
}

impl SyncRequest {
    /// Encode the request as form fields (without the token).
    pub fn form_fields(&self) -> Result<Vec<(&'static str, String)>, serde_json::Error> {
        let mut fields = vec![
            ("sync_token", self.sync_token.clone()),
            ("resource_types", serde_json::to_string(&self.resource_types)?),
            ("commands", serde_json::to_string(&self.commands)?),
        ];
        if let Some(ts) = &self.day_orders_timestamp {
            fields.push(("day_orders_timestamp", ts.clone()));
        }
        if self.include_notification_settings {
            fields.push(("include_notification_settings", "1".into()));
        }
        Ok(fields)
    }

    /// Whether this request submits any commands.
    pub fn is_write(&self) -> bool {
        !self.commands.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn default_is_full_read_sync() {
        let req = SyncRequest::default();
        assert_eq!(req.sync_token, "*");
        assert_eq!(req.resource_types, vec!["all".to_owned()]);
        assert!(!req.is_write());
    }

    #[test]
    fn form_fields_encode_lists_as_json() {
        let req = SyncRequest {
            sync_token: "abc".into(),
            resource_types: vec!["labels".into(), "items".into()],
            commands: vec![json!({"type": "label_add", "uuid": "u1", "args": {"name": "x"}})],
            day_orders_timestamp: Some("1344642991.1".into()),
            include_notification_settings: false,
        };

        let fields = req.form_fields().unwrap();
        assert_eq!(
            fields,
            vec![
                ("sync_token", "abc".to_owned()),
                ("resource_types", r#"["labels","items"]"#.to_owned()),
                (
                    "commands",
                    r#"[{"type":"label_add","uuid":"u1","args":{"name":"x"}}]"#.to_owned()
                ),
                ("day_orders_timestamp", "1344642991.1".to_owned()),
            ]
        );
    }

    #[test]
    fn empty_commands_encode_as_empty_array() {
        let fields = SyncRequest::default().form_fields().unwrap();
        assert!(fields.contains(&("commands", "[]".to_owned())));
        assert!(fields.contains(&("include_notification_settings", "1".to_owned())));
    }
}

// ── Read-only service calls ──
//
// Plain GETs whose results are not part of the synced state: completed
// tasks, productivity stats, the activity log, backups, quick add, and
// per-object email addresses.

use todosync_api::ApiResponse;

use crate::error::CoreError;
use crate::model::EntityId;
use crate::session::Session;
use crate::transport::Transport;

impl<T: Transport> Session<T> {
    /// Recent productivity stats (`completed/get_stats`).
    pub async fn completed_stats(&self) -> Result<ApiResponse, CoreError> {
        self.call("completed/get_stats", &[]).await
    }

    /// Completed tasks. `filters` passes through (`project_id`, `limit`,
    /// `since`, ...).
    pub async fn completed_items(&self, filters: &[(&str, String)]) -> Result<ApiResponse, CoreError> {
        self.call("completed/get_all", filters).await
    }

    /// Activity log events (`activity/get`).
    pub async fn activity(&self, filters: &[(&str, String)]) -> Result<ApiResponse, CoreError> {
        self.call("activity/get", filters).await
    }

    pub async fn backups(&self) -> Result<ApiResponse, CoreError> {
        self.call("backups/get", &[]).await
    }

    /// Server-side natural-language task creation (`quick/add`). The
    /// created item shows up locally with the next sync.
    pub async fn quick_add(&self, text: &str, options: &[(&str, String)]) -> Result<ApiResponse, CoreError> {
        if text.trim().is_empty() {
            return Err(CoreError::InvalidArgument {
                message: "quick add text is empty".into(),
            });
        }
        let mut params = vec![("text", text.to_owned())];
        params.extend(options.iter().cloned());
        self.call("quick/add", &params).await
    }

    /// Email address that posts into `obj_type`/`obj_id`, created on
    /// first use.
    pub async fn email_get_or_create(&self, obj_type: &str, obj_id: &EntityId) -> Result<ApiResponse, CoreError> {
        self.call("emails/get_or_create", &email_params(obj_type, obj_id))
            .await
    }

    pub async fn email_disable(&self, obj_type: &str, obj_id: &EntityId) -> Result<ApiResponse, CoreError> {
        self.call("emails/disable", &email_params(obj_type, obj_id))
            .await
    }
}

fn email_params(obj_type: &str, obj_id: &EntityId) -> [(&'static str, String); 2] {
    [("obj_type", obj_type.to_owned()), ("obj_id", obj_id.to_string())]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use todosync_api::ApiResponse;

    use crate::config::SessionConfig;
    use crate::error::CoreError;
    use crate::model::{EntityId, ResourceType};
    use crate::session::Session;
    use crate::transport::mock::MockTransport;

    fn session() -> Session<MockTransport> {
        Session::with_transport(SessionConfig::new("t".to_owned()), MockTransport::default())
    }

    fn calls(s: &Session<MockTransport>) -> Vec<(String, Vec<(String, String)>)> {
        s.transport().gets.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn plain_calls_do_not_touch_the_store() {
        let s = session();
        s.transport().reply(json!({"items": [{"id": 1, "content": "done"}]}));
        let body = s
            .completed_items(&[("project_id", "5".to_owned())])
            .await
            .unwrap();

        assert_eq!(body.as_json().unwrap()["items"][0]["id"], json!(1));
        assert_eq!(s.store().count(ResourceType::Items), 0);
        assert_eq!(
            calls(&s)[0],
            (
                "completed/get_all".to_owned(),
                vec![("project_id".to_owned(), "5".to_owned())]
            )
        );
    }

    #[tokio::test]
    async fn quick_add_sends_text_and_rejects_blank() {
        let s = session();
        let err = s.quick_add("   ", &[]).await.unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument { .. }));
        assert!(calls(&s).is_empty());

        s.transport().reply(json!({"id": 9, "content": "milk"}));
        s.quick_add("milk tomorrow #Shopping", &[("note", "2%".to_owned())])
            .await
            .unwrap();
        let (call, params) = calls(&s).remove(0);
        assert_eq!(call, "quick/add");
        assert_eq!(params[0], ("text".to_owned(), "milk tomorrow #Shopping".to_owned()));
        assert_eq!(params[1], ("note".to_owned(), "2%".to_owned()));
    }

    #[tokio::test]
    async fn email_calls_name_the_object_and_accept_text() {
        let s = session();
        s.transport().reply(json!("ok"));
        let body = s.email_disable("project", &EntityId::from(5)).await.unwrap();

        assert_eq!(body, ApiResponse::Text("ok".into()));
        assert_eq!(
            calls(&s)[0].1,
            vec![
                ("obj_type".to_owned(), "project".to_owned()),
                ("obj_id".to_owned(), "5".to_owned()),
            ]
        );
    }

    #[tokio::test]
    async fn stats_and_backups_use_their_calls() {
        let s = session();
        s.transport().reply(json!({"karma": 100}));
        s.transport().reply(json!([]));
        s.completed_stats().await.unwrap();
        s.backups().await.unwrap();
        let names: Vec<_> = calls(&s).into_iter().map(|(c, _)| c).collect();
        assert_eq!(names, ["completed/get_stats", "backups/get"]);
    }
}

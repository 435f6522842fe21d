// ── Transport seam ──
//
// The session talks to the service through this trait so tests can
// script responses without a network. `SyncClient` is the production
// implementation.

use std::future::Future;

use serde_json::{Map, Value};
use todosync_api::{ApiResponse, SyncClient, SyncRequest};

/// Request/response exchange with the sync service.
pub trait Transport: Send + Sync {
    /// POST a sync request and return the decoded response object.
    fn sync(
        &self,
        request: &SyncRequest,
    ) -> impl Future<Output = Result<Map<String, Value>, todosync_api::Error>> + Send;

    /// Plain GET call (`projects/get`, `items/get`, ...).
    fn get(
        &self,
        call: &str,
        params: &[(&str, String)],
    ) -> impl Future<Output = Result<ApiResponse, todosync_api::Error>> + Send;
}

impl Transport for SyncClient {
    fn sync(
        &self,
        request: &SyncRequest,
    ) -> impl Future<Output = Result<Map<String, Value>, todosync_api::Error>> + Send {
        SyncClient::sync(self, request)
    }

    fn get(
        &self,
        call: &str,
        params: &[(&str, String)],
    ) -> impl Future<Output = Result<ApiResponse, todosync_api::Error>> + Send {
        SyncClient::get(self, call, params)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use serde_json::{Map, Value};
    use todosync_api::{ApiResponse, SyncRequest};

    use super::Transport;

    /// Scripted transport. Each call pops the next queued reply; an
    /// empty script answers with a timeout.
    #[derive(Default)]
    pub(crate) struct MockTransport {
        replies: Mutex<VecDeque<Result<Value, u64>>>,
        pub(crate) requests: Mutex<Vec<SyncRequest>>,
        pub(crate) gets: Mutex<Vec<(String, Vec<(String, String)>)>>,
    }

    impl MockTransport {
        pub(crate) fn reply(&self, body: Value) {
            self.lock_replies().push_back(Ok(body));
        }

        pub(crate) fn fail(&self) {
            self.lock_replies().push_back(Err(30));
        }

        pub(crate) fn sent(&self) -> Vec<SyncRequest> {
            self.requests
                .lock()
                .map(|r| r.clone())
                .unwrap_or_default()
        }

        fn lock_replies(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<Value, u64>>> {
            self.replies
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
        }

        fn next(&self) -> Result<Value, todosync_api::Error> {
            match self.lock_replies().pop_front() {
                Some(Ok(body)) => Ok(body),
                Some(Err(timeout_secs)) => Err(todosync_api::Error::Timeout { timeout_secs }),
                None => Err(todosync_api::Error::Timeout { timeout_secs: 0 }),
            }
        }
    }

    impl Transport for MockTransport {
        async fn sync(
            &self,
            request: &SyncRequest,
        ) -> Result<Map<String, Value>, todosync_api::Error> {
            if let Ok(mut log) = self.requests.lock() {
                log.push(request.clone());
            }
            match self.next()? {
                Value::Object(map) => Ok(map),
                other => Err(todosync_api::Error::Deserialization {
                    message: "expected a JSON object".into(),
                    body: other.to_string(),
                }),
            }
        }

        async fn get(
            &self,
            call: &str,
            params: &[(&str, String)],
        ) -> Result<ApiResponse, todosync_api::Error> {
            if let Ok(mut log) = self.gets.lock() {
                log.push((
                    call.to_owned(),
                    params
                        .iter()
                        .map(|(k, v)| ((*k).to_owned(), v.clone()))
                        .collect(),
                ));
            }
            Ok(match self.next()? {
                Value::String(text) => ApiResponse::Text(text),
                other => ApiResponse::Json(other),
            })
        }
    }
}

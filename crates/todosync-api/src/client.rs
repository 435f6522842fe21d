// Sync API HTTP client
//
// Wraps `reqwest::Client` with endpoint URL construction, token
// injection, and response decoding. The sync endpoint must answer with
// a JSON object; the plain `get`/`post` helpers accept any body.

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::request::SyncRequest;
use crate::transport::TransportConfig;

/// Path of the sync API below the endpoint root.
pub const API_PATH: &str = "sync/v9/";

/// Default public endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.todoist.com";

/// Body returned by the non-sync helpers.
///
/// Several endpoints answer with plain text on success; that is an
/// accepted response shape, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(Value),
    Text(String),
}

impl ApiResponse {
    /// The JSON value, if the body was JSON.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            Self::Text(_) => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Self::Json(v) => Some(v),
            Self::Text(_) => None,
        }
    }
}

/// Async client for the sync API.
///
/// Holds the credential and injects it into every request as the
/// `token` field.
pub struct SyncClient {
    http: reqwest::Client,
    base_url: Url,
    token: SecretString,
}

impl SyncClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for `endpoint` using the given transport settings.
    pub fn new(
        endpoint: &str,
        token: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(endpoint, token, http)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(
        endpoint: &str,
        token: SecretString,
        http: reqwest::Client,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(endpoint)?;
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    /// `https://host` → `https://host/sync/v9/`. An endpoint that already
    /// ends with the API path is kept as is.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        let api = API_PATH.trim_end_matches('/');

        if path.ends_with(api) {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/{API_PATH}"));
        }
        Ok(url)
    }

    /// The resolved API base URL (always ends with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, call: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(call.trim_start_matches('/'))?)
    }

    // ── Sync ─────────────────────────────────────────────────────────

    /// POST a sync request and decode the response object.
    ///
    /// Anything other than a JSON object is reported as
    /// [`Error::Deserialization`] so the caller never reconciles a
    /// partially understood payload.
    pub async fn sync(&self, request: &SyncRequest) -> Result<Map<String, Value>, Error> {
        let url = self.url("sync")?;
        debug!(
            commands = request.commands.len(),
            resource_types = ?request.resource_types,
            "POST {url}"
        );

        let mut form = request.form_fields()?;
        form.push(("token", self.token.expose_secret().to_owned()));

        let resp = self.http.post(url).form(&form).send().await?;
        let body = Self::read_body(resp).await?;

        match serde_json::from_str::<Value>(&body) {
            Ok(Value::Object(map)) => {
                trace!(keys = map.len(), "sync response decoded");
                Ok(map)
            }
            Ok(other) => Err(Error::Deserialization {
                message: format!("expected a JSON object, got {}", json_kind(&other)),
                body,
            }),
            Err(e) => Err(Error::Deserialization {
                message: e.to_string(),
                body,
            }),
        }
    }

    // ── Plain calls ──────────────────────────────────────────────────

    /// GET `{base}{call}` with the token added to the query string.
    pub async fn get(&self, call: &str, params: &[(&str, String)]) -> Result<ApiResponse, Error> {
        let url = self.url(call)?;
        debug!("GET {url}");

        let resp = self
            .http
            .get(url)
            .query(params)
            .query(&[("token", self.token.expose_secret())])
            .send()
            .await?;
        let body = Self::read_body(resp).await?;
        Ok(decode_lenient(body))
    }

    /// POST `{base}{call}` as a form with the token added.
    pub async fn post(&self, call: &str, params: &[(&str, String)]) -> Result<ApiResponse, Error> {
        let url = self.url(call)?;
        debug!("POST {url}");

        let mut form: Vec<(&str, String)> = params.to_vec();
        form.push(("token", self.token.expose_secret().to_owned()));

        let resp = self.http.post(url).form(&form).send().await?;
        let body = Self::read_body(resp).await?;
        Ok(decode_lenient(body))
    }

    // ── Response handling ────────────────────────────────────────────

    async fn read_body(resp: reqwest::Response) -> Result<String, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: format!("token rejected (HTTP {})", status.as_u16()),
            });
        }

        let body = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

fn decode_lenient(body: String) -> ApiResponse {
    match serde_json::from_str(&body) {
        Ok(value) => ApiResponse::Json(value),
        Err(_) => ApiResponse::Text(body),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> SyncClient {
        SyncClient::from_reqwest(endpoint, "t".to_owned().into(), reqwest::Client::new()).unwrap()
    }

    #[test]
    fn base_url_appends_api_path() {
        let c = client("https://api.example.com");
        assert_eq!(c.base_url().as_str(), "https://api.example.com/sync/v9/");
    }

    #[test]
    fn base_url_keeps_existing_api_path() {
        let c = client("https://api.example.com/sync/v9");
        assert_eq!(c.base_url().as_str(), "https://api.example.com/sync/v9/");
    }

    #[test]
    fn base_url_preserves_prefix() {
        let c = client("http://127.0.0.1:8080/proxy/");
        assert_eq!(c.base_url().as_str(), "http://127.0.0.1:8080/proxy/sync/v9/");
    }

    #[test]
    fn lenient_decode_falls_back_to_text() {
        assert_eq!(decode_lenient("ok".into()), ApiResponse::Text("ok".into()));
        assert_eq!(
            decode_lenient("{\"a\":1}".into()).as_json().and_then(|v| v.get("a")),
            Some(&Value::from(1))
        );
    }
}

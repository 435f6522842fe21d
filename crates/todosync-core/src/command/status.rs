// ── Per-command status ──

use std::fmt;

use serde_json::Value;

/// Outcome of one committed command, as reported in `sync_status`.
///
/// The service reports `"ok"` on success and an object such as
/// `{"error_code": 15, "error": "Invalid temporary id"}` otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandStatus {
    Ok,
    Failed {
        code: Option<i64>,
        message: String,
        raw: Value,
    },
}

impl CommandStatus {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) if s == "ok" => Self::Ok,
            Value::String(s) => Self::Failed {
                code: None,
                message: s.clone(),
                raw: value.clone(),
            },
            Value::Object(map) => Self::Failed {
                code: map.get("error_code").and_then(Value::as_i64),
                message: map
                    .get("error")
                    .and_then(Value::as_str)
                    .map_or_else(|| value.to_string(), str::to_owned),
                raw: value.clone(),
            },
            other => Self::Failed {
                code: None,
                message: other.to_string(),
                raw: value.clone(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    pub fn error_code(&self) -> Option<i64> {
        match self {
            Self::Ok => None,
            Self::Failed { code, .. } => *code,
        }
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("ok"),
            Self::Failed {
                code: Some(code),
                message,
                ..
            } => write!(f, "error {code}: {message}"),
            Self::Failed { message, .. } => f.write_str(message),
        }
    }
}

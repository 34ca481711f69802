// Client configuration: where the API lives, how requests identify
// themselves, and how application-level errors are spelled in replies.

use std::time::Duration;

use crate::json::JsonValue;

pub const DEFAULT_ROOT_URI: &str = "https://kerbalstuff.com";

/// How the server flags a failed action in an otherwise normal JSON reply,
/// e.g. `{"error": true, "reason": "..."}`. Older and newer server
/// revisions disagree on the message key, so several can be listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorConvention {
    pub flag_field: String,
    /// Tried in order; the first string value found is the message.
    pub message_fields: Vec<String>,
}

impl Default for ErrorConvention {
    fn default() -> Self {
        Self {
            flag_field: "error".into(),
            message_fields: vec!["reason".into(), "message".into()],
        }
    }
}

impl ErrorConvention {
    /// The server's error message if `reply` is flagged as a failure.
    pub fn application_error(&self, reply: &JsonValue) -> Option<String> {
        let flagged = match reply.get(&self.flag_field)? {
            JsonValue::Bool(flag) => *flag,
            JsonValue::String(s) => s.eq_ignore_ascii_case("true"),
            _ => false,
        };
        if !flagged {
            return None;
        }
        let message = self
            .message_fields
            .iter()
            .find_map(|field| reply.get(field).and_then(JsonValue::as_str))
            .unwrap_or("unknown error");
        Some(message.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Site root, including scheme. API paths are appended below `/api`.
    pub root_uri: String,
    pub user_agent: String,
    /// `None` leaves the transport default in place.
    pub timeout: Option<Duration>,
    pub error_convention: ErrorConvention,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            root_uri: DEFAULT_ROOT_URI.into(),
            user_agent: format!("KerbalStuffWrapper/{}", env!("CARGO_PKG_VERSION")),
            timeout: None,
            error_convention: ErrorConvention::default(),
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `KERBALSTUFF_URL`, `KERBALSTUFF_USER_AGENT`
    /// and `KERBALSTUFF_ERROR_FIELDS` (comma separated).
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(root) = lookup("KERBALSTUFF_URL").filter(|v| !v.trim().is_empty()) {
            config.root_uri = root.trim().to_string();
        }
        if let Some(agent) = lookup("KERBALSTUFF_USER_AGENT").filter(|v| !v.trim().is_empty()) {
            config.user_agent = agent;
        }
        if let Some(fields) = lookup("KERBALSTUFF_ERROR_FIELDS") {
            let fields: Vec<String> = fields
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect();
            if !fields.is_empty() {
                config.error_convention.message_fields = fields;
            }
        }
        config
    }

    pub fn with_root(mut self, root_uri: impl Into<String>) -> Self {
        self.root_uri = root_uri.into();
        self
    }
}

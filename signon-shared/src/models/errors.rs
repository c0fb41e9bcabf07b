use serde_json::Value;

/// Fallback message when a failed login carries nothing usable.
pub const LOGIN_FAILED_FALLBACK: &str = "Login failed";

/// Body of a non-2xx response from the authentication endpoint.
///
/// Servers answer failed logins with plain text, a JSON string, or a JSON
/// object carrying `message` or `error`.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    /// Plain text, or a JSON string literal.
    Text(String),
    /// A JSON object or array.
    Structured(Value),
    /// A JSON number, boolean or null.
    Scalar(Value),
    /// No body at all.
    Empty,
}

impl ErrorBody {
    /// Classify a raw response body.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::Empty;
        }
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::String(text)) => Self::Text(text),
            Ok(value @ (Value::Object(_) | Value::Array(_))) => Self::Structured(value),
            Ok(value) => Self::Scalar(value),
            Err(_) => Self::Text(raw.to_string()),
        }
    }

    /// Best-effort human-readable message.
    ///
    /// Priority: plain text body, then `message`, then `error`, then the
    /// status reason phrase, then [`LOGIN_FAILED_FALLBACK`]. Empty strings
    /// never win.
    #[must_use]
    pub fn message(&self, status_reason: Option<&str>) -> String {
        let reason = || {
            status_reason
                .filter(|reason| !reason.is_empty())
                .unwrap_or(LOGIN_FAILED_FALLBACK)
                .to_string()
        };

        match self {
            Self::Text(text) if !text.is_empty() => text.clone(),
            Self::Text(_) | Self::Empty => reason(),
            Self::Structured(value) => ["message", "error"]
                .iter()
                .find_map(|key| non_empty_str(value.get(key)))
                .map_or_else(reason, str::to_string),
            Self::Scalar(_) => LOGIN_FAILED_FALLBACK.to_string(),
        }
    }
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
}

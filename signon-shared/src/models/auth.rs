use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::user::{SessionUser, UserProfile};

/// Username/password pair submitted to `/api/auth/login`.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Credentials {
    /// The account username.
    pub username: String,
    /// The account password.
    pub password: String,
}

impl Credentials {
    /// Build credentials from anything string-like.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of a successful login response.
///
/// The server answers with either a bare user record or an envelope carrying
/// a session token. The shape is decided by the `token` field alone: a string
/// `token` means an envelope, anything else means the whole body is the user.
/// User data is kept as the JSON received so it can be stored unchanged.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum LoginResult {
    /// `{ token, user }`, where `user` may be omitted.
    Envelope {
        /// Session token issued by the server.
        token: String,
        /// The `user` member as sent, when the key was present (even if
        /// `null`).
        #[serde(skip_serializing_if = "Option::is_none")]
        user: Option<Value>,
    },
    /// The whole body, which is the user record.
    Bare(Value),
}

impl LoginResult {
    /// Classify an already-parsed JSON body. Every JSON value has a shape.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        if let Value::Object(body) = &value
            && let Some(Value::String(token)) = body.get("token")
        {
            return Self::Envelope {
                token: token.clone(),
                user: body.get("user").cloned(),
            };
        }
        Self::Bare(value)
    }

    /// The session token, if this is an envelope.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Envelope { token, .. } => Some(token),
            Self::Bare(_) => None,
        }
    }

    /// Typed view of the user, when it has the full profile shape.
    #[must_use]
    pub fn profile(&self) -> Option<UserProfile> {
        let user = match self {
            Self::Envelope { user, .. } => user.as_ref()?,
            Self::Bare(body) => body,
        };
        serde_json::from_value(user.clone()).ok()
    }
}

impl<'de> Deserialize<'de> for LoginResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

/// Session artifacts derived from a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Token to persist under `authToken`, when the server issued one.
    pub token: Option<String>,
    /// User record to persist under `user`.
    pub user: SessionUser,
}

impl Session {
    /// Normalize a login result into session artifacts.
    ///
    /// An envelope without a `user` key falls back to a minimal record built
    /// from `submitted_username`.
    #[must_use]
    pub fn from_login(result: LoginResult, submitted_username: &str) -> Self {
        match result {
            LoginResult::Envelope { token, user } => Self {
                token: Some(token),
                user: user.map_or_else(
                    || SessionUser::minimal(submitted_username),
                    SessionUser::from,
                ),
            },
            LoginResult::Bare(body) => Self {
                token: None,
                user: SessionUser::from(body),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn alice_json() -> Value {
        json!({
            "id": 1,
            "username": "alice",
            "email": "a@x.com",
            "enabled": true,
            "roles": []
        })
    }

    #[test]
    fn credentials_debug_hides_password() {
        let credentials = Credentials::new("alice", "hunter2");
        let debug = format!("{credentials:?}");

        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn credentials_serialize_as_login_body() {
        let body = serde_json::to_value(Credentials::new("alice", "secret")).unwrap();
        assert_eq!(body, json!({ "username": "alice", "password": "secret" }));
    }

    #[test]
    fn string_token_selects_envelope() {
        let result: LoginResult =
            serde_json::from_value(json!({ "token": "abc", "user": alice_json() })).unwrap();

        assert_eq!(result.token(), Some("abc"));
        assert_eq!(
            result,
            LoginResult::Envelope {
                token: "abc".to_string(),
                user: Some(alice_json())
            }
        );
        assert_eq!(result.profile().map(|p| p.username), Some("alice".to_string()));
    }

    #[test]
    fn envelope_without_user_is_accepted() {
        let result: LoginResult = serde_json::from_value(json!({ "token": "T" })).unwrap();
        assert_eq!(
            result,
            LoginResult::Envelope {
                token: "T".to_string(),
                user: None
            }
        );
        assert!(result.profile().is_none());
    }

    #[test]
    fn envelope_with_null_user_keeps_the_null() {
        let result = LoginResult::from_value(json!({ "token": "T", "user": null }));
        assert_eq!(
            result,
            LoginResult::Envelope {
                token: "T".to_string(),
                user: Some(Value::Null)
            }
        );
    }

    #[test]
    fn bare_profile_has_no_token() {
        let result: LoginResult = serde_json::from_value(alice_json()).unwrap();
        assert!(result.token().is_none());
        assert_eq!(result, LoginResult::Bare(alice_json()));
    }

    #[test]
    fn non_string_token_means_bare_user() {
        let mut body = alice_json();
        body["token"] = json!(42);

        let result: LoginResult = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(result, LoginResult::Bare(body));
    }

    #[test]
    fn any_json_without_token_is_bare() {
        let wrapped = json!({ "user": { "username": "alice" } });
        assert_eq!(
            LoginResult::from_value(wrapped.clone()),
            LoginResult::Bare(wrapped)
        );
        assert_eq!(
            serde_json::from_str::<LoginResult>(r#""welcome""#).unwrap(),
            LoginResult::Bare(json!("welcome"))
        );
    }

    #[test]
    fn non_json_body_is_rejected() {
        assert!(serde_json::from_str::<LoginResult>("<html>ok</html>").is_err());
    }

    #[test]
    fn session_from_envelope_keeps_token_and_user() {
        let result: LoginResult =
            serde_json::from_value(json!({ "token": "T", "user": alice_json() })).unwrap();
        let session = Session::from_login(result, "ignored");

        assert_eq!(session.token.as_deref(), Some("T"));
        assert_eq!(session.user.as_value(), &alice_json());
    }

    #[test]
    fn session_from_token_only_uses_submitted_username() {
        let result: LoginResult = serde_json::from_value(json!({ "token": "T" })).unwrap();
        let session = Session::from_login(result, "bob");

        assert_eq!(session.token.as_deref(), Some("T"));
        assert_eq!(session.user, SessionUser::minimal("bob"));
    }

    #[test]
    fn session_from_null_user_stores_null() {
        let result = LoginResult::from_value(json!({ "token": "T", "user": null }));
        let session = Session::from_login(result, "bob");

        assert_eq!(session.user.as_value(), &Value::Null);
    }

    #[test]
    fn session_from_bare_body_stores_it_unchanged() {
        let body = json!({ "user": { "id": 1, "username": "alice" }, "firstName": "Ann" });
        let session = Session::from_login(LoginResult::from_value(body.clone()), "alice");

        assert!(session.token.is_none());
        assert_eq!(session.user.as_value(), &body);
        assert_eq!(session.user.username(), Some("alice"));
    }
}

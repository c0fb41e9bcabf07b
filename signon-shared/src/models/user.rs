use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A single permission granted through a role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Permission {
    /// Server-side permission identifier.
    pub id: i64,
    /// Permission name, e.g. `users:read`.
    pub name: String,
}

/// A role assigned to a user account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    /// Server-side role identifier.
    pub id: i64,
    /// Role name, e.g. `ADMIN`.
    pub name: String,
    /// Permissions carried by this role.
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

/// Profile of an authenticated user as returned by the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    /// Server-side user identifier.
    pub id: i64,

    /// The user's username.
    pub username: String,

    /// The user's email address.
    pub email: String,

    /// Whether the account is enabled.
    pub enabled: bool,

    /// Roles assigned to the account.
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl UserProfile {
    /// Names of every role on the profile, in server order.
    #[must_use]
    pub fn role_names(&self) -> Vec<&str> {
        self.roles.iter().map(|role| role.name.as_str()).collect()
    }
}

/// The user record persisted after a successful login.
///
/// Holds the JSON the server sent, unchanged, so the stored record is exactly
/// what was received. When the server issued a token without a user, the
/// record is synthesized as `{"username": ...}` from the submitted username.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SessionUser(Value);

impl SessionUser {
    /// Record built from the username the user signed in with.
    #[must_use]
    pub fn minimal(username: impl Into<String>) -> Self {
        Self(json!({ "username": username.into() }))
    }

    /// Username of the stored user.
    ///
    /// Looks at a top-level `username`, then at `user.username` for bodies
    /// that wrap the profile.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.0
            .get("username")
            .or_else(|| self.0.get("user").and_then(|user| user.get("username")))
            .and_then(Value::as_str)
    }

    /// Typed view of the record, when it has the full profile shape.
    #[must_use]
    pub fn profile(&self) -> Option<UserProfile> {
        serde_json::from_value(self.0.clone()).ok()
    }

    /// The record as stored.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for SessionUser {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<UserProfile> for SessionUser {
    fn from(profile: UserProfile) -> Self {
        Self(serde_json::to_value(profile).unwrap_or(Value::Null))
    }
}

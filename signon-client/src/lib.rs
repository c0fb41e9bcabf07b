#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(clippy::pedantic)]

//! Client side of the `SignOn` login flow.
//!
//! [`api::AuthClient`] talks to the authentication endpoint,
//! [`storage::SessionStore`] persists the resulting session artifacts,
//! [`navigation::ScheduledNavigation`] performs the post-login redirect and
//! [`login::LoginController`] ties them together behind form state.

pub mod api;
pub mod login;
pub mod navigation;
pub mod storage;

pub use api::{AuthClient, AuthError, Authenticator};
pub use login::{Field, FormErrors, FormPhase, FormState, LoginController, SubmitOutcome};
pub use navigation::{Navigator, ScheduledNavigation};
pub use storage::{FileStore, MemoryStore, SessionStore, StorageError};

//! Wire and session models for the authentication endpoint.

pub mod auth;
pub mod errors;
pub mod user;

pub use auth::{Credentials, LoginResult, Session};
pub use errors::ErrorBody;
pub use user::{Permission, Role, SessionUser, UserProfile};

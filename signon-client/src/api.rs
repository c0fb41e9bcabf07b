use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, cookie::Jar};
use shared::{
    config::ClientConfig,
    models::{Credentials, ErrorBody, LoginResult},
};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// Message for a login request that never got a response.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";
/// Message for a login request that exceeded the configured timeout.
pub const TIMEOUT_ERROR_MESSAGE: &str = "The login request timed out. Please try again.";
/// Message for failures that fit no other category.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred during login.";

const USER_AGENT: &str = concat!("signon/", env!("CARGO_PKG_VERSION"));

/// Failure of a single login attempt.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No response was received (DNS, refused connection, reset).
    #[error("{}", NETWORK_ERROR_MESSAGE)]
    Network(#[source] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("{}", TIMEOUT_ERROR_MESSAGE)]
    Timeout(#[source] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Api {
        /// Status returned by the server.
        status: StatusCode,
        /// Message extracted from the response body.
        message: String,
    },

    /// Anything else, such as a 2xx body that is not JSON.
    #[error("{}", UNEXPECTED_ERROR_MESSAGE)]
    Unexpected {
        /// Diagnostic detail for logs.
        detail: String,
    },

    /// The client could not be constructed from its configuration.
    #[error("invalid client setup: {0}")]
    Setup(String),
}

impl AuthError {
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err)
        } else if err.is_builder() {
            Self::Unexpected {
                detail: err.to_string(),
            }
        } else {
            Self::Network(err)
        }
    }
}

/// Anything able to exchange credentials for a [`LoginResult`].
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Perform one login attempt. Implementations must not retry.
    async fn login(&self, credentials: &Credentials) -> Result<LoginResult, AuthError>;
}

/// HTTP client for `POST /api/auth/login`.
///
/// Cookies set by the server are kept in a shared jar and replayed on later
/// requests made through the same client.
#[derive(Clone, Debug)]
pub struct AuthClient {
    login_url: Url,
    client: Client,
    cookie_jar: Arc<Jar>,
}

impl AuthClient {
    /// Create a client for the endpoint described by `config`.
    ///
    /// # Errors
    /// Returns [`AuthError::Setup`] if the login URL or HTTP client cannot be
    /// built.
    pub fn new(config: &ClientConfig) -> Result<Self, AuthError> {
        Self::with_cookie_jar(config, Arc::new(Jar::default()))
    }

    /// Create a client that shares an existing cookie jar.
    ///
    /// # Errors
    /// Returns [`AuthError::Setup`] if the login URL or HTTP client cannot be
    /// built.
    pub fn with_cookie_jar(config: &ClientConfig, cookie_jar: Arc<Jar>) -> Result<Self, AuthError> {
        let login_url = config
            .login_url()
            .map_err(|err| AuthError::Setup(format!("invalid login endpoint: {err}")))?;
        let client = Client::builder()
            .cookie_provider(Arc::clone(&cookie_jar))
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| AuthError::Setup(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            login_url,
            client,
            cookie_jar,
        })
    }

    /// The endpoint this client posts to.
    #[must_use]
    pub fn login_url(&self) -> &Url {
        &self.login_url
    }

    /// Cookie jar holding whatever the server set.
    #[must_use]
    pub fn cookie_jar(&self) -> Arc<Jar> {
        Arc::clone(&self.cookie_jar)
    }

    /// Authenticate with username/password credentials.
    ///
    /// # Errors
    /// See [`AuthError`] for the failure categories.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResult, AuthError> {
        debug!(url = %self.login_url, username = %credentials.username, "sending login request");
        let response = self
            .client
            .post(self.login_url.clone())
            .json(credentials)
            .send()
            .await
            .map_err(AuthError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = ErrorBody::parse(&body).message(status.canonical_reason());
            warn!(%status, %message, "login rejected by server");
            return Err(AuthError::Api { status, message });
        }

        let body = response.text().await.map_err(AuthError::from_transport)?;
        let result = serde_json::from_str::<LoginResult>(&body).map_err(|err| {
            warn!(%status, error = %err, "login response is not JSON");
            AuthError::Unexpected {
                detail: err.to_string(),
            }
        })?;

        info!(%status, token = result.token().is_some(), "login accepted");
        Ok(result)
    }
}

#[async_trait]
impl Authenticator for AuthClient {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResult, AuthError> {
        AuthClient::login(self, credentials).await
    }
}

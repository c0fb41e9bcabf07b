//! Login form state and the flow that drives it.
//!
//! ```text
//! Idle -> Validating -> Submitting -> Success | Failed -> Idle
//! ```
//!
//! Validation failures return straight to `Idle` without a request. Every
//! request failure shows the same general message; the specific cause is
//! only logged.

use std::{
    fmt,
    sync::{Arc, Mutex},
    time::Duration,
};

use shared::{
    config::ClientConfig,
    models::{Credentials, Session},
};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    api::{AuthError, Authenticator},
    navigation::{Navigator, ScheduledNavigation},
    storage::{SessionStore, StorageError, persist_session},
};

/// Shown next to an empty username.
pub const USERNAME_REQUIRED: &str = "Username is required";
/// Shown next to an empty password.
pub const PASSWORD_REQUIRED: &str = "Password is required";
/// Shown after a successful login.
pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful!";
/// Shown after any failed login, whatever the cause.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please check your username and password.";

const DEFAULT_HOME_ROUTE: &str = "/";
const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(1500);

/// Where the form is in the login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormPhase {
    /// Editable, nothing in flight.
    #[default]
    Idle,
    /// Checking required fields.
    Validating,
    /// Waiting on the authentication endpoint.
    Submitting,
    /// Logged in; navigation is scheduled.
    Success,
    /// The last attempt failed; the form is editable again.
    Failed,
}

/// An input field of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// The username input.
    Username,
    /// The password input.
    Password,
}

/// Messages currently displayed by the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    /// Inline error for the username field.
    pub username: Option<String>,
    /// Inline error for the password field.
    pub password: Option<String>,
    /// Form-level error.
    pub general: Option<String>,
}

impl FormErrors {
    /// Whether no message is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none() && self.general.is_none()
    }

    /// Inline error for `field`.
    #[must_use]
    pub fn field(&self, field: Field) -> Option<&str> {
        match field {
            Field::Username => self.username.as_deref(),
            Field::Password => self.password.as_deref(),
        }
    }

    fn clear_field(&mut self, field: Field) {
        match field {
            Field::Username => self.username = None,
            Field::Password => self.password = None,
        }
    }
}

/// Everything a view needs to render the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    /// Current field values.
    pub credentials: Credentials,
    /// Validation and general errors.
    pub errors: FormErrors,
    /// Success banner.
    pub success: Option<String>,
    /// True while a request is in flight; the submit control should be
    /// disabled.
    pub loading: bool,
    /// Current phase.
    pub phase: FormPhase,
}

/// Required-field checks. Whitespace-only values count as empty.
#[must_use]
pub fn validate(credentials: &Credentials) -> FormErrors {
    let mut errors = FormErrors::default();
    if credentials.username.trim().is_empty() {
        errors.username = Some(USERNAME_REQUIRED.to_string());
    }
    if credentials.password.trim().is_empty() {
        errors.password = Some(PASSWORD_REQUIRED.to_string());
    }
    errors
}

/// Result of [`LoginController::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A request was already in flight; nothing happened.
    Busy,
    /// Required fields were missing; no request was made.
    Invalid(FormErrors),
    /// Logged in and session artifacts stored.
    LoggedIn(Session),
    /// The attempt failed. The form shows [`LOGIN_FAILED_MESSAGE`].
    Failed,
}

#[derive(Debug, Error)]
enum LoginFailure {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

enum Start {
    Busy,
    Invalid(FormErrors),
    Submit(Credentials),
}

/// Owns the form state and runs the login flow.
pub struct LoginController {
    authenticator: Arc<dyn Authenticator>,
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    home_route: String,
    redirect_delay: Duration,
    state: watch::Sender<FormState>,
    pending_navigation: Mutex<Option<ScheduledNavigation>>,
}

impl fmt::Debug for LoginController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginController")
            .field("home_route", &self.home_route)
            .field("redirect_delay", &self.redirect_delay)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl LoginController {
    /// Create a controller navigating to `/` 1.5 seconds after success.
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state, _) = watch::channel(FormState::default());
        Self {
            authenticator,
            store,
            navigator,
            home_route: DEFAULT_HOME_ROUTE.to_string(),
            redirect_delay: DEFAULT_REDIRECT_DELAY,
            state,
            pending_navigation: Mutex::new(None),
        }
    }

    /// Create a controller using the route and delay from `config`.
    pub fn from_config(
        config: &ClientConfig,
        authenticator: Arc<dyn Authenticator>,
        store: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::new(authenticator, store, navigator)
            .with_home_route(config.home_route.clone())
            .with_redirect_delay(config.redirect_delay())
    }

    /// Route to navigate to after success.
    #[must_use]
    pub fn with_home_route(mut self, route: impl Into<String>) -> Self {
        self.home_route = route.into();
        self
    }

    /// Delay between success and navigation.
    #[must_use]
    pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = delay;
        self
    }

    /// Snapshot of the current form state.
    #[must_use]
    pub fn state(&self) -> FormState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change, including while a request
    /// is in flight.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FormState> {
        self.state.subscribe()
    }

    /// Update a field value. Its inline error disappears immediately; a
    /// finished attempt returns the form to `Idle`.
    pub fn set_field(&self, field: Field, value: impl Into<String>) {
        let value = value.into();
        self.state.send_modify(|state| {
            match field {
                Field::Username => state.credentials.username = value,
                Field::Password => state.credentials.password = value,
            }
            state.errors.clear_field(field);
            if matches!(state.phase, FormPhase::Success | FormPhase::Failed) {
                state.phase = FormPhase::Idle;
            }
        });
    }

    /// Validate and, if the fields are filled in, attempt to log in.
    pub async fn submit(&self) -> SubmitOutcome {
        let credentials = match self.begin_submit() {
            Start::Busy => {
                debug!("login already in flight; ignoring submit");
                return SubmitOutcome::Busy;
            }
            Start::Invalid(errors) => {
                debug!(?errors, "login form failed validation");
                return SubmitOutcome::Invalid(errors);
            }
            Start::Submit(credentials) => credentials,
        };

        info!(username = %credentials.username, "submitting login");
        match self.authenticate(&credentials).await {
            Ok(session) => {
                self.schedule_navigation();
                self.state.send_modify(|state| {
                    state.success = Some(LOGIN_SUCCESS_MESSAGE.to_string());
                    state.loading = false;
                    state.phase = FormPhase::Success;
                });
                info!(
                    username = session.user.username().unwrap_or_default(),
                    token = session.token.is_some(),
                    "login succeeded"
                );
                SubmitOutcome::LoggedIn(session)
            }
            Err(failure) => {
                warn!(error = %failure, detail = ?failure, "login failed");
                self.state.send_modify(|state| {
                    state.errors.general = Some(LOGIN_FAILED_MESSAGE.to_string());
                    state.loading = false;
                    state.phase = FormPhase::Failed;
                });
                SubmitOutcome::Failed
            }
        }
    }

    fn begin_submit(&self) -> Start {
        let mut start = Start::Busy;
        self.state.send_if_modified(|state| {
            if state.loading {
                return false;
            }

            state.phase = FormPhase::Validating;
            let errors = validate(&state.credentials);
            if errors.is_empty() {
                state.errors = FormErrors::default();
                state.success = None;
                state.loading = true;
                state.phase = FormPhase::Submitting;
                start = Start::Submit(state.credentials.clone());
            } else {
                state.errors = errors.clone();
                state.phase = FormPhase::Idle;
                start = Start::Invalid(errors);
            }
            true
        });
        start
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<Session, LoginFailure> {
        let result = self.authenticator.login(credentials).await?;
        let session = Session::from_login(result, &credentials.username);
        persist_session(self.store.as_ref(), &session)?;
        Ok(session)
    }

    fn schedule_navigation(&self) {
        let navigation = ScheduledNavigation::schedule(
            Arc::clone(&self.navigator),
            self.home_route.clone(),
            self.redirect_delay,
        );
        if let Ok(mut pending) = self.pending_navigation.lock() {
            if let Some(previous) = pending.replace(navigation) {
                previous.cancel();
            }
        }
    }

    /// Whether a post-login navigation is scheduled and has not fired yet.
    #[must_use]
    pub fn navigation_pending(&self) -> bool {
        self.pending_navigation
            .lock()
            .ok()
            .and_then(|pending| pending.as_ref().map(|nav| !nav.is_finished()))
            .unwrap_or(false)
    }

    /// Wait for the scheduled navigation, if any.
    ///
    /// Returns `true` once the navigator has been called, `false` if nothing
    /// was scheduled or it was cancelled.
    pub async fn wait_for_navigation(&self) -> bool {
        let navigation = self
            .pending_navigation
            .lock()
            .ok()
            .and_then(|mut pending| pending.take());
        match navigation {
            Some(navigation) => navigation.wait().await,
            None => false,
        }
    }

    /// Cancel any scheduled navigation, e.g. when the view goes away.
    pub fn teardown(&self) {
        if let Ok(mut pending) = self.pending_navigation.lock() {
            if let Some(navigation) = pending.take() {
                debug!(route = navigation.route(), "cancelling scheduled navigation");
                navigation.cancel();
            }
        }
    }
}

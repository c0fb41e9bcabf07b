use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tracing::debug;

/// Receives the route to move to once a login has completed.
pub trait Navigator: Send + Sync {
    /// Navigate to `route`.
    fn navigate(&self, route: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn navigate(&self, route: &str) {
        self(route);
    }
}

/// A navigation that fires after a delay.
///
/// Dropping the handle leaves the navigation scheduled; [`cancel`] stops it.
///
/// [`cancel`]: ScheduledNavigation::cancel
#[derive(Debug)]
pub struct ScheduledNavigation {
    route: String,
    handle: JoinHandle<()>,
}

impl ScheduledNavigation {
    /// Spawn a task that navigates to `route` once `delay` has elapsed.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule(navigator: Arc<dyn Navigator>, route: impl Into<String>, delay: Duration) -> Self {
        let route = route.into();
        let target = route.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!(route = %target, "navigating");
            navigator.navigate(&target);
        });
        Self { route, handle }
    }

    /// Route this navigation targets.
    #[must_use]
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Stop the navigation if it has not fired yet.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    /// Whether the navigation has fired or been cancelled.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the navigation. Returns `false` if it was cancelled.
    pub async fn wait(self) -> bool {
        self.handle.await.is_ok()
    }
}

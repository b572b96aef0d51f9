//! Navigator backed by a watch channel.

use tokio::sync::watch;
use tollgate_application::ports::Navigator;

/// Tracks the current location and publishes every redirect.
///
/// Hosts subscribe to react to forced sign-outs, e.g. by switching screens.
#[derive(Debug)]
pub struct WatchNavigator {
    location: watch::Sender<String>,
}

impl WatchNavigator {
    /// Creates a navigator starting at `location`.
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        let (location, _) = watch::channel(location.into());
        Self { location }
    }

    /// Records a move made by the user rather than by a redirect.
    pub fn visit(&self, location: impl Into<String>) {
        self.location.send_replace(location.into());
    }

    /// Subscribes to location changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.location.subscribe()
    }
}

impl Default for WatchNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for WatchNavigator {
    fn current_location(&self) -> String {
        self.location.borrow().clone()
    }

    fn redirect(&self, target: &str) {
        tracing::debug!(target_location = target, "redirecting");
        self.location.send_replace(target.to_string());
    }
}

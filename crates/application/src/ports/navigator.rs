//! Navigation port

/// Port for moving the user to another surface of the application.
pub trait Navigator: Send + Sync {
    /// Returns the location the user is currently on (path plus optional query).
    fn current_location(&self) -> String;

    /// Sends the user to `target`.
    fn redirect(&self, target: &str);
}

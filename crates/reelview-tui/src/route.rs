//! Logical routes and navigation history.

/// A screen of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Search box, trending list and results.
    Home,
    /// Detail page for one movie ID.
    Movie(u64),
}

/// Navigation history; "back" pops to whatever was shown before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    /// Visited routes, oldest first. Never empty.
    history: Vec<Route>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::Home)
    }
}

impl Navigator {
    /// Starts the history at `root`.
    #[must_use]
    pub fn new(root: Route) -> Self {
        Self {
            history: vec![root],
        }
    }

    /// The route currently shown.
    #[must_use]
    pub fn current(&self) -> Route {
        self.history.last().copied().unwrap_or(Route::Home)
    }

    /// Navigates to `route`.
    pub fn push(&mut self, route: Route) {
        tracing::debug!(?route, "navigate");
        self.history.push(route);
    }

    /// Pops the current route. Returns `false` when already at the first entry.
    pub fn back(&mut self) -> bool {
        if self.history.len() <= 1 {
            return false;
        }
        self.history.pop();
        tracing::debug!(route = ?self.current(), "navigate back");
        true
    }

    /// Number of entries in the history.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_home() {
        // Arrange & Act
        let nav = Navigator::default();

        // Assert
        assert_eq!(nav.current(), Route::Home);
        assert_eq!(nav.depth(), 1);
    }

    #[test]
    fn test_back_returns_to_previous_route() {
        // Arrange
        let mut nav = Navigator::default();
        nav.push(Route::Movie(27_205));
        nav.push(Route::Movie(603));

        // Act
        let moved = nav.back();

        // Assert
        assert!(moved);
        assert_eq!(nav.current(), Route::Movie(27_205));
    }

    #[test]
    fn test_back_at_root_is_noop() {
        // Arrange
        let mut nav = Navigator::new(Route::Movie(1));

        // Act
        let moved = nav.back();

        // Assert
        assert!(!moved);
        assert_eq!(nav.current(), Route::Movie(1));
    }
}

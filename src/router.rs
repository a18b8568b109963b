//! Route selection between the signed-in shell and the sign-in shell.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Projects,
    Calendar,
    Auth,
}

impl Route {
    /// Routes reachable from the sidebar, in display order.
    pub const NAV: [Route; 3] = [Route::Dashboard, Route::Projects, Route::Calendar];

    pub fn path(self) -> &'static str {
        match self {
            Route::Dashboard => "/",
            Route::Projects => "/projects",
            Route::Calendar => "/calendar",
            Route::Auth => "/auth",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Route::Dashboard => "Dashboard",
            Route::Projects => "Projects",
            Route::Calendar => "Calendar",
            Route::Auth => "Sign in",
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        let trimmed = path.trim();
        let normalized = match trimmed.trim_end_matches('/') {
            "" => "/",
            other => other,
        };
        match normalized {
            "/" => Some(Route::Dashboard),
            "/projects" => Some(Route::Projects),
            "/calendar" => Some(Route::Calendar),
            "/auth" => Some(Route::Auth),
            _ => None,
        }
    }
}

/// Where a request for `path` actually lands given the session state.
///
/// Signed-out users always end up on `/auth`. Signed-in users are sent away
/// from `/auth`, and unknown paths fall back to the dashboard.
pub fn resolve(path: &str, signed_in: bool) -> Route {
    guard(Route::from_path(path).unwrap_or(Route::Dashboard), signed_in)
}

pub fn guard(requested: Route, signed_in: bool) -> Route {
    match (signed_in, requested) {
        (false, _) => Route::Auth,
        (true, Route::Auth) => Route::Dashboard,
        (true, route) => route,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_out_users_land_on_auth() {
        assert_eq!(resolve("/projects", false), Route::Auth);
        assert_eq!(resolve("/", false), Route::Auth);
        assert_eq!(resolve("/nowhere", false), Route::Auth);
    }

    #[test]
    fn signed_in_users_leave_auth() {
        assert_eq!(resolve("/auth", true), Route::Dashboard);
        assert_eq!(resolve("/calendar/", true), Route::Calendar);
    }

    #[test]
    fn unknown_paths_fall_back_to_dashboard() {
        assert_eq!(resolve("/settings", true), Route::Dashboard);
        assert_eq!(resolve("", true), Route::Dashboard);
    }

    #[test]
    fn paths_round_trip() {
        for route in [Route::Dashboard, Route::Projects, Route::Calendar, Route::Auth] {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
    }
}

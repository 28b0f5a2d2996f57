//! The endpoint URIs of the app.
//!
//! For endpoints that take a movie ID, e.g., '/movie/{movie_id}', use [format_endpoint].

/// The watchlist page, the landing page for logged in users.
pub const ROOT: &str = "/";
/// The route for getting the registration page and submitting registrations.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page and submitting log-in requests.
pub const LOG_IN_VIEW: &str = "/login";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/logout";
/// The page for adding a movie to the watchlist.
pub const ADD_MOVIE_VIEW: &str = "/add";
/// The publicly viewable movie detail page.
pub const MOVIE_VIEW: &str = "/movie/{movie_id}";
/// The page for editing a movie's extended metadata.
pub const EDIT_MOVIE_VIEW: &str = "/edit/{movie_id}";
/// The route for setting a movie's rating.
pub const RATE_MOVIE: &str = "/movie/{movie_id}/rate";
/// The route for marking a movie as watched today.
pub const WATCH_MOVIE: &str = "/movie/{movie_id}/watch";
/// The route for flipping the UI theme between light and dark.
pub const TOGGLE_THEME: &str = "/toggle-theme";
/// The page shown when an internal server error occurs during a POST request.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/movie/{movie_id}', '{movie_id}' is the
/// parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: &str) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

//! The light/dark UI theme preference and the route handler for flipping it.
//!
//! The theme is a display preference, not an identity claim, so it lives in a
//! plain cookie jar rather than the private auth jar. Logging out does not
//! touch it, which is what lets the preference survive across sessions.

use axum::{
    extract::Query,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use serde::Deserialize;
use time::Duration;

use crate::endpoints;

pub(crate) const COOKIE_THEME: &str = "theme";

/// How long the theme cookie lasts. The preference should outlive any log-in
/// session.
const THEME_COOKIE_DURATION: Duration = Duration::days(365);

/// The UI theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    /// The default light theme.
    Light,
    /// The dark theme.
    Dark,
}

impl Theme {
    /// The theme name as stored in the theme cookie.
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

/// Read the theme preference from the cookie jar.
///
/// Returns `None` if no preference has been stored yet. Any stored value other
/// than "dark" is treated as the light theme.
pub fn get_theme(jar: &CookieJar) -> Option<Theme> {
    jar.get(COOKIE_THEME).map(|cookie| {
        if cookie.value_trimmed() == "dark" {
            Theme::Dark
        } else {
            Theme::Light
        }
    })
}

/// The query parameters for the theme toggle route.
#[derive(Deserialize)]
pub struct ToggleThemeParams {
    /// The page to send the client back to after flipping the theme.
    pub current_page: Option<String>,
}

/// Flip the theme between light and dark and redirect back to `current_page`.
///
/// A client with no stored preference gets the light theme on the first
/// toggle, so two toggles from an unset state go unset, light, dark.
///
/// The redirect target is echoed verbatim from the query string with no
/// same-origin check, a known open-redirect gap in the contract this app
/// implements.
pub async fn get_toggle_theme(
    jar: CookieJar,
    Query(params): Query<ToggleThemeParams>,
) -> Response {
    let next_theme = match get_theme(&jar) {
        Some(Theme::Dark) | None => Theme::Light,
        Some(Theme::Light) => Theme::Dark,
    };

    let jar = jar.add(
        Cookie::build((COOKIE_THEME, next_theme.as_str()))
            .path("/")
            .same_site(SameSite::Lax)
            .max_age(THEME_COOKIE_DURATION),
    );

    let redirect_target = params
        .current_page
        .unwrap_or_else(|| endpoints::ROOT.to_owned());

    (jar, Redirect::to(&redirect_target)).into_response()
}

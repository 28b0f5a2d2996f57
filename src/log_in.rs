//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! The auth_cookie module handles the lower level cookie auth logic.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{CookieJar, PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    app_state::create_cookie_key,
    auth_cookie::{DEFAULT_COOKIE_DURATION, get_user_id_from_auth_cookie, set_auth_cookie},
    endpoints,
    html::{base, email_input, link, log_in_register, password_input},
    internal_server_error::get_internal_server_error_redirect,
    password::PASSWORD_MIN_LENGTH,
    theme::get_theme,
    user::{User, get_user_by_email},
};

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect email or password.";

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl LoginState {
    /// Create the cookie key from a string and set the default cookie duration.
    pub fn new(cookie_secret: &str, db_connection: Arc<Mutex<Connection>>) -> Self {
        Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection,
        }
    }
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The query parameters for the log-in page.
#[derive(Deserialize)]
pub struct LogInPageParams {
    /// Set when the client was just redirected here after registering.
    pub registered: Option<String>,
}

/// Display the log-in page.
///
/// A client that is already logged in is sent straight to the watchlist.
pub async fn get_log_in_page(
    State(_state): State<LoginState>,
    private_jar: PrivateCookieJar,
    jar: CookieJar,
    Query(params): Query<LogInPageParams>,
) -> Response {
    if get_user_id_from_auth_cookie(&private_jar).is_ok() {
        return Redirect::to(endpoints::ROOT).into_response();
    }

    let form = log_in_form("", None);
    let content = html! {
        @if params.registered.is_some() {
            p class="text-center text-green-600 dark:text-green-400 pt-4"
            {
                "Registration successful. Please log in."
            }
        }

        (log_in_register("Log in", &form))
    };

    base("Log in", get_theme(&jar), &content).into_response()
}

fn log_in_form(email: &str, error_message: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_VIEW)
            class="space-y-4 md:space-y-6"
        {
            (email_input(email, None))
            (password_input("", PASSWORD_MIN_LENGTH, error_message))

            button
                type="submit" tabindex="0"
                class="w-full px-4 py-2 bg-blue-500 dark:bg-blue-600 disabled:bg-blue-700
                    hover:enabled:bg-blue-600 hover:enabled:dark:bg-blue-700 text-white rounded"
            {
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Don't have an account? "
                (link(endpoints::REGISTER_VIEW, "Register here"))
            }
        }
    }
}

/// The raw data entered by the user in the log-in form.
///
/// The email and password are stored as plain strings. There is no need for validation here since
/// they will be compared against the email and password in the database, which have been verified.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// Email entered during log-in.
    pub email: String,
    /// Password entered during log-in.
    pub password: String,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie is set and the client is
/// redirected to the watchlist page. Otherwise, the form is returned with a
/// single generic error message. An unknown email and a wrong password
/// produce the same message on purpose, so the form does not reveal which
/// emails are registered.
///
/// A client that is already logged in is redirected to the watchlist without
/// checking the submitted credentials, same as the GET page.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    if get_user_id_from_auth_cookie(&jar).is_ok() {
        return Redirect::to(endpoints::ROOT).into_response();
    }

    let user: User = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        match get_user_by_email(&user_data.email, &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => {
                return log_in_error_response(&user_data.email);
            }
            Err(error) => {
                tracing::error!("Unhandled error while verifying credentials: {error}");
                return log_in_error_response(&user_data.email);
            }
        }
    };

    let is_password_valid = match user.password_hash.verify(&user_data.password) {
        Ok(is_password_valid) => is_password_valid,
        Err(error) => {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            return log_in_error_response(&user_data.email);
        }
    };

    if !is_password_valid {
        return log_in_error_response(&user_data.email);
    }

    match set_auth_cookie(jar, &user.id, state.cookie_duration) {
        Ok(updated_jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::ROOT.to_owned()),
            updated_jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("Error setting auth cookie: {error}");
            get_internal_server_error_redirect()
        }
    }
}

fn log_in_error_response(email: &str) -> Response {
    log_in_form(email, Some(INVALID_CREDENTIALS_ERROR_MSG)).into_response()
}

//! The registration page and the endpoint for creating a new account.

use std::{
    str::FromStr,
    sync::{Arc, Mutex},
};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{CookieJar, PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use email_address::EmailAddress;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, PasswordHash, ValidatedPassword,
    app_state::create_cookie_key,
    auth_cookie::get_user_id_from_auth_cookie,
    endpoints,
    html::{base, confirm_password_input, email_input, link, log_in_register, password_input},
    internal_server_error::get_internal_server_error_redirect,
    password::PASSWORD_MIN_LENGTH,
    theme::get_theme,
    user::create_user,
};

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl RegistrationState {
    /// Create the cookie key from a string.
    pub fn new(cookie_secret: &str, db_connection: Arc<Mutex<Connection>>) -> Self {
        Self {
            cookie_key: create_cookie_key(cookie_secret),
            db_connection,
        }
    }
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// Which fields of the registration form should display an error.
#[derive(Default)]
struct RegistrationFormErrors<'a> {
    email: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn registration_form(email: &str, errors: RegistrationFormErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::REGISTER_VIEW)
            class="space-y-4 md:space-y-6"
        {
            (email_input(email, errors.email))
            (password_input("", PASSWORD_MIN_LENGTH, errors.password))
            (confirm_password_input(PASSWORD_MIN_LENGTH, errors.confirm_password))

            button
                type="submit" tabindex="0"
                class="w-full px-4 py-2 bg-blue-500 dark:bg-blue-600 disabled:bg-blue-700
                    hover:enabled:bg-blue-600 hover:enabled:dark:bg-blue-700 text-white rounded"
            {
                "Register"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "
                (link(endpoints::LOG_IN_VIEW, "Log in here"))
            }
        }
    }
}

/// Display the registration page.
///
/// A client that is already logged in is sent straight to the watchlist.
pub async fn get_register_page(
    State(_state): State<RegistrationState>,
    private_jar: PrivateCookieJar,
    jar: CookieJar,
) -> Response {
    if get_user_id_from_auth_cookie(&private_jar).is_ok() {
        return Redirect::to(endpoints::ROOT).into_response();
    }

    let form = registration_form("", RegistrationFormErrors::default());
    let content = log_in_register("Create an account", &form);

    base("Register", get_theme(&jar), &content).into_response()
}

/// The raw data entered by the user in the registration form.
#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Handle registration form submission.
///
/// Validates the email format, the password length and that the two password
/// fields match, then creates the user and redirects to the log-in page.
///
/// The email is only checked for its format, not for uniqueness: registering
/// an email twice quietly creates a second account, and log-in will keep
/// matching the account that was created first.
///
/// A client that is already logged in is redirected to the watchlist without
/// creating an account, same as the GET page.
pub async fn post_register(
    State(state): State<RegistrationState>,
    private_jar: PrivateCookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    if get_user_id_from_auth_cookie(&private_jar).is_ok() {
        return Redirect::to(endpoints::ROOT).into_response();
    }

    let email = match EmailAddress::from_str(&user_data.email) {
        Ok(email) => email,
        Err(_) => {
            return registration_form(
                &user_data.email,
                RegistrationFormErrors {
                    email: Some("Please enter a valid email address"),
                    ..Default::default()
                },
            )
            .into_response();
        }
    };

    let validated_password = match ValidatedPassword::new(&user_data.password) {
        Ok(password) => password,
        Err(error) => {
            let message = error.to_string();

            return registration_form(
                &user_data.email,
                RegistrationFormErrors {
                    password: Some(&message),
                    ..Default::default()
                },
            )
            .into_response();
        }
    };

    if user_data.password != user_data.confirm_password {
        return registration_form(
            &user_data.email,
            RegistrationFormErrors {
                confirm_password: Some("Passwords do not match"),
                ..Default::default()
            },
        )
        .into_response();
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");
            return get_internal_server_error_redirect();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return get_internal_server_error_redirect();
        }
    };

    match create_user(email, password_hash, &connection) {
        Ok(_) => (
            HxRedirect(format!("{}?registered=true", endpoints::LOG_IN_VIEW)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");
            get_internal_server_error_redirect()
        }
    }
}

#[cfg(test)]
mod get_register_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            must_get_form,
        },
        user::create_user_table,
    };

    use super::{RegistrationState, get_register_page};

    #[tokio::test]
    async fn render_register_page() {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_user_table(&connection).expect("Could not create user table");
        let state = RegistrationState::new("42", Arc::new(Mutex::new(connection)));
        let app = Router::new()
            .route(endpoints::REGISTER_VIEW, get(get_register_page))
            .with_state(state);
        let server = TestServer::new(app).expect("Could not create test server.");

        let response = server.get(endpoints::REGISTER_VIEW).await;

        response.assert_status(StatusCode::OK);

        let html = scraper::Html::parse_document(&response.text());
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::REGISTER_VIEW, "hx-post");
        assert_form_input(&form, "email", "email");
        assert_form_input(&form, "password", "password");
        assert_form_input(&form, "confirm_password", "password");
        assert_form_submit_button(&form);
    }
}

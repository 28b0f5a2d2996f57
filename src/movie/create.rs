//! The page and endpoint for adding a movie to the watchlist.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, text_input},
    movie::{Movie, create_movie, domain::MovieFormData},
    navigation::NavBar,
    theme::get_theme,
    user::{UserId, append_movie_to_watchlist},
};

/// The state needed for adding a movie.
#[derive(Debug, Clone)]
pub struct CreateMovieEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateMovieEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the add movie page.
pub async fn get_add_movie_page(jar: CookieJar) -> Response {
    let form = add_movie_form_view("", "", "", "");
    let content = html! {
        (NavBar::new(endpoints::ADD_MOVIE_VIEW).into_html())
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Add Movie", get_theme(&jar), &content).into_response()
}

/// Handle add movie form submission.
///
/// On success, the movie is inserted into the shared movie collection and its
/// ID appended to the submitting user's watchlist. These are two separate
/// writes with no transaction around them, so a crash in between can leave a
/// movie that is in no watchlist.
pub async fn create_movie_endpoint(
    State(state): State<CreateMovieEndpointState>,
    Extension(user_id): Extension<UserId>,
    Form(form_data): Form<MovieFormData>,
) -> Response {
    let year: i64 = match form_data.year.trim().parse() {
        Ok(year) => year,
        Err(_) => {
            return add_movie_form_view(
                &form_data.title,
                &form_data.director,
                &form_data.year,
                "Error: Release year must be a number",
            )
            .into_response();
        }
    };

    let movie = match Movie::new(&form_data.title, &form_data.director, year) {
        Ok(movie) => movie,
        Err(error) => {
            return add_movie_form_view(
                &form_data.title,
                &form_data.director,
                &form_data.year,
                &format!("Error: {error}"),
            )
            .into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    if let Err(error) = create_movie(&movie, &connection) {
        tracing::error!("An unexpected error occurred while creating a movie: {error}");
        return error.into_response();
    }

    match append_movie_to_watchlist(&user_id, &movie.id, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::ROOT.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while appending to the watchlist: {error}"
            );
            error.into_response()
        }
    }
}

fn add_movie_form_view(title: &str, director: &str, year: &str, error_message: &str) -> Markup {
    html! {
        form
            hx-post=(endpoints::ADD_MOVIE_VIEW)
            class="w-full space-y-4 md:space-y-6"
        {
            (text_input("title", "Title", title, true))
            (text_input("director", "Director", director, true))
            (text_input("year", "Release Year", year, true))

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Movie" }
        }
    }
}

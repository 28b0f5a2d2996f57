//! The page and endpoint for editing a movie's extended metadata.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, text_input, textarea_input},
    movie::{
        Movie, MovieId,
        domain::ExtendedMovieFormData,
        get_movie, join_string_list, parse_string_list, update_movie,
    },
    navigation::NavBar,
    theme::get_theme,
};

/// The state needed for the edit movie page and its endpoint.
#[derive(Debug, Clone)]
pub struct EditMoviePageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditMoviePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the edit movie page with the stored values filled in.
///
/// The list-valued fields are shown one element per line, the same shape the
/// form parses them back out of.
///
/// # Errors
///
/// Returns [Error::NotFound] if no movie has the given ID.
pub async fn get_edit_movie_page(
    Path(movie_id): Path<String>,
    State(state): State<EditMoviePageState>,
    jar: CookieJar,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let movie = get_movie(&MovieId::new(&movie_id), &connection)?;

    let form_data = ExtendedMovieFormData {
        title: movie.title.clone(),
        director: movie.director.clone(),
        year: movie.year.to_string(),
        cast: join_string_list(&movie.cast),
        series: join_string_list(&movie.series),
        tags: join_string_list(&movie.tags),
        description: movie.description.clone(),
        video_link: movie.video_link.clone(),
    };

    Ok(base(
        "Edit Movie",
        get_theme(&jar),
        &edit_movie_view(&movie.id, &form_data, ""),
    )
    .into_response())
}

/// Handle edit movie form submission.
///
/// This is a whole-record overwrite: every editable field is written from the
/// form, including fields the user left empty. The rating and last watched
/// time are not on the form; they are carried over from the stored row so the
/// overwrite does not lose them.
///
/// # Errors
///
/// Returns [Error::NotFound] if no movie has the given ID.
pub async fn update_movie_endpoint(
    Path(movie_id): Path<String>,
    State(state): State<EditMoviePageState>,
    Form(form_data): Form<ExtendedMovieFormData>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let stored_movie = get_movie(&MovieId::new(&movie_id), &connection)?;

    let year: i64 = match form_data.year.trim().parse() {
        Ok(year) => year,
        Err(_) => {
            return Ok(edit_movie_form_view(
                &stored_movie.id,
                &form_data,
                "Error: Release year must be a number",
            )
            .into_response());
        }
    };

    // Movie::new validates the basic fields; the fresh ID it generates is
    // replaced with the stored one.
    let mut updated_movie = match Movie::new(&form_data.title, &form_data.director, year) {
        Ok(movie) => movie,
        Err(error) => {
            return Ok(edit_movie_form_view(
                &stored_movie.id,
                &form_data,
                &format!("Error: {error}"),
            )
            .into_response());
        }
    };

    updated_movie.id = stored_movie.id;
    updated_movie.cast = parse_string_list(&form_data.cast);
    updated_movie.series = parse_string_list(&form_data.series);
    updated_movie.tags = parse_string_list(&form_data.tags);
    updated_movie.description = form_data.description.trim().to_string();
    updated_movie.video_link = form_data.video_link.trim().to_string();
    updated_movie.rating = stored_movie.rating;
    updated_movie.last_watched = stored_movie.last_watched;

    update_movie(&updated_movie, &connection)?;

    let detail_url = endpoints::format_endpoint(endpoints::MOVIE_VIEW, updated_movie.id.as_str());

    Ok((HxRedirect(detail_url), StatusCode::SEE_OTHER).into_response())
}

fn edit_movie_view(movie_id: &MovieId, form_data: &ExtendedMovieFormData, error_message: &str) -> Markup {
    let edit_url = endpoints::format_endpoint(endpoints::EDIT_MOVIE_VIEW, movie_id.as_str());
    let nav_bar = NavBar::new(&edit_url).into_html();
    let form = edit_movie_form_view(movie_id, form_data, error_message);

    html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    }
}

fn edit_movie_form_view(
    movie_id: &MovieId,
    form_data: &ExtendedMovieFormData,
    error_message: &str,
) -> Markup {
    let update_url = endpoints::format_endpoint(endpoints::EDIT_MOVIE_VIEW, movie_id.as_str());

    html! {
        form
            hx-post=(update_url)
            class="w-full space-y-4 md:space-y-6"
        {
            (text_input("title", "Title", &form_data.title, true))
            (text_input("director", "Director", &form_data.director, true))
            (text_input("year", "Release Year", &form_data.year, true))
            (textarea_input("cast", "Cast (one per line)", &form_data.cast, 4))
            (textarea_input("series", "Series (one per line)", &form_data.series, 2))
            (textarea_input("tags", "Tags (one per line)", &form_data.tags, 2))
            (textarea_input("description", "Description", &form_data.description, 4))
            (text_input("video_link", "Video Link", &form_data.video_link, false))

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save Changes" }
        }
    }
}

#[cfg(test)]
mod edit_movie_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        endpoints,
        movie::{Movie, create_movie, create_movie_table, update_movie},
        test_utils::{
            assert_form_input_with_value, assert_valid_html, must_get_form, parse_test_html,
        },
    };

    use super::{EditMoviePageState, get_edit_movie_page};

    fn get_test_state() -> EditMoviePageState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_movie_table(&connection).expect("Could not create movie table");

        EditMoviePageState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn get_test_server(state: EditMoviePageState) -> TestServer {
        let app = Router::new()
            .route(endpoints::EDIT_MOVIE_VIEW, get(get_edit_movie_page))
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn form_is_prefilled_with_stored_values() {
        let state = get_test_state();
        let movie = {
            let connection = state.db_connection.lock().unwrap();
            let mut movie = Movie::new("Inception", "Nolan", 2010).unwrap();
            create_movie(&movie, &connection).unwrap();
            movie.cast = vec!["Leonardo DiCaprio".to_string(), "Elliot Page".to_string()];
            update_movie(&movie, &connection).unwrap();
            movie
        };
        let server = get_test_server(state);

        let response = server
            .get(&endpoints::format_endpoint(
                endpoints::EDIT_MOVIE_VIEW,
                movie.id.as_str(),
            ))
            .await;

        response.assert_status(StatusCode::OK);

        let text = response.text();
        let html = parse_test_html(&text);
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_form_input_with_value(&form, "title", "text", "Inception");
        assert_form_input_with_value(&form, "director", "text", "Nolan");
        assert_form_input_with_value(&form, "year", "text", "2010");
        // The cast textarea carries its value as text content, one per line.
        assert!(text.contains("Leonardo DiCaprio\nElliot Page"));
    }

    #[tokio::test]
    async fn editing_unknown_movie_returns_404() {
        let server = get_test_server(get_test_state());

        let response = server
            .get(&endpoints::format_endpoint(
                endpoints::EDIT_MOVIE_VIEW,
                "deadbeef",
            ))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}

#[cfg(test)]
mod update_movie_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use time::OffsetDateTime;

    use crate::{
        endpoints,
        movie::{
            Movie, create_movie, create_movie_table, domain::ExtendedMovieFormData, get_movie,
            set_movie_last_watched, set_movie_rating,
        },
        test_utils::assert_hx_redirect_header,
    };

    use super::{EditMoviePageState, update_movie_endpoint};

    fn get_test_state_with_movie() -> (EditMoviePageState, Movie) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_movie_table(&connection).expect("Could not create movie table");
        let movie = Movie::new("Inception", "Nolan", 2010).unwrap();
        create_movie(&movie, &connection).expect("Could not insert test movie");

        (
            EditMoviePageState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            movie,
        )
    }

    fn get_test_server(state: EditMoviePageState) -> TestServer {
        let app = Router::new()
            .route(endpoints::EDIT_MOVIE_VIEW, post(update_movie_endpoint))
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    fn full_form(title: &str, year: &str) -> ExtendedMovieFormData {
        ExtendedMovieFormData {
            title: title.to_string(),
            director: "Christopher Nolan".to_string(),
            year: year.to_string(),
            cast: " Leonardo DiCaprio \nElliot Page".to_string(),
            series: "".to_string(),
            tags: "heist\nsci-fi".to_string(),
            description: "A thief who steals corporate secrets.".to_string(),
            video_link: "https://example.com/trailer".to_string(),
        }
    }

    #[tokio::test]
    async fn update_overwrites_fields_and_redirects_to_detail_page() {
        let (state, movie) = get_test_state_with_movie();
        let server = get_test_server(state.clone());

        let response = server
            .post(&endpoints::format_endpoint(
                endpoints::EDIT_MOVIE_VIEW,
                movie.id.as_str(),
            ))
            .form(&full_form("Inception (Director's Cut)", "2011"))
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_hx_redirect_header(
            &response,
            &endpoints::format_endpoint(endpoints::MOVIE_VIEW, movie.id.as_str()),
        );

        let connection = state.db_connection.lock().unwrap();
        let got = get_movie(&movie.id, &connection).unwrap();
        assert_eq!(got.title, "Inception (Director's Cut)");
        assert_eq!(got.year, 2011);
        assert_eq!(
            got.cast,
            vec!["Leonardo DiCaprio".to_string(), "Elliot Page".to_string()]
        );
        assert_eq!(got.series, Vec::<String>::new());
        assert_eq!(got.tags, vec!["heist".to_string(), "sci-fi".to_string()]);
    }

    #[tokio::test]
    async fn update_preserves_rating_and_last_watched() {
        let (state, movie) = get_test_state_with_movie();
        let watched_at = OffsetDateTime::now_utc();
        {
            let connection = state.db_connection.lock().unwrap();
            set_movie_rating(&movie.id, 9, &connection).unwrap();
            set_movie_last_watched(&movie.id, watched_at, &connection).unwrap();
        }
        let server = get_test_server(state.clone());

        server
            .post(&endpoints::format_endpoint(
                endpoints::EDIT_MOVIE_VIEW,
                movie.id.as_str(),
            ))
            .form(&full_form("Inception", "2010"))
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let connection = state.db_connection.lock().unwrap();
        let got = get_movie(&movie.id, &connection).unwrap();
        assert_eq!(got.rating, Some(9));
        assert!(got.last_watched.is_some());
    }

    #[tokio::test]
    async fn empty_list_fields_clear_stored_lists() {
        let (state, movie) = get_test_state_with_movie();
        {
            let connection = state.db_connection.lock().unwrap();
            let mut with_cast = get_movie(&movie.id, &connection).unwrap();
            with_cast.cast = vec!["Leonardo DiCaprio".to_string()];
            crate::movie::update_movie(&with_cast, &connection).unwrap();
        }
        let server = get_test_server(state.clone());

        let mut form = full_form("Inception", "2010");
        form.cast = "   ".to_string();
        server
            .post(&endpoints::format_endpoint(
                endpoints::EDIT_MOVIE_VIEW,
                movie.id.as_str(),
            ))
            .form(&form)
            .await
            .assert_status(StatusCode::SEE_OTHER);

        let connection = state.db_connection.lock().unwrap();
        let got = get_movie(&movie.id, &connection).unwrap();
        assert_eq!(got.cast, Vec::<String>::new());
    }

    #[tokio::test]
    async fn non_numeric_year_shows_form_error() {
        let (state, movie) = get_test_state_with_movie();
        let server = get_test_server(state.clone());

        let response = server
            .post(&endpoints::format_endpoint(
                endpoints::EDIT_MOVIE_VIEW,
                movie.id.as_str(),
            ))
            .form(&full_form("Inception", "soon"))
            .await;

        response.assert_status(StatusCode::OK);
        assert!(
            response
                .text()
                .contains("Error: Release year must be a number")
        );

        let connection = state.db_connection.lock().unwrap();
        let got = get_movie(&movie.id, &connection).unwrap();
        assert_eq!(got.year, 2010, "a failed update should not change the row");
    }

    #[tokio::test]
    async fn updating_unknown_movie_returns_404() {
        let (state, _movie) = get_test_state_with_movie();
        let server = get_test_server(state);

        let response = server
            .post(&endpoints::format_endpoint(
                endpoints::EDIT_MOVIE_VIEW,
                "deadbeef",
            ))
            .form(&full_form("Inception", "2010"))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}

//! The movie detail page and the endpoints for rating a movie and marking it
//! as watched.
//!
//! The detail page is publicly viewable: a movie's ID is enough to see it
//! without logging in. Rating and marking as watched require a logged-in
//! user but are not restricted to the users whose watchlists hold the movie.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::{OffsetDateTime, macros::format_description};

use crate::{
    AppState, Error, endpoints,
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, TAG_BADGE_STYLE, base},
    movie::{Movie, MovieId, get_movie, set_movie_last_watched, set_movie_rating},
    navigation::NavBar,
    theme::get_theme,
};

/// The state needed for the movie detail page and its endpoints.
#[derive(Debug, Clone)]
pub struct MovieDetailState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for MovieDetailState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the movie detail page.
///
/// # Errors
///
/// Returns [Error::NotFound] if no movie has the given ID, which renders as
/// the 404 page.
pub async fn get_movie_page(
    Path(movie_id): Path<String>,
    State(state): State<MovieDetailState>,
    jar: CookieJar,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let movie = get_movie(&MovieId::new(&movie_id), &connection)?;

    Ok(base(&movie.title, get_theme(&jar), &movie_view(&movie)).into_response())
}

fn movie_view(movie: &Movie) -> Markup {
    // Use the concrete detail URL so the theme toggle can come back here.
    let detail_url = endpoints::format_endpoint(endpoints::MOVIE_VIEW, movie.id.as_str());
    let nav_bar = NavBar::new(&detail_url).into_html();
    let edit_url = endpoints::format_endpoint(endpoints::EDIT_MOVIE_VIEW, movie.id.as_str());
    let watch_url = endpoints::format_endpoint(endpoints::WATCH_MOVIE, movie.id.as_str());
    let rate_url = endpoints::format_endpoint(endpoints::RATE_MOVIE, movie.id.as_str());

    let date_format = format_description!("[year]-[month]-[day]");
    let last_watched = movie
        .last_watched
        .and_then(|date_time| date_time.format(date_format).ok());

    let string_list_row = |label: &str, items: &[String]| {
        html!(
            @if !items.is_empty() {
                div class="py-2"
                {
                    h2 class="text-sm font-semibold uppercase text-gray-500 dark:text-gray-400" { (label) }

                    div class="flex flex-wrap gap-1 pt-1"
                    {
                        @for item in items {
                            span class=(TAG_BADGE_STYLE) { (item) }
                        }
                    }
                }
            }
        )
    };

    html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-3xl font-bold" { (movie.title) }

            p class="text-gray-500 dark:text-gray-400 pb-4"
            {
                "Directed by " (movie.director) ", " (movie.year)
            }

            @if let Some(rating) = movie.rating {
                p class="py-1" { "Rating: " (rating) "/10" }
            }

            @if let Some(last_watched) = last_watched {
                p class="py-1" { "Last watched: " (last_watched) }
            }

            @if !movie.description.is_empty() {
                p class="py-2 max-w-prose" { (movie.description) }
            }

            @if !movie.video_link.is_empty() {
                p class="py-1"
                {
                    a href=(movie.video_link) class=(LINK_STYLE) { "Watch trailer" }
                }
            }

            (string_list_row("Cast", &movie.cast))
            (string_list_row("Series", &movie.series))
            (string_list_row("Tags", &movie.tags))

            div class="flex gap-4 pt-4"
            {
                a href=(edit_url) class=(LINK_STYLE) { "Edit" }
                a href=(watch_url) class=(LINK_STYLE) { "Watched it today" }
            }

            div class="flex gap-2 pt-4 items-baseline"
            {
                span class="text-sm text-gray-500 dark:text-gray-400" { "Rate:" }

                @for rating in 1..=10 {
                    a href=(format!("{rate_url}?rating={rating}")) class=(LINK_STYLE)
                    {
                        (rating)
                    }
                }
            }
        }
    }
}

/// The query parameters for the rate movie route.
///
/// The rating is a required integer: a request with the parameter missing or
/// set to a non-numeric value is rejected before this handler runs.
#[derive(Deserialize)]
pub struct RateParams {
    pub rating: i64,
}

/// Set a movie's rating and redirect back to its detail page.
///
/// No rating range is enforced.
///
/// # Errors
///
/// Returns [Error::NotFound] if no movie has the given ID.
pub async fn rate_movie_endpoint(
    Path(movie_id): Path<String>,
    Query(params): Query<RateParams>,
    State(state): State<MovieDetailState>,
) -> Result<Redirect, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let movie_id = MovieId::new(&movie_id);
    set_movie_rating(&movie_id, params.rating, &connection)?;

    Ok(Redirect::to(&endpoints::format_endpoint(
        endpoints::MOVIE_VIEW,
        movie_id.as_str(),
    )))
}

/// Record that a movie was watched just now and redirect back to its detail
/// page.
///
/// # Errors
///
/// Returns [Error::NotFound] if no movie has the given ID.
pub async fn watch_movie_endpoint(
    Path(movie_id): Path<String>,
    State(state): State<MovieDetailState>,
) -> Result<Redirect, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let movie_id = MovieId::new(&movie_id);
    set_movie_last_watched(&movie_id, OffsetDateTime::now_utc(), &connection)?;

    Ok(Redirect::to(&endpoints::format_endpoint(
        endpoints::MOVIE_VIEW,
        movie_id.as_str(),
    )))
}


#[cfg(test)]
mod rate_movie_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        endpoints,
        movie::{Movie, create_movie, create_movie_table, get_movie},
    };

    use super::{MovieDetailState, rate_movie_endpoint};

    fn get_test_state_with_movie() -> (MovieDetailState, Movie) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_movie_table(&connection).expect("Could not create movie table");
        let movie = Movie::new("Inception", "Nolan", 2010).unwrap();
        create_movie(&movie, &connection).expect("Could not insert test movie");

        (
            MovieDetailState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            movie,
        )
    }

    fn get_test_server(state: MovieDetailState) -> TestServer {
        let app = Router::new()
            .route(endpoints::RATE_MOVIE, get(rate_movie_endpoint))
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn sets_rating_and_redirects_to_detail_page() {
        let (state, movie) = get_test_state_with_movie();
        let server = get_test_server(state.clone());

        let response = server
            .get(&endpoints::format_endpoint(
                endpoints::RATE_MOVIE,
                movie.id.as_str(),
            ))
            .add_query_param("rating", 8)
            .await;

        response.assert_status_see_other();
        assert_eq!(
            response.header("location"),
            endpoints::format_endpoint(endpoints::MOVIE_VIEW, movie.id.as_str())
        );

        let connection = state.db_connection.lock().unwrap();
        let got = get_movie(&movie.id, &connection).unwrap();
        assert_eq!(got.rating, Some(8));
    }

    #[tokio::test]
    async fn missing_rating_parameter_is_an_error() {
        let (state, movie) = get_test_state_with_movie();
        let server = get_test_server(state);

        let response = server
            .get(&endpoints::format_endpoint(
                endpoints::RATE_MOVIE,
                movie.id.as_str(),
            ))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_numeric_rating_is_an_error() {
        let (state, movie) = get_test_state_with_movie();
        let server = get_test_server(state.clone());

        let response = server
            .get(&endpoints::format_endpoint(
                endpoints::RATE_MOVIE,
                movie.id.as_str(),
            ))
            .add_query_param("rating", "ten")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);

        let connection = state.db_connection.lock().unwrap();
        let got = crate::movie::get_movie(&movie.id, &connection).unwrap();
        assert_eq!(got.rating, None);
    }

    #[tokio::test]
    async fn out_of_range_rating_is_stored_as_is() {
        let (state, movie) = get_test_state_with_movie();
        let server = get_test_server(state.clone());

        server
            .get(&endpoints::format_endpoint(
                endpoints::RATE_MOVIE,
                movie.id.as_str(),
            ))
            .add_query_param("rating", 42)
            .await
            .assert_status_see_other();

        let connection = state.db_connection.lock().unwrap();
        let got = get_movie(&movie.id, &connection).unwrap();
        assert_eq!(got.rating, Some(42));
    }

    #[tokio::test]
    async fn rating_unknown_movie_returns_404() {
        let (state, _movie) = get_test_state_with_movie();
        let server = get_test_server(state);

        let response = server
            .get(&endpoints::format_endpoint(
                endpoints::RATE_MOVIE,
                "deadbeef",
            ))
            .add_query_param("rating", 8)
            .await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}

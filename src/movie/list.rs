//! The watchlist page, the landing page for logged-in users.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base,
    },
    movie::{Movie, MovieId, get_movies_by_ids},
    navigation::NavBar,
    theme::get_theme,
    user::{UserId, get_user_by_id, get_watchlist_ids},
};

/// The state needed for the watchlist page.
#[derive(Debug, Clone)]
pub struct WatchlistPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for WatchlistPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A movie with its formatted detail URL for template rendering.
#[derive(Debug, Clone)]
struct MovieWithDetailUrl {
    movie: Movie,
    detail_url: String,
}

/// Render the watchlist page for the logged-in user.
pub async fn get_watchlist_page(
    State(state): State<WatchlistPageState>,
    Extension(user_id): Extension<UserId>,
    jar: CookieJar,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = get_user_by_id(&user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve user {user_id}: {error}"))?;

    let movie_ids = get_watchlist_ids(&user_id, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve watchlist: {error}"))?;

    let movies = get_movies_by_ids(&movie_ids, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve movies: {error}"))?;

    // The membership lookup follows store order, so re-order the rows to match
    // the watchlist's append order. Dangling IDs drop out here.
    let mut movies_by_id: HashMap<MovieId, Movie> = movies
        .into_iter()
        .map(|movie| (movie.id.clone(), movie))
        .collect();
    let movies_with_urls = movie_ids
        .iter()
        .filter_map(|movie_id| movies_by_id.remove(movie_id))
        .map(|movie| MovieWithDetailUrl {
            detail_url: endpoints::format_endpoint(endpoints::MOVIE_VIEW, movie.id.as_str()),
            movie,
        })
        .collect::<Vec<_>>();

    Ok(base(
        "Watchlist",
        get_theme(&jar),
        &watchlist_view(user.email.as_str(), &movies_with_urls),
    )
    .into_response())
}

fn watchlist_view(email: &str, movies: &[MovieWithDetailUrl]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ROOT).into_html();

    let table_row = |movie_with_url: &MovieWithDetailUrl| {
        let movie = &movie_with_url.movie;
        let rating = movie
            .rating
            .map(|rating| rating.to_string())
            .unwrap_or_else(|| "-".to_owned());

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    a href=(movie_with_url.detail_url) class=(LINK_STYLE)
                    {
                        (movie.title)
                    }
                }

                td class=(TABLE_CELL_STYLE) { (movie.director) }
                td class=(TABLE_CELL_STYLE) { (movie.year) }
                td class=(TABLE_CELL_STYLE) { (rating) }
            }
        )
    };

    html! {
        (nav_bar)

        div class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-2xl font-bold pb-4" { "Your watchlist" }

            p class="text-sm text-gray-500 dark:text-gray-400 pb-4"
            {
                "Signed in as " (email)
            }

            @if movies.is_empty() {
                p
                {
                    "Your watchlist is empty. "
                    a href=(endpoints::ADD_MOVIE_VIEW) class=(LINK_STYLE) { "Add a movie" }
                    " to get started."
                }
            } @else {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Title" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Director" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Year" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Rating" }
                        }
                    }

                    tbody
                    {
                        @for movie in movies {
                            (table_row(movie))
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod watchlist_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        PasswordHash, ValidatedPassword, endpoints,
        movie::{Movie, create_movie, create_movie_table},
        test_utils::{assert_valid_html, parse_test_html},
        user::{
            UserId, append_movie_to_watchlist, create_user, create_user_table,
            create_watchlist_table,
        },
    };

    use super::{WatchlistPageState, get_watchlist_page};

    fn get_test_state() -> (WatchlistPageState, UserId) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_user_table(&connection).expect("Could not create user table");
        create_watchlist_table(&connection).expect("Could not create watchlist table");
        create_movie_table(&connection).expect("Could not create movie table");

        let password_hash = PasswordHash::new(ValidatedPassword::new_unchecked("okon"), 4)
            .expect("Could not hash test password");
        let user = create_user(
            "test@test.com".parse().expect("Could not parse test email"),
            password_hash,
            &connection,
        )
        .expect("Could not create test user");

        (
            WatchlistPageState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    fn get_test_server(state: WatchlistPageState, user_id: UserId) -> TestServer {
        let app = Router::new()
            .route(endpoints::ROOT, get(get_watchlist_page))
            .layer(Extension(user_id))
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn empty_watchlist_shows_add_movie_prompt() {
        let (state, user_id) = get_test_state();
        let server = get_test_server(state, user_id);

        let response = server.get(endpoints::ROOT).await;

        response.assert_status(StatusCode::OK);
        assert!(response.text().contains("Your watchlist is empty"));
    }

    #[tokio::test]
    async fn watchlist_lists_movies_in_insertion_order() {
        let (state, user_id) = get_test_state();

        {
            let connection = state.db_connection.lock().unwrap();
            let movies: Vec<_> = [("Memento", 2000), ("Inception", 2010), ("Tenet", 2020)]
                .iter()
                .map(|(title, year)| {
                    let movie = Movie::new(title, "Nolan", *year).unwrap();
                    create_movie(&movie, &connection).unwrap();
                    movie
                })
                .collect();

            // Append in the reverse of creation order so the page order can
            // only come from the watchlist, not the movie table.
            for movie in movies.iter().rev() {
                append_movie_to_watchlist(&user_id, &movie.id, &connection).unwrap();
            }
        }

        let server = get_test_server(state, user_id);
        let response = server.get(endpoints::ROOT).await;

        response.assert_status(StatusCode::OK);

        let html = parse_test_html(&response.text());
        assert_valid_html(&html);

        let row_selector = scraper::Selector::parse("tbody tr").unwrap();
        let titles: Vec<String> = html
            .select(&row_selector)
            .map(|row| {
                row.select(&scraper::Selector::parse("a").unwrap())
                    .next()
                    .expect("row should link to the movie detail page")
                    .text()
                    .collect::<String>()
                    .trim()
                    .to_string()
            })
            .collect();

        assert_eq!(titles, vec!["Tenet", "Inception", "Memento"]);
    }

    #[tokio::test]
    async fn watchlist_links_to_movie_detail_pages() {
        let (state, user_id) = get_test_state();

        let movie = {
            let connection = state.db_connection.lock().unwrap();
            let movie = Movie::new("Inception", "Nolan", 2010).unwrap();
            create_movie(&movie, &connection).unwrap();
            append_movie_to_watchlist(&user_id, &movie.id, &connection).unwrap();
            movie
        };

        let server = get_test_server(state, user_id);
        let response = server.get(endpoints::ROOT).await;

        let want_url = endpoints::format_endpoint(endpoints::MOVIE_VIEW, movie.id.as_str());
        assert!(
            response.text().contains(&want_url),
            "watchlist should link to {want_url}"
        );
    }
}

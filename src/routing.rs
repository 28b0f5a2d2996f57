//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    extract::FromRef,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth_middleware::{AuthState, auth_guard},
    endpoints,
    internal_server_error::get_internal_server_error_page,
    log_in::{get_log_in_page, post_log_in},
    log_out::get_log_out,
    movie::{
        create_movie_endpoint, get_add_movie_page, get_edit_movie_page, get_movie_page,
        get_watchlist_page, rate_movie_endpoint, update_movie_endpoint, watch_movie_endpoint,
    },
    not_found::get_404_not_found,
    register_user::{get_register_page, post_register},
    theme::get_toggle_theme,
};

/// Return a router with all the app's routes.
///
/// The watchlist and all movie mutations sit behind the auth guard. The
/// movie detail page, log-in, registration and the theme toggle do not: the
/// detail page is deliberately public, and the theme applies to logged-out
/// pages too.
pub fn build_router(state: AppState) -> Router {
    let auth_state = AuthState::from_ref(&state);

    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(
            endpoints::LOG_IN_VIEW,
            get(get_log_in_page).post(post_log_in),
        )
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(
            endpoints::REGISTER_VIEW,
            get(get_register_page).post(post_register),
        )
        .route(endpoints::MOVIE_VIEW, get(get_movie_page))
        .route(endpoints::TOGGLE_THEME, get(get_toggle_theme))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_watchlist_page))
        .route(
            endpoints::ADD_MOVIE_VIEW,
            get(get_add_movie_page).post(create_movie_endpoint),
        )
        .route(
            endpoints::EDIT_MOVIE_VIEW,
            get(get_edit_movie_page).post(update_movie_endpoint),
        )
        .route(endpoints::RATE_MOVIE, get(rate_movie_endpoint))
        .route(endpoints::WATCH_MOVIE, get(watch_movie_endpoint))
        .layer(middleware::from_fn_with_state(auth_state, auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, Html("I'm a teapot")).into_response()
}

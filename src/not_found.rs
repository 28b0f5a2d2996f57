//! Defines the template and route handler for the 404 not found page.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::html::error_view;

/// The fallback route handler for requests that match no route.
pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

/// Build the 404 page response outside of a route handler.
pub fn get_404_not_found_response() -> Response {
    let page = error_view(
        "Not Found",
        "404",
        "Sorry, we couldn't find that page.",
        "Check the URL or head back to your watchlist.",
    );

    (StatusCode::NOT_FOUND, Html(page.into_string())).into_response()
}

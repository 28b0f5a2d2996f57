use axum::{body::Body, response::Response};
use axum_test::TestResponse;

#[track_caller]
pub(crate) fn assert_hx_redirect(response: &Response<Body>, endpoint: &str) {
    let header = response
        .headers()
        .get("hx-redirect")
        .expect("Headers missing hx-redirect")
        .to_str()
        .expect("Could not convert to str");

    assert_eq!(header, endpoint);
}

#[track_caller]
pub(crate) fn assert_hx_redirect_header(response: &TestResponse, endpoint: &str) {
    assert_eq!(response.header("hx-redirect"), endpoint);
}

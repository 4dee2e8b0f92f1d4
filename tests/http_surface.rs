//! Health, CORS and routing behaviour of the assembled application.

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use rstest::rstest;
use tower::ServiceExt;

use roster_api::infrastructure::CorsOrigins;

#[rstest]
#[tokio::test]
async fn health_reports_healthy() {
    let application = common::application(&CorsOrigins::default());

    let (status, body) = common::get(&application, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[rstest]
#[case("/roles")]
#[case("/roles/")]
#[case("/users")]
#[case("/users/")]
#[case("/tasks")]
#[case("/tasks/")]
#[tokio::test]
async fn collections_answer_with_and_without_trailing_slash(#[case] uri: &str) {
    let router = common::in_memory_router();

    let (status, body) = common::get(&router, uri).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
}

async fn preflight(origins: &CorsOrigins, origin: &str) -> axum::http::Response<Body> {
    common::application(origins)
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/users")
                .header(header::ORIGIN, origin)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

#[rstest]
#[case("http://localhost:3000")]
#[case("http://127.0.0.1:8080")]
#[tokio::test]
async fn default_origins_pass_preflight(#[case] origin: &str) {
    let response = preflight(&CorsOrigins::default(), origin).await;

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        origin
    );
}

#[rstest]
#[tokio::test]
async fn unlisted_origin_gets_no_allow_header() {
    let response = preflight(&CorsOrigins::default(), "https://evil.example.com").await;

    assert!(
        !response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
    );
}

#[rstest]
#[tokio::test]
async fn wildcard_allows_any_origin() {
    let response = preflight(&CorsOrigins::Any, "https://anywhere.example.com").await;

    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[rstest]
#[tokio::test]
async fn non_numeric_id_is_rejected_before_the_store() {
    let router = common::in_memory_router();

    let (status, _) = common::get(&router, "/users/abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

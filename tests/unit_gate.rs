mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use edutech::config::gate::DeployMode;
use edutech::middleware::auth::{AuthUser, RequireAdmin};
use edutech::middleware::gate::request_gate;
use edutech::modules::users::model::UserRole;
use edutech::state::AppState;

use common::{test_state, token_for};

/// Router with stub handlers so requests that pass the gate never reach the
/// database.
fn test_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "root" }))
        .route("/courses", get(|| async { "courses" }))
        .route("/courses/{id}", get(|| async { "course" }))
        .route("/courses/{id}/modules", get(|| async { "modules" }))
        .route("/courses/{id}/enroll", post(|| async { "enrolled" }))
        .route(
            "/enrollments",
            get(|user: AuthUser| async move { user.0.email }),
        )
        .route(
            "/users",
            get(|RequireAdmin(_admin): RequireAdmin| async { "users" }),
        )
        .route("/docs", get(|| async { "docs" }))
        .layer(middleware::from_fn_with_state(state.clone(), request_gate))
        .with_state(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get_request(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

fn authed_request(method: &str, path: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_public_get_passes_without_token() {
    let app = test_app(test_state(DeployMode::Development));

    for path in ["/", "/courses", "/courses/17", "/courses/17/modules"] {
        let response = app.clone().oneshot(get_request(path)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "path {path}");
    }
}

#[tokio::test]
async fn test_protected_route_without_token_is_401() {
    let app = test_app(test_state(DeployMode::Development));

    let response = app.oneshot(get_request("/enrollments")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Token not provided.");
}

#[tokio::test]
async fn test_enroll_post_is_protected_despite_public_course_reads() {
    let app = test_app(test_state(DeployMode::Development));

    let request = Request::builder()
        .method("POST")
        .uri("/courses/17/enroll")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_authorization_header_is_401() {
    let app = test_app(test_state(DeployMode::Development));

    let request = Request::builder()
        .uri("/enrollments")
        .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Token not provided.");
}

#[tokio::test]
async fn test_tampered_token_is_401() {
    let app = test_app(test_state(DeployMode::Development));

    let mut token = token_for(1, "student@example.com", UserRole::Student);
    token.pop();
    let response = app
        .oneshot(authed_request("GET", "/enrollments", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid or expired token.");
}

#[tokio::test]
async fn test_valid_token_reaches_handler_with_claims() {
    let app = test_app(test_state(DeployMode::Development));

    let token = token_for(42, "student@example.com", UserRole::Student);
    let response = app
        .oneshot(authed_request("GET", "/enrollments", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"student@example.com");
}

#[tokio::test]
async fn test_wrong_role_is_403_not_401() {
    let app = test_app(test_state(DeployMode::Development));

    let token = token_for(7, "student@example.com", UserRole::Student);
    let response = app
        .oneshot(authed_request("GET", "/users", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_passes_role_check() {
    let app = test_app(test_state(DeployMode::Development));

    let token = token_for(1, "admin@example.com", UserRole::Admin);
    let response = app
        .oneshot(authed_request("GET", "/users", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_trailing_slash_matches_public_path() {
    // The classifier treats /courses and /courses/ alike; axum still has to
    // route the request, so only the classifier's verdict matters here.
    let state = test_state(DeployMode::Development);
    let classifier = state.classifier.clone();

    use axum::http::Method;
    use edutech::middleware::gate::Access;
    assert_eq!(
        classifier.classify(&Method::GET, "/courses/"),
        Access::Public
    );
    assert_eq!(
        classifier.classify(&Method::GET, "/enrollments/"),
        Access::Protected
    );
}

#[tokio::test]
async fn test_docs_hidden_in_production() {
    let dev_app = test_app(test_state(DeployMode::Development));
    let prod_app = test_app(test_state(DeployMode::Production));

    let response = dev_app.oneshot(get_request("/docs")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = prod_app.oneshot(get_request("/docs")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_layers_guard_subtrees() {
    use edutech::middleware::auth::{require_admin, require_instructor};

    let state = test_state(DeployMode::Development);
    let app = Router::new()
        .nest(
            "/admin",
            Router::new()
                .route("/reports", get(|| async { "reports" }))
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    require_admin,
                )),
        )
        .nest(
            "/teaching",
            Router::new()
                .route("/dashboard", get(|| async { "dashboard" }))
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    require_instructor,
                )),
        )
        .with_state(state);

    let student = token_for(7, "student@example.com", UserRole::Student);
    let instructor = token_for(8, "instructor@example.com", UserRole::Instructor);
    let admin = token_for(9, "admin@example.com", UserRole::Admin);

    let response = app
        .clone()
        .oneshot(authed_request("GET", "/admin/reports", &student))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(authed_request("GET", "/admin/reports", &admin))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(authed_request("GET", "/teaching/dashboard", &instructor))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_request("/teaching/dashboard"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_401_with_same_message() {
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};

    let app = test_app(test_state(DeployMode::Development));

    let now = Utc::now().timestamp() as usize;
    let claims = edutech::modules::auth::model::Claims {
        sub: "1".to_string(),
        email: "student@example.com".to_string(),
        role: UserRole::Student,
        exp: now - 1,
        iat: now - 3600,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(common::test_jwt_config().secret.as_bytes()),
    )
    .unwrap();

    let response = app
        .oneshot(authed_request("GET", "/enrollments", &token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Invalid or expired token.");
}

//! Integration tests for the `/dashboard/*` endpoints.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use lcp_dashboard::config::{AuthConfig, DashConfig};
use lcp_dashboard::models::LicenseStatus;
use lcp_dashboard::server::logging::REQUEST_ID_HEADER;
use lcp_dashboard::server::{build_router, AppState, Principal};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Helper to create app state with the sample data and a bearer token for it.
fn setup_test_app() -> (AppState, Router, String) {
    let config = DashConfig {
        auth: AuthConfig {
            jwt_secret: "dashboard-test-secret".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    let state = AppState::from_config(&config).expect("failed to build state");
    let token = state
        .tokens
        .issue(&Principal::new("admin"))
        .expect("failed to issue token")
        .token;
    let app = build_router(state.clone());
    (state, app, token)
}

/// Helper to make an authenticated request to the app.
async fn authed(app: Router, method: &str, uri: &str, token: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));

    (status, body)
}

#[tokio::test]
async fn dashboard_data_has_all_aggregates() {
    let (_, app, token) = setup_test_app();

    let (status, body) = authed(app, "GET", "/dashboard/data", &token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_publications"], 32);
    assert_eq!(body["total_licenses"], 12);
    assert_eq!(body["chart_data"].as_array().unwrap().len(), 12);
    assert_eq!(body["license_statuses"].as_array().unwrap().len(), 6);
    assert!(body["licenses_last_day"].as_u64().unwrap() >= 1);
    assert!(body["oldest_license_date"].is_string());
}

#[tokio::test]
async fn overshared_licenses_exceed_the_limit() {
    let (_, app, token) = setup_test_app();

    let (status, body) = authed(app, "GET", "/dashboard/overshared", &token).await;

    assert_eq!(status, StatusCode::OK);
    let flagged = body.as_array().unwrap();
    assert!(!flagged.is_empty());
    for license in flagged {
        assert!(license["device_count"].as_u64().unwrap() > 2);
        assert_eq!(license["device_limit"], 2);
    }
}

#[tokio::test]
async fn user_licenses_for_known_and_unknown_users() {
    let (_, app, token) = setup_test_app();

    let uri = "/dashboard/user-licenses/user123";
    let (status, body) = authed(app.clone(), "GET", uri, &token).await;
    assert_eq!(status, StatusCode::OK);
    let licenses = body.as_array().unwrap();
    assert_eq!(licenses.len(), 2);
    assert_eq!(licenses[0]["id"], "license-001-user123");
    assert_eq!(licenses[0]["type"], "loan");
    assert_eq!(licenses[0]["status"], "active");
    assert_eq!(licenses[0]["provider"], "EDRLab");
    assert_eq!(licenses[0]["copy"], 5);
    assert_eq!(licenses[0]["print"], 10);
    for field in ["start", "end", "max_end", "updated_at"] {
        assert!(licenses[0][field].is_string(), "{field}");
    }

    let (status, body) = authed(app, "GET", "/dashboard/user-licenses/nobody", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn license_events_are_chronological() {
    let (_, app, token) = setup_test_app();

    let (status, body) = authed(
        app,
        "GET",
        "/dashboard/license-events/license-001-user123",
        &token,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let events = body.as_array().unwrap();
    let kinds: Vec<_> = events.iter().map(|e| e["type"].as_str().unwrap()).collect();
    assert_eq!(kinds, vec!["register", "return", "register"]);
}

#[tokio::test]
async fn publications_third_page_of_ten() {
    let (_, app, token) = setup_test_app();

    let (status, body) = authed(
        app,
        "GET",
        "/dashboard/publications?page=3&per_page=10",
        &token,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 3);
    assert_eq!(body["per_page"], 10);
    assert_eq!(body["total"], 32);
    assert_eq!(body["total_pages"], 4);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 10);
    assert_eq!(items[0]["uuid"], "pub-021");
    assert_eq!(items[9]["uuid"], "pub-030");
}

#[tokio::test]
async fn publications_bad_paging_falls_back_to_defaults() {
    let (_, app, token) = setup_test_app();

    let (status, body) = authed(
        app,
        "GET",
        "/dashboard/publications?page=-1&per_page=abc",
        &token,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["per_page"], 20);
    assert_eq!(body["items"].as_array().unwrap().len(), 20);
}

#[tokio::test]
async fn revoke_then_revoke_again() {
    let (state, app, token) = setup_test_app();

    let (status, body) = authed(
        app.clone(),
        "PUT",
        "/dashboard/revoke/license-003-johndoe",
        &token,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "License revocation was successful");
    assert_eq!(body["license_id"], "license-003-johndoe");

    let uri = "/dashboard/revoke/license-003-johndoe";
    let (status, body) = authed(app, "PUT", uri, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "License was already revoked");

    let license = state
        .store
        .license("license-003-johndoe")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(license.status, LicenseStatus::Revoked);
}

#[tokio::test]
async fn revoke_expired_license_conflicts() {
    let (state, app, token) = setup_test_app();

    let uri = "/dashboard/revoke/license-002-user123";
    let (status, body) = authed(app, "PUT", uri, &token).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "INVALID_STATE_TRANSITION");
    let license = state
        .store
        .license("license-002-user123")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(license.status, LicenseStatus::Expired);
}

#[tokio::test]
async fn revoke_unknown_license_not_found() {
    let (_, app, token) = setup_test_app();

    let (status, body) = authed(app, "PUT", "/dashboard/revoke/no-such-license", &token).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "LICENSE_NOT_FOUND");
}

#[tokio::test]
async fn delete_publication_removes_it() {
    let (_, app, token) = setup_test_app();

    let uri = "/dashboard/publications/pub-005";
    let (status, body) = authed(app.clone(), "DELETE", uri, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["uuid"], "pub-005");

    let (status, body) = authed(app.clone(), "DELETE", uri, &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "PUBLICATION_NOT_FOUND");

    let (_, body) = authed(app, "GET", "/dashboard/data", &token).await;
    assert_eq!(body["total_publications"], 31);
}

#[tokio::test]
async fn lookup_accepts_any_user_id() {
    let (_, app, token) = setup_test_app();

    let uri = "/dashboard/user-licenses/jean%20dupont";
    let (status, body) = authed(app.clone(), "GET", uri, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let uri = "/dashboard/license-events/l%C3%A9a";
    let (status, body) = authed(app, "GET", uri, &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn revoke_rejects_invalid_identifier() {
    let (_, app, token) = setup_test_app();

    let (status, body) = authed(app, "PUT", "/dashboard/revoke/a%20b", &token).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_FIELD");
}

#[tokio::test]
async fn undecodable_path_is_json_bad_request() {
    let (_, app, token) = setup_test_app();

    let request = Request::builder()
        .uri("/dashboard/user-licenses/%FF")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("application/json"));
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(body["code"], "INVALID_FIELD");
}

#[tokio::test]
async fn wrong_method_is_json_method_not_allowed() {
    let (state, app, token) = setup_test_app();

    let (status, body) = authed(app.clone(), "POST", "/dashboard/data", &token).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["code"], "METHOD_NOT_ALLOWED");

    let uri = "/dashboard/revoke/license-001-user123";
    let (status, body) = authed(app, "DELETE", uri, &token).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["code"], "METHOD_NOT_ALLOWED");
    let license = state
        .store
        .license("license-001-user123")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(license.status, LicenseStatus::Active);
}

#[tokio::test]
async fn unknown_route_is_json_not_found() {
    let (_, app, _) = setup_test_app();

    let request = Request::builder()
        .uri("/api/v1/nothing-here")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body_bytes).unwrap();
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn every_response_has_a_request_id() {
    let (_, app, token) = setup_test_app();

    let request = Request::builder()
        .uri("/dashboard/overshared")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));

    let request = Request::builder()
        .uri("/dashboard/overshared")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
}

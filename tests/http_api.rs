//! End-to-end HTTP tests
//!
//! Full router with real local storage behind it: role gates, rights
//! gates, middleware backfill and the file delivery surface.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use stitchbase::access::{ResourceType, Right};
use stitchbase::http_server::auth::issue_token;
use stitchbase::http_server::{build_router, AppState, HttpServerConfig};
use stitchbase::patterns::Pattern;
use stitchbase::storage::local::LocalBackend;

const SECRET: &str = "integration-secret";
const PDF_BYTES: &[u8] = b"%PDF-1.5\npattern sheet\n";

struct TestApp {
    _temp: TempDir,
    state: AppState,
    router: Router,
}

fn app() -> TestApp {
    let temp = TempDir::new().unwrap();
    let storage = Arc::new(LocalBackend::new(temp.path().to_path_buf()).unwrap());
    let state = AppState::with_storage(storage, SECRET);
    let router = build_router(state.clone(), &HttpServerConfig::default());
    TestApp {
        _temp: temp,
        state,
        router,
    }
}

fn bearer(user_id: Uuid) -> String {
    let token = issue_token(user_id, "user@example.com", "google", SECRET, 3600).unwrap();
    format!("Bearer {}", token)
}

async fn send(router: &Router, request: Request<Body>) -> axum::response::Response {
    router.clone().oneshot(request).await.unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

/// Seed a pattern with a stored file; optionally without its Resource row
/// to simulate data that predates the access-control tables.
async fn seed_pattern(app: &TestApp, owner: Uuid, with_resource: bool) -> (Uuid, String) {
    let meta = app
        .state
        .storage
        .upload(PDF_BYTES, "shirt.pdf", "application/pdf")
        .await
        .unwrap();
    let pattern = Pattern::new(owner, "Camp shirt", &meta.id);
    app.state.patterns.create(&pattern).unwrap();
    if with_resource {
        app.state
            .access
            .ensure_resource(ResourceType::Pattern, pattern.id, owner)
            .unwrap();
    }
    (pattern.id, meta.id)
}

#[tokio::test]
async fn unauthenticated_requests_are_rejected() {
    let app = app();

    let response = send(
        &app.router,
        Request::builder()
            .uri("/api/v1/patterns/00000000-0000-0000-0000-000000000000")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_settings_requires_admin_role() {
    let app = app();
    let plain = Uuid::new_v4();
    let admin = Uuid::new_v4();
    app.state.roles.assign_role(plain, "user").unwrap();
    app.state.roles.assign_role(admin, "admin").unwrap();

    let put = |who: Uuid| {
        Request::builder()
            .method(Method::PUT)
            .uri("/api/v1/admin/settings")
            .header(header::AUTHORIZATION, bearer(who))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"registration_open":false}"#))
            .unwrap()
    };

    let response = send(&app.router, put(plain)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app.router, put(admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["registration_open"], false);
}

#[tokio::test]
async fn pattern_read_is_backfilled_for_legacy_rows() {
    let app = app();
    let owner = Uuid::new_v4();
    let (pattern_id, _) = seed_pattern(&app, owner, false).await;

    // First request against a legacy row: the middleware resolves the
    // owner, materializes the Resource and retries without the caller
    // seeing the intermediate failure
    let response = send(
        &app.router,
        Request::builder()
            .uri(format!("/api/v1/patterns/{}", pattern_id))
            .header(header::AUTHORIZATION, bearer(owner))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_bytes(response).await;
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["owner_id"], owner.to_string());
}

#[tokio::test]
async fn backfill_grants_owner_not_the_requester() {
    let app = app();
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let (pattern_id, _) = seed_pattern(&app, owner, false).await;

    // A stranger triggers the backfill; the retry still fails because the
    // resolved owner is someone else
    let response = send(
        &app.router,
        Request::builder()
            .uri(format!("/api/v1/patterns/{}", pattern_id))
            .header(header::AUTHORIZATION, bearer(stranger))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // The backfilled resource is intact: the owner gets through
    let response = send(
        &app.router,
        Request::builder()
            .uri(format!("/api/v1/patterns/{}", pattern_id))
            .header(header::AUTHORIZATION, bearer(owner))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_pattern_is_404_for_configured_backfill() {
    let app = app();

    // Resource missing and the owner resolver finds no domain row either
    let response = send(
        &app.router,
        Request::builder()
            .uri(format!("/api/v1/patterns/{}", Uuid::new_v4()))
            .header(header::AUTHORIZATION, bearer(Uuid::new_v4()))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn file_download_headers_and_rights() {
    let app = app();
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let (pattern_id, file_id) = seed_pattern(&app, owner, true).await;

    let get_file = |who: Uuid| {
        Request::builder()
            .uri(format!("/api/v1/files/{}", file_id))
            .header(header::AUTHORIZATION, bearer(who))
            .body(Body::empty())
            .unwrap()
    };

    let response = send(&app.router, get_file(stranger)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app.router, get_file(owner)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "inline; filename=\"Camp_shirt.pdf\""
    );
    assert_eq!(
        response.headers()["cross-origin-resource-policy"],
        "cross-origin"
    );
    assert_eq!(body_bytes(response).await, PDF_BYTES);

    // Share read with the stranger over HTTP, then they can download
    let response = send(
        &app.router,
        Request::builder()
            .method(Method::POST)
            .uri(format!("/api/v1/patterns/{}/share", pattern_id))
            .header(header::AUTHORIZATION, bearer(owner))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(format!(
                r#"{{"user_id":"{}","rights":["read"]}}"#,
                stranger
            )))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(&app.router, get_file(stranger)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn head_performs_checks_but_sends_no_body() {
    let app = app();
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let (_, file_id) = seed_pattern(&app, owner, true).await;

    let head = |who: Uuid| {
        Request::builder()
            .method(Method::HEAD)
            .uri(format!("/api/v1/files/{}", file_id))
            .header(header::AUTHORIZATION, bearer(who))
            .body(Body::empty())
            .unwrap()
    };

    let response = send(&app.router, head(stranger)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app.router, head(owner)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    assert!(body_bytes(response).await.is_empty());

    let response = send(
        &app.router,
        Request::builder()
            .method(Method::HEAD)
            .uri("/api/v1/files/nosuchid")
            .header(header::AUTHORIZATION, bearer(owner))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn multipart_upload_creates_pattern_and_resource() {
    let app = app();
    let owner = Uuid::new_v4();

    let boundary = "stitchbaseboundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{b}\r\ncontent-disposition: form-data; name=\"name\"\r\n\r\nSummer dress\r\n--{b}\r\ncontent-disposition: form-data; name=\"file\"; filename=\"dress.pdf\"\r\ncontent-type: application/pdf\r\n\r\n",
            b = boundary
        )
        .as_bytes(),
    );
    body.extend_from_slice(PDF_BYTES);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    let response = send(
        &app.router,
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/patterns")
            .header(header::AUTHORIZATION, bearer(owner))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json: serde_json::Value =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(json["name"], "Summer dress");
    let pattern_id = Uuid::parse_str(json["id"].as_str().unwrap()).unwrap();
    let file_id = json["file_id"].as_str().unwrap().to_string();

    // The creation path seeded the Resource: a rights check passes with no
    // backfill involved
    app.state
        .access
        .assert_has_rights(owner, pattern_id, &[Right::Delete], true)
        .unwrap();

    // And the stored bytes round-trip
    let stored = app.state.storage.download(&file_id).await.unwrap();
    assert_eq!(stored, PDF_BYTES);
}

#[tokio::test]
async fn delete_removes_pattern_file_and_resource() {
    let app = app();
    let owner = Uuid::new_v4();
    let (pattern_id, file_id) = seed_pattern(&app, owner, true).await;

    let response = send(
        &app.router,
        Request::builder()
            .method(Method::DELETE)
            .uri(format!("/api/v1/patterns/{}", pattern_id))
            .header(header::AUTHORIZATION, bearer(owner))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    assert!(app.state.patterns.find_by_id(pattern_id).unwrap().is_none());
    assert!(app.state.storage.download(&file_id).await.is_err());

    // Download of the deleted file is now a 404
    let response = send(
        &app.router,
        Request::builder()
            .uri(format!("/api/v1/files/{}", file_id))
            .header(header::AUTHORIZATION, bearer(owner))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_strips_legacy_path_to_storage_id() {
    let app = app();
    let owner = Uuid::new_v4();

    // Legacy row referencing the stored file by a full path
    let meta = app
        .state
        .storage
        .upload(PDF_BYTES, "coat.pdf", "application/pdf")
        .await
        .unwrap();
    let pattern = Pattern::new(owner, "Vintage coat", &format!("/old/uploads/{}", meta.id));
    app.state.patterns.create(&pattern).unwrap();
    app.state
        .access
        .ensure_resource(ResourceType::Pattern, pattern.id, owner)
        .unwrap();

    let response = send(
        &app.router,
        Request::builder()
            .method(Method::DELETE)
            .uri(format!("/api/v1/patterns/{}", pattern.id))
            .header(header::AUTHORIZATION, bearer(owner))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The stored file itself is gone, not just the row
    assert!(app.state.storage.download(&meta.id).await.is_err());
}

#[tokio::test]
async fn revoked_share_loses_access() {
    let app = app();
    let owner = Uuid::new_v4();
    let viewer = Uuid::new_v4();
    let (pattern_id, file_id) = seed_pattern(&app, owner, true).await;

    app.state
        .access
        .grant_rights(
            pattern_id,
            viewer,
            std::collections::BTreeSet::from([Right::Read]),
            owner,
        )
        .unwrap();

    let response = send(
        &app.router,
        Request::builder()
            .method(Method::DELETE)
            .uri(format!("/api/v1/patterns/{}/share/{}", pattern_id, viewer))
            .header(header::AUTHORIZATION, bearer(owner))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(
        &app.router,
        Request::builder()
            .uri(format!("/api/v1/files/{}", file_id))
            .header(header::AUTHORIZATION, bearer(viewer))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

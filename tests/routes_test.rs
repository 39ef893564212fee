// Handler-level tests: permission gating, error mapping and the JSON shape
// of the page envelope.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

mod common;
use common::{seed_attribute, seed_group, seed_membership, seed_user, setup_app, setup_db, setup_empty_db};

use usersearch::auth::PermissionEvaluator;
use usersearch::errors::ApiError;
use usersearch::query::OperatorMode;
use usersearch::routes::{AppState, router};

struct DenyAll;

#[async_trait]
impl PermissionEvaluator for DenyAll {
    async fn require_view_users(&self) -> Result<(), ApiError> {
        Err(ApiError::forbidden("users view permission required"))
    }
}

fn uri(query: &str) -> String {
    format!("/admin/realms/acme/users-by-attribute{query}")
}

fn get(path: String) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn denied_caller_gets_403_before_anything_runs() {
    // No schema exists on this connection: if the handler compiled or ran
    // anything, it would fail with a 500 instead of a clean 403.
    let db = setup_empty_db().await.unwrap();
    let app = router(AppState::new(db, Arc::new(DenyAll)));

    let response = app.oneshot(get(uri(""))).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert_eq!(body["error"], "users view permission required");
}

#[tokio::test]
async fn malformed_filter_is_rejected_before_any_query() {
    // Unbalanced braces. The connection has no tables, so reaching the
    // store at all would surface as a 500 — a 400 proves the request died
    // at the parser.
    let db = setup_empty_db().await.unwrap();
    let app = setup_app(db);

    let filter = url_escape::encode_component(r#"{"key": "a", "value": "b""#).to_string();
    let response = app.oneshot(get(uri(&format!("?filter={filter}")))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn valid_requests_do_reach_the_store() {
    // Sanity check for the schemaless-connection trick used above.
    let db = setup_empty_db().await.unwrap();
    let app = setup_app(db);

    let response = app.oneshot(get(uri(""))).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = body_json(response).await;
    assert_eq!(body["error"], "A database error occurred");
}

#[tokio::test]
async fn empty_value_list_is_a_validation_failure() {
    let db = setup_empty_db().await.unwrap();
    let app = setup_app(db);

    let filter = url_escape::encode_component(r#"{"key": "department", "value": []}"#).to_string();
    let response = app.oneshot(get(uri(&format!("?filter={filter}")))).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Validation failed");
}

#[tokio::test]
async fn unknown_operator_is_rejected_in_strict_mode() {
    let db = setup_db().await.unwrap();
    let app = router(
        AppState::new(db, Arc::new(usersearch::auth::AllowAll))
            .with_operator_mode(OperatorMode::Strict),
    );

    let filter =
        url_escape::encode_component(r#"{"key": "username", "op": "fuzzy", "value": "x"}"#)
            .to_string();
    let response = app.oneshot(get(uri(&format!("?filter={filter}")))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn page_envelope_shape() {
    let db = setup_db().await.unwrap();
    let alice = seed_user(&db, "acme", "alice", 100).await;
    seed_attribute(&db, alice, "department", "Engineering").await;
    let eng = seed_group(&db, "acme", None, "engineering").await;
    seed_membership(&db, alice, eng).await;
    seed_user(&db, "acme", "bob", 200).await;
    let app = setup_app(db);

    let filter = url_escape::encode_component(
        r#"{"key": "department", "op": "contains", "value": "ENG"}"#,
    )
    .to_string();
    let response = app
        .oneshot(get(uri(&format!("?filter={filter}&sort=username&limit=5"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["limit"], 5);
    assert_eq!(body["offset"], 0);

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    let alice_json = &results[0];
    assert_eq!(alice_json["username"], "alice");
    assert_eq!(alice_json["createdTimestamp"], 100);
    assert_eq!(alice_json["attributes"]["department"], serde_json::json!(["Engineering"]));
    assert_eq!(alice_json["groups"], serde_json::json!(["/engineering"]));
    // Unset optionals are omitted entirely, not serialized as null.
    assert!(alice_json.get("email").is_none());
    assert!(alice_json.get("firstName").is_none());
}

#[tokio::test]
async fn limit_echoes_the_clamped_value() {
    let db = setup_db().await.unwrap();
    seed_user(&db, "acme", "alice", 100).await;
    let app = setup_app(db);

    let response = app.oneshot(get(uri("?limit=5000&offset=3"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["limit"], 1000);
    assert_eq!(body["offset"], 3);
}

//! User CRUD and health routes through the full router.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use common::{body_json, get, json_request, test_app};
use trego_gateway::GatewayConfig;

#[tokio::test]
async fn create_fetch_update_list() {
    let (app, _state, _shutdown) = test_app(GatewayConfig::default()).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/user",
            json!({"name": "Jordan", "email": "jordan@trego.app"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let user_id = created["user_id"].as_str().unwrap().to_string();
    assert_eq!(created["reputation"], 0);

    let response = app
        .clone()
        .oneshot(get("/api/v1/user/email/jordan@trego.app"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["user_id"], user_id.as_str());

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/user/{}", user_id),
            json!({"location": "Riverside Courts"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["location"], "Riverside Courts");
    assert_eq!(updated["name"], "Jordan");

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/user/{}", user_id)))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["location"], "Riverside Courts");

    let response = app.oneshot(get("/api/v1/users?limit=5")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_json(response).await;
    assert_eq!(page["limit"], 5);
    assert_eq!(page["offset"], 0);
    assert_eq!(page["users"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_payloads_are_bad_requests() {
    let (app, _state, _shutdown) = test_app(GatewayConfig::default()).await;

    let cases = [
        ("POST", "/api/v1/user", json!({"name": "", "email": "x@y.com"}), "name is required"),
        ("POST", "/api/v1/user", json!({"name": "X", "email": "nope"}), "invalid email format"),
        ("PUT", "/api/v1/user/abc", json!({}), "at least one field must be provided for update"),
    ];
    for (method, uri, body, message) in cases {
        let response = app.clone().oneshot(json_request(method, uri, body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], message);
    }

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/user", json!({"email": "x@y.com"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"]
        .as_str()
        .unwrap()
        .starts_with("invalid request body"));

    let response = app.oneshot(get("/api/v1/user/email/not-an-email")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let (app, _state, _shutdown) = test_app(GatewayConfig::default()).await;
    let body = json!({"name": "Sam", "email": "sam@trego.app"});

    let first = app
        .clone()
        .oneshot(json_request("POST", "/api/v1/user", body.clone()))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .oneshot(json_request("POST", "/api/v1/user", body))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_users_are_not_found() {
    let (app, _state, _shutdown) = test_app(GatewayConfig::default()).await;

    for uri in ["/api/v1/user/missing", "/api/v1/user/email/ghost@trego.app"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body_json(response).await, json!({"error": "user not found"}));
    }

    let response = app
        .oneshot(json_request("PUT", "/api/v1/user/missing", json!({"name": "Z"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_endpoints() {
    let (app, _state, _shutdown) = test_app(GatewayConfig::default()).await;

    let response = app.clone().oneshot(get("/healthCheck")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());

    let response = app.oneshot(get("/dbHealthCheck")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["database"], "ok");
}

struct DownStore;

#[async_trait::async_trait]
impl trego_gateway::store::StoreHealth for DownStore {
    async fn ping(&self) -> trego_gateway::store::StoreResult<()> {
        Err(trego_gateway::store::StoreError::Unavailable(
            "connection refused by 10.1.2.3:5432".into(),
        ))
    }
}

#[tokio::test]
async fn unreachable_store_is_503_without_detail() {
    let (_, mut state, _shutdown) = test_app(GatewayConfig::default()).await;
    state.store_health = std::sync::Arc::new(DownStore);
    let app = trego_gateway::build_router(state);

    let response = app.oneshot(get("/dbHealthCheck")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["database"], "error");
    assert!(body["error"].is_string());
    assert!(!body.to_string().contains("10.1.2.3"));
}

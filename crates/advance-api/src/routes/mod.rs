//! API routes

mod auth;
mod health;
pub mod metrics;
mod roles;
pub mod types;
mod users;

use advance_auth::auth_middleware;
use axum::{Router, middleware};
use std::sync::Arc;

use crate::state::{AppState, MetricsHandle};

/// Create the main router
///
/// `/api/v1/login` is public; every other `/api/v1` route sits behind the
/// bearer-token middleware.
pub fn create_router(state: AppState, metrics_handle: Option<Arc<MetricsHandle>>) -> Router {
    let protected = Router::new()
        .merge(users::routes())
        .merge(roles::routes())
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            auth_middleware,
        ));

    let api = Router::new().merge(auth::routes()).merge(protected);

    let mut router = Router::new()
        .merge(health::routes())
        .nest("/api/v1", api)
        .with_state(state);

    if let Some(handle) = metrics_handle {
        router = router.merge(metrics::routes(handle));
    }

    router
}

#[cfg(test)]
mod tests {
    use super::*;
    use advance_auth::TokenManager;
    use advance_core::Registration;
    use advance_db::Database;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn test_state() -> AppState {
        let db = Database::in_memory().await.unwrap();
        let users = db.ensure_module("Users").await.unwrap();
        db.ensure_permission(users, "USER_VIEW", "View users").await.unwrap();
        db.ensure_permission(users, "USER_CREATE", "Create users").await.unwrap();
        db.ensure_module("Reports").await.unwrap();

        let tokens = Arc::new(TokenManager::new("router-test-secret", 3600).unwrap());
        let state = AppState::new(db, tokens).unwrap();

        state
            .accounts
            .register(
                Registration {
                    name: Some("Admin".to_string()),
                    email: Some("admin@example.com".to_string()),
                    mobile_no: Some("555".to_string()),
                    username: Some("admin".to_string()),
                    password: Some("admin-pass".to_string()),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();

        state
    }

    async fn send(
        router: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn login(router: &Router, username: &str, password: &str) -> String {
        let (status, body) = send(
            router,
            "POST",
            "/api/v1/login",
            None,
            Some(json!({"username": username, "password": password})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["data"]["access_token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let router = create_router(test_state().await, None);
        let (status, body) = send(&router, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["database"], "up");
    }

    #[tokio::test]
    async fn test_metrics_exposition() {
        let handle = metrics_exporter_prometheus::PrometheusBuilder::new()
            .build_recorder()
            .handle();
        let router = create_router(test_state().await, Some(Arc::new(handle)));

        let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/plain"));
    }

    #[tokio::test]
    async fn test_protected_routes_reject_missing_token() {
        let router = create_router(test_state().await, None);

        for uri in ["/api/v1/advance/users", "/api/v1/advance/roles", "/api/v1/me"] {
            let (status, body) = send(&router, "GET", uri, None, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
            assert_eq!(body["code"], "NO_TOKEN");
        }

        let (status, body) = send(&router, "GET", "/api/v1/me", Some("not-a-jwt"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_login_response_shape() {
        let router = create_router(test_state().await, None);

        let (status, body) = send(
            &router,
            "POST",
            "/api/v1/login",
            None,
            Some(json!({"username": "admin", "password": "admin-pass"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], "USER_LOGGED_IN");
        let data = &body["data"];
        assert_eq!(data["user_name"], "admin");
        assert_eq!(data["user_type"], "advance");
        assert_eq!(data["email"], "admin@example.com");
        assert_eq!(data["mobile_no"], "555");
        assert_eq!(data["expires_in"], 3600);
        assert!(data["access_token"].as_str().is_some());
        assert!(data.get("password").is_none());
    }

    #[tokio::test]
    async fn test_login_failures() {
        let router = create_router(test_state().await, None);

        let (status, wrong) = send(
            &router,
            "POST",
            "/api/v1/login",
            None,
            Some(json!({"username": "admin", "password": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (_, unknown) = send(
            &router,
            "POST",
            "/api/v1/login",
            None,
            Some(json!({"username": "ghost", "password": "nope"})),
        )
        .await;
        assert_eq!(wrong, unknown);
        assert_eq!(wrong["code"], "INVALID_CREDENTIALS");

        let (status, body) = send(
            &router,
            "POST",
            "/api/v1/login",
            None,
            Some(json!({"username": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_malformed_json_is_invalid_input() {
        let router = create_router(test_state().await, None);

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_register_duplicate_and_list() {
        let router = create_router(test_state().await, None);
        let token = login(&router, "admin", "admin-pass").await;

        let payload = json!({
            "name": "Jane",
            "email": "jane@example.com",
            "mobile_no": "123",
            "username": "jane",
            "password": "jane-pass",
            "is_auto_property_assign": "1"
        });
        let (status, body) = send(
            &router,
            "POST",
            "/api/v1/advance/users",
            Some(&token),
            Some(payload.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["code"], "USER_CREATED");
        assert_eq!(body["data"]["is_auto_property_assign"], true);
        assert!(body["data"]["created_by"].as_i64().is_some());
        assert!(body["data"].get("password_hash").is_none());

        let mut duplicate = payload;
        duplicate["email"] = json!("other@example.com");
        let (status, body) = send(
            &router,
            "POST",
            "/api/v1/advance/users",
            Some(&token),
            Some(duplicate),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "UQ_USERNAME");

        let (status, body) = send(&router, "GET", "/api/v1/advance/users", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["count"], 2);

        // New user can log in with the registered credentials
        login(&router, "jane", "jane-pass").await;
    }

    #[tokio::test]
    async fn test_roles_flow() {
        let router = create_router(test_state().await, None);
        let token = login(&router, "admin", "admin-pass").await;

        let (status, body) = send(
            &router,
            "GET",
            "/api/v1/advance/roles/permissions",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let modules = body["data"]["permissions_by_module"].as_array().unwrap();
        assert_eq!(modules.len(), 2);
        assert_eq!(modules[0]["module"], "Users");
        assert_eq!(modules[0]["permissions"].as_array().unwrap().len(), 2);
        assert_eq!(modules[1]["module"], "Reports");
        assert!(modules[1]["permissions"].as_array().unwrap().is_empty());

        let role = json!({"name": "Viewer", "permissions": {"USER_VIEW": true}});
        let (status, body) = send(
            &router,
            "POST",
            "/api/v1/advance/roles",
            Some(&token),
            Some(role.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["code"], "ROLES_CREATED");
        let role_id = body["data"]["id"].as_i64().unwrap();

        let (status, body) =
            send(&router, "POST", "/api/v1/advance/roles", Some(&token), Some(role)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "UQ_ROLE_NAME");

        let (_, body) = send(&router, "GET", "/api/v1/advance/roles/dropdown", Some(&token), None).await;
        assert_eq!(body["data"], json!([{"id": role_id, "name": "Viewer"}]));

        let (_, body) = send(&router, "GET", "/api/v1/advance/roles", Some(&token), None).await;
        assert_eq!(body["data"]["count"], 1);

        let uri = format!("/api/v1/advance/roles/{}", role_id);
        let (status, body) = send(&router, "GET", &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], "ROLE_FETCHED");

        let (status, body) =
            send(&router, "GET", "/api/v1/advance/roles/999", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_patch_user_and_profile() {
        let router = create_router(test_state().await, None);
        let token = login(&router, "admin", "admin-pass").await;

        let (status, body) = send(
            &router,
            "POST",
            "/api/v1/advance/users",
            Some(&token),
            Some(json!({
                "name": "Jane",
                "email": "jane@example.com",
                "username": "jane",
                "password": "jane-pass"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let jane = body["data"]["id"].as_i64().unwrap();

        let uri = format!("/api/v1/advance/users/{}", jane);
        let (status, body) = send(
            &router,
            "PATCH",
            &uri,
            Some(&token),
            Some(json!({"username": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "UQ_USERNAME");

        let (status, body) = send(
            &router,
            "PATCH",
            &uri,
            Some(&token),
            Some(json!({"mobile_no": "999"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], "USER_UPDATED");
        assert_eq!(body["data"]["mobile_no"], "999");

        let (status, body) = send(
            &router,
            "PATCH",
            "/api/v1/advance/users/abc",
            Some(&token),
            Some(json!({"mobile_no": "1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INPUT");

        let (status, body) = send(&router, "GET", "/api/v1/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["code"], "PROFILE_FETCHED");
        assert_eq!(body["data"]["username"], "admin");
    }
}

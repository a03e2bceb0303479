use std::net::SocketAddr;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, recipes};

/// Recipe images travel inline as data URIs, so bodies may be large.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(recipes::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "4000".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        extract::FromRef,
        http::{header, HeaderMap, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, value)
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let (status, _, value) = send(app, method, uri, token, body).await;
        (status, value)
    }

    async fn register(app: &Router, name: &str, email: &str) -> (String, Value) {
        let (status, body) = call(
            app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": name, "email": email, "password": "segredo" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        (body["token"].as_str().unwrap().to_string(), body["user"].clone())
    }

    #[tokio::test]
    async fn health() {
        let app = build_app(AppState::fake().await);
        let res = app
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn auth_flow_over_http() {
        let app = build_app(AppState::fake().await);
        let (token, user) = register(&app, "Ana", "ana@example.com").await;
        assert!(user.get("password_hash").is_none());

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Ana", "email": "ana@example.com", "password": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ana@example.com", "password": "segredo" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"], user);

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ana@example.com", "password": "errado" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ana@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, me) = call(&app, Method::GET, "/api/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me, user);

        let (status, _) = call(&app, Method::GET, "/api/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn malformed_json_is_a_validation_error() {
        let app = build_app(AppState::fake().await);
        let req = Request::post("/api/auth/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn recipe_crud_over_http() {
        let app = build_app(AppState::fake().await);
        let (ana, ana_user) = register(&app, "Ana", "ana@example.com").await;
        let (bia, _) = register(&app, "Bia", "bia@example.com").await;

        let recipe = json!({
            "title": "Bolo",
            "ingredients": ["a", "b"],
            "preparation": ["step1"],
            "tags": "doce"
        });

        let (status, _) = call(&app, Method::POST, "/api/recipes", None, Some(recipe.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, headers, created) =
            send(&app, Method::POST, "/api/recipes", Some(&ana), Some(recipe.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["ownerId"], ana_user["id"]);
        let id = created["id"].as_str().unwrap().to_string();
        let path = format!("/api/recipes/{}", id);
        assert_eq!(headers[header::LOCATION], path.as_str());

        let (status, list) = call(&app, Method::GET, "/api/recipes", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let entry = &list.as_array().unwrap()[0];
        assert_eq!(entry["id"], created["id"]);
        assert_eq!(entry["title"], "Bolo");
        assert!(entry.get("ownerId").is_some());
        assert!(entry.get("createdAt").is_some());
        assert!(entry.get("ingredients").is_none());
        assert!(entry.get("preparation").is_none());

        let (status, detail) = call(&app, Method::GET, &path, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["ingredients"], json!(["a", "b"]));
        assert_eq!(detail["preparation"], json!(["step1"]));

        let edit = json!({ "title": "Bolo de fubá", "ingredients": ["fubá"], "preparation": [] });
        let (status, _) = call(&app, Method::PUT, &path, None, Some(edit.clone())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = call(&app, Method::PUT, &path, Some(&bia), Some(edit.clone())).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, body) = call(&app, Method::PUT, &path, Some(&ana), Some(edit)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        let (status, _) = call(&app, Method::DELETE, &path, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = call(&app, Method::DELETE, &path, Some(&bia), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, body) = call(&app, Method::DELETE, &path, Some(&ana), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));

        let (status, _) = call(&app, Method::GET, &path, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, Method::GET, "/api/recipes/not-a-uuid", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn token_for_missing_user_cannot_create() {
        let state = AppState::fake().await;
        let keys = crate::auth::jwt::JwtKeys::from_ref(&state);
        let token = keys
            .sign(&crate::auth::Principal {
                id: uuid::Uuid::new_v4(),
                name: "Ghost".into(),
                email: "ghost@example.com".into(),
            })
            .unwrap();
        let app = build_app(state);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/recipes",
            Some(&token),
            Some(json!({ "title": "t" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());
    }
}

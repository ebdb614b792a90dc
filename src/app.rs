use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::state::AppState;
use crate::users;

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(users::router(&state))
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
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

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt; // for oneshot()

    fn app_with(auth_required: bool) -> Router {
        let mut config = AppConfig::for_tests();
        config.auth_required = auth_required;
        build_app(AppState::fake(config))
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn registration(national_id: &str, reg_number: &str, email: &str) -> Value {
        json!({
            "name": "João Lima",
            "nationalId": national_id,
            "title": "attendant",
            "regNumber": reg_number,
            "department": "registry",
            "email": email,
            "phone": "+55 68 3333-0000",
            "sex": "M",
            "dateOfBirth": "1985-07-20",
            "password": "abcdefgh"
        })
    }

    async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
        call(
            app,
            Method::POST,
            "/api/v1/login",
            Some(json!({ "email": email, "password": password })),
            None,
        )
        .await
    }

    #[tokio::test]
    async fn register_approve_and_list_end_to_end() {
        let app = app_with(true);

        let (status, user) = call(
            &app,
            Method::POST,
            "/api/v1/usuarios/registrar",
            Some(registration("123", "R-9", "joao@example.com")),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user["status"], "PENDING");
        assert_eq!(user["dateOfBirth"], "1985-07-20");
        assert!(user.get("password").is_none());
        assert!(user.get("passwordHash").is_none());
        let id = user["id"].as_str().unwrap().to_string();

        let (status, body) = login(&app, "joao@example.com", "abcdefgh").await;
        assert_eq!(status, StatusCode::OK);
        let token = body["token"].as_str().unwrap().to_string();
        assert!(!token.is_empty());

        let (status, pending) =
            call(&app, Method::GET, "/api/v1/usuarios/pendentes", None, Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pending.as_array().unwrap().len(), 1);

        let uri = format!("/api/v1/usuarios/{id}/aprovar");
        let (status, approved) = call(&app, Method::PUT, &uri, None, Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(approved["status"], "APPROVED");
        assert_eq!(approved["id"], id.as_str());

        let (status, pending) =
            call(&app, Method::GET, "/api/v1/usuarios/pendentes", None, Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(pending
            .as_array()
            .unwrap()
            .iter()
            .all(|u| u["id"] != id.as_str()));

        let (status, body) = call(&app, Method::PUT, &uri, None, Some(&token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "user status is not pending");
    }

    #[tokio::test]
    async fn open_routes_when_auth_disabled() {
        let app = app_with(false);

        let (_, user) = call(
            &app,
            Method::POST,
            "/api/v1/usuarios/registrar",
            Some(registration("1", "R-1", "a@example.com")),
            None,
        )
        .await;
        let uri = format!("/api/v1/usuarios/{}/aprovar", user["id"].as_str().unwrap());

        let (status, approved) = call(&app, Method::PUT, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(approved["status"], "APPROVED");

        let (status, pending) =
            call(&app, Method::GET, "/api/v1/usuarios/pendentes", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pending, json!([]));
    }

    #[tokio::test]
    async fn guarded_routes_require_valid_token() {
        let app = app_with(true);

        let (status, body) =
            call(&app, Method::GET, "/api/v1/usuarios/pendentes", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "missing Authorization header");

        let (status, _) = call(
            &app,
            Method::GET,
            "/api/v1/usuarios/pendentes",
            None,
            Some("not.a.jwt"),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let uri = format!("/api/v1/usuarios/{}/aprovar", uuid::Uuid::new_v4());
        let (status, _) = call(&app, Method::PUT, &uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn approve_unknown_or_malformed_id_is_404() {
        let app = app_with(false);

        let uri = format!("/api/v1/usuarios/{}/aprovar", uuid::Uuid::new_v4());
        let (status, body) = call(&app, Method::PUT, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "user not found");

        let (status, _) = call(&app, Method::PUT, "/api/v1/usuarios/xyz/aprovar", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn register_rejects_bad_input() {
        let app = app_with(true);

        let mut bad_date = registration("1", "R-1", "a@example.com");
        bad_date["dateOfBirth"] = json!("20/07/1985");
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/usuarios/registrar",
            Some(bad_date),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid date of birth format, use YYYY-MM-DD");

        for raw in ["+1985-07-20", " 1985-07-20 ", "0000-07-20", "1985-7-20"] {
            let mut loose_date = registration("1", "R-1", "a@example.com");
            loose_date["dateOfBirth"] = json!(raw);
            let (status, body) = call(
                &app,
                Method::POST,
                "/api/v1/usuarios/registrar",
                Some(loose_date),
                None,
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{raw:?}");
            assert_eq!(body["error"], "invalid date of birth format, use YYYY-MM-DD");
        }

        let mut short = registration("1", "R-1", "a@example.com");
        short["password"] = json!("abc");
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/usuarios/registrar",
            Some(short),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "password must be at least 8 characters");

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/usuarios/registrar",
            Some(json!({ "name": "only a name" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_national_id_is_500() {
        let app = app_with(true);
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/usuarios/registrar",
            Some(registration("1", "R-1", "a@example.com")),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/usuarios/registrar",
            Some(registration("1", "R-2", "b@example.com")),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "persistence failure");
    }

    #[tokio::test]
    async fn login_failures() {
        let app = app_with(true);
        call(
            &app,
            Method::POST,
            "/api/v1/usuarios/registrar",
            Some(registration("1", "R-1", "a@example.com")),
            None,
        )
        .await;

        let (status, wrong) = login(&app, "a@example.com", "wrong-password").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, unknown) = login(&app, "ghost@example.com", "abcdefgh").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong, unknown);

        let (status, _) = login(&app, "not-an-email", "abcdefgh").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/login",
            Some(json!({ "email": "a@example.com" })),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health() {
        let app = app_with(true);
        let req = Request::builder()
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}

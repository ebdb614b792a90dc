use async_trait::async_trait;
use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use crate::{state::AppState, users::error::ServiceError};

/// Identity taken from a valid `Authorization: Bearer` token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: String,
}

type AuthRejection = (StatusCode, Json<Value>);

fn unauthorized(msg: &str) -> AuthRejection {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": msg })))
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| unauthorized("missing Authorization header"))?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| unauthorized("invalid auth scheme"))?;

        let subject = state.tokens.validate(token.trim()).map_err(|e| {
            warn!(error = %e, "rejected bearer token");
            unauthorized("invalid or expired token")
        })?;

        Ok(AuthUser {
            id: subject.user_id,
            role: subject.role,
        })
    }
}

/// Route guard: rejects requests without a valid token and hands the
/// caller's identity to the handler as a request extension.
pub async fn require_auth(auth: AuthUser, mut req: Request, next: Next) -> Response {
    req.extensions_mut().insert(auth);
    next.run(req).await
}

/// `Json` whose rejections are reported as validation errors (HTTP 400).
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => {
                warn!(error = %rejection.body_text(), "malformed request body");
                Err(ServiceError::validation(rejection.body_text()))
            }
        }
    }
}

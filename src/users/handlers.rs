use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Extension, Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::{require_auth, AuthUser, JsonBody},
    state::AppState,
    users::{
        domain::{parse_iso_date, User},
        dto::{LoginRequest, RegisterRequest, TokenResponse},
        error::ServiceError,
        services::is_valid_email,
    },
};

pub fn user_routes(state: &AppState) -> Router<AppState> {
    let guarded = Router::new()
        .route("/usuarios/:id/aprovar", put(approve_user))
        .route("/usuarios/pendentes", get(list_pending));

    let guarded = if state.config.auth_required {
        guarded.route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
    } else {
        warn!("AUTH_REQUIRED=false: approval and listing routes are unauthenticated");
        guarded
    };

    Router::new()
        .route("/login", post(login))
        .route("/usuarios/registrar", post(register))
        .merge(guarded)
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), ServiceError> {
    let date_of_birth = parse_iso_date(&payload.date_of_birth).map_err(|e| {
        warn!(error = %e, "invalid date of birth");
        ServiceError::validation("invalid date of birth format, use YYYY-MM-DD")
    })?;

    let user = state
        .users
        .register(payload.into_registration(date_of_birth))
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> Result<Json<TokenResponse>, ServiceError> {
    let email = payload.email.trim();
    if !is_valid_email(email) {
        warn!(email = %email, "invalid email");
        return Err(ServiceError::validation("invalid email"));
    }
    if payload.password.is_empty() {
        return Err(ServiceError::validation("password is required"));
    }

    let token = state.users.login(email, &payload.password).await?;
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state, caller))]
pub async fn approve_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    caller: Option<Extension<AuthUser>>,
) -> Result<Json<User>, ServiceError> {
    // a malformed id cannot name an existing user
    let user_id = Uuid::parse_str(&id).map_err(|_| ServiceError::NotFound)?;

    let user = state.users.approve(user_id).await?;
    if let Some(Extension(caller)) = caller {
        info!(%user_id, approved_by = %caller.id, role = %caller.role, "approval recorded");
    }
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn list_pending(State(state): State<AppState>) -> Result<Json<Vec<User>>, ServiceError> {
    let users = state.users.list_pending().await?;
    Ok(Json(users))
}

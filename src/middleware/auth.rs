use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::models::user::Role;
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub role: Option<String>,
}

/// Verified identity of the caller, inserted into request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

fn reject(status: StatusCode, error: &str) -> Response {
    (status, Json(json!({ "error": error }))).into_response()
}

fn authenticate(req: &Request, jwt_secret: &str) -> Result<AuthUser, Response> {
    let Some(auth_header) = req.headers().get(axum::http::header::AUTHORIZATION) else {
        return Err(reject(StatusCode::UNAUTHORIZED, "missing_authorization"));
    };
    let Ok(auth_str) = auth_header.to_str() else {
        return Err(reject(StatusCode::UNAUTHORIZED, "bad_authorization"));
    };
    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(reject(StatusCode::UNAUTHORIZED, "unsupported_scheme"));
    };

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|_| reject(StatusCode::UNAUTHORIZED, "invalid_token"))?
    .claims;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| reject(StatusCode::UNAUTHORIZED, "invalid_subject"))?;
    let role = claims
        .role
        .as_deref()
        .unwrap_or_default()
        .parse::<Role>()
        .map_err(|_| reject(StatusCode::FORBIDDEN, "forbidden"))?;

    Ok(AuthUser { user_id, role })
}

async fn require_roles(
    jwt_secret: &str,
    mut req: Request,
    next: Next,
    allowed: &[Role],
) -> Response {
    let user = match authenticate(&req, jwt_secret) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    if !allowed.contains(&user.role) {
        tracing::warn!(user_id = %user.user_id, role = user.role.as_str(), "Role not permitted");
        return reject(StatusCode::FORBIDDEN, "forbidden");
    }
    req.extensions_mut().insert(user);
    next.run(req).await
}

/// Candidate routes also admit administrators.
pub async fn require_candidate(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_roles(&state.config.jwt_secret, req, next, &[Role::Candidate, Role::Admin]).await
}

pub async fn require_admin(State(state): State<AppState>, req: Request, next: Next) -> Response {
    require_roles(&state.config.jwt_secret, req, next, &[Role::Admin]).await
}

use axum::{http::HeaderMap, http::StatusCode, Json};
use serde_json::{json, Value};

use super::AppState;
use crate::models::auth::AuthContext;

type AuthFailure = (StatusCode, Json<Value>);

fn unauthorized(detail: &str) -> AuthFailure {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"description": detail})),
    )
}

fn forbidden() -> AuthFailure {
    (
        StatusCode::FORBIDDEN,
        Json(json!({"description": "Insufficient privileges."})),
    )
}

/// The auth collaborator is authorization ground truth; this only relays
/// its verdict.
pub async fn require_auth(state: &AppState, headers: &HeaderMap) -> Result<AuthContext, AuthFailure> {
    let bearer = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| unauthorized("Missing bearer credential."))?;

    let context = state
        .auth
        .authenticate(bearer)
        .await
        .map_err(|e| unauthorized(&format!("Authentication failed: {}", e)))?;

    if !context.is_active {
        return Err(unauthorized("Account is not active."));
    }

    Ok(context)
}

pub async fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<AuthContext, AuthFailure> {
    let context = require_auth(state, headers).await?;

    if !context.is_admin {
        return Err(forbidden());
    }

    Ok(context)
}

pub async fn require_staff(state: &AppState, headers: &HeaderMap) -> Result<AuthContext, AuthFailure> {
    let context = require_auth(state, headers).await?;

    if !context.can_manage_ledger() {
        return Err(forbidden());
    }

    Ok(context)
}

/// Self-or-admin guard for user-scoped reads.
pub fn require_self_or_admin(context: &AuthContext, user_id: &str) -> Result<(), AuthFailure> {
    if context.is_admin || context.is_staff || context.user_id == user_id {
        Ok(())
    } else {
        Err(forbidden())
    }
}

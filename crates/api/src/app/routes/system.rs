use axum::{Extension, Json, http::StatusCode};
use serde_json::{Value, json};

use innkeep_auth::IdentityContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// GET /auth/me - The caller as resolved by the token middleware.
pub async fn me(Extension(identity): Extension<IdentityContext>) -> Json<Value> {
    Json(json!({
        "user": identity,
        "permissions": identity.permissions(),
    }))
}

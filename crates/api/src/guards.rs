//! Route-level authorization guards.
//!
//! Guards run after [`verify_access_token`](crate::middleware::verify_access_token)
//! and read the identity it attached. A rejected request never reaches the
//! handler.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use innkeep_auth::{GuardChain, IdentityContext};

use crate::app::errors::ApiError;

pub async fn enforce(State(chain): State<Arc<GuardChain>>, req: Request, next: Next) -> Response {
    let identity = req.extensions().get::<IdentityContext>();

    if let Err(err) = chain.check(identity) {
        tracing::warn!(
            code = err.code(),
            user_id = ?identity.map(|i| i.user_id),
            user = %identity.map(IdentityContext::display_name).unwrap_or_default(),
            path = %req.uri().path(),
            "request rejected by guard"
        );
        return ApiError::from(err).into_response();
    }

    next.run(req).await
}

/// Protect every route registered on `router` so far with `guard`.
pub fn guarded(router: Router, guard: impl Into<GuardChain>) -> Router {
    router.route_layer(axum::middleware::from_fn_with_state(Arc::new(guard.into()), enforce))
}

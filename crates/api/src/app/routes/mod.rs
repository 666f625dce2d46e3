use axum::{Router, routing::get};

pub mod roles;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/auth/me", get(system::me))
        .nest("/roles", roles::router())
}

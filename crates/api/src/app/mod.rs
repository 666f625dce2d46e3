//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and service construction
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs and input parsing
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::config::Settings;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router from settings (public entrypoint used by `main.rs`).
pub async fn build_app(settings: &Settings) -> anyhow::Result<Router> {
    let services = services::build_services(settings).await?;
    Ok(build_app_with(Arc::new(services)))
}

/// Build the router around already constructed services.
pub fn build_app_with(services: Arc<AppServices>) -> Router {
    // Protected routes: token verification first, then per-route guards.
    let protected = routes::router()
        .layer(Extension(services.clone()))
        .layer(axum::middleware::from_fn_with_state(
            services,
            middleware::verify_access_token,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::log_request)))
}

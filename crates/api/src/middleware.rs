//! Bearer-token authentication.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};

use innkeep_auth::AuthError;
use innkeep_infra::resolve_identity;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;

/// Verify the access token, resolve the caller and attach its
/// [`IdentityContext`](innkeep_auth::IdentityContext) to the request.
pub async fn verify_access_token(
    State(services): State<Arc<AppServices>>,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = match authenticate(&services, req.headers()).await {
        Ok(identity) => identity,
        Err(err) => {
            tracing::debug!(code = err.code(), "request rejected by authentication");
            return ApiError::from(err).into_response();
        }
    };

    req.extensions_mut().insert(identity);
    next.run(req).await
}

async fn authenticate(
    services: &AppServices,
    headers: &HeaderMap,
) -> Result<innkeep_auth::IdentityContext, AuthError> {
    let token = extract_bearer(headers).ok_or(AuthError::InvalidToken)?;
    let claims = services.codec.verify(token, services.clock.now())?;
    resolve_identity(services.users.as_ref(), &claims).await
}

/// One structured log line per request.
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = std::time::Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request completed"
    );
    response
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &'static str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(axum::http::header::AUTHORIZATION, HeaderValue::from_static(value));
        h
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(extract_bearer(&headers("Bearer   ")), None);
        assert_eq!(extract_bearer(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(extract_bearer(&HeaderMap::new()), None);
    }
}

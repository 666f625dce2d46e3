//! Request-scoped context extracted at the HTTP edge.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::HeaderMap;
use axum::http::request::Parts;

/// Client address recorded in the audit trail.
///
/// First entry of `X-Forwarded-For` when present, otherwise the peer socket
/// address (only available when the server was started with connect info).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientOrigin(pub Option<String>);

impl ClientOrigin {
    pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        Self(forwarded.or_else(|| peer.map(|addr| addr.ip().to_string())))
    }

    pub fn into_inner(self) -> Option<String> {
        self.0
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for ClientOrigin
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(Self::resolve(&parts.headers, peer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_for_takes_the_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(" 203.0.113.9 , 10.0.0.1"));
        let peer = Some(SocketAddr::from(([127, 0, 0, 1], 5000)));
        assert_eq!(ClientOrigin::resolve(&headers, peer).0.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn falls_back_to_peer_address() {
        let peer = Some(SocketAddr::from(([192, 168, 1, 20], 443)));
        assert_eq!(ClientOrigin::resolve(&HeaderMap::new(), peer).0.as_deref(), Some("192.168.1.20"));
        assert_eq!(ClientOrigin::resolve(&HeaderMap::new(), None), ClientOrigin(None));
    }
}

//! Per-client rate limiting using a token bucket.

use std::net::IpAddr;
use std::sync::Arc;

use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{
    GovernorError, GovernorLayer,
    governor::GovernorConfigBuilder,
    key_extractor::{KeyExtractor, PeerIpKeyExtractor, SmartIpKeyExtractor},
};

pub type RateLimitLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Picks the client address the limiter keys on.
///
/// `Peer` uses the socket address and needs `ConnectInfo<SocketAddr>`.
/// `Proxied` trusts `X-Forwarded-For` / `X-Real-IP` / `Forwarded` and falls
/// back to the peer address; use it only behind a trusted reverse proxy.
#[derive(Debug, Clone, Copy)]
pub enum ClientIpKeyExtractor {
    Peer,
    Proxied,
}

impl ClientIpKeyExtractor {
    pub fn new(behind_proxy: bool) -> Self {
        if behind_proxy { Self::Proxied } else { Self::Peer }
    }
}

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        match self {
            Self::Peer => PeerIpKeyExtractor.extract(req),
            Self::Proxied => SmartIpKeyExtractor.extract(req),
        }
    }
}

fn build(per_second: u64, burst_size: u32, behind_proxy: bool) -> RateLimitLayer {
    let config = GovernorConfigBuilder::default()
        .per_second(per_second)
        .burst_size(burst_size)
        .key_extractor(ClientIpKeyExtractor::new(behind_proxy))
        .finish()
        .expect("rate limit quota is non-zero");

    GovernorLayer::new(Arc::new(config))
}

/// Relaxed limiter for the public redirect route: 50 req/s, burst 200.
///
/// Requests over the limit receive `429 Too Many Requests`.
pub fn layer(behind_proxy: bool) -> RateLimitLayer {
    build(50, 200, behind_proxy)
}

/// Stricter limiter for the management API: 5 req/s, burst 20.
pub fn secure_layer(behind_proxy: bool) -> RateLimitLayer {
    build(5, 20, behind_proxy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::ConnectInfo;
    use std::net::SocketAddr;

    #[test]
    fn test_peer_extractor_uses_socket_address() {
        let mut req = Request::new(());
        let addr: SocketAddr = "10.0.0.7:5555".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));

        let key = ClientIpKeyExtractor::new(false).extract(&req).unwrap();
        assert_eq!(key, addr.ip());
    }

    #[test]
    fn test_peer_extractor_ignores_forwarded_header() {
        let mut req = Request::builder()
            .header("x-forwarded-for", "203.0.113.9")
            .body(())
            .unwrap();
        let addr: SocketAddr = "10.0.0.7:5555".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));

        let key = ClientIpKeyExtractor::Peer.extract(&req).unwrap();
        assert_eq!(key, addr.ip());
    }

    #[test]
    fn test_proxied_extractor_reads_forwarded_header() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.9")
            .body(())
            .unwrap();

        let key = ClientIpKeyExtractor::new(true).extract(&req).unwrap();
        assert_eq!(key, "203.0.113.9".parse::<IpAddr>().unwrap());
    }
}

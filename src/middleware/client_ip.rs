//! Caller origin address.
//!
//! Reads `CF-Connecting-IP`, `X-Real-IP`, then the first hop of
//! `X-Forwarded-For`, and falls back to the socket peer from `ConnectInfo`.
//! [`ClientIpLayer`] stores the result in request extensions so both the REST
//! handlers and the gRPC service (via `Request::extensions`) can read it when a
//! session is created.

use std::net::{IpAddr, SocketAddr};
use std::task::{Context, Poll};

use axum::extract::ConnectInfo;
use http::Request;
use tower::{Layer, Service};

/// Header priority for IP extraction (highest to lowest).
const IP_HEADERS: &[&str] = &["cf-connecting-ip", "x-real-ip", "x-forwarded-for"];

/// Client IP address extracted from a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientIp(pub Option<IpAddr>);

impl ClientIp {
    #[must_use]
    pub fn from_request<T>(req: &Request<T>) -> Self {
        Self(extract_client_ip(req))
    }

    /// Origin of a gRPC call: the layer-inserted value, else the transport peer.
    #[must_use]
    pub fn from_grpc<T>(request: &tonic::Request<T>) -> Self {
        request
            .extensions()
            .get::<Self>()
            .copied()
            .unwrap_or_else(|| Self(request.remote_addr().map(|addr| addr.ip())))
    }

    #[inline]
    #[must_use]
    pub const fn ip(&self) -> Option<IpAddr> {
        self.0
    }
}

fn extract_client_ip<T>(req: &Request<T>) -> Option<IpAddr> {
    IP_HEADERS
        .iter()
        .find_map(|header| {
            req.headers()
                .get(*header)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.split(',').next())
                .and_then(|ip| ip.trim().parse::<IpAddr>().ok())
        })
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip())
        })
}

/// Layer inserting [`ClientIp`] into request extensions.
#[derive(Clone, Copy, Default)]
pub struct ClientIpLayer;

impl<S> Layer<S> for ClientIpLayer {
    type Service = ClientIpMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ClientIpMiddleware { inner }
    }
}

#[derive(Clone)]
pub struct ClientIpMiddleware<S> {
    inner: S,
}

impl<S, ReqBody> Service<Request<ReqBody>> for ClientIpMiddleware<S>
where
    S: Service<Request<ReqBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let client_ip = ClientIp::from_request(&req);
        req.extensions_mut().insert(client_ip);
        self.inner.call(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> Option<IpAddr> {
        Some(s.parse().unwrap())
    }

    #[test]
    fn extracts_x_forwarded_for_chain() {
        let req = Request::builder()
            .header("x-forwarded-for", "203.0.113.195, 70.41.3.18, 150.172.238.178")
            .body(())
            .unwrap();
        assert_eq!(ClientIp::from_request(&req).ip(), ip("203.0.113.195"));
    }

    #[test]
    fn extracts_x_real_ip() {
        let req = Request::builder()
            .header("x-real-ip", "192.0.2.1")
            .body(())
            .unwrap();
        assert_eq!(ClientIp::from_request(&req).ip(), ip("192.0.2.1"));
    }

    #[test]
    fn prefers_cloudflare_over_others() {
        let req = Request::builder()
            .header("cf-connecting-ip", "198.51.100.1")
            .header("x-forwarded-for", "203.0.113.1")
            .header("x-real-ip", "192.0.2.1")
            .body(())
            .unwrap();
        assert_eq!(ClientIp::from_request(&req).ip(), ip("198.51.100.1"));
    }

    #[test]
    fn skips_unparsable_header() {
        let req = Request::builder()
            .header("x-real-ip", "not-an-ip")
            .header("x-forwarded-for", "2001:db8::1")
            .body(())
            .unwrap();
        assert_eq!(ClientIp::from_request(&req).ip(), ip("2001:db8::1"));
    }

    #[test]
    fn falls_back_to_peer_address() {
        let mut req = Request::builder().body(()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 40_000))));
        assert_eq!(ClientIp::from_request(&req).ip(), ip("10.0.0.7"));
    }

    #[test]
    fn grpc_origin_prefers_layer_value() {
        let mut req = tonic::Request::new(());
        assert!(ClientIp::from_grpc(&req).ip().is_none());

        req.extensions_mut().insert(ClientIp(ip("198.51.100.4")));
        assert_eq!(ClientIp::from_grpc(&req).ip(), ip("198.51.100.4"));
    }

    #[test]
    fn none_without_headers_or_peer() {
        let req = Request::builder().body(()).unwrap();
        assert!(ClientIp::from_request(&req).ip().is_none());
    }
}

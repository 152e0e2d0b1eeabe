//! Extractors whose rejections render as the uniform error body.

use std::collections::HashSet;
use std::net::{AddrParseError, IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRef, FromRequest, FromRequestParts, Path, Query},
    http::{HeaderMap, request::Parts},
};

use crate::error::WebError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(WebError))]
pub struct AppJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(WebError))]
pub struct AppQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(WebError))]
pub struct AppPath<T>(pub T);

/// Proxies whose forwarding headers are believed.
#[derive(Debug, Clone, Default)]
pub struct TrustedProxies(Arc<HashSet<IpAddr>>);

impl TrustedProxies {
    /// Parse a comma separated list of addresses. Empty entries are skipped.
    pub fn parse(list: &str) -> Result<Self, AddrParseError> {
        let proxies = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<HashSet<IpAddr>, _>>()?;

        Ok(Self(Arc::new(proxies)))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.0.contains(ip)
    }
}

/// Address of the caller. Forwarding headers count only when the socket
/// peer is a trusted proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIp(pub IpAddr);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    TrustedProxies: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let proxies = TrustedProxies::from_ref(state);

        Ok(Self(client_ip(&parts.headers, peer, &proxies)))
    }
}

fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>, proxies: &TrustedProxies) -> IpAddr {
    let Some(peer) = peer else {
        return IpAddr::V4(Ipv4Addr::LOCALHOST);
    };
    if !proxies.contains(&peer) {
        return peer;
    }

    let forwarded = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse().ok());

    let real_ip = || {
        headers
            .get("X-Real-IP")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse().ok())
    };

    forwarded.or_else(real_ip).unwrap_or(peer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn spoofed() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("X-Real-IP", HeaderValue::from_static("10.0.0.2"));
        headers.insert("X-Forwarded-For", HeaderValue::from_static("203.0.113.7, 10.0.0.1"));
        headers
    }

    #[test]
    fn test_headers_ignored_from_untrusted_peer() {
        let peer: IpAddr = "192.168.1.5".parse().unwrap();
        let none = TrustedProxies::default();

        assert_eq!(client_ip(&spoofed(), Some(peer), &none), peer);
        assert_eq!(
            client_ip(&spoofed(), None, &none),
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        );

        let other = TrustedProxies::parse("10.9.9.9").unwrap();
        assert_eq!(client_ip(&spoofed(), Some(peer), &other), peer);
    }

    #[test]
    fn test_headers_honored_from_trusted_proxy() {
        let proxy: IpAddr = "127.0.0.1".parse().unwrap();
        let proxies = TrustedProxies::parse("127.0.0.1, ::1").unwrap();

        assert_eq!(client_ip(&spoofed(), Some(proxy), &proxies).to_string(), "203.0.113.7");

        let mut headers = spoofed();
        headers.remove("X-Forwarded-For");
        assert_eq!(client_ip(&headers, Some(proxy), &proxies).to_string(), "10.0.0.2");

        assert_eq!(client_ip(&HeaderMap::new(), Some(proxy), &proxies), proxy);
    }

    #[test]
    fn test_trusted_proxies_parse() {
        assert!(TrustedProxies::parse("").unwrap().is_empty());
        assert!(TrustedProxies::parse("10.0.0.1,,").unwrap().contains(&"10.0.0.1".parse().unwrap()));
        assert!(TrustedProxies::parse("not-an-ip").is_err());
    }
}

//! Per-request authentication context
//!
//! Authentication runs "in the scope of a request": the context records who
//! is calling from where, so credential checks can log it and apply
//! request-dependent policy.

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

const FORWARDED_FOR: &str = "x-forwarded-for";
const REQUEST_ID: &str = "x-request-id";

/// Caller information captured from the incoming request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// First `X-Forwarded-For` hop, else the peer address
    pub client_ip: Option<IpAddr>,
    pub request_id: Option<String>,
}

impl RequestContext {
    pub fn from_parts(parts: &Parts) -> Self {
        let header = |name: &str| parts.headers.get(name).and_then(|v| v.to_str().ok());

        let forwarded = header(FORWARDED_FOR)
            .and_then(|v| v.split(',').next())
            .and_then(|ip| ip.trim().parse().ok());
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Self {
            client_ip: forwarded.or(peer),
            request_id: header(REQUEST_ID).map(str::to_string),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

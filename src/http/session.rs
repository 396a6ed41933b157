//! Session identity for cache scoping.
//!
//! # Design Decisions
//! - The proxy never creates sessions; it reads an existing marker
//! - Cookie value wins when present; otherwise the client IP keeps cache
//!   state connection-local; a shared anonymous scope is the last resort

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Request};

/// Identifies the cache scope a request belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SessionKey {
    /// Value of the configured session cookie.
    Cookie(String),
    /// Client address when no cookie is present.
    Peer(IpAddr),
    /// No identity at all; one shared scope.
    Anonymous,
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionKey::Cookie(v) => write!(f, "cookie:{v}"),
            SessionKey::Peer(ip) => write!(f, "peer:{ip}"),
            SessionKey::Anonymous => write!(f, "anonymous"),
        }
    }
}

impl SessionKey {
    pub fn from_request(req: &Request<Body>, cookie_name: &str) -> Self {
        if let Some(value) = cookie_value(req, cookie_name) {
            return SessionKey::Cookie(value);
        }
        if let Some(info) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
            return SessionKey::Peer(info.0.ip());
        }
        SessionKey::Anonymous
    }
}

fn cookie_value(req: &Request<Body>, name: &str) -> Option<String> {
    let header = req.headers().get(header::COOKIE)?.to_str().ok()?;
    for pair in header.split(';') {
        let Some((k, v)) = pair.trim().split_once('=') else {
            continue;
        };
        if k == name && !v.is_empty() {
            return Some(v.to_string());
        }
    }
    None
}

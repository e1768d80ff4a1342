//! Forwarding rules: (path prefix, method) to pool.

use std::fmt;

use axum::http::Method;

use crate::error::GatewayError;

/// Requests under this prefix are dispatched by method.
pub const API_PREFIX: &str = "/api";

/// Methods with a dedicated pool, in `Allow` header order.
pub const ROUTED_API_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

/// Upstream pool a request is forwarded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    /// Pages, static assets, and anything else outside `/api`.
    Full,
    Get,
    Post,
    Put,
    Delete,
}

impl PoolKind {
    pub const ALL: [PoolKind; 5] = [
        PoolKind::Full,
        PoolKind::Get,
        PoolKind::Post,
        PoolKind::Put,
        PoolKind::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PoolKind::Full => "full",
            PoolKind::Get => "get",
            PoolKind::Post => "post",
            PoolKind::Put => "put",
            PoolKind::Delete => "delete",
        }
    }
}

impl fmt::Display for PoolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `/api` itself or anything below it; `/apiary` is not.
pub fn is_api_path(path: &str) -> bool {
    match path.strip_prefix(API_PREFIX) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Pick the pool for a request.
///
/// Paths outside `/api` go to the full pool whatever the method. Under
/// `/api`, a method without a dedicated pool is rejected rather than
/// forwarded anywhere.
pub fn dispatch(method: &Method, path: &str) -> Result<PoolKind, GatewayError> {
    if !is_api_path(path) {
        return Ok(PoolKind::Full);
    }

    match *method {
        Method::GET => Ok(PoolKind::Get),
        Method::POST => Ok(PoolKind::Post),
        Method::PUT => Ok(PoolKind::Put),
        Method::DELETE => Ok(PoolKind::Delete),
        _ => Err(GatewayError::MethodNotRouted {
            method: method.clone(),
        }),
    }
}

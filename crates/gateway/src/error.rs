use axum::http::header::ALLOW;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use shelf_http::error::error_response;
use thiserror::Error;

use crate::table::{PoolKind, ROUTED_API_METHODS};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("pool '{pool}' has no upstreams")]
    EmptyPool { pool: PoolKind },

    #[error("invalid upstream '{url}' for pool '{pool}': {reason}")]
    InvalidUpstream {
        pool: PoolKind,
        url: String,
        reason: String,
    },

    #[error("no forwarding rule for {method} requests under /api")]
    MethodNotRouted { method: Method },

    #[error("failed to build upstream request URI")]
    Rewrite(#[source] axum::http::Error),

    #[error("upstream {upstream} in pool '{pool}' is unavailable")]
    Upstream {
        pool: PoolKind,
        upstream: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::MethodNotRouted { .. } => StatusCode::METHOD_NOT_ALLOWED,
            GatewayError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::EmptyPool { .. }
            | GatewayError::InvalidUpstream { .. }
            | GatewayError::Rewrite(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code carried in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::MethodNotRouted { .. } => "method_not_allowed",
            GatewayError::Upstream { .. } => "bad_gateway",
            GatewayError::EmptyPool { .. }
            | GatewayError::InvalidUpstream { .. }
            | GatewayError::Rewrite(_) => "gateway_error",
        }
    }
}

fn allow_header() -> HeaderValue {
    let methods: Vec<&str> = ROUTED_API_METHODS.iter().map(Method::as_str).collect();
    HeaderValue::from_str(&methods.join(", ")).unwrap_or_else(|_| HeaderValue::from_static("GET"))
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let details = match &self {
            GatewayError::MethodNotRouted { method } => {
                let allowed: Vec<&str> = ROUTED_API_METHODS.iter().map(Method::as_str).collect();
                vec![json!({ "method": method.as_str(), "allowed": allowed })]
            }
            GatewayError::Upstream { pool, .. } => vec![json!({ "pool": pool.as_str() })],
            _ => Vec::new(),
        };

        let mut response = error_response(status, self.code(), self.to_string(), details);
        if status == StatusCode::METHOD_NOT_ALLOWED {
            response.headers_mut().insert(ALLOW, allow_header());
        }
        response
    }
}

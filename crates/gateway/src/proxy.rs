//! Request forwarding.

use axum::body::Body;
use axum::extract::Request;
use axum::http::header::{CONNECTION, HOST, TE, TRAILER, TRANSFER_ENCODING, UPGRADE};
use axum::http::{HeaderMap, HeaderName};
use axum::response::{IntoResponse, Response};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::error::GatewayError;
use crate::pool::Pools;
use crate::table;

type HttpClient = Client<HttpConnector, Body>;

/// Connection-scoped headers that never cross the gateway in either direction.
const HOP_BY_HOP: [HeaderName; 7] = [
    CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    TE,
    TRAILER,
    TRANSFER_ENCODING,
    UPGRADE,
];

/// Stateless forwarder: picks a pool per request and relays it unchanged.
#[derive(Debug)]
pub struct Gateway {
    pools: Pools,
    client: HttpClient,
}

impl Gateway {
    pub fn new(pools: Pools) -> Self {
        let client = Client::<(), ()>::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { pools, client }
    }

    pub fn pools(&self) -> &Pools {
        &self.pools
    }

    /// Forward `request` and relay the upstream response, or render the
    /// gateway error when there is no rule or no reachable upstream.
    pub async fn handle(&self, request: Request) -> Response {
        match self.forward(request).await {
            Ok(response) => response,
            Err(err) => err.into_response(),
        }
    }

    /// Method, end-to-end headers and body go through as received. `Host` is
    /// left to the client so the upstream sees its own authority, and
    /// hop-by-hop headers are dropped both ways. Streams are relayed without
    /// buffering.
    pub async fn forward(&self, mut request: Request) -> Result<Response, GatewayError> {
        let kind = table::dispatch(request.method(), request.uri().path())?;
        let upstream = self.pools.pool(kind).select();
        let uri = upstream.rewrite(request.uri())?;

        tracing::debug!(
            pool = %kind,
            %upstream,
            method = %request.method(),
            path = request.uri().path(),
            "forwarding request"
        );

        *request.uri_mut() = uri;
        request.headers_mut().remove(HOST);
        strip_hop_by_hop(request.headers_mut());

        let mut response = self
            .client
            .request(request)
            .await
            .map_err(|source| GatewayError::Upstream {
                pool: kind,
                upstream: upstream.to_string(),
                source,
            })?;

        strip_hop_by_hop(response.headers_mut());
        Ok(response.into_response())
    }
}

/// Remove the fixed hop-by-hop set and every header listed in `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

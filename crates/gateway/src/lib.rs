//! Method-dispatching reverse proxy in front of the catalog replicas.
//!
//! Requests outside `/api` go to the `full` pool. Requests under `/api` go
//! to the pool named after their method (`get`, `post`, `put`, `delete`);
//! any other method there is answered with 405. Each pool holds one or more
//! identical replicas picked round-robin. All replicas run the same catalog
//! process against the same store, so the split is a deployment choice only.

use std::sync::Arc;

use anyhow::Context;
use axum::{extract::Request, Router};
use shelf_http::router::RouterBuilder;
use shelf_kernel::settings::GatewaySettings;

pub mod error;
pub mod pool;
pub mod proxy;
pub mod table;

pub use error::GatewayError;
pub use pool::{Pools, Upstream, UpstreamPool};
pub use proxy::Gateway;
pub use table::{dispatch, PoolKind};

/// Build the gateway router: every request goes through the forwarding table.
pub fn build_router(gateway: Arc<Gateway>) -> Router {
    let forward = move |request: Request| {
        let gateway = Arc::clone(&gateway);
        async move { gateway.handle(request).await }
    };

    RouterBuilder::new()
        .fallback(forward)
        .with_tracing()
        .with_request_id()
        .build()
}

/// Validate the pools, bind, and forward until shutdown.
pub async fn start_gateway(settings: &GatewaySettings) -> anyhow::Result<()> {
    let pools = Pools::from_settings(&settings.pools).context("invalid gateway pool configuration")?;
    let gateway = Arc::new(Gateway::new(pools));
    for kind in PoolKind::ALL {
        let upstreams: Vec<String> = gateway
            .pools()
            .pool(kind)
            .upstreams()
            .iter()
            .map(ToString::to_string)
            .collect();
        tracing::info!(pool = %kind, ?upstreams, "gateway pool configured");
    }

    let app = build_router(gateway);

    let address = format!("{}:{}", settings.host, settings.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind gateway to {address}"))?;
    tracing::info!("gateway listening on http://{address}");

    shelf_http::serve(listener, app).await
}

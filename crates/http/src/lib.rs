//! HTTP server facade for SHELF with Axum, error handling, and OpenAPI support.

use anyhow::Context;
use axum::{routing::get, Router};

use shelf_kernel::{settings::ServerSettings, ModuleRegistry};

pub mod error;
pub mod router;

use error::AppError;
use router::RouterBuilder;

/// Start the HTTP server with the given module registry
///
/// Returns once a shutdown signal arrives and in-flight requests are done.
pub async fn start_server(registry: &ModuleRegistry, settings: &ServerSettings) -> anyhow::Result<()> {
    tracing::info!("starting HTTP server on {}:{}", settings.host, settings.port);

    // Build the main router
    let app = build_router(registry, settings);

    // Create the server
    let listener = tokio::net::TcpListener::bind(format!("{}:{}", settings.host, settings.port))
        .await
        .context("failed to bind to address")?;

    tracing::info!(
        "HTTP server listening on http://{}:{}",
        settings.host,
        settings.port
    );

    serve(listener, app).await
}

/// Serve `app` on `listener` until ctrl-c or SIGTERM
pub async fn serve(listener: tokio::net::TcpListener, app: Router) -> anyhow::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

/// Build the main HTTP router with all module routes mounted
pub fn build_router(registry: &ModuleRegistry, settings: &ServerSettings) -> Router {
    let mut router_builder = RouterBuilder::new();

    // Add health check route
    router_builder = router_builder.route("/healthz", get(health_check));

    // Mount module routes
    for module in registry.modules() {
        let module_name = module.name();

        tracing::info!(
            module = module_name,
            "mounting module routes under /api/{}",
            module_name
        );
        router_builder = router_builder
            .mount_module(module_name, module.routes())
            .merge(module.root_routes());
    }

    // Add OpenAPI documentation
    router_builder = router_builder
        .with_openapi(registry)
        .fallback(route_not_found);

    // Global middlewares wrap everything registered above
    router_builder = router_builder.with_tracing().with_cors();
    if let Some(timeout_ms) = settings.request_timeout_ms {
        router_builder = router_builder.with_timeout(timeout_ms);
    }

    router_builder.with_request_id().build()
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "ok"
}

async fn route_not_found() -> AppError {
    AppError::not_found("no route matches the requested path")
}

/// Resolves on ctrl-c, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

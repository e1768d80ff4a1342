//! SHELF catalog application
//!
//! Wires the record store, the `books` API and the `pages` presentation into
//! one catalog replica. Every replica runs the same process; the gateway
//! decides which requests each one sees.

pub mod modules;
pub mod utils;

use anyhow::Context;
use shelf_db::{seed::SeedReport, SharedStore};
use shelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Registry holding every catalog module over `store`
pub fn catalog_registry(store: SharedStore, settings: &Settings) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store, settings);
    registry
}

/// Run one catalog replica until a shutdown signal arrives
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let store = shelf_db::connect(&settings.database).await?;
    let registry = catalog_registry(store, &settings);
    let ctx = InitCtx {
        settings: &settings,
    };

    registry.boot(&ctx).await?;
    tracing::info!("catalog replica ready");

    let served = shelf_http::start_server(&registry, &settings.server).await;
    registry.shutdown().await?;
    served
}

/// Prepare the store and insert the starter books, then return
pub async fn bootstrap(settings: &Settings) -> anyhow::Result<SeedReport> {
    let store = shelf_db::connect(&settings.database).await?;
    store
        .bootstrap()
        .await
        .context("failed to bootstrap the record store")?;
    let report = shelf_db::seed::seed(store.as_ref())
        .await
        .context("failed to seed starter books")?;

    tracing::info!(
        inserted = report.inserted,
        existing = report.existing,
        "record store bootstrapped"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_settings() -> Settings {
        let mut settings = Settings::default();
        settings.database.uri = Some("memory://".to_string());
        settings
    }

    #[tokio::test]
    async fn bootstrap_seeds_a_fresh_store() {
        let report = bootstrap(&memory_settings()).await.unwrap();
        assert_eq!(report.inserted, 3);
        assert_eq!(report.existing, 0);
    }

    #[tokio::test]
    async fn bootstrap_without_uri_fails() {
        let err = bootstrap(&Settings::default()).await.unwrap_err();
        assert!(format!("{err:#}").contains("DATABASE_URI"));
    }

    #[test]
    fn registry_holds_store_and_catalog_modules() {
        let store: SharedStore = std::sync::Arc::new(shelf_db::MemoryStore::new());
        let registry = catalog_registry(store, &memory_settings());
        for name in ["db", "books", "pages"] {
            assert!(registry.get_module(name).is_some(), "{name}");
        }
    }
}

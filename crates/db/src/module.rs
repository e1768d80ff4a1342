use async_trait::async_trait;
use shelf_kernel::{InitCtx, Module};

use crate::seed;
use crate::store::SharedStore;

/// Core module owning record store preparation: bootstrap on init, seed on start.
pub struct StoreModule {
    store: SharedStore,
}

impl StoreModule {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Module for StoreModule {
    fn name(&self) -> &'static str {
        "db"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.store.bootstrap().await?;
        tracing::info!(module = self.name(), "record store bootstrapped");
        Ok(())
    }

    async fn start(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if !ctx.settings.database.seed {
            tracing::info!(module = self.name(), "seeding disabled");
            return Ok(());
        }

        let report = seed::seed(self.store.as_ref()).await?;
        tracing::info!(
            module = self.name(),
            inserted = report.inserted,
            existing = report.existing,
            "starter books seeded"
        );
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.store.shutdown().await?;
        tracing::info!(module = self.name(), "db module stopped");
        Ok(())
    }
}

/// Create the `db` core module for `store`.
pub fn create_module(store: SharedStore) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(StoreModule::new(store))
}

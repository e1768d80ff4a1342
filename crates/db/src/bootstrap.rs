//! Idempotent collection bootstrap.

use async_trait::async_trait;

use crate::error::StoreError;

/// The slice of a database handle needed to make sure a collection exists.
#[async_trait]
pub trait CollectionCatalog: Send + Sync {
    async fn list_names(&self) -> Result<Vec<String>, StoreError>;

    async fn create(&self, name: &str) -> Result<(), StoreError>;
}

/// Create `name` unless the catalog already lists it.
///
/// Returns whether a collection was created. A failing listing means the
/// store is unusable and is returned as is; callers treat it as fatal.
pub async fn ensure_collection_exists<C>(catalog: &C, name: &str) -> Result<bool, StoreError>
where
    C: CollectionCatalog + ?Sized,
{
    let names = catalog.list_names().await?;
    if names.iter().any(|existing| existing == name) {
        tracing::debug!(collection = name, "collection already present");
        return Ok(false);
    }

    catalog.create(name).await?;
    tracing::info!(collection = name, "created collection");
    Ok(true)
}

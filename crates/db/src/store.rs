use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{BookFields, RecordId, StoredBook, WriteOutcome};

/// Shared handle to the record store, built once per process.
pub type SharedStore = Arc<dyn RecordStore>;

/// Primitive operations against the book collection.
///
/// Every call is a fresh round trip; implementations keep no read cache.
/// Backends enforce the five-field uniqueness key themselves and report a
/// violation as [`StoreError::Duplicate`].
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Prepare the backend for use. Safe to call on every start.
    async fn bootstrap(&self) -> Result<(), StoreError>;

    /// Every persisted book, in store-native order.
    async fn list_all(&self) -> Result<Vec<StoredBook>, StoreError>;

    /// Books whose five fields all equal `fields`.
    async fn find_matching(&self, fields: &BookFields) -> Result<Vec<StoredBook>, StoreError>;

    /// Persist a new book and return the identifier the store assigned.
    async fn insert(&self, fields: BookFields) -> Result<RecordId, StoreError>;

    /// Replace the five fields of the book with `id`.
    async fn update(&self, id: RecordId, fields: BookFields) -> Result<WriteOutcome, StoreError>;

    /// Remove the book with `id`.
    async fn delete(&self, id: RecordId) -> Result<WriteOutcome, StoreError>;

    /// Release backend resources. The store must not be used afterwards.
    async fn shutdown(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

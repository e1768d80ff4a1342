//! Process-local record store.
//!
//! Holds the same contract as the MongoDB backend, including the uniqueness
//! key, which is checked and written under one lock.

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::model::{BookFields, RecordId, StoredBook, WriteOutcome};
use crate::store::RecordStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    books: RwLock<IndexMap<RecordId, BookFields>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn stored(id: &RecordId, fields: &BookFields) -> StoredBook {
    StoredBook {
        id: *id,
        fields: fields.clone(),
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn bootstrap(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<StoredBook>, StoreError> {
        let books = self.books.read().await;
        Ok(books.iter().map(|(id, fields)| stored(id, fields)).collect())
    }

    async fn find_matching(&self, fields: &BookFields) -> Result<Vec<StoredBook>, StoreError> {
        let books = self.books.read().await;
        Ok(books
            .iter()
            .filter(|(_, candidate)| *candidate == fields)
            .map(|(id, fields)| stored(id, fields))
            .collect())
    }

    async fn insert(&self, fields: BookFields) -> Result<RecordId, StoreError> {
        let mut books = self.books.write().await;
        if books.values().any(|existing| *existing == fields) {
            return Err(StoreError::Duplicate);
        }
        let id = RecordId::generate();
        books.insert(id, fields);
        Ok(id)
    }

    async fn update(&self, id: RecordId, fields: BookFields) -> Result<WriteOutcome, StoreError> {
        let mut books = self.books.write().await;
        if !books.contains_key(&id) {
            return Ok(WriteOutcome::NoMatch);
        }
        if books
            .iter()
            .any(|(other, existing)| *other != id && *existing == fields)
        {
            return Err(StoreError::Duplicate);
        }
        books.insert(id, fields);
        Ok(WriteOutcome::Applied)
    }

    async fn delete(&self, id: RecordId) -> Result<WriteOutcome, StoreError> {
        let mut books = self.books.write().await;
        Ok(match books.shift_remove(&id) {
            Some(_) => WriteOutcome::Applied,
            None => WriteOutcome::NoMatch,
        })
    }
}

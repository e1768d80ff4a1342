use crate::error::StoreError;
use crate::model::BookFields;
use crate::store::RecordStore;

/// Pre-write check for an existing book with identical field values.
///
/// The lookup and the write that follows are two round trips, so two
/// concurrent writers can both pass the guard. Backends close that gap with
/// their own uniqueness constraint; the guard keeps the common case cheap and
/// the response explicit.
pub struct DuplicateGuard<'a> {
    store: &'a dyn RecordStore,
}

impl<'a> DuplicateGuard<'a> {
    pub fn new(store: &'a dyn RecordStore) -> Self {
        Self { store }
    }

    /// True iff at least one stored book matches all five fields.
    pub async fn exists(&self, fields: &BookFields) -> Result<bool, StoreError> {
        let matches = self.store.find_matching(fields).await?;
        Ok(!matches.is_empty())
    }
}

//! Starter books inserted on first start.

use crate::error::StoreError;
use crate::guard::DuplicateGuard;
use crate::model::BookFields;
use crate::store::RecordStore;

/// Counts from one seeding pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub inserted: usize,
    pub existing: usize,
}

pub fn starter_books() -> Vec<BookFields> {
    vec![
        BookFields {
            name: "The Vortex".to_string(),
            author: "José Eustasio Rivera".to_string(),
            isbn: "958-30-0804-4".to_string(),
            pages: 292,
            year: 1924,
        },
        BookFields {
            name: "Frankenstein".to_string(),
            author: "Mary Shelley".to_string(),
            isbn: "978-3-649-64609-9".to_string(),
            pages: 280,
            year: 1818,
        },
        BookFields {
            name: "The Black Cat".to_string(),
            author: "Edgar Allan Poe".to_string(),
            isbn: "978-3-99168-238-7".to_string(),
            pages: 280,
            year: 1843,
        },
    ]
}

/// Insert every starter book that is not stored yet.
///
/// Replicas may seed concurrently; losing that race counts as existing.
pub async fn seed(store: &dyn RecordStore) -> Result<SeedReport, StoreError> {
    let guard = DuplicateGuard::new(store);
    let mut report = SeedReport::default();

    for book in starter_books() {
        if guard.exists(&book).await? {
            report.existing += 1;
            continue;
        }
        match store.insert(book).await {
            Ok(id) => {
                tracing::debug!(%id, "seeded book");
                report.inserted += 1;
            }
            Err(StoreError::Duplicate) => report.existing += 1,
            Err(err) => return Err(err),
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn seeding_twice_inserts_once() {
        let store = MemoryStore::new();

        let first = seed(&store).await.unwrap();
        assert_eq!(first, SeedReport { inserted: 3, existing: 0 });

        let second = seed(&store).await.unwrap();
        assert_eq!(second, SeedReport { inserted: 0, existing: 3 });

        assert_eq!(store.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn seeding_keeps_existing_records() {
        let store = MemoryStore::new();
        let frankenstein = starter_books().remove(1);
        let id = store.insert(frankenstein).await.unwrap();

        let report = seed(&store).await.unwrap();
        assert_eq!(report, SeedReport { inserted: 2, existing: 1 });

        let all = store.list_all().await.unwrap();
        assert_eq!(all.iter().filter(|book| book.id == id).count(), 1);
    }
}

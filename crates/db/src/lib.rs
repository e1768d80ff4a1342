//! Record store adapter for the book catalog.
//!
//! Every catalog replica talks to one shared store through [`RecordStore`].
//! [`connect`] picks the backend from the connection string: `mongodb://`
//! (and `mongodb+srv://`) for the shared MongoDB deployment, `memory://` for a
//! store private to the process.

use std::sync::Arc;

use anyhow::Context;
use shelf_kernel::settings::DatabaseSettings;

pub mod bootstrap;
pub mod error;
pub mod guard;
pub mod memory;
pub mod model;
pub mod module;
pub mod mongo;
pub mod seed;
pub mod store;

pub use error::StoreError;
pub use guard::DuplicateGuard;
pub use memory::MemoryStore;
pub use model::{BookFields, InvalidRecordId, RecordId, StoredBook, WriteOutcome};
pub use module::create_module;
pub use mongo::MongoStore;
pub use store::{RecordStore, SharedStore};

const MEMORY_SCHEME: &str = "memory://";

/// Open the record store named by `settings.uri`.
///
/// Missing configuration and an unreachable store are both errors; the
/// caller is expected to exit.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<SharedStore> {
    let uri = settings.uri()?;

    if uri.starts_with(MEMORY_SCHEME) {
        tracing::warn!("using a process-local record store; replicas will not share records");
        return Ok(Arc::new(MemoryStore::new()));
    }

    let store = MongoStore::connect(settings, uri)
        .await
        .context("failed to connect to the record store")?;
    Ok(Arc::new(store))
}

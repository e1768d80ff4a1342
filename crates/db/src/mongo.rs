//! MongoDB backend shared by every catalog replica.

use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use shelf_kernel::settings::DatabaseSettings;

use crate::bootstrap::{ensure_collection_exists, CollectionCatalog};
use crate::error::StoreError;
use crate::model::{BookFields, RecordId, StoredBook, WriteOutcome};
use crate::store::RecordStore;

const UNIQUE_FIELDS_INDEX: &str = "book_fields_unique";

#[derive(Debug, Clone)]
pub struct MongoStore {
    client: Client,
    database: Database,
    books: Collection<BookFields>,
}

impl MongoStore {
    /// Build the client and wait for the server to answer a ping.
    ///
    /// Fails once `connect_timeout_ms` elapses; a replica never serves
    /// without a reachable store.
    pub async fn connect(settings: &DatabaseSettings, uri: &str) -> anyhow::Result<Self> {
        let deadline = Duration::from_millis(settings.connect_timeout_ms);

        let mut options = ClientOptions::parse(uri)
            .await
            .context("invalid database connection string")?;
        options.connect_timeout = Some(deadline);
        options.server_selection_timeout = Some(deadline);
        if options.app_name.is_none() {
            options.app_name = Some("shelf".to_string());
        }

        let client = Client::with_options(options).context("failed to build database client")?;
        let ping = async {
            client
                .database("admin")
                .run_command(doc! { "ping": 1 })
                .await
        };
        tokio::time::timeout(deadline, ping)
            .await
            .map_err(|_| anyhow!("database did not answer within {deadline:?}"))?
            .context("database ping failed")?;

        let database = client.database(&settings.database);
        let books = database.collection::<BookFields>(&settings.collection);
        tracing::info!(
            database = %settings.database,
            collection = %settings.collection,
            "connected to record store"
        );

        Ok(Self {
            client,
            database,
            books,
        })
    }

    fn stored_books(&self) -> Collection<StoredBook> {
        self.books.clone_with_type()
    }
}

/// Equality filter over the five fields, using the collection field names.
fn fields_document(fields: &BookFields) -> Document {
    doc! {
        "bookname": fields.name.as_str(),
        "bookauthor": fields.author.as_str(),
        "bookisbn": fields.isbn.as_str(),
        "bookpages": i64::from(fields.pages),
        "bookyear": fields.year,
    }
}

fn outcome(matched: u64) -> WriteOutcome {
    if matched == 0 {
        WriteOutcome::NoMatch
    } else {
        WriteOutcome::Applied
    }
}

#[async_trait]
impl CollectionCatalog for Database {
    async fn list_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.list_collection_names().await?)
    }

    async fn create(&self, name: &str) -> Result<(), StoreError> {
        Ok(self.create_collection(name).await?)
    }
}

#[async_trait]
impl RecordStore for MongoStore {
    async fn bootstrap(&self) -> Result<(), StoreError> {
        ensure_collection_exists(&self.database, self.books.name()).await?;

        let index = IndexModel::builder()
            .keys(doc! {
                "bookname": 1,
                "bookauthor": 1,
                "bookisbn": 1,
                "bookpages": 1,
                "bookyear": 1,
            })
            .options(
                IndexOptions::builder()
                    .name(UNIQUE_FIELDS_INDEX.to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        // Existing duplicates prevent the index; the guard still applies.
        if let Err(err) = self.books.create_index(index).await {
            tracing::warn!(
                error = %err,
                index = UNIQUE_FIELDS_INDEX,
                "unique index unavailable; concurrent duplicate writes are possible"
            );
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<StoredBook>, StoreError> {
        let cursor = self.stored_books().find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn find_matching(&self, fields: &BookFields) -> Result<Vec<StoredBook>, StoreError> {
        let cursor = self.stored_books().find(fields_document(fields)).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert(&self, fields: BookFields) -> Result<RecordId, StoreError> {
        let result = self.books.insert_one(&fields).await?;
        result
            .inserted_id
            .as_object_id()
            .map(RecordId::from)
            .ok_or(StoreError::MissingIdentifier)
    }

    async fn update(&self, id: RecordId, fields: BookFields) -> Result<WriteOutcome, StoreError> {
        let result = self
            .books
            .update_one(
                doc! { "_id": id.as_object_id() },
                doc! { "$set": fields_document(&fields) },
            )
            .await?;
        Ok(outcome(result.matched_count))
    }

    async fn delete(&self, id: RecordId) -> Result<WriteOutcome, StoreError> {
        let result = self
            .books
            .delete_one(doc! { "_id": id.as_object_id() })
            .await?;
        Ok(outcome(result.deleted_count))
    }

    async fn shutdown(&self) -> Result<(), StoreError> {
        // Waits for checked-out connections and background tasks to finish.
        self.client.clone().shutdown().await;
        tracing::info!(database = %self.database.name(), "record store connection closed");
        Ok(())
    }
}

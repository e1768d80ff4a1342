//! JSON handlers for `/api/books`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{delete, get},
    Json, Router,
};
use serde_json::json;
use shelf_db::{DuplicateGuard, RecordId, SharedStore, StoreError, WriteOutcome};
use shelf_http::error::AppError;

use super::models::{Book, CreatedBook};

pub const UPDATED: &str = "Updated the book";
pub const DELETED: &str = "Successfully deleted entry";
const DUPLICATE: &str = "Duplicate not allowed";

/// Routes relative to the module mount point.
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route(
            "/",
            get(list_books)
                .post(create_book)
                .put(update_book)
                .delete(delete_without_id),
        )
        .route("/health", get(health_check))
        .route("/{id}", delete(delete_book))
        .with_state(store)
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn list_books(State(store): State<SharedStore>) -> Result<Json<Vec<Book>>, AppError> {
    let books = store.list_all().await.map_err(store_error)?;
    Ok(Json(books.into_iter().map(Book::from).collect()))
}

/// Insert a new book. Any client supplied `id` is ignored.
async fn create_book(
    State(store): State<SharedStore>,
    payload: Result<Json<Book>, JsonRejection>,
) -> Result<Json<CreatedBook>, AppError> {
    let Json(book) = payload?;
    let fields = book.into_fields();

    if DuplicateGuard::new(&*store)
        .exists(&fields)
        .await
        .map_err(store_error)?
    {
        return Err(duplicate());
    }

    let id = store.insert(fields).await.map_err(store_error)?;
    tracing::info!(%id, "book created");

    Ok(Json(CreatedBook { id: id.to_hex() }))
}

/// Replace the fields of the book named by `id`.
///
/// Unknown identifiers and failed writes are logged, not reported.
async fn update_book(
    State(store): State<SharedStore>,
    payload: Result<Json<Book>, JsonRejection>,
) -> Result<Json<&'static str>, AppError> {
    let Json(book) = payload?;
    let (id, fields) = book.into_identified().map_err(|err| {
        AppError::validation(
            vec![json!({ "field": "id", "error": err.to_string() })],
            "a valid book identifier is required",
        )
    })?;

    if DuplicateGuard::new(&*store)
        .exists(&fields)
        .await
        .map_err(store_error)?
    {
        return Err(duplicate());
    }

    match store.update(id, fields).await {
        Ok(WriteOutcome::Applied) => tracing::info!(%id, "book updated"),
        Ok(WriteOutcome::NoMatch) => tracing::info!(%id, "no book to update"),
        Err(StoreError::Duplicate) => return Err(duplicate()),
        Err(err) => tracing::warn!(%id, error = %err, "book update failed"),
    }

    Ok(Json(UPDATED))
}

/// Remove the book named by `id`. Always answers with the confirmation.
async fn delete_book(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Json<&'static str> {
    match id.parse::<RecordId>() {
        Ok(id) => match store.delete(id).await {
            Ok(WriteOutcome::Applied) => tracing::info!(%id, "book deleted"),
            Ok(WriteOutcome::NoMatch) => tracing::info!(%id, "no book to delete"),
            Err(err) => tracing::warn!(%id, error = %err, "book delete failed"),
        },
        Err(err) => tracing::debug!(error = %err, "ignoring delete"),
    }

    Json(DELETED)
}

/// A delete that names no book still gets the confirmation.
pub async fn delete_without_id() -> Json<&'static str> {
    tracing::debug!("ignoring delete without an identifier");
    Json(DELETED)
}

fn duplicate() -> AppError {
    AppError::duplicate(Vec::new(), DUPLICATE)
}

fn store_error(err: StoreError) -> AppError {
    match err {
        StoreError::Duplicate => duplicate(),
        other => {
            AppError::Internal(anyhow::Error::new(other).context("record store request failed"))
        }
    }
}

use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

/// MongoDB server code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Errors raised by record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another record already holds the same five field values.
    #[error("a book with the same name, author, isbn, pages and year already exists")]
    Duplicate,

    #[error("store did not return an identifier for the inserted book")]
    MissingIdentifier,

    #[error("record store operation failed")]
    Backend(#[source] mongodb::error::Error),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        if is_duplicate_key(&err) {
            Self::Duplicate
        } else {
            Self::Backend(err)
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

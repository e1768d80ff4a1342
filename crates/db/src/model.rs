//! Persisted shapes of a book record.

use std::fmt;
use std::str::FromStr;

use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Store-generated identifier of a persisted book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(ObjectId);

impl RecordId {
    /// A fresh identifier, as the store would assign on insert.
    pub fn generate() -> Self {
        Self(ObjectId::new())
    }

    pub fn as_object_id(&self) -> ObjectId {
        self.0
    }

    /// 24 lowercase hex characters.
    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl From<ObjectId> for RecordId {
    fn from(id: ObjectId) -> Self {
        Self(id)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl FromStr for RecordId {
    type Err = InvalidRecordId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(InvalidRecordId::Missing);
        }
        ObjectId::parse_str(s)
            .map(Self)
            .map_err(|_| InvalidRecordId::Malformed(s.to_string()))
    }
}

/// Why a client supplied identifier could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRecordId {
    #[error("book identifier is missing")]
    Missing,
    #[error("'{0}' is not a valid book identifier")]
    Malformed(String),
}

/// The five descriptive fields of a book; together they form its uniqueness key.
///
/// Serialized with the field names already present in the collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookFields {
    #[serde(rename = "bookname")]
    pub name: String,
    #[serde(rename = "bookauthor")]
    pub author: String,
    #[serde(rename = "bookisbn")]
    pub isbn: String,
    #[serde(rename = "bookpages")]
    pub pages: u32,
    #[serde(rename = "bookyear")]
    pub year: i32,
}

/// A book as it exists in the store, identifier included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBook {
    #[serde(rename = "_id")]
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: BookFields,
}

/// Result of an update or delete addressed by identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    /// No record carries the identifier. Not an error.
    NoMatch,
}

use serde::{Deserialize, Serialize};
use shelf_db::{BookFields, InvalidRecordId, RecordId, StoredBook};

/// A book as exchanged with API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Hex identifier; empty until the book is stored
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub author: String,
    pub isbn: String,
    pub pages: u32,
    pub year: i32,
}

impl Book {
    /// The five descriptive fields, identifier dropped.
    pub fn into_fields(self) -> BookFields {
        BookFields {
            name: self.name,
            author: self.author,
            isbn: self.isbn,
            pages: self.pages,
            year: self.year,
        }
    }

    /// Split into a decoded identifier and the fields to write under it.
    pub fn into_identified(self) -> Result<(RecordId, BookFields), InvalidRecordId> {
        let id = self.id.parse::<RecordId>()?;
        Ok((id, self.into_fields()))
    }
}

impl From<StoredBook> for Book {
    fn from(book: StoredBook) -> Self {
        Self {
            id: book.id.to_hex(),
            name: book.fields.name,
            author: book.fields.author,
            isbn: book.fields.isbn,
            pages: book.fields.pages,
            year: book.fields.year,
        }
    }
}

/// Response body of a successful create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedBook {
    #[serde(rename = "ID")]
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dune(id: &str) -> Book {
        Book {
            id: id.to_string(),
            name: "Dune".to_string(),
            author: "Herbert".to_string(),
            isbn: "0-441-17271-7".to_string(),
            pages: 412,
            year: 1965,
        }
    }

    #[test]
    fn stored_book_converts_back_to_the_same_fields() {
        let stored = StoredBook {
            id: RecordId::generate(),
            fields: dune("").into_fields(),
        };

        let wire = Book::from(stored.clone());
        assert_eq!(wire.id, stored.id.to_hex());

        let (id, fields) = wire.into_identified().unwrap();
        assert_eq!(id, stored.id);
        assert_eq!(fields, stored.fields);
    }

    #[test]
    fn identifier_is_optional_on_the_wire() {
        let book: Book = serde_json::from_value(serde_json::json!({
            "name": "Dune",
            "author": "Herbert",
            "isbn": "0-441-17271-7",
            "pages": 412,
            "year": 1965
        }))
        .unwrap();
        assert_eq!(book, dune(""));
        assert_eq!(book.into_identified(), Err(InvalidRecordId::Missing));
    }

    #[test]
    fn malformed_identifier_is_reported() {
        let err = dune("12345").into_identified().unwrap_err();
        assert_eq!(err, InvalidRecordId::Malformed("12345".to_string()));
    }
}

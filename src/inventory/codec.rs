//! Book <-> record mapping
//!
//! A record holds every book field except `id` as a camelCase attribute.
//! Every field is always encoded (a cleared cover is stored as `null`), so
//! two encoded books always have the same attribute names.

use serde_json::Value;

use crate::catalog::Book;
use crate::record_store::{Attributes, Record, RecordStoreError, RecordStoreResult, ID_ATTRIBUTE};

/// Attribute refreshed by every write
pub const UPDATED_AT_ATTRIBUTE: &str = "updatedAt";

/// Attribute names written by borrow and return
pub const LENDING_ATTRIBUTES: [&str; 3] = ["quantity", "borrowRecords", UPDATED_AT_ATTRIBUTE];

/// Full attribute image of a book, without the key
pub fn book_to_attributes(book: &Book) -> RecordStoreResult<Attributes> {
    match serde_json::to_value(book)? {
        Value::Object(mut map) => {
            map.remove(ID_ATTRIBUTE);
            Ok(map)
        }
        _ => Err(RecordStoreError::Serialization(
            "book did not encode to an object".to_string(),
        )),
    }
}

/// Decode a stored record back into a book
pub fn book_from_record(record: &Record) -> RecordStoreResult<Book> {
    let mut map = record.attributes.clone();
    map.insert(ID_ATTRIBUTE.to_string(), Value::String(record.id.clone()));
    Ok(serde_json::from_value(Value::Object(map))?)
}

/// Attributes whose encoded value differs between `before` and `after`.
///
/// `updatedAt` is always included.
pub fn changed_attributes(before: &Book, after: &Book) -> RecordStoreResult<Attributes> {
    let old = book_to_attributes(before)?;
    Ok(book_to_attributes(after)?
        .into_iter()
        .filter(|(name, value)| name == UPDATED_AT_ATTRIBUTE || old.get(name) != Some(value))
        .collect())
}

/// Only the attributes written by borrow and return
pub fn lending_attributes(book: &Book) -> RecordStoreResult<Attributes> {
    let mut all = book_to_attributes(book)?;
    Ok(LENDING_ATTRIBUTES
        .iter()
        .filter_map(|name| all.remove(*name).map(|v| (name.to_string(), v)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BookId, Category};
    use chrono::Utc;
    use serde_json::json;

    fn sample() -> Book {
        let now = Utc::now();
        Book {
            id: BookId::new(),
            title: "Dune".into(),
            author: "Frank Herbert".into(),
            isbn: "978-0441013593".into(),
            category: Category::Fiction,
            cover_url: Some("http://x/covers/a.jpg".into()),
            description: "Spice".into(),
            price: 9.99,
            quantity: 3,
            borrow_records: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_attributes_exclude_key_and_use_camel_case() {
        let attrs = book_to_attributes(&sample()).unwrap();
        assert!(!attrs.contains_key("id"));
        assert!(attrs.contains_key("coverUrl"));
        assert!(attrs.contains_key("borrowRecords"));
        assert!(attrs.contains_key("createdAt"));
        assert_eq!(attrs["category"], json!("Fiction"));
    }

    #[test]
    fn test_record_decodes_to_same_book() {
        let book = sample();
        let record = Record::new(book.id.to_string(), book_to_attributes(&book).unwrap());
        assert_eq!(book_from_record(&record).unwrap(), book);
    }

    #[test]
    fn test_undecodable_record() {
        let mut attrs = Attributes::new();
        attrs.insert("title".into(), json!(42));
        let record = Record::new(BookId::new().to_string(), attrs);
        assert!(matches!(
            book_from_record(&record),
            Err(RecordStoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_changed_attributes_is_sparse() {
        let before = sample();
        let mut after = before.clone();
        after.price = 12.0;

        let changes = changed_attributes(&before, &after).unwrap();
        let mut names: Vec<_> = changes.keys().cloned().collect();
        names.sort();
        assert_eq!(names, vec!["price", "updatedAt"]);
    }

    #[test]
    fn test_cleared_cover_is_written_as_null() {
        let before = sample();
        let mut after = before.clone();
        after.cover_url = None;

        let changes = changed_attributes(&before, &after).unwrap();
        assert_eq!(changes["coverUrl"], Value::Null);
    }

    #[test]
    fn test_lending_attributes() {
        let attrs = lending_attributes(&sample()).unwrap();
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs["quantity"], json!(3));
    }
}

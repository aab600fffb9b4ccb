//! Public representation of books

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::{Book, Borrow, BorrowStatus, Category};

/// A borrow record as shown to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Borrower {
    pub user_id: String,
    pub borrow_date: DateTime<Utc>,
    pub expected_return_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_return_date: Option<DateTime<Utc>>,
    pub status: BorrowStatus,
}

impl From<&Borrow> for Borrower {
    fn from(borrow: &Borrow) -> Self {
        Self {
            user_id: borrow.user_id.clone(),
            borrow_date: borrow.borrow_date,
            expected_return_date: borrow.expected_return_date,
            actual_return_date: borrow.actual_return_date,
            status: borrow.status,
        }
    }
}

/// A book as shown to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    pub id: String,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: Category,
    pub cover_url: Option<String>,
    pub description: String,
    pub price: f64,
    pub quantity: u32,
    pub borrowed_by: Vec<Borrower>,
}

impl From<&Book> for BookView {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id.to_string(),
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            category: book.category,
            cover_url: book.cover_url.clone(),
            description: book.description.clone(),
            price: book.price,
            quantity: book.quantity,
            borrowed_by: book.borrow_records.iter().map(Borrower::from).collect(),
        }
    }
}

/// Every book in the catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookListing {
    pub books: Vec<BookView>,
    pub total_books: usize,
}

impl BookListing {
    pub fn new(books: Vec<BookView>) -> Self {
        let total_books = books.len();
        Self { books, total_books }
    }
}

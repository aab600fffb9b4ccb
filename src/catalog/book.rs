//! Book aggregate types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, immutable book identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(Uuid);

impl BookId {
    /// Generate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier from its string form
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for BookId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of catalog categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Fiction,
    #[serde(rename = "Non-Fiction")]
    NonFiction,
    Poetry,
    Biography,
    History,
    Science,
    Technology,
    Children,
    Fantasy,
    Mystery,
    Romance,
    #[serde(rename = "Self-Help")]
    SelfHelp,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::Fiction,
        Category::NonFiction,
        Category::Poetry,
        Category::Biography,
        Category::History,
        Category::Science,
        Category::Technology,
        Category::Children,
        Category::Fantasy,
        Category::Mystery,
        Category::Romance,
        Category::SelfHelp,
    ];

    /// Display name, identical to the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Fiction => "Fiction",
            Category::NonFiction => "Non-Fiction",
            Category::Poetry => "Poetry",
            Category::Biography => "Biography",
            Category::History => "History",
            Category::Science => "Science",
            Category::Technology => "Technology",
            Category::Children => "Children",
            Category::Fantasy => "Fantasy",
            Category::Mystery => "Mystery",
            Category::Romance => "Romance",
            Category::SelfHelp => "Self-Help",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// Lending state of a borrow record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BorrowStatus {
    Active,
    Returned,
    /// Assigned by external overdue tracking, never by the core
    Overdue,
}

/// One lending episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Borrow {
    pub user_id: String,
    pub borrow_date: DateTime<Utc>,
    pub expected_return_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_return_date: Option<DateTime<Utc>>,
    pub status: BorrowStatus,
}

impl Borrow {
    pub fn is_active_for(&self, user_id: &str) -> bool {
        self.status == BorrowStatus::Active && self.user_id == user_id
    }
}

/// The catalog aggregate root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub isbn: String,
    pub category: Category,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    /// Copies currently available to borrow
    pub quantity: u32,
    #[serde(default)]
    pub borrow_records: Vec<Borrow>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// The user's active borrow, first in insertion order
    pub fn active_borrow(&self, user_id: &str) -> Option<&Borrow> {
        self.borrow_records.iter().find(|b| b.is_active_for(user_id))
    }

    pub fn active_borrow_count(&self) -> usize {
        self.borrow_records
            .iter()
            .filter(|b| b.status == BorrowStatus::Active)
            .count()
    }

    /// Available plus lent copies
    pub fn total_copies(&self) -> u64 {
        self.quantity as u64 + self.active_borrow_count() as u64
    }

    /// Refresh `updated_at` without ever moving it backwards
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

/// Input for creating a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub isbn: String,
    pub category: Category,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub quantity: i64,
}

//! Aggregate rules
//!
//! Pure functions from a book value to a new book value. Nothing here
//! touches storage or the clock; callers pass `now` in.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use super::book::{Book, BookId, Borrow, BorrowStatus, NewBook};
use super::errors::{RuleResult, RuleViolation};
use super::patch::{BookPatch, Patch};

fn check_price(price: f64) -> RuleResult<()> {
    if !price.is_finite() {
        return Err(RuleViolation::invalid("price", "must be a finite number"));
    }
    if price < 0.0 {
        return Err(RuleViolation::invalid("price", "must be a positive number"));
    }
    Ok(())
}

fn check_quantity(quantity: i64) -> RuleResult<u32> {
    if quantity < 0 {
        return Err(RuleViolation::invalid("quantity", "must be a positive number"));
    }
    u32::try_from(quantity)
        .map_err(|_| RuleViolation::invalid("quantity", format!("must not exceed {}", u32::MAX)))
}

fn check_required_text(field: &'static str, value: &str) -> RuleResult<()> {
    if value.trim().is_empty() {
        return Err(RuleViolation::invalid(field, "must not be empty"));
    }
    Ok(())
}

fn reject_null<T>(field: &'static str, patch: &Patch<T>) -> RuleResult<()> {
    if matches!(patch, Patch::Null) {
        return Err(RuleViolation::invalid(field, "cannot be null"));
    }
    Ok(())
}

/// Reject out-of-range or non-nullable-null values in a patch
pub fn validate_mutable_fields(patch: &BookPatch) -> RuleResult<()> {
    reject_null("title", &patch.title)?;
    reject_null("author", &patch.author)?;
    reject_null("isbn", &patch.isbn)?;
    reject_null("category", &patch.category)?;
    reject_null("description", &patch.description)?;
    reject_null("price", &patch.price)?;
    reject_null("quantity", &patch.quantity)?;

    if let Some(title) = patch.title.value() {
        check_required_text("title", title)?;
    }
    if let Some(author) = patch.author.value() {
        check_required_text("author", author)?;
    }
    if let Some(price) = patch.price.value() {
        check_price(*price)?;
    }
    if let Some(quantity) = patch.quantity.value() {
        check_quantity(*quantity)?;
    }
    Ok(())
}

/// Overwrite every supplied field of `book`.
///
/// `id` and `created_at` are never touched; `updated_at` moves to `now`
/// unless that would move it backwards.
pub fn apply_partial_update(
    book: &Book,
    patch: &BookPatch,
    now: DateTime<Utc>,
) -> RuleResult<Book> {
    validate_mutable_fields(patch)?;

    let mut next = book.clone();
    if let Some(title) = patch.title.value() {
        next.title = title.clone();
    }
    if let Some(author) = patch.author.value() {
        next.author = author.clone();
    }
    if let Some(isbn) = patch.isbn.value() {
        next.isbn = isbn.clone();
    }
    if let Some(category) = patch.category.value() {
        next.category = *category;
    }
    if let Some(description) = patch.description.value() {
        next.description = description.clone();
    }
    match &patch.cover_url {
        Patch::Absent => {}
        Patch::Null => next.cover_url = None,
        Patch::Value(url) => next.cover_url = Some(url.clone()),
    }
    if let Some(price) = patch.price.value() {
        next.price = *price;
    }
    if let Some(quantity) = patch.quantity.value() {
        next.quantity = check_quantity(*quantity)?;
    }

    next.touch(now);
    Ok(next)
}

fn check_user_id(user_id: &str) -> RuleResult<()> {
    check_required_text("userId", user_id)
}

/// Lend one copy to `user_id`
pub fn start_borrow(
    book: &Book,
    user_id: &str,
    now: DateTime<Utc>,
    loan_period: Duration,
) -> RuleResult<Book> {
    check_user_id(user_id)?;
    if book.quantity == 0 {
        return Err(RuleViolation::Unavailable);
    }
    if book.active_borrow(user_id).is_some() {
        return Err(RuleViolation::AlreadyBorrowed {
            user_id: user_id.to_string(),
        });
    }

    let expected_return_date = now
        .checked_add_signed(loan_period)
        .ok_or_else(|| RuleViolation::invalid("loanPeriod", "return date is out of range"))?;

    let mut next = book.clone();
    next.quantity -= 1;
    next.borrow_records.push(Borrow {
        user_id: user_id.to_string(),
        borrow_date: now,
        expected_return_date,
        actual_return_date: None,
        status: BorrowStatus::Active,
    });
    next.touch(now);
    Ok(next)
}

/// Take back the copy lent to `user_id`.
///
/// If the user somehow holds several active borrows, the earliest one
/// (insertion order) is closed.
pub fn complete_borrow(book: &Book, user_id: &str, now: DateTime<Utc>) -> RuleResult<Book> {
    check_user_id(user_id)?;

    let mut next = book.clone();
    let record = next
        .borrow_records
        .iter_mut()
        .find(|b| b.is_active_for(user_id))
        .ok_or_else(|| RuleViolation::NoActiveBorrow {
            user_id: user_id.to_string(),
        })?;

    record.status = BorrowStatus::Returned;
    record.actual_return_date = Some(now);
    next.quantity = next
        .quantity
        .checked_add(1)
        .ok_or_else(|| RuleViolation::invalid("quantity", "overflow on return"))?;
    next.touch(now);
    Ok(next)
}

/// Assemble a freshly created book
pub fn new_book(
    input: &NewBook,
    id: BookId,
    cover_url: Option<String>,
    now: DateTime<Utc>,
) -> RuleResult<Book> {
    check_required_text("title", &input.title)?;
    check_required_text("author", &input.author)?;
    check_price(input.price)?;
    let quantity = check_quantity(input.quantity)?;

    Ok(Book {
        id,
        title: input.title.clone(),
        author: input.author.clone(),
        isbn: input.isbn.clone(),
        category: input.category,
        cover_url,
        description: input.description.clone(),
        price: input.price,
        quantity,
        borrow_records: Vec::new(),
        created_at: now,
        updated_at: now,
    })
}

/// Users holding more than one active borrow, with their count
pub fn duplicate_active_borrows(book: &Book) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in &book.borrow_records {
        if record.status == BorrowStatus::Active {
            *counts.entry(record.user_id.as_str()).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(user, n)| (user.to_string(), n))
        .collect()
}

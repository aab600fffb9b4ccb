//! Book HTTP Routes
//!
//! Thin decoding layer over [`InventoryService`]. No invariant logic lives
//! here.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use super::errors::{ApiError, ApiResult};
use crate::catalog::{BookPatch, Category, NewBook};
use crate::cover_assets::{content_type_for, CoverError};
use crate::inventory::{BookListing, BookView, CoverUpload, InventoryError, InventoryService};

/// Multipart part holding the cover image
pub const COVER_FIELD: &str = "cover";

// ==================
// Shared State
// ==================

/// State shared across book handlers
pub struct LibraryState {
    pub inventory: InventoryService,
}

impl LibraryState {
    pub fn new(inventory: InventoryService) -> Self {
        Self { inventory }
    }
}

// ==================
// Request Types
// ==================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LendRequest {
    pub user_id: String,
}

/// Decoded multipart body
#[derive(Debug, Default)]
struct BookForm {
    fields: HashMap<String, String>,
    cover: Option<CoverUpload>,
}

impl BookForm {
    fn required(&self, name: &'static str) -> Result<&str, InventoryError> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| InventoryError::invalid(name, "is required"))
    }

    fn optional(&self, name: &str) -> String {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    fn new_book(&self) -> Result<NewBook, InventoryError> {
        let category = self
            .required("category")?
            .parse::<Category>()
            .map_err(|e| InventoryError::invalid("category", e))?;
        let price = self
            .required("price")?
            .parse::<f64>()
            .map_err(|_| InventoryError::invalid("price", "must be a number"))?;
        let quantity = self
            .required("quantity")?
            .parse::<i64>()
            .map_err(|_| InventoryError::invalid("quantity", "must be an integer"))?;

        Ok(NewBook {
            title: self.required("title")?.to_string(),
            author: self.required("author")?.to_string(),
            isbn: self.optional("isbn"),
            category,
            description: self.optional("description"),
            price,
            quantity,
        })
    }
}

async fn read_form(mut multipart: Multipart) -> ApiResult<BookForm> {
    let mut form = BookForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == COVER_FIELD {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            form.cover = Some(CoverUpload::new(data.to_vec(), content_type));
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            form.fields.insert(name, text);
        }
    }

    Ok(form)
}

fn parse_json<'a, T: Deserialize<'a>>(body: &'a [u8]) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(e.to_string()))
}

// ==================
// Book Routes
// ==================

/// Create book and cover asset routes
pub fn book_routes(state: Arc<LibraryState>) -> Router {
    Router::new()
        .route("/books", get(list_books_handler).post(create_book_handler))
        .route(
            "/books/:id",
            get(get_book_handler)
                .patch(update_book_handler)
                .delete(delete_book_handler),
        )
        .route("/books/:id/cover", put(replace_cover_handler))
        .route("/books/:id/borrow", post(borrow_handler))
        .route("/books/:id/return", post(return_handler))
        .route("/assets/*key", get(asset_handler))
        .with_state(state)
}

async fn list_books_handler(
    State(state): State<Arc<LibraryState>>,
) -> ApiResult<Json<BookListing>> {
    Ok(Json(state.inventory.list_all()?))
}

async fn create_book_handler(
    State(state): State<Arc<LibraryState>>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<BookView>)> {
    let form = read_form(multipart).await?;
    let input = form.new_book()?;
    let book = state.inventory.create(&input, form.cover)?;
    Ok((StatusCode::CREATED, Json(BookView::from(&book))))
}

async fn get_book_handler(
    State(state): State<Arc<LibraryState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<BookView>> {
    let book = state.inventory.get_by_id(&id)?;
    Ok(Json(BookView::from(&book)))
}

async fn update_book_handler(
    State(state): State<Arc<LibraryState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<BookView>> {
    let patch: BookPatch = parse_json(&body)?;
    let book = state.inventory.update(&id, &patch)?;
    Ok(Json(BookView::from(&book)))
}

async fn delete_book_handler(
    State(state): State<Arc<LibraryState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.inventory.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn replace_cover_handler(
    State(state): State<Arc<LibraryState>>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<BookView>> {
    let form = read_form(multipart).await?;
    let book = state.inventory.update_cover(&id, form.cover)?;
    Ok(Json(BookView::from(&book)))
}

async fn borrow_handler(
    State(state): State<Arc<LibraryState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<BookView>> {
    let request: LendRequest = parse_json(&body)?;
    let book = state.inventory.borrow(&id, &request.user_id)?;
    Ok(Json(BookView::from(&book)))
}

async fn return_handler(
    State(state): State<Arc<LibraryState>>,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<BookView>> {
    let request: LendRequest = parse_json(&body)?;
    let book = state.inventory.return_item(&id, &request.user_id)?;
    Ok(Json(BookView::from(&book)))
}

async fn asset_handler(
    State(state): State<Arc<LibraryState>>,
    Path(key): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let data = state.inventory.covers().read(&key).map_err(|e| match e {
        CoverError::ObjectNotFound(_) | CoverError::InvalidKey(_) => {
            ApiError::AssetNotFound(key.clone())
        }
        other => ApiError::Inventory(InventoryError::UploadFailure(other)),
    })?;

    Ok((
        [(header::CONTENT_TYPE, content_type_for(&key))],
        Bytes::from(data),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> BookForm {
        BookForm {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            cover: None,
        }
    }

    #[test]
    fn test_form_to_new_book() {
        let input = form(&[
            ("title", "Dune"),
            ("author", "Frank Herbert"),
            ("category", "Fiction"),
            ("price", " 9.99 "),
            ("quantity", "3"),
        ])
        .new_book()
        .unwrap();

        assert_eq!(input.title, "Dune");
        assert_eq!(input.category, Category::Fiction);
        assert_eq!(input.price, 9.99);
        assert_eq!(input.quantity, 3);
        assert_eq!(input.isbn, "");
    }

    #[test]
    fn test_form_rejects_bad_fields() {
        let base = [
            ("title", "Dune"),
            ("author", "Frank Herbert"),
            ("category", "Fiction"),
            ("price", "9.99"),
            ("quantity", "3"),
        ];

        for (field, bad) in [("category", "Cookbooks"), ("price", "cheap"), ("quantity", "2.5")] {
            let pairs: Vec<_> = base
                .iter()
                .map(|(k, v)| if *k == field { (*k, bad) } else { (*k, *v) })
                .collect();
            let err = form(&pairs).new_book().unwrap_err();
            assert!(
                matches!(err, InventoryError::InvalidArgument { field: ref f, .. } if f == field)
            );
        }

        let err = form(&base[1..]).new_book().unwrap_err();
        assert!(matches!(
            err,
            InventoryError::InvalidArgument { ref field, .. } if field == "title"
        ));
    }

    #[test]
    fn test_lend_request() {
        let request: LendRequest = parse_json(br#"{"userId": "userA"}"#).unwrap();
        assert_eq!(request.user_id, "userA");
        assert!(parse_json::<LendRequest>(b"{}").is_err());
    }
}

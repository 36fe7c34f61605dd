use super::{json_object, parse_id, AppState};
use crate::api::models::BookResponse;
use crate::auth::middleware::AuthUser;
use crate::core::error::Result;
use crate::core::filter::BookFilter;
use crate::core::validation::WriteMode;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

type JsonBody = std::result::Result<Json<Value>, JsonRejection>;

/// Handler for GET /api/books/ - List books
///
/// Query: `genre`, `author_id`, `search`, `ordering`.
pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<BookResponse>>> {
    let filter = BookFilter::from_params(&params)?;
    let books = state.book_service.list(&filter).await?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// Handler for POST /api/books/ - Create a book
pub async fn create_book(
    State(state): State<AppState>,
    user: AuthUser,
    body: JsonBody,
) -> Result<impl IntoResponse> {
    let payload = json_object(body)?;
    let book = state.book_service.create(&payload).await?;
    tracing::debug!(book_id = book.book.id, user_id = %user.id, username = %user.username, "Book created by user");
    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

/// Handler for GET /api/books/:id/
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BookResponse>> {
    let id = parse_id(&id, "Book")?;
    let book = state.book_service.get(id).await?;
    Ok(Json(BookResponse::from(book)))
}

/// Handler for PUT /api/books/:id/ - Full update
pub async fn replace_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonBody,
) -> Result<Json<BookResponse>> {
    update(state, &id, body, WriteMode::Replace).await
}

/// Handler for PATCH /api/books/:id/ - Partial update
pub async fn partial_update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonBody,
) -> Result<Json<BookResponse>> {
    update(state, &id, body, WriteMode::Partial).await
}

async fn update(state: AppState, raw_id: &str, body: JsonBody, mode: WriteMode) -> Result<Json<BookResponse>> {
    let id = parse_id(raw_id, "Book")?;
    state.book_service.get(id).await?;
    let payload = json_object(body)?;
    let book = state.book_service.update(id, &payload, mode).await?;
    Ok(Json(BookResponse::from(book)))
}

/// Handler for DELETE /api/books/:id/
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_id(&id, "Book")?;
    state.book_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

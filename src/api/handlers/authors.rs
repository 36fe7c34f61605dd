use super::{json_object, parse_id, AppState};
use crate::api::models::AuthorResponse;
use crate::core::error::Result;
use crate::core::validation::WriteMode;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

type JsonBody = std::result::Result<Json<Value>, JsonRejection>;

/// Handler for GET /api/authors/ - List all authors
pub async fn list_authors(State(state): State<AppState>) -> Result<Json<Vec<AuthorResponse>>> {
    let authors = state.author_service.list().await?;
    Ok(Json(authors.into_iter().map(AuthorResponse::from).collect()))
}

/// Handler for POST /api/authors/ - Create an author
pub async fn create_author(State(state): State<AppState>, body: JsonBody) -> Result<impl IntoResponse> {
    let payload = json_object(body)?;
    let author = state.author_service.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(AuthorResponse::from(author))))
}

/// Handler for GET /api/authors/:id/
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AuthorResponse>> {
    let id = parse_id(&id, "Author")?;
    let author = state.author_service.get(id).await?;
    Ok(Json(AuthorResponse::from(author)))
}

/// Handler for PUT /api/authors/:id/ - Full update
pub async fn replace_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonBody,
) -> Result<Json<AuthorResponse>> {
    update(state, &id, body, WriteMode::Replace).await
}

/// Handler for PATCH /api/authors/:id/ - Partial update
pub async fn partial_update_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: JsonBody,
) -> Result<Json<AuthorResponse>> {
    update(state, &id, body, WriteMode::Partial).await
}

async fn update(state: AppState, raw_id: &str, body: JsonBody, mode: WriteMode) -> Result<Json<AuthorResponse>> {
    let id = parse_id(raw_id, "Author")?;
    // Unknown ids are 404 whatever the body holds
    state.author_service.get(id).await?;
    let payload = json_object(body)?;
    let author = state.author_service.update(id, &payload, mode).await?;
    Ok(Json(AuthorResponse::from(author)))
}

/// Handler for DELETE /api/authors/:id/ - Delete an author and their books
pub async fn delete_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_id(&id, "Author")?;
    state.author_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

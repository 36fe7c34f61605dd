//! API routes
//!
//! Every collection and detail path answers with and without a trailing slash.

use crate::api::handlers::{
    create_author, create_book, delete_author, delete_book, get_author, get_book, health_check,
    list_authors, list_books, partial_update_author, partial_update_book, replace_author,
    replace_book, AppState,
};
use crate::api::middleware::{guarded, Guard};
use crate::auth::handlers::{login, register};
use axum::{
    routing::{get, post, MethodRouter},
    Router,
};

/// Register `method_router` at `path` and at `path` + `/`
fn both(router: Router<AppState>, path: &str, method_router: MethodRouter<AppState>) -> Router<AppState> {
    router
        .route(path, method_router.clone())
        .route(&format!("{}/", path), method_router)
}

/// Build the API routes
pub fn build_api_routes(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login));

    let mut author_routes = Router::new();
    author_routes = both(author_routes, "/api/authors", get(list_authors).post(create_author));
    author_routes = both(
        author_routes,
        "/api/authors/:id",
        get(get_author)
            .put(replace_author)
            .patch(partial_update_author)
            .delete(delete_author),
    );

    let book_detail_routes = both(
        Router::new(),
        "/api/books/:id",
        get(get_book)
            .put(replace_book)
            .patch(partial_update_book)
            .delete(delete_book),
    );

    // Listing and creating books share one guard list
    let book_collection_routes = guarded(
        both(Router::new(), "/api/books", get(list_books).post(create_book)),
        state.clone(),
        &[Guard::Authenticated],
    );

    public_routes
        .merge(author_routes)
        .merge(book_detail_routes)
        .merge(book_collection_routes)
        .with_state(state)
}

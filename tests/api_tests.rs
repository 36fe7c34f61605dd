//! Router-level tests for the library API over an in-memory database

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use library_api::{ApiServer, Config, DatabaseManager};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

fn test_app() -> Router {
    let config = Config::defaults().unwrap();
    let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
    ApiServer::build_router(&config, db)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login_token(app: &Router) -> String {
    let creds = json!({"username": "librarian", "password": "s3cret"});

    let (status, _) = send(app, Method::POST, "/api/auth/register", None, Some(creds.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(app, Method::POST, "/api/auth/login", None, Some(creds)).await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn create_author(app: &Router, name: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/authors/",
        None,
        Some(json!({"name": name, "bio": ""})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

async fn create_book(app: &Router, token: &str, payload: Value) -> Value {
    let (status, body) = send(app, Method::POST, "/api/books/", Some(token), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {}", body);
    body
}

fn book(author_id: i64, isbn: &str, title: &str, genre: Option<&str>, date: &str) -> Value {
    json!({
        "title": title,
        "author_id": author_id,
        "published_date": date,
        "isbn": isbn,
        "genre": genre,
    })
}

fn titles(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_author_and_book_scenario() {
    let app = test_app();
    let token = login_token(&app).await;

    let author = create_author(&app, "A. Author").await;
    assert_eq!(author, json!({"id": 1, "name": "A. Author", "bio": "", "book_count": 0}));

    let created = create_book(
        &app,
        &token,
        book(1, "1234567890123", "T", Some("drama"), "2020-01-01"),
    )
    .await;
    assert_eq!(
        created,
        json!({
            "id": 1,
            "title": "T",
            "author": {"id": 1, "name": "A. Author", "bio": "", "book_count": 1},
            "published_date": "2020-01-01",
            "published_year": 2020,
            "isbn": "1234567890123",
            "genre": "drama",
        })
    );

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/books/",
        Some(&token),
        Some(book(1, "123", "Short", None, "2020-01-01")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"isbn": ["ISBN must be exactly 13 characters"]}));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/books/",
        Some(&token),
        Some(book(1, "9999999999999", "Later", None, "2999-01-01")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"published_date": ["Published date cannot be in future"]}));

    let (status, body) = send(&app, Method::GET, "/api/books/?genre=drama", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body), vec!["T"]);

    let (status, body) = send(&app, Method::GET, "/api/books/?genre=comedy", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_book_collection_requires_token() {
    let app = test_app();
    create_author(&app, "A").await;

    let (status, body) = send(&app, Method::GET, "/api/books/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "AuthenticationError");

    // Rejected before the invalid body is looked at
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/books",
        None,
        Some(json!({"isbn": "1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/api/books/", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Token in the query string is accepted too
    let token = login_token(&app).await;
    let (status, _) = send(&app, Method::GET, &format!("/api/books/?token={}", token), None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_book_filters_search_and_ordering() {
    let app = test_app();
    let token = login_token(&app).await;
    create_author(&app, "First").await;
    create_author(&app, "Second").await;

    create_book(&app, &token, book(1, "1000000000001", "Dune Messiah", Some("scifi"), "1969-10-15")).await;
    create_book(&app, &token, book(1, "1000000000002", "Emma", Some("classic"), "1815-12-23")).await;
    create_book(&app, &token, book(2, "1000000000003", "Dune", Some("scifi"), "1965-08-01")).await;

    let (_, body) = send(&app, Method::GET, "/api/books/?genre=scifi&author_id=1", Some(&token), None).await;
    assert_eq!(titles(&body), vec!["Dune Messiah"]);

    let (_, body) = send(&app, Method::GET, "/api/books/?author_id=2", Some(&token), None).await;
    assert_eq!(titles(&body), vec!["Dune"]);

    let (_, body) = send(&app, Method::GET, "/api/books/?search=dune%20messiah", Some(&token), None).await;
    assert_eq!(titles(&body), vec!["Dune Messiah"]);

    let (_, body) = send(&app, Method::GET, "/api/books/?search=SCIFI&ordering=-title", Some(&token), None).await;
    assert_eq!(titles(&body), vec!["Dune Messiah", "Dune"]);

    let (_, body) = send(&app, Method::GET, "/api/books/?ordering=published_date", Some(&token), None).await;
    assert_eq!(titles(&body), vec!["Emma", "Dune", "Dune Messiah"]);

    // An empty genre does not restrict the listing
    let (status, body) = send(&app, Method::GET, "/api/books/?genre=&author_id=", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    // Unknown parameters and ordering fields are ignored
    let (status, body) = send(&app, Method::GET, "/api/books/?page=2&ordering=isbn", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (status, body) = send(&app, Method::GET, "/api/books/?author_id=abc", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"author_id": ["A valid integer is required."]}));
}

#[tokio::test]
async fn test_author_detail_lifecycle() {
    let app = test_app();
    let token = login_token(&app).await;
    create_author(&app, "Original").await;
    create_book(&app, &token, book(1, "1234567890123", "T", None, "2020-01-01")).await;

    let (status, body) = send(&app, Method::GET, "/api/authors/1", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["book_count"], 1);

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/authors/1/",
        None,
        Some(json!({"bio": "Writes things", "book_count": 99})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 1, "name": "Original", "bio": "Writes things", "book_count": 1}));

    let (status, body) = send(&app, Method::PUT, "/api/authors/1/", None, Some(json!({"bio": "x"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"name": ["This field is required."]}));

    let (status, body) = send(&app, Method::PUT, "/api/authors/1/", None, Some(json!({"name": "Renamed"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Renamed");
    assert_eq!(body["bio"], "Writes things");

    let (status, body) = send(&app, Method::GET, "/api/authors/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::DELETE, "/api/authors/1/", None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    // Books go with their author
    let (status, _) = send(&app, Method::GET, "/api/books/1/", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, "/api/authors/1/", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_book_detail_updates() {
    let app = test_app();
    let token = login_token(&app).await;
    create_author(&app, "A").await;
    create_author(&app, "B").await;
    create_book(&app, &token, book(1, "1234567890123", "T", Some("drama"), "2020-01-01")).await;
    create_book(&app, &token, book(1, "3210987654321", "U", None, "2021-05-05")).await;

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/books/1",
        None,
        Some(json!({"author_id": 2, "genre": null, "published_year": 1900})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["author"]["id"], 2);
    assert_eq!(body["author"]["book_count"], 1);
    assert_eq!(body["genre"], Value::Null);
    assert_eq!(body["published_year"], 2020);

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/books/1/",
        None,
        Some(json!({"isbn": "3210987654321", "author_id": 42})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "author_id": ["Invalid pk \"42\" - object does not exist."],
            "isbn": ["book with this isbn already exists."],
        })
    );

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/books/1/",
        None,
        Some(book(1, "1234567890123", "Renamed", Some("essay"), "2019-02-03")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Renamed");
    assert_eq!(body["published_year"], 2019);

    let (status, _) = send(&app, Method::DELETE, "/api/books/2", None, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app, Method::GET, "/api/authors/1/", None, None).await;
    assert_eq!(body["book_count"], 1);
}

#[tokio::test]
async fn test_not_found_and_malformed_requests() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/api/authors/abc/", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
    assert!(body["trace_id"].is_string());

    let (status, _) = send(&app, Method::GET, "/api/books/77", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::PATCH, "/api/books/77/", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, Method::POST, "/api/authors/", None, Some(json!(["A"]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidRequest");

    let (status, body) = send(&app, Method::POST, "/api/authors/", None, Some(json!({"name": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"name": ["This field may not be blank."]}));
}

#[tokio::test]
async fn test_registration_and_login_errors() {
    let app = test_app();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"username": "first", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let fields: Vec<&String> = body.as_object().unwrap().keys().collect();
    assert_eq!(fields, vec!["id", "username"]);

    login_token(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({"username": "librarian", "password": "other"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"username": ["A user with that username already exists."]}));

    let (status, body) = send(&app, Method::POST, "/api/auth/register", None, Some(json!({"username": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "password": ["This field is required."],
            "username": ["This field may not be blank."],
        })
    );

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"username": "librarian", "password": "wrong"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({"username": "nobody", "password": "s3cret"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

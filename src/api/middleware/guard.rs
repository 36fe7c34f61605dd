//! Per-route access guards
//!
//! A route group lists the guards it needs when it is registered:
//!
//! ```ignore
//! guarded(Router::new().route("/api/books/", get(list_books)), state, &[Guard::Authenticated])
//! ```
//!
//! Guards run in order before the handler, so a rejected caller never has
//! their body read or validated.

use crate::api::handlers::AppState;
use crate::auth::middleware::authenticate_request;
use crate::core::error::Result;
use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};

/// Named access check attached to a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Caller presents a valid token for an existing user
    Authenticated,
}

impl Guard {
    pub fn name(self) -> &'static str {
        match self {
            Guard::Authenticated => "authenticated",
        }
    }

    async fn check(self, state: &AppState, request: &mut Request) -> Result<()> {
        match self {
            Guard::Authenticated => authenticate_request(state, request).await.map(|_| ()),
        }
    }
}

/// Middleware running every guard of the route
pub async fn enforce(
    State((state, guards)): State<(AppState, &'static [Guard])>,
    mut request: Request,
    next: Next,
) -> Response {
    for guard in guards {
        if let Err(e) = guard.check(&state, &mut request).await {
            tracing::debug!(guard = guard.name(), uri = %request.uri(), "Guard rejected request");
            return e.into_response();
        }
    }

    next.run(request).await
}

/// Attach `guards` to every route currently in `router`
pub fn guarded(router: Router<AppState>, state: AppState, guards: &'static [Guard]) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state((state, guards), enforce))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{generate_token, hash_password};
    use crate::core::Config;
    use crate::db::models::User;
    use crate::db::DatabaseManager;
    use axum::{
        body::Body,
        http::{header, StatusCode},
        routing::get,
    };
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn test_state() -> AppState {
        let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
        AppState::new(db, &Config::defaults().unwrap().security)
    }

    fn app(state: AppState) -> Router {
        let open = Router::new().route("/open", get(|| async { "open" }));
        let closed = guarded(
            Router::new().route("/closed", get(|| async { "closed" })),
            state.clone(),
            &[Guard::Authenticated],
        );
        open.merge(closed).with_state(state)
    }

    async fn user_token(state: &AppState) -> String {
        let user = User {
            id: "user-1".to_string(),
            username: "reader".to_string(),
            password_hash: hash_password("pw").unwrap(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        state.user_repo.create(&user).await.unwrap();
        generate_token(&user.id, &state.jwt_secret, 1).unwrap()
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_unguarded_route_is_open() {
        let response = app(test_state()).oneshot(get_request("/open", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_rejected() {
        let response = app(test_state()).oneshot(get_request("/closed", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_admitted() {
        let state = test_state();
        let token = user_token(&state).await;

        let response = app(state).oneshot(get_request("/closed", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_token_for_unknown_user_rejected() {
        let state = test_state();
        let token = generate_token("ghost", &state.jwt_secret, 1).unwrap();

        let response = app(state).oneshot(get_request("/closed", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

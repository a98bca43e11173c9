use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use sqlx::SqlitePool;

use super::{resolve_actor, Actor};

/// The actor behind the current request.
///
/// Resolves the `session` cookie or `Authorization: Bearer` token against
/// the sessions table and falls back to GUEST, so read-only routes work for
/// anonymous visitors without a separate extractor. Authorization decisions
/// belong to the matrix in `forum::authz`, not here.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pool = SqlitePool::from_ref(state);

        let token = bearer_token(parts).or_else(|| session_cookie(parts));

        match resolve_actor(&pool, token.as_deref()).await {
            Ok(actor) => Ok(CurrentActor(actor)),
            Err(e) => {
                tracing::error!("Failed to resolve actor: {e}");
                Err((StatusCode::SERVICE_UNAVAILABLE, "Identity lookup failed").into_response())
            }
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn session_cookie(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get("cookie")
        .and_then(|h| h.to_str().ok())
        .and_then(|cookies| {
            cookies.split(';').find_map(|cookie| {
                let cookie = cookie.trim();
                cookie.strip_prefix("session=")
            })
        })
        .map(str::to_string)
}

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::AppState;
use crate::db::{
    Category, CategoryPatch, CategorySummary, NewCategory, NewTopic, Page, Post, ReportedItem,
    Topic, TopicPatch,
};
use crate::forum::{categories, moderation, posts, topics, ForumError, ResolveAction};
use crate::identity::CurrentActor;

/// Create the router with all routes. The calling layer (here: JSON over
/// HTTP) only resolves the actor and maps errors to status codes; every
/// rule lives in the forum core.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(health))
        // Categories
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            patch(update_category).delete(delete_category),
        )
        .route(
            "/categories/:id/topics",
            get(list_topics).post(create_topic),
        )
        // Topics
        .route(
            "/topics/:id",
            get(view_topic).patch(edit_topic).delete(delete_topic),
        )
        .route("/topics/:id/lock", post(lock_topic))
        .route("/topics/:id/pin", post(pin_topic))
        .route("/topics/:id/report", post(report_topic))
        .route("/topics/:id/resolve", post(resolve_topic))
        .route("/topics/:id/posts", get(list_posts).post(create_post))
        // Posts
        .route(
            "/posts/:id",
            get(get_post).patch(edit_post).delete(delete_post),
        )
        .route("/posts/:id/report", post(report_post))
        .route("/posts/:id/resolve", post(resolve_post))
        // Moderation
        .route("/moderation/reported", get(list_reported))
}

async fn health() -> &'static str {
    "OK"
}

// ========== Pagination ==========

#[derive(Debug, Deserialize)]
struct PageParams {
    page: Option<i64>,
    page_size: Option<i64>,
}

impl From<PageParams> for Page {
    fn from(params: PageParams) -> Self {
        let default = Page::default();
        Self {
            page: params.page.unwrap_or(default.page),
            page_size: params.page_size.unwrap_or(default.page_size),
        }
        .clamped()
    }
}

// ========== Categories ==========

async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategorySummary>>, ForumError> {
    let categories = categories::list_categories(state.db.pool()).await?;
    Ok(Json(categories))
}

async fn create_category(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(new): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>), ForumError> {
    let category = categories::create_category(state.db.pool(), &actor, new).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    CurrentActor(actor): CurrentActor,
    Json(patch): Json<CategoryPatch>,
) -> Result<Json<Category>, ForumError> {
    let category = categories::update_category(state.db.pool(), &actor, id, patch).await?;
    Ok(Json(category))
}

async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    CurrentActor(actor): CurrentActor,
) -> Result<StatusCode, ForumError> {
    categories::delete_category(state.db.pool(), &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ========== Topics ==========

async fn list_topics(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<Topic>>, ForumError> {
    let topics = topics::list_topics(state.db.pool(), category_id, params.into()).await?;
    Ok(Json(topics))
}

async fn create_topic(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
    CurrentActor(actor): CurrentActor,
    Json(new): Json<NewTopic>,
) -> Result<(StatusCode, Json<Topic>), ForumError> {
    let topic = topics::create_topic(state.db.pool(), &actor, category_id, new).await?;
    Ok((StatusCode::CREATED, Json(topic)))
}

/// Reading a topic is what a view is: this increments the counter.
async fn view_topic(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Topic>, ForumError> {
    let topic = topics::view_topic(state.db.pool(), id).await?;
    Ok(Json(topic))
}

async fn edit_topic(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    CurrentActor(actor): CurrentActor,
    Json(patch): Json<TopicPatch>,
) -> Result<Json<Topic>, ForumError> {
    let topic = topics::edit_topic(state.db.pool(), &actor, id, patch).await?;
    Ok(Json(topic))
}

async fn delete_topic(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    CurrentActor(actor): CurrentActor,
) -> Result<StatusCode, ForumError> {
    topics::delete_topic(state.db.pool(), &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct LockBody {
    locked: bool,
}

async fn lock_topic(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    CurrentActor(actor): CurrentActor,
    Json(body): Json<LockBody>,
) -> Result<StatusCode, ForumError> {
    topics::set_locked(state.db.pool(), &actor, id, body.locked).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct PinBody {
    pinned: bool,
}

async fn pin_topic(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    CurrentActor(actor): CurrentActor,
    Json(body): Json<PinBody>,
) -> Result<StatusCode, ForumError> {
    topics::set_pinned(state.db.pool(), &actor, id, body.pinned).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Default)]
struct ReportBody {
    reason: Option<String>,
}

async fn report_topic(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    CurrentActor(actor): CurrentActor,
    Json(body): Json<ReportBody>,
) -> Result<StatusCode, ForumError> {
    topics::report_topic(state.db.pool(), &actor, id, body.reason.as_deref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct ResolveBody {
    action: ResolveAction,
}

async fn resolve_topic(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    CurrentActor(actor): CurrentActor,
    Json(body): Json<ResolveBody>,
) -> Result<StatusCode, ForumError> {
    moderation::resolve_topic(state.db.pool(), &actor, id, body.action).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ========== Posts ==========

async fn list_posts(
    State(state): State<AppState>,
    Path(topic_id): Path<i64>,
) -> Result<Json<Vec<Post>>, ForumError> {
    let posts = posts::list_posts(state.db.pool(), topic_id).await?;
    Ok(Json(posts))
}

#[derive(Debug, Deserialize)]
struct PostBody {
    content: String,
}

async fn create_post(
    State(state): State<AppState>,
    Path(topic_id): Path<i64>,
    CurrentActor(actor): CurrentActor,
    Json(body): Json<PostBody>,
) -> Result<(StatusCode, Json<Post>), ForumError> {
    let post = posts::create_post(state.db.pool(), &actor, topic_id, &body.content).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Post>, ForumError> {
    let post = posts::get_post(state.db.pool(), id).await?;
    Ok(Json(post))
}

async fn edit_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    CurrentActor(actor): CurrentActor,
    Json(body): Json<PostBody>,
) -> Result<Json<Post>, ForumError> {
    let post = posts::edit_post(state.db.pool(), &actor, id, &body.content).await?;
    Ok(Json(post))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    CurrentActor(actor): CurrentActor,
) -> Result<StatusCode, ForumError> {
    posts::delete_post(state.db.pool(), &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn report_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    CurrentActor(actor): CurrentActor,
    Json(body): Json<ReportBody>,
) -> Result<StatusCode, ForumError> {
    posts::report_post(state.db.pool(), &actor, id, body.reason.as_deref()).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn resolve_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    CurrentActor(actor): CurrentActor,
    Json(body): Json<ResolveBody>,
) -> Result<StatusCode, ForumError> {
    moderation::resolve_post(state.db.pool(), &actor, id, body.action).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ========== Moderation ==========

async fn list_reported(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
    CurrentActor(actor): CurrentActor,
) -> Result<Json<Vec<ReportedItem>>, ForumError> {
    let items = moderation::list_reported(state.db.pool(), &actor, params.into()).await?;
    Ok(Json(items))
}

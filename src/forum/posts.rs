//! Post manager: replies within a topic, the lock gate, and the derived
//! counters on the parent topic.

use sqlx::SqlitePool;
use tracing::info;

use crate::constants::{POST_CONTENT_MAX, POST_CONTENT_MIN};
use crate::db::{self, Post};
use crate::identity::{Actor, Role};

use super::authz::{can_perform, Action, ResourceContext};
use super::error::ForumError;

/// Create a post in a topic. MEMBER and up; a locked topic only accepts
/// posts from MODERATOR and up.
///
/// The insert, the parent's `response_count` increment, and its
/// `updated_at` bump commit in one transaction, so no reader observes a
/// count that disagrees with the live posts.
///
/// # Errors
///
/// `Forbidden` per the matrix, `InvalidArgument` on malformed content,
/// `NotFound` when the topic is absent.
pub async fn create_post(
    pool: &SqlitePool,
    actor: &Actor,
    topic_id: i64,
    content: &str,
) -> Result<Post, ForumError> {
    validate_content(content)?;

    let topic = db::get_topic(pool, topic_id)
        .await?
        .ok_or(ForumError::NotFound("topic"))?;

    let res = ResourceContext {
        is_author: false,
        is_locked: topic.is_locked,
    };
    if !can_perform(actor, Action::CreatePost, res) {
        if actor.role >= Role::Member && topic.is_locked {
            return Err(ForumError::Forbidden("topic is locked"));
        }
        return Err(ForumError::Forbidden("member role required"));
    }

    let Some(post_id) = db::insert_post_in_topic(pool, topic_id, actor.id, content).await? else {
        // Topic deleted between the gate check and the commit.
        return Err(ForumError::NotFound("topic"));
    };

    info!(post_id, topic_id, author = actor.id, "Post created");

    db::get_post(pool, post_id)
        .await?
        .ok_or(ForumError::NotFound("post"))
}

/// Edit a post's body. Author or MODERATOR and up. Leaves the parent's
/// `response_count` and `updated_at` untouched.
///
/// # Errors
///
/// `NotFound` when absent, `Forbidden` per the matrix, `InvalidArgument`
/// on malformed content.
pub async fn edit_post(
    pool: &SqlitePool,
    actor: &Actor,
    post_id: i64,
    content: &str,
) -> Result<Post, ForumError> {
    validate_content(content)?;

    let post = db::get_post(pool, post_id)
        .await?
        .ok_or(ForumError::NotFound("post"))?;

    let res = ResourceContext::for_resource(actor, post.author_id, false);
    if !can_perform(actor, Action::EditPost, res) {
        return Err(ForumError::Forbidden("not the author or a moderator"));
    }

    let rows = db::update_post_content(pool, post_id, content).await?;
    if rows == 0 {
        return Err(ForumError::NotFound("post"));
    }

    db::get_post(pool, post_id)
        .await?
        .ok_or(ForumError::NotFound("post"))
}

/// Delete a post. Author or MODERATOR and up. Decrements the parent's
/// `response_count` in the same transaction; never deletes the topic.
///
/// # Errors
///
/// `NotFound` when absent, `Forbidden` per the matrix.
pub async fn delete_post(
    pool: &SqlitePool,
    actor: &Actor,
    post_id: i64,
) -> Result<(), ForumError> {
    let post = db::get_post(pool, post_id)
        .await?
        .ok_or(ForumError::NotFound("post"))?;

    let res = ResourceContext::for_resource(actor, post.author_id, false);
    if !can_perform(actor, Action::DeletePost, res) {
        return Err(ForumError::Forbidden("not the author or a moderator"));
    }

    if !db::delete_post_with_count(pool, post_id).await? {
        return Err(ForumError::NotFound("post"));
    }

    info!(post_id, actor = actor.id, "Post deleted");
    Ok(())
}

/// Flag a post for moderator review. Any MEMBER may report.
///
/// # Errors
///
/// `Forbidden` for guests, `NotFound` when the post is absent.
pub async fn report_post(
    pool: &SqlitePool,
    actor: &Actor,
    post_id: i64,
    reason: Option<&str>,
) -> Result<(), ForumError> {
    if !can_perform(actor, Action::ReportContent, ResourceContext::NONE) {
        return Err(ForumError::Forbidden("member role required"));
    }

    let rows = db::set_post_reported(pool, post_id, reason).await?;
    if rows == 0 {
        return Err(ForumError::NotFound("post"));
    }

    info!(post_id, reporter = actor.id, "Post reported");
    Ok(())
}

/// Fetch a post by id. Public read.
///
/// # Errors
///
/// `NotFound` when the id is absent.
pub async fn get_post(pool: &SqlitePool, post_id: i64) -> Result<Post, ForumError> {
    db::get_post(pool, post_id)
        .await?
        .ok_or(ForumError::NotFound("post"))
}

/// List a topic's posts in chronological thread order. Public read; an
/// absent topic yields an empty list.
pub async fn list_posts(pool: &SqlitePool, topic_id: i64) -> Result<Vec<Post>, ForumError> {
    db::list_posts(pool, topic_id).await
}

fn validate_content(content: &str) -> Result<(), ForumError> {
    let len = content.chars().count();
    if !(POST_CONTENT_MIN..=POST_CONTENT_MAX).contains(&len) {
        return Err(ForumError::invalid(format!(
            "post content must be {POST_CONTENT_MIN}-{POST_CONTENT_MAX} characters"
        )));
    }
    Ok(())
}

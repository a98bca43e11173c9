//! Topic lifecycle: creation, flag transitions, view accounting, cascade.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::constants::{
    SLUG_RETRY_LIMIT, TOPIC_CONTENT_MAX, TOPIC_CONTENT_MIN, TOPIC_TITLE_MAX, TOPIC_TITLE_MIN,
};
use crate::db::{self, NewTopic, Page, Topic, TopicPatch};
use crate::identity::Actor;

use super::authz::{can_perform, Action, ResourceContext};
use super::error::ForumError;
use super::slug;

/// What a moderator does with a reported topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveAction {
    /// Reset the reported flag and keep the content.
    Clear,
    /// Cascade-delete the content.
    Delete,
    /// Lock the topic and clear the report.
    Lock,
}

/// Create a topic in a category. MEMBER and up; the actor becomes the
/// author.
///
/// The slug is derived from the title. On a collision within the category
/// the insert is retried with deterministic `-2`, `-3`, ... suffixes; the
/// UNIQUE constraint arbitrates races, so concurrent creators with the same
/// title each end up with a distinct slug.
///
/// # Errors
///
/// `Forbidden` for guests, `InvalidArgument` on malformed fields,
/// `NotFound` when the category is absent, `Conflict` when no free slug is
/// found within the retry bound.
pub async fn create_topic(
    pool: &SqlitePool,
    actor: &Actor,
    category_id: i64,
    new: NewTopic,
) -> Result<Topic, ForumError> {
    if !can_perform(actor, Action::CreateTopic, ResourceContext::NONE) {
        return Err(ForumError::Forbidden("member role required"));
    }

    validate_title(&new.title)?;
    validate_content(&new.content)?;

    // The FK also covers this, but checking first gives the common case a
    // clean NotFound before slug work starts.
    if db::get_category(pool, category_id).await?.is_none() {
        return Err(ForumError::NotFound("category"));
    }

    let base = slug::slugify(&new.title);

    for attempt in 0..SLUG_RETRY_LIMIT {
        let candidate = slug::candidate(&base, attempt);
        match db::try_insert_topic(
            pool,
            category_id,
            actor.id,
            &new.title,
            &candidate,
            &new.content,
        )
        .await?
        {
            Some(id) => {
                info!(id, category_id, slug = %candidate, "Topic created");
                return db::get_topic(pool, id)
                    .await?
                    .ok_or(ForumError::NotFound("topic"));
            }
            None => {
                debug!(category_id, slug = %candidate, "Slug taken, retrying");
            }
        }
    }

    Err(ForumError::Conflict(format!(
        "no free slug for '{base}' after {SLUG_RETRY_LIMIT} attempts"
    )))
}

/// Record a view and return the topic. Detached from the authorization
/// matrix: any reader, including guests, triggers it. The increment is a
/// single atomic statement, so concurrent viewers never lose counts.
///
/// # Errors
///
/// `NotFound` when the topic is absent.
pub async fn view_topic(pool: &SqlitePool, topic_id: i64) -> Result<Topic, ForumError> {
    let rows = db::increment_topic_views(pool, topic_id).await?;
    if rows == 0 {
        return Err(ForumError::NotFound("topic"));
    }
    db::get_topic(pool, topic_id)
        .await?
        .ok_or(ForumError::NotFound("topic"))
}

/// Fetch a topic without view accounting. Public read.
///
/// # Errors
///
/// `NotFound` when the id is absent.
pub async fn get_topic(pool: &SqlitePool, topic_id: i64) -> Result<Topic, ForumError> {
    db::get_topic(pool, topic_id)
        .await?
        .ok_or(ForumError::NotFound("topic"))
}

/// Fetch a topic by its in-category slug. Public read.
///
/// # Errors
///
/// `NotFound` when absent.
pub async fn get_topic_by_slug(
    pool: &SqlitePool,
    category_id: i64,
    slug: &str,
) -> Result<Topic, ForumError> {
    db::get_topic_by_slug(pool, category_id, slug)
        .await?
        .ok_or(ForumError::NotFound("topic"))
}

/// Lock or unlock a topic. MODERATOR and up. Idempotent: setting the flag
/// to its current value is a no-op success.
///
/// # Errors
///
/// `Forbidden` below moderator, `NotFound` when the topic is absent.
pub async fn set_locked(
    pool: &SqlitePool,
    actor: &Actor,
    topic_id: i64,
    locked: bool,
) -> Result<(), ForumError> {
    if !can_perform(actor, Action::LockTopic, ResourceContext::NONE) {
        return Err(ForumError::Forbidden("moderator role required"));
    }

    let rows = db::set_topic_locked(pool, topic_id, locked).await?;
    if rows == 0 {
        return Err(ForumError::NotFound("topic"));
    }

    info!(topic_id, locked, "Topic lock state set");
    Ok(())
}

/// Pin or unpin a topic. MODERATOR and up. Idempotent.
///
/// # Errors
///
/// `Forbidden` below moderator, `NotFound` when the topic is absent.
pub async fn set_pinned(
    pool: &SqlitePool,
    actor: &Actor,
    topic_id: i64,
    pinned: bool,
) -> Result<(), ForumError> {
    if !can_perform(actor, Action::PinTopic, ResourceContext::NONE) {
        return Err(ForumError::Forbidden("moderator role required"));
    }

    let rows = db::set_topic_pinned(pool, topic_id, pinned).await?;
    if rows == 0 {
        return Err(ForumError::NotFound("topic"));
    }

    info!(topic_id, pinned, "Topic pin state set");
    Ok(())
}

/// Flag a topic for moderator review. Any MEMBER may report, including
/// non-authors; no moderation privilege required.
///
/// # Errors
///
/// `Forbidden` for guests, `NotFound` when the topic is absent.
pub async fn report_topic(
    pool: &SqlitePool,
    actor: &Actor,
    topic_id: i64,
    reason: Option<&str>,
) -> Result<(), ForumError> {
    if !can_perform(actor, Action::ReportContent, ResourceContext::NONE) {
        return Err(ForumError::Forbidden("member role required"));
    }

    let rows = db::set_topic_reported(pool, topic_id, reason).await?;
    if rows == 0 {
        return Err(ForumError::NotFound("topic"));
    }

    info!(topic_id, reporter = actor.id, "Topic reported");
    Ok(())
}

/// Resolve a reported topic. MODERATOR and up.
///
/// # Errors
///
/// `Forbidden` below moderator, `NotFound` when the topic is absent.
pub async fn resolve_topic_report(
    pool: &SqlitePool,
    actor: &Actor,
    topic_id: i64,
    action: ResolveAction,
) -> Result<(), ForumError> {
    if !can_perform(actor, Action::ResolveReport, ResourceContext::NONE) {
        return Err(ForumError::Forbidden("moderator role required"));
    }

    let rows = match action {
        ResolveAction::Clear => db::clear_topic_report(pool, topic_id).await?,
        ResolveAction::Delete => db::delete_topic(pool, topic_id).await?,
        ResolveAction::Lock => db::lock_topic_and_clear_report(pool, topic_id).await?,
    };

    if rows == 0 {
        return Err(ForumError::NotFound("topic"));
    }

    info!(topic_id, ?action, moderator = actor.id, "Topic report resolved");
    Ok(())
}

/// Edit a topic's title and/or content. The author may edit while the
/// topic is unlocked; moderators may edit regardless of lock. The slug is
/// never regenerated — stable URLs outlive title edits.
///
/// # Errors
///
/// `NotFound` when absent, `Forbidden` per the matrix, `InvalidArgument`
/// on malformed replacement fields.
pub async fn edit_topic(
    pool: &SqlitePool,
    actor: &Actor,
    topic_id: i64,
    patch: TopicPatch,
) -> Result<Topic, ForumError> {
    let topic = db::get_topic(pool, topic_id)
        .await?
        .ok_or(ForumError::NotFound("topic"))?;

    let res = ResourceContext::for_resource(actor, topic.author_id, topic.is_locked);
    if !can_perform(actor, Action::EditTopic, res) {
        return Err(ForumError::Forbidden("not the author, or topic is locked"));
    }

    if patch.title.is_none() && patch.content.is_none() {
        return Ok(topic);
    }

    let title = patch.title.unwrap_or(topic.title);
    let content = patch.content.unwrap_or(topic.content);
    validate_title(&title)?;
    validate_content(&content)?;

    let rows = db::update_topic_content(pool, topic_id, &title, &content).await?;
    if rows == 0 {
        return Err(ForumError::NotFound("topic"));
    }

    db::get_topic(pool, topic_id)
        .await?
        .ok_or(ForumError::NotFound("topic"))
}

/// Delete a topic and its posts. Author or MODERATOR and up.
///
/// # Errors
///
/// `NotFound` when absent, `Forbidden` per the matrix.
pub async fn delete_topic(
    pool: &SqlitePool,
    actor: &Actor,
    topic_id: i64,
) -> Result<(), ForumError> {
    let topic = db::get_topic(pool, topic_id)
        .await?
        .ok_or(ForumError::NotFound("topic"))?;

    let res = ResourceContext::for_resource(actor, topic.author_id, topic.is_locked);
    if !can_perform(actor, Action::DeleteTopic, res) {
        return Err(ForumError::Forbidden("not the author or a moderator"));
    }

    let rows = db::delete_topic(pool, topic_id).await?;
    if rows == 0 {
        return Err(ForumError::NotFound("topic"));
    }

    info!(topic_id, actor = actor.id, "Topic deleted (posts cascaded)");
    Ok(())
}

/// List a category's topics, pinned first, then by last activity. Public
/// read; an absent category yields an empty page, not an error.
pub async fn list_topics(
    pool: &SqlitePool,
    category_id: i64,
    page: Page,
) -> Result<Vec<Topic>, ForumError> {
    db::list_topics(pool, category_id, page.limit(), page.offset()).await
}

fn validate_title(title: &str) -> Result<(), ForumError> {
    let len = title.chars().count();
    if !(TOPIC_TITLE_MIN..=TOPIC_TITLE_MAX).contains(&len) {
        return Err(ForumError::invalid(format!(
            "topic title must be {TOPIC_TITLE_MIN}-{TOPIC_TITLE_MAX} characters"
        )));
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<(), ForumError> {
    let len = content.chars().count();
    if !(TOPIC_CONTENT_MIN..=TOPIC_CONTENT_MAX).contains(&len) {
        return Err(ForumError::invalid(format!(
            "topic content must be {TOPIC_CONTENT_MIN}-{TOPIC_CONTENT_MAX} characters"
        )));
    }
    Ok(())
}

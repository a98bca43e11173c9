//! Moderation queue: a read projection over reported content plus
//! dispatch into the managers. No independent state-transition logic lives
//! here — every resolution routes through the same gated operations as a
//! direct call.

use sqlx::SqlitePool;

use crate::db::{self, Page, ReportedItem};
use crate::identity::Actor;

use super::authz::{can_perform, Action, ResourceContext};
use super::error::ForumError;
use super::topics::{self, ResolveAction};
use super::posts;

/// List reported topics and posts, newest report first. MODERATOR and up.
///
/// # Errors
///
/// `Forbidden` below moderator.
pub async fn list_reported(
    pool: &SqlitePool,
    actor: &Actor,
    page: Page,
) -> Result<Vec<ReportedItem>, ForumError> {
    if !can_perform(actor, Action::ViewModerationQueue, ResourceContext::NONE) {
        return Err(ForumError::Forbidden("moderator role required"));
    }

    db::list_reported(pool, page.limit(), page.offset()).await
}

/// Resolve a reported topic; dispatches to the topic lifecycle manager.
///
/// # Errors
///
/// As [`topics::resolve_topic_report`].
pub async fn resolve_topic(
    pool: &SqlitePool,
    actor: &Actor,
    topic_id: i64,
    action: ResolveAction,
) -> Result<(), ForumError> {
    topics::resolve_topic_report(pool, actor, topic_id, action).await
}

/// Resolve a reported post. `Clear` resets the flag; `Delete` routes
/// through the post manager's gated delete. Posts have no lock state, so
/// `Lock` is rejected.
///
/// # Errors
///
/// `Forbidden` below moderator, `NotFound` when the post is absent,
/// `InvalidArgument` for `Lock`.
pub async fn resolve_post(
    pool: &SqlitePool,
    actor: &Actor,
    post_id: i64,
    action: ResolveAction,
) -> Result<(), ForumError> {
    if !can_perform(actor, Action::ResolveReport, ResourceContext::NONE) {
        return Err(ForumError::Forbidden("moderator role required"));
    }

    match action {
        ResolveAction::Clear => {
            let rows = db::clear_post_report(pool, post_id).await?;
            if rows == 0 {
                return Err(ForumError::NotFound("post"));
            }
            Ok(())
        }
        ResolveAction::Delete => posts::delete_post(pool, actor, post_id).await,
        ResolveAction::Lock => Err(ForumError::invalid("posts cannot be locked")),
    }
}

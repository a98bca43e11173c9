use sqlx::{Row, SqlitePool};

use super::models::{
    Category, CategorySummary, NewCategory, Post, ReportedItem, ReportedKind, Session, Topic,
};
use crate::forum::error::{is_foreign_key_violation, is_unique_violation, ForumError};

// ========== Categories ==========

/// Get a category by id.
pub async fn get_category(pool: &SqlitePool, id: i64) -> Result<Option<Category>, ForumError> {
    let category = sqlx::query_as("SELECT * FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(category)
}

/// Get a category by slug.
pub async fn get_category_by_slug(
    pool: &SqlitePool,
    slug: &str,
) -> Result<Option<Category>, ForumError> {
    let category = sqlx::query_as("SELECT * FROM categories WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    Ok(category)
}

/// Insert a new category, returning its id, or `None` when the name or slug
/// is already taken (UNIQUE constraint).
pub async fn insert_category(
    pool: &SqlitePool,
    category: &NewCategory,
) -> Result<Option<i64>, ForumError> {
    let result = sqlx::query(
        r"
        INSERT INTO categories (name, slug, description, display_order)
        VALUES (?, ?, ?, ?)
        ",
    )
    .bind(&category.name)
    .bind(&category.slug)
    .bind(&category.description)
    .bind(category.order)
    .execute(pool)
    .await;

    match result {
        Ok(r) => Ok(Some(r.last_insert_rowid())),
        Err(e) if is_unique_violation(&e) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Update a category's fields. Returns `Ok(Some(()))` on success, `Ok(None)`
/// when the new name or slug collides with another category.
pub async fn update_category(
    pool: &SqlitePool,
    id: i64,
    name: &str,
    slug: &str,
    description: &str,
    display_order: i64,
) -> Result<Option<u64>, ForumError> {
    let result = sqlx::query(
        r"
        UPDATE categories
        SET name = ?, slug = ?, description = ?, display_order = ?,
            updated_at = datetime('now')
        WHERE id = ?
        ",
    )
    .bind(name)
    .bind(slug)
    .bind(description)
    .bind(display_order)
    .bind(id)
    .execute(pool)
    .await;

    match result {
        Ok(r) => Ok(Some(r.rows_affected())),
        Err(e) if is_unique_violation(&e) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Delete a category. Topics and their posts go with it via the cascade
/// declared in the schema; SQLite applies it atomically with the delete.
pub async fn delete_category(pool: &SqlitePool, id: i64) -> Result<u64, ForumError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// List all categories with their live topic counts.
pub async fn list_categories(pool: &SqlitePool) -> Result<Vec<CategorySummary>, ForumError> {
    let categories = sqlx::query_as(
        r"
        SELECT c.id, c.name, c.slug, c.description, c.display_order,
               COUNT(t.id) AS topic_count, c.created_at, c.updated_at
        FROM categories c
        LEFT JOIN topics t ON t.category_id = c.id
        GROUP BY c.id
        ORDER BY c.display_order, c.name
        ",
    )
    .fetch_all(pool)
    .await?;
    Ok(categories)
}

// ========== Topics ==========

/// Get a topic by id.
pub async fn get_topic(pool: &SqlitePool, id: i64) -> Result<Option<Topic>, ForumError> {
    let topic = sqlx::query_as("SELECT * FROM topics WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(topic)
}

/// Get a topic by its slug within a category.
pub async fn get_topic_by_slug(
    pool: &SqlitePool,
    category_id: i64,
    slug: &str,
) -> Result<Option<Topic>, ForumError> {
    let topic = sqlx::query_as("SELECT * FROM topics WHERE category_id = ? AND slug = ?")
        .bind(category_id)
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    Ok(topic)
}

/// Try to insert a topic under the given slug.
///
/// Returns `None` when the `(category_id, slug)` pair is already taken, so
/// the caller can retry with the next disambiguated candidate. Uniqueness is
/// detected at commit time by the schema constraint, not pre-checked; the
/// check-then-act variant is racy under concurrent creation.
pub async fn try_insert_topic(
    pool: &SqlitePool,
    category_id: i64,
    author_id: i64,
    title: &str,
    slug: &str,
    content: &str,
) -> Result<Option<i64>, ForumError> {
    let result = sqlx::query(
        r"
        INSERT INTO topics (category_id, author_id, title, slug, content)
        VALUES (?, ?, ?, ?, ?)
        ",
    )
    .bind(category_id)
    .bind(author_id)
    .bind(title)
    .bind(slug)
    .bind(content)
    .execute(pool)
    .await;

    match result {
        Ok(r) => Ok(Some(r.last_insert_rowid())),
        Err(e) if is_unique_violation(&e) => Ok(None),
        Err(e) if is_foreign_key_violation(&e) => Err(ForumError::NotFound("category")),
        Err(e) => Err(e.into()),
    }
}

/// Atomically bump a topic's view counter.
///
/// Single-statement increment; a read-modify-write at the application layer
/// would lose counts under concurrent viewers. Returns the number of rows
/// touched (0 when the topic does not exist).
pub async fn increment_topic_views(pool: &SqlitePool, id: i64) -> Result<u64, ForumError> {
    let result = sqlx::query("UPDATE topics SET views = views + 1 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Set or clear a topic's locked flag.
pub async fn set_topic_locked(
    pool: &SqlitePool,
    id: i64,
    locked: bool,
) -> Result<u64, ForumError> {
    let result = sqlx::query("UPDATE topics SET is_locked = ? WHERE id = ?")
        .bind(locked)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Set or clear a topic's pinned flag.
pub async fn set_topic_pinned(
    pool: &SqlitePool,
    id: i64,
    pinned: bool,
) -> Result<u64, ForumError> {
    let result = sqlx::query("UPDATE topics SET is_pinned = ? WHERE id = ?")
        .bind(pinned)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Flag a topic as reported.
pub async fn set_topic_reported(
    pool: &SqlitePool,
    id: i64,
    reason: Option<&str>,
) -> Result<u64, ForumError> {
    let result = sqlx::query(
        r"
        UPDATE topics
        SET is_reported = 1, report_reason = ?, reported_at = datetime('now')
        WHERE id = ?
        ",
    )
    .bind(reason)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Clear a topic's reported flag.
pub async fn clear_topic_report(pool: &SqlitePool, id: i64) -> Result<u64, ForumError> {
    let result = sqlx::query(
        r"
        UPDATE topics
        SET is_reported = 0, report_reason = NULL, reported_at = NULL
        WHERE id = ?
        ",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Lock a topic and clear its report in one statement (the `LOCK`
/// resolution action).
pub async fn lock_topic_and_clear_report(pool: &SqlitePool, id: i64) -> Result<u64, ForumError> {
    let result = sqlx::query(
        r"
        UPDATE topics
        SET is_locked = 1, is_reported = 0, report_reason = NULL, reported_at = NULL
        WHERE id = ?
        ",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Update a topic's title and/or content. The slug is left untouched.
pub async fn update_topic_content(
    pool: &SqlitePool,
    id: i64,
    title: &str,
    content: &str,
) -> Result<u64, ForumError> {
    let result = sqlx::query(
        r"
        UPDATE topics
        SET title = ?, content = ?, updated_at = datetime('now')
        WHERE id = ?
        ",
    )
    .bind(title)
    .bind(content)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Delete a topic. Its posts cascade with it.
pub async fn delete_topic(pool: &SqlitePool, id: i64) -> Result<u64, ForumError> {
    let result = sqlx::query("DELETE FROM topics WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// List topics in a category, pinned first, then most recent activity.
///
/// The dual-key order is load-bearing: pinned topics surface above unpinned
/// ones regardless of recency. `id` only breaks ties between equal
/// second-granularity timestamps.
pub async fn list_topics(
    pool: &SqlitePool,
    category_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<Topic>, ForumError> {
    let topics = sqlx::query_as(
        r"
        SELECT * FROM topics
        WHERE category_id = ?
        ORDER BY is_pinned DESC, updated_at DESC, id DESC
        LIMIT ? OFFSET ?
        ",
    )
    .bind(category_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(topics)
}

/// Live count of posts referencing a topic.
pub async fn count_posts_for_topic(pool: &SqlitePool, topic_id: i64) -> Result<i64, ForumError> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE topic_id = ?")
        .bind(topic_id)
        .fetch_one(pool)
        .await?;
    Ok(row.0)
}

// ========== Posts ==========

/// Get a post by id.
pub async fn get_post(pool: &SqlitePool, id: i64) -> Result<Option<Post>, ForumError> {
    let post = sqlx::query_as("SELECT * FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(post)
}

/// Insert a post and maintain its topic's derived state in one transaction:
/// `response_count` goes up by one and `updated_at` records the activity.
///
/// Returns `None` when the topic vanished before the write committed, so no
/// reader ever observes a post whose topic is gone or a count that disagrees
/// with the live posts.
pub async fn insert_post_in_topic(
    pool: &SqlitePool,
    topic_id: i64,
    author_id: i64,
    content: &str,
) -> Result<Option<i64>, ForumError> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r"
        INSERT INTO posts (topic_id, author_id, content)
        VALUES (?, ?, ?)
        ",
    )
    .bind(topic_id)
    .bind(author_id)
    .bind(content)
    .execute(&mut *tx)
    .await;

    let post_id = match inserted {
        Ok(r) => r.last_insert_rowid(),
        Err(e) if is_foreign_key_violation(&e) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let updated = sqlx::query(
        r"
        UPDATE topics
        SET response_count = response_count + 1, updated_at = datetime('now')
        WHERE id = ?
        ",
    )
    .bind(topic_id)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        // Topic deleted between the insert and the counter bump; the
        // rollback on drop keeps the pair invisible.
        return Ok(None);
    }

    tx.commit().await?;
    Ok(Some(post_id))
}

/// Update a post's body. Does not touch the parent topic: an edit is not
/// new activity and never changes `response_count`.
pub async fn update_post_content(
    pool: &SqlitePool,
    id: i64,
    content: &str,
) -> Result<u64, ForumError> {
    let result = sqlx::query(
        r"
        UPDATE posts
        SET content = ?, updated_at = datetime('now')
        WHERE id = ?
        ",
    )
    .bind(content)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Delete a post and decrement its topic's `response_count` in the same
/// transaction. Returns `false` when the post was already gone.
pub async fn delete_post_with_count(pool: &SqlitePool, id: i64) -> Result<bool, ForumError> {
    let mut tx = pool.begin().await?;

    let deleted: Option<(i64,)> = sqlx::query_as(
        r"
        DELETE FROM posts WHERE id = ? RETURNING topic_id
        ",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some((topic_id,)) = deleted else {
        return Ok(false);
    };

    sqlx::query(
        r"
        UPDATE topics
        SET response_count = response_count - 1, updated_at = datetime('now')
        WHERE id = ?
        ",
    )
    .bind(topic_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(true)
}

/// Flag a post as reported.
pub async fn set_post_reported(
    pool: &SqlitePool,
    id: i64,
    reason: Option<&str>,
) -> Result<u64, ForumError> {
    let result = sqlx::query(
        r"
        UPDATE posts
        SET is_reported = 1, report_reason = ?, reported_at = datetime('now')
        WHERE id = ?
        ",
    )
    .bind(reason)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Clear a post's reported flag.
pub async fn clear_post_report(pool: &SqlitePool, id: i64) -> Result<u64, ForumError> {
    let result = sqlx::query(
        r"
        UPDATE posts
        SET is_reported = 0, report_reason = NULL, reported_at = NULL
        WHERE id = ?
        ",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// List a topic's posts in chronological thread order. Never reordered.
pub async fn list_posts(pool: &SqlitePool, topic_id: i64) -> Result<Vec<Post>, ForumError> {
    let posts = sqlx::query_as(
        r"
        SELECT * FROM posts
        WHERE topic_id = ?
        ORDER BY created_at ASC, id ASC
        ",
    )
    .bind(topic_id)
    .fetch_all(pool)
    .await?;
    Ok(posts)
}

// ========== Moderation queue ==========

/// Reported topics and posts merged into one queue, newest report first.
pub async fn list_reported(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> Result<Vec<ReportedItem>, ForumError> {
    let rows = sqlx::query(
        r"
        SELECT 'topic' AS kind, id, id AS topic_id, author_id,
               title AS summary, report_reason, reported_at
        FROM topics
        WHERE is_reported = 1
        UNION ALL
        SELECT 'post' AS kind, id, topic_id, author_id,
               substr(content, 1, 120) AS summary, report_reason, reported_at
        FROM posts
        WHERE is_reported = 1
        ORDER BY reported_at DESC
        LIMIT ? OFFSET ?
        ",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let kind: String = row.try_get("kind")?;
        let Some(kind) = ReportedKind::from_str(&kind) else {
            continue;
        };
        items.push(ReportedItem {
            kind,
            id: row.try_get("id")?,
            topic_id: row.try_get("topic_id")?,
            author_id: row.try_get("author_id")?,
            summary: row.try_get("summary")?,
            report_reason: row.try_get("report_reason")?,
            reported_at: row.try_get::<Option<String>, _>("reported_at")?.unwrap_or_default(),
        });
    }
    Ok(items)
}

// ========== Sessions ==========

/// Look up a session by its token.
pub async fn get_session_by_token(
    pool: &SqlitePool,
    token: &str,
) -> Result<Option<Session>, ForumError> {
    let session = sqlx::query_as("SELECT * FROM sessions WHERE token = ?")
        .bind(token)
        .fetch_optional(pool)
        .await?;
    Ok(session)
}

/// Provision a session row. Issuance belongs to the surrounding platform;
/// this exists as the seam it writes through (and for test fixtures).
pub async fn insert_session(
    pool: &SqlitePool,
    token: &str,
    actor_id: i64,
    role: &str,
    expires_at: &str,
) -> Result<i64, ForumError> {
    let result = sqlx::query(
        r"
        INSERT INTO sessions (token, actor_id, role, expires_at)
        VALUES (?, ?, ?, ?)
        ",
    )
    .bind(token)
    .bind(actor_id)
    .bind(role)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Record that a session was used.
pub async fn touch_session(pool: &SqlitePool, id: i64) -> Result<(), ForumError> {
    sqlx::query("UPDATE sessions SET last_used_at = datetime('now') WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Drop a session (expiry cleanup).
pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<(), ForumError> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(())
}

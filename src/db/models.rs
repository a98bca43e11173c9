use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// A forum category.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub display_order: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// A category annotated with its live topic count, for listings.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategorySummary {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub display_order: i64,
    pub topic_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// A discussion topic.
///
/// `updated_at` tracks last activity: it is bumped when a post is added or
/// removed, or when the topic's own content changes. `response_count` always
/// equals the live count of posts referencing the topic; it is maintained in
/// the same transaction as the post write and never trusted from input.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Topic {
    pub id: i64,
    pub category_id: i64,
    pub author_id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub is_pinned: bool,
    pub is_locked: bool,
    pub is_reported: bool,
    pub report_reason: Option<String>,
    pub reported_at: Option<String>,
    pub views: i64,
    pub response_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// A reply within a topic.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub topic_id: i64,
    pub author_id: i64,
    pub content: String,
    pub is_reported: bool,
    pub report_reason: Option<String>,
    pub reported_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A session row provisioned by the surrounding platform.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: i64,
    pub token: String,
    pub actor_id: i64,
    pub role: String,
    pub created_at: String,
    pub expires_at: String,
    pub last_used_at: Option<String>,
}

/// Data for creating a new category.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub description: String,
    #[serde(default)]
    pub order: i64,
}

/// Partial update for a category. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub order: Option<i64>,
}

/// Data for creating a new topic. The slug is derived from the title.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTopic {
    pub title: String,
    pub content: String,
}

/// Partial update for a topic. The slug is never regenerated: stable URLs
/// outlive title edits.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopicPatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// What kind of content a moderation-queue entry points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportedKind {
    Topic,
    Post,
}

impl ReportedKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Topic => "topic",
            Self::Post => "post",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "topic" => Some(Self::Topic),
            "post" => Some(Self::Post),
            _ => None,
        }
    }
}

/// One entry in the moderation queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportedItem {
    pub kind: ReportedKind,
    pub id: i64,
    /// For posts, the parent topic; for topics, the topic itself.
    pub topic_id: i64,
    pub author_id: i64,
    /// Topic title or post body excerpt.
    pub summary: String,
    pub report_reason: Option<String>,
    pub reported_at: String,
}

/// Pagination window for listings.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Page {
    pub page: i64,
    pub page_size: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Page {
    /// Clamp to sane bounds: page >= 1, 1 <= page_size <= `MAX_PAGE_SIZE`.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    #[must_use]
    pub fn limit(self) -> i64 {
        self.clamped().page_size
    }

    #[must_use]
    pub fn offset(self) -> i64 {
        let p = self.clamped();
        (p.page - 1) * p.page_size
    }
}

//! Category registry: identity, ordering, and topic-count aggregation.

use sqlx::SqlitePool;
use tracing::info;

use crate::constants::{
    CATEGORY_DESCRIPTION_MAX, CATEGORY_DESCRIPTION_MIN, CATEGORY_NAME_MAX, CATEGORY_NAME_MIN,
    SLUG_MAX, SLUG_MIN,
};
use crate::db::{self, Category, CategoryPatch, CategorySummary, NewCategory};
use crate::identity::Actor;

use super::authz::{can_perform, Action, ResourceContext};
use super::error::ForumError;
use super::slug::is_valid_slug;

/// Create a category. ADMIN only.
///
/// # Errors
///
/// `Forbidden` for non-admins, `InvalidArgument` on malformed fields,
/// `Conflict` when the name or slug is already taken.
pub async fn create_category(
    pool: &SqlitePool,
    actor: &Actor,
    new: NewCategory,
) -> Result<Category, ForumError> {
    if !can_perform(actor, Action::CreateCategory, ResourceContext::NONE) {
        return Err(ForumError::Forbidden("administrator role required"));
    }

    validate_name(&new.name)?;
    validate_slug(&new.slug)?;
    validate_description(&new.description)?;

    let Some(id) = db::insert_category(pool, &new).await? else {
        return Err(ForumError::Conflict(format!(
            "category name or slug already in use: {} / {}",
            new.name, new.slug
        )));
    };

    info!(id, slug = %new.slug, "Category created");

    db::get_category(pool, id)
        .await?
        .ok_or(ForumError::NotFound("category"))
}

/// Apply a partial update to a category. ADMIN only.
///
/// # Errors
///
/// `NotFound` when the id is absent, `Conflict` when a changed name or slug
/// collides with another category.
pub async fn update_category(
    pool: &SqlitePool,
    actor: &Actor,
    id: i64,
    patch: CategoryPatch,
) -> Result<Category, ForumError> {
    if !can_perform(actor, Action::UpdateCategory, ResourceContext::NONE) {
        return Err(ForumError::Forbidden("administrator role required"));
    }

    let existing = db::get_category(pool, id)
        .await?
        .ok_or(ForumError::NotFound("category"))?;

    let name = patch.name.unwrap_or(existing.name);
    let slug = patch.slug.unwrap_or(existing.slug);
    let description = patch.description.unwrap_or(existing.description);
    let order = patch.order.unwrap_or(existing.display_order);

    validate_name(&name)?;
    validate_slug(&slug)?;
    validate_description(&description)?;

    // The UNIQUE constraints re-check name/slug excluding this row (an
    // UPDATE does not conflict with the row's own values).
    let Some(rows) = db::update_category(pool, id, &name, &slug, &description, order).await?
    else {
        return Err(ForumError::Conflict(format!(
            "category name or slug already in use: {name} / {slug}"
        )));
    };

    if rows == 0 {
        return Err(ForumError::NotFound("category"));
    }

    db::get_category(pool, id)
        .await?
        .ok_or(ForumError::NotFound("category"))
}

/// Delete a category and, transactionally, every topic and post under it.
/// ADMIN only.
///
/// # Errors
///
/// `NotFound` when the id is absent.
pub async fn delete_category(pool: &SqlitePool, actor: &Actor, id: i64) -> Result<(), ForumError> {
    if !can_perform(actor, Action::DeleteCategory, ResourceContext::NONE) {
        return Err(ForumError::Forbidden("administrator role required"));
    }

    let rows = db::delete_category(pool, id).await?;
    if rows == 0 {
        return Err(ForumError::NotFound("category"));
    }

    info!(id, "Category deleted (topics and posts cascaded)");
    Ok(())
}

/// List all categories with live topic counts, ordered by display order
/// then name. Public read.
pub async fn list_categories(pool: &SqlitePool) -> Result<Vec<CategorySummary>, ForumError> {
    db::list_categories(pool).await
}

/// Fetch a category by id. Public read.
///
/// # Errors
///
/// `NotFound` when the id is absent.
pub async fn get_category(pool: &SqlitePool, id: i64) -> Result<Category, ForumError> {
    db::get_category(pool, id)
        .await?
        .ok_or(ForumError::NotFound("category"))
}

/// Fetch a category by slug. Public read.
///
/// # Errors
///
/// `NotFound` when the slug is absent.
pub async fn get_category_by_slug(pool: &SqlitePool, slug: &str) -> Result<Category, ForumError> {
    db::get_category_by_slug(pool, slug)
        .await?
        .ok_or(ForumError::NotFound("category"))
}

fn validate_name(name: &str) -> Result<(), ForumError> {
    let len = name.chars().count();
    if !(CATEGORY_NAME_MIN..=CATEGORY_NAME_MAX).contains(&len) {
        return Err(ForumError::invalid(format!(
            "category name must be {CATEGORY_NAME_MIN}-{CATEGORY_NAME_MAX} characters"
        )));
    }
    Ok(())
}

fn validate_slug(slug: &str) -> Result<(), ForumError> {
    let len = slug.chars().count();
    if !(SLUG_MIN..=SLUG_MAX).contains(&len) {
        return Err(ForumError::invalid(format!(
            "category slug must be {SLUG_MIN}-{SLUG_MAX} characters"
        )));
    }
    if !is_valid_slug(slug) {
        return Err(ForumError::invalid(
            "category slug must be lowercase kebab ([a-z0-9-]+)",
        ));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), ForumError> {
    let len = description.chars().count();
    if !(CATEGORY_DESCRIPTION_MIN..=CATEGORY_DESCRIPTION_MAX).contains(&len) {
        return Err(ForumError::invalid(format!(
            "category description must be {CATEGORY_DESCRIPTION_MIN}-{CATEGORY_DESCRIPTION_MAX} characters"
        )));
    }
    Ok(())
}

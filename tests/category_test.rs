//! Integration tests for the category registry.

use forum_engine::db::{Database, NewCategory, NewTopic, CategoryPatch, Page};
use forum_engine::forum::{categories, posts, topics, ForumError};
use forum_engine::identity::{Actor, Role};
use tempfile::TempDir;

async fn setup_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.sqlite");
    let db = Database::new(&db_path)
        .await
        .expect("Failed to create database");
    (db, temp_dir)
}

fn admin() -> Actor {
    Actor::new(100, Role::Admin)
}

fn member(id: i64) -> Actor {
    Actor::new(id, Role::Member)
}

fn new_category(name: &str, slug: &str) -> NewCategory {
    NewCategory {
        name: name.to_string(),
        slug: slug.to_string(),
        description: "Discussions about usability evaluation methods".to_string(),
        order: 0,
    }
}

#[tokio::test]
async fn test_create_category_requires_admin() {
    let (db, _temp_dir) = setup_db().await;

    let err = categories::create_category(db.pool(), &member(1), new_category("UX", "ux-methods"))
        .await
        .unwrap_err();
    assert!(matches!(err, ForumError::Forbidden(_)));

    let err = categories::create_category(db.pool(), &Actor::guest(), new_category("UX", "ux"))
        .await
        .unwrap_err();
    assert!(matches!(err, ForumError::Forbidden(_)));
}

#[tokio::test]
async fn test_create_and_get_category() {
    let (db, _temp_dir) = setup_db().await;

    let category =
        categories::create_category(db.pool(), &admin(), new_category("UX Research", "ux-research"))
            .await
            .expect("Failed to create category");

    assert_eq!(category.name, "UX Research");
    assert_eq!(category.slug, "ux-research");

    let by_slug = categories::get_category_by_slug(db.pool(), "ux-research")
        .await
        .expect("Failed to get by slug");
    assert_eq!(by_slug.id, category.id);
}

#[tokio::test]
async fn test_duplicate_name_or_slug_conflicts() {
    let (db, _temp_dir) = setup_db().await;

    categories::create_category(db.pool(), &admin(), new_category("Heuristics", "heuristics"))
        .await
        .unwrap();

    // Same slug, different name
    let err = categories::create_category(
        db.pool(),
        &admin(),
        new_category("Other Name", "heuristics"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ForumError::Conflict(_)));

    // Same name, different slug
    let err = categories::create_category(
        db.pool(),
        &admin(),
        new_category("Heuristics", "other-slug"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ForumError::Conflict(_)));
}

#[tokio::test]
async fn test_validation_rejects_malformed_fields() {
    let (db, _temp_dir) = setup_db().await;

    // Name too short
    let err = categories::create_category(db.pool(), &admin(), new_category("ab", "valid-slug"))
        .await
        .unwrap_err();
    assert!(matches!(err, ForumError::InvalidArgument(_)));

    // Slug with uppercase
    let err = categories::create_category(db.pool(), &admin(), new_category("Valid Name", "BAD"))
        .await
        .unwrap_err();
    assert!(matches!(err, ForumError::InvalidArgument(_)));

    // Description too short
    let mut cat = new_category("Valid Name", "valid-slug");
    cat.description = "short".to_string();
    let err = categories::create_category(db.pool(), &admin(), cat)
        .await
        .unwrap_err();
    assert!(matches!(err, ForumError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_update_category() {
    let (db, _temp_dir) = setup_db().await;

    let a = categories::create_category(db.pool(), &admin(), new_category("Alpha", "alpha"))
        .await
        .unwrap();
    categories::create_category(db.pool(), &admin(), new_category("Beta", "beta"))
        .await
        .unwrap();

    // Keeping its own slug is not a conflict
    let updated = categories::update_category(
        db.pool(),
        &admin(),
        a.id,
        CategoryPatch {
            name: Some("Alpha Renamed".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("Failed to update");
    assert_eq!(updated.name, "Alpha Renamed");
    assert_eq!(updated.slug, "alpha");

    // Taking another category's slug is
    let err = categories::update_category(
        db.pool(),
        &admin(),
        a.id,
        CategoryPatch {
            slug: Some("beta".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ForumError::Conflict(_)));

    // Absent id
    let err = categories::update_category(db.pool(), &admin(), 9999, CategoryPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ForumError::NotFound(_)));
}

#[tokio::test]
async fn test_list_categories_ordered_with_topic_counts() {
    let (db, _temp_dir) = setup_db().await;

    let mut second = new_category("Second", "second");
    second.order = 2;
    let mut first = new_category("First", "first");
    first.order = 1;

    categories::create_category(db.pool(), &admin(), second)
        .await
        .unwrap();
    let first = categories::create_category(db.pool(), &admin(), first)
        .await
        .unwrap();

    topics::create_topic(
        db.pool(),
        &member(1),
        first.id,
        NewTopic {
            title: "Evaluation plans".to_string(),
            content: "How do you structure longitudinal usability studies?".to_string(),
        },
    )
    .await
    .unwrap();

    let listed = categories::list_categories(db.pool())
        .await
        .expect("Failed to list");
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].slug, "first");
    assert_eq!(listed[0].topic_count, 1);
    assert_eq!(listed[1].slug, "second");
    assert_eq!(listed[1].topic_count, 0);
}

#[tokio::test]
async fn test_delete_category_cascades_to_topics_and_posts() {
    let (db, _temp_dir) = setup_db().await;
    let alice = member(1);

    let category = categories::create_category(db.pool(), &admin(), new_category("UX Lab", "ux-lab"))
        .await
        .unwrap();

    let topic = topics::create_topic(
        db.pool(),
        &alice,
        category.id,
        NewTopic {
            title: "Heurísticas".to_string(),
            content: "Nielsen's ten heuristics applied to mobile checkout flows".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!(topic.slug, "heuristicas");

    let post = posts::create_post(db.pool(), &alice, topic.id, "Agreed, severity ratings help.")
        .await
        .unwrap();

    categories::delete_category(db.pool(), &admin(), category.id)
        .await
        .expect("Failed to delete category");

    // No orphans: everything under the category reads as NotFound / empty.
    let err = topics::get_topic(db.pool(), topic.id).await.unwrap_err();
    assert!(matches!(err, ForumError::NotFound(_)));

    let err = posts::get_post(db.pool(), post.id).await.unwrap_err();
    assert!(matches!(err, ForumError::NotFound(_)));

    let listed = topics::list_topics(db.pool(), category.id, Page::default())
        .await
        .unwrap();
    assert!(listed.is_empty());

    // Deleting again is NotFound, not a silent no-op.
    let err = categories::delete_category(db.pool(), &admin(), category.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ForumError::NotFound(_)));
}

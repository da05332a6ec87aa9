//! End-to-end scenarios against an in-memory SQLite database.

use std::sync::Arc;

use serde_json::json;

use lariat_orm::{
    instance_from, ColumnDescriptor, ColumnType, Database, DatabaseHandle, EntityDescriptor,
    EntityManager, GenerationStrategy, ManyToManyLink, MetadataRegistry, OneToManyLink,
    OrderDirection, SchemaGenerator, SqliteDatabase, ToOneLink,
};

fn metadata() -> Arc<MetadataRegistry> {
    let registry = MetadataRegistry::new();
    registry.register(
        EntityDescriptor::new("Item")
            .with_identifier("id", GenerationStrategy::Auto)
            .with_column(ColumnDescriptor::new("name"))
            .with_column(
                ColumnDescriptor::new("ownerId")
                    .with_name("owner_id")
                    .with_type(ColumnType::Integer),
            ),
    );
    registry.register(
        EntityDescriptor::new("Owner")
            .with_identifier("id", GenerationStrategy::Auto)
            .with_column(ColumnDescriptor::new("name"))
            .with_one_to_many("items", OneToManyLink::to("Item").with_mapped_by("ownerId")),
    );
    registry.register(
        EntityDescriptor::new("User")
            .with_table("users")
            .with_identifier("id", GenerationStrategy::Auto)
            .with_column(ColumnDescriptor::new("name"))
            .with_many_to_many("roles", ManyToManyLink::to("Role")),
    );
    registry.register(
        EntityDescriptor::new("Role")
            .with_identifier("id", GenerationStrategy::Auto)
            .with_column(ColumnDescriptor::new("name")),
    );
    registry.register(
        EntityDescriptor::new("Post")
            .with_identifier("id", GenerationStrategy::Auto)
            .with_column(ColumnDescriptor::new("title"))
            .with_column(ColumnDescriptor::new("author_id").with_type(ColumnType::Integer))
            .with_many_to_one("author", ToOneLink::to("User")),
    );
    Arc::new(registry)
}

async fn database(metadata: &MetadataRegistry) -> DatabaseHandle {
    let db = SqliteDatabase::in_memory().await.unwrap();
    for statement in SchemaGenerator::new(metadata).create_all_sql().unwrap() {
        db.execute(&statement, &[]).await.unwrap();
    }
    Arc::new(db)
}

async fn manager() -> EntityManager {
    let metadata = metadata();
    let db = database(&metadata).await;
    EntityManager::new(db, metadata)
}

#[tokio::test]
async fn create_and_read_round_trip() {
    let manager = manager().await;

    let mut item = instance_from(json!({"name": "widget"}));
    manager.persist("Item", &mut item).await.unwrap();

    let id = item.get("id").and_then(|v| v.as_i64()).unwrap();
    assert!(id > 0);

    let found = manager.find("Item", json!(id)).await.unwrap().unwrap();
    assert_eq!(found.get("id"), Some(&json!(id)));
    assert_eq!(found.get("name"), Some(&json!("widget")));
}

#[tokio::test]
async fn find_returns_none_for_missing_rows() {
    let manager = manager().await;
    let missing = manager.find("Item", json!(12345)).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn one_to_many_resolves_through_mapped_by() {
    let manager = manager().await;

    let mut owner = instance_from(json!({"name": "ada"}));
    manager.persist("Owner", &mut owner).await.unwrap();
    let owner_id = owner.get("id").cloned().unwrap();

    let mut first = instance_from(json!({"name": "first", "ownerId": owner_id}));
    let mut second = instance_from(json!({"name": "second", "ownerId": owner_id}));
    let mut stray = instance_from(json!({"name": "stray", "ownerId": null}));
    manager.persist("Item", &mut first).await.unwrap();
    manager.persist("Item", &mut second).await.unwrap();
    manager.persist("Item", &mut stray).await.unwrap();

    let items = manager
        .resolver()
        .resolve("Owner", &owner, "items")
        .await
        .unwrap();
    let items = items.as_array().unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].get("name"), Some(&json!("first")));
    assert_eq!(items[1].get("name"), Some(&json!("second")));
}

#[tokio::test]
async fn many_to_many_resolves_through_the_bridge() {
    let manager = manager().await;
    let db = manager.database().clone();

    let mut user = instance_from(json!({"name": "grace"}));
    manager.persist("User", &mut user).await.unwrap();
    let user_id = user.get("id").cloned().unwrap();

    let mut admin = instance_from(json!({"name": "admin"}));
    let mut editor = instance_from(json!({"name": "editor"}));
    let mut unrelated = instance_from(json!({"name": "viewer"}));
    manager.persist("Role", &mut admin).await.unwrap();
    manager.persist("Role", &mut editor).await.unwrap();
    manager.persist("Role", &mut unrelated).await.unwrap();

    for role in [&admin, &editor] {
        db.execute(
            "INSERT INTO user_roles (user_id, role_id) VALUES (?, ?)",
            &[user_id.clone(), role.get("id").cloned().unwrap()],
        )
        .await
        .unwrap();
    }

    let roles = manager
        .resolver()
        .resolve("User", &user, "roles")
        .await
        .unwrap();
    let names: Vec<_> = roles
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r.get("name").cloned().unwrap())
        .collect();

    assert_eq!(names, vec![json!("admin"), json!("editor")]);
}

#[tokio::test]
async fn find_all_eagerly_populates_owning_to_one_links() {
    let manager = manager().await;

    let mut author = instance_from(json!({"name": "mary"}));
    manager.persist("User", &mut author).await.unwrap();
    let author_id = author.get("id").cloned().unwrap();

    let mut signed = instance_from(json!({"title": "signed", "author_id": author_id}));
    let mut anonymous = instance_from(json!({"title": "anonymous", "author_id": null}));
    manager.persist("Post", &mut signed).await.unwrap();
    manager.persist("Post", &mut anonymous).await.unwrap();

    let posts = manager.find_all("Post").await.unwrap();
    assert_eq!(posts.len(), 2);

    let with_author = posts
        .iter()
        .find(|p| p.get("title") == Some(&json!("signed")))
        .unwrap();
    assert_eq!(
        with_author.get("author").and_then(|a| a.get("name")),
        Some(&json!("mary"))
    );

    let without_author = posts
        .iter()
        .find(|p| p.get("title") == Some(&json!("anonymous")))
        .unwrap();
    assert_eq!(without_author.get("author"), Some(&json!(null)));
}

#[tokio::test]
async fn remove_deletes_the_row() {
    let manager = manager().await;

    let mut item = instance_from(json!({"name": "doomed"}));
    manager.persist("Item", &mut item).await.unwrap();
    let id = item.get("id").cloned().unwrap();

    manager.remove("Item", &item).await.unwrap();
    assert!(manager.find("Item", id).await.unwrap().is_none());
}

#[tokio::test]
async fn query_builder_runs_against_the_database() {
    let manager = manager().await;

    for name in ["alpha", "beta", "gamma"] {
        let mut item = instance_from(json!({"name": name}));
        manager.persist("Item", &mut item).await.unwrap();
    }

    let matches = manager
        .query("Item")
        .unwrap()
        .where_clause("name != ?", vec![json!("beta")])
        .order_by("name", OrderDirection::Desc)
        .limit(5)
        .get_many()
        .await
        .unwrap();

    let names: Vec<_> = matches.iter().map(|i| i.get("name").cloned().unwrap()).collect();
    assert_eq!(names, vec![json!("gamma"), json!("alpha")]);
}

#![allow(dead_code)]

use blog_server_service::repository::{
    PostRepository, PostStore, TagRepository, TagStore, new_post, new_tag,
};
use blog_server_service::sea_orm::{Database, DatabaseConnection};
use chrono::{DateTime, Duration, TimeZone, Utc};
use entity::{post, tag};
use migration::{Migrator, MigratorTrait};

pub async fn setup() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

/// 2021-01-22T00:00:00Z shifted by `minutes`.
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2021, 1, 22, 0, 0, 0).unwrap() + Duration::minutes(minutes)
}

pub async fn seed_post(db: &DatabaseConnection, title: &str, permalink: Option<&str>) -> post::Model {
    seed_post_at(db, title, permalink, at(0)).await
}

pub async fn seed_post_at(
    db: &DatabaseConnection,
    title: &str,
    permalink: Option<&str>,
    created_at: DateTime<Utc>,
) -> post::Model {
    let mut post = new_post("https://example.com/thumbnail.png", created_at);
    post.title = title.to_owned();
    post.permalink = permalink.map(str::to_owned);
    post.is_draft = permalink.is_none();
    PostStore::new(db).create(&post).await.unwrap();
    post
}

pub async fn seed_tag(db: &DatabaseConnection, name: &str) -> tag::Model {
    let tag = new_tag(name, Utc::now());
    TagStore::new(db).store(&tag).await.unwrap();
    tag
}

pub async fn tag_count(db: &DatabaseConnection) -> u64 {
    TagStore::new(db).count(&Default::default()).await.unwrap()
}

pub async fn linked_tag_names(db: &DatabaseConnection, post_id: &str) -> Vec<String> {
    TagStore::new(db)
        .find_by_post_id(post_id)
        .await
        .unwrap()
        .into_iter()
        .map(|tag| tag.name)
        .collect()
}

pub fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| (*name).to_owned()).collect()
}

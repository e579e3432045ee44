//! Store contracts used by the reconciliation service and the use cases,
//! together with their SeaORM implementations.
//!
//! Every store borrows a connection (`&C where C: ConnectionTrait`), so the
//! same store type works on a pooled [`sea_orm::DatabaseConnection`] and on a
//! [`sea_orm::DatabaseTransaction`].

mod post_store;
mod posts_tags_store;
mod tag_store;

pub use post_store::{ParsePostSortError, PostFilter, PostSort, PostSortColumn, PostStore};
pub use posts_tags_store::PostsTagsStore;
pub use tag_store::{TagFilter, TagStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use entity::{post, posts_tags, tag};
use sea_orm::{DbErr, SqlErr};

use crate::{Error, id};

/// Offset and size of a listing window. A `page_size` of zero means the whole
/// result set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub offset: u64,
    pub page_size: u64,
}

/// Largest offset or page size a backend accepts as a signed 64-bit bind value.
const MAX_WINDOW: u64 = i64::MAX as u64;

impl Page {
    /// One-based page number; page `0` is treated as the first page. `None`
    /// when the window does not fit a signed 64-bit offset.
    pub fn checked(page: u64, page_size: u64) -> Option<Self> {
        let offset = (page.max(1) - 1).checked_mul(page_size)?;
        if offset > MAX_WINDOW || page_size > MAX_WINDOW {
            return None;
        }
        Some(Self { offset, page_size })
    }

    /// Like [`Page::checked`], clamping an oversized window to the largest
    /// offset instead, which selects nothing.
    pub fn new(page: u64, page_size: u64) -> Self {
        Self::checked(page, page_size).unwrap_or(Self {
            offset: MAX_WINDOW,
            page_size: page_size.min(MAX_WINDOW),
        })
    }

    pub fn all() -> Self {
        Self::default()
    }
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<post::Model, Error>;

    async fn find_by_permalink(&self, permalink: &str) -> Result<post::Model, Error>;

    /// Fails with [`Error::PostNotFound`] when the window is empty.
    async fn find_all(
        &self,
        page: Page,
        filter: &PostFilter,
        sort: PostSort,
    ) -> Result<Vec<post::Model>, Error>;

    async fn count(&self, filter: &PostFilter) -> Result<u64, Error>;

    async fn create(&self, post: &post::Model) -> Result<(), Error>;

    async fn update(&self, post: post::Model) -> Result<post::Model, Error>;

    async fn delete(&self, id: &str) -> Result<(), Error>;
}

#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<tag::Model, Error>;

    async fn find_by_name(&self, name: &str) -> Result<tag::Model, Error>;

    /// Tags linked to a post, in association order.
    async fn find_by_post_id(&self, post_id: &str) -> Result<Vec<tag::Model>, Error>;

    /// Fails with [`Error::TagNotFound`] when the window is empty.
    async fn find_all(&self, page: Page, filter: &TagFilter) -> Result<Vec<tag::Model>, Error>;

    async fn count(&self, filter: &TagFilter) -> Result<u64, Error>;

    /// Fails with [`Error::TagAlreadyExisted`] on a name collision.
    async fn store(&self, tag: &tag::Model) -> Result<(), Error>;

    async fn delete(&self, id: &str) -> Result<(), Error>;
}

#[async_trait]
pub trait PostsTagsRepository: Send + Sync {
    async fn find_by_post_id_and_tag_name(
        &self,
        post_id: &str,
        tag_name: &str,
    ) -> Result<posts_tags::Model, Error>;

    /// Inserts the whole batch in one statement; either every row is written
    /// or none is. Fails with [`Error::PostsTagsAlreadyExisted`] when a pair
    /// is already linked.
    async fn store(&self, posts_tags: &[posts_tags::Model]) -> Result<(), Error>;

    /// Returns the number of removed rows; removing nothing is not an error.
    async fn delete_by_post_id(&self, post_id: &str) -> Result<u64, Error>;

    async fn delete_by_tag_id(&self, tag_id: &str) -> Result<u64, Error>;

    async fn delete(&self, id: &str) -> Result<(), Error>;
}

/// An untitled draft as created by `POST /posts`.
pub fn new_post(thumbnail_url: &str, now: DateTime<Utc>) -> post::Model {
    post::Model {
        id: id::generate(),
        title: String::new(),
        thumbnail_url: thumbnail_url.to_owned(),
        content: String::new(),
        permalink: None,
        is_draft: true,
        created_at: now,
        updated_at: now,
        published_at: None,
    }
}

pub fn new_tag(name: &str, now: DateTime<Utc>) -> tag::Model {
    tag::Model {
        id: id::generate(),
        name: name.to_owned(),
        created_at: now,
        updated_at: now,
    }
}

pub fn new_posts_tags(post_id: &str, tag_id: &str, now: DateTime<Utc>) -> posts_tags::Model {
    posts_tags::Model {
        id: id::generate(),
        post_id: post_id.to_owned(),
        tag_id: tag_id.to_owned(),
        created_at: now,
        updated_at: now,
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

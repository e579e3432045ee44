use std::str::FromStr;

use async_trait::async_trait;
use entity::{post, tag};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use thiserror::Error;

use super::{Page, PostRepository, is_unique_violation};
use crate::{Error, ResultExt};

/// Narrowing applied to post listings and counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub is_draft: Option<bool>,
    /// Exact tag name the post must be linked to.
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostSortColumn {
    CreatedAt,
    UpdatedAt,
    PublishedAt,
    Title,
}

impl PostSortColumn {
    fn column(self) -> post::Column {
        match self {
            Self::CreatedAt => post::Column::CreatedAt,
            Self::UpdatedAt => post::Column::UpdatedAt,
            Self::PublishedAt => post::Column::PublishedAt,
            Self::Title => post::Column::Title,
        }
    }
}

/// Listing order, written as the field name with an optional leading `-`
/// for descending order, e.g. `-createdAt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostSort {
    pub column: PostSortColumn,
    pub descending: bool,
}

impl Default for PostSort {
    fn default() -> Self {
        Self {
            column: PostSortColumn::CreatedAt,
            descending: true,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown sort key: {0}")]
pub struct ParsePostSortError(String);

impl FromStr for PostSort {
    type Err = ParsePostSortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, key) = match s.strip_prefix('-') {
            Some(key) => (true, key),
            None => (false, s),
        };
        let column = match key {
            "createdAt" => PostSortColumn::CreatedAt,
            "updatedAt" => PostSortColumn::UpdatedAt,
            "publishedAt" => PostSortColumn::PublishedAt,
            "title" => PostSortColumn::Title,
            _ => return Err(ParsePostSortError(s.to_owned())),
        };
        Ok(Self { column, descending })
    }
}

#[derive(Debug)]
pub struct PostStore<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> PostStore<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }
}

fn filtered(filter: &PostFilter) -> Select<post::Entity> {
    let mut select = post::Entity::find();
    if let Some(is_draft) = filter.is_draft {
        select = select.filter(post::Column::IsDraft.eq(is_draft));
    }
    if let Some(tag) = &filter.tag {
        // a post links a tag at most once, so the join yields no duplicates
        select = select
            .inner_join(tag::Entity)
            .filter(tag::Column::Name.eq(tag.as_str()));
    }
    select
}

#[async_trait]
impl<C: ConnectionTrait> PostRepository for PostStore<'_, C> {
    async fn find_by_id(&self, id: &str) -> Result<post::Model, Error> {
        post::Entity::find_by_id(id.to_owned())
            .one(self.db)
            .await
            .with_context(|| "find post")?
            .ok_or_else(|| Error::PostNotFound.context("find post"))
    }

    async fn find_by_permalink(&self, permalink: &str) -> Result<post::Model, Error> {
        post::Entity::find()
            .filter(post::Column::Permalink.eq(permalink))
            .one(self.db)
            .await
            .with_context(|| "find post")?
            .ok_or_else(|| Error::PostNotFound.context("find post"))
    }

    async fn find_all(
        &self,
        page: Page,
        filter: &PostFilter,
        sort: PostSort,
    ) -> Result<Vec<post::Model>, Error> {
        let order = if sort.descending {
            Order::Desc
        } else {
            Order::Asc
        };
        let mut select = filtered(filter)
            .order_by(sort.column.column(), order)
            .order_by_asc(post::Column::Id);
        if page.page_size > 0 {
            select = select.offset(page.offset).limit(page.page_size);
        }

        let posts = select
            .all(self.db)
            .await
            .with_context(|| "find all posts")?;
        if posts.is_empty() {
            return Err(Error::PostNotFound.context("find all posts"));
        }
        Ok(posts)
    }

    async fn count(&self, filter: &PostFilter) -> Result<u64, Error> {
        filtered(filter)
            .count(self.db)
            .await
            .with_context(|| "count posts")
    }

    async fn create(&self, post: &post::Model) -> Result<(), Error> {
        match post::Entity::insert(post.clone().into_active_model())
            .exec_without_returning(self.db)
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                Err(Error::PermalinkAlreadyExisted.context("create post"))
            }
            Err(err) => Err(Error::from(err).context("create post")),
        }
    }

    async fn update(&self, post: post::Model) -> Result<post::Model, Error> {
        match post.into_active_model().reset_all().update(self.db).await {
            Ok(post) => Ok(post),
            Err(DbErr::RecordNotUpdated) => Err(Error::PostNotFound.context("update post")),
            Err(err) if is_unique_violation(&err) => {
                Err(Error::PermalinkAlreadyExisted.context("update post"))
            }
            Err(err) => Err(Error::from(err).context("update post")),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), Error> {
        let res = post::Entity::delete_by_id(id.to_owned())
            .exec(self.db)
            .await
            .with_context(|| "delete post")?;
        if res.rows_affected == 0 {
            return Err(Error::PostNotFound.context("delete post"));
        }
        Ok(())
    }
}

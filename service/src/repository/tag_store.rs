use async_trait::async_trait;
use entity::{posts_tags, tag};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select,
};

use super::{Page, TagRepository, is_unique_violation};
use crate::{Error, ResultExt};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter {
    /// Substring the tag name must contain.
    pub name: Option<String>,
}

#[derive(Debug)]
pub struct TagStore<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> TagStore<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }
}

fn filtered(filter: &TagFilter) -> Select<tag::Entity> {
    let mut select = tag::Entity::find();
    if let Some(name) = &filter.name {
        select = select.filter(tag::Column::Name.contains(name));
    }
    select
}

#[async_trait]
impl<C: ConnectionTrait> TagRepository for TagStore<'_, C> {
    async fn find_by_id(&self, id: &str) -> Result<tag::Model, Error> {
        tag::Entity::find_by_id(id.to_owned())
            .one(self.db)
            .await
            .with_context(|| "find tag")?
            .ok_or_else(|| Error::TagNotFound.context("find tag"))
    }

    async fn find_by_name(&self, name: &str) -> Result<tag::Model, Error> {
        tag::Entity::find()
            .filter(tag::Column::Name.eq(name))
            .one(self.db)
            .await
            .with_context(|| "find tag")?
            .ok_or_else(|| Error::TagNotFound.context("find tag"))
    }

    async fn find_by_post_id(&self, post_id: &str) -> Result<Vec<tag::Model>, Error> {
        tag::Entity::find()
            .inner_join(posts_tags::Entity)
            .filter(posts_tags::Column::PostId.eq(post_id))
            .order_by_asc(posts_tags::Column::Id)
            .all(self.db)
            .await
            .with_context(|| format!("find tags post id={post_id}"))
    }

    async fn find_all(&self, page: Page, filter: &TagFilter) -> Result<Vec<tag::Model>, Error> {
        let mut select = filtered(filter).order_by_asc(tag::Column::Id);
        if page.page_size > 0 {
            select = select.offset(page.offset).limit(page.page_size);
        }

        let tags = select
            .all(self.db)
            .await
            .with_context(|| "find all tags")?;
        if tags.is_empty() {
            return Err(Error::TagNotFound.context("find all tags"));
        }
        Ok(tags)
    }

    async fn count(&self, filter: &TagFilter) -> Result<u64, Error> {
        filtered(filter)
            .count(self.db)
            .await
            .with_context(|| "count tags")
    }

    async fn store(&self, tag: &tag::Model) -> Result<(), Error> {
        match tag::Entity::insert(tag.clone().into_active_model())
            .exec_without_returning(self.db)
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                Err(Error::TagAlreadyExisted.context("create tag"))
            }
            Err(err) => Err(Error::from(err).context("create tag")),
        }
    }

    async fn delete(&self, id: &str) -> Result<(), Error> {
        let res = tag::Entity::delete_by_id(id.to_owned())
            .exec(self.db)
            .await
            .with_context(|| "delete tag")?;
        if res.rows_affected == 0 {
            return Err(Error::TagNotFound.context("delete tag"));
        }
        Ok(())
    }
}

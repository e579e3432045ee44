use async_trait::async_trait;
use entity::{posts_tags, tag};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter};

use super::{PostsTagsRepository, is_unique_violation};
use crate::{Error, ResultExt};

#[derive(Debug)]
pub struct PostsTagsStore<'a, C> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> PostsTagsStore<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }
}

#[async_trait]
impl<C: ConnectionTrait> PostsTagsRepository for PostsTagsStore<'_, C> {
    async fn find_by_post_id_and_tag_name(
        &self,
        post_id: &str,
        tag_name: &str,
    ) -> Result<posts_tags::Model, Error> {
        posts_tags::Entity::find()
            .inner_join(tag::Entity)
            .filter(posts_tags::Column::PostId.eq(post_id))
            .filter(tag::Column::Name.eq(tag_name))
            .one(self.db)
            .await
            .with_context(|| "find posts_tags")?
            .ok_or_else(|| Error::PostsTagsNotFound.context("find posts_tags"))
    }

    async fn store(&self, posts_tags: &[posts_tags::Model]) -> Result<(), Error> {
        if posts_tags.is_empty() {
            return Ok(());
        }
        let models = posts_tags
            .iter()
            .cloned()
            .map(IntoActiveModel::into_active_model);
        match posts_tags::Entity::insert_many(models)
            .exec_without_returning(self.db)
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if is_unique_violation(&err) => {
                Err(Error::PostsTagsAlreadyExisted.context("create posts_tags"))
            }
            Err(err) => Err(Error::from(err).context("create posts_tags")),
        }
    }

    async fn delete_by_post_id(&self, post_id: &str) -> Result<u64, Error> {
        let res = posts_tags::Entity::delete_many()
            .filter(posts_tags::Column::PostId.eq(post_id))
            .exec(self.db)
            .await
            .with_context(|| "delete posts_tags")?;
        Ok(res.rows_affected)
    }

    async fn delete_by_tag_id(&self, tag_id: &str) -> Result<u64, Error> {
        let res = posts_tags::Entity::delete_many()
            .filter(posts_tags::Column::TagId.eq(tag_id))
            .exec(self.db)
            .await
            .with_context(|| "delete posts_tags")?;
        Ok(res.rows_affected)
    }

    async fn delete(&self, id: &str) -> Result<(), Error> {
        let res = posts_tags::Entity::delete_by_id(id.to_owned())
            .exec(self.db)
            .await
            .with_context(|| "delete posts_tags")?;
        if res.rows_affected == 0 {
            return Err(Error::PostsTagsNotFound.context("delete posts_tags"));
        }
        Ok(())
    }
}

use chrono::Utc;
use entity::tag;
use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::repository::{
    Page, PostsTagsRepository, PostsTagsStore, TagFilter, TagRepository, TagStore, new_tag,
};
use crate::{Error, ResultExt};

#[derive(Debug, Clone)]
pub struct TagUseCase {
    db: DatabaseConnection,
}

impl TagUseCase {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn store_tag(&self, name: &str) -> Result<tag::Model, Error> {
        let tags = TagStore::new(&self.db);
        match tags.find_by_name(name).await {
            Ok(_) => {
                return Err(Error::TagAlreadyExisted.context(format!("store tag name={name}")));
            }
            Err(err) if matches!(err.root(), Error::TagNotFound) => {}
            Err(err) => return Err(err.context(format!("store tag name={name}"))),
        }

        let tag = new_tag(name, Utc::now());
        tags.store(&tag)
            .await
            .with_context(|| format!("store tag name={name}"))?;
        Ok(tag)
    }

    pub async fn get_tags(
        &self,
        page: Page,
        filter: &TagFilter,
    ) -> Result<(Vec<tag::Model>, u64), Error> {
        let tags = TagStore::new(&self.db);
        let found = tags
            .find_all(page, filter)
            .await
            .with_context(|| "get tags")?;
        let count = tags.count(filter).await.with_context(|| "count tags")?;
        Ok((found, count))
    }

    pub async fn get_tag(&self, id: &str) -> Result<tag::Model, Error> {
        TagStore::new(&self.db)
            .find_by_id(id)
            .await
            .with_context(|| format!("get tag id={id}"))
    }

    /// Delete a tag together with every association referencing it.
    pub async fn delete_tag(&self, id: &str) -> Result<(), Error> {
        let txn = self
            .db
            .begin()
            .await
            .with_context(|| "delete tag: begin transaction")?;
        PostsTagsStore::new(&txn)
            .delete_by_tag_id(id)
            .await
            .with_context(|| format!("delete tag id={id}"))?;
        TagStore::new(&txn)
            .delete(id)
            .await
            .with_context(|| format!("delete tag id={id}"))?;
        txn.commit().await.with_context(|| "delete tag: commit")?;
        Ok(())
    }
}

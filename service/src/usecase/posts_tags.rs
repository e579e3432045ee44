use sea_orm::DatabaseConnection;

use crate::repository::{PostsTagsRepository, PostsTagsStore};
use crate::{Error, ResultExt};

#[derive(Debug, Clone)]
pub struct PostsTagsUseCase {
    db: DatabaseConnection,
}

impl PostsTagsUseCase {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn delete_posts_tags(&self, id: &str) -> Result<(), Error> {
        PostsTagsStore::new(&self.db)
            .delete(id)
            .await
            .with_context(|| format!("delete posts_tags id={id}"))
    }
}

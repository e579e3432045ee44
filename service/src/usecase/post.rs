use chrono::Utc;
use entity::{post, tag};
use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::repository::{
    Page, PostFilter, PostRepository, PostSort, PostStore, PostsTagsRepository, PostsTagsStore,
    TagRepository, TagStore, new_post,
};
use crate::{Error, PostLocks, PostsTagsService, ResultExt};

/// Editable fields of a post as submitted by the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostForm {
    pub title: String,
    /// `None` keeps the current thumbnail.
    pub thumbnail_url: Option<String>,
    pub content: String,
    /// An empty permalink is stored as none.
    pub permalink: Option<String>,
    pub is_draft: bool,
}

#[derive(Debug, Clone)]
pub struct PostUseCase {
    db: DatabaseConnection,
    locks: PostLocks,
    default_thumbnail_url: String,
}

impl PostUseCase {
    pub fn new(db: DatabaseConnection, default_thumbnail_url: impl Into<String>) -> Self {
        Self {
            db,
            locks: PostLocks::new(),
            default_thumbnail_url: default_thumbnail_url.into(),
        }
    }

    /// Create an empty draft carrying the default thumbnail.
    pub async fn create_post(&self) -> Result<post::Model, Error> {
        let post = new_post(&self.default_thumbnail_url, Utc::now());
        PostStore::new(&self.db)
            .create(&post)
            .await
            .with_context(|| "store post")?;
        tracing::debug!(post_id = %post.id, "created draft");
        Ok(post)
    }

    /// Write the form onto the post and replace its tags, in one transaction.
    ///
    /// Updates of the same post are serialized; the first transition out of
    /// draft stamps `published_at`.
    pub async fn update_post(
        &self,
        id: &str,
        form: PostForm,
        tag_names: &[String],
    ) -> Result<(post::Model, Vec<tag::Model>), Error> {
        let _guard = self.locks.lock(id).await;
        let txn = self
            .db
            .begin()
            .await
            .with_context(|| "update post: begin transaction")?;
        let posts = PostStore::new(&txn);

        let mut post = posts
            .find_by_id(id)
            .await
            .with_context(|| format!("update post id={id}"))?;

        let permalink = form.permalink.filter(|permalink| !permalink.is_empty());
        if let Some(permalink) = &permalink {
            match posts.find_by_permalink(permalink).await {
                Ok(other) if other.id != id => {
                    return Err(Error::PermalinkAlreadyExisted
                        .context(format!("update post permalink={permalink}")));
                }
                Ok(_) => {}
                Err(err) if matches!(err.root(), Error::PostNotFound) => {}
                Err(err) => return Err(err.context(format!("update post permalink={permalink}"))),
            }
        }

        let now = Utc::now();
        if !form.is_draft && post.published_at.is_none() {
            post.published_at = Some(now);
        }
        post.title = form.title;
        if let Some(thumbnail_url) = form.thumbnail_url {
            post.thumbnail_url = thumbnail_url;
        }
        post.content = form.content;
        post.permalink = permalink;
        post.is_draft = form.is_draft;
        post.updated_at = now;

        let post = posts
            .update(post)
            .await
            .with_context(|| format!("update post id={id}"))?;
        let tags = PostsTagsService::with_connection(&txn)
            .link_post_tags(id, tag_names)
            .await
            .with_context(|| format!("update post id={id}"))?;

        txn.commit()
            .await
            .with_context(|| "update post: commit")?;
        Ok((post, tags))
    }

    /// A published or draft post with its tags, looked up by permalink.
    pub async fn get_post(&self, permalink: &str) -> Result<(post::Model, Vec<tag::Model>), Error> {
        let post = PostStore::new(&self.db)
            .find_by_permalink(permalink)
            .await
            .with_context(|| format!("get post permalink={permalink}"))?;
        let tags = TagStore::new(&self.db)
            .find_by_post_id(&post.id)
            .await
            .with_context(|| format!("get post tags id={}", post.id))?;
        Ok((post, tags))
    }

    /// One page of posts and the number of posts matching `filter`.
    pub async fn get_posts(
        &self,
        page: Page,
        filter: &PostFilter,
        sort: PostSort,
    ) -> Result<(Vec<post::Model>, u64), Error> {
        let posts = PostStore::new(&self.db);
        let found = posts
            .find_all(page, filter, sort)
            .await
            .with_context(|| "get posts")?;
        let count = posts.count(filter).await.with_context(|| "count posts")?;
        Ok((found, count))
    }

    pub async fn delete_post(&self, id: &str) -> Result<(), Error> {
        let _guard = self.locks.lock(id).await;
        let txn = self
            .db
            .begin()
            .await
            .with_context(|| "delete post: begin transaction")?;
        PostsTagsStore::new(&txn)
            .delete_by_post_id(id)
            .await
            .with_context(|| format!("delete post id={id}"))?;
        PostStore::new(&txn)
            .delete(id)
            .await
            .with_context(|| format!("delete post id={id}"))?;
        txn.commit()
            .await
            .with_context(|| "delete post: commit")?;
        Ok(())
    }
}

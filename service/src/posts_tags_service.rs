use std::collections::HashSet;

use chrono::{DateTime, Utc};
use entity::tag;
use sea_orm::{ConnectionTrait, TransactionTrait};

use crate::repository::{
    PostRepository, PostStore, PostsTagsRepository, PostsTagsStore, TagRepository, TagStore,
    new_posts_tags, new_tag,
};
use crate::{Error, ResultExt};

/// Reconciles the tag associations of a post with a requested list of names.
///
/// The service owns no state besides its three stores. It opens no
/// transaction of its own: run it on stores bound to a
/// [`sea_orm::DatabaseTransaction`] (see [`link_post_tags_in_transaction`])
/// to make the delete and the re-insert atomic.
#[derive(Debug)]
pub struct PostsTagsService<PT, P, T> {
    posts_tags_repository: PT,
    post_repository: P,
    tag_repository: T,
}

impl<PT, P, T> PostsTagsService<PT, P, T>
where
    PT: PostsTagsRepository,
    P: PostRepository,
    T: TagRepository,
{
    pub fn new(posts_tags_repository: PT, post_repository: P, tag_repository: T) -> Self {
        Self {
            posts_tags_repository,
            post_repository,
            tag_repository,
        }
    }

    /// Make the post's associations match `tag_names` exactly.
    ///
    /// Duplicate names collapse onto their first occurrence and the returned
    /// tags follow first-seen order. Unknown names become new tags, stored
    /// immediately and kept even if a later step fails. Every prior
    /// association is deleted before the new batch is written, so a failure
    /// after that point leaves the post without tags until the call is
    /// repeated.
    pub async fn link_post_tags(
        &self,
        post_id: &str,
        tag_names: &[String],
    ) -> Result<Vec<tag::Model>, Error> {
        self.post_repository
            .find_by_id(post_id)
            .await
            .with_context(|| format!("link post tags: get post id={post_id}"))?;

        let deleted = self
            .posts_tags_repository
            .delete_by_post_id(post_id)
            .await
            .with_context(|| format!("link post tags: delete post id={post_id}"))?;

        let tag_names = unique_tag_names(tag_names);
        let now = Utc::now();

        let mut tags = Vec::with_capacity(tag_names.len());
        let mut posts_tags = Vec::with_capacity(tag_names.len());
        for tag_name in tag_names {
            let tag = self
                .resolve_tag(tag_name, now)
                .await
                .with_context(|| format!("link post tags: tag name={tag_name}"))?;
            posts_tags.push(new_posts_tags(post_id, &tag.id, now));
            tags.push(tag);
        }

        if !posts_tags.is_empty() {
            self.posts_tags_repository
                .store(&posts_tags)
                .await
                .with_context(|| format!("link post tags: store posts_tags post id={post_id}"))?;
        }

        tracing::debug!(
            post_id,
            deleted,
            linked = posts_tags.len(),
            "reconciled post tags"
        );
        Ok(tags)
    }

    async fn resolve_tag(&self, tag_name: &str, now: DateTime<Utc>) -> Result<tag::Model, Error> {
        match self.tag_repository.find_by_name(tag_name).await {
            Ok(tag) => Ok(tag),
            Err(err) if matches!(err.root(), Error::TagNotFound) => {
                let tag = new_tag(tag_name, now);
                self.tag_repository.store(&tag).await?;
                tracing::debug!(tag_id = %tag.id, tag_name, "created tag");
                Ok(tag)
            }
            Err(err) => Err(err),
        }
    }
}

impl<'a, C> PostsTagsService<PostsTagsStore<'a, C>, PostStore<'a, C>, TagStore<'a, C>>
where
    C: ConnectionTrait,
{
    /// The service over SeaORM stores sharing one connection or transaction.
    pub fn with_connection(db: &'a C) -> Self {
        Self::new(
            PostsTagsStore::new(db),
            PostStore::new(db),
            TagStore::new(db),
        )
    }
}

/// Run [`PostsTagsService::link_post_tags`] inside a single transaction.
///
/// On any failure the transaction is rolled back: the previous associations
/// survive and no tag created along the way is kept.
pub async fn link_post_tags_in_transaction<C>(
    db: &C,
    post_id: &str,
    tag_names: &[String],
) -> Result<Vec<tag::Model>, Error>
where
    C: TransactionTrait,
{
    let txn = db
        .begin()
        .await
        .with_context(|| "link post tags: begin transaction")?;
    let tags = PostsTagsService::with_connection(&txn)
        .link_post_tags(post_id, tag_names)
        .await?;
    txn.commit()
        .await
        .with_context(|| "link post tags: commit")?;
    Ok(tags)
}

fn unique_tag_names(tag_names: &[String]) -> Vec<&str> {
    let mut seen = HashSet::with_capacity(tag_names.len());
    tag_names
        .iter()
        .map(String::as_str)
        .filter(|name| seen.insert(*name))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use entity::{post, posts_tags};
    use pretty_assertions::assert_eq;
    use sea_orm::DbErr;

    use super::*;
    use crate::repository::{Page, PostFilter, PostSort, TagFilter, new_post};

    #[derive(Debug, Default)]
    struct State {
        posts: Vec<post::Model>,
        tags: Vec<tag::Model>,
        posts_tags: Vec<posts_tags::Model>,
        fail_find_tag: Option<&'static str>,
        fail_store_tag: Option<&'static str>,
        fail_store_posts_tags: bool,
        tag_stores: usize,
        posts_tags_stores: usize,
    }

    #[derive(Debug, Clone, Default)]
    struct FakeDb(Arc<Mutex<State>>);

    impl FakeDb {
        fn with_post(post_id: &str) -> Self {
            let db = FakeDb::default();
            let mut post = new_post("https://example.com/thumbnail.png", Utc::now());
            post.id = post_id.to_owned();
            db.state().posts.push(post);
            db
        }

        fn state(&self) -> std::sync::MutexGuard<'_, State> {
            self.0.lock().unwrap()
        }

        fn add_tag(&self, id: &str, name: &str) {
            let mut tag = new_tag(name, Utc::now());
            tag.id = id.to_owned();
            self.state().tags.push(tag);
        }

        fn linked_tag_ids(&self, post_id: &str) -> Vec<String> {
            self.state()
                .posts_tags
                .iter()
                .filter(|pt| pt.post_id == post_id)
                .map(|pt| pt.tag_id.clone())
                .collect()
        }

        fn service(&self) -> PostsTagsService<FakeDb, FakeDb, FakeDb> {
            PostsTagsService::new(self.clone(), self.clone(), self.clone())
        }
    }

    fn unsupported<T>() -> Result<T, Error> {
        Err(Error::Db(DbErr::Custom("not supported by fake".to_owned())))
    }

    #[async_trait]
    impl PostRepository for FakeDb {
        async fn find_by_id(&self, id: &str) -> Result<post::Model, Error> {
            self.state()
                .posts
                .iter()
                .find(|p| p.id == id)
                .cloned()
                .ok_or(Error::PostNotFound)
        }

        async fn find_by_permalink(&self, _: &str) -> Result<post::Model, Error> {
            unsupported()
        }

        async fn find_all(
            &self,
            _: Page,
            _: &PostFilter,
            _: PostSort,
        ) -> Result<Vec<post::Model>, Error> {
            unsupported()
        }

        async fn count(&self, _: &PostFilter) -> Result<u64, Error> {
            unsupported()
        }

        async fn create(&self, _: &post::Model) -> Result<(), Error> {
            unsupported()
        }

        async fn update(&self, _: post::Model) -> Result<post::Model, Error> {
            unsupported()
        }

        async fn delete(&self, _: &str) -> Result<(), Error> {
            unsupported()
        }
    }

    #[async_trait]
    impl TagRepository for FakeDb {
        async fn find_by_id(&self, _: &str) -> Result<tag::Model, Error> {
            unsupported()
        }

        async fn find_by_name(&self, name: &str) -> Result<tag::Model, Error> {
            let state = self.state();
            if state.fail_find_tag == Some(name) {
                return Err(Error::Db(DbErr::Custom("connection reset".to_owned())));
            }
            state
                .tags
                .iter()
                .find(|t| t.name == name)
                .cloned()
                .ok_or_else(|| Error::TagNotFound.context("find tag"))
        }

        async fn find_by_post_id(&self, _: &str) -> Result<Vec<tag::Model>, Error> {
            unsupported()
        }

        async fn find_all(&self, _: Page, _: &TagFilter) -> Result<Vec<tag::Model>, Error> {
            unsupported()
        }

        async fn count(&self, _: &TagFilter) -> Result<u64, Error> {
            unsupported()
        }

        async fn store(&self, tag: &tag::Model) -> Result<(), Error> {
            let mut state = self.state();
            if state.fail_store_tag == Some(tag.name.as_str()) {
                return Err(Error::TagAlreadyExisted.context("create tag"));
            }
            state.tag_stores += 1;
            state.tags.push(tag.clone());
            Ok(())
        }

        async fn delete(&self, _: &str) -> Result<(), Error> {
            unsupported()
        }
    }

    #[async_trait]
    impl PostsTagsRepository for FakeDb {
        async fn find_by_post_id_and_tag_name(
            &self,
            _: &str,
            _: &str,
        ) -> Result<posts_tags::Model, Error> {
            unsupported()
        }

        async fn store(&self, posts_tags: &[posts_tags::Model]) -> Result<(), Error> {
            let mut state = self.state();
            if state.fail_store_posts_tags {
                return Err(Error::PostsTagsAlreadyExisted.context("create posts_tags"));
            }
            state.posts_tags_stores += 1;
            state.posts_tags.extend_from_slice(posts_tags);
            Ok(())
        }

        async fn delete_by_post_id(&self, post_id: &str) -> Result<u64, Error> {
            let mut state = self.state();
            let before = state.posts_tags.len();
            state.posts_tags.retain(|pt| pt.post_id != post_id);
            Ok((before - state.posts_tags.len()) as u64)
        }

        async fn delete_by_tag_id(&self, _: &str) -> Result<u64, Error> {
            unsupported()
        }

        async fn delete(&self, _: &str) -> Result<(), Error> {
            unsupported()
        }
    }

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_owned()).collect()
    }

    fn tag_names(tags: &[tag::Model]) -> Vec<&str> {
        tags.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn unique_tag_names_keeps_first_occurrence_order() {
        let input = names(&["go", "rust", "go", "sql", "rust"]);

        assert_eq!(unique_tag_names(&input), vec!["go", "rust", "sql"]);
        assert!(unique_tag_names(&[]).is_empty());
    }

    #[tokio::test]
    async fn links_existing_tags() {
        let db = FakeDb::with_post("p1");
        db.add_tag("t1", "a");
        db.add_tag("t2", "b");

        let tags = db
            .service()
            .link_post_tags("p1", &names(&["a", "b"]))
            .await
            .unwrap();

        assert_eq!(tag_names(&tags), vec!["a", "b"]);
        assert_eq!(db.linked_tag_ids("p1"), vec!["t1", "t2"]);
        assert_eq!(db.state().tag_stores, 0);
        assert_eq!(db.state().posts_tags_stores, 1);
    }

    #[tokio::test]
    async fn creates_missing_tags_and_dedups() {
        let db = FakeDb::with_post("p1");

        let tags = db
            .service()
            .link_post_tags("p1", &names(&["go", "rust", "go"]))
            .await
            .unwrap();

        assert_eq!(tag_names(&tags), vec!["go", "rust"]);
        let state = db.state();
        assert_eq!(state.tag_stores, 2);
        assert_eq!(state.posts_tags.len(), 2);
        assert!(state.posts_tags.iter().all(|pt| pt.post_id == "p1"));
        assert_eq!(state.posts_tags[0].tag_id, tags[0].id);
        assert_eq!(state.posts_tags[1].tag_id, tags[1].id);
    }

    #[tokio::test]
    async fn reuses_existing_tag_identifier() {
        let db = FakeDb::with_post("p1");
        db.add_tag("t1", "rust");

        let tags = db
            .service()
            .link_post_tags("p1", &names(&["rust"]))
            .await
            .unwrap();

        assert_eq!(tags[0].id, "t1");
        assert_eq!(db.state().tags.len(), 1);
        assert_eq!(db.linked_tag_ids("p1"), vec!["t1"]);
    }

    #[tokio::test]
    async fn replaces_previous_associations() {
        let db = FakeDb::with_post("p1");
        db.service()
            .link_post_tags("p1", &names(&["x", "y"]))
            .await
            .unwrap();

        let tags = db
            .service()
            .link_post_tags("p1", &names(&["z"]))
            .await
            .unwrap();

        assert_eq!(db.linked_tag_ids("p1"), vec![tags[0].id.clone()]);
        assert_eq!(tag_names(&tags), vec!["z"]);
    }

    #[tokio::test]
    async fn repeated_calls_resolve_the_same_tags() {
        let db = FakeDb::with_post("p1");
        let input = names(&["a", "b"]);

        let first = db.service().link_post_tags("p1", &input).await.unwrap();
        let second = db.service().link_post_tags("p1", &input).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(db.state().tags.len(), 2);
        assert_eq!(db.linked_tag_ids("p1").len(), 2);
    }

    #[tokio::test]
    async fn empty_input_clears_associations() {
        let db = FakeDb::with_post("p1");
        db.service()
            .link_post_tags("p1", &names(&["a"]))
            .await
            .unwrap();

        let tags = db.service().link_post_tags("p1", &[]).await.unwrap();

        assert!(tags.is_empty());
        assert!(db.linked_tag_ids("p1").is_empty());
        assert_eq!(db.state().posts_tags_stores, 1);
    }

    #[tokio::test]
    async fn missing_post_mutates_nothing() {
        let db = FakeDb::with_post("p1");
        db.service()
            .link_post_tags("p1", &names(&["a"]))
            .await
            .unwrap();

        let err = db
            .service()
            .link_post_tags("nonexistent-id", &names(&["b"]))
            .await
            .unwrap_err();

        assert!(matches!(err.root(), Error::PostNotFound));
        let state = db.state();
        assert_eq!(state.tags.len(), 1);
        assert_eq!(state.posts_tags.len(), 1);
    }

    #[tokio::test]
    async fn lookup_failure_aborts_and_keeps_created_tags() {
        let db = FakeDb::with_post("p1");
        db.add_tag("t0", "old");
        db.service()
            .link_post_tags("p1", &names(&["old"]))
            .await
            .unwrap();
        db.state().fail_find_tag = Some("b");

        let err = db
            .service()
            .link_post_tags("p1", &names(&["a", "b", "c"]))
            .await
            .unwrap_err();

        assert!(matches!(err.root(), Error::Db(DbErr::Custom(_))));
        assert!(err.to_string().contains("tag name=b"));
        let state = db.state();
        // "a" was created before the failure and stays
        assert!(state.tags.iter().any(|t| t.name == "a"));
        assert!(!state.tags.iter().any(|t| t.name == "c"));
        // associations were cleared and nothing new was written
        assert!(state.posts_tags.is_empty());
    }

    #[tokio::test]
    async fn tag_creation_failure_is_surfaced() {
        let db = FakeDb::with_post("p1");
        db.state().fail_store_tag = Some("dup");

        let err = db
            .service()
            .link_post_tags("p1", &names(&["dup"]))
            .await
            .unwrap_err();

        assert!(matches!(err.root(), Error::TagAlreadyExisted));
        assert!(err.is_already_existed());
        assert!(db.state().posts_tags.is_empty());
    }

    #[tokio::test]
    async fn batch_insert_failure_leaves_post_without_tags() {
        let db = FakeDb::with_post("p1");
        db.service()
            .link_post_tags("p1", &names(&["a"]))
            .await
            .unwrap();
        db.state().fail_store_posts_tags = true;

        let err = db
            .service()
            .link_post_tags("p1", &names(&["a", "b"]))
            .await
            .unwrap_err();

        assert!(matches!(err.root(), Error::PostsTagsAlreadyExisted));
        assert!(db.linked_tag_ids("p1").is_empty());
    }
}

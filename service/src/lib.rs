//! Post, tag and post-tag association logic for the blog backend.
//!
//! The heart of the crate is [`PostsTagsService`], which replaces the tag set
//! of a post with a caller supplied list of names. Storage is reached only
//! through the traits in [`repository`]; [`repository::PostStore`],
//! [`repository::TagStore`] and [`repository::PostsTagsStore`] implement them
//! on top of any SeaORM connection or transaction.

mod error;
pub mod id;
mod lock;
mod posts_tags_service;
pub mod repository;
pub mod usecase;

pub use error::{Error, ResultExt};
pub use lock::PostLocks;
pub use posts_tags_service::{PostsTagsService, link_post_tags_in_transaction};

pub use sea_orm;

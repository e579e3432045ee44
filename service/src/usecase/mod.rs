//! Application use cases behind the HTTP handlers.
//!
//! Each use case owns a pooled connection and opens a transaction wherever
//! more than one statement has to land together.

mod post;
mod posts_tags;
mod tag;

pub use post::{PostForm, PostUseCase};
pub use posts_tags::PostsTagsUseCase;
pub use tag::TagUseCase;

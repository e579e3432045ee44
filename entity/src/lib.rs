pub mod prelude;

pub mod post;
pub mod posts_tags;
pub mod tag;

pub use super::post::Entity as Post;
pub use super::posts_tags::Entity as PostsTags;
pub use super::tag::Entity as Tag;

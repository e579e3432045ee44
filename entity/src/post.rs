use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A blog entry. A freshly created post is an untitled draft without a
/// permalink; `published_at` is set the first time it leaves draft state.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub thumbnail_url: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    #[sea_orm(unique)]
    pub permalink: Option<String>,
    pub is_draft: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub published_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::posts_tags::Entity")]
    PostsTags,
}

impl Related<super::posts_tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostsTags.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::posts_tags::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::posts_tags::Relation::Post.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm_migration::prelude::*;

use super::m20210101_000001_create_posts_table::Posts;
use super::m20210101_000002_create_tags_table::Tags;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PostsTags::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PostsTags::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PostsTags::PostId).string().not_null())
                    .col(ColumnDef::new(PostsTags::TagId).string().not_null())
                    .col(
                        ColumnDef::new(PostsTags::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PostsTags::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-posts_tags-post_id")
                            .from(PostsTags::Table, PostsTags::PostId)
                            .to(Posts::Table, Posts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-posts_tags-tag_id")
                            .from(PostsTags::Table, PostsTags::TagId)
                            .to(Tags::Table, Tags::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // a post links a tag at most once
        manager
            .create_index(
                Index::create()
                    .name("idx-posts_tags-post_id-tag_id")
                    .table(PostsTags::Table)
                    .col(PostsTags::PostId)
                    .col(PostsTags::TagId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PostsTags::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum PostsTags {
    Table,
    Id,
    PostId,
    TagId,
    CreatedAt,
    UpdatedAt,
}

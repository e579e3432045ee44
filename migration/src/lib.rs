pub use sea_orm_migration::prelude::*;

mod m20210101_000001_create_posts_table;
mod m20210101_000002_create_tags_table;
mod m20210101_000003_create_posts_tags_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20210101_000001_create_posts_table::Migration),
            Box::new(m20210101_000002_create_tags_table::Migration),
            Box::new(m20210101_000003_create_posts_tags_table::Migration),
        ]
    }
}

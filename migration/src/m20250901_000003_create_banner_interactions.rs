use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum BannerInteractions {
    Table,
    Id,
    BannerId,
    UserId,
    Action,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BannerInteractions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BannerInteractions::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(BannerInteractions::BannerId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BannerInteractions::UserId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BannerInteractions::Action)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BannerInteractions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // no foreign key: the log outlives deleted banners
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_banner_interactions_banner")
                    .table(BannerInteractions::Table)
                    .col(BannerInteractions::BannerId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BannerInteractions::Table).to_owned())
            .await
    }
}

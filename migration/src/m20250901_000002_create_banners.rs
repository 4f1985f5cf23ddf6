use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Banners {
    Table,
    Id,
    Title,
    Message,
    BannerType,
    Status,
    TargetUsers,
    TargetTiers,
    StartDate,
    EndDate,
    IsDismissible,
    Priority,
    ActionText,
    ActionUrl,
    Views,
    Clicks,
    Dismissals,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Target lists are JSON arrays; an empty array means the banner is open to everyone.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Banners::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Banners::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Banners::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Banners::Message).text().not_null())
                    .col(
                        ColumnDef::new(Banners::BannerType)
                            .string_len(32)
                            .not_null()
                            .default("info"),
                    )
                    .col(
                        ColumnDef::new(Banners::Status)
                            .string_len(16)
                            .not_null()
                            .default("draft"),
                    )
                    .col(ColumnDef::new(Banners::TargetUsers).json().not_null())
                    .col(ColumnDef::new(Banners::TargetTiers).json().not_null())
                    .col(
                        ColumnDef::new(Banners::StartDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Banners::EndDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Banners::IsDismissible)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Banners::Priority)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Banners::ActionText).string_len(255).null())
                    .col(ColumnDef::new(Banners::ActionUrl).string_len(2048).null())
                    .col(
                        ColumnDef::new(Banners::Views)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Banners::Clicks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Banners::Dismissals)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Banners::CreatedBy).string_len(36).not_null())
                    .col(
                        ColumnDef::new(Banners::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Banners::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_banners_status")
                    .table(Banners::Table)
                    .col(Banners::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Banners::Table).to_owned())
            .await
    }
}

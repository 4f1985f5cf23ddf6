use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
pub enum Discounts {
    Table,
    Id,
    Name,
    Description,
    DiscountType,
    Value,
    TargetTiers,
    TargetUsers,
    StartDate,
    EndDate,
    UsageLimit,
    PerUserLimit,
    MinimumPurchase,
    IsActive,
    TotalUses,
    TotalRevenueImpact,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// `usage_limit` NULL means no global cap. Expiry is never persisted: it is
/// derived from `end_date` at query time.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Discounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Discounts::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Discounts::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Discounts::Description).text().null())
                    .col(
                        ColumnDef::new(Discounts::DiscountType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Discounts::Value).double().not_null())
                    .col(ColumnDef::new(Discounts::TargetTiers).json().not_null())
                    .col(ColumnDef::new(Discounts::TargetUsers).json().not_null())
                    .col(
                        ColumnDef::new(Discounts::StartDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Discounts::EndDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Discounts::UsageLimit).big_integer().null())
                    .col(
                        ColumnDef::new(Discounts::PerUserLimit)
                            .big_integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(Discounts::MinimumPurchase).double().null())
                    .col(
                        ColumnDef::new(Discounts::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Discounts::TotalUses)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Discounts::TotalRevenueImpact)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Discounts::CreatedBy)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Discounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Discounts::UpdatedAt)
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
                    .name("idx_discounts_is_active")
                    .table(Discounts::Table)
                    .col(Discounts::IsActive)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Discounts::Table).to_owned())
            .await
    }
}

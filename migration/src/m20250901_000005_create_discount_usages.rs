use sea_orm_migration::prelude::*;

use super::m20250901_000004_create_discounts::Discounts;

#[derive(DeriveIden)]
enum DiscountUsages {
    Table,
    Id,
    DiscountId,
    UserId,
    SequenceNumber,
    AppliedBy,
    AppliedAt,
    DiscountAmount,
    DiscountType,
    Forced,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// One row per application. `sequence_number` counts applications per
/// (discount, user) starting at 1 and is unique within that pair.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DiscountUsages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DiscountUsages::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DiscountUsages::DiscountId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiscountUsages::UserId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiscountUsages::SequenceNumber)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiscountUsages::AppliedBy)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiscountUsages::AppliedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiscountUsages::DiscountAmount)
                            .double()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiscountUsages::DiscountType)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DiscountUsages::Forced)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_discount_usages_discount")
                            .from(DiscountUsages::Table, DiscountUsages::DiscountId)
                            .to(Discounts::Table, Discounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_discount_usages_slot_unique")
                    .table(DiscountUsages::Table)
                    .col(DiscountUsages::DiscountId)
                    .col(DiscountUsages::UserId)
                    .col(DiscountUsages::SequenceNumber)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DiscountUsages::Table).to_owned())
            .await
    }
}

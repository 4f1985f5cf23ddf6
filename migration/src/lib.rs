pub use sea_orm_migration::prelude::*;

mod m20250901_000001_create_users;
mod m20250901_000002_create_banners;
mod m20250901_000003_create_banner_interactions;
mod m20250901_000004_create_discounts;
mod m20250901_000005_create_discount_usages;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_users::Migration),
            Box::new(m20250901_000002_create_banners::Migration),
            Box::new(m20250901_000003_create_banner_interactions::Migration),
            Box::new(m20250901_000004_create_discounts::Migration),
            Box::new(m20250901_000005_create_discount_usages::Migration),
        ]
    }
}

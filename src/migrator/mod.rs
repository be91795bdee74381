use sea_orm_migration::prelude::*;

mod m20261001_000001_create_accounts;
mod m20261001_000002_create_businesses;
mod m20261002_000001_create_queue_entries;
mod m20261005_000001_create_business_analytics;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_accounts::Migration),
            Box::new(m20261001_000002_create_businesses::Migration),
            Box::new(m20261002_000001_create_queue_entries::Migration),
            Box::new(m20261005_000001_create_business_analytics::Migration),
        ]
    }
}

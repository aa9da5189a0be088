//! Database migrations

use sea_orm_migration::prelude::*;

mod m20250301_000001_init_schema;
mod m20250315_000001_add_reporting_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_init_schema::Migration),
            Box::new(m20250315_000001_add_reporting_indexes::Migration),
        ]
    }
}

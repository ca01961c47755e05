pub use sea_orm_migration::prelude::*;

mod m20261017_090000_wallets;
mod m20261017_090100_cash_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261017_090000_wallets::Migration),
            Box::new(m20261017_090100_cash_logs::Migration),
        ]
    }
}

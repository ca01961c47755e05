use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CashLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CashLogs::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CashLogs::Location)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(CashLogs::Wallet).string().not_null())
                    .col(ColumnDef::new(CashLogs::Ts).string().not_null())
                    .col(ColumnDef::new(CashLogs::Kind).string().not_null())
                    .col(ColumnDef::new(CashLogs::Document).text().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-cash_logs-wallet-ts")
                    .table(CashLogs::Table)
                    .col(CashLogs::Wallet)
                    .col(CashLogs::Ts)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CashLogs::Table).to_owned())
            .await
    }
}

/// Append-only operation log. `location` is the unique key derived from the
/// commit timestamp and operation kind.
#[derive(Iden)]
pub enum CashLogs {
    Table,
    Id,
    Location,
    Wallet,
    Ts,
    Kind,
    Document,
}

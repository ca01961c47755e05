use clap::Parser;
use engine::{CommitQueue, SqliteStore};
use migration::{Migrator, MigratorTrait};
use settings::Database;

mod cli;
mod commands;
mod error;
mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = cli::Cli::parse();
    let settings = settings::Settings::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "cashbox={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let db = parse_database(&settings.database).await?;
    let store = SqliteStore::builder()
        .database(db)
        .wallet_ref(&settings.wallet.name)
        .currency(settings.currency())
        .build();
    tracing::debug!(wallet = %settings.wallet.name, "opened wallet store");

    let queue = CommitQueue::new(store);
    let output = commands::run(&queue, cli.command).await?;
    print!("{output}");

    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

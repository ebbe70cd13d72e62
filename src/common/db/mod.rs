use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DbConn, DbErr};

use crate::settings::types::Settings;

#[tracing::instrument(name = "Initializing database connection", skip(settings))]
pub async fn init_db(settings: &Settings) -> Result<DbConn, DbErr> {
    let mut options = ConnectOptions::new(settings.database.url.clone());
    options
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(settings.debug);
    if settings.database.url.contains(":memory:") {
        // Every pooled connection to an in-memory SQLite database opens its own database.
        options.max_connections(1).min_connections(1);
    }

    let db_conn = Database::connect(options).await?;
    Migrator::up(&db_conn, None).await?;
    tracing::event!(target: "backend", tracing::Level::DEBUG, "Database migrated.");
    Ok(db_conn)
}

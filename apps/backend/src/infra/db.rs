use std::str::FromStr;
use std::time::Duration;

use migration::{migrate, MigrationCommand};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, SqlxSqliteConnector};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

use crate::config::db::{db_url, DbKind, RuntimeEnv};
use crate::error::AppError;

/// Open a connection for `kind` without touching the schema.
///
/// In-memory SQLite is pinned to one pooled connection that never idles
/// out; every connection to `sqlite::memory:` is otherwise a separate,
/// empty database.
pub async fn connect_db(runtime: RuntimeEnv, kind: DbKind) -> Result<DatabaseConnection, AppError> {
    let url = db_url(runtime, kind)?;

    let conn = match kind {
        DbKind::SqliteMemory => {
            let opts = SqliteConnectOptions::from_str(&url)
                .map_err(|e| AppError::config(format!("invalid sqlite url: {e}")))?
                .foreign_keys(true);
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(opts)
                .await
                .map_err(|e| AppError::db(format!("sqlite memory pool: {e}")))?;
            SqlxSqliteConnector::from_sqlx_sqlite_pool(pool)
        }
        DbKind::SqliteFile | DbKind::Postgres => {
            let mut opts = ConnectOptions::new(url);
            opts.max_connections(if kind == DbKind::Postgres { 20 } else { 1 })
                .connect_timeout(Duration::from_secs(10))
                .sqlx_logging(false);
            Database::connect(opts).await?
        }
    };

    info!(db_kind = ?kind, runtime = ?runtime, "database connected");
    Ok(conn)
}

/// Connect and bring the schema up to date.
pub async fn bootstrap_db(runtime: RuntimeEnv, kind: DbKind) -> Result<DatabaseConnection, AppError> {
    let conn = connect_db(runtime, kind).await?;
    migrate(&conn, MigrationCommand::Up).await?;
    Ok(conn)
}

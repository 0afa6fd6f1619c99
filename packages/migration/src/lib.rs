pub use sea_orm_migration::prelude::*;
pub use sea_orm_migration::sea_orm;
pub use sea_orm_migration::sea_orm::{ConnectionTrait, DatabaseConnection};
use sea_orm_migration::sea_orm::{DatabaseBackend, Statement};

mod m20260301_000001_scene_coordination; // keep filename + module name in sync

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20260301_000001_scene_coordination::Migration)]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationCommand {
    Up,
    Down,
    Fresh,
    Reset,
    Refresh,
    Status,
}

/// Run a migration command against an open connection.
///
/// Shared by the CLI and by application/test bootstrap, so neither has to
/// re-parse environment configuration.
pub async fn migrate(db: &DatabaseConnection, command: MigrationCommand) -> Result<(), DbErr> {
    let before = describe(db).await?;
    tracing::info!(
        backend = %before.backend,
        database = %before.name,
        applied = before.applied,
        defined = before.defined,
        ?command,
        "running migration command"
    );

    let result = match command {
        MigrationCommand::Up => Migrator::up(db, None).await,
        MigrationCommand::Down => Migrator::down(db, None).await,
        MigrationCommand::Fresh => Migrator::fresh(db).await,
        MigrationCommand::Reset => Migrator::reset(db).await,
        MigrationCommand::Refresh => Migrator::refresh(db).await,
        MigrationCommand::Status => Migrator::status(db).await,
    };

    match result {
        Ok(()) => {
            if command != MigrationCommand::Status {
                let after = describe(db).await?;
                tracing::info!(applied = after.applied, ?command, "migration command finished");
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, ?command, backend = %before.backend, "migration command failed");
            Err(e)
        }
    }
}

struct DbDescription {
    backend: String,
    name: String,
    applied: usize,
    defined: usize,
}

async fn describe(db: &DatabaseConnection) -> Result<DbDescription, DbErr> {
    let backend = db.get_database_backend();
    let sql = match backend {
        DatabaseBackend::Postgres => Some("select current_database() as name"),
        DatabaseBackend::Sqlite => {
            Some("SELECT file AS name FROM pragma_database_list WHERE name = 'main'")
        }
        _ => None,
    };

    let mut name = "<unsupported>".to_string();
    if let Some(sql) = sql {
        let row = db
            .query_one(Statement::from_string(backend, sql.to_string()))
            .await?;
        name = row
            .and_then(|r| r.try_get::<String>("", "name").ok())
            .map(|n| if n.is_empty() { ":memory:".to_string() } else { n })
            .unwrap_or_else(|| "<unknown>".to_string());
    }

    Ok(DbDescription {
        backend: format!("{backend:?}"),
        name,
        applied: count_applied_migrations(db).await?,
        defined: Migrator::migrations().len(),
    })
}

/// Number of applied migrations; 0 before the bookkeeping table exists.
pub async fn count_applied_migrations(db: &DatabaseConnection) -> Result<usize, DbErr> {
    match Migrator::get_applied_migrations(db).await {
        Ok(migrations) => Ok(migrations.len()),
        Err(DbErr::Exec(_)) => Ok(0),
        Err(e) => Err(e),
    }
}

use std::env;
use std::str::FromStr;

use crate::error::AppError;

/// Which environment the process runs in. Test enforces database naming
/// rules so a test run can never point at production data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEnv {
    Prod,
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    Postgres,
    SqliteFile,
    SqliteMemory,
}

impl FromStr for DbKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(DbKind::Postgres),
            "sqlite-file" | "sqlite_file" => Ok(DbKind::SqliteFile),
            "sqlite-memory" | "sqlite_memory" | "memory" => Ok(DbKind::SqliteMemory),
            other => Err(AppError::config(format!(
                "unknown database kind '{other}' (expected postgres, sqlite-file or sqlite-memory)"
            ))),
        }
    }
}

impl FromStr for RuntimeEnv {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Ok(RuntimeEnv::Prod),
            "test" => Ok(RuntimeEnv::Test),
            other => Err(AppError::config(format!("unknown runtime env '{other}'"))),
        }
    }
}

/// Builds the connection URL for `kind` from environment variables.
///
/// Postgres honours `DATABASE_URL` as a whole; otherwise it is assembled
/// from `POSTGRES_HOST`, `POSTGRES_PORT`, `APP_DB_USER`, `APP_DB_PASSWORD`
/// and `PROD_DB` / `TEST_DB`.
pub fn db_url(runtime: RuntimeEnv, kind: DbKind) -> Result<String, AppError> {
    match kind {
        DbKind::SqliteMemory => Ok("sqlite::memory:".to_string()),
        DbKind::SqliteFile => {
            let path = must_var("SQLITE_PATH")?;
            if runtime == RuntimeEnv::Test && !path.contains("test") {
                return Err(AppError::config(format!(
                    "Test runtime requires SQLITE_PATH to contain 'test', got '{path}'"
                )));
            }
            Ok(format!("sqlite://{path}?mode=rwc"))
        }
        DbKind::Postgres => {
            if let Ok(url) = env::var("DATABASE_URL") {
                return Ok(url);
            }
            let host = env::var("POSTGRES_HOST").unwrap_or_else(|_| "localhost".to_string());
            let port = env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".to_string());
            let user = must_var("APP_DB_USER")?;
            let password = must_var("APP_DB_PASSWORD")?;
            let db_name = db_name(runtime)?;
            Ok(format!("postgresql://{user}:{password}@{host}:{port}/{db_name}"))
        }
    }
}

fn db_name(runtime: RuntimeEnv) -> Result<String, AppError> {
    match runtime {
        RuntimeEnv::Prod => must_var("PROD_DB"),
        RuntimeEnv::Test => {
            let db_name = must_var("TEST_DB")?;
            if !db_name.ends_with("_test") {
                return Err(AppError::config(format!(
                    "Test runtime requires database name to end with '_test', but got: '{db_name}'"
                )));
            }
            Ok(db_name)
        }
    }
}

/// Required environment variable, or a config error naming it.
pub fn must_var(name: &str) -> Result<String, AppError> {
    env::var(name)
        .map_err(|_| AppError::config(format!("Required environment variable '{name}' is not set")))
}

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::model::record::RecordKind;

type StepFn = for<'c> fn(&'c mut SqliteConnection) -> BoxFuture<'c, Result<bool, sqlx::Error>>;

/// One idempotent schema step. `apply` checks its own precondition and
/// reports whether it changed anything.
pub struct MigrationStep {
    pub name: &'static str,
    pub apply: StepFn,
}

/// Applied in order on every start.
pub const STEPS: &[MigrationStep] = &[
    MigrationStep {
        name: "create_leitura_table",
        apply: create_leitura_table,
    },
    MigrationStep {
        name: "add_tipo_column",
        apply: add_tipo_column,
    },
    MigrationStep {
        name: "create_cartao_timestamp_index",
        apply: create_cartao_timestamp_index,
    },
];

pub async fn run_pending_migrations(pool: &SqlitePool) -> Result<()> {
    let mut conn = pool
        .acquire()
        .await
        .context("failed to acquire a connection for migrations")?;

    for step in STEPS {
        let applied = (step.apply)(&mut *conn)
            .await
            .with_context(|| format!("migration step `{}` failed", step.name))?;

        if applied {
            info!(step = step.name, "Migration step applied");
        } else {
            debug!(step = step.name, "Migration step already satisfied");
        }
    }

    Ok(())
}

async fn table_exists(conn: &mut SqliteConnection, table: &str) -> Result<bool, sqlx::Error> {
    let found: Option<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(table)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(found.is_some())
}

async fn index_exists(conn: &mut SqliteConnection, index: &str) -> Result<bool, sqlx::Error> {
    let found: Option<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'index' AND name = ?")
            .bind(index)
            .fetch_optional(&mut *conn)
            .await?;
    Ok(found.is_some())
}

async fn column_names(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT name FROM pragma_table_info(?)")
        .bind(table)
        .fetch_all(&mut *conn)
        .await
}

fn create_leitura_table(conn: &mut SqliteConnection) -> BoxFuture<'_, Result<bool, sqlx::Error>> {
    Box::pin(async move {
        if table_exists(conn, "leitura").await? {
            return Ok(false);
        }

        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS leitura (
                cartao    TEXT    NOT NULL,
                timestamp INTEGER NOT NULL,
                tipo      TEXT    NOT NULL DEFAULT '{}'
            )
            "#,
            RecordKind::Entry.as_str()
        );
        sqlx::query(&sql).execute(&mut *conn).await?;
        Ok(true)
    })
}

/// Tables created before the kind column existed only had `cartao` and
/// `timestamp`; their rows are read as entries.
fn add_tipo_column(conn: &mut SqliteConnection) -> BoxFuture<'_, Result<bool, sqlx::Error>> {
    Box::pin(async move {
        if !table_exists(conn, "leitura").await? {
            return Ok(false);
        }
        if column_names(conn, "leitura").await?.iter().any(|c| c == "tipo") {
            return Ok(false);
        }

        let sql = format!(
            "ALTER TABLE leitura ADD COLUMN tipo TEXT NOT NULL DEFAULT '{}'",
            RecordKind::Entry.as_str()
        );
        sqlx::query(&sql).execute(&mut *conn).await?;
        Ok(true)
    })
}

fn create_cartao_timestamp_index(
    conn: &mut SqliteConnection,
) -> BoxFuture<'_, Result<bool, sqlx::Error>> {
    Box::pin(async move {
        if index_exists(conn, "idx_leitura_cartao_timestamp").await? {
            return Ok(false);
        }

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_leitura_cartao_timestamp ON leitura(cartao, timestamp)",
        )
        .execute(&mut *conn)
        .await?;
        Ok(true)
    })
}

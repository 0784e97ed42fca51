use chrono::Utc;
use futures::lock::Mutex;
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

use crate::model::record::{CardId, CardStatus, Record};

/// Rows returned by [`RecordStore::recent`].
pub const RECENT_LIMIT: i64 = 50;

/// Shared handle to the record table. Created once at startup and handed
/// to every request handler through `web::Data`.
pub struct RecordStore {
    pool: SqlitePool,
    // Held across read-last / decide / insert so ingests cannot interleave.
    ingest_gate: Mutex<()>,
}

impl RecordStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            ingest_gate: Mutex::new(()),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Appends one read for `card_id` and returns it. The kind toggles
    /// from the card's last record; the timestamp is the server clock, never
    /// earlier than that record.
    pub async fn ingest(&self, card_id: &CardId) -> Result<Record, sqlx::Error> {
        let _gate = self.ingest_gate.lock().await;
        let mut tx = self.pool.begin().await?;

        let last = last_record(&mut *tx, card_id.as_str()).await?;
        let status = CardStatus::from(last.as_ref());

        let now = Utc::now().timestamp_millis();
        let record = Record {
            card_id: card_id.as_str().to_string(),
            timestamp: status.last_timestamp().map_or(now, |prev| now.max(prev)),
            kind: status.next_kind(),
        };

        sqlx::query("INSERT INTO leitura (cartao, timestamp, tipo) VALUES (?, ?, ?)")
            .bind(&record.card_id)
            .bind(record.timestamp)
            .bind(record.kind)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(
            cartao = %record.card_id,
            timestamp = record.timestamp,
            tipo = %record.kind,
            "Record stored"
        );
        Ok(record)
    }

    /// The latest [`RECENT_LIMIT`] records across all cards, newest first.
    pub async fn recent(&self) -> Result<Vec<Record>, sqlx::Error> {
        sqlx::query_as::<_, Record>(
            r#"
            SELECT cartao, timestamp, tipo
            FROM leitura
            ORDER BY timestamp DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(RECENT_LIMIT)
        .fetch_all(&self.pool)
        .await
    }

    pub async fn card_status(&self, card_id: &CardId) -> Result<CardStatus, sqlx::Error> {
        let last = last_record(&self.pool, card_id.as_str()).await?;
        Ok(CardStatus::from(last.as_ref()))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn last_record<'e, E>(executor: E, card_id: &str) -> Result<Option<Record>, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Record>(
        r#"
        SELECT cartao, timestamp, tipo
        FROM leitura
        WHERE cartao = ?
        ORDER BY timestamp DESC, rowid DESC
        LIMIT 1
        "#,
    )
    .bind(card_id)
    .fetch_optional(executor)
    .await
}

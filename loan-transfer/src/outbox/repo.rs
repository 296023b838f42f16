use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::{error::*, *};

#[derive(sqlx::FromRow)]
struct OutboxEventRow {
    sequence: EventSequence,
    payload: String,
    recorded_at: DateTime<Utc>,
}

impl TryFrom<OutboxEventRow> for OutboxEvent {
    type Error = OutboxError;

    fn try_from(row: OutboxEventRow) -> Result<Self, Self::Error> {
        Ok(OutboxEvent {
            sequence: row.sequence,
            payload: serde_json::from_str(&row.payload)?,
            recorded_at: row.recorded_at,
        })
    }
}

#[derive(Clone)]
pub(super) struct OutboxRepo {
    pool: SqlitePool,
}

impl OutboxRepo {
    pub(super) fn new(pool: &SqlitePool) -> Self {
        Self { pool: pool.clone() }
    }

    pub(super) async fn persist_events(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        payloads: impl Iterator<Item = OutboxEventPayload>,
    ) -> Result<Vec<OutboxEvent>, OutboxError> {
        let recorded_at = Utc::now();
        let mut events = Vec::new();
        for payload in payloads {
            let serialized = serde_json::to_string(&payload)?;
            let sequence = sqlx::query(
                "INSERT INTO loan_transfer_outbox_events (payload, recorded_at) VALUES (?, ?)",
            )
            .bind(serialized)
            .bind(recorded_at)
            .execute(&mut **tx)
            .await?
            .last_insert_rowid();
            events.push(OutboxEvent {
                sequence: EventSequence::from(sequence),
                payload,
                recorded_at,
            });
        }
        Ok(events)
    }

    pub(super) async fn list_after(
        &self,
        after: Option<EventSequence>,
        limit: i64,
    ) -> Result<Vec<OutboxEvent>, OutboxError> {
        let rows = sqlx::query_as::<_, OutboxEventRow>(
            r#"SELECT sequence, payload, recorded_at
               FROM loan_transfer_outbox_events
               WHERE sequence > ?
               ORDER BY sequence
               LIMIT ?"#,
        )
        .bind(after.map(i64::from).unwrap_or(0))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(OutboxEvent::try_from).collect()
    }
}

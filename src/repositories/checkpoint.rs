use chrono::NaiveDateTime;
use sqlx::PgPool;

use crate::models::checkpoint::ProcessingCheckpoint;

#[derive(Clone)]
pub struct CheckpointRepository {
    conn: PgPool,
}

impl CheckpointRepository {
    pub fn new(conn: PgPool) -> Self {
        CheckpointRepository { conn }
    }

    pub async fn last_processed_id(&self) -> Result<i64, anyhow::Error> {
        let checkpoint = sqlx::query_as::<_, ProcessingCheckpoint>(
            "SELECT * FROM processing_checkpoints ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.conn)
        .await?;

        Ok(checkpoint.map(|c| c.last_processed_transaction_id).unwrap_or(0))
    }

    /// Advance the single checkpoint row. GREATEST keeps it monotonic even
    /// if a stale batch result ever tries to write an older id.
    pub async fn advance(&self, last_id: i64, at: NaiveDateTime) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"INSERT INTO processing_checkpoints (id, last_processed_transaction_id, last_processed_at)
            VALUES (1, $1, $2)
            ON CONFLICT (id) DO UPDATE
            SET last_processed_transaction_id = GREATEST(processing_checkpoints.last_processed_transaction_id, EXCLUDED.last_processed_transaction_id),
                last_processed_at = EXCLUDED.last_processed_at"#,
        )
        .bind(last_id)
        .bind(at)
        .execute(&self.conn)
        .await?;

        Ok(())
    }
}

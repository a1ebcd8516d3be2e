use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgExecutor};
use uuid::Uuid;

use crate::error::StoreError;
use crate::matching::HistoryRecord;
use crate::models::{Pairing, PairingStatus};

const PAIRING_COLUMNS: &str = r#"
    id, participant_1, participant_2, match_date, created_at, expires_at, status,
    participant_1_submitted_at, participant_2_submitted_at, like_count, comment_count, meeting_ref
"#;

#[derive(Debug, Clone, FromRow)]
pub struct PairingRow {
    pub id: Uuid,
    pub participant_1: Uuid,
    pub participant_2: Uuid,
    pub match_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: String,
    pub participant_1_submitted_at: Option<DateTime<Utc>>,
    pub participant_2_submitted_at: Option<DateTime<Utc>>,
    pub like_count: i32,
    pub comment_count: i32,
    pub meeting_ref: Option<String>,
}

impl TryFrom<PairingRow> for Pairing {
    type Error = StoreError;

    fn try_from(row: PairingRow) -> Result<Self, Self::Error> {
        let status: PairingStatus = row
            .status
            .parse()
            .map_err(|e| StoreError::Corrupt(format!("pairing {}: {}", row.id, e)))?;

        Ok(Pairing {
            id: row.id,
            participant_1: row.participant_1,
            participant_2: row.participant_2,
            match_date: row.match_date,
            created_at: row.created_at,
            expires_at: row.expires_at,
            status,
            participant_1_submitted_at: row.participant_1_submitted_at,
            participant_2_submitted_at: row.participant_2_submitted_at,
            like_count: row.like_count,
            comment_count: row.comment_count,
            meeting_ref: row.meeting_ref,
        })
    }
}

pub async fn get_pairing_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> sqlx::Result<Option<PairingRow>> {
    let sql = format!("SELECT {PAIRING_COLUMNS} FROM pairings WHERE id = $1");

    sqlx::query_as::<_, PairingRow>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn get_pairings_created_between<'e, E: PgExecutor<'e>>(
    executor: E,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> sqlx::Result<Vec<PairingRow>> {
    let sql = format!(
        r#"
        SELECT {PAIRING_COLUMNS}
        FROM pairings
        WHERE created_at >= $1 AND created_at < $2
        ORDER BY created_at ASC, id ASC
        "#
    );

    sqlx::query_as::<_, PairingRow>(&sql)
        .bind(start)
        .bind(end)
        .fetch_all(executor)
        .await
}

pub async fn has_pairing_between<'e, E: PgExecutor<'e>>(
    executor: E,
    participant_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM pairings
            WHERE (participant_1 = $1 OR participant_2 = $1)
            AND created_at >= $2 AND created_at < $3
        )
        "#,
    )
    .bind(participant_id)
    .bind(start)
    .bind(end)
    .fetch_one(executor)
    .await
}

pub async fn get_pair_history<'e, E: PgExecutor<'e>>(
    executor: E,
    since: DateTime<Utc>,
) -> sqlx::Result<Vec<HistoryRecord>> {
    sqlx::query_as::<_, HistoryRecord>(
        r#"
        SELECT participant_1 AS participant_a, participant_2 AS participant_b, match_date
        FROM pairings
        WHERE created_at >= $1
        "#,
    )
    .bind(since)
    .fetch_all(executor)
    .await
}

pub async fn insert_pairing<'e, E: PgExecutor<'e>>(
    executor: E,
    pairing: &Pairing,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO pairings (
            id, participant_1, participant_2, match_date, created_at, expires_at, status,
            participant_1_submitted_at, participant_2_submitted_at, like_count, comment_count, meeting_ref
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(pairing.id)
    .bind(pairing.participant_1)
    .bind(pairing.participant_2)
    .bind(pairing.match_date)
    .bind(pairing.created_at)
    .bind(pairing.expires_at)
    .bind(pairing.status.as_str())
    .bind(pairing.participant_1_submitted_at)
    .bind(pairing.participant_2_submitted_at)
    .bind(pairing.like_count)
    .bind(pairing.comment_count)
    .bind(&pairing.meeting_ref)
    .execute(executor)
    .await?;

    Ok(())
}

/// Flakes the given pairings unless they already reached a terminal state.
pub async fn mark_flaked<'e, E: PgExecutor<'e>>(executor: E, ids: &[Uuid]) -> sqlx::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE pairings
        SET status = 'flaked'
        WHERE id = ANY($1) AND status IN ('pending', 'partially_submitted')
        "#,
    )
    .bind(ids)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Compare-and-set on status; returns 0 when the pairing moved on underneath us.
pub async fn update_submission<'e, E: PgExecutor<'e>>(
    executor: E,
    pairing: &Pairing,
    expected_status: PairingStatus,
) -> sqlx::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE pairings
        SET status = $2,
            participant_1_submitted_at = $3,
            participant_2_submitted_at = $4
        WHERE id = $1 AND status = $5
        "#,
    )
    .bind(pairing.id)
    .bind(pairing.status.as_str())
    .bind(pairing.participant_1_submitted_at)
    .bind(pairing.participant_2_submitted_at)
    .bind(expected_status.as_str())
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

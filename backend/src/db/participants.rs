use chrono::{DateTime, Utc};
use sqlx::PgExecutor;
use sqlx::types::Json;
use uuid::Uuid;

use crate::matching::EligibilityCriteria;
use crate::models::Participant;
use crate::store::StreakUpdate;

const PARTICIPANT_COLUMNS: &str = r#"
    id, handle, display_name, active, last_active, connections, blocked_ids,
    consecutive_failure_streak, max_consecutive_failure_streak, total_flakes,
    waitlisted_today, priority_next_run, waitlisted_at, is_placeholder,
    notification_prefs, created_at
"#;

pub async fn get_eligible_participants<'e, E: PgExecutor<'e>>(
    executor: E,
    criteria: &EligibilityCriteria,
) -> sqlx::Result<Vec<Participant>> {
    let sql = format!(
        r#"
        SELECT {PARTICIPANT_COLUMNS}
        FROM participants
        WHERE active = TRUE
        AND last_active >= $1
        AND consecutive_failure_streak < $2
        ORDER BY created_at ASC, id ASC
        "#
    );

    sqlx::query_as::<_, Participant>(&sql)
        .bind(criteria.active_since)
        .bind(criteria.max_failure_streak)
        .fetch_all(executor)
        .await
}

pub async fn get_participant_by_id<'e, E: PgExecutor<'e>>(
    executor: E,
    id: Uuid,
) -> sqlx::Result<Option<Participant>> {
    let sql = format!("SELECT {PARTICIPANT_COLUMNS} FROM participants WHERE id = $1");

    sqlx::query_as::<_, Participant>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn get_participants_by_ids<'e, E: PgExecutor<'e>>(
    executor: E,
    ids: &[Uuid],
) -> sqlx::Result<Vec<Participant>> {
    let sql = format!(
        r#"
        SELECT {PARTICIPANT_COLUMNS}
        FROM participants
        WHERE id = ANY($1)
        ORDER BY created_at ASC, id ASC
        "#
    );

    sqlx::query_as::<_, Participant>(&sql)
        .bind(ids)
        .fetch_all(executor)
        .await
}

/// Longest-waiting waitlisted participant with no pairing in `[start, end)`.
pub async fn find_waitlisted_partner<'e, E: PgExecutor<'e>>(
    executor: E,
    exclude: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> sqlx::Result<Option<Participant>> {
    let sql = format!(
        r#"
        SELECT {PARTICIPANT_COLUMNS}
        FROM participants p
        WHERE p.waitlisted_today = TRUE
        AND p.active = TRUE
        AND p.waitlisted_at >= $2 AND p.waitlisted_at < $3
        AND p.id <> $1
        AND NOT EXISTS (
            SELECT 1 FROM pairings pr
            WHERE (pr.participant_1 = p.id OR pr.participant_2 = p.id)
            AND pr.created_at >= $2 AND pr.created_at < $3
        )
        ORDER BY p.waitlisted_at ASC, p.created_at ASC
        LIMIT 1
        "#
    );

    sqlx::query_as::<_, Participant>(&sql)
        .bind(exclude)
        .bind(start)
        .bind(end)
        .fetch_optional(executor)
        .await
}

pub async fn count_placeholders<'e, E: PgExecutor<'e>>(executor: E) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM participants WHERE is_placeholder = TRUE")
        .fetch_one(executor)
        .await
}

pub async fn insert_participant<'e, E: PgExecutor<'e>>(
    executor: E,
    participant: &Participant,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO participants (
            id, handle, display_name, active, last_active, connections, blocked_ids,
            consecutive_failure_streak, max_consecutive_failure_streak, total_flakes,
            waitlisted_today, priority_next_run, waitlisted_at, is_placeholder,
            notification_prefs, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        "#,
    )
    .bind(participant.id)
    .bind(&participant.handle)
    .bind(&participant.display_name)
    .bind(participant.active)
    .bind(participant.last_active)
    .bind(&participant.connections)
    .bind(&participant.blocked_ids)
    .bind(participant.consecutive_failure_streak)
    .bind(participant.max_consecutive_failure_streak)
    .bind(participant.total_flakes)
    .bind(participant.waitlisted_today)
    .bind(participant.priority_next_run)
    .bind(participant.waitlisted_at)
    .bind(participant.is_placeholder)
    .bind(Json(&participant.notification_prefs))
    .bind(participant.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn mark_waitlisted<'e, E: PgExecutor<'e>>(
    executor: E,
    ids: &[Uuid],
    at: Option<DateTime<Utc>>,
) -> sqlx::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE participants
        SET waitlisted_today = TRUE, priority_next_run = TRUE, waitlisted_at = $2
        WHERE id = ANY($1)
        "#,
    )
    .bind(ids)
    .bind(at)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

pub async fn clear_waitlist_flags<'e, E: PgExecutor<'e>>(
    executor: E,
    ids: &[Uuid],
) -> sqlx::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE participants
        SET waitlisted_today = FALSE, priority_next_run = FALSE
        WHERE id = ANY($1)
        "#,
    )
    .bind(ids)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Clears the flags only if still waitlisted; 0 rows means someone else took them.
pub async fn consume_waitlisted<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> sqlx::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE participants
        SET waitlisted_today = FALSE, priority_next_run = FALSE
        WHERE id = $1 AND waitlisted_today = TRUE
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

pub async fn apply_streak_update<'e, E: PgExecutor<'e>>(
    executor: E,
    update: &StreakUpdate,
) -> sqlx::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE participants
        SET consecutive_failure_streak = $2,
            max_consecutive_failure_streak = $3,
            total_flakes = $4
        WHERE id = $1
        "#,
    )
    .bind(update.participant_id)
    .bind(update.consecutive_failure_streak)
    .bind(update.max_consecutive_failure_streak)
    .bind(update.total_flakes)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

pub async fn reset_failure_streaks<'e, E: PgExecutor<'e>>(
    executor: E,
    ids: &[Uuid],
) -> sqlx::Result<u64> {
    let result = sqlx::query("UPDATE participants SET consecutive_failure_streak = 0 WHERE id = ANY($1)")
        .bind(ids)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}

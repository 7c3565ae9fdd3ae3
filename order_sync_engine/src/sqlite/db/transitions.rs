use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::db_types::{OrderId, SyncState, TransitionRecord};

pub async fn insert_transition(
    order_id: &OrderId,
    from: SyncState,
    to: SyncState,
    reason: &str,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<TransitionRecord, sqlx::Error> {
    let record = sqlx::query_as(
        r#"
            INSERT INTO order_transitions (order_id, from_state, to_state, reason, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(from)
    .bind(to)
    .bind(reason)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(record)
}

pub async fn fetch_transitions(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<TransitionRecord>, sqlx::Error> {
    let records = sqlx::query_as("SELECT * FROM order_transitions WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(records)
}

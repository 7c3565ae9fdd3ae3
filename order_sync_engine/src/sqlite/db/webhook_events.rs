use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::WebhookEvent;

pub async fn event_exists(event: &WebhookEvent, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM webhook_events WHERE product_id = $1 AND order_id = $2 AND payload_hash = $3",
    )
    .bind(&event.product_id)
    .bind(&event.order_id)
    .bind(&event.payload_hash)
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

/// Returns `false` if the delivery had already been recorded.
pub async fn insert_event(event: &WebhookEvent, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            INSERT OR IGNORE INTO webhook_events (product_id, order_id, payload_hash, webhook_id, received_at)
            VALUES ($1, $2, $3, $4, $5);
        "#,
    )
    .bind(&event.product_id)
    .bind(&event.order_id)
    .bind(&event.payload_hash)
    .bind(&event.webhook_id)
    .bind(event.received_at)
    .execute(conn)
    .await?;
    let inserted = result.rows_affected() == 1;
    if inserted {
        debug!("📝️ Webhook delivery for order [{}] recorded", event.order_id);
    }
    Ok(inserted)
}

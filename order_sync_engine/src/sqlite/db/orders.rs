use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderChanges, OrderId, RemoteOperationStatus, SyncState},
    traits::SyncDatabaseError,
};

/// Inserts the order into the database, returning `false` in the second parameter if the order already exists.
pub async fn idempotent_insert(
    order: NewOrder,
    conn: &mut SqliteConnection,
) -> Result<(Order, bool), SyncDatabaseError> {
    let inserted: Option<Order> = sqlx::query_as(
        r#"
            INSERT INTO orders (order_id, product_id, state, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ON CONFLICT (order_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(&order.order_id)
    .bind(&order.product_id)
    .bind(SyncState::Draft)
    .bind(order.created_at)
    .fetch_optional(&mut *conn)
    .await?;
    match inserted {
        Some(o) => {
            debug!("📝️ Order [{}] inserted with id {}", o.order_id, o.id);
            Ok((o, true))
        },
        None => {
            let existing = fetch_order_by_order_id(&order.order_id, conn)
                .await?
                .ok_or_else(|| SyncDatabaseError::OrderNotFound(order.order_id.clone()))?;
            trace!("📝️ Order [{}] already exists in state {}", existing.order_id, existing.state);
            Ok((existing, false))
        },
    }
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(order)
}

/// Compare-and-swap on the order state. Returns `None` if the order is not in the `expected` state.
pub async fn update_state(
    order_id: &OrderId,
    expected: SyncState,
    new: SyncState,
    changes: OrderChanges,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                state = $1,
                operation_id = COALESCE($2, operation_id),
                operation_status = COALESCE($3, operation_status),
                error_message = COALESCE($4, error_message),
                due_date = COALESCE($5, due_date),
                last_synced_at = $6,
                updated_at = $6
            WHERE order_id = $7 AND state = $8
            RETURNING *;
        "#,
    )
    .bind(new)
    .bind(changes.operation_id)
    .bind(changes.operation_status)
    .bind(changes.error_message)
    .bind(changes.due_date)
    .bind(now)
    .bind(order_id)
    .bind(expected)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

pub async fn record_sync(
    order_id: &OrderId,
    status: Option<RemoteOperationStatus>,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as(
        r#"
            UPDATE orders SET
                operation_status = COALESCE($1, operation_status),
                last_synced_at = $2
            WHERE order_id = $3
            RETURNING *;
        "#,
    )
    .bind(status)
    .bind(now)
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Fetches orders in any of the given states, ordered by `created_at` ascending.
pub async fn fetch_orders_in_states(
    states: &[SyncState],
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    if states.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new("SELECT * FROM orders WHERE state IN (");
    let mut separated = builder.separated(", ");
    for state in states {
        separated.push_bind(*state);
    }
    separated.push_unseparated(") ORDER BY created_at ASC");
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("📝️ {} orders found in states {states:?}", orders.len());
    Ok(orders)
}

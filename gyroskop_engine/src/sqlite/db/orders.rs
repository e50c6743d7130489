use log::debug;
use sqlx::{types::Json, FromRow, SqliteConnection};

use crate::{
    db_types::{Order, Participant, Quantities, UserId},
    traits::WindowStoreError,
};

#[derive(Debug, FromRow)]
struct OrderRow {
    id: i64,
    window_id: i64,
    user_id: UserId,
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    quantities: Json<Quantities>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        let participant = Participant {
            user_id: row.user_id,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
        };
        Self { id: row.id, window_id: row.window_id, participant, quantities: row.quantities.0 }
    }
}

/// Inserts the participant's order, or replaces the quantities and display fields of the existing one.
///
/// The `(window_id, user_id)` uniqueness constraint guarantees a single row per user and window, even when two
/// submissions race.
pub async fn upsert_order(
    window_id: i64,
    participant: &Participant,
    quantities: &Quantities,
    conn: &mut SqliteConnection,
) -> Result<Order, WindowStoreError> {
    let row: OrderRow = sqlx::query_as(
        r#"
            INSERT INTO orders (window_id, user_id, username, first_name, last_name, quantities)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (window_id, user_id) DO UPDATE SET
                username = excluded.username,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                quantities = excluded.quantities,
                updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(window_id)
    .bind(participant.user_id)
    .bind(participant.username.as_deref())
    .bind(participant.first_name.as_deref())
    .bind(participant.last_name.as_deref())
    .bind(Json(quantities))
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order #{} for user {} in window #{window_id} saved", row.id, row.user_id);
    Ok(row.into())
}

pub async fn fetch_orders(window_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, WindowStoreError> {
    let rows: Vec<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE window_id = $1 ORDER BY id ASC")
        .bind(window_id)
        .fetch_all(conn)
        .await?;
    Ok(rows.into_iter().map(Order::from).collect())
}

pub async fn fetch_order(
    window_id: i64,
    user: UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, WindowStoreError> {
    let row: Option<OrderRow> = sqlx::query_as("SELECT * FROM orders WHERE window_id = $1 AND user_id = $2")
        .bind(window_id)
        .bind(user)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(Order::from))
}

/// Clears all quantities of the user's order. The row itself is kept.
pub async fn clear_order(window_id: i64, user: UserId, conn: &mut SqliteConnection) -> Result<bool, WindowStoreError> {
    let result = sqlx::query(
        "UPDATE orders SET quantities = '{}', updated_at = CURRENT_TIMESTAMP WHERE window_id = $1 AND user_id = $2",
    )
    .bind(window_id)
    .bind(user)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

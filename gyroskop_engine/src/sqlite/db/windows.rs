use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{types::Json, FromRow, SqliteConnection};

use crate::{
    db_types::{GroupId, MessageRef, NewWindow, OrderingWindow, UserId},
    traits::WindowStoreError,
};

#[derive(Debug, FromRow)]
struct WindowRow {
    id: i64,
    group_id: GroupId,
    created_by: UserId,
    message_id: Option<MessageRef>,
    name: String,
    options: Json<Vec<String>>,
    deadline: DateTime<Utc>,
    is_open: bool,
}

impl From<WindowRow> for OrderingWindow {
    fn from(row: WindowRow) -> Self {
        Self {
            id: row.id,
            group_id: row.group_id,
            created_by: row.created_by,
            message_ref: row.message_id,
            name: row.name,
            options: row.options.0,
            deadline: row.deadline,
            is_open: row.is_open,
        }
    }
}

/// Inserts a new, open window. This does not check whether the group already has an open window.
pub async fn insert_window(window: NewWindow, conn: &mut SqliteConnection) -> Result<OrderingWindow, WindowStoreError> {
    let row: WindowRow = sqlx::query_as(
        r#"
            INSERT INTO ordering_windows (group_id, created_by, name, options, deadline, is_open)
            VALUES ($1, $2, $3, $4, $5, 1)
            RETURNING *;
        "#,
    )
    .bind(window.group_id)
    .bind(window.created_by)
    .bind(window.name)
    .bind(Json(window.options))
    .bind(window.deadline)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Window #{} inserted for group {}", row.id, row.group_id);
    Ok(row.into())
}

pub async fn fetch_window(id: i64, conn: &mut SqliteConnection) -> Result<Option<OrderingWindow>, WindowStoreError> {
    let row: Option<WindowRow> =
        sqlx::query_as("SELECT * FROM ordering_windows WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(row.map(OrderingWindow::from))
}

/// Returns the most recent open window for the group.
pub async fn fetch_open_window(
    group: GroupId,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderingWindow>, WindowStoreError> {
    let row: Option<WindowRow> =
        sqlx::query_as("SELECT * FROM ordering_windows WHERE group_id = $1 AND is_open = 1 ORDER BY id DESC LIMIT 1")
            .bind(group)
            .fetch_optional(conn)
            .await?;
    Ok(row.map(OrderingWindow::from))
}

pub async fn fetch_all_open_windows(conn: &mut SqliteConnection) -> Result<Vec<OrderingWindow>, WindowStoreError> {
    let rows: Vec<WindowRow> =
        sqlx::query_as("SELECT * FROM ordering_windows WHERE is_open = 1 ORDER BY deadline ASC").fetch_all(conn).await?;
    trace!("🗃️ {} open windows in the store", rows.len());
    Ok(rows.into_iter().map(OrderingWindow::from).collect())
}

pub async fn fetch_latest_window(
    group: GroupId,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderingWindow>, WindowStoreError> {
    let row: Option<WindowRow> =
        sqlx::query_as("SELECT * FROM ordering_windows WHERE group_id = $1 ORDER BY id DESC LIMIT 1")
            .bind(group)
            .fetch_optional(conn)
            .await?;
    Ok(row.map(OrderingWindow::from))
}

pub async fn fetch_window_by_message_ref(
    group: GroupId,
    message: MessageRef,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderingWindow>, WindowStoreError> {
    let row: Option<WindowRow> = sqlx::query_as(
        "SELECT * FROM ordering_windows WHERE group_id = $1 AND message_id = $2 ORDER BY id DESC LIMIT 1",
    )
    .bind(group)
    .bind(message)
    .fetch_optional(conn)
    .await?;
    Ok(row.map(OrderingWindow::from))
}

/// Closes the window if it is open. Returns true if this call performed the transition.
pub async fn close_window(id: i64, conn: &mut SqliteConnection) -> Result<bool, WindowStoreError> {
    let result = sqlx::query(
        "UPDATE ordering_windows SET is_open = 0, updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND is_open = 1",
    )
    .bind(id)
    .execute(conn)
    .await?;
    let closed = result.rows_affected() > 0;
    trace!("🗃️ Close window #{id}: {}", if closed { "closed" } else { "already closed" });
    Ok(closed)
}

/// Reopens a closed window with a new deadline. Returns true if this call performed the transition.
pub async fn reopen_window(
    id: i64,
    deadline: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, WindowStoreError> {
    let result = sqlx::query(
        r#"
            UPDATE ordering_windows SET is_open = 1, deadline = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND is_open = 0
        "#,
    )
    .bind(deadline)
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_deadline(
    id: i64,
    deadline: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(), WindowStoreError> {
    let result =
        sqlx::query("UPDATE ordering_windows SET deadline = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
            .bind(deadline)
            .bind(id)
            .execute(conn)
            .await?;
    ensure_updated(id, result.rows_affected())
}

pub async fn update_options(
    id: i64,
    name: &str,
    options: &[String],
    conn: &mut SqliteConnection,
) -> Result<(), WindowStoreError> {
    let result = sqlx::query(
        "UPDATE ordering_windows SET name = $1, options = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $3",
    )
    .bind(name)
    .bind(Json(options))
    .bind(id)
    .execute(conn)
    .await?;
    ensure_updated(id, result.rows_affected())
}

pub async fn update_message_ref(
    id: i64,
    message: MessageRef,
    conn: &mut SqliteConnection,
) -> Result<(), WindowStoreError> {
    let result =
        sqlx::query("UPDATE ordering_windows SET message_id = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
            .bind(message)
            .bind(id)
            .execute(conn)
            .await?;
    ensure_updated(id, result.rows_affected())
}

fn ensure_updated(id: i64, rows_affected: u64) -> Result<(), WindowStoreError> {
    if rows_affected == 0 {
        Err(WindowStoreError::WindowNotFound(id))
    } else {
        Ok(())
    }
}

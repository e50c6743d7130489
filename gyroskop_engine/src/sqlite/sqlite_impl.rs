//! `SqliteDatabase` is the concrete record store used by the Gyroskop bot.
//!
//! It implements [`OrderingWindowDatabase`] on top of a connection pool, delegating to the low-level query functions
//! in [`super::db`].
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{db_url, new_pool, orders, windows};
use crate::{
    db_types::{GroupId, MessageRef, NewWindow, Order, OrderingWindow, Participant, Quantities, UserId},
    traits::{OrderingWindowDatabase, WindowStoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({})", self.url)
    }
}

impl OrderingWindowDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn create_window(&self, window: NewWindow) -> Result<OrderingWindow, WindowStoreError> {
        let mut conn = self.pool.acquire().await?;
        windows::insert_window(window, &mut conn).await
    }

    async fn fetch_window(&self, window_id: i64) -> Result<Option<OrderingWindow>, WindowStoreError> {
        let mut conn = self.pool.acquire().await?;
        windows::fetch_window(window_id, &mut conn).await
    }

    async fn fetch_open_window(&self, group: GroupId) -> Result<Option<OrderingWindow>, WindowStoreError> {
        let mut conn = self.pool.acquire().await?;
        windows::fetch_open_window(group, &mut conn).await
    }

    async fn fetch_all_open_windows(&self) -> Result<Vec<OrderingWindow>, WindowStoreError> {
        let mut conn = self.pool.acquire().await?;
        windows::fetch_all_open_windows(&mut conn).await
    }

    async fn fetch_latest_window(&self, group: GroupId) -> Result<Option<OrderingWindow>, WindowStoreError> {
        let mut conn = self.pool.acquire().await?;
        windows::fetch_latest_window(group, &mut conn).await
    }

    async fn fetch_window_by_message_ref(
        &self,
        group: GroupId,
        message: MessageRef,
    ) -> Result<Option<OrderingWindow>, WindowStoreError> {
        let mut conn = self.pool.acquire().await?;
        windows::fetch_window_by_message_ref(group, message, &mut conn).await
    }

    async fn close_window(&self, window_id: i64) -> Result<bool, WindowStoreError> {
        let mut conn = self.pool.acquire().await?;
        let closed = windows::close_window(window_id, &mut conn).await?;
        if closed {
            debug!("🗃️ Window #{window_id} has been closed");
        }
        Ok(closed)
    }

    async fn reopen_window(&self, window_id: i64, deadline: DateTime<Utc>) -> Result<bool, WindowStoreError> {
        let mut conn = self.pool.acquire().await?;
        let reopened = windows::reopen_window(window_id, deadline, &mut conn).await?;
        if reopened {
            debug!("🗃️ Window #{window_id} has been reopened until {deadline}");
        }
        Ok(reopened)
    }

    async fn update_window_deadline(&self, window_id: i64, deadline: DateTime<Utc>) -> Result<(), WindowStoreError> {
        let mut conn = self.pool.acquire().await?;
        windows::update_deadline(window_id, deadline, &mut conn).await
    }

    async fn update_window_options(
        &self,
        window_id: i64,
        name: &str,
        options: &[String],
    ) -> Result<(), WindowStoreError> {
        let mut conn = self.pool.acquire().await?;
        windows::update_options(window_id, name, options, &mut conn).await
    }

    async fn update_window_message_ref(&self, window_id: i64, message: MessageRef) -> Result<(), WindowStoreError> {
        let mut conn = self.pool.acquire().await?;
        windows::update_message_ref(window_id, message, &mut conn).await
    }

    /// The foreign key on `orders.window_id` rejects orders for windows that do not exist.
    async fn upsert_order(
        &self,
        window_id: i64,
        participant: &Participant,
        quantities: &Quantities,
    ) -> Result<Order, WindowStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::upsert_order(window_id, participant, quantities, &mut conn).await
    }

    async fn fetch_orders(&self, window_id: i64) -> Result<Vec<Order>, WindowStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders(window_id, &mut conn).await
    }

    async fn fetch_order(&self, window_id: i64, user: UserId) -> Result<Option<Order>, WindowStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(window_id, user, &mut conn).await
    }

    async fn clear_order(&self, window_id: i64, user: UserId) -> Result<bool, WindowStoreError> {
        let mut conn = self.pool.acquire().await?;
        let cleared = orders::clear_order(window_id, user, &mut conn).await?;
        trace!("🗃️ Clear order for user {user} in window #{window_id}: {cleared}");
        Ok(cleared)
    }

    async fn close(&mut self) -> Result<(), WindowStoreError> {
        self.pool.close().await;
        info!("🗃️ Database connection pool closed");
        Ok(())
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL from the `GYRO_DATABASE_URL` environment variable
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date using the embedded migrations.
    pub async fn migrate(&self) -> Result<(), WindowStoreError> {
        migrate!("./src/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| WindowStoreError::DatabaseError(format!("Migration failed. {e}")))?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

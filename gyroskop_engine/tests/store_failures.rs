use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Europe::Berlin;
use gyroskop_engine::{
    db_types::{GroupId, MessageRef, NewWindow, Order, OrderingWindow, Participant, Quantities, UserId},
    events::EventProducers,
    test_utils::{
        clock::ManualClock,
        prepare_env::{prepare_test_env, random_db_path},
    },
    OrderingWindowDatabase,
    SqliteDatabase,
    WindowApiError,
    WindowFlowApi,
    WindowStoreError,
};

/// Delegates to SQLite, but can be told to refuse reopens or to fail closing one window.
#[derive(Clone, Debug)]
struct FaultyStore {
    inner: SqliteDatabase,
    refuse_reopen: bool,
    fail_close_of: Option<i64>,
}

impl FaultyStore {
    fn new(inner: SqliteDatabase) -> Self {
        Self { inner, refuse_reopen: false, fail_close_of: None }
    }
}

impl OrderingWindowDatabase for FaultyStore {
    fn url(&self) -> &str {
        self.inner.url()
    }

    async fn create_window(&self, window: NewWindow) -> Result<OrderingWindow, WindowStoreError> {
        self.inner.create_window(window).await
    }

    async fn fetch_window(&self, window_id: i64) -> Result<Option<OrderingWindow>, WindowStoreError> {
        self.inner.fetch_window(window_id).await
    }

    async fn fetch_open_window(&self, group: GroupId) -> Result<Option<OrderingWindow>, WindowStoreError> {
        self.inner.fetch_open_window(group).await
    }

    async fn fetch_all_open_windows(&self) -> Result<Vec<OrderingWindow>, WindowStoreError> {
        self.inner.fetch_all_open_windows().await
    }

    async fn fetch_latest_window(&self, group: GroupId) -> Result<Option<OrderingWindow>, WindowStoreError> {
        self.inner.fetch_latest_window(group).await
    }

    async fn fetch_window_by_message_ref(
        &self,
        group: GroupId,
        message: MessageRef,
    ) -> Result<Option<OrderingWindow>, WindowStoreError> {
        self.inner.fetch_window_by_message_ref(group, message).await
    }

    async fn close_window(&self, window_id: i64) -> Result<bool, WindowStoreError> {
        if self.fail_close_of == Some(window_id) {
            return Err(WindowStoreError::DatabaseError("disk I/O error".into()));
        }
        self.inner.close_window(window_id).await
    }

    async fn reopen_window(&self, window_id: i64, deadline: DateTime<Utc>) -> Result<bool, WindowStoreError> {
        if self.refuse_reopen {
            return Ok(false);
        }
        self.inner.reopen_window(window_id, deadline).await
    }

    async fn update_window_deadline(&self, window_id: i64, deadline: DateTime<Utc>) -> Result<(), WindowStoreError> {
        self.inner.update_window_deadline(window_id, deadline).await
    }

    async fn update_window_options(
        &self,
        window_id: i64,
        name: &str,
        options: &[String],
    ) -> Result<(), WindowStoreError> {
        self.inner.update_window_options(window_id, name, options).await
    }

    async fn update_window_message_ref(&self, window_id: i64, message: MessageRef) -> Result<(), WindowStoreError> {
        self.inner.update_window_message_ref(window_id, message).await
    }

    async fn upsert_order(
        &self,
        window_id: i64,
        participant: &Participant,
        quantities: &Quantities,
    ) -> Result<Order, WindowStoreError> {
        self.inner.upsert_order(window_id, participant, quantities).await
    }

    async fn fetch_orders(&self, window_id: i64) -> Result<Vec<Order>, WindowStoreError> {
        self.inner.fetch_orders(window_id).await
    }

    async fn fetch_order(&self, window_id: i64, user: UserId) -> Result<Option<Order>, WindowStoreError> {
        self.inner.fetch_order(window_id, user).await
    }

    async fn clear_order(&self, window_id: i64, user: UserId) -> Result<bool, WindowStoreError> {
        self.inner.clear_order(window_id, user).await
    }
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
}

fn new_api(store: FaultyStore) -> WindowFlowApi<FaultyStore> {
    let clock = ManualClock::new(start());
    WindowFlowApi::new(store, EventProducers::default(), Berlin).with_clock(clock.clock())
}

fn new_window(group: i64, minutes: i64) -> NewWindow {
    NewWindow {
        group_id: GroupId(group),
        created_by: UserId(1),
        name: "Gyros".into(),
        options: vec!["Fleisch".into(), "Vegetarisch".into()],
        deadline: start() + Duration::minutes(minutes),
    }
}

#[tokio::test]
async fn a_refused_reopen_is_not_reported_as_reopened() {
    let db = prepare_test_env(&random_db_path()).await;
    let window = db.create_window(new_window(-7, 10)).await.unwrap();
    db.update_window_message_ref(window.id, MessageRef(70)).await.unwrap();
    assert!(db.close_window(window.id).await.unwrap());

    let api = new_api(FaultyStore { refuse_reopen: true, ..FaultyStore::new(db) });
    let err = api.reopen_or_edit(GroupId(-7), UserId(1), MessageRef(70), "1h").await.unwrap_err();
    assert!(matches!(err, WindowApiError::NotFound));
    assert!(matches!(api.status(GroupId(-7)).await, Err(WindowApiError::NotFound)));
    assert_eq!(api.cached_window_count().await, 0);
}

#[tokio::test]
async fn startup_keeps_going_after_a_failed_close() {
    let db = prepare_test_env(&random_db_path()).await;
    // Open windows are restored in deadline order, so the failing one comes first
    let broken = db.create_window(new_window(1, -10)).await.unwrap();
    let stale = db.create_window(new_window(2, -5)).await.unwrap();
    let live = db.create_window(new_window(3, 10)).await.unwrap();

    let api = new_api(FaultyStore { fail_close_of: Some(broken.id), ..FaultyStore::new(db) });
    let result = api.restore_open_windows().await.unwrap();
    assert_eq!(result.expired.len(), 1);
    assert_eq!(result.expired[0].window.id, stale.id);
    assert_eq!(result.loaded, 1);
    assert_eq!(api.cached_window_count().await, 1);
    assert_eq!(api.status(GroupId(3)).await.unwrap().window.id, live.id);
    assert!(api.db().fetch_window(broken.id).await.unwrap().unwrap().is_open);
}

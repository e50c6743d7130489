use std::{sync::Arc, time::Duration};

use gyroskop_engine::window_objects::ClosedWindow;
use log::*;
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};

use crate::GyroskopApi;

/// Starts the expiry worker. It closes overdue windows every `interval` until `shutdown` changes or its sender is
/// dropped. Await the returned handle after signalling shutdown.
pub fn start_expiry_worker(
    api: Arc<GyroskopApi>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("🕰️ Window expiry worker started. Checking every {}s", interval.as_secs_f32());
        loop {
            tokio::select! {
                _ = timer.tick() => {},
                _ = shutdown.changed() => break,
            }
            trace!("🕰️ Running window expiry job");
            match api.expire_overdue_windows().await {
                Ok(result) if result.is_empty() => trace!("🕰️ No overdue windows"),
                Ok(result) => {
                    info!("🕰️ {} windows expired", result.total_count());
                    debug!(
                        "🕰️ {} found in memory, {} only in the store: {}",
                        result.from_cache,
                        result.from_store,
                        window_list(&result.closed)
                    );
                },
                Err(e) => {
                    error!("🕰️ Error running window expiry job: {e}");
                },
            }
        }
        info!("🕰️ Window expiry worker stopped");
    })
}

fn window_list(windows: &[ClosedWindow]) -> String {
    windows
        .iter()
        .map(|c| format!("[{}] group: {} orders: {}", c.window.id, c.window.group_id, c.orders.len()))
        .collect::<Vec<String>>()
        .join(", ")
}

#[cfg(test)]
mod test {
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use chrono_tz::Europe::Berlin;
    use gyroskop_engine::{
        db_types::{GroupId, Participant, UserId},
        events::EventProducers,
        test_utils::{
            clock::ManualClock,
            prepare_env::{prepare_test_env, random_db_path},
        },
        WindowApiError,
        WindowFlowApi,
    };

    use super::*;

    #[tokio::test]
    async fn worker_closes_overdue_windows_and_stops_on_request() {
        let db = prepare_test_env(&random_db_path()).await;
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap());
        let api = Arc::new(WindowFlowApi::new(db, EventProducers::default(), Berlin).with_clock(clock.clock()));
        let group = GroupId(-77);
        let creator = Participant::new(UserId(1)).with_username("anna");
        api.create_window(group, &creator, "5min").await.unwrap();

        let (tx, rx) = watch::channel(false);
        let worker = start_expiry_worker(Arc::clone(&api), Duration::from_millis(20), rx);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(api.status(group).await.is_ok(), "window closed before its deadline");

        clock.advance(ChronoDuration::minutes(5));
        let mut closed = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if matches!(api.status(group).await, Err(WindowApiError::NotFound)) {
                closed = true;
                break;
            }
        }
        assert!(closed, "the worker did not close the overdue window");

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), worker).await.expect("worker did not stop").unwrap();
    }
}

//! The ordering window state machine.
//!
//! Each group is either without a window, has exactly one OPEN window, or only CLOSED ones. All transitions for a
//! group run under that group's lock, so concurrent commands and button presses in one chat are applied one after the
//! other, while different groups proceed independently.
//!
//! The store is the source of truth for every check that authorises or rejects an action. The in-memory cache of open
//! windows only drives the expiry scan.
use std::{collections::HashSet, fmt::Debug, sync::Arc};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::*;

use super::{
    errors::WindowApiError,
    open_windows::OpenWindows,
    window_objects::{CloseReason, ClosedWindow, Selection, Submission, WindowChange, WindowSnapshot, WindowUpdate},
};
use crate::{
    db_types::{GroupId, MessageRef, NewWindow, OrderingWindow, Participant, Quantities, UserId},
    events::EventProducers,
    helpers::{parse_order_lines, parse_window_args},
    traits::{ExpiryResult, OrderingWindowDatabase, RestoreResult, WindowStoreError},
};

/// Source of the current time. Tests substitute a manual clock.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct WindowFlowApi<B> {
    db: B,
    producers: EventProducers,
    timezone: Tz,
    clock: Clock,
    open_windows: OpenWindows,
}

impl<B: Debug> Debug for WindowFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WindowFlowApi ({:?}, {})", self.db, self.timezone)
    }
}

impl<B> WindowFlowApi<B>
where B: OrderingWindowDatabase
{
    pub fn new(db: B, producers: EventProducers, timezone: Tz) -> Self {
        Self { db, producers, timezone, clock: Arc::new(Utc::now), open_windows: OpenWindows::default() }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }

    /// The civil timezone used to interpret and display deadlines.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// The number of open windows currently held in memory.
    pub async fn cached_window_count(&self) -> usize {
        self.open_windows.len().await
    }

    /// Opens a new window for the group.
    ///
    /// `args` are the raw `/gyroskop` arguments. If the group still has an open window whose deadline has passed, it
    /// is closed as expired first. Any other open window makes this call fail with
    /// [`WindowApiError::ConflictingWindow`].
    pub async fn create_window(
        &self,
        group: GroupId,
        creator: &Participant,
        args: &str,
    ) -> Result<OrderingWindow, WindowApiError> {
        let now = self.now();
        let args = parse_window_args(args, now, self.timezone)?;
        let _guard = self.open_windows.lock_group(group).await;
        if let Some(open) = self.db.fetch_open_window(group).await? {
            if !open.is_expired_at(now) {
                self.open_windows.sync(group, Some(&open)).await;
                return Err(WindowApiError::ConflictingWindow(open.id));
            }
            debug!("🥙 Window #{} in group {group} is overdue. Closing it before opening a new one", open.id);
            self.close_locked(open, CloseReason::Expired).await?;
        }
        let new_window = NewWindow {
            group_id: group,
            created_by: creator.user_id,
            name: args.name_or_default(),
            options: args.options_or_default(),
            deadline: args.deadline,
        };
        let window = self.db.create_window(new_window).await?;
        self.open_windows.insert(window.clone()).await;
        info!(
            "🥙 Window #{} '{}' opened in group {group} by {} until {}",
            window.id,
            window.name,
            creator.display_name(),
            window.deadline
        );
        Ok(window)
    }

    /// Records which chat message presents the window.
    pub async fn attach_message(
        &self,
        group: GroupId,
        window_id: i64,
        message: MessageRef,
    ) -> Result<OrderingWindow, WindowApiError> {
        let _guard = self.open_windows.lock_group(group).await;
        self.db.update_window_message_ref(window_id, message).await?;
        let window = self.fetch_existing_window(window_id).await?;
        if window.is_open {
            self.open_windows.insert(window.clone()).await;
        }
        trace!("🥙 Window #{window_id} is presented by message {message}");
        Ok(window)
    }

    /// Reopens a closed window, or changes the deadline of the open one. The window is identified by the message
    /// that presents it. Only its creator may do this.
    ///
    /// The name and options change only if `args` supplies them.
    pub async fn reopen_or_edit(
        &self,
        group: GroupId,
        requester: UserId,
        message: MessageRef,
        args: &str,
    ) -> Result<WindowUpdate, WindowApiError> {
        let now = self.now();
        let args = parse_window_args(args, now, self.timezone)?;
        let _guard = self.open_windows.lock_group(group).await;
        let window = self.db.fetch_window_by_message_ref(group, message).await?.ok_or(WindowApiError::NotFound)?;
        if window.created_by != requester {
            return Err(WindowApiError::Unauthorized);
        }
        let open = self.db.fetch_open_window(group).await?.filter(|open| open.id != window.id);
        if let Some(open) = &open {
            if !open.is_expired_at(now) {
                return Err(WindowApiError::ConflictingWindow(open.id));
            }
        }
        if !window.is_open {
            // Only the group's most recent window can be reopened
            let latest = self.db.fetch_latest_window(group).await?.map(|w| w.id);
            if latest != Some(window.id) {
                debug!("🥙 Window #{} is not the latest window of group {group}. Not reopening it", window.id);
                return Err(WindowApiError::NotFound);
            }
        }
        if let Some(open) = open {
            self.close_locked(open, CloseReason::Expired).await?;
        }
        let change = if window.is_open {
            self.db.update_window_deadline(window.id, args.deadline).await?;
            WindowChange::Updated
        } else {
            if !self.db.reopen_window(window.id, args.deadline).await? {
                warn!("🥙 Window #{} could not be reopened because it is no longer closed", window.id);
                return Err(WindowApiError::NotFound);
            }
            WindowChange::Reopened
        };
        if args.name.is_some() || args.options.is_some() {
            let name = args.name.clone().unwrap_or_else(|| window.name.clone());
            let options = args.options.clone().unwrap_or_else(|| window.options.clone());
            self.db.update_window_options(window.id, &name, &options).await?;
        }
        let window = self.fetch_existing_window(window.id).await?;
        self.open_windows.insert(window.clone()).await;
        info!("🥙 Window #{} in group {group}: {change:?}. New deadline {}", window.id, window.deadline);
        Ok(WindowUpdate { window, change })
    }

    /// Applies a free-text order such as `2 fleisch, 1 veg` to the participant's order.
    ///
    /// Mentioned options are replaced, a zero removes an option and all other options keep their quantity. The text
    /// `0` on its own cancels the whole order.
    pub async fn submit_text(
        &self,
        group: GroupId,
        participant: &Participant,
        text: &str,
    ) -> Result<Submission, WindowApiError> {
        let now = self.now();
        let _guard = self.open_windows.lock_group(group).await;
        let window = self.fetch_open_window(group).await?.ok_or(WindowApiError::NotFound)?;
        let text = text.trim();
        if text == "0" {
            ensure_accepting_orders(&window, now)?;
            return self.clear_locked(window, participant).await;
        }
        let changes = parse_order_lines(text, &window.options).ok_or(WindowApiError::UnrecognisedOrder)?;
        ensure_accepting_orders(&window, now)?;
        let mut quantities = self.current_quantities(&window, participant.user_id).await?;
        quantities.merge(&changes);
        self.save_order(window, participant, quantities).await
    }

    /// Applies a button press.
    ///
    /// `message` is the message carrying the button. Buttons on a message that does not present the open window (e.g.
    /// one left over from an earlier window) are rejected with [`WindowApiError::NotFound`].
    pub async fn submit_selection(
        &self,
        group: GroupId,
        participant: &Participant,
        selection: Selection,
        message: Option<MessageRef>,
    ) -> Result<Submission, WindowApiError> {
        let now = self.now();
        let _guard = self.open_windows.lock_group(group).await;
        let window = self.fetch_open_window(group).await?.ok_or(WindowApiError::NotFound)?;
        if let (Some(pressed), Some(presented)) = (message, window.message_ref) {
            if pressed != presented {
                return Err(WindowApiError::NotFound);
            }
        }
        ensure_accepting_orders(&window, now)?;
        match selection {
            Selection::Quantity { option_index, quantity } => {
                let option =
                    window.option(option_index).ok_or(WindowApiError::InvalidSelection(option_index))?.to_string();
                let mut quantities = self.current_quantities(&window, participant.user_id).await?;
                quantities.set(option, quantity);
                self.save_order(window, participant, quantities).await
            },
            Selection::CancelAll => self.clear_locked(window, participant).await,
        }
    }

    /// Clears all of the participant's quantities in the group's open window.
    pub async fn cancel_order(&self, group: GroupId, participant: &Participant) -> Result<Submission, WindowApiError> {
        let now = self.now();
        let _guard = self.open_windows.lock_group(group).await;
        let window = self.fetch_open_window(group).await?.ok_or(WindowApiError::NotFound)?;
        ensure_accepting_orders(&window, now)?;
        self.clear_locked(window, participant).await
    }

    /// Closes the window on request of its creator.
    ///
    /// `message` is the message the `/ende` command replied to. If it presents a window, that window must be the open
    /// one; otherwise the group's open window is used.
    ///
    /// Returns `None` if the window was closed concurrently by someone else (e.g. the expiry scheduler).
    pub async fn close_window(
        &self,
        group: GroupId,
        requester: UserId,
        message: Option<MessageRef>,
    ) -> Result<Option<ClosedWindow>, WindowApiError> {
        let _guard = self.open_windows.lock_group(group).await;
        let referenced = match message {
            Some(message) => self.db.fetch_window_by_message_ref(group, message).await?,
            None => None,
        };
        let window = match referenced {
            Some(w) if w.is_open => w,
            Some(_) => return Err(WindowApiError::NotFound),
            None => self.fetch_open_window(group).await?.ok_or(WindowApiError::NotFound)?,
        };
        if window.created_by != requester {
            return Err(WindowApiError::Unauthorized);
        }
        self.close_locked(window, CloseReason::Manual(requester)).await
    }

    /// The group's open window with all orders so far.
    pub async fn status(&self, group: GroupId) -> Result<WindowSnapshot, WindowApiError> {
        let window = self.fetch_open_window(group).await?.ok_or(WindowApiError::NotFound)?;
        let orders = self.db.fetch_orders(window.id).await?;
        Ok(WindowSnapshot { window, orders })
    }

    /// Any window (open or closed) with its orders.
    pub async fn snapshot(&self, window_id: i64) -> Result<WindowSnapshot, WindowApiError> {
        let window = self.db.fetch_window(window_id).await?.ok_or(WindowApiError::NotFound)?;
        let orders = self.db.fetch_orders(window.id).await?;
        Ok(WindowSnapshot { window, orders })
    }

    /// Closes every open window whose deadline has passed.
    ///
    /// The in-memory cache is scanned first. The store is then queried as a safety net for windows the cache missed.
    /// Windows already handled in the first pass are skipped. A failure to close one window is logged and does not
    /// stop the others from being processed.
    pub async fn expire_overdue_windows(&self) -> Result<ExpiryResult, WindowApiError> {
        let now = self.now();
        let mut result = ExpiryResult::default();
        let mut handled = HashSet::new();
        for cached in self.open_windows.overdue(now).await {
            handled.insert(cached.id);
            match self.expire_window(cached.group_id, cached.id, now).await {
                Ok(Some(closed)) => {
                    result.from_cache += 1;
                    result.closed.push(closed);
                },
                Ok(None) => {},
                Err(e) => error!("🥙 Could not close overdue window #{}. {e}", cached.id),
            }
        }
        for stored in self.db.fetch_all_open_windows().await? {
            if handled.contains(&stored.id) || !stored.is_expired_at(now) {
                continue;
            }
            warn!("🥙 Overdue window #{} in group {} was not in the cache", stored.id, stored.group_id);
            match self.expire_window(stored.group_id, stored.id, now).await {
                Ok(Some(closed)) => {
                    result.from_store += 1;
                    result.closed.push(closed);
                },
                Ok(None) => {},
                Err(e) => error!("🥙 Could not close overdue window #{}. {e}", stored.id),
            }
        }
        Ok(result)
    }

    /// Loads all open windows from the store into memory. Windows that expired while the bot was offline are closed
    /// straight away (and their summaries published).
    pub async fn restore_open_windows(&self) -> Result<RestoreResult, WindowApiError> {
        let now = self.now();
        let mut result = RestoreResult::default();
        for window in self.db.fetch_all_open_windows().await? {
            if window.is_expired_at(now) {
                let _guard = self.open_windows.lock_group(window.group_id).await;
                let window_id = window.id;
                match self.close_locked(window, CloseReason::Expired).await {
                    Ok(Some(closed)) => result.expired.push(closed),
                    Ok(None) => {},
                    Err(e) => error!("🥙 Could not close window #{window_id} that expired while offline. {e}"),
                }
            } else {
                self.open_windows.insert(window).await;
                result.loaded += 1;
            }
        }
        info!("🥙 Restored {} open windows. {} had expired and were closed", result.loaded, result.expired.len());
        Ok(result)
    }

    //------------------------------------------  Private helpers  -------------------------------------------------

    /// Re-reads the window under the group lock and closes it only if it is still open and still overdue. The
    /// deadline may have been extended since the scan.
    async fn expire_window(
        &self,
        group: GroupId,
        window_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<ClosedWindow>, WindowApiError> {
        let _guard = self.open_windows.lock_group(group).await;
        let window = match self.db.fetch_window(window_id).await? {
            Some(w) if w.is_open => w,
            _ => {
                self.open_windows.evict(group, window_id).await;
                return Ok(None);
            },
        };
        if !window.is_expired_at(now) {
            trace!("🥙 Window #{window_id} had its deadline extended. Not closing it");
            self.open_windows.insert(window).await;
            return Ok(None);
        }
        self.close_locked(window, CloseReason::Expired).await
    }

    /// Must be called with the group lock held.
    async fn close_locked(
        &self,
        window: OrderingWindow,
        reason: CloseReason,
    ) -> Result<Option<ClosedWindow>, WindowApiError> {
        // Orders cannot change while we hold the group lock, so reading them first is safe
        let orders = self.db.fetch_orders(window.id).await?;
        let closed = self.db.close_window(window.id).await?;
        self.open_windows.evict(window.group_id, window.id).await;
        if !closed {
            debug!("🥙 Window #{} was already closed", window.id);
            return Ok(None);
        }
        let window = OrderingWindow { is_open: false, ..window };
        info!(
            "🥙 Window #{} '{}' in group {} closed ({reason:?}) with {} orders",
            window.id,
            window.name,
            window.group_id,
            orders.iter().filter(|o| o.has_items()).count()
        );
        let closed = ClosedWindow { window, orders, reason };
        self.producers.publish_window_closed(closed.clone().into()).await;
        Ok(Some(closed))
    }

    async fn clear_locked(
        &self,
        window: OrderingWindow,
        participant: &Participant,
    ) -> Result<Submission, WindowApiError> {
        let had_order = self.db.clear_order(window.id, participant.user_id).await?;
        debug!(
            "🥙 {} cancelled their order in window #{} (had an order: {had_order})",
            participant.display_name(),
            window.id
        );
        Ok(Submission { window, participant: participant.clone(), quantities: Quantities::new() })
    }

    async fn save_order(
        &self,
        window: OrderingWindow,
        participant: &Participant,
        quantities: Quantities,
    ) -> Result<Submission, WindowApiError> {
        let order = self.db.upsert_order(window.id, participant, &quantities).await?;
        debug!(
            "🥙 {} ordered {} items in window #{}",
            order.participant.display_name(),
            order.quantities.total(),
            window.id
        );
        Ok(Submission { window, participant: order.participant, quantities: order.quantities })
    }

    async fn current_quantities(&self, window: &OrderingWindow, user: UserId) -> Result<Quantities, WindowApiError> {
        let order = self.db.fetch_order(window.id, user).await?;
        Ok(order.map(|o| o.quantities).unwrap_or_default())
    }

    /// Reads the open window from the store and brings the cache in line with it.
    async fn fetch_open_window(&self, group: GroupId) -> Result<Option<OrderingWindow>, WindowApiError> {
        let window = self.db.fetch_open_window(group).await?;
        self.open_windows.sync(group, window.as_ref()).await;
        Ok(window)
    }

    async fn fetch_existing_window(&self, window_id: i64) -> Result<OrderingWindow, WindowApiError> {
        let window = self.db.fetch_window(window_id).await?.ok_or(WindowStoreError::WindowNotFound(window_id))?;
        Ok(window)
    }
}

fn ensure_accepting_orders(window: &OrderingWindow, now: DateTime<Utc>) -> Result<(), WindowApiError> {
    if window.is_expired_at(now) {
        Err(WindowApiError::WindowExpired(window.deadline))
    } else {
        Ok(())
    }
}

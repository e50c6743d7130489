use crate::{
    db_types::{Order, OrderingWindow},
    window_api::window_objects::{CloseReason, ClosedWindow},
};

/// Published exactly once for every window that transitions from open to closed, whether by the creator or by the
/// expiry scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowClosedEvent {
    pub window: OrderingWindow,
    pub orders: Vec<Order>,
    pub reason: CloseReason,
}

impl From<ClosedWindow> for WindowClosedEvent {
    fn from(closed: ClosedWindow) -> Self {
        Self { window: closed.window, orders: closed.orders, reason: closed.reason }
    }
}

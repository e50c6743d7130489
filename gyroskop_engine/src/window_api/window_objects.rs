use gyro_common::Quantity;

use crate::db_types::{Order, OrderingWindow, Participant, Quantities, UserId};

/// A structured (button) submission, decoded by the messaging gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Set the quantity of the option at `option_index` in the window's option list.
    Quantity { option_index: usize, quantity: Quantity },
    /// Clear the participant's whole order.
    CancelAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Closed by the creator
    Manual(UserId),
    /// Closed by the expiry scheduler because the deadline passed
    Expired,
}

/// A window that was just closed, along with every order it received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedWindow {
    pub window: OrderingWindow,
    pub orders: Vec<Order>,
    pub reason: CloseReason,
}

/// The current state of a window and its orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub window: OrderingWindow,
    pub orders: Vec<Order>,
}

/// The participant's order after an accepted submission or cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub window: OrderingWindow,
    pub participant: Participant,
    pub quantities: Quantities,
}

impl Submission {
    pub fn is_cancellation(&self) -> bool {
        self.quantities.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowChange {
    /// A closed window was opened again
    Reopened,
    /// The deadline (and possibly name and options) of the open window changed
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowUpdate {
    pub window: OrderingWindow,
    pub change: WindowChange,
}

use std::{collections::BTreeMap, fmt::Display};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use gyro_common::Quantity;
use serde::{Deserialize, Serialize};
use sqlx::Type;

//--------------------------------------     GroupId       ---------------------------------------------------------
/// The chat (group) an ordering window belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct GroupId(pub i64);

impl Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------     UserId       ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct UserId(pub i64);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------     MessageRef       ------------------------------------------------------
/// Identifier of the chat message that presents an ordering window to the group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct MessageRef(pub i32);

impl Display for MessageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------     Participant       -----------------------------------------------------
/// A chat user, along with the display fields captured at their latest submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: UserId,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Participant {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id, username: None, first_name: None, last_name: None }
    }

    pub fn with_username<S: Into<String>>(mut self, username: S) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_name<S: Into<String>>(mut self, first_name: S, last_name: Option<S>) -> Self {
        self.first_name = Some(first_name.into());
        self.last_name = last_name.map(Into::into);
        self
    }

    /// The name shown in summaries: "First Last", "First", "@username" or "User <id>", in that order of preference.
    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let last = self.last_name.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let username = self.username.as_deref().map(str::trim).filter(|s| !s.is_empty());
        match (first, last, username) {
            (Some(first), Some(last), _) => format!("{first} {last}"),
            (Some(first), None, _) => first.to_string(),
            (None, _, Some(username)) => format!("@{username}"),
            _ => format!("User {}", self.user_id),
        }
    }
}

//--------------------------------------     Quantities       ------------------------------------------------------
/// Sparse map of food option to quantity. Zero quantities are never stored; setting an option to zero removes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantities(BTreeMap<String, Quantity>);

impl Quantities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, option: &str) -> Quantity {
        self.0.get(option).copied().unwrap_or_default()
    }

    pub fn set<S: Into<String>>(&mut self, option: S, quantity: Quantity) {
        let option = option.into();
        if quantity.is_zero() {
            self.0.remove(&option);
        } else {
            self.0.insert(option, quantity);
        }
    }

    /// Replaces the quantities of every option mentioned in `changes`, leaving the others untouched.
    pub fn merge<'a, I>(&mut self, changes: I)
    where I: IntoIterator<Item = (&'a String, &'a Quantity)> {
        for (option, quantity) in changes {
            self.set(option.as_str(), *quantity);
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// True if no option has a non-zero quantity
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Quantity::is_zero)
    }

    pub fn total(&self) -> u32 {
        self.0.values().map(|q| u32::from(*q)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Quantity)> {
        self.0.iter()
    }
}

impl<S: Into<String>> FromIterator<(S, Quantity)> for Quantities {
    fn from_iter<T: IntoIterator<Item = (S, Quantity)>>(iter: T) -> Self {
        let mut result = Quantities::new();
        iter.into_iter().for_each(|(option, q)| result.set(option, q));
        result
    }
}

//--------------------------------------     OrderingWindow       --------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderingWindow {
    pub id: i64,
    pub group_id: GroupId,
    pub created_by: UserId,
    pub message_ref: Option<MessageRef>,
    pub name: String,
    pub options: Vec<String>,
    pub deadline: DateTime<Utc>,
    pub is_open: bool,
}

impl OrderingWindow {
    /// A window accepts submissions only while `now` is strictly before the deadline.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.deadline
    }

    pub fn local_deadline(&self, tz: Tz) -> DateTime<Tz> {
        self.deadline.with_timezone(&tz)
    }

    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWindow {
    pub group_id: GroupId,
    pub created_by: UserId,
    pub name: String,
    pub options: Vec<String>,
    pub deadline: DateTime<Utc>,
}

//--------------------------------------     Order       -----------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub window_id: i64,
    pub participant: Participant,
    pub quantities: Quantities,
}

impl Order {
    /// Orders where every quantity is zero are treated as absent.
    pub fn has_items(&self) -> bool {
        !self.quantities.is_empty()
    }
}
